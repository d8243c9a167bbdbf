//! Handler trait - Operation を実行する Handler の定義
//!
//! - `Handler<O>`: デコード済みリクエストを受け取る型付き handler
//! - `DynHandler`: bytes → bytes の object-safe 版
//! - `TypedHandler<O, H>`: 型消去のためのラッパー

use std::marker::PhantomData;

use async_trait::async_trait;

use super::operation::Operation;
use crate::domain::RpcError;

/// Runs one operation and produces the response payload.
///
/// The handler chooses the response encoding itself (document or transport
/// form), so it returns raw bytes.
#[async_trait]
pub trait Handler<O: Operation>: Send + Sync {
    async fn handle(&self, request: O::Request) -> Result<Vec<u8>, RpcError>;
}

/// Object-safe handler stored in the registry.
#[async_trait]
pub trait DynHandler: Send + Sync {
    async fn handle_dyn(&self, payload: Vec<u8>) -> Result<Vec<u8>, RpcError>;
    fn operation(&self) -> &'static str;
}

pub struct TypedHandler<O: Operation, H: Handler<O>> {
    handler: H,
    _marker: PhantomData<fn() -> O>,
}

impl<O: Operation, H: Handler<O>> TypedHandler<O, H> {
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<O: Operation, H: Handler<O>> DynHandler for TypedHandler<O, H> {
    async fn handle_dyn(&self, payload: Vec<u8>) -> Result<Vec<u8>, RpcError> {
        let request = O::decode(&payload).map_err(|source| RpcError::Decode {
            operation: O::NAME,
            source,
        })?;
        self.handler.handle(request).await
    }

    fn operation(&self) -> &'static str {
        O::NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typed::operation::ApproveJob;

    struct EchoJob;

    #[async_trait]
    impl Handler<ApproveJob> for EchoJob {
        async fn handle(&self, request: crate::domain::ApproveJobRequest) -> Result<Vec<u8>, RpcError> {
            Ok(request.job_uuid.into_bytes())
        }
    }

    #[tokio::test]
    async fn typed_handler_decodes_before_calling() {
        let handler = TypedHandler::<ApproveJob, _>::new(EchoJob);
        assert_eq!(handler.operation(), "approveJob");

        let out = handler
            .handle_dyn(br#"{"jobUUID":"job-9","chain":"A","uid":"u"}"#.to_vec())
            .await
            .unwrap();
        assert_eq!(out, b"job-9");
    }

    #[tokio::test]
    async fn decode_failure_names_the_operation() {
        let handler = TypedHandler::<ApproveJob, _>::new(EchoJob);
        let err = handler.handle_dyn(b"not json".to_vec()).await.unwrap_err();
        assert!(matches!(err, RpcError::Decode { operation: "approveJob", .. }));
    }
}
