//! Dispatcher - 操作名から handler を引いて実行する
//!
//! handler の失敗（エラー・panic・未登録の操作名）はここで止めて
//! ログに残し、空のペイロードを返します。serve ループには伝播しません。

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::RpcError;
use crate::typed::OperationRegistry;

pub struct Dispatcher {
    registry: Arc<OperationRegistry>,
}

impl Dispatcher {
    pub fn new(registry: OperationRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    /// Names to announce to the broker.
    pub fn operations(&self) -> Vec<String> {
        self.registry.registered_operations()
    }

    /// Run one request to completion. Never fails: any failure becomes an
    /// empty response.
    pub async fn dispatch(&self, operation: &str, payload: Vec<u8>) -> Vec<u8> {
        match self.try_dispatch(operation, payload).await {
            Ok(response) => {
                debug!(operation, bytes = response.len(), "request handled");
                response
            }
            Err(error) => {
                warn!(operation, %error, "request failed, answering with empty payload");
                Vec::new()
            }
        }
    }

    async fn try_dispatch(&self, operation: &str, payload: Vec<u8>) -> Result<Vec<u8>, RpcError> {
        let handler = self
            .registry
            .get(operation)
            .ok_or_else(|| RpcError::Other(format!("no handler for operation {operation}")))?;

        // Run on its own task so a panicking decision cannot take the serve
        // loop down; awaited immediately, so requests stay sequential.
        let task = tokio::spawn(async move { handler.handle_dyn(payload).await });
        match task.await {
            Ok(result) => result,
            Err(join_error) if join_error.is_panic() => Err(RpcError::Panicked {
                operation: operation.to_string(),
            }),
            Err(join_error) => Err(RpcError::Other(join_error.to_string())),
        }
    }
}
