//! OperationRegistry - Handler の登録と管理
//!
//! - `register::<O, H>()` で登録（内部で TypedHandler に包んで DynHandler 化）
//! - 操作名 → `Arc<dyn DynHandler>` の HashMap で管理
//! - 起動時に構築し、実行中は読み取りのみ

use std::collections::HashMap;
use std::sync::Arc;

use super::handler::{DynHandler, Handler, TypedHandler};
use super::operation::Operation;

#[derive(Default)]
pub struct OperationRegistry {
    handlers: HashMap<String, Arc<dyn DynHandler>>,
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Handler for operation '{0}' is already registered")]
    AlreadyRegistered(String),
}

impl OperationRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn register<O: Operation, H: Handler<O> + 'static>(
        &mut self,
        handler: H,
    ) -> Result<(), RegistryError> {
        let name = O::NAME.to_string();
        if self.handlers.contains_key(&name) {
            return Err(RegistryError::AlreadyRegistered(name));
        }
        self.handlers
            .insert(name, Arc::new(TypedHandler::<O, H>::new(handler)));
        Ok(())
    }

    pub fn get(&self, operation: &str) -> Option<Arc<dyn DynHandler>> {
        self.handlers.get(operation).cloned()
    }

    /// Registered operation names, sorted.
    pub fn registered_operations(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.keys().cloned().collect();
        names.sort();
        names
    }
}
