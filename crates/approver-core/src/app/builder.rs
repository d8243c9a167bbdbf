//! DispatcherBuilder - 操作の登録と起動時検証
//!
//! # Fail-fast 設計
//! - `expect_operations()` で期待される操作名を登録
//! - `build()` 時に「期待集合 ⊆ 登録済み集合」をチェック
//! - 不足があれば `BuildError` を返す

use super::dispatcher::Dispatcher;
use crate::typed::{Handler, Operation, OperationRegistry, RegistryError};

pub struct DispatcherBuilder {
    registry: OperationRegistry,
    expected_operations: Option<Vec<String>>,
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Missing operations: {0:?}. These operations were expected but not registered.")]
    MissingOperations(Vec<String>),
}

impl DispatcherBuilder {
    pub fn new() -> Self {
        Self {
            registry: OperationRegistry::new(),
            expected_operations: None,
        }
    }

    pub fn register<O: Operation, H: Handler<O> + 'static>(
        mut self,
        handler: H,
    ) -> Result<Self, RegistryError> {
        self.registry.register::<O, H>(handler)?;
        Ok(self)
    }

    pub fn expect_operations(mut self, names: &[&str]) -> Self {
        self.expected_operations = Some(names.iter().map(|name| name.to_string()).collect());
        self
    }

    pub fn build(self) -> Result<Dispatcher, BuildError> {
        if let Some(expected) = &self.expected_operations {
            let registered = self.registry.registered_operations();
            let missing: Vec<String> = expected
                .iter()
                .filter(|name| !registered.contains(name))
                .cloned()
                .collect();
            if !missing.is_empty() {
                return Err(BuildError::MissingOperations(missing));
            }
        }
        Ok(Dispatcher::new(self.registry))
    }
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}
