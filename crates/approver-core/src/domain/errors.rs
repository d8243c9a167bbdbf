//! Errors - エラー型と分類
//!
//! - `StructuredError`: 呼び出し側に見せるエラー（document form で返す）
//! - `RpcError`: handler 境界で握りつぶされる内部エラー（ログのみ）

use std::fmt;

use crate::typed::codec::CodecError;

/// Caller-visible error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// The datastore lock could not be acquired within the wait budget.
    DatabaseLock,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::DatabaseLock => "DatabaseLock",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error that is returned to the RPC caller as a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredError {
    pub code: ErrorCode,
    pub details: String,
}

impl StructuredError {
    pub fn new(code: ErrorCode, details: impl Into<String>) -> Self {
        Self {
            code,
            details: details.into(),
        }
    }

    pub fn database_lock() -> Self {
        Self::new(ErrorCode::DatabaseLock, "Couldn't acquire database lock")
    }
}

impl fmt::Display for StructuredError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.details)
    }
}

impl std::error::Error for StructuredError {}

/// Failure inside a handler. Never reaches the caller; the dispatcher logs it
/// and answers with an empty payload.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    #[error("decode request for {operation}: {source}")]
    Decode {
        operation: &'static str,
        #[source]
        source: CodecError,
    },

    #[error("encode response: {0}")]
    Encode(#[from] CodecError),

    #[error("handler task for {operation} panicked")]
    Panicked { operation: String },

    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_lock_error_has_expected_code_and_details() {
        let err = StructuredError::database_lock();
        assert_eq!(err.code.as_str(), "DatabaseLock");
        assert_eq!(err.details, "Couldn't acquire database lock");
        assert_eq!(err.to_string(), "DatabaseLock: Couldn't acquire database lock");
    }
}
