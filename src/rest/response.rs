//! Write access to the REST response.

use axum::http::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Errors writing a response.
#[derive(Debug, Error)]
pub enum WriteError {
    /// A status and body were already written.
    #[error("response already committed with status {0}")]
    AlreadyCommitted(StatusCode),

    /// The entity could not be serialized.
    #[error("failed to serialize entity: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Response-side capability used by the route handler.
pub trait RestResponse: Send {
    /// Write a status and the error's text.
    fn write_error(&mut self, status: StatusCode, err: &dyn std::error::Error) -> Result<(), WriteError>;

    /// Write a successful entity.
    fn write_entity(&mut self, value: &Value) -> Result<(), WriteError>;
}

/// What a [`MemoryResponse`] captured.
#[derive(Debug, Clone, PartialEq)]
pub enum Written {
    Error { status: StatusCode, message: String },
    Entity(Value),
}

/// A response that records the single write it receives.
#[derive(Debug, Default)]
pub struct MemoryResponse {
    written: Option<Written>,
}

impl MemoryResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn written(&self) -> Option<&Written> {
        self.written.as_ref()
    }

    fn commit(&mut self, written: Written) -> Result<(), WriteError> {
        if let Some(prev) = &self.written {
            let status = match prev {
                Written::Error { status, .. } => *status,
                Written::Entity(_) => StatusCode::OK,
            };
            return Err(WriteError::AlreadyCommitted(status));
        }
        self.written = Some(written);
        Ok(())
    }
}

impl RestResponse for MemoryResponse {
    fn write_error(&mut self, status: StatusCode, err: &dyn std::error::Error) -> Result<(), WriteError> {
        self.commit(Written::Error {
            status,
            message: err.to_string(),
        })
    }

    fn write_entity(&mut self, value: &Value) -> Result<(), WriteError> {
        self.commit(Written::Entity(value.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_write() {
        let mut resp = MemoryResponse::new();
        resp.write_entity(&json!({"ok": true})).unwrap();
        assert_eq!(resp.written(), Some(&Written::Entity(json!({"ok": true}))));

        let err = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        let second = resp.write_error(StatusCode::INTERNAL_SERVER_ERROR, &err);
        assert!(matches!(second, Err(WriteError::AlreadyCommitted(StatusCode::OK))));
    }
}
