//! Response handling.
//!
//! # Design Decisions
//! - A response is written once; later writes are rejected
//! - Entities are JSON, errors are plain text carrying the error's message
//! - Nothing written maps to 500 so a dropped write is never a silent 200

use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::Value;

use crate::rest::{RestResponse, WriteError};

/// Collects the single write a route handler makes and turns it into an axum
/// [`Response`].
#[derive(Debug, Default)]
pub struct HttpRestResponse {
    committed: Option<(StatusCode, &'static str, Vec<u8>)>,
}

impl HttpRestResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.committed.as_ref().map(|(status, _, _)| *status)
    }

    fn commit(
        &mut self,
        status: StatusCode,
        content_type: &'static str,
        body: Vec<u8>,
    ) -> Result<(), WriteError> {
        if let Some(prev) = self.status() {
            return Err(WriteError::AlreadyCommitted(prev));
        }
        self.committed = Some((status, content_type, body));
        Ok(())
    }
}

impl RestResponse for HttpRestResponse {
    fn write_error(&mut self, status: StatusCode, err: &dyn std::error::Error) -> Result<(), WriteError> {
        self.commit(status, "text/plain; charset=utf-8", err.to_string().into_bytes())
    }

    fn write_entity(&mut self, value: &Value) -> Result<(), WriteError> {
        let body = serde_json::to_vec(value)?;
        self.commit(StatusCode::OK, "application/json", body)
    }
}

impl IntoResponse for HttpRestResponse {
    fn into_response(self) -> Response {
        match self.committed {
            Some((status, content_type, body)) => (
                status,
                [(header::CONTENT_TYPE, HeaderValue::from_static(content_type))],
                Body::from(body),
            )
                .into_response(),
            None => (StatusCode::INTERNAL_SERVER_ERROR, "No response was written").into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invocation::InvocationError;
    use serde_json::json;

    #[tokio::test]
    async fn test_entity_response() {
        let mut resp = HttpRestResponse::new();
        resp.write_entity(&json!({"ok": true})).unwrap();

        let response = resp.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], br#"{"ok":true}"#);
    }

    #[tokio::test]
    async fn test_single_write() {
        let mut resp = HttpRestResponse::new();
        resp.write_error(StatusCode::INTERNAL_SERVER_ERROR, &InvocationError::new("boom"))
            .unwrap();
        assert!(matches!(
            resp.write_entity(&json!(1)),
            Err(WriteError::AlreadyCommitted(StatusCode::INTERNAL_SERVER_ERROR))
        ));

        let response = resp.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"boom");
    }

    #[test]
    fn test_unwritten_is_500() {
        assert_eq!(
            HttpRestResponse::new().into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
