//! API routes module.

mod download;
pub mod outcome;

use std::any::Any;
use std::sync::Arc;

use axum::response::{IntoResponse, Response};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;

use crate::AppState;
use outcome::DownloadOutcome;

/// Build the API router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(download::router(state))
        .layer(CatchPanicLayer::custom(handle_panic))
}

/// Map a handler panic to the same 500 shape as any other internal error.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Internal Server Error".to_string()
    };

    tracing::error!(severity = "critical", "Handler panicked: {}", detail);
    DownloadOutcome::InternalError { detail }.into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn panics_become_internal_errors() {
        let resp = handle_panic(Box::new("boom"));
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(bytes.as_ref(), br#""boom""#);
    }

    #[test]
    fn opaque_panic_payloads_get_a_generic_message() {
        let resp = handle_panic(Box::new(42u8));
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
