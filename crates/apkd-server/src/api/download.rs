//! Package download endpoint.
//!
//! Endpoint:
//!   GET /download/{package_name}   (trailing slash tolerated)
//!
//! Validates the package name, resolves its metadata from the store, downloads
//! the APK into the download root and reports the result as JSON.

use std::sync::Arc;

use axum::{
    extract::{rejection::PathRejection, Path, State},
    http::Uri,
    routing::get,
    Router,
};

use super::outcome::DownloadOutcome;
use crate::services::downloader::{self, DownloadRequest};
use crate::services::identifier::PackageIdentifier;
use crate::services::metadata::{self, ResolveError};
use crate::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/download/{package_name}", get(download_package))
        .route("/download/{package_name}/", get(download_package))
        .with_state(state)
}

async fn download_package(
    State(state): State<Arc<AppState>>,
    uri: Uri,
    package_name: Result<Path<String>, PathRejection>,
) -> DownloadOutcome {
    match package_name {
        Ok(Path(package_name)) => fetch_package(&state, &package_name).await,
        Err(rejection) => {
            tracing::error!(path = %uri.path(), "Undecodable package name: {}", rejection);
            DownloadOutcome::InvalidIdentifier {
                raw: uri.path().to_string(),
            }
        }
    }
}

/// Run the whole download pipeline for one raw package name.
pub async fn fetch_package(state: &AppState, raw: &str) -> DownloadOutcome {
    let Some(id) = PackageIdentifier::parse(raw) else {
        tracing::error!(raw, "Please specify a valid package name");
        return DownloadOutcome::InvalidIdentifier {
            raw: raw.to_string(),
        };
    };

    let session = match state.store.open_session().await {
        Ok(session) => session,
        Err(e) => {
            tracing::error!(severity = "critical", package = %id, "Error during the download: {}", e);
            return DownloadOutcome::InternalError {
                detail: e.to_string(),
            };
        }
    };

    let meta = match metadata::resolve(session.as_ref(), &id).await {
        Ok(meta) => meta,
        Err(e @ ResolveError::NotFound { .. }) => {
            tracing::error!(package = %id, "{}", e);
            return DownloadOutcome::NotFound {
                package: id.to_string(),
            };
        }
        Err(e) => {
            tracing::error!(severity = "critical", package = %id, "Error during the download: {}", e);
            return DownloadOutcome::InternalError {
                detail: e.to_string(),
            };
        }
    };

    tracing::debug!(
        package = %meta.package_name,
        title = %meta.title,
        creator = %meta.creator,
        version = %meta.version_string,
        version_code = meta.version_code,
        "Resolved application details"
    );

    let request = DownloadRequest::new(&meta, &state.download_root);
    if !downloader::download(session.as_ref(), &request).await {
        return DownloadOutcome::DownloadFailed {
            package: id.to_string(),
        };
    }

    DownloadOutcome::Success {
        package: meta.package_name.to_string(),
        filename: request.filename,
        version: meta.version_string,
        version_code: meta.version_code,
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::services::store::mock::{raw_details, DownloadBehavior, MockStore};

    const ROOT: &str = "/srv/apks";

    fn state(store: MockStore) -> Arc<AppState> {
        Arc::new(AppState {
            download_root: PathBuf::from(ROOT),
            store: Arc::new(store),
        })
    }

    fn example_store() -> MockStore {
        MockStore::new().with_details(
            "com.example.app",
            raw_details("com.example.app", "Example", "Dev", 7, "1.2.3"),
        )
    }

    async fn get_json(store: MockStore, uri: &str) -> (StatusCode, Value) {
        let app = crate::api::router(state(store));
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = resp.status();
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn downloads_known_package() {
        let store = example_store();
        let (status, body) = get_json(store.clone(), "/download/com.example.app").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "package": "com.example.app",
                "filename": "com.example.app_1.2.3(7).apk",
                "version": "1.2.3",
                "version_code": 7,
            })
        );

        let calls = store.calls.lock().unwrap();
        assert_eq!(calls.sessions, 1);
        assert_eq!(
            calls.downloads,
            vec![(
                "com.example.app".to_string(),
                PathBuf::from(ROOT).join("com.example.app_1.2.3(7).apk")
            )]
        );
    }

    #[tokio::test]
    async fn trailing_slash_is_tolerated() {
        let (status, body) = get_json(example_store(), "/download/com.example.app/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["filename"], "com.example.app_1.2.3(7).apk");
    }

    #[tokio::test]
    async fn invalid_package_never_reaches_the_store() {
        let store = example_store();
        let (status, body) = get_json(store.clone(), "/download/bogus").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.as_str().unwrap().contains("Not valid package"));
        let calls = store.calls.lock().unwrap();
        assert_eq!(calls.sessions, 0);
        assert!(calls.details.is_empty());
    }

    #[tokio::test]
    async fn percent_encoded_names_are_decoded_before_validation() {
        let (status, _) = get_json(example_store(), "/download/com%2Eexample%2Eapp").await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = get_json(example_store(), "/download/..%2Fetc.passwd").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!("Not valid package"));
    }

    #[tokio::test]
    async fn unknown_package_is_not_valid() {
        let store = example_store();
        let (status, body) = get_json(store.clone(), "/download/com.unknown.app").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "package": "com.unknown.app", "status": "not valid" }));
        assert!(store.calls.lock().unwrap().downloads.is_empty());
    }

    #[tokio::test]
    async fn failed_download_is_reported() {
        let store = example_store().with_download(DownloadBehavior::ReportFailure);
        let (status, body) = get_json(store, "/download/com.example.app").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({ "package": "com.example.app", "status": "Error when downloading" })
        );
    }

    #[tokio::test]
    async fn store_error_during_download_is_reported_as_failed_download() {
        let store = example_store().with_download(DownloadBehavior::Error);
        let (status, body) = get_json(store, "/download/com.example.app").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "Error when downloading");
    }

    #[tokio::test]
    async fn store_lookup_failure_is_internal_error() {
        let store = example_store().failing_details();
        let (status, body) = get_json(store, "/download/com.example.app").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.as_str().unwrap().contains("connection reset"));
    }

    #[tokio::test]
    async fn session_failure_is_internal_error() {
        let store = example_store().failing_session();
        let (status, body) = get_json(store.clone(), "/download/com.example.app").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.as_str().unwrap().contains("login rejected"));
        assert!(store.calls.lock().unwrap().details.is_empty());
    }

    #[tokio::test]
    async fn unsafe_version_is_internal_error() {
        let store = MockStore::new().with_details(
            "com.example.app",
            raw_details("com.example.app", "Example", "Dev", 7, "../../x"),
        );
        let (status, _) = get_json(store.clone(), "/download/com.example.app").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(store.calls.lock().unwrap().downloads.is_empty());
    }

    #[tokio::test]
    async fn pipeline_runs_without_the_router() {
        let state = state(example_store());
        let outcome = fetch_package(&state, "com.example.app").await;
        assert!(matches!(outcome, DownloadOutcome::Success { version_code: 7, .. }));
    }
}
