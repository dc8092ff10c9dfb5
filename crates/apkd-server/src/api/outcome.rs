//! Download outcome and its HTTP mapping.
//!
//! Download failures are reported as 400 rather than a 5xx even though they
//! originate upstream. Clients rely on that status.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

pub const INVALID_PACKAGE: &str = "Not valid package";
pub const STATUS_NOT_FOUND: &str = "not valid";
pub const STATUS_DOWNLOAD_FAILED: &str = "Error when downloading";

/// Result of one download request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Success {
        package: String,
        filename: String,
        version: String,
        version_code: i64,
    },
    NotFound {
        package: String,
    },
    DownloadFailed {
        package: String,
    },
    InvalidIdentifier {
        raw: String,
    },
    InternalError {
        detail: String,
    },
}

impl DownloadOutcome {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Success { .. } => StatusCode::OK,
            Self::NotFound { .. } | Self::DownloadFailed { .. } | Self::InvalidIdentifier { .. } => {
                StatusCode::BAD_REQUEST
            }
            Self::InternalError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn body(&self) -> Value {
        match self {
            Self::Success {
                package,
                filename,
                version,
                version_code,
            } => json!({
                "package": package,
                "filename": filename,
                "version": version,
                "version_code": version_code,
            }),
            Self::NotFound { package } => json!({
                "package": package,
                "status": STATUS_NOT_FOUND,
            }),
            Self::DownloadFailed { package } => json!({
                "package": package,
                "status": STATUS_DOWNLOAD_FAILED,
            }),
            Self::InvalidIdentifier { .. } => json!(INVALID_PACKAGE),
            Self::InternalError { detail } => json!(detail),
        }
    }

    /// The package name, raw input or error text the outcome is about.
    pub fn subject(&self) -> &str {
        match self {
            Self::Success { package, .. }
            | Self::NotFound { package }
            | Self::DownloadFailed { package } => package,
            Self::InvalidIdentifier { raw } => raw,
            Self::InternalError { detail } => detail,
        }
    }
}

impl IntoResponse for DownloadOutcome {
    fn into_response(self) -> Response {
        let status = self.status_code();
        tracing::debug!(
            status = status.as_u16(),
            subject = self.subject(),
            "Download request finished"
        );
        (status, Json(self.body())).into_response()
    }
}
