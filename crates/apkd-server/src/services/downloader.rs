//! Download orchestration.

use std::path::{Path, PathBuf};

use super::identifier::PackageIdentifier;
use super::metadata::{artifact_filename, ApplicationMetadata};
use super::store::StoreSession;

/// A concrete download: which package, and where it lands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub package: PackageIdentifier,
    pub filename: String,
    pub destination: PathBuf,
}

impl DownloadRequest {
    /// Build the request for `meta` under `download_root`.
    pub fn new(meta: &ApplicationMetadata, download_root: &Path) -> Self {
        let filename = artifact_filename(meta);
        Self {
            package: meta.package_name.clone(),
            destination: download_root.join(&filename),
            filename,
        }
    }
}

/// Run the store download for `request`.
///
/// Returns `true` only when the store reports a complete write. Store errors
/// are logged and reported as `false`; the caller cannot tell them apart.
pub async fn download(session: &dyn StoreSession, request: &DownloadRequest) -> bool {
    match session
        .download_artifact(request.package.as_str(), &request.destination)
        .await
    {
        Ok(true) => {
            tracing::info!(
                package = %request.package,
                path = %request.destination.display(),
                "Package downloaded"
            );
            true
        }
        Ok(false) => {
            tracing::error!(
                severity = "critical",
                package = %request.package,
                "Error when downloading '{}'",
                request.package
            );
            false
        }
        Err(e) => {
            tracing::error!(
                severity = "critical",
                package = %request.package,
                error = %e,
                "Store failed while downloading '{}'",
                request.package
            );
            false
        }
    }
}
