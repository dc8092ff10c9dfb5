//! Application metadata resolution and artifact naming.

use apkd_common::StoreError;

use super::identifier::PackageIdentifier;
use super::store::{RawDetails, StoreSession};

/// Metadata for one application, as resolved from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationMetadata {
    pub package_name: PackageIdentifier,
    pub title: String,
    pub creator: String,
    pub version_code: i64,
    pub version_string: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("Unable to retrieve application with package name '{package}'")]
    NotFound { package: String },

    #[error("Store returned unusable metadata for '{package}': {reason}")]
    Unsafe { package: String, reason: String },

    #[error("Store lookup for '{package}' failed: {source}")]
    Store {
        package: String,
        #[source]
        source: StoreError,
    },
}

/// Resolve metadata for `id` within an open store session.
pub async fn resolve(
    session: &dyn StoreSession,
    id: &PackageIdentifier,
) -> Result<ApplicationMetadata, ResolveError> {
    let raw = session
        .fetch_details(id.as_str())
        .await
        .map_err(|source| ResolveError::Store {
            package: id.to_string(),
            source,
        })?
        .ok_or_else(|| ResolveError::NotFound {
            package: id.to_string(),
        })?;

    ApplicationMetadata::from_raw(id, raw)
}

impl ApplicationMetadata {
    /// Convert a raw details document, requiring every field.
    ///
    /// Missing fields mean the store does not really know the package.
    /// Present but unsafe values (a package name outside the grammar, a
    /// version containing path separators) are rejected outright since they
    /// end up in a filesystem path.
    fn from_raw(id: &PackageIdentifier, raw: RawDetails) -> Result<Self, ResolveError> {
        let not_found = || ResolveError::NotFound {
            package: id.to_string(),
        };

        let app = raw
            .details
            .and_then(|d| d.app_details)
            .ok_or_else(not_found)?;
        let docid = raw.docid.filter(|s| !s.is_empty()).ok_or_else(not_found)?;
        let title = raw.title.ok_or_else(not_found)?;
        let creator = raw.creator.ok_or_else(not_found)?;
        let version_code = app.version_code.ok_or_else(not_found)?;
        let version_string = app
            .version_string
            .filter(|s| !s.is_empty())
            .ok_or_else(not_found)?;

        let unsafe_value = |reason: String| ResolveError::Unsafe {
            package: id.to_string(),
            reason,
        };

        let package_name = PackageIdentifier::parse(&docid)
            .ok_or_else(|| unsafe_value(format!("invalid package name {:?}", docid)))?;

        if !is_safe_version(&version_string) {
            return Err(unsafe_value(format!(
                "invalid version string {:?}",
                version_string
            )));
        }

        Ok(Self {
            package_name,
            title,
            creator,
            version_code,
            version_string,
        })
    }
}

fn is_safe_version(version: &str) -> bool {
    !version
        .chars()
        .any(|c| c == '/' || c == '\\' || c.is_control())
}

/// Filename for the APK described by `meta`: `{package}_{version}({code}).apk`.
pub fn artifact_filename(meta: &ApplicationMetadata) -> String {
    format!(
        "{}_{}({}).apk",
        meta.package_name, meta.version_string, meta.version_code
    )
}
