//! Package identifier validation.
//!
//! Android package names are reverse-domain strings: at least two
//! dot-separated segments, each starting with a letter and followed by
//! letters, digits or underscores.
//! See <https://developer.android.com/guide/topics/manifest/manifest-element#package>.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

/// A package name that passed the reverse-domain grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageIdentifier(String);

impl PackageIdentifier {
    /// Validate `raw` and wrap it unmodified.
    ///
    /// Returns `None` for anything outside the grammar.
    pub fn parse(raw: &str) -> Option<Self> {
        is_valid_package_name(raw).then(|| Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PackageIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether `raw` matches the package name grammar.
pub fn is_valid_package_name(raw: &str) -> bool {
    package_pattern().is_match(raw)
}

// Both letter cases are spelled out: Unicode case folding would let `(?i)`
// accept non-ASCII lookalikes such as the Kelvin sign.
fn package_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z][A-Za-z0-9_]*(\.[A-Za-z][A-Za-z0-9_]*)+$")
            .expect("package name pattern compiles")
    })
}
