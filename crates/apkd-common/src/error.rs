/// Convenient Result alias for store collaborator calls.
pub type StoreResult<T> = Result<T, StoreError>;

/// Failures reported by a store collaborator.
///
/// "Unknown package" is not an error: lookups report it as an absent result.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store session error: {0}")]
    Session(String),

    #[error("Store request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    #[error("Store returned HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Malformed store response: {0}")]
    Protocol(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_context() {
        let err = StoreError::Status {
            url: "http://store/details?doc=com.example.app".into(),
            status: 503,
        };
        assert_eq!(
            err.to_string(),
            "Store returned HTTP 503 for http://store/details?doc=com.example.app"
        );

        let err: StoreError = std::io::Error::new(std::io::ErrorKind::Other, "disk full").into();
        assert_eq!(err.to_string(), "I/O error: disk full");
    }
}
