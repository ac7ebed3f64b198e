//! Error types for fish progression.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProgressError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Fish is on cooldown for another {remaining_ms} ms")]
    OnCooldown { remaining_ms: u64 },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProgressError {
    /// Wire tag reported to the request layer
    pub fn kind(&self) -> &'static str {
        match self {
            ProgressError::InvalidInput(_) => "INVALID_INPUT",
            ProgressError::OnCooldown { .. } => "ON_COOLDOWN",
            ProgressError::Storage(_) | ProgressError::Io(_) | ProgressError::Json(_) => {
                "STORAGE_FAILURE"
            }
        }
    }

    /// Status hint for an HTTP layer sitting in front of the handler
    pub fn status_code(&self) -> u16 {
        match self {
            ProgressError::InvalidInput(_) => 400,
            ProgressError::OnCooldown { .. } => 429,
            ProgressError::Storage(_) | ProgressError::Io(_) | ProgressError::Json(_) => 503,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        ProgressError::InvalidInput(message.into())
    }

    pub fn is_storage(&self) -> bool {
        self.kind() == "STORAGE_FAILURE"
    }
}

pub type Result<T> = std::result::Result<T, ProgressError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(ProgressError::invalid("x").kind(), "INVALID_INPUT");
        assert_eq!(
            ProgressError::OnCooldown { remaining_ms: 5 }.kind(),
            "ON_COOLDOWN"
        );
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let err: ProgressError = io.into();
        assert_eq!(err.kind(), "STORAGE_FAILURE");
        assert!(err.is_storage());
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ProgressError::invalid("x").status_code(), 400);
        assert_eq!(
            ProgressError::OnCooldown { remaining_ms: 1 }.status_code(),
            429
        );
        assert_eq!(ProgressError::Storage("x".into()).status_code(), 503);
    }
}
