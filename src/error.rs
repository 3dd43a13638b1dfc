//! Engine error types.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors surfaced by the skill resolution and matching engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Caller supplied a parameter outside its valid range
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Canonical skill list missing, malformed, or empty
    #[error("Vocabulary unavailable: {0}")]
    VocabularyUnavailable(String),

    /// Requested role is not defined in the role catalog
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    /// Embedding provider failed or returned an unusable batch
    #[error("Embedding unavailable: {0}")]
    EmbeddingUnavailable(String),
}

impl EngineError {
    /// True when the caller can fix the request; everything else is a
    /// server-side or dependency failure.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_) | Self::UnknownRole(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(EngineError::UnknownRole("Astronaut".into()).is_client_error());
        assert!(EngineError::InvalidInput("cutoff".into()).is_client_error());
        assert!(!EngineError::EmbeddingUnavailable("timeout".into()).is_client_error());
        assert!(!EngineError::VocabularyUnavailable("missing".into()).is_client_error());
    }

    #[test]
    fn test_error_display() {
        let err = EngineError::UnknownRole("Astronaut".into());
        assert_eq!(err.to_string(), "Unknown role: Astronaut");
    }
}
