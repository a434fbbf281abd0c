use std::time::Duration;

use thiserror::Error;

/// Top-level error type for the Saarthi system.
///
/// Stage crates define their own error types; this one covers the
/// cross-cutting concerns (configuration, serialization, I/O) that every
/// crate shares.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SaarthiError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid input: {0}")]
    InvalidInput(#[from] InputError),
}

impl From<toml::de::Error> for SaarthiError {
    fn from(err: toml::de::Error) -> Self {
        SaarthiError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for SaarthiError {
    fn from(err: toml::ser::Error) -> Self {
        SaarthiError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for SaarthiError {
    fn from(err: serde_json::Error) -> Self {
        SaarthiError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Saarthi operations.
pub type Result<T> = std::result::Result<T, SaarthiError>;

/// Why an utterance was rejected before any stage ran.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("message cannot be empty")]
    Empty,
    #[error("message exceeds maximum length of {0} characters")]
    TooLong(usize),
}

/// Failure reported by a completion capability.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompletionError {
    #[error("completion service unavailable: {0}")]
    Unavailable(String),
    #[error("completion request rejected: {0}")]
    Rejected(String),
    #[error("completion timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
    #[error("completion returned no content")]
    Empty,
}

/// Failure reported by a grounding capability.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GroundingError {
    #[error("grounding service unavailable: {0}")]
    Unavailable(String),
    #[error("grounding search failed: {0}")]
    Search(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SaarthiError::Config("missing field".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing field");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: SaarthiError = io_err.into();
        assert!(matches!(err, SaarthiError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_error_from_toml_de() {
        let bad_toml = "invalid = [[[";
        let err: std::result::Result<toml::Value, _> = toml::from_str(bad_toml);
        let err: SaarthiError = err.unwrap_err().into();
        assert!(matches!(err, SaarthiError::Config(_)));
    }

    #[test]
    fn test_error_from_serde_json() {
        let err: std::result::Result<serde_json::Value, _> = serde_json::from_str("{ nope }");
        let err: SaarthiError = err.unwrap_err().into();
        assert!(matches!(err, SaarthiError::Serialization(_)));
    }

    #[test]
    fn test_input_error_display() {
        assert_eq!(InputError::Empty.to_string(), "message cannot be empty");
        assert_eq!(
            InputError::TooLong(2000).to_string(),
            "message exceeds maximum length of 2000 characters"
        );
        let wrapped: SaarthiError = InputError::Empty.into();
        assert_eq!(wrapped.to_string(), "Invalid input: message cannot be empty");
    }

    #[test]
    fn test_completion_error_display() {
        assert_eq!(
            CompletionError::Timeout(Duration::from_millis(1500)).to_string(),
            "completion timed out after 1500ms"
        );
        assert_eq!(
            CompletionError::Unavailable("connection refused".into()).to_string(),
            "completion service unavailable: connection refused"
        );
        assert_eq!(
            CompletionError::Empty.to_string(),
            "completion returned no content"
        );
    }

    #[test]
    fn test_grounding_error_display() {
        assert_eq!(
            GroundingError::Search("index missing".into()).to_string(),
            "grounding search failed: index missing"
        );
    }

    #[test]
    fn test_result_type_with_question_mark() {
        fn inner() -> Result<i32> {
            let v: serde_json::Value = serde_json::from_str("42")?;
            Ok(v.as_i64().unwrap_or_default() as i32)
        }
        assert_eq!(inner().unwrap(), 42);
    }
}
