use thiserror::Error;
use serde_json::Error as JsonError;

use crate::models::environment::Environment;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EnvError {
    #[error("Unknown environment: {0}")]
    UnknownEnvironment(String),

    #[error("Registry has no entry for environment: {0}")]
    MissingEntry(Environment),

    #[error("Invalid API URL for {environment}: {url:?} ({reason})")]
    InvalidUrl {
        environment: Environment,
        url: String,
        reason: String,
    },

    #[error("Unsupported URL scheme for {environment}: {scheme} (expected http or https)")]
    UnsupportedScheme {
        environment: Environment,
        scheme: String,
    },

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Conversion error: {0}")]
    Conversion(String),
}

impl EnvError {
    /// True for the errors that mean a registry entry carries a bad URL.
    pub fn is_malformed_url(&self) -> bool {
        matches!(self, EnvError::InvalidUrl { .. } | EnvError::UnsupportedScheme { .. })
    }
}

impl From<std::io::Error> for EnvError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<JsonError> for EnvError {
    fn from(error: JsonError) -> Self {
        Self::Conversion(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EnvError>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_unknown_environment_message() {
        let err = EnvError::UnknownEnvironment("staging".to_string());
        assert_eq!(err.to_string(), "Unknown environment: staging");
        assert!(!err.is_malformed_url());
    }

    #[test]
    fn test_invalid_url_message_names_environment() {
        let err = EnvError::InvalidUrl {
            environment: Environment::Test,
            url: "not a url".to_string(),
            reason: "relative URL without a base".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid API URL for test: \"not a url\" (relative URL without a base)"
        );
        assert!(err.is_malformed_url());
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: EnvError = json_err.into();
        assert!(matches!(err, EnvError::Conversion(_)));
    }
}
