//! Error types for Servline.
//!
//! Library code returns [`Result<T>`] and propagates with `?`. User-input
//! problems (bad form fields, rejected text) are not errors at this level;
//! they live in [`crate::records::SubmissionError`] and
//! [`crate::safety::Rejection`].

use thiserror::Error;

/// Errors raised while talking to the upstream feature service or while
/// loading configuration.
#[derive(Error, Debug)]
pub enum ServlineError {
    /// Missing or malformed configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Token could not be obtained from the token endpoint
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The feature service answered, but not with what we asked for
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// The feature service refused to add a feature
    #[error("Add feature failed ({}): {description}", .code.map(|c| c.to_string()).unwrap_or_else(|| "no code".to_string()))]
    AddFeature {
        /// ArcGIS error code, when one was returned.
        code: Option<i64>,
        /// ArcGIS error description.
        description: String,
    },

    /// `addFeatures` answered without any per-feature result
    #[error("No results returned from server")]
    NoAddResults {
        /// Response body as received.
        details: serde_json::Value,
    },

    /// Transport-level HTTP failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON encoding or decoding failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type used throughout the library.
pub type Result<T> = std::result::Result<T, ServlineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_feature_display_with_code() {
        let err = ServlineError::AddFeature {
            code: Some(1000),
            description: "Field LOCDESC is too long".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Add feature failed (1000): Field LOCDESC is too long"
        );
    }

    #[test]
    fn test_add_feature_display_without_code() {
        let err = ServlineError::AddFeature {
            code: None,
            description: "Unknown error occurred".to_string(),
        };
        assert!(err.to_string().contains("no code"));
    }

    #[test]
    fn test_json_error_converts() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: ServlineError = parse.unwrap_err().into();
        assert!(matches!(err, ServlineError::Json(_)));
    }
}
