//! Error types for loading payloads and registering schemas.

use std::path::PathBuf;
use thiserror::Error;

/// Errors while loading or decoding a registration batch or validate request.
#[derive(Debug, Error)]
pub enum LoadError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    NetworkError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    // Decode errors (exit code 2)
    #[error("error decoding request body: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid payload: {}", errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
    InvalidPayload { errors: Vec<PayloadError> },
}

/// Single structural problem in a decoded payload.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PayloadError {
    /// JSON Pointer (RFC 6901) to the offending element.
    pub path: String,
    /// Human-readable error message.
    pub message: String,
}

impl std::fmt::Display for PayloadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::FileNotFound { .. } | LoadError::ReadError { .. } => 3,
            #[cfg(feature = "remote")]
            LoadError::NetworkError { .. } => 3,
            _ => 2,
        }
    }
}

/// Errors raised by a [`SchemaStore`](crate::SchemaStore) backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("empty key")]
    EmptyKey,
}

/// Errors during schema registration.
#[derive(Debug, Error)]
pub enum RegisterError {
    /// One entry of a batch failed. Entries before `index` remain registered.
    #[error("failed to register schema #{index} ({key}): {source}")]
    Entry {
        index: usize,
        key: String,
        #[source]
        source: StoreError,
    },
}

impl RegisterError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_error_exit_codes() {
        let err = LoadError::FileNotFound {
            path: PathBuf::from("schemas.json"),
        };
        assert_eq!(err.exit_code(), 3);

        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = LoadError::InvalidJson { source };
        assert_eq!(err.exit_code(), 2);

        let err = LoadError::InvalidPayload { errors: vec![] };
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn invalid_json_keeps_decoder_message() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let detail = source.to_string();
        let err = LoadError::InvalidJson { source };
        assert!(err.to_string().starts_with("error decoding request body: "));
        assert!(err.to_string().contains(&detail));
    }

    #[test]
    fn payload_error_display() {
        let err = PayloadError {
            path: "/0/method".into(),
            message: "\"method\" is a required property".into(),
        };
        assert_eq!(
            err.to_string(),
            "/0/method: \"method\" is a required property"
        );

        let err = PayloadError {
            path: String::new(),
            message: "expected array".into(),
        };
        assert_eq!(err.to_string(), "expected array");
    }

    #[test]
    fn register_error_names_entry() {
        let err = RegisterError::Entry {
            index: 2,
            key: "/users-GET".into(),
            source: StoreError::EmptyKey,
        };
        assert_eq!(
            err.to_string(),
            "failed to register schema #2 (/users-GET): empty key"
        );
        assert_eq!(err.exit_code(), 2);
    }
}
