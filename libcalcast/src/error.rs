//! Error types for Calcast

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CalcastError>;

#[derive(Error, Debug)]
pub enum CalcastError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    Remote(#[from] RemoteError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl CalcastError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CalcastError::InvalidInput(_) | CalcastError::NotFound(_) => 3,
            CalcastError::Remote(RemoteError::MissingCredential(_)) => 2,
            CalcastError::Remote(_) => 1,
            CalcastError::Config(_) => 1,
            CalcastError::Store(_) => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error on '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Stored data for '{key}' is corrupt: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Store lock poisoned")]
    Poisoned,
}

/// Failures talking to the generation and posting services
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("Missing credential: {0}")]
    MissingCredential(String),

    #[error("Network error: {0}")]
    Transport(String),

    #[error("Rejected by remote service: {0}")]
    Rejected(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_invalid_input() {
        let error = CalcastError::InvalidInput("Empty content".to_string());
        assert_eq!(error.exit_code(), 3);
    }

    #[test]
    fn test_exit_code_not_found() {
        let error = CalcastError::NotFound("post gen-1".to_string());
        assert_eq!(error.exit_code(), 3);
    }

    #[test]
    fn test_exit_code_missing_credential() {
        let error = CalcastError::Remote(RemoteError::MissingCredential(
            "No Ayrshare API key".to_string(),
        ));
        assert_eq!(error.exit_code(), 2);
    }

    #[test]
    fn test_exit_code_other_remote_errors() {
        for remote in [
            RemoteError::Transport("connection refused".to_string()),
            RemoteError::Rejected("Duplicate post".to_string()),
            RemoteError::MalformedResponse("expected array".to_string()),
        ] {
            assert_eq!(CalcastError::Remote(remote).exit_code(), 1);
        }
    }

    #[test]
    fn test_exit_code_store_and_config() {
        let store = CalcastError::Store(StoreError::Poisoned);
        assert_eq!(store.exit_code(), 1);

        let config = CalcastError::Config(ConfigError::MissingField("store.path".to_string()));
        assert_eq!(config.exit_code(), 1);
    }

    #[test]
    fn test_error_message_formatting_remote() {
        let error: CalcastError = RemoteError::Rejected("Post is a duplicate".to_string()).into();
        assert_eq!(
            error.to_string(),
            "Rejected by remote service: Post is a duplicate"
        );
    }

    #[test]
    fn test_error_message_formatting_corrupt() {
        let source = serde_json::from_str::<Vec<u32>>("{not json").unwrap_err();
        let error: CalcastError = StoreError::Corrupt {
            key: "posts".to_string(),
            source,
        }
        .into();
        let message = error.to_string();
        assert!(message.starts_with("Storage error: Stored data for 'posts' is corrupt"));
    }

    #[test]
    fn test_error_message_formatting_config() {
        let error = CalcastError::Config(ConfigError::MissingField(
            "config directory".to_string(),
        ));
        assert_eq!(
            error.to_string(),
            "Configuration error: Missing required field: config directory"
        );
    }

    #[test]
    fn test_remote_error_clone() {
        let original = RemoteError::Transport("timed out".to_string());
        assert_eq!(original.clone(), original);
    }
}
