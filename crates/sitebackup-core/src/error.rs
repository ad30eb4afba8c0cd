//! Error types for sitebackup-core

use thiserror::Error;

/// Result type alias using sitebackup-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for sitebackup
#[derive(Error, Debug)]
pub enum Error {
    /// Strategy code matches neither `L<n>` nor `<d>D<w>W<m>M`
    #[error("Invalid thinning strategy '{input}' (expected L<n> or <d>D<w>W<m>M)")]
    InvalidStrategy { input: String },

    /// Strategy parameter is zero or negative
    #[error("Thinning strategy '{input}' requires positive parameters")]
    NonPositiveParameter { input: String },

    /// Timestamp does not follow the YYYYMMDDhhmmss format
    #[error("Invalid timestamp '{timestamp}' (expected YYYYMMDDhhmmss)")]
    InvalidTimestamp { timestamp: String },

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Invalid configuration content
    #[error("Invalid configuration format: {message}")]
    InvalidConfig { message: String },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an invalid strategy error
    pub fn invalid_strategy(input: impl Into<String>) -> Self {
        Self::InvalidStrategy {
            input: input.into(),
        }
    }

    /// Create a non-positive parameter error
    pub fn non_positive(input: impl Into<String>) -> Self {
        Self::NonPositiveParameter {
            input: input.into(),
        }
    }

    /// Create an invalid timestamp error
    pub fn invalid_timestamp(timestamp: impl Into<String>) -> Self {
        Self::InvalidTimestamp {
            timestamp: timestamp.into(),
        }
    }

    /// Create a config not found error
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}
