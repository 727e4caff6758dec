use thiserror::Error;

use crate::dnssec::DnsSecError;
use crate::dnssec::record::NameError;

/// Errors raised while loading configuration, trust anchors or chain files
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value}")]
    InvalidValue { var: String, value: String },

    #[error("Failed to read {path}: {message}")]
    Io { path: String, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid trust anchor: {0}")]
    InvalidAnchor(String),

    #[error("Invalid domain name: {0}")]
    InvalidName(#[from] NameError),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Invalid base64 data: {0}")]
    InvalidBase64(String),

    #[error("Invalid hex digest: {0}")]
    InvalidHex(String),

    #[error("Invalid chain: {0}")]
    Chain(#[from] DnsSecError),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

impl From<base64::DecodeError> for ConfigError {
    fn from(err: base64::DecodeError) -> Self {
        ConfigError::InvalidBase64(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Read a whole file, mapping failures to [`ConfigError::Io`]
pub(crate) fn read_file(path: &std::path::Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|err| ConfigError::Io {
        path: path.display().to_string(),
        message: err.to_string(),
    })
}
