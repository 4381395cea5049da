//! Error types for MOD file parsing and playback

/// Error type for module decoding and playback operations
#[derive(thiserror::Error, Debug)]
pub enum ModError {
    /// The magic signature at offset 1080 matched no known tracker dialect
    #[error("Unknown tracker signature: {0:02x?}")]
    UnknownSignature([u8; 4]),

    /// The stream ended before an expected field could be read
    #[error("Truncated module: {0}")]
    Truncated(String),

    /// IO error from filesystem
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A parsed count exceeds a format-mandated ceiling (32 channels, 128 patterns)
    #[error("Capacity exceeded: {0}")]
    CapacityExceeded(String),

    /// Pattern data violates a note invariant
    #[error("Malformed pattern data: {0}")]
    MalformedPattern(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<String> for ModError {
    fn from(s: String) -> Self {
        ModError::Other(s)
    }
}

impl From<&str> for ModError {
    fn from(s: &str) -> Self {
        ModError::Other(s.to_string())
    }
}

/// Result type for module operations
pub type Result<T> = std::result::Result<T, ModError>;
