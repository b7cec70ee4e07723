use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoffreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to decode {}: {} (parser: {})", .path.display(), .reason, .parser)]
    Decode {
        path: PathBuf,
        parser: &'static str,
        reason: String,
    },

    #[error("{0}")]
    Other(String),
}

impl CoffreError {
    /// Build a decode error carrying the offending path and the parser
    /// configuration that was attempted.
    pub fn decode(path: &std::path::Path, parser: &'static str, reason: impl Into<String>) -> Self {
        Self::Decode {
            path: path.to_path_buf(),
            parser,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoffreError>;
