use std::fmt::Display;
use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LauncherError {
    #[error("Fetch error: {0}")]
    Fetch(String),
    #[error("Extract error: {0}")]
    Extract(String),
    #[error("Store error: {0}")]
    Store(String),
    #[error("Process error: {0}")]
    Process(String),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Config error: {0}")]
    Config(String),
}

impl LauncherError {
    pub fn fetch(err: impl Display) -> Self {
        Self::Fetch(err.to_string())
    }

    pub fn extract(err: impl Display) -> Self {
        Self::Extract(err.to_string())
    }

    pub fn store(err: impl Display) -> Self {
        Self::Store(err.to_string())
    }

    pub fn process(err: impl Display) -> Self {
        Self::Process(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LauncherError>;
