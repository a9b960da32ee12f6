use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnyChatError>;

#[derive(Error, Debug)]
pub enum AnyChatError {
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod chat;
pub mod commands;
pub mod config;
pub mod mcp;
