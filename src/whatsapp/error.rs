use thiserror::Error;

use super::client::ClientError;
use crate::config::ConfigError;
use crate::error::DiError;

/// Errors of the application shell.
#[derive(Debug, Error)]
pub enum WaError {
    #[error("client error: {0}")]
    Client(#[from] ClientError),
    #[error("message handler failed: {0:#}")]
    Handler(#[source] anyhow::Error),
    #[error("service wiring failed: {0}")]
    Di(#[from] DiError),
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("socket is not connected")]
    NotConnected,
}

pub type WaResult<T> = Result<T, WaError>;
