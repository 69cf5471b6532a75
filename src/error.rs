//! Application-wide error types.
//!
//! Request-time failures live in [`crate::router::RouteError`]; this enum
//! covers startup and wiring.

use thiserror::Error;

use crate::llm::ProviderError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error("logger error: {0}")]
    Logger(String),

    #[error("knowledge error: {0}")]
    Knowledge(String),

    #[error("replies error: {0}")]
    Replies(String),

    #[error("comms error: {0}")]
    Comms(String),

    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn config_error_display() {
        let e = AppError::Config("missing field".into());
        assert!(e.to_string().contains("config error"));
        assert!(e.to_string().contains("missing field"));
    }

    #[test]
    fn knowledge_error_display() {
        let e = AppError::Knowledge("no records".into());
        assert!(e.to_string().contains("no records"));
    }

    #[test]
    fn provider_error_converts() {
        let e: AppError = ProviderError::UnknownProvider("mystery".into()).into();
        assert!(e.to_string().contains("mystery"));
    }

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let e: AppError = io_err.into();
        assert!(e.to_string().contains("io error"));
        let _: &dyn Error = &e;
    }
}
