//! Error handling for sanitization operations.
//!
//! Every pipeline stage either returns a fully valid result or one of these
//! typed errors. Errors raised for a single input carry the input name,
//! channel and stage so a failure can be diagnosed from the message alone.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SanitizeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Alignment error: {message}")]
    Alignment { message: String },

    #[error("Missing feature for input '{input}' channel '{channel}' during {stage}: {reason}")]
    MissingFeature {
        input: String,
        channel: String,
        stage: String,
        reason: String,
    },

    #[error("Insufficient frequency: {message}")]
    InsufficientFrequency { message: String },
}

impl SanitizeError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an alignment error
    pub fn alignment(message: impl Into<String>) -> Self {
        Self::Alignment {
            message: message.into(),
        }
    }

    /// Create a missing feature error attributed to one input and channel
    pub fn missing_feature(
        input: impl Into<String>,
        channel: impl Into<String>,
        stage: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::MissingFeature {
            input: input.into(),
            channel: channel.into(),
            stage: stage.into(),
            reason: reason.into(),
        }
    }

    /// Create an insufficient frequency error
    pub fn insufficient_frequency(message: impl Into<String>) -> Self {
        Self::InsufficientFrequency {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SanitizeError>;
