//! Error Types

use thiserror::Error;

use crate::processor::ProcessorError;
use crate::request::ValidationError;

/// Result type alias
pub type Result<T> = std::result::Result<T, DonationError>;

/// Donation workflow errors
#[derive(Error, Debug)]
pub enum DonationError {
    /// Request rejected before any remote call
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Card declined during subscription creation
    #[error("card declined: {message}")]
    CardDeclined { message: String },

    /// Any other processor failure, at any step
    #[error("payment processor failure: {0}")]
    Processor(ProcessorError),

    /// Processor reported requires-action without a client secret
    #[error("processor reported requires_action without a client secret")]
    MissingClientSecret,

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl DonationError {
    /// Message safe to show the caller. Validation failures name the
    /// violated field; declines carry the processor's user-facing message;
    /// everything else is generic. Raw processor text never leaks.
    pub fn user_message(&self) -> String {
        match self {
            DonationError::Validation(err) => err.to_string(),
            DonationError::CardDeclined { message } => message.clone(),
            _ => "Internal server error".to_string(),
        }
    }
}
