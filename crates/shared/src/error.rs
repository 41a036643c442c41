use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::protocol::ActionResponse;

/// The server answered `success: false` to an order action.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("rejected: {message}")]
pub struct ActionError {
    pub message: String,
}

impl ActionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// `None` for a successful response; otherwise the server message, or
    /// `fallback` when the server did not send one.
    pub fn from_response(response: &ActionResponse, fallback: &str) -> Option<Self> {
        if response.success {
            return None;
        }
        let message = response
            .message
            .as_deref()
            .filter(|message| !message.trim().is_empty())
            .unwrap_or(fallback);
        Some(Self::new(message))
    }
}
