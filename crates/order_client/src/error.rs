use shared::{domain::OrderId, error::ActionError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("no card with order id {0} on the board")]
    UnknownCard(OrderId),
    #[error("no drag gesture in progress")]
    NoActiveDrag,
    #[error("order {0} already has a request in flight")]
    MoveInFlight(OrderId),
    #[error("another save for this order is still in flight")]
    SaveInFlight,
    #[error("field '{field}' is invalid: {message}")]
    Validation { field: String, message: String },
    #[error("server rejected the request: {message}")]
    Rejected { message: String },
    #[error("transport failure: {0:#}")]
    Transport(anyhow::Error),
    #[error("invalid settings: {0}")]
    Settings(String),
}

impl ClientError {
    /// Text a host should put in an error notice.
    pub fn notice_text(&self, transport_fallback: &str) -> String {
        match self {
            Self::Rejected { message } => message.clone(),
            Self::Transport(_) => transport_fallback.to_string(),
            other => other.to_string(),
        }
    }
}

impl From<ActionError> for ClientError {
    fn from(value: ActionError) -> Self {
        Self::Rejected {
            message: value.message,
        }
    }
}
