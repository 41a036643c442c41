use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use shared::{
    domain::{OrderId, Status},
    protocol::{ActionResponse, DeleteOrderRequest, MoveOrderRequest, OrderFields},
};

pub mod autosave;
pub mod board;
pub mod card_move;
pub mod config;
pub mod draft;
pub mod editor;
pub mod error;
pub mod transport;
pub mod validation;

pub use autosave::AutoSaveTask;
pub use board::{Board, CardPlacement};
pub use card_move::{CardMoveController, DragPhase, MoveOutcome};
pub use config::{load_settings, RollbackStrategy, Settings};
pub use draft::OrderDraft;
pub use editor::{AutoSaveOutcome, FieldMark, OrderEditor, SubmitOutcome};
pub use error::ClientError;
pub use transport::HttpOrderApi;
pub use validation::{FieldError, FieldRule, FieldSpec, FormReport, FormSchema};

/// The order endpoints this layer talks to. Every call resolves to the
/// decoded JSON body; an `Err` means no usable answer came back.
#[async_trait]
pub trait OrderApi: Send + Sync {
    async fn move_order(&self, request: &MoveOrderRequest) -> Result<ActionResponse>;
    async fn delete_order(&self, request: &DeleteOrderRequest) -> Result<ActionResponse>;
    async fn update_order(&self, fields: &OrderFields) -> Result<ActionResponse>;
    async fn auto_save_order(&self, fields: &OrderFields) -> Result<ActionResponse>;
    async fn save_draft(&self, fields: &OrderFields) -> Result<ActionResponse>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoSaveStatus {
    Saving,
    Saved,
    Failed,
}

/// What the host page should show or do. Nothing here is drawn by the
/// library itself.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    Notice {
        level: NoticeLevel,
        message: String,
    },
    CardMoved {
        order_id: OrderId,
        from: Status,
        to: Status,
    },
    CardReverted {
        order_id: OrderId,
        to: Status,
    },
    CardRemoved {
        order_id: OrderId,
    },
    /// The board must be refetched from the server.
    ReloadRequested,
    AutoSave(AutoSaveStatus),
    Navigate {
        path: String,
        after: Duration,
    },
}

impl ClientEvent {
    pub fn notice(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self::Notice {
            level,
            message: message.into(),
        }
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
