use std::{collections::VecDeque, sync::Arc};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::protocol::{ActionResponse, DeleteOrderRequest, MoveOrderRequest, OrderFields};
use tokio::sync::{Mutex, Notify};

use crate::OrderApi;

pub(crate) enum Reply {
    Respond(ActionResponse),
    Fail(&'static str),
}

/// In-memory `OrderApi` that records every call and answers from a script.
/// An empty script answers `{success: true}`.
#[derive(Default)]
pub(crate) struct RecordingApi {
    pub moves: Mutex<Vec<MoveOrderRequest>>,
    pub deletes: Mutex<Vec<DeleteOrderRequest>>,
    pub forms: Mutex<Vec<(&'static str, OrderFields)>>,
    replies: Mutex<VecDeque<Reply>>,
    hold: Option<Arc<Notify>>,
}

impl RecordingApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replying(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Every call waits for a `notify_one` on the returned handle before
    /// answering.
    pub fn held(mut self) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        self.hold = Some(Arc::clone(&gate));
        (self, gate)
    }

    pub async fn move_count(&self) -> usize {
        self.moves.lock().await.len()
    }

    pub async fn form_calls(&self, endpoint: &str) -> Vec<OrderFields> {
        self.forms
            .lock()
            .await
            .iter()
            .filter(|(called, _)| *called == endpoint)
            .map(|(_, fields)| fields.clone())
            .collect()
    }

    async fn answer(&self) -> Result<ActionResponse> {
        if let Some(gate) = &self.hold {
            gate.notified().await;
        }
        match self.replies.lock().await.pop_front() {
            Some(Reply::Respond(response)) => Ok(response),
            Some(Reply::Fail(message)) => Err(anyhow!(message)),
            None => Ok(ActionResponse::ok()),
        }
    }

    async fn record_form(&self, endpoint: &'static str, fields: &OrderFields) -> Result<ActionResponse> {
        self.forms.lock().await.push((endpoint, fields.clone()));
        self.answer().await
    }
}

#[async_trait]
impl OrderApi for RecordingApi {
    async fn move_order(&self, request: &MoveOrderRequest) -> Result<ActionResponse> {
        self.moves.lock().await.push(request.clone());
        self.answer().await
    }

    async fn delete_order(&self, request: &DeleteOrderRequest) -> Result<ActionResponse> {
        self.deletes.lock().await.push(request.clone());
        self.answer().await
    }

    async fn update_order(&self, fields: &OrderFields) -> Result<ActionResponse> {
        self.record_form("/update_order", fields).await
    }

    async fn auto_save_order(&self, fields: &OrderFields) -> Result<ActionResponse> {
        self.record_form("/auto_save_order", fields).await
    }

    async fn save_draft(&self, fields: &OrderFields) -> Result<ActionResponse> {
        self.record_form("/save_draft", fields).await
    }
}
