//! Order edit form controller: live validation, change tracking, manual
//! draft save, submit and auto-save against the order endpoints.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use chrono::{Local, NaiveDate};
use shared::{error::ActionError, protocol::OrderFields};
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

use crate::{
    config::Settings,
    draft::OrderDraft,
    error::ClientError,
    validation::{FieldError, FormReport, FormSchema},
    AutoSaveStatus, ClientEvent, NoticeLevel, OrderApi,
};

pub const DASHBOARD_PATH: &str = "/dashboard";
pub const REDIRECT_DELAY: Duration = Duration::from_millis(1500);
const FORM_INVALID_NOTICE: &str = "Please fix the errors above before submitting the form.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldMark {
    Valid,
    Invalid {
        message: String,
        highlight_until: Instant,
    },
}

impl FieldMark {
    /// Error styling fades after the highlight window even if the value is
    /// still wrong; the message stays until the field is revalidated.
    pub fn is_highlighted(&self, now: Instant) -> bool {
        match self {
            Self::Valid => false,
            Self::Invalid {
                highlight_until, ..
            } => now < *highlight_until,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Valid => None,
            Self::Invalid { message, .. } => Some(message.as_str()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoSaveOutcome {
    /// Nothing unsaved; no request sent.
    Clean,
    /// Another save owns the form right now.
    Busy,
    Saved,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOutcome {
    pub redirect_to: String,
    pub after: Duration,
}

struct EditorState {
    draft: OrderDraft,
    marks: HashMap<String, FieldMark>,
}

/// Releases the form's single-flight slot when a save finishes or its future
/// is dropped.
struct SaveSlot<'a>(&'a AtomicBool);

impl<'a> SaveSlot<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for SaveSlot<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

type TodayFn = dyn Fn() -> NaiveDate + Send + Sync;

pub struct OrderEditor {
    api: Arc<dyn OrderApi>,
    settings: Settings,
    schema: FormSchema,
    today: Arc<TodayFn>,
    inner: Mutex<EditorState>,
    save_in_flight: AtomicBool,
    events: broadcast::Sender<ClientEvent>,
}

impl OrderEditor {
    pub fn new(api: Arc<dyn OrderApi>, settings: Settings, original: OrderFields) -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            api,
            settings,
            schema: FormSchema::order_form(),
            today: Arc::new(|| Local::now().date_naive()),
            inner: Mutex::new(EditorState {
                draft: OrderDraft::new(original),
                marks: HashMap::new(),
            }),
            save_in_flight: AtomicBool::new(false),
            events,
        }
    }

    pub fn with_schema(mut self, schema: FormSchema) -> Self {
        self.schema = schema;
        self
    }

    /// Overrides the local calendar used by the startup date rule.
    pub fn with_today(mut self, today: impl Fn() -> NaiveDate + Send + Sync + 'static) -> Self {
        self.today = Arc::new(today);
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: ClientEvent) {
        let _ = self.events.send(event);
    }

    fn mark_for(&self, outcome: &Result<(), FieldError>, now: Instant) -> FieldMark {
        match outcome {
            Ok(()) => FieldMark::Valid,
            Err(err) => FieldMark::Invalid {
                message: err.to_string(),
                highlight_until: now + self.settings.error_highlight,
            },
        }
    }

    /// Input/change handler: records the value and revalidates the field.
    pub async fn on_input(&self, name: &str, value: &str) -> Result<(), FieldError> {
        let outcome = self.schema.validate_field(name, value, (self.today)());
        let mark = self.mark_for(&outcome, Instant::now());
        let mut guard = self.inner.lock().await;
        guard.draft.set(name, value);
        guard.marks.insert(name.to_string(), mark);
        outcome
    }

    /// Blur handler. Only the configured auto-save fields trigger a save.
    pub async fn on_blur(&self, name: &str) -> Option<AutoSaveOutcome> {
        if !self.settings.is_auto_save_field(name) {
            return None;
        }
        Some(self.auto_save().await)
    }

    /// Validates the whole form and refreshes every field mark.
    pub async fn validate_all(&self) -> FormReport {
        self.validated_snapshot().await.0
    }

    /// The report and the exact values it was computed from.
    async fn validated_snapshot(&self) -> (FormReport, OrderFields) {
        let now = Instant::now();
        let mut guard = self.inner.lock().await;
        let snapshot = guard.draft.current().clone();
        let report = self.schema.validate(&snapshot, (self.today)());
        for (name, outcome) in &report.outcomes {
            let mark = self.mark_for(outcome, now);
            guard.marks.insert(name.clone(), mark);
        }
        (report, snapshot)
    }

    pub async fn field_mark(&self, name: &str) -> Option<FieldMark> {
        self.inner.lock().await.marks.get(name).cloned()
    }

    pub async fn value(&self, name: &str) -> String {
        self.inner.lock().await.draft.value(name).to_string()
    }

    pub async fn snapshot(&self) -> OrderFields {
        self.inner.lock().await.draft.current().clone()
    }

    pub async fn has_unsaved_changes(&self) -> bool {
        self.inner.lock().await.draft.has_unsaved_changes()
    }

    /// Navigation guard text, when leaving would lose edits.
    pub async fn leave_prompt(&self) -> Option<&'static str> {
        self.inner.lock().await.draft.leave_prompt()
    }

    /// Restores the last saved values. Returns false when there was nothing
    /// to reset.
    pub async fn reset(&self) -> bool {
        let mut guard = self.inner.lock().await;
        if !guard.draft.reset() {
            return false;
        }
        guard.marks.clear();
        drop(guard);
        self.emit(ClientEvent::notice(
            NoticeLevel::Info,
            "Form reset to original values",
        ));
        true
    }

    pub async fn auto_save(&self) -> AutoSaveOutcome {
        let Some(_slot) = SaveSlot::acquire(&self.save_in_flight) else {
            return AutoSaveOutcome::Busy;
        };
        let snapshot = {
            let guard = self.inner.lock().await;
            if !guard.draft.has_unsaved_changes() {
                return AutoSaveOutcome::Clean;
            }
            guard.draft.current().clone()
        };

        self.emit(ClientEvent::AutoSave(AutoSaveStatus::Saving));
        match self.api.auto_save_order(&snapshot).await {
            Ok(response) if response.success => {
                self.inner.lock().await.draft.mark_saved(snapshot);
                self.emit(ClientEvent::AutoSave(AutoSaveStatus::Saved));
                AutoSaveOutcome::Saved
            }
            Ok(response) => {
                warn!(message = ?response.message, "auto-save rejected");
                self.emit(ClientEvent::AutoSave(AutoSaveStatus::Failed));
                AutoSaveOutcome::Failed
            }
            Err(err) => {
                warn!(error = %err, "auto-save failed");
                self.emit(ClientEvent::AutoSave(AutoSaveStatus::Failed));
                AutoSaveOutcome::Failed
            }
        }
    }

    /// Manual draft save; sent even without unsaved changes.
    pub async fn save_draft(&self) -> Result<(), ClientError> {
        let _slot = SaveSlot::acquire(&self.save_in_flight).ok_or(ClientError::SaveInFlight)?;
        let snapshot = self.snapshot().await;

        let response = match self.api.save_draft(&snapshot).await {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "draft save failed");
                self.emit(ClientEvent::notice(NoticeLevel::Error, "Error saving draft"));
                return Err(ClientError::Transport(err));
            }
        };
        if let Some(err) = ActionError::from_response(&response, "Failed to save draft") {
            self.emit(ClientEvent::notice(NoticeLevel::Error, "Failed to save draft"));
            return Err(err.into());
        }

        self.inner.lock().await.draft.mark_saved(snapshot);
        self.emit(ClientEvent::notice(
            NoticeLevel::Success,
            "Draft saved successfully!",
        ));
        Ok(())
    }

    /// Validates, then sends the full form to `/update_order`. The values sent
    /// are the ones that passed validation; later edits stay unsaved.
    pub async fn submit(&self) -> Result<SubmitOutcome, ClientError> {
        let (report, snapshot) = self.validated_snapshot().await;
        if let Some((field, err)) = report.first_invalid() {
            self.emit(ClientEvent::notice(NoticeLevel::Error, FORM_INVALID_NOTICE));
            return Err(ClientError::Validation {
                field: field.to_string(),
                message: err.to_string(),
            });
        }

        let _slot = SaveSlot::acquire(&self.save_in_flight).ok_or(ClientError::SaveInFlight)?;

        let response = match self.api.update_order(&snapshot).await {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "order update failed");
                self.emit(ClientEvent::notice(
                    NoticeLevel::Error,
                    "Error updating order",
                ));
                return Err(ClientError::Transport(err));
            }
        };
        if let Some(err) = ActionError::from_response(&response, "Failed to update order") {
            warn!(message = %err.message, "order update rejected");
            self.emit(ClientEvent::notice(NoticeLevel::Error, err.message.clone()));
            return Err(err.into());
        }

        let order_id = snapshot.value("order_id").to_string();
        self.inner.lock().await.draft.mark_saved(snapshot);
        info!(%order_id, "order updated");
        self.emit(ClientEvent::notice(
            NoticeLevel::Success,
            "Order updated successfully!",
        ));
        self.emit(ClientEvent::Navigate {
            path: DASHBOARD_PATH.to_string(),
            after: REDIRECT_DELAY,
        });
        Ok(SubmitOutcome {
            redirect_to: DASHBOARD_PATH.to_string(),
            after: REDIRECT_DELAY,
        })
    }
}

#[cfg(test)]
#[path = "tests/editor_tests.rs"]
mod tests;
