use shared::protocol::OrderFields;

pub const LEAVE_PROMPT: &str = "You have unsaved changes. Are you sure you want to leave?";

/// Edit state of one order form. `baseline` is the last snapshot the server
/// accepted; unsaved means `current != baseline`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDraft {
    current: OrderFields,
    baseline: OrderFields,
}

impl OrderDraft {
    pub fn new(original: OrderFields) -> Self {
        Self {
            current: original.clone(),
            baseline: original,
        }
    }

    pub fn current(&self) -> &OrderFields {
        &self.current
    }

    pub fn baseline(&self) -> &OrderFields {
        &self.baseline
    }

    pub fn value(&self, name: &str) -> &str {
        self.current.value(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.current.set(name, value);
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.current != self.baseline
    }

    /// Names whose current value differs from the baseline.
    pub fn changed_fields(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .current
            .iter()
            .filter(|(name, value)| self.baseline.value(name) != *value)
            .map(|(name, _)| name)
            .collect();
        names.extend(
            self.baseline
                .names()
                .filter(|name| self.current.get(name).is_none()),
        );
        names
    }

    /// Marks `saved` as server state. Edits made after that snapshot was
    /// taken stay unsaved.
    pub fn mark_saved(&mut self, saved: OrderFields) {
        self.baseline = saved;
    }

    /// Drops every edit since the last save. Returns whether anything changed.
    pub fn reset(&mut self) -> bool {
        if !self.has_unsaved_changes() {
            return false;
        }
        self.current = self.baseline.clone();
        true
    }

    pub fn leave_prompt(&self) -> Option<&'static str> {
        self.has_unsaved_changes().then_some(LEAVE_PROMPT)
    }
}
