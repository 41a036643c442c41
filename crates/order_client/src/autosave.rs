use std::sync::Arc;

use tokio::{
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};
use tracing::debug;

use crate::editor::{AutoSaveOutcome, OrderEditor};

/// Periodic auto-save for one editor. The timer lives exactly as long as this
/// handle; dropping it stops the task.
pub struct AutoSaveTask {
    handle: JoinHandle<()>,
}

impl AutoSaveTask {
    /// A zero interval disables the timer; blur-triggered saves still work.
    pub fn spawn(editor: Arc<OrderEditor>) -> Self {
        let period = editor.settings().auto_save_interval;
        let handle = tokio::spawn(async move {
            if period.is_zero() {
                debug!("auto-save timer disabled");
                return;
            }
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match editor.auto_save().await {
                    AutoSaveOutcome::Clean => {}
                    outcome => debug!(?outcome, "auto-save tick"),
                }
            }
        });
        Self { handle }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for AutoSaveTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
