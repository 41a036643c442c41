use std::{fs, path::Path, time::Duration};

use serde::Deserialize;
use shared::protocol::MoveStatusKey;

use crate::error::ClientError;

pub const DEFAULT_SETTINGS_FILE: &str = "order_client.toml";

/// How a rejected or failed card move is rolled back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollbackStrategy {
    /// Put the card back where it was; reload only when that is impossible.
    #[default]
    Revert,
    /// Ask the host to refetch the whole board.
    Reload,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub server_url: String,
    pub move_status_key: MoveStatusKey,
    pub rollback: RollbackStrategy,
    pub auto_save_interval: Duration,
    pub error_highlight: Duration,
    pub request_timeout: Duration,
    pub auto_save_fields: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:5000".into(),
            move_status_key: MoveStatusKey::NewStatus,
            rollback: RollbackStrategy::Revert,
            auto_save_interval: Duration::from_secs(30),
            error_highlight: Duration::from_secs(3),
            request_timeout: Duration::from_secs(30),
            auto_save_fields: ["customer_name", "yarn_type", "quantity_kg", "amount_usd"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl Settings {
    pub fn with_server_url(mut self, server_url: impl Into<String>) -> Self {
        self.server_url = server_url.into();
        self
    }

    pub fn is_auto_save_field(&self, name: &str) -> bool {
        self.auto_save_fields.iter().any(|field| field == name)
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    server_url: Option<String>,
    move_status_key: Option<MoveStatusKey>,
    rollback: Option<RollbackStrategy>,
    auto_save_secs: Option<u64>,
    error_highlight_ms: Option<u64>,
    request_timeout_secs: Option<u64>,
    auto_save_fields: Option<Vec<String>>,
}

/// Defaults, then `order_client.toml` in the working directory if present,
/// then environment overrides.
pub fn load_settings() -> Result<Settings, ClientError> {
    let mut settings = Settings::default();
    let path = Path::new(DEFAULT_SETTINGS_FILE);
    if path.exists() {
        let raw = fs::read_to_string(path).map_err(|err| {
            ClientError::Settings(format!("failed to read {}: {err}", path.display()))
        })?;
        apply_file_settings(&mut settings, &raw)?;
    }
    apply_env_overrides(&mut settings, |key| std::env::var(key).ok())?;
    Ok(settings)
}

pub(crate) fn apply_file_settings(settings: &mut Settings, raw: &str) -> Result<(), ClientError> {
    let file_cfg: FileSettings = toml::from_str(raw)
        .map_err(|err| ClientError::Settings(format!("invalid settings file: {err}")))?;

    if let Some(v) = file_cfg.server_url {
        settings.server_url = v;
    }
    if let Some(v) = file_cfg.move_status_key {
        settings.move_status_key = v;
    }
    if let Some(v) = file_cfg.rollback {
        settings.rollback = v;
    }
    if let Some(v) = file_cfg.auto_save_secs {
        settings.auto_save_interval = Duration::from_secs(v);
    }
    if let Some(v) = file_cfg.error_highlight_ms {
        settings.error_highlight = Duration::from_millis(v);
    }
    if let Some(v) = file_cfg.request_timeout_secs {
        settings.request_timeout = Duration::from_secs(v);
    }
    if let Some(v) = file_cfg.auto_save_fields {
        settings.auto_save_fields = v;
    }
    Ok(())
}

pub(crate) fn apply_env_overrides(
    settings: &mut Settings,
    var: impl Fn(&str) -> Option<String>,
) -> Result<(), ClientError> {
    if let Some(v) = var("ORDER_CLIENT_SERVER_URL") {
        settings.server_url = v;
    }
    if let Some(v) = var("APP__SERVER_URL") {
        settings.server_url = v;
    }

    if let Some(v) = var("APP__MOVE_STATUS_KEY") {
        settings.move_status_key = match v.trim() {
            "new_status" => MoveStatusKey::NewStatus,
            "status" => MoveStatusKey::Status,
            other => {
                return Err(ClientError::Settings(format!(
                    "APP__MOVE_STATUS_KEY must be 'new_status' or 'status', got '{other}'"
                )))
            }
        };
    }

    if let Some(v) = var("APP__ROLLBACK") {
        settings.rollback = match v.trim() {
            "revert" => RollbackStrategy::Revert,
            "reload" => RollbackStrategy::Reload,
            other => {
                return Err(ClientError::Settings(format!(
                    "APP__ROLLBACK must be 'revert' or 'reload', got '{other}'"
                )))
            }
        };
    }

    if let Some(v) = var("APP__AUTO_SAVE_SECS") {
        if let Ok(parsed) = v.trim().parse::<u64>() {
            settings.auto_save_interval = Duration::from_secs(parsed);
        }
    }
    if let Some(v) = var("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.trim().parse::<u64>() {
            settings.request_timeout = Duration::from_secs(parsed);
        }
    }

    Ok(())
}
