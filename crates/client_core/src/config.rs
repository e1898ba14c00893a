use std::{fs, path::Path};

use alloy_primitives::Address;
use anyhow::{bail, Context};
use toml::{Table, Value};
use tracing::warn;
use url::Url;

pub const DEFAULT_CONFIG_FILE: &str = "records.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub rpc_url: String,
    pub contract_address: String,
    pub subjects: Vec<String>,
    pub receipt_poll_interval_ms: u64,
    pub receipt_poll_attempts: u32,
    pub roster_fetch_concurrency: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rpc_url: "http://127.0.0.1:8545".into(),
            contract_address: "0x38cB7800C3Fddb8dda074C1c650A155154924C73".into(),
            subjects: vec!["Math".into(), "Science".into(), "English".into()],
            receipt_poll_interval_ms: 1000,
            receipt_poll_attempts: 60,
            roster_fetch_concurrency: 1,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> anyhow::Result<()> {
        Url::parse(&self.rpc_url).with_context(|| format!("invalid rpc_url '{}'", self.rpc_url))?;
        self.contract_address()?;
        if self.subjects.is_empty() {
            bail!("at least one subject must be configured");
        }
        if self.receipt_poll_attempts == 0 {
            bail!("receipt_poll_attempts must be at least 1");
        }
        if self.roster_fetch_concurrency == 0 {
            bail!("roster_fetch_concurrency must be at least 1");
        }
        Ok(())
    }

    pub fn contract_address(&self) -> anyhow::Result<Address> {
        self.contract_address
            .parse::<Address>()
            .with_context(|| format!("invalid contract_address '{}'", self.contract_address))
    }
}

/// Defaults, then `path` (or `records.toml` in the working directory), then
/// the process environment.
pub fn load_settings(path: Option<&Path>) -> Settings {
    let mut settings = Settings::default();

    let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
    if let Ok(raw) = fs::read_to_string(path) {
        apply_file_overrides(&mut settings, &raw);
    }

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    settings
}

pub fn apply_file_overrides(settings: &mut Settings, raw: &str) {
    let file_cfg = match raw.parse::<Table>() {
        Ok(file_cfg) => file_cfg,
        Err(error) => {
            warn!(%error, "config: ignoring unreadable settings file");
            return;
        }
    };

    if let Some(v) = file_value(&file_cfg, "rpc_url") {
        settings.rpc_url = v;
    }
    if let Some(v) = file_value(&file_cfg, "contract_address") {
        settings.contract_address = v;
    }
    if let Some(v) = file_value(&file_cfg, "subjects") {
        settings.subjects = split_subjects(&v);
    }
    if let Some(v) = file_value(&file_cfg, "receipt_poll_interval_ms") {
        set_parsed(&mut settings.receipt_poll_interval_ms, "receipt_poll_interval_ms", &v);
    }
    if let Some(v) = file_value(&file_cfg, "receipt_poll_attempts") {
        set_parsed(&mut settings.receipt_poll_attempts, "receipt_poll_attempts", &v);
    }
    if let Some(v) = file_value(&file_cfg, "roster_fetch_concurrency") {
        set_parsed(&mut settings.roster_fetch_concurrency, "roster_fetch_concurrency", &v);
    }
}

pub fn apply_env_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("RECORDS_RPC_URL") {
        settings.rpc_url = v;
    }
    if let Some(v) = lookup("APP__RPC_URL") {
        settings.rpc_url = v;
    }

    if let Some(v) = lookup("RECORDS_CONTRACT") {
        settings.contract_address = v;
    }
    if let Some(v) = lookup("APP__CONTRACT_ADDRESS") {
        settings.contract_address = v;
    }

    if let Some(v) = lookup("APP__SUBJECTS") {
        settings.subjects = split_subjects(&v);
    }

    if let Some(v) = lookup("APP__RECEIPT_POLL_INTERVAL_MS") {
        set_parsed(&mut settings.receipt_poll_interval_ms, "APP__RECEIPT_POLL_INTERVAL_MS", &v);
    }
    if let Some(v) = lookup("APP__RECEIPT_POLL_ATTEMPTS") {
        set_parsed(&mut settings.receipt_poll_attempts, "APP__RECEIPT_POLL_ATTEMPTS", &v);
    }
    if let Some(v) = lookup("APP__ROSTER_FETCH_CONCURRENCY") {
        set_parsed(&mut settings.roster_fetch_concurrency, "APP__ROSTER_FETCH_CONCURRENCY", &v);
    }
}

// Numbers may be written bare or quoted, and `subjects` as a list or a
// comma-separated string.
fn file_value(file_cfg: &Table, key: &str) -> Option<String> {
    match file_cfg.get(key)? {
        Value::String(v) => Some(v.clone()),
        Value::Integer(v) => Some(v.to_string()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(","),
        ),
        other => {
            warn!(key, kind = other.type_str(), "config: ignoring value of unsupported type");
            None
        }
    }
}

fn split_subjects(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|subject| !subject.is_empty())
        .map(String::from)
        .collect()
}

fn set_parsed<T: std::str::FromStr>(target: &mut T, key: &str, raw: &str) {
    match raw.trim().parse::<T>() {
        Ok(parsed) => *target = parsed,
        Err(_) => warn!(key, value = raw, "config: ignoring non-numeric value"),
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
