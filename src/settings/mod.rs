//! Flat key/value settings persisted across restarts.

mod file;
mod memory;

pub use file::JsonFileSettings;
pub use memory::MemorySettings;

use crate::types::MonitorError;

pub const KEY_TARGET_ADDRESS: &str = "target_address";
pub const KEY_CACHED_COUNT: &str = "cached_count";
pub const KEY_LAST_SUCCESS_AT: &str = "last_success_at";
pub const KEY_LAST_ATTEMPT_AT: &str = "last_attempt_at";
pub const KEY_LAST_OUTCOME: &str = "last_outcome";

/// A typed value in a batched write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingValue {
    Text(String),
    Int(i64),
}

impl From<SettingValue> for serde_json::Value {
    fn from(value: SettingValue) -> Self {
        match value {
            SettingValue::Text(text) => serde_json::Value::String(text),
            SettingValue::Int(number) => serde_json::Value::from(number),
        }
    }
}

pub trait SettingsStore: Send + Sync {
    fn get_string(&self, key: &str) -> Result<Option<String>, MonitorError>;
    fn set_string(&self, key: &str, value: &str) -> Result<(), MonitorError>;
    fn get_int(&self, key: &str) -> Result<Option<i64>, MonitorError>;
    fn set_int(&self, key: &str, value: i64) -> Result<(), MonitorError>;
    fn remove(&self, key: &str) -> Result<(), MonitorError>;

    /// Write every entry or none of them.
    fn set_many(&self, entries: &[(&str, SettingValue)]) -> Result<(), MonitorError>;
}

type SettingsMap = serde_json::Map<String, serde_json::Value>;

fn insert_all(map: &mut SettingsMap, entries: &[(&str, SettingValue)]) {
    for (key, value) in entries {
        map.insert((*key).to_string(), value.clone().into());
    }
}

fn read_string(map: &SettingsMap, key: &str) -> Result<Option<String>, MonitorError> {
    match map.get(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(value)) => Ok(Some(value.clone())),
        Some(other) => Err(MonitorError::Storage(format!(
            "setting `{key}` is not a string: {other}"
        ))),
    }
}

fn read_int(map: &SettingsMap, key: &str) -> Result<Option<i64>, MonitorError> {
    match map.get(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Number(number)) => number.as_i64().map(Some).ok_or_else(|| {
            MonitorError::Storage(format!("setting `{key}` is not an integer: {number}"))
        }),
        Some(other) => Err(MonitorError::Storage(format!(
            "setting `{key}` is not an integer: {other}"
        ))),
    }
}
