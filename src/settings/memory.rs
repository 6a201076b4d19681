use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use serde_json::Value;

use crate::types::MonitorError;

use super::{insert_all, read_int, read_string, SettingValue, SettingsMap, SettingsStore};

/// Process-local settings. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemorySettings {
    values: Mutex<SettingsMap>,
    fail_writes: AtomicBool,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail with a storage error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn with_values<T>(
        &self,
        f: impl FnOnce(&mut SettingsMap) -> Result<T, MonitorError>,
    ) -> Result<T, MonitorError> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| MonitorError::Storage("settings lock poisoned".to_string()))?;
        f(&mut values)
    }

    fn check_writable(&self) -> Result<(), MonitorError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(MonitorError::Storage("settings store is read-only".to_string()));
        }
        Ok(())
    }
}

impl SettingsStore for MemorySettings {
    fn get_string(&self, key: &str) -> Result<Option<String>, MonitorError> {
        self.with_values(|values| read_string(values, key))
    }

    fn set_string(&self, key: &str, value: &str) -> Result<(), MonitorError> {
        self.check_writable()?;
        self.with_values(|values| {
            values.insert(key.to_string(), Value::String(value.to_string()));
            Ok(())
        })
    }

    fn get_int(&self, key: &str) -> Result<Option<i64>, MonitorError> {
        self.with_values(|values| read_int(values, key))
    }

    fn set_int(&self, key: &str, value: i64) -> Result<(), MonitorError> {
        self.check_writable()?;
        self.with_values(|values| {
            values.insert(key.to_string(), Value::from(value));
            Ok(())
        })
    }

    fn remove(&self, key: &str) -> Result<(), MonitorError> {
        self.check_writable()?;
        self.with_values(|values| {
            values.remove(key);
            Ok(())
        })
    }

    fn set_many(&self, entries: &[(&str, SettingValue)]) -> Result<(), MonitorError> {
        self.check_writable()?;
        self.with_values(|values| {
            insert_all(values, entries);
            Ok(())
        })
    }
}
