use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::types::MonitorError;

use super::{insert_all, read_int, read_string, SettingValue, SettingsMap, SettingsStore};

/// Settings kept as one flat JSON object on disk.
///
/// Every write replaces the whole file through a temp file in the same
/// directory, so a crash mid-write leaves the previous version intact.
#[derive(Debug)]
pub struct JsonFileSettings {
    path: PathBuf,
    values: Mutex<SettingsMap>,
}

impl JsonFileSettings {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, MonitorError> {
        let path = path.into();
        let values = match fs::read(&path) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => SettingsMap::new(),
            Ok(bytes) => match serde_json::from_slice::<Value>(&bytes)? {
                Value::Object(map) => map,
                other => {
                    return Err(MonitorError::Storage(format!(
                        "{} does not contain a JSON object: {other}",
                        path.display()
                    )))
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "Settings file not found, starting empty");
                SettingsMap::new()
            }
            Err(err) => return Err(MonitorError::Io(err)),
        };

        debug!(path = %path.display(), keys = values.len(), "Loaded settings");
        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read<T>(&self, f: impl FnOnce(&SettingsMap) -> T) -> Result<T, MonitorError> {
        let values = self
            .values
            .lock()
            .map_err(|_| MonitorError::Storage("settings lock poisoned".to_string()))?;
        Ok(f(&values))
    }

    /// Apply `change` to a copy, persist it, and only then publish it.
    fn update(&self, change: impl FnOnce(&mut SettingsMap)) -> Result<(), MonitorError> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| MonitorError::Storage("settings lock poisoned".to_string()))?;
        let mut next = values.clone();
        change(&mut next);
        self.write_file(&next)?;
        *values = next;
        Ok(())
    }

    fn write_file(&self, values: &SettingsMap) -> Result<(), MonitorError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let mut tmp = NamedTempFile::new_in(&dir)?;
        serde_json::to_writer_pretty(&mut tmp, values)?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)
            .map_err(|err| MonitorError::Io(err.error))?;
        Ok(())
    }
}

impl SettingsStore for JsonFileSettings {
    fn get_string(&self, key: &str) -> Result<Option<String>, MonitorError> {
        self.read(|values| read_string(values, key))?
    }

    fn set_string(&self, key: &str, value: &str) -> Result<(), MonitorError> {
        self.update(|values| {
            values.insert(key.to_string(), Value::String(value.to_string()));
        })
    }

    fn get_int(&self, key: &str) -> Result<Option<i64>, MonitorError> {
        self.read(|values| read_int(values, key))?
    }

    fn set_int(&self, key: &str, value: i64) -> Result<(), MonitorError> {
        self.update(|values| {
            values.insert(key.to_string(), Value::from(value));
        })
    }

    fn remove(&self, key: &str) -> Result<(), MonitorError> {
        if !self.read(|values| values.contains_key(key))? {
            return Ok(());
        }
        self.update(|values| {
            values.remove(key);
        })
    }

    fn set_many(&self, entries: &[(&str, SettingValue)]) -> Result<(), MonitorError> {
        self.update(|values| insert_all(values, entries))
    }
}
