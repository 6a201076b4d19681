use std::sync::Arc;

use chrono::DateTime;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::settings::{
    SettingValue, SettingsStore, KEY_CACHED_COUNT, KEY_LAST_ATTEMPT_AT, KEY_LAST_OUTCOME, KEY_LAST_SUCCESS_AT,
};
use crate::status_client::FetchOutcome;
use crate::types::{MonitorError, Timestamp};

use super::entry::CacheEntry;

/// Durable one-slot cache of the last fetch attempt.
///
/// Owned by the scheduler, which is the only writer. Other contexts read
/// through [`StatusCache::subscribe`].
pub struct StatusCache {
    settings: Arc<dyn SettingsStore>,
    current: watch::Sender<CacheEntry>,
}

impl StatusCache {
    /// Restore the entry persisted by a previous run. Unreadable values are
    /// dropped with a warning rather than failing startup.
    pub fn load(settings: Arc<dyn SettingsStore>) -> Self {
        let entry = restore_entry(settings.as_ref());
        debug!(
            has_outcome = entry.last_outcome.is_some(),
            cached_count = ?entry.last_successful_count,
            "Restored status cache"
        );
        let (current, _) = watch::channel(entry);
        Self { settings, current }
    }

    pub fn read(&self) -> CacheEntry {
        self.current.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<CacheEntry> {
        self.current.subscribe()
    }

    /// Single mutation entry point. The in-memory entry is updated before
    /// persisting, so a storage error still leaves reads consistent within
    /// this process.
    pub fn record_attempt(
        &mut self,
        outcome: FetchOutcome,
        at: Timestamp,
    ) -> Result<CacheEntry, MonitorError> {
        let entry = self.read().with_attempt(outcome, at);
        self.current.send_replace(entry.clone());
        self.persist(&entry)?;
        Ok(entry)
    }

    /// Save the attempt in one settings write so the keys never disagree.
    fn persist(&self, entry: &CacheEntry) -> Result<(), MonitorError> {
        let Some(outcome) = entry.last_outcome.as_ref() else {
            return Ok(());
        };

        let mut entries = Vec::with_capacity(4);
        if outcome.is_success() {
            if let Some(count) = entry.last_successful_count {
                let count = i64::try_from(count).unwrap_or(i64::MAX);
                entries.push((KEY_CACHED_COUNT, SettingValue::Int(count)));
            }
            if let Some(at) = entry.last_success_at {
                entries.push((KEY_LAST_SUCCESS_AT, SettingValue::Text(at.to_rfc3339())));
            }
        }
        if let Some(at) = entry.last_attempt_at {
            entries.push((KEY_LAST_ATTEMPT_AT, SettingValue::Text(at.to_rfc3339())));
        }
        let encoded = serde_json::to_string(outcome)?;
        entries.push((KEY_LAST_OUTCOME, SettingValue::Text(encoded)));
        self.settings.set_many(&entries)
    }
}

fn restore_entry(settings: &dyn SettingsStore) -> CacheEntry {
    let last_successful_count = match settings.get_int(KEY_CACHED_COUNT) {
        Ok(Some(count)) => u64::try_from(count).ok(),
        Ok(None) => None,
        Err(err) => {
            warn!(error = %err, "Ignoring unreadable cached count");
            None
        }
    };

    let last_outcome = read_setting(settings, KEY_LAST_OUTCOME).and_then(|raw| {
        serde_json::from_str::<FetchOutcome>(&raw)
            .map_err(|err| warn!(error = %err, "Ignoring unreadable cached outcome"))
            .ok()
    });

    CacheEntry {
        last_outcome,
        last_attempt_at: read_timestamp(settings, KEY_LAST_ATTEMPT_AT),
        last_success_at: read_timestamp(settings, KEY_LAST_SUCCESS_AT),
        last_successful_count,
    }
}

fn read_setting(settings: &dyn SettingsStore, key: &str) -> Option<String> {
    match settings.get_string(key) {
        Ok(value) => value.filter(|value| !value.is_empty()),
        Err(err) => {
            warn!(key, error = %err, "Ignoring unreadable setting");
            None
        }
    }
}

fn read_timestamp(settings: &dyn SettingsStore, key: &str) -> Option<Timestamp> {
    let raw = read_setting(settings, key)?;
    DateTime::parse_from_rfc3339(&raw)
        .map_err(|err| warn!(key, value = %raw, error = %err, "Ignoring unparsable timestamp"))
        .ok()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::settings::MemorySettings;
    use crate::status_client::{FetchErrorKind, Presence};

    fn at(raw: &str) -> Timestamp {
        DateTime::parse_from_rfc3339(raw).unwrap()
    }

    fn success(count: u64) -> FetchOutcome {
        FetchOutcome::Success {
            status: Presence::Present,
            item_count: count,
            message: "ok".to_string(),
            remote_timestamp: "2024-01-01T10:00:00".to_string(),
        }
    }

    #[test]
    fn entry_survives_reload() {
        let settings = Arc::new(MemorySettings::new());
        let mut cache = StatusCache::load(settings.clone());
        let when = at("2024-01-01T10:10:00+08:00");
        cache.record_attempt(success(3), when).unwrap();

        let reloaded = StatusCache::load(settings.clone());
        assert_eq!(reloaded.read(), cache.read());
        assert_eq!(settings.get_int(KEY_CACHED_COUNT).unwrap(), Some(3));
    }

    #[test]
    fn failure_is_persisted_without_touching_success_keys() {
        let settings = Arc::new(MemorySettings::new());
        let mut cache = StatusCache::load(settings.clone());
        let first = at("2024-01-01T10:10:00+08:00");
        let second = at("2024-01-01T11:10:00+08:00");
        cache.record_attempt(success(3), first).unwrap();
        cache
            .record_attempt(
                FetchOutcome::failure(FetchErrorKind::Timeout, "No response"),
                second,
            )
            .unwrap();

        let reloaded = StatusCache::load(settings.clone()).read();
        assert_eq!(reloaded.last_successful_count, Some(3));
        assert_eq!(reloaded.last_success_at, Some(first));
        assert_eq!(reloaded.last_attempt_at, Some(second));
        assert_eq!(reloaded.last_outcome.and_then(|o| o.item_count()), None);
    }

    #[test]
    fn storage_failure_still_updates_memory() {
        let settings = Arc::new(MemorySettings::new());
        let mut cache = StatusCache::load(settings.clone());
        let mut view = cache.subscribe();
        settings.set_fail_writes(true);

        let result = cache.record_attempt(success(5), at("2024-01-01T10:10:00+08:00"));
        assert!(matches!(result, Err(MonitorError::Storage(_))));
        assert_eq!(cache.read().last_successful_count, Some(5));
        assert!(view.has_changed().unwrap());
        assert_eq!(view.borrow_and_update().last_successful_count, Some(5));
    }

    /// Counts writes that reach the backing store.
    #[derive(Default)]
    struct CountingSettings {
        inner: MemorySettings,
        writes: AtomicUsize,
    }

    impl CountingSettings {
        fn writes(&self) -> usize {
            self.writes.load(Ordering::SeqCst)
        }

        fn count(&self) {
            self.writes.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl SettingsStore for CountingSettings {
        fn get_string(&self, key: &str) -> Result<Option<String>, MonitorError> {
            self.inner.get_string(key)
        }

        fn set_string(&self, key: &str, value: &str) -> Result<(), MonitorError> {
            self.count();
            self.inner.set_string(key, value)
        }

        fn get_int(&self, key: &str) -> Result<Option<i64>, MonitorError> {
            self.inner.get_int(key)
        }

        fn set_int(&self, key: &str, value: i64) -> Result<(), MonitorError> {
            self.count();
            self.inner.set_int(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), MonitorError> {
            self.count();
            self.inner.remove(key)
        }

        fn set_many(&self, entries: &[(&str, SettingValue)]) -> Result<(), MonitorError> {
            self.count();
            self.inner.set_many(entries)
        }
    }

    #[test]
    fn each_attempt_is_one_write() {
        let settings = Arc::new(CountingSettings::default());
        let mut cache = StatusCache::load(settings.clone());
        cache
            .record_attempt(success(3), at("2024-01-01T10:10:00+08:00"))
            .unwrap();
        assert_eq!(settings.writes(), 1);

        cache
            .record_attempt(
                FetchOutcome::failure(FetchErrorKind::Timeout, "No response"),
                at("2024-01-01T11:10:00+08:00"),
            )
            .unwrap();
        assert_eq!(settings.writes(), 2);

        let reloaded = StatusCache::load(settings.clone()).read();
        assert_eq!(reloaded, cache.read());
    }

    #[test]
    fn failed_write_leaves_previous_attempt_whole() {
        let settings = Arc::new(MemorySettings::new());
        let mut cache = StatusCache::load(settings.clone());
        let first = at("2024-01-01T10:10:00+08:00");
        cache.record_attempt(success(3), first).unwrap();

        settings.set_fail_writes(true);
        let result = cache.record_attempt(success(9), at("2024-01-01T11:10:00+08:00"));
        assert!(result.is_err());

        let reloaded = StatusCache::load(settings.clone()).read();
        assert_eq!(reloaded.last_successful_count, Some(3));
        assert_eq!(reloaded.last_success_at, Some(first));
        assert_eq!(reloaded.last_attempt_at, Some(first));
        assert_eq!(reloaded.last_outcome.and_then(|o| o.item_count()), Some(3));
    }

    #[test]
    fn legacy_negative_count_reads_as_missing() {
        let settings = Arc::new(MemorySettings::new());
        settings.set_int(KEY_CACHED_COUNT, -1).unwrap();
        settings.set_string(KEY_LAST_OUTCOME, "{not json").unwrap();
        let cache = StatusCache::load(settings);
        assert_eq!(cache.read(), CacheEntry::default());
    }
}
