//! Persisted view preferences
//!
//! Sort preferences live in fixed, process-wide slots. They are shared by
//! every topology scope; switching scopes does not switch preferences.

use crate::error::{Result, TopologyError};
use crate::sort::{SortLabel, SortOrder, DEFAULT_SORT_BY};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

pub const SORT_BY_STANDARD_KEY: &str = "topologyCardsSortByStandard";
pub const SORT_BY_CUSTOM_KEY: &str = "topologyCardsSortByCustom";
pub const SORT_ORDER_KEY: &str = "topologyCardsSortOrder";
pub const CARD_WIDTH_KEY: &str = "topologyCardPreferredWidth";

/// String key/value storage that outlives the process (or not, for tests)
pub trait PreferenceStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

impl<S: PreferenceStorage + ?Sized> PreferenceStorage for Arc<S> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

/// In-memory storage, lost when dropped
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.values.read().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self
            .values
            .write()
            .map_err(|_| TopologyError::Preference("preference lock poisoned".into()))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut values = self
            .values
            .write()
            .map_err(|_| TopologyError::Preference("preference lock poisoned".into()))?;
        values.remove(key);
        Ok(())
    }
}

/// Storage backed by a JSON object on disk, rewritten on every change
#[derive(Debug)]
pub struct JsonFileStorage {
    path: PathBuf,
    values: RwLock<BTreeMap<String, String>>,
}

impl JsonFileStorage {
    /// Open (or lazily create) the preference file at `path`.
    ///
    /// An unreadable or malformed file starts out empty and is replaced on
    /// the next write.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values: BTreeMap<String, String> = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "ignoring malformed preference file");
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not read preference file");
                BTreeMap::new()
            }
        };

        Self {
            path,
            values: RwLock::new(values),
        }
    }

    /// `<local data dir>/topology-cards/preferences.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_local_dir().map(|d| d.join("topology-cards").join("preferences.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, values: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(values)?)?;
        std::fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), "preferences written");
        Ok(())
    }

    fn update(&self, f: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<()> {
        let mut values = self
            .values
            .write()
            .map_err(|_| TopologyError::Preference("preference lock poisoned".into()))?;
        let mut next = values.clone();
        f(&mut next);
        // memory only changes once the file holds the same content
        self.persist(&next)?;
        *values = next;
        Ok(())
    }
}

impl PreferenceStorage for JsonFileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.values.read().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.update(|values| {
            values.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.update(|values| {
            values.remove(key);
        })
    }
}

/// Preferred card width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CardSize {
    Small,
    Medium,
    #[default]
    Large,
    ExtraLarge,
}

impl CardSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardSize::Small => "small",
            CardSize::Medium => "medium",
            CardSize::Large => "large",
            CardSize::ExtraLarge => "extra-large",
        }
    }
}

impl fmt::Display for CardSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CardSize {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "small" => Ok(CardSize::Small),
            "medium" => Ok(CardSize::Medium),
            "large" => Ok(CardSize::Large),
            "extra-large" => Ok(CardSize::ExtraLarge),
            other => Err(format!("invalid card size: {}", other)),
        }
    }
}

/// Sort and layout preferences on top of a [`PreferenceStorage`]
pub struct Preferences<S> {
    storage: S,
}

impl<S: PreferenceStorage> Preferences<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Persist the chosen sort key.
    ///
    /// A standard key replaces any custom choice. Anything else goes to the
    /// custom slot and leaves the standard slot alone.
    pub fn save_sort_by(&self, value: &str, labels: &[SortLabel]) -> Result<()> {
        let standard = labels
            .iter()
            .find(|l| l.value == value)
            .map(|l| l.standard)
            .unwrap_or(false);

        if standard {
            // custom goes first: a stale custom key would shadow the new choice
            self.storage.remove(SORT_BY_CUSTOM_KEY)?;
            self.storage.set(SORT_BY_STANDARD_KEY, value)
        } else {
            self.storage.set(SORT_BY_CUSTOM_KEY, value)
        }
    }

    pub fn save_sort_order(&self, order: SortOrder) -> Result<()> {
        self.storage.set(SORT_ORDER_KEY, order.as_str())
    }

    /// The sort key to use with the current `labels`.
    ///
    /// A custom key that no longer matches a label is dropped from storage,
    /// and the standard key (or `status`) is used instead.
    pub fn get_sort_by(&self, labels: &[SortLabel]) -> String {
        if let Some(custom) = self.storage.get(SORT_BY_CUSTOM_KEY) {
            if labels.iter().any(|l| l.value == custom) {
                return custom;
            }
            debug!(key = %custom, "discarding stale custom sort key");
            if let Err(e) = self.storage.remove(SORT_BY_CUSTOM_KEY) {
                warn!(error = %e, "failed to clear custom sort key");
            }
        }

        self.storage
            .get(SORT_BY_STANDARD_KEY)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_SORT_BY.to_string())
    }

    pub fn get_sort_order(&self) -> SortOrder {
        self.storage
            .get(SORT_ORDER_KEY)
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    pub fn save_card_width(&self, size: CardSize) -> Result<()> {
        self.storage.set(CARD_WIDTH_KEY, size.as_str())
    }

    pub fn get_card_width(&self) -> CardSize {
        self.storage
            .get(CARD_WIDTH_KEY)
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> Vec<SortLabel> {
        vec![
            SortLabel::standard("status", "Status"),
            SortLabel::standard("name", "Name"),
            SortLabel::custom("cpu_usage", "CPU"),
        ]
    }

    #[test]
    fn test_defaults() {
        let prefs = Preferences::new(MemoryStorage::new());
        assert_eq!(prefs.get_sort_by(&labels()), "status");
        assert_eq!(prefs.get_sort_order(), SortOrder::Asc);
        assert_eq!(prefs.get_card_width(), CardSize::Large);
    }

    #[test]
    fn test_sort_order_round_trip() {
        let prefs = Preferences::new(MemoryStorage::new());
        prefs.save_sort_order(SortOrder::Desc).unwrap();
        assert_eq!(prefs.get_sort_order(), SortOrder::Desc);
    }

    #[test]
    fn test_malformed_sort_order_reads_default() {
        let prefs = Preferences::new(MemoryStorage::new());
        prefs.storage().set(SORT_ORDER_KEY, "sideways").unwrap();
        assert_eq!(prefs.get_sort_order(), SortOrder::Asc);
    }

    #[test]
    fn test_custom_leaves_standard_untouched() {
        let prefs = Preferences::new(MemoryStorage::new());
        prefs.save_sort_by("name", &labels()).unwrap();
        prefs.save_sort_by("cpu_usage", &labels()).unwrap();

        assert_eq!(
            prefs.storage().get(SORT_BY_STANDARD_KEY).as_deref(),
            Some("name")
        );
        assert_eq!(prefs.get_sort_by(&labels()), "cpu_usage");
        // still there after a read
        assert_eq!(prefs.get_sort_by(&labels()), "cpu_usage");
    }

    #[test]
    fn test_standard_clears_custom() {
        let prefs = Preferences::new(MemoryStorage::new());
        prefs.save_sort_by("cpu_usage", &labels()).unwrap();
        prefs.save_sort_by("name", &labels()).unwrap();

        assert!(prefs.storage().get(SORT_BY_CUSTOM_KEY).is_none());
        assert_eq!(prefs.get_sort_by(&labels()), "name");
    }

    #[test]
    fn test_stale_custom_falls_back_and_is_cleared() {
        let prefs = Preferences::new(MemoryStorage::new());
        prefs.save_sort_by("name", &labels()).unwrap();
        prefs.save_sort_by("cpu_usage", &labels()).unwrap();

        let without_cpu = vec![SortLabel::standard("name", "Name")];
        assert_eq!(prefs.get_sort_by(&without_cpu), "name");
        assert!(prefs.storage().get(SORT_BY_CUSTOM_KEY).is_none());
        // the custom key does not come back once its label reappears
        assert_eq!(prefs.get_sort_by(&labels()), "name");
    }

    #[test]
    fn test_unknown_value_goes_to_custom_slot() {
        let prefs = Preferences::new(MemoryStorage::new());
        prefs.save_sort_by("latency", &labels()).unwrap();
        assert_eq!(
            prefs.storage().get(SORT_BY_CUSTOM_KEY).as_deref(),
            Some("latency")
        );
        assert!(prefs.storage().get(SORT_BY_STANDARD_KEY).is_none());
    }

    #[test]
    fn test_card_width_round_trip() {
        let prefs = Preferences::new(MemoryStorage::new());
        prefs.save_card_width(CardSize::ExtraLarge).unwrap();
        assert_eq!(prefs.get_card_width(), CardSize::ExtraLarge);
    }

    #[test]
    fn test_json_file_storage_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("prefs.json");

        {
            let prefs = Preferences::new(JsonFileStorage::open(&path));
            prefs.save_sort_order(SortOrder::Desc).unwrap();
            prefs.save_sort_by("cpu_usage", &labels()).unwrap();
        }

        let prefs = Preferences::new(JsonFileStorage::open(&path));
        assert_eq!(prefs.get_sort_order(), SortOrder::Desc);
        assert_eq!(prefs.get_sort_by(&labels()), "cpu_usage");
    }

    #[test]
    fn test_json_file_storage_ignores_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, "{not json").unwrap();

        let storage = JsonFileStorage::open(&path);
        assert!(storage.get(SORT_ORDER_KEY).is_none());
        storage.set(SORT_ORDER_KEY, "desc").unwrap();

        let reopened = JsonFileStorage::open(&path);
        assert_eq!(reopened.get(SORT_ORDER_KEY).as_deref(), Some("desc"));
    }

    #[test]
    fn test_failed_write_leaves_values_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();
        let storage = JsonFileStorage::open(blocker.join("prefs.json"));

        assert!(storage.set(SORT_ORDER_KEY, "desc").is_err());
        assert!(storage.get(SORT_ORDER_KEY).is_none());
    }

    /// Memory storage whose removals always fail
    #[derive(Default)]
    struct NoRemoveStorage(MemoryStorage);

    impl PreferenceStorage for NoRemoveStorage {
        fn get(&self, key: &str) -> Option<String> {
            self.0.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<()> {
            self.0.set(key, value)
        }

        fn remove(&self, _key: &str) -> Result<()> {
            Err(TopologyError::Preference("read-only".into()))
        }
    }

    #[test]
    fn test_standard_save_stops_when_custom_cannot_be_cleared() {
        let prefs = Preferences::new(NoRemoveStorage::default());
        prefs.save_sort_by("cpu_usage", &labels()).unwrap();

        assert!(prefs.save_sort_by("name", &labels()).is_err());
        assert!(prefs.storage().get(SORT_BY_STANDARD_KEY).is_none());
        assert_eq!(prefs.get_sort_by(&labels()), "cpu_usage");
    }

    #[test]
    fn test_failed_standard_save_keeps_custom_choice() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        let prefs = Preferences::new(JsonFileStorage::open(&path));
        prefs.save_sort_by("cpu_usage", &labels()).unwrap();

        // swap the file for a directory so the atomic rename fails
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();

        assert!(prefs.save_sort_by("name", &labels()).is_err());
        assert!(prefs.storage().get(SORT_BY_STANDARD_KEY).is_none());
        assert_eq!(prefs.get_sort_by(&labels()), "cpu_usage");
    }
}
