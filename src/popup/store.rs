/// Key/value state store behind the popup counters.
///
/// The popup only needs to read and write a couple of integers, so the
/// store interface is deliberately small. [`FileStore`] persists to a JSON
/// object on disk; [`MemoryStore`] keeps everything in memory.
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Storage key for the number of successful test compressions.
pub const TOTAL_COMPRESSIONS_KEY: &str = "totalCompressions";
/// Storage key for the accumulated tokens saved.
pub const TOTAL_SAVINGS_KEY: &str = "totalSavings";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("state store I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("state store is corrupt: {0}")]
    Format(#[from] serde_json::Error),
}

pub trait StateStore {
    fn get(&self, key: &str) -> Result<Option<u64>, StoreError>;
    fn set(&mut self, key: &str, value: u64) -> Result<(), StoreError>;

    /// Write several keys in one update.
    ///
    /// The default writes them one at a time; stores that can apply the
    /// whole batch at once should override it.
    fn set_many(&mut self, entries: &[(&str, u64)]) -> Result<(), StoreError> {
        for (key, value) in entries {
            self.set(key, *value)?;
        }
        Ok(())
    }
}

/// Non-persistent store.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: HashMap<String, u64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<u64>, StoreError> {
        Ok(self.values.get(key).copied())
    }

    fn set(&mut self, key: &str, value: u64) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}

/// JSON-file-backed store (`~/.greenprompt/storage.json` by default).
///
/// The whole object is re-read on every access so separate processes see
/// each other's writes. No schema versioning.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the default location, if a home directory is known.
    pub fn default_location() -> Option<Self> {
        crate::config::data_dir().map(|dir| Self::new(dir.join("storage.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<BTreeMap<String, u64>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Replace the file contents in one step: write a sibling temp file,
    /// then rename it over the store.
    fn write_map(&self, map: &BTreeMap<String, u64>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(map)?)?;
        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }
}

impl StateStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<u64>, StoreError> {
        Ok(self.read_map()?.get(key).copied())
    }

    fn set(&mut self, key: &str, value: u64) -> Result<(), StoreError> {
        self.set_many(&[(key, value)])
    }

    fn set_many(&mut self, entries: &[(&str, u64)]) -> Result<(), StoreError> {
        let mut map = self.read_map()?;
        for (key, value) in entries {
            map.insert(key.to_string(), *value);
        }
        self.write_map(&map)
    }
}

/// The two persisted popup counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    pub total_compressions: u64,
    pub total_savings: u64,
}

impl Counters {
    /// Read both counters; missing keys count as zero.
    pub fn load<S: StateStore + ?Sized>(store: &S) -> Result<Self, StoreError> {
        Ok(Self {
            total_compressions: store.get(TOTAL_COMPRESSIONS_KEY)?.unwrap_or(0),
            total_savings: store.get(TOTAL_SAVINGS_KEY)?.unwrap_or(0),
        })
    }

    /// Read both counters, treating an unreadable store as empty.
    pub fn load_or_default<S: StateStore + ?Sized>(store: &S) -> Self {
        Self::load(store).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "unreadable counter store, showing zero counters");
            Self::default()
        })
    }

    /// Add one compression and `tokens_saved` to the stored counters and
    /// return the new values.
    pub fn record<S: StateStore + ?Sized>(store: &mut S, tokens_saved: u64) -> Result<Self, StoreError> {
        let current = Self::load(store)?;
        let updated = Self {
            total_compressions: current.total_compressions.saturating_add(1),
            total_savings: current.total_savings.saturating_add(tokens_saved),
        };
        store.set_many(&[
            (TOTAL_COMPRESSIONS_KEY, updated.total_compressions),
            (TOTAL_SAVINGS_KEY, updated.total_savings),
        ])?;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trip() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", 7).unwrap();
        assert_eq!(store.get("k").unwrap(), Some(7));
    }

    #[test]
    fn counters_default_to_zero() {
        let store = MemoryStore::new();
        assert_eq!(Counters::load(&store).unwrap(), Counters::default());
    }

    #[test]
    fn counters_accumulate() {
        let mut store = MemoryStore::new();
        Counters::record(&mut store, 30).unwrap();
        let counters = Counters::record(&mut store, 12).unwrap();
        assert_eq!(counters.total_compressions, 2);
        assert_eq!(counters.total_savings, 42);
        assert_eq!(store.get(TOTAL_SAVINGS_KEY).unwrap(), Some(42));
    }

    #[test]
    fn file_store_persists_under_fixed_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("storage.json");

        let mut store = FileStore::new(&path);
        Counters::record(&mut store, 30).unwrap();

        let reopened = FileStore::new(&path);
        assert_eq!(
            Counters::load(&reopened).unwrap(),
            Counters {
                total_compressions: 1,
                total_savings: 30
            }
        );

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["totalCompressions"], 1);
        assert_eq!(raw["totalSavings"], 30);
    }

    /// Store whose writes after the first batch fail, counting batches.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        batches: usize,
    }

    impl StateStore for FlakyStore {
        fn get(&self, key: &str) -> Result<Option<u64>, StoreError> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: u64) -> Result<(), StoreError> {
            self.set_many(&[(key, value)])
        }

        fn set_many(&mut self, entries: &[(&str, u64)]) -> Result<(), StoreError> {
            self.batches += 1;
            if self.batches > 1 {
                return Err(io::Error::other("disk full").into());
            }
            for (key, value) in entries {
                self.inner.set(key, *value)?;
            }
            Ok(())
        }
    }

    #[test]
    fn record_writes_both_counters_in_one_batch() {
        let mut store = FlakyStore::default();
        Counters::record(&mut store, 30).unwrap();
        assert_eq!(store.batches, 1);

        assert!(Counters::record(&mut store, 12).is_err());
        assert_eq!(
            Counters::load(&store).unwrap(),
            Counters {
                total_compressions: 1,
                total_savings: 30
            }
        );
    }

    #[test]
    fn file_store_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        let mut store = FileStore::new(&path);
        Counters::record(&mut store, 5).unwrap();
        Counters::record(&mut store, 5).unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("storage.json")]);
    }

    #[test]
    fn load_or_default_tolerates_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        fs::write(&path, r#"{"totalCompressions": 3, "totalSav"#).unwrap();
        assert_eq!(
            Counters::load_or_default(&FileStore::new(&path)),
            Counters::default()
        );
    }

    #[test]
    fn file_store_missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("absent.json"));
        assert_eq!(store.get(TOTAL_COMPRESSIONS_KEY).unwrap(), None);
    }

    #[test]
    fn file_store_reports_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        fs::write(&path, "{not json").unwrap();
        let store = FileStore::new(&path);
        assert!(matches!(
            store.get(TOTAL_SAVINGS_KEY),
            Err(StoreError::Format(_))
        ));
    }
}
