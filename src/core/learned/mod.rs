//! Learned application paths.
//!
//! Every successful launch of a name that is not a system command is
//! remembered here, so the next request for the same name skips the
//! filesystem search. Records are never dropped automatically; a record whose
//! path has disappeared is simply not served.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::normalize_name;
use super::storage::{self, Storage, StorageError};

/// Storage key of the learned-app table.
const TABLE: &str = "apps";

/// A resolved application remembered across runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppRecord {
    /// Lower-cased lookup key.
    pub name: String,
    /// Resolved launch path.
    pub path: PathBuf,
    /// Whether the app was last launched elevated.
    pub requires_admin: bool,
    /// When the app was last launched.
    pub last_used: DateTime<Utc>,
}

impl AppRecord {
    /// Create a record stamped with the current time.
    #[must_use]
    pub fn new(name: &str, path: impl Into<PathBuf>, requires_admin: bool) -> Self {
        Self {
            name: normalize_name(name),
            path: path.into(),
            requires_admin,
            last_used: Utc::now(),
        }
    }
}

/// On-disk shape of a record; the name is the table key.
#[derive(Debug, Serialize, Deserialize)]
struct StoredRecord {
    path: PathBuf,
    #[serde(default)]
    requires_admin: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_used: Option<String>,
}

/// Parse a stored timestamp.
///
/// Accepts RFC 3339 and the older `2024-05-01 09:30:12.345678` form.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
                .ok()
                .map(|t| t.and_utc())
        })
}

/// Validate one stored entry.
fn parse_entry(name: &str, value: serde_json::Value) -> Result<AppRecord, String> {
    let key = normalize_name(name);
    if key.is_empty() {
        return Err("empty name".to_string());
    }

    let stored: StoredRecord = serde_json::from_value(value).map_err(|e| e.to_string())?;
    if stored.path.as_os_str().is_empty() {
        return Err("empty path".to_string());
    }

    let last_used = match stored.last_used.as_deref() {
        None => DateTime::UNIX_EPOCH,
        Some(raw) => parse_timestamp(raw).ok_or_else(|| format!("bad timestamp {raw:?}"))?,
    };

    Ok(AppRecord {
        name: key,
        path: stored.path,
        requires_admin: stored.requires_admin,
        last_used,
    })
}

/// Persistent mapping from app name to its resolved path.
#[derive(Debug)]
pub struct LearnedAppStore {
    storage: Storage,
    records: BTreeMap<String, AppRecord>,
}

impl LearnedAppStore {
    /// Create an empty store backed by `storage` without reading it.
    #[must_use]
    pub const fn empty(storage: Storage) -> Self {
        Self {
            storage,
            records: BTreeMap::new(),
        }
    }

    /// Create a store and load whatever `storage` holds.
    #[must_use]
    pub fn load(storage: Storage) -> Self {
        let mut store = Self::empty(storage);
        store.load_all();
        store
    }

    /// Replace the in-memory table with the persisted one.
    ///
    /// A missing or unreadable table yields an empty store. Malformed entries
    /// are dropped individually.
    pub fn load_all(&mut self) {
        self.records.clear();

        let raw: BTreeMap<String, serde_json::Value> = match self.storage.read(&[TABLE]) {
            Ok(raw) => raw,
            Err(StorageError::NotFound(_)) => return,
            Err(e) => {
                tracing::warn!(error = %e, "learned app table unreadable, starting empty");
                return;
            }
        };

        for (name, value) in raw {
            match parse_entry(&name, value) {
                Ok(record) => {
                    self.records.insert(record.name.clone(), record);
                }
                Err(reason) => {
                    tracing::warn!(name = %name, reason = %reason, "skipping malformed learned app");
                }
            }
        }

        tracing::debug!(count = self.records.len(), "loaded learned apps");
    }

    /// Look up a name, case-insensitively.
    ///
    /// Returns `None` when the stored path no longer exists.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AppRecord> {
        let record = self.records.get(&normalize_name(name))?;
        if record.path.exists() {
            Some(record)
        } else {
            tracing::debug!(name = %record.name, path = %record.path.display(), "learned path is stale");
            None
        }
    }

    /// Insert or replace a record.
    pub fn put(&mut self, record: AppRecord) {
        self.records.insert(record.name.clone(), record);
    }

    /// Forget a name. Returns the removed record.
    pub fn remove(&mut self, name: &str) -> Option<AppRecord> {
        self.records.remove(&normalize_name(name))
    }

    /// Write the whole table.
    ///
    /// # Errors
    ///
    /// Returns error if the table cannot be written; memory is unaffected.
    pub fn persist(&self) -> storage::Result<()> {
        let table: BTreeMap<&str, StoredRecord> = self
            .records
            .values()
            .map(|r| {
                (
                    r.name.as_str(),
                    StoredRecord {
                        path: r.path.clone(),
                        requires_admin: r.requires_admin,
                        last_used: Some(r.last_used.to_rfc3339()),
                    },
                )
            })
            .collect();

        self.storage.write(&[TABLE], &table)
    }

    /// All learned names, including ones whose path is stale.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    /// All records, sorted by name.
    pub fn records(&self) -> impl Iterator<Item = &AppRecord> {
        self.records.values()
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store has no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn temp_store() -> (LearnedAppStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = LearnedAppStore::load(Storage::with_root(dir.path().to_path_buf()));
        (store, dir)
    }

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, b"").unwrap();
        path
    }

    #[test]
    fn missing_table_loads_empty() {
        let (store, _dir) = temp_store();
        assert!(store.is_empty());
    }

    #[test]
    fn get_is_case_insensitive() {
        let (mut store, dir) = temp_store();
        let path = touch(dir.path(), "spotify.exe");
        store.put(AppRecord::new("Spotify", &path, false));

        assert_eq!(store.get("SPOTIFY").unwrap().path, path);
        assert_eq!(store.get("  spotify ").unwrap().name, "spotify");
    }

    #[test]
    fn stale_path_is_never_served() {
        let (mut store, dir) = temp_store();
        let path = touch(dir.path(), "gone.exe");
        store.put(AppRecord::new("gone", &path, true));
        assert!(store.get("gone").is_some());

        std::fs::remove_file(&path).unwrap();

        assert!(store.get("gone").is_none());
        // The record itself is kept.
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn persist_and_reload_round_trip() {
        let (mut store, dir) = temp_store();
        let a = touch(dir.path(), "a.exe");
        let b = touch(dir.path(), "b.exe");
        store.put(AppRecord::new("alpha", &a, true));
        store.put(AppRecord::new("beta", &b, false));
        store.persist().unwrap();

        let reloaded = LearnedAppStore::load(Storage::with_root(dir.path().to_path_buf()));
        let original: Vec<_> = store.records().cloned().collect();
        let loaded: Vec<_> = reloaded.records().cloned().collect();
        assert_eq!(original, loaded);
    }

    #[test]
    fn corrupt_table_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("apps.json"), "{{{ definitely not json").unwrap();

        let store = LearnedAppStore::load(Storage::with_root(dir.path().to_path_buf()));
        assert!(store.is_empty());
    }

    #[test]
    fn malformed_entries_are_dropped_individually() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("apps.json"),
            r#"{
                "good": {"path": "/opt/good", "requires_admin": true, "last_used": "2024-05-01T09:30:12Z"},
                "nopath": {"requires_admin": false},
                "emptypath": {"path": ""},
                "notanobject": 42
            }"#,
        )
        .unwrap();

        let store = LearnedAppStore::load(Storage::with_root(dir.path().to_path_buf()));
        assert_eq!(store.names().collect::<Vec<_>>(), vec!["good"]);
        assert!(store.records().next().unwrap().requires_admin);
    }

    #[test]
    fn legacy_entries_are_accepted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("apps.json"),
            r#"{
                "Discord": {"path": "C:\\Discord\\Update.exe", "last_used": "2024-05-01 09:30:12.345678"},
                "steam": {"path": "C:\\Steam\\steam.exe"}
            }"#,
        )
        .unwrap();

        let store = LearnedAppStore::load(Storage::with_root(dir.path().to_path_buf()));
        let records: Vec<_> = store.records().collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "discord");
        assert!(!records[0].requires_admin);
        assert_eq!(
            records[0].last_used.format("%Y-%m-%d %H:%M:%S").to_string(),
            "2024-05-01 09:30:12"
        );
        assert_eq!(records[1].last_used, DateTime::UNIX_EPOCH);
    }

    #[test]
    fn remove_forgets_a_name() {
        let (mut store, dir) = temp_store();
        let path = touch(dir.path(), "x.exe");
        store.put(AppRecord::new("x", &path, false));

        assert!(store.remove("X").is_some());
        assert!(store.remove("x").is_none());
        assert!(store.is_empty());
    }
}
