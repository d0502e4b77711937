use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use shared_config::AppConfig;
use shared_models::EntityKind;

/// Whole-collection persistence keyed by entity kind.
///
/// Every save replaces the complete collection; there are no partial writes.
pub trait EntityStore: Send + Sync {
    fn load(&self, kind: EntityKind) -> Result<Vec<Value>>;
    fn save(&self, kind: EntityKind, records: Vec<Value>) -> Result<()>;
}

/// Typed helpers on top of the raw JSON collections.
pub trait EntityStoreExt: EntityStore {
    fn load_all<T: DeserializeOwned>(&self, kind: EntityKind) -> Result<Vec<T>> {
        self.load(kind)?
            .into_iter()
            .map(|record| serde_json::from_value(record).map_err(|e| anyhow!("Failed to parse {} record: {}", kind, e)))
            .collect()
    }

    fn save_all<T: Serialize>(&self, kind: EntityKind, records: &[T]) -> Result<()> {
        let values = records
            .iter()
            .map(serde_json::to_value)
            .collect::<std::result::Result<Vec<Value>, _>>()
            .with_context(|| format!("Failed to serialize {} records", kind))?;
        self.save(kind, values)
    }
}

impl<S: EntityStore + ?Sized> EntityStoreExt for S {}

/// Pick the store the configuration asks for.
pub fn store_from_config(config: &AppConfig) -> Result<Arc<dyn EntityStore>> {
    match &config.data_dir {
        Some(dir) => Ok(Arc::new(JsonFileStore::open(dir)?)),
        None => {
            warn!("No data directory configured, using in-memory store");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

// ==============================================================================
// JSON FILE STORE
// ==============================================================================

/// One JSON array document per collection inside a data directory.
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create data directory {}", root.display()))?;
        info!("Using data directory {}", root.display());
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn collection_path(&self, kind: EntityKind) -> PathBuf {
        self.root.join(format!("{}.json", kind.collection_name()))
    }
}

impl EntityStore for JsonFileStore {
    fn load(&self, kind: EntityKind) -> Result<Vec<Value>> {
        let path = self.collection_path(kind);
        if !path.exists() {
            debug!("No {} collection at {}, starting empty", kind, path.display());
            return Ok(Vec::new());
        }

        let raw = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }

        let records: Vec<Value> = serde_json::from_str(&raw)
            .with_context(|| format!("Malformed collection file {}", path.display()))?;
        debug!("Loaded {} {} records", records.len(), kind);
        Ok(records)
    }

    fn save(&self, kind: EntityKind, records: Vec<Value>) -> Result<()> {
        let path = self.collection_path(kind);
        let staging = path.with_extension("json.tmp");
        let body = serde_json::to_vec_pretty(&Value::Array(records))?;

        let mut file = fs::File::create(&staging)
            .with_context(|| format!("Failed to create {}", staging.display()))?;
        file.write_all(&body)?;
        file.sync_all()?;
        fs::rename(&staging, &path)
            .with_context(|| format!("Failed to replace {}", path.display()))?;

        debug!("Saved {} collection ({} bytes)", kind, body.len());
        Ok(())
    }
}

// ==============================================================================
// IN-MEMORY STORE
// ==============================================================================

/// Process-local store. Writes can be made to fail to exercise error paths.
#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<EntityKind, Vec<Value>>>,
    fail_writes: AtomicBool,
    writes: Mutex<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful collection saves so far.
    pub fn write_count(&self) -> usize {
        *self.writes.lock()
    }

    pub fn snapshot(&self, kind: EntityKind) -> Vec<Value> {
        self.collections.lock().get(&kind).cloned().unwrap_or_default()
    }
}

impl EntityStore for MemoryStore {
    fn load(&self, kind: EntityKind) -> Result<Vec<Value>> {
        Ok(self.snapshot(kind))
    }

    fn save(&self, kind: EntityKind, records: Vec<Value>) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(anyhow!("write to {} collection rejected", kind));
        }
        self.collections.lock().insert(kind, records);
        *self.writes.lock() += 1;
        Ok(())
    }
}
