//! Storage layer for teamboard
//!
//! Every entity type lives in one JSON document that is always read and
//! written as a whole. Stores never touch files directly: they go through a
//! [`CollectionHandle`], which runs the load / mutate / save cycle under the
//! backend's writer lock.
//!
//! # Directory Structure
//!
//! ```text
//! <data_dir>/                 # default: db/
//!   users.json                # user collection
//!   users.json.lock           # writer lock for users.json
//!   teams.json
//!   boards.json               # boards with nested tasks
//! <out_dir>/                  # default: out/
//!   board_<id>.txt            # board exports
//! ```
//!
//! # Document layout
//!
//! ```text
//! {
//!   "schema_version": "teamboard.collection.v1",
//!   "sequences": { "record": 3 },
//!   "records": { "1": {...}, "2": {...}, "3": {...} }
//! }
//! ```
//!
//! A bare `{ "<id>": {...} }` map is also accepted on load and is rewritten in
//! the current layout by the next mutation.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::lock::{self, FileLock, DEFAULT_LOCK_TIMEOUT_MS};

pub const COLLECTION_SCHEMA_VERSION: &str = "teamboard.collection.v1";

/// Sequence used for top-level record identifiers.
pub const RECORD_SEQUENCE: &str = "record";

pub const USERS_FILE: &str = "users.json";
pub const TEAMS_FILE: &str = "teams.json";
pub const BOARDS_FILE: &str = "boards.json";

// =============================================================================
// Collection document
// =============================================================================

/// One entity collection, held fully in memory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collection<R> {
    pub schema_version: String,
    /// Last identifier handed out per named sequence.
    #[serde(default)]
    pub sequences: BTreeMap<String, u64>,
    #[serde(default = "BTreeMap::new")]
    pub records: BTreeMap<String, R>,
}

impl<R> Collection<R> {
    pub fn empty() -> Self {
        Self {
            schema_version: COLLECTION_SCHEMA_VERSION.to_string(),
            sequences: BTreeMap::new(),
            records: BTreeMap::new(),
        }
    }

    /// Wrap a bare id map; the record sequence resumes after its largest
    /// numeric id.
    fn from_legacy(records: BTreeMap<String, R>) -> Self {
        let mut collection = Self {
            records,
            ..Self::empty()
        };
        let largest = collection
            .records
            .keys()
            .filter_map(|id| id.parse::<u64>().ok())
            .max();
        if let Some(max) = largest {
            collection.sequences.insert(RECORD_SEQUENCE.to_string(), max);
        }
        collection
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&R> {
        self.records.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut R> {
        self.records.get_mut(id)
    }

    pub fn insert(&mut self, id: String, record: R) {
        self.records.insert(id, record);
    }

    pub fn values(&self) -> impl Iterator<Item = &R> {
        self.records.values()
    }

    /// Records in identifier order (numeric ids sort numerically).
    pub fn ordered(&self) -> Vec<(&str, &R)> {
        let mut entries: Vec<(&str, &R)> = self
            .records
            .iter()
            .map(|(id, record)| (id.as_str(), record))
            .collect();
        entries.sort_by(|(a, _), (b, _)| compare_ids(a, b));
        entries
    }

    /// Allocate the next top-level record identifier.
    ///
    /// Identifiers come from a counter persisted with the collection, so they
    /// never depend on how many records exist.
    pub fn next_record_id(&mut self) -> String {
        let counter = self
            .sequences
            .entry(RECORD_SEQUENCE.to_string())
            .or_insert(0);
        let records = &self.records;
        advance(counter, |candidate| records.contains_key(candidate))
    }

    /// Allocate from a secondary sequence, skipping anything `taken` reports.
    pub fn next_sequence_id(&mut self, sequence: &str, taken: impl Fn(&str) -> bool) -> String {
        let counter = self.sequences.entry(sequence.to_string()).or_insert(0);
        advance(counter, taken)
    }
}

fn advance(counter: &mut u64, taken: impl Fn(&str) -> bool) -> String {
    loop {
        *counter += 1;
        let candidate = counter.to_string();
        if !taken(&candidate) {
            return candidate;
        }
    }
}

/// Order identifiers numerically when both parse, lexically otherwise.
pub fn compare_ids(a: &str, b: &str) -> std::cmp::Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => std::cmp::Ordering::Less,
        (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

fn corrupt(path: &Path, message: impl ToString) -> Error {
    Error::CorruptCollection {
        path: path.to_path_buf(),
        message: message.to_string(),
    }
}

/// Decode a stored document, accepting the legacy bare-map layout.
pub fn decode_collection<R: DeserializeOwned>(bytes: &[u8], path: &Path) -> Result<Collection<R>> {
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(Collection::empty());
    }
    let value: serde_json::Value = serde_json::from_slice(bytes).map_err(|e| corrupt(path, e))?;
    if !value.is_object() {
        return Err(corrupt(path, "top-level value is not an object"));
    }
    if value.get("schema_version").is_some() {
        let collection: Collection<R> =
            serde_json::from_value(value).map_err(|e| corrupt(path, e))?;
        if collection.schema_version != COLLECTION_SCHEMA_VERSION {
            return Err(corrupt(
                path,
                format!("unsupported schema version '{}'", collection.schema_version),
            ));
        }
        return Ok(collection);
    }
    let records: BTreeMap<String, R> =
        serde_json::from_value(value).map_err(|e| corrupt(path, e))?;
    debug!(path = %path.display(), records = records.len(), "read legacy collection layout");
    Ok(Collection::from_legacy(records))
}

pub fn encode_collection<R: Serialize>(collection: &Collection<R>, pretty: bool) -> Result<Vec<u8>> {
    let mut bytes = if pretty {
        serde_json::to_vec_pretty(collection)?
    } else {
        serde_json::to_vec(collection)?
    };
    bytes.push(b'\n');
    Ok(bytes)
}

// =============================================================================
// Backends
// =============================================================================

/// Held for the whole read-modify-write cycle of one collection.
pub struct CollectionGuard<'a> {
    _local: MutexGuard<'a, ()>,
    _file: Option<FileLock>,
}

fn enter(gate: &Mutex<()>) -> MutexGuard<'_, ()> {
    // The gate guards no data, so a poisoned lock is still usable.
    gate.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Durable home of one collection.
///
/// `lock` serializes writers (in this process and, for file backends, across
/// processes). `load` and `save` always move the whole collection.
pub trait CollectionBackend<R>: Send + Sync {
    /// Human-readable location, used in logs.
    fn location(&self) -> String;

    fn lock(&self) -> Result<CollectionGuard<'_>>;

    fn load(&self) -> Result<Collection<R>>;

    /// Replace the stored collection. Either the whole document is written
    /// or the previous one stays in place.
    fn save(&self, collection: &Collection<R>) -> Result<()>;
}

/// Knobs shared by file backends.
#[derive(Debug, Clone, Copy)]
pub struct StorageOptions {
    pub lock_timeout_ms: u64,
    pub pretty: bool,
}

impl Default for StorageOptions {
    fn default() -> Self {
        Self {
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
            pretty: true,
        }
    }
}

/// A collection stored as one JSON file next to a `.lock` file.
#[derive(Debug)]
pub struct JsonFileBackend {
    path: PathBuf,
    options: StorageOptions,
    gate: Mutex<()>,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>, options: StorageOptions) -> Self {
        Self {
            path: path.into(),
            options,
            gate: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write an empty collection if the file does not exist yet.
    pub fn ensure_initialized(&self) -> Result<bool> {
        let _local = enter(&self.gate);
        let _file = FileLock::acquire(lock::lock_path_for(&self.path), self.options.lock_timeout_ms)?;
        if self.path.exists() {
            return Ok(false);
        }
        let empty: Collection<serde_json::Value> = Collection::empty();
        lock::write_atomic(&self.path, &encode_collection(&empty, self.options.pretty)?)?;
        debug!(path = %self.path.display(), "initialized empty collection");
        Ok(true)
    }
}

impl<R> CollectionBackend<R> for JsonFileBackend
where
    R: Serialize + DeserializeOwned,
{
    fn location(&self) -> String {
        self.path.display().to_string()
    }

    fn lock(&self) -> Result<CollectionGuard<'_>> {
        let local = enter(&self.gate);
        let file = FileLock::acquire(lock::lock_path_for(&self.path), self.options.lock_timeout_ms)?;
        Ok(CollectionGuard {
            _local: local,
            _file: Some(file),
        })
    }

    fn load(&self) -> Result<Collection<R>> {
        if !self.path.exists() {
            return Ok(Collection::empty());
        }
        let bytes = fs::read(&self.path)?;
        let collection = decode_collection(&bytes, &self.path)?;
        debug!(path = %self.path.display(), records = collection.len(), "loaded collection");
        Ok(collection)
    }

    fn save(&self, collection: &Collection<R>) -> Result<()> {
        let bytes = encode_collection(collection, self.options.pretty)?;
        lock::write_atomic(&self.path, &bytes)?;
        debug!(path = %self.path.display(), records = collection.len(), "saved collection");
        Ok(())
    }
}

/// In-memory backend for tests and embedding.
///
/// The document is kept serialized so loads and saves go through the same
/// codec as the file backend.
#[derive(Debug)]
pub struct MemoryBackend {
    label: String,
    document: Mutex<Option<Vec<u8>>>,
    gate: Mutex<()>,
    fail_writes: AtomicBool,
}

impl MemoryBackend {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            document: Mutex::new(None),
            gate: Mutex::new(()),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Seed the backend with raw document bytes.
    pub fn with_document(label: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        let backend = Self::new(label);
        *backend.slot() = Some(bytes.into());
        backend
    }

    /// Make every subsequent `save` fail, leaving the stored document as is.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Raw stored bytes, if anything has been written.
    pub fn document(&self) -> Option<Vec<u8>> {
        self.slot().clone()
    }

    fn slot(&self) -> MutexGuard<'_, Option<Vec<u8>>> {
        self.document
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<R> CollectionBackend<R> for MemoryBackend
where
    R: Serialize + DeserializeOwned,
{
    fn location(&self) -> String {
        format!("memory:{}", self.label)
    }

    fn lock(&self) -> Result<CollectionGuard<'_>> {
        Ok(CollectionGuard {
            _local: enter(&self.gate),
            _file: None,
        })
    }

    fn load(&self) -> Result<Collection<R>> {
        match self.slot().as_deref() {
            Some(bytes) => decode_collection(bytes, Path::new(&self.label)),
            None => Ok(Collection::empty()),
        }
    }

    fn save(&self, collection: &Collection<R>) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("write to {} rejected", self.label),
            )));
        }
        let bytes = encode_collection(collection, false)?;
        *self.slot() = Some(bytes);
        Ok(())
    }
}

// =============================================================================
// Handle
// =============================================================================

/// Runs reads and read-modify-write cycles against one backend.
pub struct CollectionHandle<R> {
    backend: Arc<dyn CollectionBackend<R>>,
}

impl<R> Clone for CollectionHandle<R> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
        }
    }
}

impl<R> CollectionHandle<R> {
    pub fn new(backend: Arc<dyn CollectionBackend<R>>) -> Self {
        Self { backend }
    }

    pub fn location(&self) -> String {
        self.backend.location()
    }

    /// Load under the lock, release it, then project the snapshot.
    pub fn read<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Collection<R>) -> Result<T>,
    {
        let collection = {
            let _guard = self.backend.lock()?;
            self.backend.load()?
        };
        f(&collection)
    }

    /// Load, let `f` validate and mutate, then save the whole collection.
    ///
    /// Nothing is written when `f` fails.
    pub fn update<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Collection<R>) -> Result<T>,
    {
        let _guard = self.backend.lock()?;
        let mut collection = self.backend.load()?;
        let result = f(&mut collection)?;
        self.backend.save(&collection)?;
        Ok(result)
    }
}

// =============================================================================
// Layout
// =============================================================================

/// Where the collections and exports live.
#[derive(Debug, Clone)]
pub struct Storage {
    data_dir: PathBuf,
    out_dir: PathBuf,
    options: StorageOptions,
}

impl Storage {
    pub fn new(data_dir: PathBuf, out_dir: PathBuf, options: StorageOptions) -> Self {
        Self {
            data_dir,
            out_dir,
            options,
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    pub fn options(&self) -> StorageOptions {
        self.options
    }

    pub fn users_file(&self) -> PathBuf {
        self.data_dir.join(USERS_FILE)
    }

    pub fn teams_file(&self) -> PathBuf {
        self.data_dir.join(TEAMS_FILE)
    }

    pub fn boards_file(&self) -> PathBuf {
        self.data_dir.join(BOARDS_FILE)
    }

    pub fn backend(&self, path: PathBuf) -> JsonFileBackend {
        JsonFileBackend::new(path, self.options)
    }

    /// Create the data directory and any missing collection files.
    ///
    /// Returns the files that were created.
    pub fn init(&self) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(&self.data_dir)?;
        let mut created = Vec::new();
        for path in [self.users_file(), self.teams_file(), self.boards_file()] {
            if self.backend(path.clone()).ensure_initialized()? {
                created.push(path);
            }
        }
        Ok(created)
    }

    pub fn is_initialized(&self) -> bool {
        self.users_file().exists() && self.teams_file().exists() && self.boards_file().exists()
    }
}
