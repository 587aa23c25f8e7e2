//! # Outbound Ports (Driven Ports)
//!
//! Dependencies required by the nanopublication manager.
//!
//! These are the interfaces the host application implements. In-process
//! adapters for single-node use and tests live at the bottom of this file.

use std::collections::HashMap;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use shared_types::{nquads, Dataset, Iri, Quad, QuadPattern, QuadSource, SourceError, Term};
use tracing::debug;

use crate::domain::errors::{DepotError, StoreError};

/// Named-graph quad store.
///
/// Production: a SPARQL endpoint behind an adapter in the node runtime.
/// Testing: `InMemoryQuadStore` (below).
pub trait QuadStore: QuadSource + Send + Sync {
    /// Load every statement from an N-Quads reader in one call.
    ///
    /// ## Atomicity
    ///
    /// Either ALL statements are loaded, or NONE are.
    fn bulk_load(&self, reader: &mut dyn BufRead) -> Result<usize, StoreError>;

    /// Remove every quad of a named graph. Returns the number removed.
    fn remove_graph(&self, graph: &Term) -> Result<usize, StoreError>;

    /// Remove `graphs` and load an N-Quads reader as one operation.
    /// Returns the number of statements loaded.
    ///
    /// ## Atomicity
    ///
    /// A reader that fails to parse leaves every graph in place.
    fn replace(&self, graphs: &[Term], reader: &mut dyn BufRead) -> Result<usize, StoreError>;

    /// Make preceding removals durable.
    fn commit(&self) -> Result<(), StoreError>;
}

/// Metadata kept alongside each blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMeta {
    pub filename: String,
    pub mime: String,
    pub size: usize,
}

/// Binary file store.
pub trait BlobDepot: Send + Sync {
    /// Store bytes, returning a new file id.
    fn create(&self, bytes: &[u8], filename: &str, mime: &str) -> Result<String, DepotError>;

    /// Returns true if the id is known.
    fn exists(&self, file_id: &str) -> Result<bool, DepotError>;

    /// Remove a blob.
    fn delete(&self, file_id: &str) -> Result<(), DepotError>;

    /// Read a blob and its metadata.
    fn get(&self, file_id: &str) -> Result<(FileMeta, Vec<u8>), DepotError>;
}

/// Receives one call per published identifier, after commit.
pub trait UpdateListener: Send + Sync {
    fn on_publish(&self, nanopub: &Iri);
}

/// Abstract interface for time operations (for testability).
pub trait TimeSource: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

impl<T: QuadStore + ?Sized> QuadStore for std::sync::Arc<T> {
    fn bulk_load(&self, reader: &mut dyn BufRead) -> Result<usize, StoreError> {
        (**self).bulk_load(reader)
    }

    fn remove_graph(&self, graph: &Term) -> Result<usize, StoreError> {
        (**self).remove_graph(graph)
    }

    fn replace(&self, graphs: &[Term], reader: &mut dyn BufRead) -> Result<usize, StoreError> {
        (**self).replace(graphs, reader)
    }

    fn commit(&self) -> Result<(), StoreError> {
        (**self).commit()
    }
}

impl<T: BlobDepot + ?Sized> BlobDepot for std::sync::Arc<T> {
    fn create(&self, bytes: &[u8], filename: &str, mime: &str) -> Result<String, DepotError> {
        (**self).create(bytes, filename, mime)
    }

    fn exists(&self, file_id: &str) -> Result<bool, DepotError> {
        (**self).exists(file_id)
    }

    fn delete(&self, file_id: &str) -> Result<(), DepotError> {
        (**self).delete(file_id)
    }

    fn get(&self, file_id: &str) -> Result<(FileMeta, Vec<u8>), DepotError> {
        (**self).get(file_id)
    }
}

impl<T: UpdateListener + ?Sized> UpdateListener for std::sync::Arc<T> {
    fn on_publish(&self, nanopub: &Iri) {
        (**self).on_publish(nanopub)
    }
}

impl<T: TimeSource + ?Sized> TimeSource for std::sync::Arc<T> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

// =============================================================================
// ADAPTER IMPLEMENTATIONS
// Testing and single-node: in-memory implementations below
// =============================================================================

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct FixedTimeSource {
    now: Mutex<DateTime<Utc>>,
}

impl FixedTimeSource {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl TimeSource for FixedTimeSource {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// Listener that ignores notifications.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopListener;

impl UpdateListener for NoopListener {
    fn on_publish(&self, _nanopub: &Iri) {}
}

/// Listener that remembers every notification, in order.
#[derive(Debug, Default)]
pub struct RecordingListener {
    seen: Mutex<Vec<Iri>>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifications received so far.
    pub fn seen(&self) -> Vec<Iri> {
        self.seen.lock().clone()
    }
}

impl UpdateListener for RecordingListener {
    fn on_publish(&self, nanopub: &Iri) {
        self.seen.lock().push(nanopub.clone());
    }
}

/// In-memory quad store.
///
/// Each bulk load and graph removal runs under one write lock.
#[derive(Debug, Default)]
pub struct InMemoryQuadStore {
    data: RwLock<Dataset>,
    commits: AtomicU64,
}

impl InMemoryQuadStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of quads held.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Number of `commit` calls so far.
    pub fn commit_count(&self) -> u64 {
        self.commits.load(Ordering::Relaxed)
    }

    /// Copy of everything in the store.
    pub fn snapshot(&self) -> Dataset {
        self.data.read().clone()
    }

    /// Insert quads directly, bypassing the loader.
    pub fn insert_all<I: IntoIterator<Item = Quad>>(&self, quads: I) {
        self.data.write().extend(quads);
    }
}

impl QuadSource for InMemoryQuadStore {
    fn match_quads(&self, pattern: &QuadPattern) -> Result<Vec<Quad>, SourceError> {
        Ok(self.data.read().matching(pattern).cloned().collect())
    }
}

impl QuadStore for InMemoryQuadStore {
    fn bulk_load(&self, reader: &mut dyn BufRead) -> Result<usize, StoreError> {
        // parse everything before taking the lock so a bad line loads nothing
        let parsed = nquads::read_quads(reader)?;
        let count = parsed.len();
        self.data.write().extend(parsed);
        debug!(quads = count, "Bulk load applied");
        Ok(count)
    }

    fn remove_graph(&self, graph: &Term) -> Result<usize, StoreError> {
        Ok(self.data.write().remove_graph(graph))
    }

    fn replace(&self, graphs: &[Term], reader: &mut dyn BufRead) -> Result<usize, StoreError> {
        let parsed = nquads::read_quads(reader)?;
        let count = parsed.len();
        let mut data = self.data.write();
        let removed: usize = graphs.iter().map(|graph| data.remove_graph(graph)).sum();
        data.extend(parsed);
        debug!(removed, quads = count, "Replace applied");
        Ok(count)
    }

    fn commit(&self) -> Result<(), StoreError> {
        self.commits.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// In-memory blob depot.
#[derive(Debug, Default)]
pub struct InMemoryBlobDepot {
    files: RwLock<HashMap<String, (FileMeta, Vec<u8>)>>,
}

impl InMemoryBlobDepot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.files.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.read().is_empty()
    }
}

impl BlobDepot for InMemoryBlobDepot {
    fn create(&self, bytes: &[u8], filename: &str, mime: &str) -> Result<String, DepotError> {
        let file_id = uuid::Uuid::new_v4().simple().to_string();
        let meta = FileMeta {
            filename: filename.to_string(),
            mime: mime.to_string(),
            size: bytes.len(),
        };
        self.files
            .write()
            .insert(file_id.clone(), (meta, bytes.to_vec()));
        Ok(file_id)
    }

    fn exists(&self, file_id: &str) -> Result<bool, DepotError> {
        Ok(self.files.read().contains_key(file_id))
    }

    fn delete(&self, file_id: &str) -> Result<(), DepotError> {
        self.files
            .write()
            .remove(file_id)
            .map(|_| ())
            .ok_or_else(|| DepotError::NotFound(file_id.to_string()))
    }

    fn get(&self, file_id: &str) -> Result<(FileMeta, Vec<u8>), DepotError> {
        self.files
            .read()
            .get(file_id)
            .cloned()
            .ok_or_else(|| DepotError::NotFound(file_id.to_string()))
    }
}

/// Directory-backed blob depot.
///
/// Layout: `<root>/<id>` holds the bytes, `<root>/<id>.json` the metadata.
#[derive(Debug, Clone)]
pub struct FileSystemBlobDepot {
    root: PathBuf,
}

impl FileSystemBlobDepot {
    /// Open (and create if needed) a depot directory.
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self, DepotError> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn blob_path(&self, file_id: &str) -> PathBuf {
        self.root.join(file_id)
    }

    fn meta_path(&self, file_id: &str) -> PathBuf {
        self.root.join(format!("{}.json", file_id))
    }

    /// Ids are generated here; anything else could escape the root.
    fn check_id(file_id: &str) -> Result<(), DepotError> {
        if file_id.is_empty() || !file_id.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(DepotError::NotFound(file_id.to_string()));
        }
        Ok(())
    }
}

impl BlobDepot for FileSystemBlobDepot {
    fn create(&self, bytes: &[u8], filename: &str, mime: &str) -> Result<String, DepotError> {
        let file_id = uuid::Uuid::new_v4().simple().to_string();
        let meta = FileMeta {
            filename: filename.to_string(),
            mime: mime.to_string(),
            size: bytes.len(),
        };
        std::fs::write(self.blob_path(&file_id), bytes)?;
        std::fs::write(self.meta_path(&file_id), serde_json::to_vec(&meta)?)?;
        Ok(file_id)
    }

    fn exists(&self, file_id: &str) -> Result<bool, DepotError> {
        if Self::check_id(file_id).is_err() {
            return Ok(false);
        }
        Ok(self.blob_path(file_id).is_file())
    }

    fn delete(&self, file_id: &str) -> Result<(), DepotError> {
        Self::check_id(file_id)?;
        let blob = self.blob_path(file_id);
        if !blob.is_file() {
            return Err(DepotError::NotFound(file_id.to_string()));
        }
        std::fs::remove_file(blob)?;
        let meta = self.meta_path(file_id);
        if meta.is_file() {
            std::fs::remove_file(meta)?;
        }
        Ok(())
    }

    fn get(&self, file_id: &str) -> Result<(FileMeta, Vec<u8>), DepotError> {
        Self::check_id(file_id)?;
        let blob = self.blob_path(file_id);
        if !blob.is_file() {
            return Err(DepotError::NotFound(file_id.to_string()));
        }
        let bytes = std::fs::read(blob)?;
        let meta: FileMeta = serde_json::from_slice(&std::fs::read(self.meta_path(file_id))?)?;
        Ok((meta, bytes))
    }
}
