//! Shared loaders keyed by dataset.
//!
//! Tracks that display the same dataset share one [`TileLoader`], so a tile
//! fetched for one track is immediately available to the others. The registry
//! maps a dataset's cache key to its shared loader.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::debug;

use crate::loader::TileLoader;
use crate::payload::PayloadFetcher;

/// Loader shared between tracks.
pub type SharedTileLoader<F> = Arc<Mutex<TileLoader<F>>>;

/// Kind of data a dataset holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatasetKind {
    Annotation,
    Signal,
    Sequence,
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DatasetKind::Annotation => "annotation",
            DatasetKind::Signal => "signal",
            DatasetKind::Sequence => "sequence",
        };
        f.write_str(name)
    }
}

/// Identifies the dataset behind a track.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatasetDescriptor {
    pub kind: DatasetKind,
    /// File path or URL for file-backed datasets; `None` when the data source
    /// answers queries.
    pub path: Option<String>,
    pub contig: String,
}

impl DatasetDescriptor {
    pub fn new(kind: DatasetKind, contig: impl Into<String>) -> Self {
        Self {
            kind,
            path: None,
            contig: contig.into(),
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Deterministic key; descriptors of the same dataset produce equal keys.
    pub fn cache_key(&self) -> String {
        cache_key(self)
    }
}

/// `{kind}:source:{contig}` for source-backed datasets and
/// `{kind}:file:{path length}:{path}:{contig}` for file-backed ones. The
/// length prefix keeps paths and contigs containing ':' apart.
pub fn cache_key(descriptor: &DatasetDescriptor) -> String {
    match descriptor.path.as_deref() {
        None => format!("{}:source:{}", descriptor.kind, descriptor.contig),
        Some(path) => format!(
            "{}:file:{}:{}:{}",
            descriptor.kind,
            path.len(),
            path,
            descriptor.contig
        ),
    }
}

/// Maps cache keys to shared loaders.
pub struct LoaderRegistry<F: PayloadFetcher> {
    loaders: DashMap<String, SharedTileLoader<F>>,
}

impl<F: PayloadFetcher> LoaderRegistry<F> {
    pub fn new() -> Self {
        Self {
            loaders: DashMap::new(),
        }
    }

    /// The loader for `descriptor`, created with `make` on first use.
    pub fn get_or_create<M>(&self, descriptor: &DatasetDescriptor, make: M) -> SharedTileLoader<F>
    where
        M: FnOnce() -> TileLoader<F>,
    {
        let key = descriptor.cache_key();
        let entry = self.loaders.entry(key).or_insert_with(|| {
            debug!(
                kind = %descriptor.kind,
                contig = %descriptor.contig,
                "Creating tile loader"
            );
            Arc::new(Mutex::new(make()))
        });
        Arc::clone(entry.value())
    }

    pub fn get(&self, key: &str) -> Option<SharedTileLoader<F>> {
        self.loaders.get(key).map(|entry| Arc::clone(entry.value()))
    }

    /// Drops the registry's handle. Tracks still holding the loader keep it.
    pub fn remove(&self, key: &str) -> Option<SharedTileLoader<F>> {
        self.loaders.remove(key).map(|(_, loader)| loader)
    }

    pub fn len(&self) -> usize {
        self.loaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaders.is_empty()
    }
}

impl<F: PayloadFetcher> Default for LoaderRegistry<F> {
    fn default() -> Self {
        Self::new()
    }
}
