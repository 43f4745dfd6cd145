//! Sparse tile pyramid for one dataset.
//!
//! The loader answers "which tiles cover this range at this level" and makes
//! sure each of them is fetched exactly once:
//!
//! ```text
//! get_tiles(level, range)
//!     │
//!     ├─ existing tile ──────────────► returned as-is (coalesced)
//!     │
//!     └─ missing tile ─► Empty ─► Loading ─► spawn fetch on runtime
//!                                               │
//!                          mpsc completion ◄────┘
//!                                │
//! process_completions() ─► Complete / Error
//! ```
//!
//! Fetch tasks never touch tiles. They send a completion message, and the
//! display context applies it with [`TileLoader::process_completions`], so all
//! state transitions happen on one context. Nothing here blocks.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use crate::error::FetchError;
use crate::lod::LevelQuantizer;
use crate::payload::{DatasetMetadata, PayloadFetcher};
use crate::tile::{span_at, Tile, TileKey, TileRange, TileRef, TileState};
use crate::viewport::VisibleRange;

/// Pyramid geometry of one dataset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoaderConfig {
    /// Span in bases of a level-0 tile.
    pub tile_size: u64,
    pub quantizer: LevelQuantizer,
}

impl LoaderConfig {
    /// A zero tile size is raised to 1.
    pub fn new(tile_size: u64, quantizer: LevelQuantizer) -> Self {
        Self {
            tile_size: tile_size.max(1),
            quantizer,
        }
    }
}

/// Counters describing loader activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoaderStats {
    /// Tiles created (each one triggers exactly one fetch)
    pub tiles_created: u64,
    /// Fetch tasks spawned
    pub fetches_issued: u64,
    /// Fetches that completed successfully
    pub completed: u64,
    /// Fetches that failed
    pub failed: u64,
    /// Tiles removed by garbage collection
    pub evicted: u64,
    /// Tile requests answered by an existing tile
    pub coalesced: u64,
}

impl LoaderStats {
    /// Fraction of tile requests answered without a new fetch.
    pub fn coalescing_ratio(&self) -> f64 {
        let total = self.coalesced + self.tiles_created;
        if total == 0 {
            0.0
        } else {
            self.coalesced as f64 / total as f64
        }
    }
}

/// Keys of the tiles at `level` covering `range`, ascending by start.
///
/// Negative range starts are clamped to 0. Tiles starting at or beyond
/// `extent` are omitted.
pub fn tile_keys(tile_size: u64, level: u8, range: &VisibleRange, extent: Option<u64>) -> Vec<TileKey> {
    let span = span_at(tile_size.max(1), level);
    let end = range.end();

    let first = (range.start().max(0.0) / span as f64).floor() as u64;
    // starts past the last representable aligned tile have no keys
    let Some(mut x) = first.checked_mul(span) else {
        return Vec::new();
    };
    let mut keys = Vec::new();

    while (x as f64) < end {
        if extent.is_some_and(|extent| x >= extent) {
            break;
        }
        keys.push(TileKey::new(level, x));
        match x.checked_add(span) {
            Some(next) => x = next,
            None => break,
        }
    }
    keys
}

enum Completion<P> {
    Tile {
        key: TileKey,
        result: Result<P, FetchError>,
    },
    Metadata(Result<DatasetMetadata, FetchError>),
}

/// Owns the tiles of one dataset and schedules their fetches.
pub struct TileLoader<F: PayloadFetcher> {
    config: LoaderConfig,
    fetcher: Arc<F>,
    runtime: Handle,
    tiles: HashMap<TileKey, TileRef<F::Payload>>,
    completions_tx: mpsc::UnboundedSender<Completion<F::Payload>>,
    completions_rx: mpsc::UnboundedReceiver<Completion<F::Payload>>,
    in_flight: usize,
    metadata: Option<DatasetMetadata>,
    stats: LoaderStats,
}

impl<F: PayloadFetcher> TileLoader<F> {
    /// Creates a loader and starts loading dataset metadata on `runtime`.
    ///
    /// The loader is not [`ready`](Self::ready) until that metadata has been
    /// applied by [`process_completions`](Self::process_completions).
    pub fn new(config: LoaderConfig, fetcher: F, runtime: Handle) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let loader = Self {
            config,
            fetcher: Arc::new(fetcher),
            runtime,
            tiles: HashMap::new(),
            completions_tx,
            completions_rx,
            in_flight: 0,
            metadata: None,
            stats: LoaderStats::default(),
        };
        loader.spawn_metadata_load();
        loader
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub fn tile_size(&self) -> u64 {
        self.config.tile_size
    }

    pub fn macro_level(&self) -> u8 {
        self.config.quantizer.macro_level()
    }

    pub fn fetcher(&self) -> &Arc<F> {
        &self.fetcher
    }

    /// True once dataset metadata has arrived.
    pub fn ready(&self) -> bool {
        self.metadata.is_some()
    }

    pub fn metadata(&self) -> Option<&DatasetMetadata> {
        self.metadata.as_ref()
    }

    /// Number of fetches whose completion has not been applied yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// True while metadata or any tile fetch is outstanding.
    pub fn has_pending(&self) -> bool {
        !self.ready() || self.in_flight > 0
    }

    /// Level actually requested for a display level.
    pub fn map_level(&self, level: u8) -> u8 {
        self.config.quantizer.map_level(level)
    }

    /// Tiles covering `range` at `map_level(requested_level)`, ascending by
    /// start.
    ///
    /// Missing tiles are created and their fetch is scheduled. Once the
    /// dataset extent is known no tile at or beyond it is created.
    pub fn get_tiles(&mut self, requested_level: u8, range: &VisibleRange) -> Vec<TileRef<F::Payload>> {
        let level = self.map_level(requested_level);
        let extent = self.metadata.and_then(|m| m.extent);
        tile_keys(self.config.tile_size, level, range, extent)
            .into_iter()
            .map(|key| self.get_or_create(key))
            .collect()
    }

    /// The tile at `key`, if it has been created and not evicted.
    pub fn tile(&self, key: &TileKey) -> Option<TileRef<F::Payload>> {
        self.tiles.get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn stats(&self) -> LoaderStats {
        self.stats
    }

    /// Applies all completions received so far. Returns how many were applied.
    pub fn process_completions(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.completions_rx.try_recv() {
            self.apply(completion);
            applied += 1;
        }
        applied
    }

    /// Waits for at least one completion, then applies everything received.
    ///
    /// Returns 0 immediately when nothing is outstanding.
    pub async fn wait_for_completions(&mut self) -> usize {
        if !self.has_pending() {
            return 0;
        }
        match self.completions_rx.recv().await {
            Some(completion) => {
                self.apply(completion);
                1 + self.process_completions()
            }
            None => 0,
        }
    }

    /// Waits until metadata and every scheduled fetch have been applied.
    pub async fn wait_until_idle(&mut self) {
        while self.has_pending() {
            self.wait_for_completions().await;
        }
    }

    /// Evicts Complete and Error tiles unused for more than
    /// `max_idle_frames` frames. Returns the number evicted.
    ///
    /// Loading tiles are kept so that a key never has two fetches in flight.
    /// Tiles still referenced outside the loader (by any track's display
    /// nodes) are kept whatever their age: tracks of different sessions share
    /// loaders, and their frame numbers are not comparable.
    pub fn collect_garbage(&mut self, current_frame: u64, max_idle_frames: u64) -> usize {
        let before = self.tiles.len();
        self.tiles.retain(|key, tile| {
            let keep = match tile.state() {
                TileState::Empty | TileState::Loading => true,
                TileState::Complete | TileState::Error => {
                    Arc::strong_count(tile) > 1
                        || current_frame.saturating_sub(tile.last_used_frame()) <= max_idle_frames
                }
            };
            if !keep {
                trace!(key = %key, last_used = tile.last_used_frame(), "Evicting tile");
            }
            keep
        });

        let evicted = before - self.tiles.len();
        if evicted > 0 {
            self.stats.evicted += evicted as u64;
            debug!(evicted, remaining = self.tiles.len(), "Collected idle tiles");
        }
        evicted
    }

    /// Logs current statistics.
    pub fn log_stats(&self) {
        info!(
            tiles = self.tiles.len(),
            created = self.stats.tiles_created,
            fetches = self.stats.fetches_issued,
            completed = self.stats.completed,
            failed = self.stats.failed,
            evicted = self.stats.evicted,
            coalesced = self.stats.coalesced,
            in_flight = self.in_flight,
            coalescing_ratio = format!("{:.1}%", self.stats.coalescing_ratio() * 100.0),
            "Tile loader statistics"
        );
    }

    fn get_or_create(&mut self, key: TileKey) -> TileRef<F::Payload> {
        if let Some(tile) = self.tiles.get(&key) {
            self.stats.coalesced += 1;
            return Arc::clone(tile);
        }

        let tile = Arc::new(Tile::new(TileRange::new(key, self.config.tile_size)));
        self.tiles.insert(key, Arc::clone(&tile));
        self.stats.tiles_created += 1;

        if tile.begin_loading() {
            self.spawn_fetch(tile.range());
        }
        tile
    }

    fn spawn_fetch(&mut self, range: TileRange) {
        let fetcher = Arc::clone(&self.fetcher);
        let tx = self.completions_tx.clone();
        let key = range.key();

        self.in_flight += 1;
        self.stats.fetches_issued += 1;
        trace!(key = %key, span = range.span(), "Scheduling tile fetch");

        self.runtime.spawn(async move {
            let result = fetcher.fetch(range).await;
            if tx.send(Completion::Tile { key, result }).is_err() {
                trace!(key = %key, "Loader dropped before fetch completed");
            }
        });
    }

    fn spawn_metadata_load(&self) {
        let fetcher = Arc::clone(&self.fetcher);
        let tx = self.completions_tx.clone();

        self.runtime.spawn(async move {
            let result = fetcher.load_metadata().await;
            if tx.send(Completion::Metadata(result)).is_err() {
                trace!("Loader dropped before metadata loaded");
            }
        });
    }

    fn apply(&mut self, completion: Completion<F::Payload>) {
        match completion {
            Completion::Tile { key, result } => {
                self.in_flight = self.in_flight.saturating_sub(1);
                let Some(tile) = self.tiles.get(&key) else {
                    trace!(key = %key, "Completion for unknown tile");
                    return;
                };
                match result {
                    Ok(payload) => {
                        if tile.complete(payload) {
                            self.stats.completed += 1;
                            debug!(key = %key, "Tile complete");
                        }
                    }
                    Err(error) => {
                        warn!(key = %key, error = %error, "Tile fetch failed");
                        if tile.fail(error) {
                            self.stats.failed += 1;
                        }
                    }
                }
            }
            Completion::Metadata(result) => {
                let metadata = match result {
                    Ok(metadata) => metadata,
                    Err(error) => {
                        warn!(error = %error, "Dataset metadata unavailable, using defaults");
                        DatasetMetadata::default()
                    }
                };
                debug!(
                    extent = ?metadata.extent,
                    scale_factor = metadata.scale_factor,
                    "Dataset metadata loaded"
                );
                self.metadata = Some(metadata);
            }
        }
    }
}
