//! Tile identity and lifecycle.
//!
//! A tile is one cell of the resolution pyramid: `level` selects the
//! resolution, `start` the base-pair offset. The span of a tile is not stored
//! independently; it is `tile_size << level` for the owning loader.
//!
//! # Lifecycle
//!
//! ```text
//! Empty ──► Loading ──► Complete
//!              │
//!              └──────► Error
//! ```
//!
//! Transitions happen once and never revert. Only the owning
//! [`TileLoader`](crate::loader::TileLoader) drives them; tracks hold
//! [`TileRef`] handles and read state and payload.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::FetchError;

/// Shared, read-only handle to a tile owned by a loader.
pub type TileRef<P> = Arc<Tile<P>>;

/// Identity of a tile within one dataset's pyramid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileKey {
    level: u8,
    start: u64,
}

impl TileKey {
    pub fn new(level: u8, start: u64) -> Self {
        Self { level, start }
    }

    /// Resolution level (0 is full detail).
    pub fn level(&self) -> u8 {
        self.level
    }

    /// First base covered by the tile.
    pub fn start(&self) -> u64 {
        self.start
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}@{}", self.level, self.start)
    }
}

/// Span in bases of a tile at `level` for a level-0 size of `tile_size`.
///
/// Saturates at `u64::MAX` instead of overflowing.
pub fn span_at(tile_size: u64, level: u8) -> u64 {
    1u64.checked_shl(u32::from(level))
        .map(|factor| tile_size.saturating_mul(factor))
        .unwrap_or(u64::MAX)
}

/// A tile key together with the base-pair interval it covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileRange {
    key: TileKey,
    span: u64,
}

impl TileRange {
    /// Resolves the interval of `key` in a pyramid with the given level-0 size.
    pub fn new(key: TileKey, tile_size: u64) -> Self {
        Self {
            key,
            span: span_at(tile_size, key.level),
        }
    }

    pub fn key(&self) -> TileKey {
        self.key
    }

    pub fn level(&self) -> u8 {
        self.key.level
    }

    pub fn start(&self) -> u64 {
        self.key.start
    }

    pub fn span(&self) -> u64 {
        self.span
    }

    /// Exclusive end of the interval.
    pub fn end(&self) -> u64 {
        self.key.start.saturating_add(self.span)
    }
}

/// Observable state of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileState {
    Empty,
    Loading,
    Complete,
    Error,
}

impl fmt::Display for TileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TileState::Empty => "empty",
            TileState::Loading => "loading",
            TileState::Complete => "complete",
            TileState::Error => "error",
        };
        f.write_str(name)
    }
}

enum Slot<P> {
    Empty,
    Loading,
    Complete(Arc<P>),
    Error(FetchError),
}

impl<P> Slot<P> {
    fn state(&self) -> TileState {
        match self {
            Slot::Empty => TileState::Empty,
            Slot::Loading => TileState::Loading,
            Slot::Complete(_) => TileState::Complete,
            Slot::Error(_) => TileState::Error,
        }
    }
}

/// One unit of cached data at a (level, start) coordinate.
pub struct Tile<P> {
    range: TileRange,
    slot: RwLock<Slot<P>>,
    last_used_frame: AtomicU64,
}

impl<P> Tile<P> {
    pub(crate) fn new(range: TileRange) -> Self {
        Self {
            range,
            slot: RwLock::new(Slot::Empty),
            last_used_frame: AtomicU64::new(0),
        }
    }

    pub fn key(&self) -> TileKey {
        self.range.key()
    }

    pub fn range(&self) -> TileRange {
        self.range
    }

    pub fn level(&self) -> u8 {
        self.range.level()
    }

    pub fn start(&self) -> u64 {
        self.range.start()
    }

    pub fn span(&self) -> u64 {
        self.range.span()
    }

    pub fn state(&self) -> TileState {
        self.slot.read().state()
    }

    pub fn is_complete(&self) -> bool {
        self.state() == TileState::Complete
    }

    /// The payload, present only once the tile is complete.
    pub fn payload(&self) -> Option<Arc<P>> {
        match &*self.slot.read() {
            Slot::Complete(payload) => Some(Arc::clone(payload)),
            _ => None,
        }
    }

    /// The failure reason, present only in the error state.
    pub fn error(&self) -> Option<FetchError> {
        match &*self.slot.read() {
            Slot::Error(err) => Some(err.clone()),
            _ => None,
        }
    }

    /// Frame number of the most recent display pass that used this tile.
    pub fn last_used_frame(&self) -> u64 {
        self.last_used_frame.load(Ordering::Relaxed)
    }

    /// Records that the tile was used by the display pass `frame`.
    ///
    /// The counter only moves forward.
    pub fn mark_last_used(&self, frame: u64) {
        self.last_used_frame.fetch_max(frame, Ordering::Relaxed);
    }

    /// Empty -> Loading. Returns false if the tile already left `Empty`.
    pub(crate) fn begin_loading(&self) -> bool {
        let mut slot = self.slot.write();
        if matches!(*slot, Slot::Empty) {
            *slot = Slot::Loading;
            true
        } else {
            false
        }
    }

    /// Loading -> Complete. Returns false if the tile was not loading.
    pub(crate) fn complete(&self, payload: P) -> bool {
        let mut slot = self.slot.write();
        if matches!(*slot, Slot::Loading) {
            *slot = Slot::Complete(Arc::new(payload));
            true
        } else {
            false
        }
    }

    /// Loading -> Error. Returns false if the tile was not loading.
    pub(crate) fn fail(&self, error: FetchError) -> bool {
        let mut slot = self.slot.write();
        if matches!(*slot, Slot::Loading) {
            *slot = Slot::Error(error);
            true
        } else {
            false
        }
    }
}

impl<P> fmt::Debug for Tile<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tile")
            .field("key", &self.key())
            .field("span", &self.span())
            .field("state", &self.state())
            .field("last_used_frame", &self.last_used_frame())
            .finish()
    }
}
