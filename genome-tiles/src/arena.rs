//! Shared row storage for signal samples.
//!
//! All signal tiles of one loader store their samples as fixed-width rows of
//! a single growable buffer. A tile payload holds an [`ArenaSlot`]; dropping
//! the slot returns its row to the free list, so evicting a tile releases its
//! storage without any explicit bookkeeping by the caller.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

/// Default number of samples per row.
pub const DEFAULT_ROW_WIDTH: usize = 1024;

/// Fixed-width row buffer with a free list.
#[derive(Debug)]
pub struct SampleArena {
    row_width: usize,
    data: Vec<f32>,
    free_rows: Vec<usize>,
    rows_in_use: usize,
}

/// Arena shared between a fetcher and the payloads it produces.
pub type SharedArena = Arc<Mutex<SampleArena>>;

impl SampleArena {
    /// Creates an empty arena. A zero width is raised to 1.
    pub fn new(row_width: usize) -> Self {
        Self {
            row_width: row_width.max(1),
            data: Vec::new(),
            free_rows: Vec::new(),
            rows_in_use: 0,
        }
    }

    /// Creates an empty arena behind a shared handle.
    pub fn shared(row_width: usize) -> SharedArena {
        Arc::new(Mutex::new(Self::new(row_width)))
    }

    pub fn row_width(&self) -> usize {
        self.row_width
    }

    /// Total rows ever allocated, in use or free.
    pub fn capacity_rows(&self) -> usize {
        self.data.len() / self.row_width
    }

    pub fn rows_in_use(&self) -> usize {
        self.rows_in_use
    }

    /// Copies `samples` into a free row and returns its index.
    ///
    /// Input longer than the row width is truncated; shorter input leaves the
    /// remainder of the row zeroed.
    pub fn allocate(&mut self, samples: &[f32]) -> usize {
        let row = match self.free_rows.pop() {
            Some(row) => row,
            None => {
                let row = self.capacity_rows();
                self.data.resize(self.data.len() + self.row_width, 0.0);
                row
            }
        };

        let offset = row * self.row_width;
        let dest = &mut self.data[offset..offset + self.row_width];
        let n = samples.len().min(self.row_width);
        dest[..n].copy_from_slice(&samples[..n]);
        dest[n..].fill(0.0);

        self.rows_in_use += 1;
        trace!(row, rows_in_use = self.rows_in_use, "Allocated arena row");
        row
    }

    /// Samples of `row`. Empty if the row was never allocated.
    pub fn row(&self, row: usize) -> &[f32] {
        let offset = row * self.row_width;
        self.data
            .get(offset..offset + self.row_width)
            .unwrap_or(&[])
    }

    /// Returns `row` to the free list.
    pub fn release(&mut self, row: usize) {
        if row >= self.capacity_rows() || self.free_rows.contains(&row) {
            return;
        }
        self.free_rows.push(row);
        self.rows_in_use = self.rows_in_use.saturating_sub(1);
        trace!(row, rows_in_use = self.rows_in_use, "Released arena row");
    }
}

/// Ownership of one arena row.
pub struct ArenaSlot {
    arena: SharedArena,
    row: usize,
    len: usize,
}

impl ArenaSlot {
    /// Copies `samples` into a new row of `arena`.
    pub fn allocate(arena: &SharedArena, samples: &[f32]) -> Self {
        let mut guard = arena.lock();
        let row = guard.allocate(samples);
        let len = samples.len().min(guard.row_width());
        drop(guard);

        Self {
            arena: Arc::clone(arena),
            row,
            len,
        }
    }

    pub fn row(&self) -> usize {
        self.row
    }

    /// Number of meaningful samples in the row.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Sample at `index`, if within the stored length.
    pub fn sample(&self, index: usize) -> Option<f32> {
        if index >= self.len {
            return None;
        }
        self.arena.lock().row(self.row).get(index).copied()
    }

    /// Copy of the stored samples.
    pub fn to_vec(&self) -> Vec<f32> {
        let arena = self.arena.lock();
        arena.row(self.row)[..self.len].to_vec()
    }
}

impl Drop for ArenaSlot {
    fn drop(&mut self) {
        self.arena.lock().release(self.row);
    }
}

impl fmt::Debug for ArenaSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArenaSlot")
            .field("row", &self.row)
            .field("len", &self.len)
            .finish()
    }
}
