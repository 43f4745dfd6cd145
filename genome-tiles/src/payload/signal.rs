//! Signal payloads: one row of normalized samples per tile.

use std::sync::Arc;

use tracing::debug;

use super::{sample_index, DatasetMetadata, PayloadFetcher, SampleReading};
use crate::arena::{ArenaSlot, SampleArena, SharedArena};
use crate::error::FetchError;
use crate::source::{BoxFuture, DataSource};
use crate::tile::TileRange;

/// Samples of one signal tile, stored in the loader's arena.
#[derive(Debug)]
pub struct SignalPayload {
    slot: ArenaSlot,
    level: u8,
}

impl SignalPayload {
    pub fn level(&self) -> u8 {
        self.level
    }

    /// Arena row holding the samples.
    pub fn row(&self) -> usize {
        self.slot.row()
    }

    pub fn len(&self) -> usize {
        self.slot.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slot.is_empty()
    }

    pub fn samples(&self) -> Vec<f32> {
        self.slot.to_vec()
    }
}

impl SampleReading for SignalPayload {
    fn reading(&self, fraction: f64) -> Option<f32> {
        sample_index(fraction, self.slot.len()).and_then(|index| self.slot.sample(index))
    }
}

/// Fetches signal tiles from a data source into a shared sample arena.
pub struct SignalFetcher {
    source: Arc<dyn DataSource>,
    contig: String,
    arena: SharedArena,
}

impl SignalFetcher {
    /// Each tile is summarized as `row_width` samples.
    pub fn new(source: Arc<dyn DataSource>, contig: impl Into<String>, row_width: usize) -> Self {
        Self {
            source,
            contig: contig.into(),
            arena: SampleArena::shared(row_width),
        }
    }

    pub fn contig(&self) -> &str {
        &self.contig
    }

    pub fn arena(&self) -> &SharedArena {
        &self.arena
    }
}

impl PayloadFetcher for SignalFetcher {
    type Payload = SignalPayload;

    fn fetch(&self, range: TileRange) -> BoxFuture<'_, Result<SignalPayload, FetchError>> {
        Box::pin(async move {
            let samples = self.arena.lock().row_width();
            debug!(
                contig = %self.contig,
                level = range.level(),
                start = range.start(),
                samples,
                "Loading signal tile"
            );

            let values = self
                .source
                .load_signal(&self.contig, range.start(), range.span(), range.level(), samples)
                .await?;

            Ok(SignalPayload {
                slot: ArenaSlot::allocate(&self.arena, &values),
                level: range.level(),
            })
        })
    }

    fn load_metadata(&self) -> BoxFuture<'_, Result<DatasetMetadata, FetchError>> {
        Box::pin(async move {
            self.source
                .signal_metadata(&self.contig)
                .await
                .map_err(|e| match e {
                    FetchError::Metadata(_) => e,
                    other => FetchError::Metadata(other.to_string()),
                })
        })
    }
}
