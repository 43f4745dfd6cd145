//! Payload strategies.
//!
//! A [`TileLoader`](crate::loader::TileLoader) is generic over a
//! [`PayloadFetcher`]: the fetcher knows how to turn a tile's base-pair
//! interval into a payload, the loader knows nothing about track kinds.
//!
//! | Fetcher | Payload | Backing |
//! |---------|---------|---------|
//! | [`AnnotationFetcher`] | [`Reconstruction`](crate::annotation::Reconstruction) | data source or flat JSON tile files |
//! | [`SignalFetcher`] | [`SignalPayload`] | data source, samples in a shared arena |
//! | [`SequenceFetcher`] | [`SequencePayload`] | data source |

mod annotation;
mod sequence;
mod signal;

pub use annotation::{AnnotationFetcher, AnnotationFormat};
pub use sequence::{SequenceFetcher, SequencePayload};
pub use signal::{SignalFetcher, SignalPayload};

use crate::error::FetchError;
use crate::source::BoxFuture;
use crate::tile::TileRange;

/// Dataset-wide facts delivered before a loader becomes ready.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DatasetMetadata {
    /// Length of the contig in bases, when known. Tiles are never created at
    /// or beyond it.
    pub extent: Option<u64>,
    /// Multiplier mapping normalized signal values back to data units.
    pub scale_factor: f32,
}

impl Default for DatasetMetadata {
    fn default() -> Self {
        Self {
            extent: None,
            scale_factor: 1.0,
        }
    }
}

/// Produces tile payloads for one dataset.
///
/// Implementations must be cheap to share: the loader wraps the fetcher in an
/// `Arc` and moves a clone into each spawned fetch.
pub trait PayloadFetcher: Send + Sync + 'static {
    type Payload: Send + Sync + 'static;

    /// Loads the payload covering `range`.
    fn fetch(&self, range: TileRange) -> BoxFuture<'_, Result<Self::Payload, FetchError>>;

    /// Loads dataset metadata. The loader is not ready until this resolves.
    fn load_metadata(&self) -> BoxFuture<'_, Result<DatasetMetadata, FetchError>> {
        Box::pin(async { Ok(DatasetMetadata::default()) })
    }
}

/// Point readings from a payload, for axis-pointer display.
pub trait SampleReading {
    /// Value at `fraction` (0..1) across the tile, or `None` if no sample
    /// covers that position.
    fn reading(&self, fraction: f64) -> Option<f32>;
}

/// Index of the sample under `fraction` in a row of `len` samples.
pub(crate) fn sample_index(fraction: f64, len: usize) -> Option<usize> {
    if len == 0 || !fraction.is_finite() || !(0.0..1.0).contains(&fraction) {
        return None;
    }
    Some(((fraction * len as f64).floor() as usize).min(len - 1))
}
