//! Data source abstraction.
//!
//! Tiles are filled from one of two backings:
//!
//! - a [`DataSource`]: an application-provided service that answers
//!   range queries per contig (annotations, signal, sequence);
//! - a path-addressed file tree served over HTTP, see [`FileTileSource`].
//!
//! Both are asynchronous. Their futures are boxed so the traits stay
//! dyn-compatible (`Arc<dyn DataSource>`).

mod file;
mod http;

use std::future::Future;
use std::pin::Pin;

pub use file::{tile_url, FileTileSource};
pub use http::{AsyncHttpClient, HttpResponse, ReqwestClient, DEFAULT_HTTP_TIMEOUT_SECS};

#[cfg(test)]
pub use http::tests::MockHttpClient;

use crate::annotation::GenomeFeature;
use crate::error::FetchError;
use crate::payload::DatasetMetadata;

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Range-query service backing source-addressed datasets.
///
/// Every method has a default that fails with [`FetchError::Source`], so a
/// source only implements the track kinds it serves.
pub trait DataSource: Send + Sync {
    /// Flat, type-tagged annotation features overlapping `[start, start + span)`.
    ///
    /// `macro_tile` selects the coarse macro representation.
    fn load_annotations<'a>(
        &'a self,
        contig: &'a str,
        start: u64,
        span: u64,
        macro_tile: bool,
    ) -> BoxFuture<'a, Result<Vec<GenomeFeature>, FetchError>> {
        let _ = (start, span, macro_tile);
        unsupported(contig, "annotations")
    }

    /// `samples` normalized signal values summarizing `[start, start + span)`.
    fn load_signal<'a>(
        &'a self,
        contig: &'a str,
        start: u64,
        span: u64,
        level: u8,
        samples: usize,
    ) -> BoxFuture<'a, Result<Vec<f32>, FetchError>> {
        let _ = (start, span, level, samples);
        unsupported(contig, "signal")
    }

    /// Sequence bytes for `[start, start + span)` at `level`.
    fn load_sequence<'a>(
        &'a self,
        contig: &'a str,
        start: u64,
        span: u64,
        level: u8,
    ) -> BoxFuture<'a, Result<Vec<u8>, FetchError>> {
        let _ = (start, span, level);
        unsupported(contig, "sequence")
    }

    /// Dataset-wide signal metadata (extent, scale factor) for a contig.
    fn signal_metadata<'a>(
        &'a self,
        contig: &'a str,
    ) -> BoxFuture<'a, Result<DatasetMetadata, FetchError>> {
        let _ = contig;
        Box::pin(async { Ok(DatasetMetadata::default()) })
    }
}

fn unsupported<'a, T: Send + 'a>(
    contig: &str,
    kind: &'static str,
) -> BoxFuture<'a, Result<T, FetchError>> {
    let message = format!("{} not provided for contig {}", kind, contig);
    Box::pin(async move { Err(FetchError::Source(message)) })
}
