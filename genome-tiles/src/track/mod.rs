//! Per-track display driving.
//!
//! A track turns the loader's tiles into render objects once per frame. The
//! track itself is not a type hierarchy: [`TrackDriver`] is parameterized by
//! the payload fetcher of its loader and by a [`RenderFactory`] that knows
//! how to draw that payload.

mod driver;
mod session;

pub use driver::{DisplayFrame, NodeContent, Placement, TileNode, TrackDriver};
pub use session::{AxisPointer, AxisPointerStyle, DisplaySession};

pub use crate::payload::SampleReading;

use std::sync::Arc;

use crate::tile::Tile;

/// Creates and releases render objects for complete tiles.
pub trait RenderFactory<P> {
    type Object;

    /// Builds the render object for a complete tile.
    fn create(&mut self, tile: &Tile<P>, payload: &Arc<P>) -> Self::Object;

    /// Releases a render object evicted from the track's cache.
    fn release(&mut self, object: Self::Object) {
        drop(object);
    }
}
