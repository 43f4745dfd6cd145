//! Validated viewport values.
//!
//! A [`VisibleRange`] is the half-open base-pair interval `[x0, x1)` currently
//! on screen; a [`Viewport`] pairs it with the pixel width it is drawn into.
//! Both are checked on construction so downstream code (tile loaders, the LOD
//! resolver) can assume `x1 > x0` and finite bounds.

use crate::error::ViewportError;

/// Half-open, non-empty range of data coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibleRange {
    start: f64,
    end: f64,
}

impl VisibleRange {
    /// Creates a range, rejecting empty, inverted or non-finite bounds.
    pub fn new(x0: f64, x1: f64) -> Result<Self, ViewportError> {
        if !x0.is_finite() || !x1.is_finite() {
            return Err(ViewportError::NonFinite { x0, x1 });
        }
        if x1 <= x0 {
            return Err(ViewportError::EmptyRange { x0, x1 });
        }
        Ok(Self { start: x0, end: x1 })
    }

    /// Inclusive lower bound.
    pub fn start(&self) -> f64 {
        self.start
    }

    /// Exclusive upper bound.
    pub fn end(&self) -> f64 {
        self.end
    }

    /// Width of the range in data units.
    pub fn span(&self) -> f64 {
        self.end - self.start
    }

    /// Position of `x` relative to this range, where 0 is `start` and 1 is `end`.
    pub fn relative(&self, x: f64) -> f64 {
        (x - self.start) / self.span()
    }
}

/// A visible range drawn into a given number of pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    range: VisibleRange,
    width_px: f64,
}

impl Viewport {
    /// Creates a viewport over `[x0, x1)` rendered `width_px` pixels wide.
    pub fn new(x0: f64, x1: f64, width_px: f64) -> Result<Self, ViewportError> {
        let range = VisibleRange::new(x0, x1)?;
        Self::from_range(range, width_px)
    }

    /// Creates a viewport from an already validated range.
    pub fn from_range(range: VisibleRange, width_px: f64) -> Result<Self, ViewportError> {
        if !width_px.is_finite() || width_px <= 0.0 {
            return Err(ViewportError::InvalidWidth(width_px));
        }
        Ok(Self { range, width_px })
    }

    pub fn range(&self) -> &VisibleRange {
        &self.range
    }

    pub fn width_px(&self) -> f64 {
        self.width_px
    }

    /// Data units represented by one screen pixel.
    pub fn sampling_density(&self) -> f64 {
        crate::lod::sampling_density(self.range.span(), self.width_px)
    }
}
