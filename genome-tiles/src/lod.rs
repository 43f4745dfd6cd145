//! Level-of-detail resolution.
//!
//! Pure functions that turn a zoom state into the pyramid levels a track
//! should display:
//!
//! 1. [`sampling_density`]: data units per screen pixel.
//! 2. [`continuous_lod`]: `log2(density / base)`, clamped at 0. The fractional
//!    part is the progress between two adjacent levels.
//! 3. [`LevelQuantizer::map_level`]: the discrete level actually requested
//!    from a loader. Everything at or above the macro level collapses into
//!    the macro level.
//! 4. [`display_layers`]: the levels to draw and their opacities, blending
//!    adjacent levels so zooming does not pop.
//!
//! # Blending
//!
//! With `low = floor(lod)` and `blend = lod - low`, the pyramid blend draws
//! `map(low)` at `1 - blend` and `map(high)` at `blend`. When both map to the
//! same level, or the blend is within `snap_epsilon` of a level, a single
//! layer is drawn.
//!
//! Datasets with a separate macro representation (annotations) can also
//! crossfade into the macro level over a configured LOD window, see
//! [`MacroFade`]. The opacities of the returned layers always sum to 1.

/// Default data units per pixel at level 0.
pub const DEFAULT_BASE_SAMPLING_DENSITY: f64 = 1.0;

/// Blend factors this close to 0 or 1 draw a single level.
pub const DEFAULT_SNAP_EPSILON: f64 = 1e-3;

/// Highest level a continuous LOD can resolve to.
const MAX_RESOLVED_LEVEL: f64 = (u8::MAX - 1) as f64;

/// Data units represented per pixel.
pub fn sampling_density(span: f64, width_px: f64) -> f64 {
    span / width_px
}

/// Continuous LOD for a sampling density, clamped at 0.
///
/// Non-finite or non-positive inputs resolve to level 0.
pub fn continuous_lod(sampling_density: f64, base_sampling_density: f64) -> f64 {
    let ratio = sampling_density / base_sampling_density;
    if !ratio.is_finite() || ratio <= 0.0 {
        return 0.0;
    }
    ratio.log2().max(0.0)
}

/// How levels below the macro level map onto stored levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LevelMapping {
    /// Every level below the macro level is materialized as itself.
    #[default]
    Pyramid,
    /// Levels below the macro level all read full-detail (level 0) tiles.
    ///
    /// Used for datasets stored only at full detail plus a macro summary.
    Collapsed,
}

/// Maps requested levels to the levels a loader materializes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelQuantizer {
    macro_level: u8,
    mapping: LevelMapping,
}

impl LevelQuantizer {
    pub fn new(macro_level: u8, mapping: LevelMapping) -> Self {
        Self {
            macro_level,
            mapping,
        }
    }

    /// Quantizer with the default pyramid mapping.
    pub fn pyramid(macro_level: u8) -> Self {
        Self::new(macro_level, LevelMapping::Pyramid)
    }

    pub fn macro_level(&self) -> u8 {
        self.macro_level
    }

    pub fn mapping(&self) -> LevelMapping {
        self.mapping
    }

    /// Effective level for a requested level. Monotonic and idempotent.
    pub fn map_level(&self, level: u8) -> u8 {
        if level >= self.macro_level {
            return self.macro_level;
        }
        match self.mapping {
            LevelMapping::Pyramid => level,
            LevelMapping::Collapsed => 0,
        }
    }

    /// True if `level` maps to the macro representation.
    pub fn is_macro(&self, level: u8) -> bool {
        level >= self.macro_level
    }
}

/// Position of a continuous LOD between two adjacent levels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LodBlend {
    pub low: u8,
    pub high: u8,
    /// 0 exactly on `low`, approaching 1 near `high`.
    pub blend_factor: f64,
}

impl LodBlend {
    pub fn from_continuous(lod: f64) -> Self {
        let lod = clamp_lod(lod).min(MAX_RESOLVED_LEVEL);
        let low = lod.floor();
        Self {
            low: low as u8,
            high: low as u8 + 1,
            blend_factor: lod - low,
        }
    }
}

/// Crossfade from detail levels into the macro level.
///
/// Between `threshold` and `threshold + blend_range` the macro layer fades in
/// linearly while the detail layers fade out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacroFade {
    pub threshold: f64,
    pub blend_range: f64,
}

impl MacroFade {
    pub fn new(threshold: f64, blend_range: f64) -> Self {
        Self {
            threshold,
            blend_range,
        }
    }

    /// Opacity of the macro layer at `lod`, in [0, 1].
    ///
    /// A NaN threshold or range never fades in the macro layer.
    pub fn weight(&self, lod: f64) -> f64 {
        if self.blend_range <= 0.0 {
            return if lod >= self.threshold { 1.0 } else { 0.0 };
        }
        let t = (lod - self.threshold) / self.blend_range;
        if t.is_nan() {
            0.0
        } else {
            t.clamp(0.0, 1.0)
        }
    }
}

/// Calibration of the LOD resolver for one track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LodConfig {
    pub base_sampling_density: f64,
    pub snap_epsilon: f64,
    pub macro_fade: Option<MacroFade>,
}

impl LodConfig {
    pub fn with_macro_fade(mut self, fade: MacroFade) -> Self {
        self.macro_fade = Some(fade);
        self
    }

    pub fn with_base_sampling_density(mut self, density: f64) -> Self {
        self.base_sampling_density = density;
        self
    }

    /// Continuous LOD for a viewport.
    pub fn continuous_lod(&self, viewport: &crate::viewport::Viewport) -> f64 {
        continuous_lod(viewport.sampling_density(), self.base_sampling_density)
    }
}

impl Default for LodConfig {
    fn default() -> Self {
        Self {
            base_sampling_density: DEFAULT_BASE_SAMPLING_DENSITY,
            snap_epsilon: DEFAULT_SNAP_EPSILON,
            macro_fade: None,
        }
    }
}

/// One level to draw and its opacity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayLayer {
    pub level: u8,
    pub opacity: f64,
}

/// Levels to display at `lod`, finest first.
pub fn display_layers(lod: f64, config: &LodConfig, quantizer: &LevelQuantizer) -> Vec<DisplayLayer> {
    let lod = clamp_lod(lod);
    let Some(fade) = config.macro_fade else {
        let mut layers = Vec::with_capacity(2);
        pyramid_layers(&mut layers, lod, 1.0, config.snap_epsilon, quantizer);
        return layers;
    };

    let macro_weight = fade.weight(lod);
    let mut layers = Vec::with_capacity(3);
    if macro_weight < 1.0 {
        let detail_cap = (f64::from(quantizer.macro_level()) - 1.0).max(0.0);
        pyramid_layers(
            &mut layers,
            lod.min(detail_cap),
            1.0 - macro_weight,
            config.snap_epsilon,
            quantizer,
        );
    }
    if macro_weight > 0.0 {
        push_layer(&mut layers, quantizer.macro_level(), macro_weight);
    }
    layers
}

fn pyramid_layers(
    layers: &mut Vec<DisplayLayer>,
    lod: f64,
    scale: f64,
    snap_epsilon: f64,
    quantizer: &LevelQuantizer,
) {
    let blend = LodBlend::from_continuous(lod);
    let low = quantizer.map_level(blend.low);
    let high = quantizer.map_level(blend.high);

    if low == high || blend.blend_factor <= snap_epsilon {
        push_layer(layers, low, scale);
    } else if blend.blend_factor >= 1.0 - snap_epsilon {
        push_layer(layers, high, scale);
    } else {
        push_layer(layers, low, scale * (1.0 - blend.blend_factor));
        push_layer(layers, high, scale * blend.blend_factor);
    }
}

fn push_layer(layers: &mut Vec<DisplayLayer>, level: u8, opacity: f64) {
    match layers.iter_mut().find(|layer| layer.level == level) {
        Some(existing) => existing.opacity += opacity,
        None => layers.push(DisplayLayer { level, opacity }),
    }
}

fn clamp_lod(lod: f64) -> f64 {
    if lod.is_nan() {
        0.0
    } else {
        lod.max(0.0)
    }
}
