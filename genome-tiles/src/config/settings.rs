//! Configuration settings structs and their defaults.

use crate::loader::LoaderConfig;
use crate::lod::{
    LevelMapping, LevelQuantizer, LodConfig, MacroFade, DEFAULT_BASE_SAMPLING_DENSITY,
    DEFAULT_SNAP_EPSILON,
};

/// Level-0 span of an annotation tile.
pub const DEFAULT_ANNOTATION_TILE_SIZE: u64 = 1 << 20;
/// First annotation level served from macro tiles.
pub const DEFAULT_ANNOTATION_MACRO_LEVEL: u8 = 5;
/// LOD at which annotation tracks start fading into the macro level.
pub const DEFAULT_MACRO_FADE_THRESHOLD: f64 = 7.0;
/// Width, in LOD units, of the macro crossfade.
pub const DEFAULT_MACRO_FADE_RANGE: f64 = 2.0;

pub const DEFAULT_SIGNAL_TILE_SIZE: u64 = 1024;
pub const DEFAULT_SIGNAL_MACRO_LEVEL: u8 = 16;
pub const DEFAULT_SIGNAL_ROW_WIDTH: usize = crate::arena::DEFAULT_ROW_WIDTH;

pub const DEFAULT_SEQUENCE_TILE_SIZE: u64 = 1024;
pub const DEFAULT_SEQUENCE_MACRO_LEVEL: u8 = 12;

/// Frames a tile may go unused before the loader evicts it.
pub const DEFAULT_MAX_IDLE_FRAMES: u64 = 600;

pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = crate::source::DEFAULT_HTTP_TIMEOUT_SECS;

/// `[annotation]`
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationSettings {
    pub tile_size: u64,
    pub macro_level: u8,
    pub macro_fade_threshold: f64,
    pub macro_fade_range: f64,
    pub level_mapping: LevelMapping,
}

impl Default for AnnotationSettings {
    fn default() -> Self {
        Self {
            tile_size: DEFAULT_ANNOTATION_TILE_SIZE,
            macro_level: DEFAULT_ANNOTATION_MACRO_LEVEL,
            macro_fade_threshold: DEFAULT_MACRO_FADE_THRESHOLD,
            macro_fade_range: DEFAULT_MACRO_FADE_RANGE,
            level_mapping: LevelMapping::Collapsed,
        }
    }
}

impl AnnotationSettings {
    pub fn loader_config(&self) -> LoaderConfig {
        LoaderConfig::new(
            self.tile_size,
            LevelQuantizer::new(self.macro_level, self.level_mapping),
        )
    }

    /// LOD settings with the macro crossfade applied.
    pub fn lod_config(&self, lod: &LodSettings) -> LodConfig {
        lod.lod_config()
            .with_macro_fade(MacroFade::new(self.macro_fade_threshold, self.macro_fade_range))
    }
}

/// `[signal]`
#[derive(Debug, Clone, PartialEq)]
pub struct SignalSettings {
    pub tile_size: u64,
    pub macro_level: u8,
    /// Samples stored per tile.
    pub row_width: usize,
}

impl Default for SignalSettings {
    fn default() -> Self {
        Self {
            tile_size: DEFAULT_SIGNAL_TILE_SIZE,
            macro_level: DEFAULT_SIGNAL_MACRO_LEVEL,
            row_width: DEFAULT_SIGNAL_ROW_WIDTH,
        }
    }
}

impl SignalSettings {
    pub fn loader_config(&self) -> LoaderConfig {
        LoaderConfig::new(self.tile_size, LevelQuantizer::pyramid(self.macro_level))
    }
}

/// `[sequence]`
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceSettings {
    pub tile_size: u64,
    pub macro_level: u8,
}

impl Default for SequenceSettings {
    fn default() -> Self {
        Self {
            tile_size: DEFAULT_SEQUENCE_TILE_SIZE,
            macro_level: DEFAULT_SEQUENCE_MACRO_LEVEL,
        }
    }
}

impl SequenceSettings {
    pub fn loader_config(&self) -> LoaderConfig {
        LoaderConfig::new(self.tile_size, LevelQuantizer::pyramid(self.macro_level))
    }
}

/// `[lod]`
#[derive(Debug, Clone, PartialEq)]
pub struct LodSettings {
    pub base_sampling_density: f64,
    pub snap_epsilon: f64,
}

impl Default for LodSettings {
    fn default() -> Self {
        Self {
            base_sampling_density: DEFAULT_BASE_SAMPLING_DENSITY,
            snap_epsilon: DEFAULT_SNAP_EPSILON,
        }
    }
}

impl LodSettings {
    pub fn lod_config(&self) -> LodConfig {
        LodConfig {
            base_sampling_density: self.base_sampling_density,
            snap_epsilon: self.snap_epsilon,
            macro_fade: None,
        }
    }
}

/// `[cache]`
#[derive(Debug, Clone, PartialEq)]
pub struct CacheSettings {
    pub max_idle_frames: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_idle_frames: DEFAULT_MAX_IDLE_FRAMES,
        }
    }
}

/// `[http]`
#[derive(Debug, Clone, PartialEq)]
pub struct HttpSettings {
    /// Request timeout in seconds.
    pub timeout: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

/// Complete configuration file contents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    pub annotation: AnnotationSettings,
    pub signal: SignalSettings,
    pub sequence: SequenceSettings,
    pub lod: LodSettings,
    pub cache: CacheSettings,
    pub http: HttpSettings,
}
