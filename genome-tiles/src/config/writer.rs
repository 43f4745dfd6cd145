//! INI serialization logic for converting `ConfigFile` → INI string.

use super::settings::ConfigFile;
use crate::lod::LevelMapping;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let level_mapping = match config.annotation.level_mapping {
        LevelMapping::Pyramid => "pyramid",
        LevelMapping::Collapsed => "collapsed",
    };

    format!(
        r#"[annotation]
; Span in bases of a full-detail tile
tile_size = {}
; First level served from macro tiles
macro_level = {}
; LOD where the display starts fading into the macro level, and the width of the fade
macro_fade_threshold = {}
macro_fade_range = {}
; Levels below the macro level:
;   pyramid   - each level is stored separately
;   collapsed - all read full-detail tiles
level_mapping = {}

[signal]
tile_size = {}
macro_level = {}
; Samples stored per tile
row_width = {}

[sequence]
tile_size = {}
macro_level = {}

[lod]
; Data units per pixel at level 0
base_sampling_density = {}
; Blend factors this close to a whole level draw a single level
snap_epsilon = {}

[cache]
; Display frames a tile may go unused before it is evicted
max_idle_frames = {}

[http]
; Request timeout in seconds
timeout = {}
"#,
        config.annotation.tile_size,
        config.annotation.macro_level,
        config.annotation.macro_fade_threshold,
        config.annotation.macro_fade_range,
        level_mapping,
        config.signal.tile_size,
        config.signal.macro_level,
        config.signal.row_width,
        config.sequence.tile_size,
        config.sequence.macro_level,
        config.lod.base_sampling_density,
        config.lod.snap_epsilon,
        config.cache.max_idle_frames,
        config.http.timeout,
    )
}
