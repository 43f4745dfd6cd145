//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use std::str::FromStr;

use ini::{Ini, Properties};

use super::file::ConfigFileError;
use super::settings::ConfigFile;
use crate::lod::LevelMapping;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [annotation] section
    if let Some(section) = ini.section(Some("annotation")) {
        if let Some(v) = positive(section, "annotation", "tile_size")? {
            config.annotation.tile_size = v;
        }
        if let Some(v) = number(section, "annotation", "macro_level", "expected a level from 0 to 63")? {
            config.annotation.macro_level = level(v, "annotation", "macro_level")?;
        }
        if let Some(v) = number::<f64>(section, "annotation", "macro_fade_threshold", "expected a number")? {
            if !v.is_finite() {
                return Err(invalid("annotation", "macro_fade_threshold", &v.to_string(), "must be finite"));
            }
            config.annotation.macro_fade_threshold = v;
        }
        if let Some(v) = number::<f64>(section, "annotation", "macro_fade_range", "expected a number")? {
            if !(v >= 0.0 && v.is_finite()) {
                return Err(invalid("annotation", "macro_fade_range", &v.to_string(), "must be finite and not negative"));
            }
            config.annotation.macro_fade_range = v;
        }
        if let Some(v) = section.get("level_mapping") {
            config.annotation.level_mapping = match v.trim().to_lowercase().as_str() {
                "pyramid" => LevelMapping::Pyramid,
                "collapsed" => LevelMapping::Collapsed,
                _ => {
                    return Err(invalid(
                        "annotation",
                        "level_mapping",
                        v,
                        "must be one of: pyramid, collapsed",
                    ))
                }
            };
        }
    }

    // [signal] section
    if let Some(section) = ini.section(Some("signal")) {
        if let Some(v) = positive(section, "signal", "tile_size")? {
            config.signal.tile_size = v;
        }
        if let Some(v) = number(section, "signal", "macro_level", "expected a level from 0 to 63")? {
            config.signal.macro_level = level(v, "signal", "macro_level")?;
        }
        if let Some(v) = positive(section, "signal", "row_width")? {
            config.signal.row_width = v as usize;
        }
    }

    // [sequence] section
    if let Some(section) = ini.section(Some("sequence")) {
        if let Some(v) = positive(section, "sequence", "tile_size")? {
            config.sequence.tile_size = v;
        }
        if let Some(v) = number(section, "sequence", "macro_level", "expected a level from 0 to 63")? {
            config.sequence.macro_level = level(v, "sequence", "macro_level")?;
        }
    }

    // [lod] section
    if let Some(section) = ini.section(Some("lod")) {
        if let Some(v) = number::<f64>(section, "lod", "base_sampling_density", "expected a number")? {
            if !(v > 0.0 && v.is_finite()) {
                return Err(invalid("lod", "base_sampling_density", &v.to_string(), "must be positive"));
            }
            config.lod.base_sampling_density = v;
        }
        if let Some(v) = number::<f64>(section, "lod", "snap_epsilon", "expected a number")? {
            if !(0.0..0.5).contains(&v) {
                return Err(invalid("lod", "snap_epsilon", &v.to_string(), "must be in [0, 0.5)"));
            }
            config.lod.snap_epsilon = v;
        }
    }

    // [cache] section
    if let Some(section) = ini.section(Some("cache")) {
        if let Some(v) = number(section, "cache", "max_idle_frames", "expected a frame count")? {
            config.cache.max_idle_frames = v;
        }
    }

    // [http] section
    if let Some(section) = ini.section(Some("http")) {
        if let Some(v) = positive(section, "http", "timeout")? {
            config.http.timeout = v;
        }
    }

    Ok(config)
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn number<T: FromStr>(
    section: &Properties,
    name: &str,
    key: &str,
    reason: &str,
) -> Result<Option<T>, ConfigFileError> {
    match section.get(key) {
        None => Ok(None),
        Some(v) => v
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| invalid(name, key, v, reason)),
    }
}

fn positive(section: &Properties, name: &str, key: &str) -> Result<Option<u64>, ConfigFileError> {
    let reason = "expected a positive integer";
    match number::<u64>(section, name, key, reason)? {
        Some(0) => Err(invalid(name, key, "0", reason)),
        other => Ok(other),
    }
}

fn level(value: u64, section: &str, key: &str) -> Result<u8, ConfigFileError> {
    if value > 63 {
        return Err(invalid(section, key, &value.to_string(), "expected a level from 0 to 63"));
    }
    Ok(value as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> Result<ConfigFile, ConfigFileError> {
        let ini = Ini::load_from_str(content).unwrap();
        parse_ini(&ini)
    }

    #[test]
    fn test_partial_config() {
        let config = parse(
            "[annotation]\nmacro_level = 4\nlevel_mapping = Pyramid\n\n[http]\ntimeout = 5\n",
        )
        .unwrap();

        assert_eq!(config.annotation.macro_level, 4);
        assert_eq!(config.annotation.level_mapping, LevelMapping::Pyramid);
        assert_eq!(config.annotation.tile_size, 1 << 20);
        assert_eq!(config.http.timeout, 5);
        assert_eq!(config.signal, Default::default());
    }

    #[test]
    fn test_all_sections() {
        let config = parse(
            r#"
[annotation]
tile_size = 4096
macro_fade_threshold = 6.5
macro_fade_range = 0

[signal]
tile_size = 2048
macro_level = 10
row_width = 512

[sequence]
tile_size = 512
macro_level = 8

[lod]
base_sampling_density = 0.5
snap_epsilon = 0.01

[cache]
max_idle_frames = 0
"#,
        )
        .unwrap();

        assert_eq!(config.annotation.tile_size, 4096);
        assert_eq!(config.annotation.macro_fade_threshold, 6.5);
        assert_eq!(config.annotation.macro_fade_range, 0.0);
        assert_eq!(config.signal.row_width, 512);
        assert_eq!(config.signal.macro_level, 10);
        assert_eq!(config.sequence.tile_size, 512);
        assert_eq!(config.lod.base_sampling_density, 0.5);
        assert_eq!(config.lod.snap_epsilon, 0.01);
        assert_eq!(config.cache.max_idle_frames, 0);
    }

    #[test]
    fn test_zero_tile_size_rejected() {
        let err = parse("[signal]\ntile_size = 0\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigFileError::InvalidValue { ref section, ref key, .. }
                if section == "signal" && key == "tile_size"
        ));
    }

    #[test]
    fn test_level_out_of_range() {
        assert!(parse("[sequence]\nmacro_level = 64\n").is_err());
        assert!(parse("[sequence]\nmacro_level = 63\n").is_ok());
    }

    #[test]
    fn test_unknown_level_mapping() {
        let err = parse("[annotation]\nlevel_mapping = flat\n").unwrap_err();
        assert!(err.to_string().contains("pyramid, collapsed"));
    }

    #[test]
    fn test_lod_bounds() {
        assert!(parse("[lod]\nbase_sampling_density = 0\n").is_err());
        assert!(parse("[lod]\nsnap_epsilon = 0.5\n").is_err());
        assert!(parse("[annotation]\nmacro_fade_range = -1\n").is_err());
    }

    #[test]
    fn test_non_finite_fade_rejected() {
        for value in ["nan", "NaN", "inf", "-inf"] {
            let threshold = format!("[annotation]\nmacro_fade_threshold = {}\n", value);
            assert!(
                matches!(parse(&threshold), Err(ConfigFileError::InvalidValue { ref key, .. }) if key == "macro_fade_threshold"),
                "threshold {} accepted",
                value
            );
            let range = format!("[annotation]\nmacro_fade_range = {}\n", value);
            assert!(parse(&range).is_err(), "range {} accepted", value);
        }
    }
}
