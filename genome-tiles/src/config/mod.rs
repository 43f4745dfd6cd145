//! User configuration.
//!
//! Settings are read from an INI file, `~/.genome-tiles/config.ini` by
//! default. Missing files and missing keys fall back to defaults.

mod file;
mod parser;
mod settings;
mod writer;

pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::*;
