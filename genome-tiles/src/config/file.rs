//! Configuration file handling for ~/.genome-tiles/config.ini.

use std::io;
use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;

use super::settings::ConfigFile;

/// Why a configuration file could not be used.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// The file exists but is not readable INI.
    #[error("cannot read {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: ini::Error,
    },

    /// The file or its directory could not be written.
    #[error("cannot write {}: {source}", path.display())]
    Unwritable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A key holds a value the tile engine cannot use.
    #[error("[{section}] {key} = {value:?}: {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

impl ConfigFile {
    /// Load configuration from the default path (~/.genome-tiles/config.ini).
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from `path`. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        match Ini::load_from_file(path) {
            Ok(ini) => super::parser::parse_ini(&ini),
            Err(ini::Error::Io(error)) if error.kind() == io::ErrorKind::NotFound => {
                Ok(Self::default())
            }
            Err(source) => Err(ConfigFileError::Unreadable {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// The configuration as commented INI text.
    pub fn to_config_string(&self) -> String {
        super::writer::to_config_string(self)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        let unwritable = |source| ConfigFileError::Unwritable {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(unwritable)?;
        }
        std::fs::write(path, self.to_config_string()).map_err(unwritable)
    }
}

/// Get the path to the config directory (~/.genome-tiles).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".genome-tiles")
}

/// Get the path to the config file (~/.genome-tiles/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}
