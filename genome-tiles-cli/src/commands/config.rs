//! Configuration CLI commands.
//!
//! Provides `config show`, `config path` and `config init`.

use std::path::Path;

use clap::Subcommand;
use genome_tiles::config::ConfigFile;

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,

    /// Show the configuration file path
    Path,

    /// Write a configuration file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands, path: &Path) -> Result<(), CliError> {
    match command {
        ConfigCommands::Show => {
            let config = ConfigFile::load_from(path)?;
            print!("{}", config.to_config_string());
            Ok(())
        }
        ConfigCommands::Path => {
            println!("{}", path.display());
            Ok(())
        }
        ConfigCommands::Init { force } => run_init(path, force),
    }
}

fn run_init(path: &Path, force: bool) -> Result<(), CliError> {
    if path.exists() && !force {
        println!(
            "Configuration already exists at {} (use --force to overwrite)",
            path.display()
        );
        return Ok(());
    }

    ConfigFile::default().save_to(path)?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_writes_defaults_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.ini");

        run_init(&path, false).unwrap();
        assert_eq!(ConfigFile::load_from(&path).unwrap(), ConfigFile::default());

        std::fs::write(&path, "[cache]\nmax_idle_frames = 7\n").unwrap();
        run_init(&path, false).unwrap();
        assert_eq!(
            ConfigFile::load_from(&path).unwrap().cache.max_idle_frames,
            7
        );

        run_init(&path, true).unwrap();
        assert_eq!(ConfigFile::load_from(&path).unwrap(), ConfigFile::default());
    }

    #[test]
    fn test_show_rejects_invalid_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.ini");
        std::fs::write(&path, "[http]\ntimeout = never\n").unwrap();

        assert!(matches!(
            run(ConfigCommands::Show, &path),
            Err(CliError::Config(_))
        ));
    }
}
