//! `validate`: check a flat feature file for nesting problems.

use std::path::PathBuf;

use clap::Args;
use genome_tiles::annotation::{decode_flat_features, reconstruct, Reconstruction};

use super::common::print_reconstruction;
use crate::error::CliError;

#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Flat feature JSON file (one tile of a .vgenes-dir)
    pub file: PathBuf,

    /// Fail if any nesting warning is found
    #[arg(long)]
    pub strict: bool,
}

/// Decodes and reconstructs `bytes`; in strict mode warnings are an error.
pub fn validate_bytes(bytes: &[u8], strict: bool) -> Result<Reconstruction, CliError> {
    let features = decode_flat_features(bytes)?;
    let reconstruction = reconstruct(&features);
    if strict && !reconstruction.warnings.is_empty() {
        print_reconstruction(&reconstruction);
        return Err(CliError::NestingWarnings(reconstruction.warnings.len()));
    }
    Ok(reconstruction)
}

pub fn run(args: &ValidateArgs) -> Result<(), CliError> {
    let bytes = std::fs::read(&args.file).map_err(|error| CliError::FileRead {
        path: args.file.display().to_string(),
        error,
    })?;

    let reconstruction = validate_bytes(&bytes, args.strict)?;
    print_reconstruction(&reconstruction);
    Ok(())
}
