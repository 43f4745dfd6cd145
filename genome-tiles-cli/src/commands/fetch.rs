//! `fetch`: load one annotation tile over the path-addressed file protocol.

use std::sync::Arc;

use clap::Args;
use genome_tiles::annotation::reconstruct;
use genome_tiles::config::ConfigFile;
use genome_tiles::source::{tile_url, FileTileSource, ReqwestClient};
use tracing::{info, warn};

use super::common::print_reconstruction;
use crate::error::CliError;

#[derive(Debug, Args)]
pub struct FetchArgs {
    /// Dataset directory or URL ending in .vgenes-dir
    #[arg(long)]
    pub base_url: String,

    /// Contig name, e.g. chr1
    #[arg(long)]
    pub contig: String,

    /// First base of the tile
    #[arg(long)]
    pub start: u64,

    /// Span of the tile in bases
    #[arg(long)]
    pub span: u64,

    /// Request the macro representation
    #[arg(long = "macro")]
    pub macro_tile: bool,
}

pub async fn run(config: &ConfigFile, args: &FetchArgs) -> Result<(), CliError> {
    if args.span == 0 || args.start % args.span != 0 {
        warn!(
            start = args.start,
            span = args.span,
            "Tile start is not aligned to its span"
        );
    }

    let url = tile_url(
        &args.base_url,
        &args.contig,
        args.start,
        args.span,
        args.macro_tile,
    );
    info!(url = %url, "Fetching annotation tile");
    println!("GET {}", url);

    let client = ReqwestClient::with_timeout(config.http.timeout)?;
    let source = FileTileSource::new(Arc::new(client), args.base_url.as_str());
    let features = source
        .load_features(&args.contig, args.start, args.span, args.macro_tile)
        .await?;

    println!("{} flat feature(s)", features.len());
    print_reconstruction(&reconstruct(&features));
    Ok(())
}
