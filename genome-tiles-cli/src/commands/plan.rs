//! `plan`: which levels and tiles a viewport needs.

use clap::{Args, ValueEnum};
use genome_tiles::config::ConfigFile;
use genome_tiles::loader::{tile_keys, LoaderConfig};
use genome_tiles::lod::{display_layers, DisplayLayer, LodConfig};
use genome_tiles::{TileKey, Viewport};

use crate::error::CliError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TrackKind {
    /// Gene annotations (macro crossfade enabled)
    Annotation,
    /// Numeric signal
    Signal,
    /// Sequence
    Sequence,
}

#[derive(Debug, Args)]
pub struct PlanArgs {
    /// First visible base (may be negative)
    #[arg(long, allow_hyphen_values = true)]
    pub start: f64,

    /// End of the visible range, exclusive
    #[arg(long, allow_hyphen_values = true)]
    pub end: f64,

    /// Track width in pixels
    #[arg(long)]
    pub width_px: f64,

    /// Track kind, selecting tile size, macro level and fade settings
    #[arg(long, value_enum, default_value = "annotation")]
    pub kind: TrackKind,

    /// Contig length; tiles at or beyond it are not listed
    #[arg(long)]
    pub extent: Option<u64>,
}

/// One display layer and the tiles it needs.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerPlan {
    pub layer: DisplayLayer,
    pub tiles: Vec<TileKey>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub sampling_density: f64,
    pub lod: f64,
    pub layers: Vec<LayerPlan>,
}

/// Resolves the viewport against the configured pyramid for `args.kind`.
pub fn build_plan(config: &ConfigFile, args: &PlanArgs) -> Result<Plan, CliError> {
    let viewport = Viewport::new(args.start, args.end, args.width_px)?;
    let (loader, lod_config): (LoaderConfig, LodConfig) = match args.kind {
        TrackKind::Annotation => (
            config.annotation.loader_config(),
            config.annotation.lod_config(&config.lod),
        ),
        TrackKind::Signal => (config.signal.loader_config(), config.lod.lod_config()),
        TrackKind::Sequence => (config.sequence.loader_config(), config.lod.lod_config()),
    };

    let lod = lod_config.continuous_lod(&viewport);
    let layers = display_layers(lod, &lod_config, &loader.quantizer)
        .into_iter()
        .map(|layer| LayerPlan {
            layer,
            tiles: tile_keys(
                loader.tile_size,
                loader.quantizer.map_level(layer.level),
                viewport.range(),
                args.extent,
            ),
        })
        .collect();

    Ok(Plan {
        sampling_density: viewport.sampling_density(),
        lod,
        layers,
    })
}

pub fn run(config: &ConfigFile, args: &PlanArgs) -> Result<(), CliError> {
    let plan = build_plan(config, args)?;

    println!("Sampling density: {:.3} bases/px", plan.sampling_density);
    println!("Continuous LOD:   {:.3}", plan.lod);
    println!();

    for layer_plan in &plan.layers {
        println!(
            "Level {} (opacity {:.3}): {} tile(s)",
            layer_plan.layer.level,
            layer_plan.layer.opacity,
            layer_plan.tiles.len()
        );
        for key in &layer_plan.tiles {
            println!("  {}", key);
        }
    }
    Ok(())
}
