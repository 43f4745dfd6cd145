//! genome-tiles - Multi-resolution tile engine for genome browsers
//!
//! Splits very large genomic datasets (annotations, numeric signal, sequence)
//! into a tile pyramid, fetches tiles on demand, caches them, and resolves a
//! continuous level of detail into the blended layers a track should draw.
//!
//! # Flow
//!
//! ```text
//! Viewport ─► lod::display_layers ─► TileLoader::get_tiles ─► PayloadFetcher
//!                                          │                        │
//!                                          │        completion (mpsc)
//!                                          ▼                        │
//!                       TrackDriver ◄── tiles ◄── process_completions
//!                            │
//!                            ▼
//!                 UsageCache of render nodes ─► RenderFactory
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use genome_tiles::config::ConfigFile;
//! use genome_tiles::loader::TileLoader;
//! use genome_tiles::payload::AnnotationFetcher;
//! use genome_tiles::source::ReqwestClient;
//!
//! let config = ConfigFile::load()?;
//! let client = Arc::new(ReqwestClient::with_timeout(config.http.timeout)?);
//! let fetcher = AnnotationFetcher::from_path(client, "genes.vgenes-dir", "chr1", 5);
//! let mut loader = TileLoader::new(
//!     config.annotation.loader_config(),
//!     fetcher,
//!     tokio::runtime::Handle::current(),
//! );
//! ```

pub mod annotation;
pub mod arena;
pub mod config;
pub mod error;
pub mod loader;
pub mod lod;
pub mod logging;
pub mod payload;
pub mod registry;
pub mod source;
pub mod tile;
pub mod track;
pub mod usage_cache;
pub mod viewport;

pub use error::{FetchError, ViewportError};
pub use loader::{LoaderConfig, LoaderStats, TileLoader};
pub use tile::{Tile, TileKey, TileRange, TileRef, TileState};
pub use viewport::{Viewport, VisibleRange};
