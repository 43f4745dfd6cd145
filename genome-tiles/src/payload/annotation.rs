//! Annotation payloads: nested gene models.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};

use super::PayloadFetcher;
use crate::annotation::{reconstruct, Reconstruction};
use crate::error::FetchError;
use crate::source::{AsyncHttpClient, BoxFuture, DataSource, FileTileSource};
use crate::tile::TileRange;

/// Annotation file format, detected from the dataset path extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationFormat {
    /// `.vgenes-dir`: a directory of flat JSON tiles.
    FlatTiles,
    /// `.bigbed`, `.bbed`, `.bb`: recognized, not decoded.
    BigBed,
    /// Anything else.
    Unsupported,
}

impl AnnotationFormat {
    /// Detects the format from the extension of `path`, case-insensitively.
    pub fn detect(path: &str) -> Self {
        let extension = Path::new(path.trim_end_matches('/'))
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some("vgenes-dir") => AnnotationFormat::FlatTiles,
            Some("bigbed") | Some("bbed") | Some("bb") => AnnotationFormat::BigBed,
            _ => AnnotationFormat::Unsupported,
        }
    }
}

enum Backing {
    Source(Arc<dyn DataSource>),
    Files {
        files: FileTileSource,
        format: AnnotationFormat,
    },
}

/// Fetches annotation tiles and reconstructs them into gene models.
///
/// Tiles at or above the macro level request the coarse macro
/// representation.
pub struct AnnotationFetcher {
    backing: Backing,
    contig: String,
    macro_level: u8,
}

impl AnnotationFetcher {
    /// Annotations answered by a data source.
    pub fn from_source(
        source: Arc<dyn DataSource>,
        contig: impl Into<String>,
        macro_level: u8,
    ) -> Self {
        Self {
            backing: Backing::Source(source),
            contig: contig.into(),
            macro_level,
        }
    }

    /// Annotations read from tile files under `path`.
    ///
    /// Formats other than flat JSON tiles produce empty payloads; this is
    /// logged once here rather than per tile.
    pub fn from_path(
        client: Arc<dyn AsyncHttpClient>,
        path: impl Into<String>,
        contig: impl Into<String>,
        macro_level: u8,
    ) -> Self {
        let path = path.into();
        let format = AnnotationFormat::detect(&path);
        match format {
            AnnotationFormat::FlatTiles => {}
            AnnotationFormat::BigBed => {
                warn!(path = %path, "BigBed annotations are not decoded, tiles will be empty")
            }
            AnnotationFormat::Unsupported => {
                warn!(path = %path, "Unsupported annotation format, tiles will be empty")
            }
        }

        Self {
            backing: Backing::Files {
                files: FileTileSource::new(client, path),
                format,
            },
            contig: contig.into(),
            macro_level,
        }
    }

    pub fn contig(&self) -> &str {
        &self.contig
    }

    pub fn macro_level(&self) -> u8 {
        self.macro_level
    }

    /// Format of a file-backed dataset, `None` for source-backed ones.
    pub fn format(&self) -> Option<AnnotationFormat> {
        match &self.backing {
            Backing::Source(_) => None,
            Backing::Files { format, .. } => Some(*format),
        }
    }

    fn is_macro(&self, range: &TileRange) -> bool {
        range.level() >= self.macro_level
    }
}

impl PayloadFetcher for AnnotationFetcher {
    type Payload = Reconstruction;

    fn fetch(&self, range: TileRange) -> BoxFuture<'_, Result<Reconstruction, FetchError>> {
        let macro_tile = self.is_macro(&range);
        Box::pin(async move {
            debug!(
                contig = %self.contig,
                level = range.level(),
                start = range.start(),
                macro_tile,
                "Loading annotation tile"
            );

            let features = match &self.backing {
                Backing::Source(source) => {
                    source
                        .load_annotations(&self.contig, range.start(), range.span(), macro_tile)
                        .await?
                }
                Backing::Files { files, format } => match format {
                    AnnotationFormat::FlatTiles => {
                        files
                            .load_features(&self.contig, range.start(), range.span(), macro_tile)
                            .await?
                    }
                    AnnotationFormat::BigBed | AnnotationFormat::Unsupported => {
                        return Ok(Reconstruction::default());
                    }
                },
            };

            Ok(reconstruct(&features))
        })
    }
}
