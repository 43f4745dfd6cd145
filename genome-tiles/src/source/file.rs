//! Path-addressed tile files.
//!
//! File-backed annotation datasets are directories of pre-cut JSON tiles:
//!
//! ```text
//! {base}/{contig}/{start},{span}.json          detail tiles
//! {base}/{contig}-macro/{start},{span}.json    macro tiles
//! ```
//!
//! Each file holds a flat feature list (see
//! [`decode_flat_features`](crate::annotation::decode_flat_features)).

use std::sync::Arc;

use tracing::debug;

use super::http::AsyncHttpClient;
use crate::annotation::{decode_flat_features, GenomeFeature};
use crate::error::FetchError;

/// URL of one tile file.
pub fn tile_url(base: &str, contig: &str, start: u64, span: u64, macro_tile: bool) -> String {
    format!(
        "{}/{}{}/{},{}.json",
        base.trim_end_matches('/'),
        contig,
        if macro_tile { "-macro" } else { "" },
        start,
        span
    )
}

/// Fetches flat-feature tile files over HTTP.
#[derive(Clone)]
pub struct FileTileSource {
    client: Arc<dyn AsyncHttpClient>,
    base_path: String,
}

impl FileTileSource {
    pub fn new(client: Arc<dyn AsyncHttpClient>, base_path: impl Into<String>) -> Self {
        Self {
            client,
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Loads one tile file.
    ///
    /// A status outside [200, 300) fails with [`FetchError::Http`].
    pub async fn load_features(
        &self,
        contig: &str,
        start: u64,
        span: u64,
        macro_tile: bool,
    ) -> Result<Vec<GenomeFeature>, FetchError> {
        let url = tile_url(&self.base_path, contig, start, span, macro_tile);
        debug!(url = %url, "Fetching tile file");

        let response = self.client.get(&url).await?;
        if !response.is_success() {
            return Err(FetchError::Http {
                status: response.status,
                status_text: response.status_text,
            });
        }
        decode_flat_features(&response.body)
    }
}
