//! Sequence payloads.

use std::sync::Arc;

use tracing::debug;

use super::PayloadFetcher;
use crate::error::FetchError;
use crate::source::{BoxFuture, DataSource};
use crate::tile::TileRange;

/// Sequence bytes of one tile.
///
/// At level 0 these are bases; at coarser levels the encoding is whatever the
/// data source summarizes the interval as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequencePayload {
    pub bases: Vec<u8>,
    pub level: u8,
}

/// Fetches sequence tiles from a data source.
pub struct SequenceFetcher {
    source: Arc<dyn DataSource>,
    contig: String,
}

impl SequenceFetcher {
    pub fn new(source: Arc<dyn DataSource>, contig: impl Into<String>) -> Self {
        Self {
            source,
            contig: contig.into(),
        }
    }
}

impl PayloadFetcher for SequenceFetcher {
    type Payload = SequencePayload;

    fn fetch(&self, range: TileRange) -> BoxFuture<'_, Result<SequencePayload, FetchError>> {
        Box::pin(async move {
            debug!(
                contig = %self.contig,
                level = range.level(),
                start = range.start(),
                "Loading sequence tile"
            );
            let bases = self
                .source
                .load_sequence(&self.contig, range.start(), range.span(), range.level())
                .await?;
            Ok(SequencePayload {
                bases,
                level: range.level(),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::TileKey;

    struct Acgt;

    impl DataSource for Acgt {
        fn load_sequence<'a>(
            &'a self,
            _contig: &'a str,
            start: u64,
            span: u64,
            _level: u8,
        ) -> BoxFuture<'a, Result<Vec<u8>, FetchError>> {
            let bases = (start..start + span)
                .map(|i| b"ACGT"[(i % 4) as usize])
                .collect();
            Box::pin(async move { Ok(bases) })
        }
    }

    #[tokio::test]
    async fn test_fetch_sequence() {
        let fetcher = SequenceFetcher::new(Arc::new(Acgt), "chrM");
        let payload = fetcher
            .fetch(TileRange::new(TileKey::new(0, 8), 4))
            .await
            .unwrap();
        assert_eq!(payload.bases, b"ACGT".to_vec());
        assert_eq!(payload.level, 0);
    }
}
