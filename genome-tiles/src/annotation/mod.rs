//! Annotation tile payloads.
//!
//! Decoding of flat, type-tagged feature lists and their reconstruction into
//! nested gene models.

mod nesting;
mod types;

pub use nesting::{reconstruct, Gene, NestingWarning, Reconstruction, Transcript};
pub use types::{
    decode_flat_features, FeatureType, GeneInfo, GenomeFeature, Strand,
    TranscriptComponentClass, TranscriptComponentInfo, TranscriptInfo,
};
