//! Flat annotation feature types.
//!
//! Annotation tiles arrive as a flat list of type-tagged features in
//! depth-first order: a gene, then its transcripts, each followed by its
//! components. The wire form is JSON with camelCase keys:
//!
//! ```json
//! [
//!   { "type": 0, "name": "BRCA2", "startIndex": 32315507, "length": 84193, "strand": "+" },
//!   { "type": 1, "name": "BRCA2-201", "startIndex": 32315507, "length": 84193 },
//!   { "type": 2, "class": 0, "startIndex": 32315507, "length": 160 }
//! ]
//! ```

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::FetchError;

/// Nesting depth tag of a flat feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FeatureType {
    Gene = 0,
    Transcript = 1,
    TranscriptComponent = 2,
}

impl FeatureType {
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(FeatureType::Gene),
            1 => Some(FeatureType::Transcript),
            2 => Some(FeatureType::TranscriptComponent),
            _ => None,
        }
    }

    /// Nesting depth: gene 0, transcript 1, component 2.
    pub fn depth(self) -> i32 {
        self as i32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Strand {
    #[default]
    #[serde(rename = "?")]
    Unknown,
    #[serde(rename = "+")]
    Positive,
    #[serde(rename = "-")]
    Negative,
    #[serde(rename = ".")]
    Unstranded,
}

/// Class of a transcript component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TranscriptComponentClass {
    Exon,
    Untranslated,
    ProteinCodingSequence,
    Other(u8),
}

impl TranscriptComponentClass {
    pub fn from_tag(tag: u8) -> Self {
        match tag {
            0 => TranscriptComponentClass::Exon,
            1 => TranscriptComponentClass::Untranslated,
            2 => TranscriptComponentClass::ProteinCodingSequence,
            other => TranscriptComponentClass::Other(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneInfo {
    pub name: Option<String>,
    pub start_index: u64,
    pub length: u64,
    pub strand: Strand,
    pub class: Option<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptInfo {
    pub name: Option<String>,
    pub start_index: u64,
    pub length: u64,
    pub class: Option<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptComponentInfo {
    pub start_index: u64,
    pub length: u64,
    pub class: TranscriptComponentClass,
    pub phase: Option<u8>,
}

/// One entry of a flat feature list.
#[derive(Debug, Clone, PartialEq)]
pub enum GenomeFeature {
    Gene(GeneInfo),
    Transcript(TranscriptInfo),
    Component(TranscriptComponentInfo),
}

impl GenomeFeature {
    pub fn feature_type(&self) -> FeatureType {
        match self {
            GenomeFeature::Gene(_) => FeatureType::Gene,
            GenomeFeature::Transcript(_) => FeatureType::Transcript,
            GenomeFeature::Component(_) => FeatureType::TranscriptComponent,
        }
    }

    pub fn start_index(&self) -> u64 {
        match self {
            GenomeFeature::Gene(info) => info.start_index,
            GenomeFeature::Transcript(info) => info.start_index,
            GenomeFeature::Component(info) => info.start_index,
        }
    }
}

/// Wire representation of a flat feature.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFeature {
    #[serde(rename = "type")]
    feature_type: u8,
    start_index: u64,
    length: u64,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    strand: Strand,
    #[serde(default)]
    class: Option<u8>,
    #[serde(default)]
    phase: Option<u8>,
}

impl RawFeature {
    fn into_feature(self) -> Option<GenomeFeature> {
        let feature = match FeatureType::from_tag(self.feature_type)? {
            FeatureType::Gene => GenomeFeature::Gene(GeneInfo {
                name: self.name,
                start_index: self.start_index,
                length: self.length,
                strand: self.strand,
                class: self.class,
            }),
            FeatureType::Transcript => GenomeFeature::Transcript(TranscriptInfo {
                name: self.name,
                start_index: self.start_index,
                length: self.length,
                class: self.class,
            }),
            FeatureType::TranscriptComponent => {
                GenomeFeature::Component(TranscriptComponentInfo {
                    start_index: self.start_index,
                    length: self.length,
                    class: TranscriptComponentClass::from_tag(self.class.unwrap_or(u8::MAX)),
                    phase: self.phase,
                })
            }
        };
        Some(feature)
    }
}

/// Decodes a JSON array of flat features.
///
/// Features with an unknown `type` tag are skipped with a warning; anything
/// that is not a well-formed feature array is a decode error.
pub fn decode_flat_features(bytes: &[u8]) -> Result<Vec<GenomeFeature>, FetchError> {
    let raw: Vec<RawFeature> =
        serde_json::from_slice(bytes).map_err(|e| FetchError::Decode(e.to_string()))?;

    let mut features = Vec::with_capacity(raw.len());
    for (index, feature) in raw.into_iter().enumerate() {
        let tag = feature.feature_type;
        match feature.into_feature() {
            Some(feature) => features.push(feature),
            None => warn!(index, tag, "Skipping feature with unknown type tag"),
        }
    }
    Ok(features)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_nested_order() {
        let json = br#"[
            {"type": 0, "name": "BRCA2", "startIndex": 100, "length": 900, "strand": "+"},
            {"type": 1, "name": "BRCA2-201", "startIndex": 100, "length": 900},
            {"type": 2, "class": 0, "startIndex": 100, "length": 50},
            {"type": 2, "class": 2, "startIndex": 120, "length": 30, "phase": 1}
        ]"#;

        let features = decode_flat_features(json).unwrap();
        assert_eq!(features.len(), 4);

        match &features[0] {
            GenomeFeature::Gene(gene) => {
                assert_eq!(gene.name.as_deref(), Some("BRCA2"));
                assert_eq!(gene.strand, Strand::Positive);
                assert_eq!(gene.length, 900);
            }
            other => panic!("expected gene, got {:?}", other),
        }
        match &features[3] {
            GenomeFeature::Component(component) => {
                assert_eq!(
                    component.class,
                    TranscriptComponentClass::ProteinCodingSequence
                );
                assert_eq!(component.phase, Some(1));
            }
            other => panic!("expected component, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_skips_unknown_type() {
        let json = br#"[
            {"type": 0, "startIndex": 0, "length": 10},
            {"type": 7, "startIndex": 0, "length": 10}
        ]"#;
        let features = decode_flat_features(json).unwrap();
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].feature_type(), FeatureType::Gene);
    }

    #[test]
    fn test_decode_rejects_malformed_body() {
        let result = decode_flat_features(b"{\"not\": \"an array\"}");
        assert!(matches!(result, Err(FetchError::Decode(_))));
    }

    #[test]
    fn test_component_without_class_is_other() {
        let json = br#"[{"type": 2, "startIndex": 5, "length": 1}]"#;
        let features = decode_flat_features(json).unwrap();
        match &features[0] {
            GenomeFeature::Component(c) => {
                assert_eq!(c.class, TranscriptComponentClass::Other(u8::MAX))
            }
            other => panic!("expected component, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_strand_defaults_to_unknown() {
        let json = br#"[{"type": 0, "startIndex": 5, "length": 1}]"#;
        let features = decode_flat_features(json).unwrap();
        match &features[0] {
            GenomeFeature::Gene(g) => assert_eq!(g.strand, Strand::Unknown),
            other => panic!("expected gene, got {:?}", other),
        }
    }

    #[test]
    fn test_feature_type_depths() {
        assert_eq!(FeatureType::Gene.depth(), 0);
        assert_eq!(FeatureType::Transcript.depth(), 1);
        assert_eq!(FeatureType::TranscriptComponent.depth(), 2);
        assert_eq!(FeatureType::from_tag(3), None);
    }
}
