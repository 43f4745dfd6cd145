//! Reconstruction of nested genes from a flat feature list.
//!
//! Structural problems never reject a tile. They are collected as
//! [`NestingWarning`]s, logged, and processing continues: transcripts with no
//! gene and components with no transcript are skipped.

use std::fmt;

use tracing::warn;

use super::types::{
    FeatureType, GeneInfo, GenomeFeature, TranscriptComponentClass, TranscriptComponentInfo,
    TranscriptInfo,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Gene {
    pub info: GeneInfo,
    pub transcripts: Vec<Transcript>,
}

/// A transcript with its components bucketed by class.
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    pub info: TranscriptInfo,
    pub exon: Vec<TranscriptComponentInfo>,
    pub cds: Vec<TranscriptComponentInfo>,
    pub utr: Vec<TranscriptComponentInfo>,
    pub other: Vec<TranscriptComponentInfo>,
}

impl Transcript {
    fn new(info: TranscriptInfo) -> Self {
        Self {
            info,
            exon: Vec::new(),
            cds: Vec::new(),
            utr: Vec::new(),
            other: Vec::new(),
        }
    }

    pub fn component_count(&self) -> usize {
        self.exon.len() + self.cds.len() + self.utr.len() + self.other.len()
    }
}

/// A non-fatal structural problem in a flat feature list.
#[derive(Debug, Clone, PartialEq)]
pub enum NestingWarning {
    /// A feature is nested more than one level deeper than its predecessor.
    InvalidNesting {
        index: usize,
        from: Option<FeatureType>,
        to: FeatureType,
    },
    /// A transcript arrived before any gene.
    OrphanTranscript { index: usize },
    /// A component arrived with no open transcript.
    OrphanComponent { index: usize },
    /// A coding-sequence component is not after the previous one.
    CdsOutOfOrder {
        index: usize,
        previous_start: u64,
        start: u64,
    },
}

impl fmt::Display for NestingWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NestingWarning::InvalidNesting { index, from, to } => match from {
                Some(from) => write!(
                    f,
                    "Invalid gene feature nesting at {}: {:?} -> {:?}",
                    index, from, to
                ),
                None => write!(f, "Invalid gene feature nesting at {}: start -> {:?}", index, to),
            },
            NestingWarning::OrphanTranscript { index } => {
                write!(f, "Out of order Transcript at {}: no parent gene found", index)
            }
            NestingWarning::OrphanComponent { index } => write!(
                f,
                "Out of order TranscriptComponent at {}: no parent transcript found",
                index
            ),
            NestingWarning::CdsOutOfOrder {
                index,
                previous_start,
                start,
            } => write!(
                f,
                "Out of order CDS at {}: start {} follows {}; protein coding components must be sorted by start",
                index, start, previous_start
            ),
        }
    }
}

/// Nested genes plus any warnings raised while building them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Reconstruction {
    pub genes: Vec<Gene>,
    pub warnings: Vec<NestingWarning>,
}

impl Reconstruction {
    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    pub fn transcript_count(&self) -> usize {
        self.genes.iter().map(|gene| gene.transcripts.len()).sum()
    }
}

/// Builds the gene → transcript → component tree from flat features.
pub fn reconstruct(features: &[GenomeFeature]) -> Reconstruction {
    let mut out = Reconstruction::default();
    let mut last_type: Option<FeatureType> = None;
    // Index of the open transcript within the last gene
    let mut open_transcript: Option<usize> = None;

    for (index, feature) in features.iter().enumerate() {
        let feature_type = feature.feature_type();
        let previous_depth = last_type.map(FeatureType::depth).unwrap_or(-1);
        if feature_type.depth() - previous_depth > 1 {
            record(
                &mut out.warnings,
                NestingWarning::InvalidNesting {
                    index,
                    from: last_type,
                    to: feature_type,
                },
            );
        }
        last_type = Some(feature_type);

        match feature {
            GenomeFeature::Gene(info) => {
                out.genes.push(Gene {
                    info: info.clone(),
                    transcripts: Vec::new(),
                });
                open_transcript = None;
            }
            GenomeFeature::Transcript(info) => {
                let Some(gene) = out.genes.last_mut() else {
                    record(&mut out.warnings, NestingWarning::OrphanTranscript { index });
                    continue;
                };
                gene.transcripts.push(Transcript::new(info.clone()));
                open_transcript = Some(gene.transcripts.len() - 1);
            }
            GenomeFeature::Component(component) => {
                let transcript = open_transcript
                    .and_then(|t| out.genes.last_mut().map(|gene| &mut gene.transcripts[t]));
                let Some(transcript) = transcript else {
                    record(&mut out.warnings, NestingWarning::OrphanComponent { index });
                    continue;
                };

                match component.class {
                    TranscriptComponentClass::Exon => transcript.exon.push(component.clone()),
                    TranscriptComponentClass::ProteinCodingSequence => {
                        if let Some(previous) = transcript.cds.last() {
                            if previous.start_index >= component.start_index {
                                let warning = NestingWarning::CdsOutOfOrder {
                                    index,
                                    previous_start: previous.start_index,
                                    start: component.start_index,
                                };
                                record(&mut out.warnings, warning);
                            }
                        }
                        transcript.cds.push(component.clone());
                    }
                    TranscriptComponentClass::Untranslated => {
                        transcript.utr.push(component.clone())
                    }
                    TranscriptComponentClass::Other(_) => transcript.other.push(component.clone()),
                }
            }
        }
    }

    out
}

fn record(warnings: &mut Vec<NestingWarning>, warning: NestingWarning) {
    warn!("{}", warning);
    warnings.push(warning);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::types::Strand;

    fn gene(start: u64) -> GenomeFeature {
        GenomeFeature::Gene(GeneInfo {
            name: Some(format!("gene-{}", start)),
            start_index: start,
            length: 1000,
            strand: Strand::Positive,
            class: None,
        })
    }

    fn transcript(start: u64) -> GenomeFeature {
        GenomeFeature::Transcript(TranscriptInfo {
            name: None,
            start_index: start,
            length: 1000,
            class: None,
        })
    }

    fn component(class: TranscriptComponentClass, start: u64) -> GenomeFeature {
        GenomeFeature::Component(TranscriptComponentInfo {
            start_index: start,
            length: 10,
            class,
            phase: None,
        })
    }

    fn cds(start: u64) -> GenomeFeature {
        component(TranscriptComponentClass::ProteinCodingSequence, start)
    }

    #[test]
    fn test_out_of_order_cds_is_kept_with_one_warning() {
        let features = vec![gene(0), transcript(0), cds(100), cds(50)];
        let result = reconstruct(&features);

        assert_eq!(result.genes.len(), 1);
        assert_eq!(result.genes[0].transcripts.len(), 1);
        assert_eq!(result.genes[0].transcripts[0].cds.len(), 2);
        assert_eq!(
            result.warnings,
            vec![NestingWarning::CdsOutOfOrder {
                index: 3,
                previous_start: 100,
                start: 50,
            }]
        );
    }

    #[test]
    fn test_equal_cds_start_is_out_of_order() {
        let features = vec![gene(0), transcript(0), cds(100), cds(100)];
        let result = reconstruct(&features);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_components_bucketed_by_class() {
        let features = vec![
            gene(0),
            transcript(0),
            component(TranscriptComponentClass::Exon, 0),
            component(TranscriptComponentClass::Untranslated, 0),
            cds(20),
            cds(40),
            component(TranscriptComponentClass::Other(9), 60),
            component(TranscriptComponentClass::Exon, 80),
        ];
        let result = reconstruct(&features);
        let t = &result.genes[0].transcripts[0];

        assert!(result.warnings.is_empty());
        assert_eq!(t.exon.len(), 2);
        assert_eq!(t.utr.len(), 1);
        assert_eq!(t.cds.len(), 2);
        assert_eq!(t.other.len(), 1);
        assert_eq!(t.component_count(), 6);
    }

    #[test]
    fn test_multiple_genes_and_transcripts() {
        let features = vec![
            gene(0),
            transcript(0),
            cds(10),
            transcript(5),
            cds(15),
            gene(2000),
            transcript(2000),
        ];
        let result = reconstruct(&features);

        assert!(result.warnings.is_empty());
        assert_eq!(result.genes.len(), 2);
        assert_eq!(result.genes[0].transcripts.len(), 2);
        assert_eq!(result.genes[1].transcripts.len(), 1);
        assert_eq!(result.transcript_count(), 3);
    }

    #[test]
    fn test_nesting_jump_warns_but_continues() {
        // Gene directly followed by a component skips the transcript level
        let features = vec![gene(0), cds(10), transcript(0), cds(20)];
        let result = reconstruct(&features);

        assert!(result.warnings.contains(&NestingWarning::InvalidNesting {
            index: 1,
            from: Some(FeatureType::Gene),
            to: FeatureType::TranscriptComponent,
        }));
        assert!(result
            .warnings
            .contains(&NestingWarning::OrphanComponent { index: 1 }));
        assert_eq!(result.genes[0].transcripts[0].cds.len(), 1);
    }

    #[test]
    fn test_leading_transcript_is_orphaned() {
        let features = vec![transcript(0), gene(10), transcript(10)];
        let result = reconstruct(&features);

        assert!(result
            .warnings
            .contains(&NestingWarning::OrphanTranscript { index: 0 }));
        assert!(result.warnings.contains(&NestingWarning::InvalidNesting {
            index: 0,
            from: None,
            to: FeatureType::Transcript,
        }));
        assert_eq!(result.genes.len(), 1);
        assert_eq!(result.genes[0].transcripts.len(), 1);
    }

    #[test]
    fn test_new_gene_closes_open_transcript() {
        let features = vec![gene(0), transcript(0), gene(100), cds(110)];
        let result = reconstruct(&features);

        assert_eq!(result.genes[0].transcripts[0].cds.len(), 0);
        assert!(result
            .warnings
            .contains(&NestingWarning::OrphanComponent { index: 3 }));
    }

    #[test]
    fn test_empty_input() {
        let result = reconstruct(&[]);
        assert!(result.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_warning_display() {
        let warning = NestingWarning::CdsOutOfOrder {
            index: 3,
            previous_start: 100,
            start: 50,
        };
        assert!(warning.to_string().starts_with("Out of order CDS"));
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        /// Per gene, per transcript: (exons, cds, utrs).
        fn layout() -> impl Strategy<Value = Vec<Vec<(usize, usize, usize)>>> {
            prop::collection::vec(
                prop::collection::vec((0usize..4, 0usize..4, 0usize..3), 0..4),
                0..6,
            )
        }

        fn flatten(layout: &[Vec<(usize, usize, usize)>]) -> Vec<GenomeFeature> {
            let mut features = Vec::new();
            for (g, transcripts) in layout.iter().enumerate() {
                let base = g as u64 * 10_000;
                features.push(gene(base));
                for (exons, cds_count, utrs) in transcripts {
                    features.push(transcript(base));
                    for i in 0..*exons {
                        features.push(component(TranscriptComponentClass::Exon, base + i as u64 * 100));
                    }
                    for i in 0..*cds_count {
                        features.push(cds(base + i as u64 * 100));
                    }
                    for i in 0..*utrs {
                        features.push(component(TranscriptComponentClass::Untranslated, base + i as u64 * 100));
                    }
                }
            }
            features
        }

        proptest! {
            #[test]
            fn test_well_formed_input_nests_without_warnings(layout in layout()) {
                let result = reconstruct(&flatten(&layout));

                prop_assert!(result.warnings.is_empty(), "unexpected warnings: {:?}", result.warnings);
                prop_assert_eq!(result.genes.len(), layout.len());
                for (gene, transcripts) in result.genes.iter().zip(layout.iter()) {
                    prop_assert_eq!(gene.transcripts.len(), transcripts.len());
                    for (transcript, (exons, cds_count, utrs)) in gene.transcripts.iter().zip(transcripts.iter()) {
                        prop_assert_eq!(transcript.exon.len(), *exons);
                        prop_assert_eq!(transcript.cds.len(), *cds_count);
                        prop_assert_eq!(transcript.utr.len(), *utrs);
                    }
                }
            }

            #[test]
            fn test_no_component_is_lost_after_a_gene(layout in layout(), shuffle in any::<u64>()) {
                // a reversed suffix breaks nesting; each component is placed or reported
                let mut features = flatten(&layout);
                let total = features.len();
                if total > 0 {
                    let pivot = (shuffle as usize) % total;
                    features[pivot..].reverse();
                }
                let result = reconstruct(&features);
                let placed: usize = result
                    .genes
                    .iter()
                    .flat_map(|gene| gene.transcripts.iter())
                    .map(Transcript::component_count)
                    .sum();
                let orphans = result
                    .warnings
                    .iter()
                    .filter(|w| matches!(w, NestingWarning::OrphanComponent { .. }))
                    .count();
                let components = features
                    .iter()
                    .filter(|f| matches!(f, GenomeFeature::Component(_)))
                    .count();
                prop_assert_eq!(placed + orphans, components);
            }
        }
    }
}
