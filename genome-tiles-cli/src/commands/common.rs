//! Output helpers shared by subcommands.

use genome_tiles::annotation::{GeneInfo, Reconstruction, Strand};

/// Prints genes, transcripts and component counts, then any warnings.
pub fn print_reconstruction(reconstruction: &Reconstruction) {
    println!(
        "{} gene(s), {} transcript(s)",
        reconstruction.genes.len(),
        reconstruction.transcript_count()
    );

    for gene in &reconstruction.genes {
        println!(
            "  {} {} ({})",
            gene.info.name.as_deref().unwrap_or("<unnamed>"),
            gene_extent(&gene.info),
            strand_symbol(gene.info.strand)
        );
        for transcript in &gene.transcripts {
            println!(
                "    {}: {} exon, {} cds, {} utr, {} other",
                transcript.info.name.as_deref().unwrap_or("<unnamed>"),
                transcript.exon.len(),
                transcript.cds.len(),
                transcript.utr.len(),
                transcript.other.len()
            );
        }
    }

    if !reconstruction.warnings.is_empty() {
        println!();
        println!("{} warning(s):", reconstruction.warnings.len());
        for warning in &reconstruction.warnings {
            println!("  {}", warning);
        }
    }
}

/// `start..end`, with the end pinned at `u64::MAX` for oversized lengths.
fn gene_extent(info: &GeneInfo) -> String {
    format!(
        "{}..{}",
        info.start_index,
        info.start_index.saturating_add(info.length)
    )
}

fn strand_symbol(strand: Strand) -> &'static str {
    match strand {
        Strand::Positive => "+",
        Strand::Negative => "-",
        Strand::Unstranded => ".",
        Strand::Unknown => "?",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gene(start_index: u64, length: u64) -> GeneInfo {
        GeneInfo {
            name: None,
            start_index,
            length,
            strand: Strand::Positive,
            class: None,
        }
    }

    #[test]
    fn test_gene_extent() {
        assert_eq!(gene_extent(&gene(100, 50)), "100..150");
        assert_eq!(
            gene_extent(&gene(u64::MAX - 1, u64::MAX)),
            format!("{}..{}", u64::MAX - 1, u64::MAX)
        );
    }
}
