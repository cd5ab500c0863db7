use super::{LocusStats, LocusStatsCalculator, RepeatAnalyzer, WeightedPurityCalculator};
use crate::genotype::{GenotyperParams, RepeatFindings};
use crate::graph::{Graph, GraphAlignment, LinearAlignmentParameters};
use crate::locus::Locus;
use crate::reads::{Read, RegionType};
use crate::utils::Result;

const PURITY_CUTOFF: f64 = 0.90;

#[derive(Debug, Clone)]
pub struct LocusFindings {
    pub stats: LocusStats,
    /// Findings of each repeat keyed by variant id, in locus order
    pub findings: Vec<(String, RepeatFindings)>,
}

/// Routes the read pairs of one locus to the analyzers of its repeats
pub struct LocusAnalyzer {
    locus_id: String,
    graph: Graph,
    rare_motif: Option<String>,
    requires_genome_wide_depth: bool,
    purity_calculator: Option<WeightedPurityCalculator>,
    stats_calculator: LocusStatsCalculator,
    repeat_analyzers: Vec<RepeatAnalyzer>,
}

impl LocusAnalyzer {
    pub fn new(locus: &Locus, params: GenotyperParams) -> Self {
        let repeat_nodes = locus.graph.repeat_nodes();
        let repeat_analyzers = repeat_nodes
            .iter()
            .enumerate()
            .map(|(index, &node_id)| {
                let variant_id = match repeat_nodes.len() {
                    1 => locus.id.clone(),
                    _ => format!("{}_{}", locus.id, index + 1),
                };
                RepeatAnalyzer::new(&variant_id, &locus.graph, node_id, params)
            })
            .collect();

        Self {
            locus_id: locus.id.clone(),
            graph: locus.graph.clone(),
            rare_motif: locus.rare_motif.clone(),
            requires_genome_wide_depth: locus.requires_genome_wide_depth(),
            purity_calculator: locus.rare_motif.as_deref().map(WeightedPurityCalculator::new),
            stats_calculator: LocusStatsCalculator::new(&locus.graph, locus.ploidy),
            repeat_analyzers,
        }
    }

    pub fn locus_id(&self) -> &str {
        &self.locus_id
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn process_mates(
        &mut self,
        read: &Read,
        read_alignment: Option<&GraphAlignment>,
        mate: &Read,
        mate_alignment: Option<&GraphAlignment>,
        region_type: RegionType,
    ) -> Result<()> {
        match region_type {
            RegionType::Target => {
                self.process_ontarget_mates(read, read_alignment, mate, mate_alignment)
            }
            RegionType::Offtarget => self.process_offtarget_mates(read, mate),
        }
    }

    fn process_ontarget_mates(
        &mut self,
        read: &Read,
        read_alignment: Option<&GraphAlignment>,
        mate: &Read,
        mate_alignment: Option<&GraphAlignment>,
    ) -> Result<()> {
        let min_score = min_non_repeat_score(read.len());
        if !is_locally_placed_pair(&self.graph, read_alignment, mate_alignment, min_score) {
            if self.rare_motif.is_some() {
                return self.process_offtarget_mates(read, mate);
            }
            return Ok(());
        }

        for alignment in [read_alignment, mate_alignment].into_iter().flatten() {
            self.stats_calculator.inspect(alignment);
        }

        match (read_alignment, mate_alignment) {
            (Some(read_alignment), Some(mate_alignment)) => {
                for analyzer in &mut self.repeat_analyzers {
                    analyzer.process_mates(read, read_alignment, mate, mate_alignment);
                }
            }
            _ => {
                let status = |alignment: Option<&GraphAlignment>| match alignment {
                    Some(_) => "Able",
                    None => "Unable",
                };
                log::debug!(
                    "{} to align {} to {}: {}",
                    status(read_alignment),
                    read.id,
                    self.locus_id,
                    read.bases
                );
                log::debug!(
                    "{} to align {} to {}: {}",
                    status(mate_alignment),
                    mate.id,
                    self.locus_id,
                    mate.bases
                );
            }
        }

        Ok(())
    }

    fn process_offtarget_mates(&mut self, read: &Read, mate: &Read) -> Result<()> {
        let (Some(motif), Some(purity_calculator)) = (&self.rare_motif, &self.purity_calculator)
        else {
            return Err(format!(
                "Cannot process offtarget mates for {} because it has no rare repeat",
                self.locus_id
            ));
        };

        let is_read_inrepeat = purity_calculator.score(&read.bases) >= PURITY_CUTOFF;
        let is_mate_inrepeat = purity_calculator.score(&mate.bases) >= PURITY_CUTOFF;
        if !(is_read_inrepeat && is_mate_inrepeat) {
            return Ok(());
        }

        let mut analyzers = self
            .repeat_analyzers
            .iter_mut()
            .filter(|analyzer| analyzer.motif() == motif);
        match (analyzers.next(), analyzers.next()) {
            (Some(analyzer), None) => {
                log::trace!("{} and {} are an in-repeat pair of {}", read.id, mate.id, self.locus_id);
                analyzer.add_inrepeat_read_pair();
                Ok(())
            }
            _ => Err(format!(
                "Encountered inconsistently-specified locus {}",
                self.locus_id
            )),
        }
    }

    pub fn analyze(&self, genome_wide_depth: Option<f64>) -> LocusFindings {
        let mut stats = self.stats_calculator.estimate();
        if let Some(depth) = genome_wide_depth {
            if self.requires_genome_wide_depth {
                stats.depth = depth;
            }
        }
        log::debug!(
            "{}: mean read length {}, depth {:.2}",
            self.locus_id,
            stats.mean_read_length,
            stats.depth
        );

        let findings = self
            .repeat_analyzers
            .iter()
            .map(|analyzer| (analyzer.variant_id().to_string(), analyzer.analyze(&stats)))
            .collect();

        LocusFindings { stats, findings }
    }
}

/// Score the non-repeat part of an alignment must reach to anchor a read pair
pub fn min_non_repeat_score(read_len: usize) -> i32 {
    let num_matching_bases = ((read_len as f64 / 7.5) as i32).max(10);
    num_matching_bases * LinearAlignmentParameters::default().match_score
}

/// A pair is locally placed when one of its mates aligns well outside the repeats
pub fn is_locally_placed_pair(
    graph: &Graph,
    read_alignment: Option<&GraphAlignment>,
    mate_alignment: Option<&GraphAlignment>,
    min_non_repeat_score: i32,
) -> bool {
    [read_alignment, mate_alignment]
        .into_iter()
        .flatten()
        .any(|alignment| non_repeat_score(graph, alignment) >= min_non_repeat_score)
}

fn non_repeat_score(graph: &Graph, alignment: &GraphAlignment) -> i32 {
    let params = LinearAlignmentParameters::default();
    alignment
        .path()
        .iter()
        .zip(alignment.alignments())
        .filter(|(node_id, _)| !graph.is_repeat_node(**node_id))
        .map(|(_, node_alignment)| node_alignment.score(&params))
        .fold(0, i32::saturating_add)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genotype::FilterFlag;
    use crate::utils::{GenomicRegion, Ploidy};
    use approx::assert_relative_eq;

    const LEFT_FLANK: &str = "ATTCGATTCGATTCG";
    const RIGHT_FLANK: &str = "GTCGATGTCGATGTC";

    fn make_locus(structure: &str, rare_motif: Option<&str>) -> Locus {
        Locus::from_parts(
            "LOC".to_string(),
            GenomicRegion::new("chr1", 100, 130).unwrap(),
            LEFT_FLANK.to_string(),
            RIGHT_FLANK.to_string(),
            structure.to_string(),
            rare_motif.map(|m| m.to_string()),
            Ploidy::Two,
        )
        .unwrap()
    }

    fn spanning_encoding(num_units: usize) -> String {
        format!("3:0[12M]{}2[12M]", "1[3M]".repeat(num_units))
    }

    fn process(
        analyzer: &mut LocusAnalyzer,
        read_aln: Option<&str>,
        mate_aln: Option<&str>,
        region_type: RegionType,
    ) -> Result<()> {
        let decode = |encoding: Option<&str>| {
            encoding.map(|e| GraphAlignment::from_string(e, analyzer.graph()).unwrap())
        };
        let read_alignment = decode(read_aln);
        let mate_alignment = decode(mate_aln);
        let read = Read::new("frag/1", "CAG".repeat(13));
        let mate = Read::new("frag/2", "CAG".repeat(13));
        analyzer.process_mates(
            &read,
            read_alignment.as_ref(),
            &mate,
            mate_alignment.as_ref(),
            region_type,
        )
    }

    #[test]
    fn test_min_non_repeat_score() {
        assert_eq!(min_non_repeat_score(39), 50);
        assert_eq!(min_non_repeat_score(150), 100);
    }

    #[test]
    fn test_locally_placed_pair() {
        let locus = make_locus("(CAG)*", None);
        let anchored = GraphAlignment::from_string(&spanning_encoding(3), &locus.graph).unwrap();
        let inrepeat = GraphAlignment::from_string("0:1[3M]1[3M]1[3M]", &locus.graph).unwrap();

        assert!(is_locally_placed_pair(&locus.graph, Some(&anchored), Some(&inrepeat), 50));
        assert!(is_locally_placed_pair(&locus.graph, None, Some(&anchored), 50));
        assert!(!is_locally_placed_pair(&locus.graph, Some(&inrepeat), Some(&inrepeat), 50));
        assert!(!is_locally_placed_pair(&locus.graph, None, None, 0));
    }

    #[test]
    fn test_ontarget_pairs_reach_repeat_analyzers() {
        let locus = make_locus("(CAG)*", None);
        let mut analyzer = LocusAnalyzer::new(&locus, GenotyperParams::default());
        let spanning = spanning_encoding(5);
        process(&mut analyzer, Some(&spanning), Some(&spanning), RegionType::Target).unwrap();

        let locus_findings = analyzer.analyze(None);
        assert_eq!(locus_findings.stats.mean_read_length, 39);
        assert_relative_eq!(locus_findings.stats.depth, 48.0 / 30.0);

        let (variant_id, findings) = &locus_findings.findings[0];
        assert_eq!(variant_id, "LOC");
        assert_eq!(findings.counts_of_spanning_reads.count_of(5), 2);
        assert!(findings.filter.contains(FilterFlag::LowDepth));
    }

    #[test]
    fn test_pair_with_unaligned_mate_only_feeds_stats() {
        let locus = make_locus("(CAG)*", None);
        let mut analyzer = LocusAnalyzer::new(&locus, GenotyperParams::default());
        process(&mut analyzer, Some(&spanning_encoding(2)), None, RegionType::Target).unwrap();

        let locus_findings = analyzer.analyze(None);
        assert_eq!(locus_findings.stats.mean_read_length, 30);
        assert!(locus_findings.findings[0].1.counts_of_spanning_reads.is_empty());
    }

    #[test]
    fn test_unanchored_pairs_are_skipped_without_rare_repeat() {
        let locus = make_locus("(CAG)*", None);
        let mut analyzer = LocusAnalyzer::new(&locus, GenotyperParams::default());
        let inrepeat = "0:1[3M]1[3M]1[3M]1[3M]";
        process(&mut analyzer, Some(inrepeat), Some(inrepeat), RegionType::Target).unwrap();

        let findings = &analyzer.analyze(None).findings[0].1;
        assert!(findings.counts_of_inrepeat_reads.is_empty());
        assert_eq!(findings.num_inrepeat_read_pairs, 0);

        assert!(process(&mut analyzer, None, None, RegionType::Offtarget).is_err());
    }

    #[test]
    fn test_rare_repeat_counts_inrepeat_pairs() {
        let locus = make_locus("(CAG)*", Some("CAG"));
        let mut analyzer = LocusAnalyzer::new(&locus, GenotyperParams::default());
        process(&mut analyzer, None, None, RegionType::Offtarget).unwrap();
        // Unanchored on-target pairs are treated as off-target
        let inrepeat = "0:1[3M]1[3M]1[3M]1[3M]";
        process(&mut analyzer, Some(inrepeat), Some(inrepeat), RegionType::Target).unwrap();

        let locus_findings = analyzer.analyze(Some(35.0));
        assert_eq!(locus_findings.findings[0].1.num_inrepeat_read_pairs, 2);
        assert_relative_eq!(locus_findings.stats.depth, 35.0);
    }

    #[test]
    fn test_genome_wide_depth_ignored_for_common_repeats() {
        let locus = make_locus("(CAG)*", None);
        let analyzer = LocusAnalyzer::new(&locus, GenotyperParams::default());
        assert_eq!(analyzer.analyze(Some(35.0)).stats.depth, 0.0);
    }

    #[test]
    fn test_variant_ids_of_multi_repeat_locus() {
        let locus = make_locus("(CAG)*CAA(CCG)*", None);
        let analyzer = LocusAnalyzer::new(&locus, GenotyperParams::default());
        let ids: Vec<String> = analyzer
            .analyze(None)
            .findings
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(ids, vec!["LOC_1", "LOC_2"]);
        assert_eq!(analyzer.locus_id(), "LOC");
    }
}
