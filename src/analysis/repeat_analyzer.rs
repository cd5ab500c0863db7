use super::{
    is_confident, AlignmentStatsCalculator, AlignmentType, LocusStats, RepeatAlignmentClassifier,
    RepeatAlignmentStats,
};
use crate::genotype::{
    collapse_top_elements, generate_candidate_allele_sizes, haplotype_depth, max_units_in_read,
    min_breakpoint_spanning_reads, CountTable, FilterFlag, GenotypeFilter, GenotypeModel,
    GenotyperParams, ModelParams, ReadCountModel, RepeatEvidence, RepeatFindings,
    RepeatGenotype, RepeatGenotyper, PROP_CORRECT_MOLECULES,
};
use crate::graph::{Graph, GraphAlignment, NodeId};
use crate::reads::Read;
use crate::utils::Ploidy;

/// Collects the evidence for one repeat node of a locus and genotypes it
pub struct RepeatAnalyzer {
    variant_id: String,
    motif: String,
    classifier: RepeatAlignmentClassifier,
    alignment_stats: AlignmentStatsCalculator,
    params: GenotyperParams,
    model: Box<dyn GenotypeModel>,
    counts_of_spanning_reads: CountTable,
    counts_of_flanking_reads: CountTable,
    counts_of_inrepeat_reads: CountTable,
    num_inrepeat_read_pairs: u32,
}

impl RepeatAnalyzer {
    pub fn new(variant_id: &str, graph: &Graph, repeat_node: NodeId, params: GenotyperParams) -> Self {
        Self {
            variant_id: variant_id.to_string(),
            motif: graph.node_seq(repeat_node).to_string(),
            classifier: RepeatAlignmentClassifier::new(graph, repeat_node),
            alignment_stats: AlignmentStatsCalculator::new(repeat_node),
            params,
            model: Box::new(ReadCountModel),
            counts_of_spanning_reads: CountTable::new(),
            counts_of_flanking_reads: CountTable::new(),
            counts_of_inrepeat_reads: CountTable::new(),
            num_inrepeat_read_pairs: 0,
        }
    }

    pub fn with_model(mut self, model: Box<dyn GenotypeModel>) -> Self {
        self.model = model;
        self
    }

    pub fn variant_id(&self) -> &str {
        &self.variant_id
    }

    pub fn motif(&self) -> &str {
        &self.motif
    }

    pub fn repeat_node(&self) -> NodeId {
        self.classifier.repeat_node()
    }

    pub fn process_mates(
        &mut self,
        read: &Read,
        read_alignment: &GraphAlignment,
        mate: &Read,
        mate_alignment: &GraphAlignment,
    ) {
        let read_stats = self.classifier.classify(read_alignment);
        let mate_stats = self.classifier.classify(mate_alignment);
        self.process_alignment(read, read_alignment, &read_stats);
        self.process_alignment(mate, mate_alignment, &mate_stats);
    }

    fn process_alignment(&mut self, read: &Read, alignment: &GraphAlignment, stats: &RepeatAlignmentStats) {
        if !is_confident(self.repeat_node(), alignment, stats) {
            log::debug!(
                "Could not confidently align {} to repeat node {} of {}: {} {}",
                read.id,
                self.repeat_node(),
                self.variant_id,
                alignment,
                read.bases
            );
            return;
        }

        log::trace!(
            "{} is {} for variant {}",
            read.id,
            stats.alignment_type(),
            self.variant_id
        );
        self.alignment_stats.inspect(alignment);

        let num_units = stats.num_repeat_units_overlapped();
        match stats.alignment_type() {
            AlignmentType::SpansRepeat => self.counts_of_spanning_reads.increment_count_of(num_units),
            AlignmentType::FlanksRepeat => self.counts_of_flanking_reads.increment_count_of(num_units),
            AlignmentType::InsideRepeat => self.counts_of_inrepeat_reads.increment_count_of(num_units),
            AlignmentType::OutsideRepeat => {}
        }
    }

    pub fn add_inrepeat_read_pair(&mut self) {
        self.num_inrepeat_read_pairs += 1;
    }

    pub fn analyze(&self, stats: &LocusStats) -> RepeatFindings {
        let (genotype, filter) = match stats.ploidy {
            Ploidy::Zero => (None, GenotypeFilter::new()),
            _ if stats.mean_read_length == 0 || stats.depth < self.params.min_locus_coverage => {
                (None, GenotypeFilter::new() | FilterFlag::LowDepth)
            }
            _ => self.genotype(stats),
        };

        RepeatFindings {
            counts_of_spanning_reads: self.counts_of_spanning_reads.clone(),
            counts_of_flanking_reads: self.counts_of_flanking_reads.clone(),
            counts_of_inrepeat_reads: self.counts_of_inrepeat_reads.clone(),
            num_inrepeat_read_pairs: self.num_inrepeat_read_pairs,
            ploidy: stats.ploidy,
            genotype,
            filter,
        }
    }

    fn genotype(&self, stats: &LocusStats) -> (Option<RepeatGenotype>, GenotypeFilter) {
        let unit_len = self.motif.len() as u32;
        let max_units = max_units_in_read(stats.mean_read_length, unit_len);

        let spanning = collapse_top_elements(&self.counts_of_spanning_reads, max_units);
        let flanking = collapse_top_elements(&self.counts_of_flanking_reads, max_units);
        let inrepeat = collapse_top_elements(&self.counts_of_inrepeat_reads, max_units);

        let candidate_sizes = generate_candidate_allele_sizes(&spanning, &flanking, &inrepeat);
        let min_spanning_reads =
            min_breakpoint_spanning_reads(self.params.min_breakpoint_spanning_reads, stats.ploidy);

        let model_params = ModelParams {
            haplotype_depth: haplotype_depth(stats.depth, stats.ploidy),
            ploidy: stats.ploidy,
            unit_len,
            max_units_in_read: max_units,
            prop_correct_molecules: PROP_CORRECT_MOLECULES,
        };
        let evidence = RepeatEvidence {
            spanning: &spanning,
            flanking: &flanking,
            inrepeat: &inrepeat,
            num_inrepeat_read_pairs: self.num_inrepeat_read_pairs,
        };
        let genotype = RepeatGenotyper::new(self.model.as_ref(), model_params, evidence)
            .genotype_repeat(&candidate_sizes);

        let mut filter = GenotypeFilter::new();
        let breakpoints = self.alignment_stats.stats();
        if breakpoints.num_reads_spanning_left_breakpoint < min_spanning_reads
            || breakpoints.num_reads_spanning_right_breakpoint < min_spanning_reads
        {
            filter |= FilterFlag::LowDepth;
        }

        log::debug!(
            "{}: candidates {:?}, genotype {:?}, filter {}",
            self.variant_id,
            candidate_sizes,
            genotype.as_ref().map(|gt| gt.iter().map(|allele| allele.size).collect::<Vec<_>>()),
            filter
        );

        (genotype, filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genotype::TrSize;
    use std::sync::{Arc, Mutex};

    const LEFT_FLANK: &str = "ATTCGATTCGATTCG";
    const RIGHT_FLANK: &str = "GTCGATGTCGATGTC";

    fn make_graph() -> Graph {
        Graph::from_structure(LEFT_FLANK, "(CAG)*", RIGHT_FLANK).unwrap()
    }

    fn spanning_encoding(num_units: usize) -> String {
        let units = "1[3M]".repeat(num_units);
        format!("3:0[12M]{}2[12M]", units)
    }

    fn process(analyzer: &mut RepeatAnalyzer, graph: &Graph, read_aln: &str, mate_aln: &str) {
        let read_alignment = GraphAlignment::from_string(read_aln, graph).unwrap();
        let mate_alignment = GraphAlignment::from_string(mate_aln, graph).unwrap();
        let read = Read::new("frag/1", "N".repeat(read_alignment.query_len()));
        let mate = Read::new("frag/2", "N".repeat(mate_alignment.query_len()));
        analyzer.process_mates(&read, &read_alignment, &mate, &mate_alignment);
    }

    fn stats(mean_read_length: u32, depth: f64, ploidy: Ploidy) -> LocusStats {
        LocusStats {
            mean_read_length,
            depth,
            ploidy,
        }
    }

    #[test]
    fn test_read_and_mate_are_counted_independently() {
        let graph = make_graph();
        let mut analyzer = RepeatAnalyzer::new("STR", &graph, 1, GenotyperParams::default());
        let spanning = spanning_encoding(5);
        process(&mut analyzer, &graph, &spanning, &spanning);

        let findings = analyzer.analyze(&stats(0, 0.0, Ploidy::Two));
        assert_eq!(findings.counts_of_spanning_reads.count_of(5), 2);
        assert!(findings.counts_of_flanking_reads.is_empty());
        assert!(findings.counts_of_inrepeat_reads.is_empty());
    }

    #[test]
    fn test_alignments_route_to_their_tables() {
        let graph = make_graph();
        let mut analyzer = RepeatAnalyzer::new("STR", &graph, 1, GenotyperParams::default());
        // Flanking with three full units, in-repeat with four
        process(
            &mut analyzer,
            &graph,
            "3:0[12M]1[3M]1[3M]1[3M]1[2M]",
            "0:1[3M]1[3M]1[3M]1[3M]",
        );
        // Spanning with a weak left flank is dropped, outside alignments are ignored
        process(&mut analyzer, &graph, "11:0[4M]1[3M]2[12M]", "0:2[15M]");

        let findings = analyzer.analyze(&stats(0, 0.0, Ploidy::Two));
        assert_eq!(findings.counts_of_flanking_reads.count_of(3), 1);
        assert_eq!(findings.counts_of_inrepeat_reads.count_of(4), 1);
        assert!(findings.counts_of_spanning_reads.is_empty());
    }

    #[test]
    fn test_zero_read_length_is_low_depth() {
        let graph = make_graph();
        let mut analyzer = RepeatAnalyzer::new("STR", &graph, 1, GenotyperParams::default());
        process(&mut analyzer, &graph, &spanning_encoding(7), &spanning_encoding(7));

        let findings = analyzer.analyze(&stats(0, 50.0, Ploidy::Two));
        assert!(findings.genotype.is_none());
        assert!(findings.filter.contains(FilterFlag::LowDepth));
        assert_eq!(findings.counts_of_spanning_reads.count_of(7), 2);
        assert_eq!(findings.ploidy, Ploidy::Two);
    }

    #[test]
    fn test_low_coverage_is_low_depth() {
        let graph = make_graph();
        let analyzer = RepeatAnalyzer::new("STR", &graph, 1, GenotyperParams::default());
        let findings = analyzer.analyze(&stats(150, 9.9, Ploidy::One));
        assert!(findings.genotype.is_none());
        assert_eq!(findings.filter.to_string(), "LowDepth");
    }

    #[test]
    fn test_zero_ploidy_is_not_genotyped() {
        let graph = make_graph();
        let mut analyzer = RepeatAnalyzer::new("STR", &graph, 1, GenotyperParams::default());
        process(&mut analyzer, &graph, &spanning_encoding(4), &spanning_encoding(4));
        let findings = analyzer.analyze(&stats(150, 30.0, Ploidy::Zero));
        assert!(findings.genotype.is_none());
        assert!(findings.filter.is_empty());
        assert_eq!(findings.counts_of_spanning_reads.count_of(4), 2);
    }

    #[test]
    fn test_genotype_with_breakpoint_support() {
        let graph = make_graph();
        let mut analyzer = RepeatAnalyzer::new("STR", &graph, 1, GenotyperParams::default());
        for _ in 0..5 {
            process(&mut analyzer, &graph, &spanning_encoding(6), &spanning_encoding(6));
        }

        let findings = analyzer.analyze(&stats(45, 20.0, Ploidy::Two));
        let genotype = findings.genotype.unwrap();
        assert_eq!(genotype[0], TrSize::new(6, (6, 6)));
        assert_eq!(genotype[1], TrSize::new(6, (6, 6)));
        assert!(findings.filter.is_empty());
    }

    #[test]
    fn test_weak_breakpoint_support_keeps_genotype() {
        let graph = make_graph();
        let mut analyzer = RepeatAnalyzer::new("STR", &graph, 1, GenotyperParams::default());
        process(&mut analyzer, &graph, &spanning_encoding(6), &spanning_encoding(6));

        let findings = analyzer.analyze(&stats(45, 20.0, Ploidy::Two));
        assert!(findings.genotype.is_some());
        assert!(findings.filter.contains(FilterFlag::LowDepth));
    }

    #[test]
    fn test_inrepeat_read_pairs_are_reported() {
        let graph = make_graph();
        let mut analyzer = RepeatAnalyzer::new("STR", &graph, 1, GenotyperParams::default());
        analyzer.add_inrepeat_read_pair();
        analyzer.add_inrepeat_read_pair();
        assert_eq!(analyzer.motif(), "CAG");
        assert_eq!(analyzer.variant_id(), "STR");

        let findings = analyzer.analyze(&stats(150, 30.0, Ploidy::Two));
        assert_eq!(findings.num_inrepeat_read_pairs, 2);
        // Pairs alone give no candidate sizes
        assert!(findings.genotype.is_none());
    }

    struct ShortestCandidate;

    impl GenotypeModel for ShortestCandidate {
        fn score(
            &self,
            candidate_sizes: &[u32],
            _evidence: &RepeatEvidence,
            _params: &ModelParams,
        ) -> Option<RepeatGenotype> {
            let size = *candidate_sizes.iter().min()?;
            let mut genotype = RepeatGenotype::new();
            genotype.push(TrSize::new(size, (size, size)));
            Some(genotype)
        }
    }

    #[test]
    fn test_custom_model_receives_candidates() {
        let graph = make_graph();
        let mut analyzer = RepeatAnalyzer::new("STR", &graph, 1, GenotyperParams::default())
            .with_model(Box::new(ShortestCandidate));
        process(&mut analyzer, &graph, &spanning_encoding(8), &spanning_encoding(3));

        let findings = analyzer.analyze(&stats(45, 20.0, Ploidy::Two));
        assert_eq!(findings.genotype.unwrap()[0].size, 3);
    }

    #[derive(Debug, Default)]
    struct ModelInputs {
        candidate_sizes: Vec<u32>,
        spanning: CountTable,
        flanking: CountTable,
        inrepeat: CountTable,
        params: Option<ModelParams>,
    }

    /// Keeps what the analyzer hands to the model
    struct RecordingModel(Arc<Mutex<ModelInputs>>);

    impl GenotypeModel for RecordingModel {
        fn score(
            &self,
            candidate_sizes: &[u32],
            evidence: &RepeatEvidence,
            params: &ModelParams,
        ) -> Option<RepeatGenotype> {
            let mut inputs = self.0.lock().unwrap();
            inputs.candidate_sizes = candidate_sizes.to_vec();
            inputs.spanning = evidence.spanning.clone();
            inputs.flanking = evidence.flanking.clone();
            inputs.inrepeat = evidence.inrepeat.clone();
            inputs.params = Some(*params);
            None
        }
    }

    #[test]
    fn test_counts_above_read_length_are_collapsed_for_the_model_only() {
        let graph = make_graph();
        let inputs = Arc::new(Mutex::new(ModelInputs::default()));
        let mut analyzer = RepeatAnalyzer::new("STR", &graph, 1, GenotyperParams::default())
            .with_model(Box::new(RecordingModel(Arc::clone(&inputs))));
        process(&mut analyzer, &graph, &spanning_encoding(3), &spanning_encoding(3));
        // Flanking read with five units and in-repeat read with six
        process(
            &mut analyzer,
            &graph,
            &format!("3:0[12M]{}", "1[3M]".repeat(5)),
            &format!("0:{}", "1[3M]".repeat(6)),
        );

        // 12bp reads hold at most four CAG units
        let findings = analyzer.analyze(&stats(12, 20.0, Ploidy::Two));

        let inputs = inputs.lock().unwrap();
        assert_eq!(inputs.candidate_sizes, vec![3, 4]);
        assert_eq!(inputs.spanning, [(3, 2)].into_iter().collect::<CountTable>());
        assert_eq!(inputs.flanking, [(4, 1)].into_iter().collect::<CountTable>());
        assert_eq!(inputs.inrepeat, [(4, 1)].into_iter().collect::<CountTable>());
        let params = inputs.params.unwrap();
        assert_eq!(params.max_units_in_read, 4);
        assert_eq!(params.unit_len, 3);

        assert!(findings.genotype.is_none());
        assert_eq!(findings.counts_of_flanking_reads, [(5, 1)].into_iter().collect::<CountTable>());
        assert_eq!(findings.counts_of_inrepeat_reads, [(6, 1)].into_iter().collect::<CountTable>());
        assert_eq!(findings.counts_of_spanning_reads.count_of(3), 2);
    }

    #[test]
    fn test_expanded_allele_at_tiny_depth() {
        let graph = make_graph();
        let params = GenotyperParams {
            min_locus_coverage: 0.0,
            ..GenotyperParams::default()
        };
        let mut analyzer = RepeatAnalyzer::new("STR", &graph, 1, params);
        let inrepeat = format!("0:{}", "1[3M]".repeat(15));
        process(&mut analyzer, &graph, &inrepeat, &inrepeat);

        let findings = analyzer.analyze(&stats(45, 1e-9, Ploidy::Two));
        let genotype = findings.genotype.unwrap();
        assert_eq!(genotype.len(), 2);
        assert!(genotype.iter().all(|allele| allele.size == u32::MAX));
        assert!(genotype.iter().all(|allele| allele.ci.0 >= 15));
        assert!(findings.filter.contains(FilterFlag::LowDepth));
    }
}
