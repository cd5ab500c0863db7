use super::{CountTable, RepeatGenotype};
use crate::utils::Ploidy;

/// Probability that a read reports the true number of repeat units
pub const PROP_CORRECT_MOLECULES: f64 = 0.97;

/// Thresholds controlling when a repeat is genotyped and flagged
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenotyperParams {
    pub min_locus_coverage: f64,
    pub min_breakpoint_spanning_reads: u32,
}

impl Default for GenotyperParams {
    fn default() -> Self {
        Self {
            min_locus_coverage: 10.0,
            min_breakpoint_spanning_reads: 5,
        }
    }
}

/// Read evidence accumulated for one repeat, after collapsing
#[derive(Debug, Clone, Copy)]
pub struct RepeatEvidence<'a> {
    pub spanning: &'a CountTable,
    pub flanking: &'a CountTable,
    pub inrepeat: &'a CountTable,
    pub num_inrepeat_read_pairs: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelParams {
    pub haplotype_depth: f64,
    pub ploidy: Ploidy,
    /// Repeat unit length in bases, for models that work in base pairs;
    /// `ReadCountModel` only uses unit counts
    pub unit_len: u32,
    pub max_units_in_read: u32,
    pub prop_correct_molecules: f64,
}

/// Strategy selecting the allele sizes that best explain the read evidence
pub trait GenotypeModel: Send + Sync {
    fn score(
        &self,
        candidate_sizes: &[u32],
        evidence: &RepeatEvidence,
        params: &ModelParams,
    ) -> Option<RepeatGenotype>;
}

pub struct RepeatGenotyper<'a> {
    model: &'a dyn GenotypeModel,
    params: ModelParams,
    evidence: RepeatEvidence<'a>,
}

impl<'a> RepeatGenotyper<'a> {
    pub fn new(
        model: &'a dyn GenotypeModel,
        params: ModelParams,
        evidence: RepeatEvidence<'a>,
    ) -> Self {
        Self {
            model,
            params,
            evidence,
        }
    }

    pub fn genotype_repeat(&self, candidate_sizes: &[u32]) -> Option<RepeatGenotype> {
        self.model
            .score(candidate_sizes, &self.evidence, &self.params)
    }
}

/// Spanning sizes, plus the longest non-spanning size when it exceeds all of them
pub fn generate_candidate_allele_sizes(
    spanning: &CountTable,
    flanking: &CountTable,
    inrepeat: &CountTable,
) -> Vec<u32> {
    let mut candidate_sizes = spanning.elements_with_nonzero_counts();
    let longest_spanning = spanning.max_element().unwrap_or(0);
    let longest_flanking = flanking.max_element().unwrap_or(0);
    let longest_inrepeat = inrepeat.max_element().unwrap_or(0);

    let longest_nonspanning = longest_flanking.max(longest_inrepeat);
    if longest_spanning < longest_nonspanning {
        candidate_sizes.push(longest_nonspanning);
    }

    candidate_sizes
}

/// Largest number of units a single read can cover
pub fn max_units_in_read(mean_read_length: u32, unit_len: u32) -> u32 {
    mean_read_length.div_ceil(unit_len)
}

pub fn haplotype_depth(depth: f64, ploidy: Ploidy) -> f64 {
    match ploidy {
        Ploidy::Two => depth / 2.0,
        Ploidy::One | Ploidy::Zero => depth,
    }
}

pub fn min_breakpoint_spanning_reads(configured: u32, ploidy: Ploidy) -> u32 {
    match ploidy {
        Ploidy::Two => configured,
        Ploidy::One | Ploidy::Zero => configured / 2,
    }
}
