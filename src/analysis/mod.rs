mod alignment_classifier;
mod alignment_filter;
mod alignment_stats;
mod locus_analyzer;
mod locus_stats;
mod purity;
mod repeat_analyzer;

pub use alignment_classifier::{
    count_full_overlaps, AlignmentType, RepeatAlignmentClassifier, RepeatAlignmentStats,
};
pub use alignment_filter::{
    is_confident, is_downstream_alignment_good, is_upstream_alignment_good,
    passes_alignment_filters, MIN_FLANK_MATCHES,
};
pub use alignment_stats::{AlignmentStatsCalculator, BreakpointStats};
pub use locus_analyzer::{is_locally_placed_pair, min_non_repeat_score, LocusAnalyzer, LocusFindings};
pub use locus_stats::{LocusStats, LocusStatsCalculator};
pub use purity::WeightedPurityCalculator;
pub use repeat_analyzer::RepeatAnalyzer;
