mod count_table;
mod findings;
mod genotyper;
mod gt;
mod model;

pub use count_table::{collapse_top_elements, CountTable};
pub use findings::{FilterFlag, GenotypeFilter, RepeatFindings};
pub use genotyper::{
    generate_candidate_allele_sizes, haplotype_depth, max_units_in_read,
    min_breakpoint_spanning_reads, GenotypeModel, GenotyperParams, ModelParams, RepeatEvidence,
    RepeatGenotyper, PROP_CORRECT_MOLECULES,
};
pub use gt::{encode_genotype, RepeatGenotype, TrSize};
pub use model::ReadCountModel;
