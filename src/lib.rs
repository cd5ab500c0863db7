pub mod analysis;
pub mod cli;
pub mod commands;
pub mod genotype;
pub mod graph;
pub mod locus;
pub mod reads;
pub mod utils;
pub mod writers;
