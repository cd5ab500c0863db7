mod karyotype;
mod ploidy;
mod readers;
mod region;
mod util;

pub use karyotype::Karyotype;
pub use ploidy::Ploidy;
pub use readers::{open_genome_reader, open_text_reader};
pub use region::GenomicRegion;
pub use util::{create_writer, handle_error_and_exit, reverse_complement, Result};
