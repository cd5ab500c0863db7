//! Defines the `TsvWriter` struct for writing genotyping results as a tab-separated table.
//!

use crate::analysis::LocusFindings;
use crate::genotype::{encode_genotype, RepeatFindings};
use crate::locus::Locus;
use crate::utils::Result;
use std::{
    fs::File,
    io::{BufWriter, Write},
};

/// Column names of the summary table.
const HEADER: [&str; 13] = [
    "locus_id",
    "region",
    "variant_id",
    "ploidy",
    "mean_read_length",
    "depth",
    "genotype",
    "genotype_ci",
    "filter",
    "spanning_reads",
    "flanking_reads",
    "inrepeat_reads",
    "inrepeat_read_pairs",
];

/// Structure for writing one row per repeat of each analyzed locus.
pub struct TsvWriter<W: Write> {
    writer: W,
}

impl TsvWriter<BufWriter<File>> {
    /// Creates the output file and writes the header.
    ///
    /// # Arguments
    /// * `output_path` - Path of the output TSV file.
    pub fn new(output_path: &str) -> Result<Self> {
        let file = File::create(output_path)
            .map_err(|e| format!("Invalid TSV output path {}: {}", output_path, e))?;
        Self::from_writer(BufWriter::new(file))
    }
}

impl<W: Write> TsvWriter<W> {
    pub fn from_writer(mut writer: W) -> Result<Self> {
        writeln!(writer, "{}", HEADER.join("\t")).map_err(|e| e.to_string())?;
        Ok(TsvWriter { writer })
    }

    /// Writes the rows of a locus.
    ///
    /// # Arguments
    /// * `locus` - `Locus` the findings belong to.
    /// * `locus_findings` - Read statistics and findings of each repeat of the locus.
    pub fn write(&mut self, locus: &Locus, locus_findings: &LocusFindings) -> Result<()> {
        for (variant_id, findings) in &locus_findings.findings {
            let row = encode_row(locus, locus_findings, variant_id, findings);
            writeln!(self.writer, "{}", row)
                .map_err(|e| format!("Error writing results of {}: {}", variant_id, e))?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush().map_err(|e| e.to_string())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn encode_row(
    locus: &Locus,
    locus_findings: &LocusFindings,
    variant_id: &str,
    findings: &RepeatFindings,
) -> String {
    let (genotype, genotype_ci) = match &findings.genotype {
        Some(genotype) => encode_genotype(genotype),
        None => (".".to_string(), ".".to_string()),
    };

    [
        locus.id.clone(),
        locus.region.to_string(),
        variant_id.to_string(),
        findings.ploidy.to_string(),
        locus_findings.stats.mean_read_length.to_string(),
        format!("{:.2}", locus_findings.stats.depth),
        genotype,
        genotype_ci,
        findings.filter.to_string(),
        findings.counts_of_spanning_reads.to_string(),
        findings.counts_of_flanking_reads.to_string(),
        findings.counts_of_inrepeat_reads.to_string(),
        findings.num_inrepeat_read_pairs.to_string(),
    ]
    .join("\t")
}
