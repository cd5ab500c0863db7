use super::Read;
use crate::utils::Result;
use std::{io::BufRead, str::FromStr};

/// Where a read pair was extracted from relative to its locus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionType {
    Target,
    Offtarget,
}

impl FromStr for RegionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "target" => Ok(RegionType::Target),
            "offtarget" => Ok(RegionType::Offtarget),
            _ => Err(format!("Invalid region type '{}' (target or offtarget)", s)),
        }
    }
}

/// One line of the alignment table
///
/// Alignments stay encoded until they reach the locus whose graph they refer to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairRecord {
    pub locus_id: String,
    pub region_type: RegionType,
    pub read: Read,
    pub read_alignment: Option<String>,
    pub mate: Read,
    pub mate_alignment: Option<String>,
}

impl PairRecord {
    pub fn from_line(line: &str) -> Result<Self> {
        const EXPECTED_FIELD_COUNT: usize = 8;
        let fields: Vec<&str> = line.split('\t').collect();
        let [locus_id, region_type, read_id, read_seq, read_aln, mate_id, mate_seq, mate_aln] =
            fields[..]
        else {
            return Err(format!(
                "Expected {} tab-separated fields, found {}",
                EXPECTED_FIELD_COUNT,
                fields.len()
            ));
        };

        let decode_alignment = |encoding: &str| match encoding {
            "*" => None,
            _ => Some(encoding.to_string()),
        };

        Ok(Self {
            locus_id: locus_id.to_string(),
            region_type: region_type.parse()?,
            read: Read::new(read_id, read_seq),
            read_alignment: decode_alignment(read_aln),
            mate: Read::new(mate_id, mate_seq),
            mate_alignment: decode_alignment(mate_aln),
        })
    }
}

/// Iterates over the records of an alignment table, skipping blank and `#` lines
pub fn read_pair_records<R: BufRead>(reader: R) -> impl Iterator<Item = Result<PairRecord>> {
    reader
        .lines()
        .enumerate()
        .filter(|(_, line)| match line {
            Ok(line) => !(line.trim().is_empty() || line.starts_with('#')),
            Err(_) => true,
        })
        .map(|(line_index, line)| {
            line.map_err(|e| e.to_string())
                .and_then(|line| PairRecord::from_line(&line))
                .map_err(|e| format!("Error at alignment line {}: {}", line_index + 1, e))
        })
}
