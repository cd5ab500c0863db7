use crate::utils::Result;
use std::fmt;

/// Zero-based half-open interval on a contig
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenomicRegion {
    pub contig: String,
    pub start: u32,
    pub end: u32,
}

impl GenomicRegion {
    pub fn new(contig: impl Into<String>, start: u32, end: u32) -> Result<Self> {
        if start >= end {
            return Err(format!("Invalid region: start {} >= end {}", start, end));
        }

        Ok(Self {
            contig: contig.into(),
            start,
            end,
        })
    }

    pub fn parse(contig: &str, start: &str, end: &str) -> Result<Self> {
        let parse_coord = |value: &str| {
            value
                .parse::<u32>()
                .map_err(|_| format!("Invalid coordinate '{}'", value))
        };
        Self::new(contig, parse_coord(start)?, parse_coord(end)?)
    }

}

impl fmt::Display for GenomicRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.contig, self.start, self.end)
    }
}
