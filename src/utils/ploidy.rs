use std::{fmt, str::FromStr};

/// Number of copies of a chromosome, and so the number of haplotypes at a locus
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Ploidy {
    Zero,
    One,
    Two,
}

impl Ploidy {
    pub fn num_haplotypes(&self) -> usize {
        match self {
            Ploidy::Zero => 0,
            Ploidy::One => 1,
            Ploidy::Two => 2,
        }
    }
}

impl FromStr for Ploidy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "0" => Ok(Ploidy::Zero),
            "1" => Ok(Ploidy::One),
            "2" => Ok(Ploidy::Two),
            _ => Err("must be set to 0, 1, or 2".to_string()),
        }
    }
}

impl fmt::Display for Ploidy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.num_haplotypes())
    }
}
