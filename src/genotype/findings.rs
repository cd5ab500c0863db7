use super::{CountTable, RepeatGenotype};
use crate::utils::Ploidy;
use itertools::Itertools;
use std::{
    collections::BTreeSet,
    fmt,
    ops::{BitOr, BitOrAssign},
};

/// Quality concern attached to a genotype call
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FilterFlag {
    LowDepth,
}

impl fmt::Display for FilterFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterFlag::LowDepth => write!(f, "LowDepth"),
        }
    }
}

/// Set of filter flags; flags only accumulate
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenotypeFilter {
    flags: BTreeSet<FilterFlag>,
}

impl GenotypeFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, flag: FilterFlag) -> bool {
        self.flags.contains(&flag)
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = FilterFlag> + '_ {
        self.flags.iter().copied()
    }
}

impl BitOr<FilterFlag> for GenotypeFilter {
    type Output = GenotypeFilter;

    fn bitor(mut self, flag: FilterFlag) -> GenotypeFilter {
        self.flags.insert(flag);
        self
    }
}

impl BitOr for GenotypeFilter {
    type Output = GenotypeFilter;

    fn bitor(mut self, other: GenotypeFilter) -> GenotypeFilter {
        self.flags.extend(other.flags);
        self
    }
}

impl BitOrAssign<FilterFlag> for GenotypeFilter {
    fn bitor_assign(&mut self, flag: FilterFlag) {
        self.flags.insert(flag);
    }
}

impl fmt::Display for GenotypeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            write!(f, "PASS")
        } else {
            write!(f, "{}", self.iter().join(";"))
        }
    }
}

/// Everything learned about one repeat of a locus
#[derive(Debug, Clone, PartialEq)]
pub struct RepeatFindings {
    pub counts_of_spanning_reads: CountTable,
    pub counts_of_flanking_reads: CountTable,
    pub counts_of_inrepeat_reads: CountTable,
    pub num_inrepeat_read_pairs: u32,
    pub ploidy: Ploidy,
    pub genotype: Option<RepeatGenotype>,
    pub filter: GenotypeFilter,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_combine() {
        let filter = GenotypeFilter::new();
        assert!(filter.is_empty());
        assert_eq!(filter.to_string(), "PASS");

        let filter = filter | FilterFlag::LowDepth;
        assert!(filter.contains(FilterFlag::LowDepth));

        let mut combined = filter.clone() | GenotypeFilter::new();
        combined |= FilterFlag::LowDepth;
        assert_eq!(combined, filter);
        assert_eq!(combined.to_string(), "LowDepth");
    }
}
