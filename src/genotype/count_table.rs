use itertools::Itertools;
use std::{collections::BTreeMap, fmt};

/// Sparse histogram of repeat sizes (in units) to read counts
///
/// Only elements with non-zero counts are stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountTable {
    counts: BTreeMap<u32, u32>,
}

impl CountTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_count_of(&mut self, element: u32) {
        *self.counts.entry(element).or_insert(0) += 1;
    }

    pub fn count_of(&self, element: u32) -> u32 {
        self.counts.get(&element).copied().unwrap_or(0)
    }

    pub fn set_count_of(&mut self, element: u32, count: u32) {
        if count == 0 {
            self.counts.remove(&element);
        } else {
            self.counts.insert(element, count);
        }
    }

    /// Elements in ascending order
    pub fn elements_with_nonzero_counts(&self) -> Vec<u32> {
        self.counts.keys().copied().collect()
    }

    pub fn max_element(&self) -> Option<u32> {
        self.counts.keys().next_back().copied()
    }

    pub fn total(&self) -> u32 {
        self.counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// (element, count) pairs in ascending element order
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.counts.iter().map(|(element, count)| (*element, *count))
    }
}

impl FromIterator<(u32, u32)> for CountTable {
    fn from_iter<I: IntoIterator<Item = (u32, u32)>>(iter: I) -> Self {
        let mut table = CountTable::new();
        for (element, count) in iter {
            table.set_count_of(element, table.count_of(element) + count);
        }
        table
    }
}

impl fmt::Display for CountTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "()");
        }
        write!(
            f,
            "{}",
            self.iter()
                .map(|(element, count)| format!("({}, {})", element, count))
                .join(", ")
        )
    }
}

/// Folds the counts of all elements above `cap` into the count of `cap`
///
/// Reads cannot hold more units than fit into one read length, so larger
/// elements are estimation noise at the saturation boundary.
pub fn collapse_top_elements(table: &CountTable, cap: u32) -> CountTable {
    table
        .iter()
        .map(|(element, count)| (element.min(cap), count))
        .collect()
}
