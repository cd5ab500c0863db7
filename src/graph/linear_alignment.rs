use super::{decode_operations, Operation};
use crate::utils::Result;
use itertools::Itertools;
use std::fmt;

/// Scores used to evaluate how well a stretch of sequence is aligned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinearAlignmentParameters {
    pub match_score: i32,
    pub mismatch_score: i32,
    pub gap_open_score: i32,
    pub gap_extend_score: i32,
}

impl Default for LinearAlignmentParameters {
    fn default() -> Self {
        Self {
            match_score: 5,
            mismatch_score: -4,
            gap_open_score: -8,
            gap_extend_score: -2,
        }
    }
}

/// Alignment of a piece of the query to one node sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinearAlignment {
    pub ref_start: usize,
    pub ops: Vec<Operation>,
}

impl LinearAlignment {
    pub fn new(ref_start: usize, ops: Vec<Operation>) -> Self {
        Self { ref_start, ops }
    }

    pub fn decode(ref_start: usize, encoding: &str) -> Result<Self> {
        Ok(Self::new(ref_start, decode_operations(encoding)?))
    }

    pub fn ref_len(&self) -> usize {
        self.ops.iter().map(|op| op.ref_len()).sum()
    }

    pub fn ref_end(&self) -> usize {
        self.ref_start + self.ref_len()
    }

    pub fn query_len(&self) -> usize {
        self.ops.iter().map(|op| op.query_len()).sum()
    }

    pub fn num_matches(&self) -> usize {
        self.ops
            .iter()
            .map(|op| match op {
                Operation::Match(len) => *len as usize,
                _ => 0,
            })
            .sum()
    }

    /// Linear alignment score, saturating at the `i32` bounds
    pub fn score(&self, params: &LinearAlignmentParameters) -> i32 {
        let len_of = |len: u32| i32::try_from(len).unwrap_or(i32::MAX);
        self.ops
            .iter()
            .map(|op| match *op {
                Operation::Match(len) => params.match_score.saturating_mul(len_of(len)),
                Operation::Mismatch(len) => params.mismatch_score.saturating_mul(len_of(len)),
                Operation::Ins(len) | Operation::Del(len) => params
                    .gap_extend_score
                    .saturating_mul(len_of(len) - 1)
                    .saturating_add(params.gap_open_score),
                Operation::SoftClip(_) | Operation::Missing(_) => 0,
            })
            .fold(0, i32::saturating_add)
    }
}

impl fmt::Display for LinearAlignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.ops.iter().join(""))
    }
}
