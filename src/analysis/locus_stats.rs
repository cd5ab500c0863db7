use crate::graph::{Graph, GraphAlignment, NodeId};
use crate::utils::Ploidy;

/// Read length and coverage summary of a locus
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocusStats {
    pub mean_read_length: u32,
    pub depth: f64,
    pub ploidy: Ploidy,
}

/// Accumulates read lengths and flank coverage of the aligned reads of a locus
#[derive(Debug, Clone)]
pub struct LocusStatsCalculator {
    ploidy: Ploidy,
    left_flank: NodeId,
    right_flank: NodeId,
    total_flank_len: usize,
    num_reads: usize,
    total_read_len: usize,
    num_flank_bases: usize,
}

impl LocusStatsCalculator {
    pub fn new(graph: &Graph, ploidy: Ploidy) -> Self {
        let left_flank = 0;
        let right_flank = graph.num_nodes().saturating_sub(1);
        let total_flank_len = graph.node_seq(left_flank).len() + graph.node_seq(right_flank).len();
        Self {
            ploidy,
            left_flank,
            right_flank,
            total_flank_len,
            num_reads: 0,
            total_read_len: 0,
            num_flank_bases: 0,
        }
    }

    pub fn inspect(&mut self, alignment: &GraphAlignment) {
        self.num_reads += 1;
        self.total_read_len += alignment.query_len();
        self.num_flank_bases += alignment
            .path()
            .iter()
            .zip(alignment.alignments())
            .filter(|(node_id, _)| **node_id == self.left_flank || **node_id == self.right_flank)
            .map(|(_, node_alignment)| node_alignment.ref_len())
            .sum::<usize>();
    }

    pub fn estimate(&self) -> LocusStats {
        let mean_read_length = match self.num_reads {
            0 => 0,
            num_reads => (self.total_read_len as f64 / num_reads as f64).round() as u32,
        };
        let depth = match self.total_flank_len {
            0 => 0.0,
            flank_len => self.num_flank_bases as f64 / flank_len as f64,
        };

        LocusStats {
            mean_read_length,
            depth,
            ploidy: self.ploidy,
        }
    }
}
