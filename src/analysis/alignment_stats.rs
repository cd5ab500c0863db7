use crate::graph::{GraphAlignment, NodeId};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BreakpointStats {
    pub num_reads_spanning_left_breakpoint: u32,
    pub num_reads_spanning_right_breakpoint: u32,
}

/// Counts confident alignments crossing each boundary of a repeat node
#[derive(Debug, Clone)]
pub struct AlignmentStatsCalculator {
    repeat_node: NodeId,
    stats: BreakpointStats,
}

impl AlignmentStatsCalculator {
    pub fn new(repeat_node: NodeId) -> Self {
        Self {
            repeat_node,
            stats: BreakpointStats::default(),
        }
    }

    pub fn inspect(&mut self, alignment: &GraphAlignment) {
        let (first, last) = (alignment.first_node(), alignment.last_node());
        if first < self.repeat_node && last >= self.repeat_node {
            self.stats.num_reads_spanning_left_breakpoint += 1;
        }
        if first <= self.repeat_node && last > self.repeat_node {
            self.stats.num_reads_spanning_right_breakpoint += 1;
        }
    }

    pub fn stats(&self) -> BreakpointStats {
        self.stats
    }
}
