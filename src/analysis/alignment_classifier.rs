use crate::graph::{Graph, GraphAlignment, NodeId};
use std::fmt;

/// Relationship between an alignment and a repeat node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlignmentType {
    SpansRepeat,
    FlanksRepeat,
    InsideRepeat,
    OutsideRepeat,
}

impl fmt::Display for AlignmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AlignmentType::SpansRepeat => "spanning",
            AlignmentType::FlanksRepeat => "flanking",
            AlignmentType::InsideRepeat => "in-repeat",
            AlignmentType::OutsideRepeat => "outside",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepeatAlignmentStats {
    alignment_type: AlignmentType,
    num_repeat_units_overlapped: u32,
}

impl RepeatAlignmentStats {
    pub fn new(alignment_type: AlignmentType, num_repeat_units_overlapped: u32) -> Self {
        Self {
            alignment_type,
            num_repeat_units_overlapped,
        }
    }

    pub fn alignment_type(&self) -> AlignmentType {
        self.alignment_type
    }

    pub fn num_repeat_units_overlapped(&self) -> u32 {
        self.num_repeat_units_overlapped
    }
}

/// Classifies alignments relative to one repeat node of a locus graph
#[derive(Debug, Clone)]
pub struct RepeatAlignmentClassifier {
    repeat_node: NodeId,
    unit_len: usize,
}

impl RepeatAlignmentClassifier {
    pub fn new(graph: &Graph, repeat_node: NodeId) -> Self {
        Self {
            repeat_node,
            unit_len: graph.node_seq(repeat_node).len(),
        }
    }

    pub fn repeat_node(&self) -> NodeId {
        self.repeat_node
    }

    pub fn classify(&self, alignment: &GraphAlignment) -> RepeatAlignmentStats {
        let alignment_type = self.alignment_type(alignment);
        let num_units = count_full_overlaps(self.repeat_node, self.unit_len, alignment);
        RepeatAlignmentStats::new(alignment_type, num_units)
    }

    fn alignment_type(&self, alignment: &GraphAlignment) -> AlignmentType {
        let repeat = self.repeat_node;
        let (first, last) = (alignment.first_node(), alignment.last_node());

        let starts_upstream = first < repeat;
        let starts_on_repeat = first == repeat;
        let ends_downstream = last > repeat;
        let ends_on_repeat = last == repeat;

        if starts_upstream && ends_downstream {
            AlignmentType::SpansRepeat
        } else if (starts_upstream && ends_on_repeat) || (starts_on_repeat && ends_downstream) {
            AlignmentType::FlanksRepeat
        } else if starts_on_repeat && ends_on_repeat {
            AlignmentType::InsideRepeat
        } else {
            AlignmentType::OutsideRepeat
        }
    }
}

/// Number of repeat units fully covered by the alignment
///
/// Partial units at either end of the alignment do not count, and the result
/// never exceeds the number of units the query could hold.
pub fn count_full_overlaps(repeat_node: NodeId, unit_len: usize, alignment: &GraphAlignment) -> u32 {
    if unit_len == 0 {
        return 0;
    }

    let num_full_units = alignment
        .path()
        .iter()
        .zip(alignment.alignments())
        .filter(|(node_id, node_alignment)| {
            **node_id == repeat_node
                && node_alignment.ref_start == 0
                && node_alignment.ref_len() == unit_len
        })
        .count();

    let max_units = alignment.query_len() / unit_len;
    num_full_units.min(max_units) as u32
}
