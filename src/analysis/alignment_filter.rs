use super::{AlignmentType, RepeatAlignmentStats};
use crate::graph::{GraphAlignment, LinearAlignment, LinearAlignmentParameters, NodeId};

/// Fewest matched bases that anchor an alignment in a flank
pub const MIN_FLANK_MATCHES: usize = 10;
const MIN_MATCH_FRACTION: f64 = 0.8;

/// Generic quality filters applied to every alignment
///
/// Soft-clipped bases are excluded from the query length, and the matched bases
/// must make up most of both the query and the reference stretch.
pub fn passes_alignment_filters(alignment: &GraphAlignment) -> bool {
    let clipped_len = alignment
        .query_len()
        .saturating_sub(alignment.front_softclip_len() + alignment.back_softclip_len());
    let num_matches = alignment.num_matches() as f64;

    clipped_len > 0
        && num_matches >= MIN_MATCH_FRACTION * clipped_len as f64
        && num_matches >= MIN_MATCH_FRACTION * alignment.ref_len() as f64
}

/// Checks the part of the alignment upstream of the repeat node
pub fn is_upstream_alignment_good(repeat_node: NodeId, alignment: &GraphAlignment) -> bool {
    let upstream = alignment
        .path()
        .iter()
        .zip(alignment.alignments())
        .take_while(|(node_id, _)| **node_id < repeat_node)
        .map(|(_, node_alignment)| node_alignment);
    is_flank_alignment_good(upstream)
}

/// Checks the part of the alignment downstream of the repeat node
pub fn is_downstream_alignment_good(repeat_node: NodeId, alignment: &GraphAlignment) -> bool {
    let downstream = alignment
        .path()
        .iter()
        .zip(alignment.alignments())
        .rev()
        .take_while(|(node_id, _)| **node_id > repeat_node)
        .map(|(_, node_alignment)| node_alignment);
    is_flank_alignment_good(downstream)
}

fn is_flank_alignment_good<'a>(node_alignments: impl Iterator<Item = &'a LinearAlignment>) -> bool {
    let params = LinearAlignmentParameters::default();
    let (num_matches, score) = node_alignments.fold((0, 0i32), |(matches, score), alignment| {
        (
            matches + alignment.num_matches(),
            score.saturating_add(alignment.score(&params)),
        )
    });
    num_matches >= MIN_FLANK_MATCHES && score > 0
}

/// Decides whether a classified alignment can contribute to the count tables
pub fn is_confident(
    repeat_node: NodeId,
    alignment: &GraphAlignment,
    stats: &RepeatAlignmentStats,
) -> bool {
    if !passes_alignment_filters(alignment) {
        return false;
    }

    match stats.alignment_type() {
        AlignmentType::SpansRepeat => {
            is_upstream_alignment_good(repeat_node, alignment)
                && is_downstream_alignment_good(repeat_node, alignment)
        }
        AlignmentType::FlanksRepeat => {
            is_upstream_alignment_good(repeat_node, alignment)
                || is_downstream_alignment_good(repeat_node, alignment)
        }
        AlignmentType::InsideRepeat | AlignmentType::OutsideRepeat => true,
    }
}
