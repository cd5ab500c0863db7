mod graph_alignment;
mod linear_alignment;
mod operation;
mod sequence_graph;

pub use graph_alignment::GraphAlignment;
pub use linear_alignment::{LinearAlignment, LinearAlignmentParameters};
pub use operation::{decode_operations, Operation};
pub use sequence_graph::{Graph, NodeId};
