use super::{Graph, LinearAlignment, NodeId, Operation};
use crate::utils::Result;
use std::fmt;

/// Alignment of a read to a path through a locus graph
///
/// Holds one linear alignment per node of the path. Only the first node may be
/// entered past its start and only the last node may be left before its end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphAlignment {
    path: Vec<NodeId>,
    alignments: Vec<LinearAlignment>,
}

impl GraphAlignment {
    pub fn new(path: Vec<NodeId>, alignments: Vec<LinearAlignment>, graph: &Graph) -> Result<Self> {
        if path.is_empty() {
            return Err("Graph alignment must contain at least one node".to_string());
        }
        if path.len() != alignments.len() {
            return Err(format!(
                "Path of {} nodes has {} node alignments",
                path.len(),
                alignments.len()
            ));
        }
        if let Some(node_id) = path.iter().find(|&&node_id| !graph.contains_node(node_id)) {
            return Err(format!("Node {} is not in the graph", node_id));
        }
        for (from, to) in path.iter().zip(path.iter().skip(1)) {
            if !graph.has_edge(*from, *to) {
                return Err(format!("Path follows missing edge {}->{}", from, to));
            }
        }

        let last_index = path.len() - 1;
        for (index, (node_id, alignment)) in path.iter().zip(alignments.iter()).enumerate() {
            let node_len = graph.node_seq(*node_id).len();
            if alignment.ref_end() > node_len {
                return Err(format!(
                    "Alignment {} extends past the end of node {} ({} > {})",
                    alignment,
                    node_id,
                    alignment.ref_end(),
                    node_len
                ));
            }
            if index != 0 && alignment.ref_start != 0 {
                return Err(format!("Alignment to node {} must start at 0", node_id));
            }
            if index != last_index && alignment.ref_end() != node_len {
                return Err(format!("Alignment to node {} must reach its end", node_id));
            }
        }

        Ok(Self { path, alignments })
    }

    /// Decodes an encoding such as `0[4M]1[3M]1[2M1X]` with the given start on the first node
    pub fn decode(first_node_start: usize, encoding: &str, graph: &Graph) -> Result<Self> {
        let error = |msg: &str| format!("Invalid graph alignment '{}': {}", encoding, msg);

        let mut path = Vec::new();
        let mut alignments = Vec::new();
        let mut rest = encoding;
        while !rest.is_empty() {
            let open = rest.find('[').ok_or_else(|| error("missing '['"))?;
            let close = rest.find(']').ok_or_else(|| error("missing ']'"))?;
            if close < open {
                return Err(error("unbalanced brackets"));
            }
            let node_id: NodeId = rest[..open]
                .parse()
                .map_err(|_| error("node id must be a non-negative integer"))?;
            let ref_start = if path.is_empty() { first_node_start } else { 0 };
            let alignment = LinearAlignment::decode(ref_start, &rest[open + 1..close])
                .map_err(|e| error(&e))?;
            path.push(node_id);
            alignments.push(alignment);
            rest = &rest[close + 1..];
        }

        Self::new(path, alignments, graph).map_err(|e| error(&e))
    }

    /// Parses `start:encoding`, for example `12:0[4M]1[3M]`
    pub fn from_string(encoding: &str, graph: &Graph) -> Result<Self> {
        let (start, path_encoding) = encoding
            .split_once(':')
            .ok_or_else(|| format!("Expected 'start:alignment', got '{}'", encoding))?;
        let start: usize = start
            .parse()
            .map_err(|_| format!("Invalid alignment start in '{}'", encoding))?;
        Self::decode(start, path_encoding, graph)
    }

    pub fn path(&self) -> &[NodeId] {
        &self.path
    }

    pub fn alignments(&self) -> &[LinearAlignment] {
        &self.alignments
    }

    pub fn start(&self) -> usize {
        self.alignments[0].ref_start
    }

    pub fn first_node(&self) -> NodeId {
        self.path[0]
    }

    pub fn last_node(&self) -> NodeId {
        self.path[self.path.len() - 1]
    }

    pub fn query_len(&self) -> usize {
        self.alignments.iter().map(|a| a.query_len()).sum()
    }

    pub fn ref_len(&self) -> usize {
        self.alignments.iter().map(|a| a.ref_len()).sum()
    }

    pub fn num_matches(&self) -> usize {
        self.alignments.iter().map(|a| a.num_matches()).sum()
    }

    pub fn front_softclip_len(&self) -> usize {
        match self.alignments[0].ops.first() {
            Some(Operation::SoftClip(len)) => *len as usize,
            _ => 0,
        }
    }

    pub fn back_softclip_len(&self) -> usize {
        match self.alignments[self.alignments.len() - 1].ops.last() {
            Some(Operation::SoftClip(len)) => *len as usize,
            _ => 0,
        }
    }
}

impl fmt::Display for GraphAlignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.start())?;
        for (node_id, alignment) in self.path.iter().zip(self.alignments.iter()) {
            write!(f, "{}[{}]", node_id, alignment)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_graph() -> Graph {
        Graph::from_structure("ATTCGA", "(CAG)*", "GTCGAT").unwrap()
    }

    #[test]
    fn test_decode_spanning_alignment() {
        let graph = make_graph();
        let alignment = GraphAlignment::decode(2, "0[4M]1[3M]1[2M1X]2[3M]", &graph).unwrap();
        assert_eq!(alignment.path(), &[0, 1, 1, 2]);
        assert_eq!(alignment.start(), 2);
        assert_eq!(alignment.first_node(), 0);
        assert_eq!(alignment.last_node(), 2);
        assert_eq!(alignment.query_len(), 13);
        assert_eq!(alignment.ref_len(), 13);
        assert_eq!(alignment.num_matches(), 12);
    }

    #[test]
    fn test_from_string_round_trips_display() {
        let graph = make_graph();
        let encoding = "3:0[1S3M]1[3M]2[2M]";
        let alignment = GraphAlignment::from_string(encoding, &graph).unwrap();
        assert_eq!(alignment.to_string(), encoding);
        assert_eq!(alignment.front_softclip_len(), 1);
        assert_eq!(alignment.back_softclip_len(), 0);
    }

    #[test]
    fn test_decode_rejects_invalid_paths() {
        let graph = make_graph();
        // 2 -> 0 is not an edge
        assert!(GraphAlignment::decode(0, "2[3M]0[3M]", &graph).is_err());
        // Node 1 is only 3bp long
        assert!(GraphAlignment::decode(0, "1[4M]", &graph).is_err());
        // Interior node not fully covered
        assert!(GraphAlignment::decode(2, "0[4M]1[2M]2[3M]", &graph).is_err());
        // First node alignment must reach the end of the node
        assert!(GraphAlignment::decode(0, "0[4M]1[3M]", &graph).is_err());
        assert!(GraphAlignment::decode(0, "7[3M]", &graph).is_err());
        assert!(GraphAlignment::decode(0, "0[3M", &graph).is_err());
        assert!(GraphAlignment::from_string("0[3M]", &graph).is_err());
    }

    #[test]
    fn test_decode_rejects_oversized_operations() {
        let graph = Graph::from_structure("ATTCGATTCGATTCG", "(CAG)*", "GTCGATGTCGATGTC").unwrap();
        assert!(GraphAlignment::from_string("3:0[12M2147483648I]1[3M]2[12M]", &graph).is_err());
        let alignment =
            GraphAlignment::from_string("3:0[12M2147483647I]1[3M]2[12M]", &graph).unwrap();
        let params = crate::graph::LinearAlignmentParameters::default();
        assert!(alignment.alignments()[0].score(&params) < 0);
    }
}
