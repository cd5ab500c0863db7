use crate::utils::Result;
use std::collections::BTreeSet;

pub type NodeId = usize;

/// Locus sequence graph
///
/// Node ids follow the left-to-right order of the locus, so every node upstream
/// of a repeat has a smaller id and every node downstream has a larger id. Repeat
/// nodes are the nodes that carry a self-loop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Graph {
    /// Node sequences indexed by node id
    nodes: Vec<String>,
    edges: BTreeSet<(NodeId, NodeId)>,
}

#[derive(Debug, PartialEq)]
enum StructureElement {
    Literal(String),
    Repeat(String),
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, seq: impl Into<String>) -> NodeId {
        self.nodes.push(seq.into());
        self.nodes.len() - 1
    }

    pub fn add_edge(&mut self, from: NodeId, to: NodeId) -> Result<()> {
        if from >= self.nodes.len() || to >= self.nodes.len() {
            return Err(format!(
                "Cannot add edge {}->{} to a graph with {} nodes",
                from,
                to,
                self.nodes.len()
            ));
        }
        if to < from {
            return Err(format!("Edge {}->{} points upstream", from, to));
        }
        self.edges.insert((from, to));
        Ok(())
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains_node(&self, node_id: NodeId) -> bool {
        node_id < self.nodes.len()
    }

    pub fn node_seq(&self, node_id: NodeId) -> &str {
        &self.nodes[node_id]
    }

    pub fn has_edge(&self, from: NodeId, to: NodeId) -> bool {
        self.edges.contains(&(from, to))
    }

    pub fn is_repeat_node(&self, node_id: NodeId) -> bool {
        self.has_edge(node_id, node_id)
    }

    pub fn repeat_nodes(&self) -> Vec<NodeId> {
        (0..self.nodes.len())
            .filter(|&node_id| self.is_repeat_node(node_id))
            .collect()
    }

    /// Builds a locus graph from flanks and a structure such as `(CAG)*CAACAG(CCG)*`
    ///
    /// Each `(MOTIF)*` becomes a repeat node that may be traversed any number of
    /// times including zero; literal stretches become plain nodes. The left flank
    /// is node 0 and the right flank is the last node.
    pub fn from_structure(left_flank: &str, structure: &str, right_flank: &str) -> Result<Self> {
        if left_flank.is_empty() || right_flank.is_empty() {
            return Err("Locus flanks must not be empty".to_string());
        }

        let elements = parse_structure(structure)?;
        if !elements
            .iter()
            .any(|e| matches!(e, StructureElement::Repeat(_)))
        {
            return Err(format!("Structure '{}' has no repeats", structure));
        }

        let mut graph = Graph::new();
        graph.add_node(left_flank.to_uppercase());
        for element in &elements {
            match element {
                StructureElement::Literal(seq) => {
                    graph.add_node(seq.clone());
                }
                StructureElement::Repeat(motif) => {
                    let node_id = graph.add_node(motif.clone());
                    graph.add_edge(node_id, node_id)?;
                }
            }
        }
        graph.add_node(right_flank.to_uppercase());

        // Connect each node to every later node reachable by skipping repeats
        let num_nodes = graph.num_nodes();
        for from in 0..num_nodes {
            for to in (from + 1)..num_nodes {
                graph.add_edge(from, to)?;
                if !graph.is_repeat_node(to) {
                    break;
                }
            }
        }

        Ok(graph)
    }
}

fn parse_structure(structure: &str) -> Result<Vec<StructureElement>> {
    let error = |msg: &str| format!("Invalid structure '{}': {}", structure, msg);
    let is_base = |c: char| matches!(c, 'A' | 'C' | 'G' | 'T' | 'N');

    let mut elements = Vec::new();
    let mut literal = String::new();
    let mut chars = structure.chars().map(|c| c.to_ascii_uppercase()).peekable();
    while let Some(c) = chars.next() {
        match c {
            '(' => {
                if !literal.is_empty() {
                    elements.push(StructureElement::Literal(std::mem::take(&mut literal)));
                }
                let mut motif = String::new();
                loop {
                    match chars.next() {
                        Some(')') => break,
                        Some(base) if is_base(base) => motif.push(base),
                        Some(other) => return Err(error(&format!("unexpected '{}'", other))),
                        None => return Err(error("unclosed parenthesis")),
                    }
                }
                if motif.is_empty() {
                    return Err(error("empty motif"));
                }
                if chars.next() != Some('*') {
                    return Err(error("motif must be followed by '*'"));
                }
                elements.push(StructureElement::Repeat(motif));
            }
            base if is_base(base) => literal.push(base),
            other => return Err(error(&format!("unexpected '{}'", other))),
        }
    }
    if !literal.is_empty() {
        elements.push(StructureElement::Literal(literal));
    }

    Ok(elements)
}
