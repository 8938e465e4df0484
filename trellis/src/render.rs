//! Session graph rendering for the CLI: indented text tree and Graphviz DOT.

use std::collections::HashSet;
use std::fmt::Write;

use crate::graph::{Graph, LinkType, NodeType, ROOT_ID};

fn kind(node_type: NodeType) -> &'static str {
    match node_type {
        NodeType::Root => "root",
        NodeType::Step => "step",
        NodeType::Pre => "pre",
        NodeType::Info => "info",
        NodeType::Answer => "answer",
        NodeType::Default => "node",
    }
}

fn walk(graph: &Graph, id: &str, depth: usize, visited: &mut HashSet<String>, out: &mut String) {
    if !visited.insert(id.to_string()) {
        return;
    }
    if let Some(node) = graph.node(id) {
        let marker = if node.node_type == NodeType::Info { "? " } else { "" };
        writeln!(
            out,
            "{}{}[{}] {}: {}",
            "  ".repeat(depth),
            marker,
            kind(node.node_type),
            node.id,
            node.label
        )
        .unwrap();
        if let Some(details) = &node.details {
            writeln!(out, "{}  · {}", "  ".repeat(depth), details).unwrap();
        }
    }
    for edge in &graph.edges {
        if edge.source == id && matches!(edge.link_type, LinkType::Post | LinkType::Info) {
            walk(graph, &edge.target, depth + 1, visited, out);
        }
    }
}

/// Text rendering: tree from the root along `post`/`info` edges, then
/// prerequisite edges and any detached nodes.
pub fn render_text(graph: &Graph) -> String {
    let mut text = String::new();
    writeln!(text, "Nodes: {}  Edges: {}", graph.nodes.len(), graph.edges.len()).unwrap();

    let mut visited = HashSet::new();
    if graph.contains_node(ROOT_ID) {
        walk(graph, ROOT_ID, 0, &mut visited, &mut text);
    }
    for edge in &graph.edges {
        if edge.link_type == LinkType::Pre {
            writeln!(text, "[pre] {} -> {}", edge.source, edge.target).unwrap();
            visited.insert(edge.source.clone());
        }
    }
    for node in &graph.nodes {
        if !visited.contains(&node.id) {
            writeln!(text, "[{}] {}: {}", kind(node.node_type), node.id, node.label).unwrap();
        }
    }
    text
}

fn escape(label: &str) -> String {
    label.replace('"', "\\\"")
}

/// Graphviz DOT rendering; `info` edges dashed, `pre` edges dotted.
pub fn render_dot(graph: &Graph) -> String {
    let mut dot = String::from("digraph {\n");
    dot.push_str("  rankdir=TB;\n");
    dot.push_str("  node [shape=box];\n\n");
    for node in &graph.nodes {
        let label = node.title.as_deref().unwrap_or(&node.label);
        dot.push_str(&format!("  \"{}\" [label=\"{}\"];\n", node.id, escape(label)));
    }
    dot.push('\n');
    for edge in &graph.edges {
        let style = match edge.link_type {
            LinkType::Post => "",
            LinkType::Info => " [style=dashed]",
            LinkType::Pre => " [style=dotted]",
        };
        dot.push_str(&format!("  \"{}\" -> \"{}\"{};\n", edge.source, edge.target, style));
    }
    dot.push_str("}\n");
    dot
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphNode;

    fn sample() -> Graph {
        let mut g = Graph::default();
        g.push_node(GraphNode::new(ROOT_ID, NodeType::Root, "Travel"));
        g.push_node(GraphNode::new("root-step-1", NodeType::Step, "Pick dates"));
        g.push_node(GraphNode::new("root-clar-1", NodeType::Info, "Budget?"));
        g.push_node(GraphNode::new("before", NodeType::Pre, "Save up"));
        g.connect(ROOT_ID, "root-step-1", LinkType::Post);
        g.connect(ROOT_ID, "root-clar-1", LinkType::Info);
        g.connect("before", ROOT_ID, LinkType::Pre);
        g
    }

    /// **Scenario**: Text rendering nests children under the root and marks
    /// clarifiers and prerequisite edges.
    #[test]
    fn text_tree_shape() {
        let text = render_text(&sample());
        assert!(text.contains("Nodes: 4"));
        assert!(text.contains("[root] root: Travel"));
        assert!(text.contains("  [step] root-step-1: Pick dates"));
        assert!(text.contains("? [info] root-clar-1: Budget?"));
        assert!(text.contains("[pre] before -> root"));
    }

    /// **Scenario**: DOT output styles info edges dashed and pre edges
    /// dotted, and escapes label quotes.
    #[test]
    fn dot_edge_styles() {
        let mut g = sample();
        g.node_mut(ROOT_ID).unwrap().title = Some("A \"big\" trip".to_string());
        let dot = render_dot(&g);
        assert!(dot.contains("digraph"));
        assert!(dot.contains("\"root\" -> \"root-step-1\";"));
        assert!(dot.contains("\"root\" -> \"root-clar-1\" [style=dashed];"));
        assert!(dot.contains("\"before\" -> \"root\" [style=dotted];"));
        assert!(dot.contains("A \\\"big\\\" trip"));
    }
}
