//! Per-session directed graph: nodes, edges, and merge helpers.
//!
//! The graph is the authoritative structure the explorer grows. Invariants:
//! node ids are unique within a graph, and at most one node carries the id
//! `"root"`. Edges have deterministic ids (`e-<source>-<target>`); re-creation
//! of the same source→target pair is avoided by filtering candidate branches
//! on existing target ids before insertion.
//!
//! **Interaction**: mutated only by `SessionStore` operations; read by the
//! CLI via cloned snapshots and by `render`.

use serde::{Deserialize, Serialize};

use crate::layout::Point;

/// Reserved id of the root node. At most one node per graph carries it.
pub const ROOT_ID: &str = "root";

/// Node category. Determines rendering and what a user "submit" at the node
/// means (see `SessionStore::submit`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    /// Seed topic node; submit reprompts the root with a clarification.
    Root,
    /// Next-action branch; submit expands an answer path below it.
    Step,
    /// User-added prerequisite; submit behaves like a step.
    Pre,
    /// Clarifying side question; submit reprompts the root with the answer.
    Info,
    /// Terminal conclusion; submit only records the input.
    Answer,
    /// User-added free node; submit only records the input.
    #[default]
    Default,
}

/// Edge semantics. Structural direction is always `source → target`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkType {
    /// Backward/prerequisite: source is a prerequisite of target.
    Pre,
    /// Forward/child step or answer: source is the parent of target.
    Post,
    /// Lateral clarifying information; excluded from previous/next traversal.
    Info,
}

/// One node of a session graph.
///
/// `id` is immutable after creation. `position` is set by the layout engine
/// at creation time and later by drag updates from the UI collaborator.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub id: String,
    pub position: Point,
    pub node_type: NodeType,
    /// Short display label (also the dedup key at parse time).
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Free text the user submitted at this node.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_value: Option<String>,
}

impl GraphNode {
    /// Creates a node with the given id, type, and label; optional fields empty.
    pub fn new(id: impl Into<String>, node_type: NodeType, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            position: Point::default(),
            node_type,
            label: label.into(),
            title: None,
            content: None,
            details: None,
            input_value: None,
        }
    }

    /// Sets the position (builder).
    pub fn at(mut self, position: Point) -> Self {
        self.position = position;
        self
    }

    /// Sets the secondary content field (builder).
    pub fn with_content(mut self, content: Option<String>) -> Self {
        self.content = content;
        self
    }
}

/// One edge of a session graph. `id` is `e-<source>-<target>`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub link_type: LinkType,
}

/// Deterministic edge id for a source→target pair.
pub fn edge_id(source: &str, target: &str) -> String {
    format!("e-{source}-{target}")
}

/// A session's node and edge sequences. Order is insertion order.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Graph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl Graph {
    /// Looks up a node by id.
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Looks up a node by id, mutably.
    pub fn node_mut(&mut self, id: &str) -> Option<&mut GraphNode> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    /// True when a node with this id exists.
    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.iter().any(|n| n.id == id)
    }

    /// Appends a node. The caller is responsible for id uniqueness (the
    /// expansion pipeline filters candidates via [`Graph::contains_node`]).
    pub fn push_node(&mut self, node: GraphNode) {
        self.nodes.push(node);
    }

    /// Appends an edge with the deterministic id for the pair.
    pub fn connect(&mut self, source: &str, target: &str, link_type: LinkType) {
        self.edges.push(GraphEdge {
            id: edge_id(source, target),
            source: source.to_string(),
            target: target.to_string(),
            link_type,
        });
    }

    /// Clarifier question/answer pairs: labels of `info` nodes hanging off
    /// the root, paired with the user's recorded answer when present.
    ///
    /// **Interaction**: collected into the prompt context for `clarify` and
    /// `answerPath` generation requests.
    pub fn root_clarifier_pairs(&self) -> Vec<(String, Option<String>)> {
        self.edges
            .iter()
            .filter(|e| e.source == ROOT_ID && e.link_type == LinkType::Info)
            .filter_map(|e| self.node(&e.target))
            .map(|n| (n.label.clone(), n.details.clone()))
            .collect()
    }

    /// Removes every node reachable from the root along `post`/`info` edges
    /// (and all edges touching a removed node). Returns the removed node count.
    ///
    /// Nodes attached to the root only by `pre` edges (pointing into the
    /// root) are kept. This is the destructive half of a root clarify
    /// reprompt; answer-path subtrees below root children are removed with
    /// their parents.
    pub fn remove_root_subtree(&mut self) -> usize {
        let mut doomed: Vec<String> = Vec::new();
        let mut frontier: Vec<String> = vec![ROOT_ID.to_string()];
        while let Some(id) = frontier.pop() {
            for e in &self.edges {
                if e.source == id && matches!(e.link_type, LinkType::Post | LinkType::Info) {
                    let target = e.target.clone();
                    if target != ROOT_ID && !doomed.contains(&target) {
                        doomed.push(target.clone());
                        frontier.push(target);
                    }
                }
            }
        }
        self.nodes.retain(|n| !doomed.contains(&n.id));
        self.edges
            .retain(|e| !doomed.contains(&e.source) && !doomed.contains(&e.target));
        doomed.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_with_root() -> Graph {
        let mut g = Graph::default();
        g.push_node(GraphNode::new(ROOT_ID, NodeType::Root, "Topic"));
        g
    }

    /// **Scenario**: Edge ids are deterministic for a source→target pair.
    #[test]
    fn edge_id_deterministic() {
        assert_eq!(edge_id("root", "root-step-1"), "e-root-root-step-1");
    }

    /// **Scenario**: connect appends an edge with the deterministic id.
    #[test]
    fn connect_appends_edge() {
        let mut g = graph_with_root();
        g.push_node(GraphNode::new("a", NodeType::Step, "A"));
        g.connect(ROOT_ID, "a", LinkType::Post);
        assert_eq!(g.edges.len(), 1);
        assert_eq!(g.edges[0].id, "e-root-a");
        assert_eq!(g.edges[0].link_type, LinkType::Post);
    }

    /// **Scenario**: root_clarifier_pairs returns info children with answers.
    #[test]
    fn clarifier_pairs_from_info_edges() {
        let mut g = graph_with_root();
        let mut q = GraphNode::new("root-clar-1", NodeType::Info, "How much time?");
        q.details = Some("two weeks".to_string());
        g.push_node(q);
        g.push_node(GraphNode::new("root-step-1", NodeType::Step, "Plan"));
        g.connect(ROOT_ID, "root-clar-1", LinkType::Info);
        g.connect(ROOT_ID, "root-step-1", LinkType::Post);
        let pairs = g.root_clarifier_pairs();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].0, "How much time?");
        assert_eq!(pairs[0].1.as_deref(), Some("two weeks"));
    }

    /// **Scenario**: remove_root_subtree removes post/info descendants
    /// transitively but keeps pre nodes pointing into the root.
    #[test]
    fn remove_root_subtree_spares_pre_nodes() {
        let mut g = graph_with_root();
        g.push_node(GraphNode::new("root-step-1", NodeType::Step, "Plan"));
        g.push_node(GraphNode::new("root-step-1-ans-1", NodeType::Answer, "Done"));
        g.push_node(GraphNode::new("root-clar-1", NodeType::Info, "Q?"));
        g.push_node(GraphNode::new("before", NodeType::Pre, "Prereq"));
        g.connect(ROOT_ID, "root-step-1", LinkType::Post);
        g.connect("root-step-1", "root-step-1-ans-1", LinkType::Post);
        g.connect(ROOT_ID, "root-clar-1", LinkType::Info);
        g.connect("before", ROOT_ID, LinkType::Pre);

        let removed = g.remove_root_subtree();
        assert_eq!(removed, 3);
        assert!(g.contains_node(ROOT_ID));
        assert!(g.contains_node("before"));
        assert!(!g.contains_node("root-step-1"));
        assert!(!g.contains_node("root-step-1-ans-1"));
        assert!(!g.contains_node("root-clar-1"));
        // Only the pre edge into root survives.
        assert_eq!(g.edges.len(), 1);
        assert_eq!(g.edges[0].source, "before");
    }
}
