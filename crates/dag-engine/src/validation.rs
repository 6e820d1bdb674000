//! Structural validation for editable DAGs
//!
//! Pure functions that inspect a candidate or current graph: the connection
//! gate used before an edge is inserted, cycle detection and cycle path
//! reconstruction, isolated node discovery, and the full-graph report shown
//! to the user after every change.
//!
//! None of these functions fail. Edges whose endpoints are missing from the
//! node list are tolerated: their endpoints take part in cycle analysis as
//! implicit nodes, and `validate_dag` reports them as errors.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::types::{label_of, GraphEdge, GraphNode, NodeId};

/// Outcome of a full-graph validation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// True iff `errors` is empty
    pub is_valid: bool,
    /// Structural violations
    pub errors: Vec<String>,
    /// Advisory findings; never affect `is_valid`
    pub warnings: Vec<String>,
}

/// Coarse state for status displays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    /// No errors, no warnings
    Valid,
    /// No errors, at least one warning
    ValidWithWarnings,
    /// At least one error
    Invalid,
}

impl ValidationResult {
    fn from_findings(errors: Vec<String>, warnings: Vec<String>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    /// Classify the result for display
    pub fn status(&self) -> ValidationStatus {
        if !self.is_valid {
            ValidationStatus::Invalid
        } else if self.warnings.is_empty() {
            ValidationStatus::Valid
        } else {
            ValidationStatus::ValidWithWarnings
        }
    }

    /// Whether there is anything to show
    pub fn has_issues(&self) -> bool {
        !self.errors.is_empty() || !self.warnings.is_empty()
    }
}

/// Incoming/outgoing edge counts for one node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConnections {
    pub incoming: usize,
    pub outgoing: usize,
}

/// Summary counters for a graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub isolated_nodes: usize,
    pub has_cycles: bool,
}

/// Insertion-ordered adjacency over the node list plus every edge endpoint
struct Adjacency<'a> {
    order: Vec<&'a str>,
    successors: HashMap<&'a str, Vec<&'a str>>,
}

impl<'a> Adjacency<'a> {
    fn build(nodes: &'a [GraphNode], edges: &'a [GraphEdge]) -> Self {
        let mut adjacency = Self {
            order: Vec::with_capacity(nodes.len()),
            successors: HashMap::with_capacity(nodes.len()),
        };
        for node in nodes {
            adjacency.insert(&node.id);
        }
        for edge in edges {
            adjacency.insert(&edge.source);
            adjacency.insert(&edge.target);
            if let Some(successors) = adjacency.successors.get_mut(edge.source.as_str()) {
                successors.push(&edge.target);
            }
        }
        adjacency
    }

    fn insert(&mut self, id: &'a str) {
        if !self.successors.contains_key(id) {
            self.order.push(id);
            self.successors.insert(id, Vec::new());
        }
    }

    fn successors_of(&self, id: &str) -> &[&'a str] {
        self.successors.get(id).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Edge `closing -> start` that closes a cycle during depth-first search
struct BackEdge<'a> {
    start: &'a str,
    closing: &'a str,
}

/// Iterative depth-first search for the first back edge.
///
/// Frames are `(node, index of next successor)`. A node stays in `on_stack`
/// while it has a frame; reaching such a node again is a back edge. Nodes in
/// `visited` but no longer on the stack are finished and are skipped, which
/// keeps diamonds (two paths to one node) from being mistaken for cycles.
/// Every tree edge records the child's parent in `parents`.
fn find_back_edge<'a>(
    adjacency: &Adjacency<'a>,
    parents: &mut HashMap<&'a str, &'a str>,
) -> Option<BackEdge<'a>> {
    let mut visited: HashSet<&'a str> = HashSet::new();
    let mut on_stack: HashSet<&'a str> = HashSet::new();

    for &root in &adjacency.order {
        if !visited.insert(root) {
            continue;
        }
        on_stack.insert(root);
        let mut stack: Vec<(&'a str, usize)> = vec![(root, 0)];

        while let Some(frame) = stack.last_mut() {
            let (node, next) = *frame;
            match adjacency.successors_of(node).get(next) {
                Some(&successor) => {
                    frame.1 += 1;
                    if on_stack.contains(successor) {
                        return Some(BackEdge {
                            start: successor,
                            closing: node,
                        });
                    }
                    if visited.insert(successor) {
                        parents.insert(successor, node);
                        on_stack.insert(successor);
                        stack.push((successor, 0));
                    }
                }
                None => {
                    on_stack.remove(node);
                    stack.pop();
                }
            }
        }
    }

    None
}

/// Gate run before an edge is inserted.
///
/// Returns false for a self-loop or when the exact `(source, target)` pair
/// already exists.
pub fn validate_connection(source: &str, target: &str, edges: &[GraphEdge]) -> bool {
    if source == target {
        return false;
    }
    !edges
        .iter()
        .any(|edge| edge.source == source && edge.target == target)
}

/// Whether the directed graph contains a cycle
pub fn detect_cycles(nodes: &[GraphNode], edges: &[GraphEdge]) -> bool {
    if nodes.is_empty() || edges.is_empty() {
        return false;
    }

    let adjacency = Adjacency::build(nodes, edges);
    let mut parents = HashMap::new();
    find_back_edge(&adjacency, &mut parents).is_some()
}

/// Node ids of the first cycle found, in forward order.
///
/// Returns an empty vector when the graph is acyclic. A self-loop yields a
/// single-element path.
pub fn find_cycle_path(nodes: &[GraphNode], edges: &[GraphEdge]) -> Vec<NodeId> {
    if nodes.is_empty() || edges.is_empty() {
        return Vec::new();
    }

    let adjacency = Adjacency::build(nodes, edges);
    let mut parents = HashMap::new();
    let Some(back_edge) = find_back_edge(&adjacency, &mut parents) else {
        return Vec::new();
    };

    let mut path = vec![back_edge.closing];
    let mut current = back_edge.closing;
    while current != back_edge.start {
        match parents.get(current) {
            Some(&parent) => {
                path.push(parent);
                current = parent;
            }
            None => return Vec::new(),
        }
    }

    path.reverse();
    path.into_iter().map(str::to_string).collect()
}

/// Nodes that are neither the source nor the target of any edge
pub fn get_isolated_nodes(nodes: &[GraphNode], edges: &[GraphEdge]) -> Vec<NodeId> {
    let connected: HashSet<&str> = edges
        .iter()
        .flat_map(|edge| [edge.source.as_str(), edge.target.as_str()])
        .collect();

    nodes
        .iter()
        .filter(|node| !connected.contains(node.id.as_str()))
        .map(|node| node.id.clone())
        .collect()
}

/// Count edges ending at (incoming) and starting from (outgoing) a node
pub fn get_node_connections(node_id: &str, edges: &[GraphEdge]) -> NodeConnections {
    edges
        .iter()
        .fold(NodeConnections::default(), |mut counts, edge| {
            if edge.target == node_id {
                counts.incoming += 1;
            }
            if edge.source == node_id {
                counts.outgoing += 1;
            }
            counts
        })
}

/// Summary counters used by status displays
pub fn get_graph_stats(nodes: &[GraphNode], edges: &[GraphEdge]) -> GraphStats {
    GraphStats {
        node_count: nodes.len(),
        edge_count: edges.len(),
        isolated_nodes: get_isolated_nodes(nodes, edges).len(),
        has_cycles: detect_cycles(nodes, edges),
    }
}

/// Full structural report, safe to re-run after every change
pub fn validate_dag(nodes: &[GraphNode], edges: &[GraphEdge]) -> ValidationResult {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if nodes.is_empty() {
        warnings.push("Graph is empty".to_string());
        return ValidationResult::from_findings(errors, warnings);
    }

    check_cycles(nodes, edges, &mut errors);
    check_isolated(nodes, edges, &mut errors);
    check_flow(nodes, edges, &mut warnings);
    check_duplicates(edges, &mut errors);
    check_duplicate_ids(nodes, edges, &mut errors);
    check_dangling(nodes, edges, &mut errors);

    ValidationResult::from_findings(errors, warnings)
}

fn check_cycles(nodes: &[GraphNode], edges: &[GraphEdge], errors: &mut Vec<String>) {
    if !detect_cycles(nodes, edges) {
        return;
    }

    let path = find_cycle_path(nodes, edges);
    if path.is_empty() {
        errors.push("Cycle detected in graph".to_string());
    } else {
        let labels: Vec<&str> = path.iter().map(|id| label_of(nodes, id)).collect();
        errors.push(format!("Cycle detected: {}", labels.join(" → ")));
    }
}

fn check_isolated(nodes: &[GraphNode], edges: &[GraphEdge], errors: &mut Vec<String>) {
    let isolated = get_isolated_nodes(nodes, edges);
    let labels: Vec<&str> = isolated.iter().map(|id| label_of(nodes, id)).collect();

    match labels.as_slice() {
        [] => {}
        [single] => errors.push(format!(
            "Isolated node: {} (must have at least 1 connection)",
            single
        )),
        many => errors.push(format!(
            "Isolated nodes: {} (must have at least 1 connection each)",
            many.join(", ")
        )),
    }
}

fn check_flow(nodes: &[GraphNode], edges: &[GraphEdge], warnings: &mut Vec<String>) {
    let mut counts: HashMap<&str, NodeConnections> = HashMap::new();
    for edge in edges {
        counts.entry(edge.source.as_str()).or_default().outgoing += 1;
        counts.entry(edge.target.as_str()).or_default().incoming += 1;
    }

    let issues: Vec<String> = nodes
        .iter()
        .filter_map(|node| {
            let connections = counts.get(node.id.as_str()).copied().unwrap_or_default();
            if connections.incoming == 0 && connections.outgoing > 0 {
                Some(format!("{} (source only)", node.display_label()))
            } else if connections.outgoing == 0 && connections.incoming > 0 {
                Some(format!("{} (sink only)", node.display_label()))
            } else {
                None
            }
        })
        .collect();

    if !issues.is_empty() {
        warnings.push(format!("Potential flow issues: {}", issues.join(", ")));
    }
}

fn check_duplicates(edges: &[GraphEdge], errors: &mut Vec<String>) {
    let mut seen: HashSet<(&str, &str)> = HashSet::new();
    let duplicates: Vec<String> = edges
        .iter()
        .filter(|edge| !seen.insert((edge.source.as_str(), edge.target.as_str())))
        .map(|edge| format!("{}->{}", edge.source, edge.target))
        .collect();

    if !duplicates.is_empty() {
        errors.push(format!("Duplicate connections: {}", duplicates.join(", ")));
    }
}

/// Ids repeated within the node list or within the edge list, each listed once
fn check_duplicate_ids(nodes: &[GraphNode], edges: &[GraphEdge], errors: &mut Vec<String>) {
    let node_ids = repeated(nodes.iter().map(|node| node.id.as_str()));
    if !node_ids.is_empty() {
        errors.push(format!("Duplicate node ids: {}", node_ids.join(", ")));
    }

    let edge_ids = repeated(edges.iter().map(|edge| edge.id.as_str()));
    if !edge_ids.is_empty() {
        errors.push(format!("Duplicate connection ids: {}", edge_ids.join(", ")));
    }
}

fn repeated<'a>(ids: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut reported: HashSet<&str> = HashSet::new();
    ids.filter(|id| !seen.insert(*id) && reported.insert(*id))
        .collect()
}

fn check_dangling(nodes: &[GraphNode], edges: &[GraphEdge], errors: &mut Vec<String>) {
    let known: HashSet<&str> = nodes.iter().map(|node| node.id.as_str()).collect();

    for edge in edges {
        for endpoint in [&edge.source, &edge.target] {
            if !known.contains(endpoint.as_str()) {
                errors.push(format!(
                    "Connection {} references missing node '{}'",
                    edge.id, endpoint
                ));
            }
        }
    }
}
