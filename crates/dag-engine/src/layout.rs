//! Layered auto-layout for DAGs
//!
//! Assigns node positions in four phases:
//!   1. Rank assignment by longest path from the sources
//!   2. Virtual node insertion for edges spanning several ranks
//!   3. Crossing reduction (barycenter sweeps)
//!   4. Coordinate assignment along the requested direction
//!
//! The engine assumes an acyclic graph. Nodes left unranked by a cycle are
//! put on the first rank so the call terminates, but the placement is not
//! meaningful; callers gate layout behind `detect_cycles`.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{defaults, footprint, spacing};
use crate::types::{GraphEdge, GraphNode, HandleSide, Position};

/// Axis and orientation of the rank progression
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LayoutDirection {
    /// Sources at the top
    #[default]
    #[serde(rename = "TB")]
    TopDown,
    /// Sources at the bottom
    #[serde(rename = "BT")]
    BottomUp,
    /// Sources on the left
    #[serde(rename = "LR")]
    LeftRight,
    /// Sources on the right
    #[serde(rename = "RL")]
    RightLeft,
}

impl LayoutDirection {
    /// Short code (`TB`, `BT`, `LR`, `RL`)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TopDown => "TB",
            Self::BottomUp => "BT",
            Self::LeftRight => "LR",
            Self::RightLeft => "RL",
        }
    }

    /// Whether ranks progress along the x axis
    pub fn is_horizontal(&self) -> bool {
        matches!(self, Self::LeftRight | Self::RightLeft)
    }

    fn is_reversed(&self) -> bool {
        matches!(self, Self::BottomUp | Self::RightLeft)
    }

    /// Sides receiving (incoming, outgoing) connections
    pub fn handle_sides(&self) -> (HandleSide, HandleSide) {
        match self {
            Self::TopDown => (HandleSide::Top, HandleSide::Bottom),
            Self::BottomUp => (HandleSide::Bottom, HandleSide::Top),
            Self::LeftRight => (HandleSide::Left, HandleSide::Right),
            Self::RightLeft => (HandleSide::Right, HandleSide::Left),
        }
    }
}

impl fmt::Display for LayoutDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unrecognised direction code
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown layout direction '{0}' (expected TB, BT, LR or RL)")]
pub struct ParseDirectionError(pub String);

impl FromStr for LayoutDirection {
    type Err = ParseDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TB" => Ok(Self::TopDown),
            "BT" => Ok(Self::BottomUp),
            "LR" => Ok(Self::LeftRight),
            "RL" => Ok(Self::RightLeft),
            other => Err(ParseDirectionError(other.to_string())),
        }
    }
}

/// Layout configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutOptions {
    pub direction: LayoutDirection,
    /// Gap between neighbouring nodes in one rank
    pub node_spacing: f64,
    /// Gap between consecutive ranks
    pub rank_spacing: f64,
    /// Gap next to edges routed through a rank
    pub edge_spacing: f64,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            direction: LayoutDirection::default(),
            node_spacing: spacing::NODE,
            rank_spacing: spacing::RANK,
            edge_spacing: spacing::EDGE,
        }
    }
}

impl LayoutOptions {
    /// Default spacing with the given direction
    pub fn with_direction(direction: LayoutDirection) -> Self {
        Self {
            direction,
            ..Self::default()
        }
    }
}

/// Positioned nodes plus the untouched edge set
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutResult {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

/// Axis-aligned box around all node footprints
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutBounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
    pub width: f64,
    pub height: f64,
}

/// Ranked graph over slots: `0..real_count` are input nodes, the rest are
/// virtual nodes breaking up long edges.
struct RankedGraph {
    real_count: usize,
    /// slot -> neighbours on the previous rank
    upper: Vec<Vec<usize>>,
    /// slot -> neighbours on the next rank
    lower: Vec<Vec<usize>>,
    /// rank -> slots, in cross-axis order
    layers: Vec<Vec<usize>>,
}

impl RankedGraph {
    fn is_virtual(&self, slot: usize) -> bool {
        slot >= self.real_count
    }

    fn add_slot(&mut self) -> usize {
        self.upper.push(Vec::new());
        self.lower.push(Vec::new());
        self.upper.len() - 1
    }

    fn link(&mut self, from: usize, to: usize) {
        self.lower[from].push(to);
        self.upper[to].push(from);
    }
}

/// Compute positions for every node along the requested direction.
///
/// Output nodes keep the input order; edges are returned unchanged. Edges
/// touching unknown nodes and self-loops do not influence placement.
pub fn compute_layout(
    nodes: &[GraphNode],
    edges: &[GraphEdge],
    options: &LayoutOptions,
) -> LayoutResult {
    if nodes.is_empty() {
        return LayoutResult {
            nodes: Vec::new(),
            edges: edges.to_vec(),
        };
    }

    let mut index: HashMap<&str, usize> = HashMap::with_capacity(nodes.len());
    for (i, node) in nodes.iter().enumerate() {
        index.entry(node.id.as_str()).or_insert(i);
    }
    let links: Vec<(usize, usize)> = edges
        .iter()
        .filter_map(|edge| {
            let source = *index.get(edge.source.as_str())?;
            let target = *index.get(edge.target.as_str())?;
            (source != target).then_some((source, target))
        })
        .collect();

    let ranks = assign_ranks(nodes.len(), &links);
    let mut graph = build_ranked_graph(&ranks, &links);
    reduce_crossings(&mut graph);
    let centers = assign_coordinates(&graph, &ranks, options);

    let (incoming, outgoing) = options.direction.handle_sides();
    let positioned = nodes
        .iter()
        .map(|node| {
            let slot = index.get(node.id.as_str()).copied().unwrap_or_default();
            let center = centers[slot];
            let mut node = node.clone();
            node.position = Position::new(
                center.x - footprint::NODE_WIDTH / 2.0,
                center.y - footprint::NODE_HEIGHT / 2.0,
            );
            node.target_position = Some(incoming);
            node.source_position = Some(outgoing);
            node
        })
        .collect();

    log::debug!(
        "Laid out {} nodes on {} ranks ({})",
        nodes.len(),
        graph.layers.len(),
        options.direction
    );

    LayoutResult {
        nodes: positioned,
        edges: edges.to_vec(),
    }
}

/// Longest-path ranking via Kahn's algorithm seeded in node order
fn assign_ranks(count: usize, links: &[(usize, usize)]) -> Vec<usize> {
    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); count];
    let mut in_degree = vec![0usize; count];
    for &(source, target) in links {
        successors[source].push(target);
        in_degree[target] += 1;
    }

    let mut ranks = vec![0usize; count];
    let mut queue: VecDeque<usize> = (0..count).filter(|&i| in_degree[i] == 0).collect();
    let mut ranked = 0;
    while let Some(node) = queue.pop_front() {
        ranked += 1;
        for &next in &successors[node] {
            ranks[next] = ranks[next].max(ranks[node] + 1);
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                queue.push_back(next);
            }
        }
    }

    if ranked < count {
        log::warn!(
            "Layout input contains a cycle; {} nodes placed on the first rank",
            count - ranked
        );
        for (i, degree) in in_degree.iter().enumerate() {
            if *degree > 0 {
                ranks[i] = 0;
            }
        }
    }

    ranks
}

fn build_ranked_graph(ranks: &[usize], links: &[(usize, usize)]) -> RankedGraph {
    let real_count = ranks.len();
    let rank_count = ranks.iter().copied().max().unwrap_or(0) + 1;
    let mut graph = RankedGraph {
        real_count,
        upper: vec![Vec::new(); real_count],
        lower: vec![Vec::new(); real_count],
        layers: vec![Vec::new(); rank_count],
    };

    for (slot, &rank) in ranks.iter().enumerate() {
        graph.layers[rank].push(slot);
    }

    for &(source, target) in links {
        let (from_rank, to_rank) = (ranks[source], ranks[target]);
        if to_rank <= from_rank {
            continue;
        }
        let mut previous = source;
        for rank in from_rank + 1..to_rank {
            let dummy = graph.add_slot();
            graph.layers[rank].push(dummy);
            graph.link(previous, dummy);
            previous = dummy;
        }
        graph.link(previous, target);
    }

    graph
}

/// Barycenter sweeps, alternating downward and upward; the ordering with the
/// fewest crossings wins.
fn reduce_crossings(graph: &mut RankedGraph) {
    if graph.layers.len() < 2 {
        return;
    }

    let mut best = graph.layers.clone();
    let mut best_crossings = count_crossings(graph, &best);

    for pass in 0..defaults::ORDERING_PASSES {
        let mut candidate = best.clone();
        if pass % 2 == 0 {
            for rank in 1..candidate.len() {
                let (fixed, free) = candidate.split_at_mut(rank);
                reorder(&mut free[0], &fixed[rank - 1], &graph.upper);
            }
        } else {
            for rank in (0..candidate.len() - 1).rev() {
                let (free, fixed) = candidate.split_at_mut(rank + 1);
                reorder(&mut free[rank], &fixed[0], &graph.lower);
            }
        }

        let crossings = count_crossings(graph, &candidate);
        if crossings < best_crossings {
            best = candidate;
            best_crossings = crossings;
        }
        if best_crossings == 0 {
            break;
        }
    }

    graph.layers = best;
}

/// Stable sort of `layer` by the mean position of each slot's neighbours in
/// `fixed`. Slots without neighbours keep their current position as key.
fn reorder(layer: &mut [usize], fixed: &[usize], neighbours: &[Vec<usize>]) {
    let position: HashMap<usize, usize> =
        fixed.iter().enumerate().map(|(i, &s)| (s, i)).collect();

    let mut keyed: Vec<(f64, usize)> = layer
        .iter()
        .enumerate()
        .map(|(current, &slot)| {
            let placed: Vec<usize> = neighbours[slot]
                .iter()
                .filter_map(|n| position.get(n).copied())
                .collect();
            let key = if placed.is_empty() {
                current as f64
            } else {
                placed.iter().sum::<usize>() as f64 / placed.len() as f64
            };
            (key, slot)
        })
        .collect();

    keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
    for (target, (_, slot)) in layer.iter_mut().zip(keyed) {
        *target = slot;
    }
}

fn count_crossings(graph: &RankedGraph, layers: &[Vec<usize>]) -> usize {
    let mut crossings = 0;
    for pair in layers.windows(2) {
        let lower_position: HashMap<usize, usize> =
            pair[1].iter().enumerate().map(|(i, &s)| (s, i)).collect();

        let segments: Vec<(usize, usize)> = pair[0]
            .iter()
            .enumerate()
            .flat_map(|(upper_pos, &slot)| {
                graph.lower[slot]
                    .iter()
                    .filter_map(|n| lower_position.get(n).map(|&lower_pos| (upper_pos, lower_pos)))
                    .collect::<Vec<_>>()
            })
            .collect();

        for (i, a) in segments.iter().enumerate() {
            for b in &segments[i + 1..] {
                if (a.0 < b.0 && a.1 > b.1) || (a.0 > b.0 && a.1 < b.1) {
                    crossings += 1;
                }
            }
        }
    }
    crossings
}

/// Node centers per slot (only real slots are read back)
fn assign_coordinates(
    graph: &RankedGraph,
    ranks: &[usize],
    options: &LayoutOptions,
) -> Vec<Position> {
    let horizontal = options.direction.is_horizontal();
    let (rank_size, cross_size) = if horizontal {
        (footprint::NODE_WIDTH, footprint::NODE_HEIGHT)
    } else {
        (footprint::NODE_HEIGHT, footprint::NODE_WIDTH)
    };
    let slot_size = |slot: usize| if graph.is_virtual(slot) { 0.0 } else { cross_size };

    // Cross-axis centers relative to the start of each layer
    let mut cross = vec![0.0; graph.upper.len()];
    let mut extents = Vec::with_capacity(graph.layers.len());
    for layer in &graph.layers {
        let mut cursor = 0.0;
        let mut previous: Option<usize> = None;
        for &slot in layer {
            if let Some(prev) = previous {
                cursor += if graph.is_virtual(prev) || graph.is_virtual(slot) {
                    options.edge_spacing
                } else {
                    options.node_spacing
                };
            }
            cross[slot] = cursor + slot_size(slot) / 2.0;
            cursor += slot_size(slot);
            previous = Some(slot);
        }
        extents.push(cursor);
    }

    let widest = extents.iter().copied().fold(0.0, f64::max);
    let last_rank = graph.layers.len().saturating_sub(1);

    (0..graph.upper.len())
        .map(|slot| {
            if slot >= graph.real_count {
                return Position::default();
            }
            let rank = ranks[slot];
            let shift = (widest - extents[rank]) / 2.0;
            let cross_center = spacing::LAYOUT_MARGIN + shift + cross[slot];
            let step = if options.direction.is_reversed() {
                last_rank - rank
            } else {
                rank
            };
            let rank_center = spacing::LAYOUT_MARGIN
                + step as f64 * (rank_size + options.rank_spacing)
                + rank_size / 2.0;

            if horizontal {
                Position::new(rank_center, cross_center)
            } else {
                Position::new(cross_center, rank_center)
            }
        })
        .collect()
}

/// Bounding box of all node footprints; zeros for an empty slice
pub fn layout_bounds(nodes: &[GraphNode]) -> LayoutBounds {
    if nodes.is_empty() {
        return LayoutBounds::default();
    }

    let min_x = nodes.iter().map(|n| n.position.x).fold(f64::INFINITY, f64::min);
    let min_y = nodes.iter().map(|n| n.position.y).fold(f64::INFINITY, f64::min);
    let max_x = nodes
        .iter()
        .map(|n| n.position.x + footprint::NODE_WIDTH)
        .fold(f64::NEG_INFINITY, f64::max);
    let max_y = nodes
        .iter()
        .map(|n| n.position.y + footprint::NODE_HEIGHT)
        .fold(f64::NEG_INFINITY, f64::max);

    LayoutBounds {
        min_x,
        min_y,
        max_x,
        max_y,
        width: max_x - min_x,
        height: max_y - min_y,
    }
}

/// Translate all nodes so the layout sits around the origin
pub fn center_layout(nodes: &[GraphNode], edges: &[GraphEdge]) -> LayoutResult {
    if nodes.is_empty() {
        return LayoutResult {
            nodes: Vec::new(),
            edges: edges.to_vec(),
        };
    }

    let bounds = layout_bounds(nodes);
    let dx = -bounds.min_x + spacing::CENTER_MARGIN - bounds.width / 2.0;
    let dy = -bounds.min_y + spacing::CENTER_MARGIN - bounds.height / 2.0;

    LayoutResult {
        nodes: nodes
            .iter()
            .map(|node| {
                let mut node = node.clone();
                node.position = node.position.offset(dx, dy);
                node
            })
            .collect(),
        edges: edges.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GraphBuilder;
    use crate::types::GraphSnapshot;

    fn chain() -> GraphSnapshot {
        GraphBuilder::new()
            .add_node("1", "A", (0.0, 0.0))
            .add_node("2", "B", (0.0, 0.0))
            .add_node("3", "C", (0.0, 0.0))
            .connect("1", "2")
            .connect("2", "3")
            .build()
    }

    fn layout(graph: &GraphSnapshot, direction: LayoutDirection) -> LayoutResult {
        compute_layout(
            &graph.nodes,
            &graph.edges,
            &LayoutOptions::with_direction(direction),
        )
    }

    #[test]
    fn test_empty_input() {
        let result = compute_layout(&[], &[], &LayoutOptions::default());
        assert!(result.nodes.is_empty());
        assert!(result.edges.is_empty());

        let centered = center_layout(&[], &[]);
        assert!(centered.nodes.is_empty());
    }

    #[test]
    fn test_top_down_chain() {
        let result = layout(&chain(), LayoutDirection::TopDown);
        let [a, b, c] = [&result.nodes[0], &result.nodes[1], &result.nodes[2]];

        assert!(a.position.y < b.position.y);
        assert!(b.position.y < c.position.y);
        assert_eq!(a.position.x, b.position.x);
        assert_eq!(b.position.x, c.position.x);
        assert_eq!(
            b.position.y - a.position.y,
            footprint::NODE_HEIGHT + spacing::RANK
        );
    }

    #[test]
    fn test_bottom_up_mirrors_ranks() {
        let result = layout(&chain(), LayoutDirection::BottomUp);
        assert!(result.nodes[0].position.y > result.nodes[1].position.y);
        assert!(result.nodes[1].position.y > result.nodes[2].position.y);
    }

    #[test]
    fn test_left_right_chain() {
        let result = layout(&chain(), LayoutDirection::LeftRight);
        assert!(result.nodes[0].position.x < result.nodes[1].position.x);
        assert_eq!(result.nodes[0].position.y, result.nodes[2].position.y);
        assert_eq!(
            result.nodes[1].position.x - result.nodes[0].position.x,
            footprint::NODE_WIDTH + spacing::RANK
        );

        let mirrored = layout(&chain(), LayoutDirection::RightLeft);
        assert!(mirrored.nodes[0].position.x > mirrored.nodes[1].position.x);
    }

    #[test]
    fn test_handle_sides_follow_direction() {
        let cases = [
            (LayoutDirection::TopDown, HandleSide::Top, HandleSide::Bottom),
            (LayoutDirection::BottomUp, HandleSide::Bottom, HandleSide::Top),
            (LayoutDirection::LeftRight, HandleSide::Left, HandleSide::Right),
            (LayoutDirection::RightLeft, HandleSide::Right, HandleSide::Left),
        ];
        for (direction, incoming, outgoing) in cases {
            let result = layout(&chain(), direction);
            for node in &result.nodes {
                assert_eq!(node.target_position, Some(incoming));
                assert_eq!(node.source_position, Some(outgoing));
            }
        }
    }

    #[test]
    fn test_fan_out_centers_parent() {
        let graph = GraphBuilder::new()
            .add_node("1", "Root", (0.0, 0.0))
            .add_node("2", "Left", (0.0, 0.0))
            .add_node("3", "Right", (0.0, 0.0))
            .connect("1", "2")
            .connect("1", "3")
            .build();

        let result = layout(&graph, LayoutDirection::TopDown);
        let (root, left, right) = (&result.nodes[0], &result.nodes[1], &result.nodes[2]);

        assert_eq!(left.position.y, right.position.y);
        assert_eq!(
            right.position.x - left.position.x,
            footprint::NODE_WIDTH + spacing::NODE
        );
        assert_eq!(root.position.x, (left.position.x + right.position.x) / 2.0);
    }

    #[test]
    fn test_long_edge_uses_longest_path_rank() {
        let graph = GraphBuilder::new()
            .add_node("1", "A", (0.0, 0.0))
            .add_node("2", "B", (0.0, 0.0))
            .add_node("3", "C", (0.0, 0.0))
            .connect("1", "3")
            .connect("1", "2")
            .connect("2", "3")
            .build();

        let result = layout(&graph, LayoutDirection::TopDown);
        let step = footprint::NODE_HEIGHT + spacing::RANK;
        assert_eq!(result.nodes[2].position.y - result.nodes[0].position.y, 2.0 * step);
    }

    #[test]
    fn test_crossings_are_removed() {
        let graph = GraphBuilder::new()
            .add_node("a", "A", (0.0, 0.0))
            .add_node("b", "B", (0.0, 0.0))
            .add_node("c", "C", (0.0, 0.0))
            .add_node("d", "D", (0.0, 0.0))
            .connect("a", "d")
            .connect("b", "c")
            .build();

        let result = layout(&graph, LayoutDirection::TopDown);
        let x = |i: usize| result.nodes[i].position.x;
        assert!(x(0) < x(1));
        // d sits under a, c under b
        assert!(x(3) < x(2));
    }

    #[test]
    fn test_layout_is_deterministic() {
        let graph = GraphBuilder::new()
            .add_node("1", "A", (0.0, 0.0))
            .add_node("2", "B", (0.0, 0.0))
            .add_node("3", "C", (0.0, 0.0))
            .add_node("4", "D", (0.0, 0.0))
            .connect("1", "2")
            .connect("1", "3")
            .connect("2", "4")
            .connect("3", "4")
            .build();

        let first = layout(&graph, LayoutDirection::LeftRight);
        let second = layout(&graph, LayoutDirection::LeftRight);
        assert_eq!(first, second);
    }

    #[test]
    fn test_layout_then_center_keeps_nodes_and_edges() {
        let graph = chain();
        let laid_out = layout(&graph, LayoutDirection::TopDown);
        let centered = center_layout(&laid_out.nodes, &laid_out.edges);

        assert_eq!(centered.nodes.len(), graph.nodes.len());
        assert_eq!(centered.edges, graph.edges);
        for (before, after) in graph.nodes.iter().zip(&centered.nodes) {
            assert_eq!(before.id, after.id);
            assert_eq!(before.data, after.data);
        }
    }

    #[test]
    fn test_center_single_node() {
        let graph = GraphBuilder::new().add_node("1", "A", (100.0, 100.0)).build();
        let centered = center_layout(&graph.nodes, &graph.edges);

        assert_eq!(centered.nodes[0].position, Position::new(-36.0, 20.0));
    }

    #[test]
    fn test_layout_bounds() {
        let graph = GraphBuilder::new()
            .add_node("1", "A", (0.0, 0.0))
            .add_node("2", "B", (200.0, 100.0))
            .build();

        let bounds = layout_bounds(&graph.nodes);
        assert_eq!(bounds.min_x, 0.0);
        assert_eq!(bounds.max_x, 200.0 + footprint::NODE_WIDTH);
        assert_eq!(bounds.height, 100.0 + footprint::NODE_HEIGHT);
        assert_eq!(layout_bounds(&[]), LayoutBounds::default());
    }

    #[test]
    fn test_cyclic_input_terminates() {
        let graph = GraphBuilder::new()
            .add_node("1", "A", (0.0, 0.0))
            .add_node("2", "B", (0.0, 0.0))
            .connect("1", "2")
            .connect("2", "1")
            .build();

        let result = layout(&graph, LayoutDirection::TopDown);
        assert_eq!(result.nodes.len(), 2);
    }

    #[test]
    fn test_direction_codes() {
        for code in ["TB", "BT", "LR", "RL"] {
            let direction: LayoutDirection = code.parse().unwrap();
            assert_eq!(direction.to_string(), code);
        }
        assert!("XY".parse::<LayoutDirection>().is_err());
        assert_eq!(
            serde_json::to_value(LayoutDirection::LeftRight).unwrap(),
            "LR"
        );
    }
}
