//! Editor orchestrator
//!
//! `DagEditor` owns the live graph and wires every user action through the
//! engines in a fixed order:
//!
//! 1. gate the action (connection checks, cycle check on the hypothetical
//!    edge set, layout preconditions); a rejected action changes nothing
//! 2. snapshot the pre-mutation state into the undo stack
//! 3. mutate the graph
//! 4. re-run the full validation and notify the event sink
//!
//! Selection changes are view state: they are neither gated nor recorded in
//! history.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::EditorConfig;
use crate::constants::defaults;
use crate::error::{DagEngineError, Result};
use crate::events::{EditorEvent, EventSink, NullEventSink};
use crate::layout::{center_layout, compute_layout, LayoutDirection, LayoutOptions};
use crate::types::{
    find_node, label_of, EdgeId, GraphDocument, GraphEdge, GraphNode, GraphSnapshot, NodeId,
    Position,
};
use crate::undo::UndoStack;
use crate::validation::{
    detect_cycles, find_cycle_path, get_graph_stats, validate_connection, validate_dag,
    GraphStats, ValidationResult,
};

/// Why a connection attempt was refused
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionRejection {
    /// An endpoint is not in the graph
    UnknownNode(NodeId),
    /// Source and target are the same node
    SelfLoop,
    /// The same directed edge already exists
    Duplicate,
    /// Adding the edge would close a cycle
    WouldCreateCycle {
        source_label: String,
        target_label: String,
    },
}

impl fmt::Display for ConnectionRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownNode(id) => write!(f, "Node '{}' does not exist", id),
            Self::SelfLoop => write!(f, "A node cannot connect to itself"),
            Self::Duplicate => write!(f, "These nodes are already connected"),
            Self::WouldCreateCycle {
                source_label,
                target_label,
            } => write!(
                f,
                "Cannot create connection from \"{}\" to \"{}\": \
                 This would create a cycle in the graph.",
                source_label, target_label
            ),
        }
    }
}

/// Result of [`DagEditor::connect`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// The edge was added under this id
    Connected(EdgeId),
    /// Nothing changed
    Rejected(ConnectionRejection),
}

impl ConnectOutcome {
    /// Whether the edge was added
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected(_))
    }
}

/// File format written by [`DagEditor::export`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphExport {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub validation: ValidationResult,
    pub timestamp: DateTime<Utc>,
}

/// Any JSON object carrying `nodes` and `edges`
#[derive(Deserialize)]
struct LoadedGraph {
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
}

/// Interactive DAG editing session
pub struct DagEditor {
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    history: UndoStack,
    validation: ValidationResult,
    next_node_id: u64,
    config: EditorConfig,
    events: Arc<dyn EventSink>,
}

impl DagEditor {
    /// Create an editor with an empty graph
    pub fn new(config: EditorConfig) -> Self {
        Self::from_graph(config, Vec::new(), Vec::new())
    }

    /// Create an editor seeded with a graph; the seed is not undoable
    pub fn from_graph(config: EditorConfig, nodes: Vec<GraphNode>, edges: Vec<GraphEdge>) -> Self {
        let history = match config.history_limit {
            Some(limit) => UndoStack::with_limit(limit),
            None => UndoStack::new(),
        };
        let validation = validate_dag(&nodes, &edges);
        let next_node_id = next_id_after(&nodes);

        Self {
            nodes,
            edges,
            history,
            validation,
            next_node_id,
            config,
            events: Arc::new(NullEventSink),
        }
    }

    /// Route events to the given sink
    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Latest validation report, refreshed after every change
    pub fn validation(&self) -> &ValidationResult {
        &self.validation
    }

    pub fn stats(&self) -> GraphStats {
        get_graph_stats(&self.nodes, &self.edges)
    }

    pub fn find_node(&self, id: &str) -> Option<&GraphNode> {
        find_node(&self.nodes, id)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Add a node labelled `Node {id}`
    pub fn add_node(&mut self, position: Position) -> Result<NodeId> {
        let id = self.allocate_node_id()?;
        let label = format!("Node {}", id);
        self.insert_node(GraphNode::new(id, label, position))
    }

    /// Add a node with an explicit label
    pub fn add_node_with_label(
        &mut self,
        label: impl Into<String>,
        position: Position,
    ) -> Result<NodeId> {
        let id = self.allocate_node_id()?;
        self.insert_node(GraphNode::new(id, label, position))
    }

    /// Copy a node (without its edges) next to the original
    pub fn duplicate_node(&mut self, id: &str) -> Result<NodeId> {
        let original = self
            .find_node(id)
            .ok_or_else(|| DagEngineError::node_not_found(id))?
            .clone();

        let offset = self.config.duplicate_offset;
        let mut copy = original;
        copy.id = self.allocate_node_id()?;
        copy.data.label = format!("{} Copy", copy.data.label);
        copy.position = copy.position.offset(offset, offset);
        copy.selected = false;
        self.insert_node(copy)
    }

    /// Rename a node
    pub fn update_label(&mut self, id: &str, label: impl Into<String>) -> Result<()> {
        let index = self.node_index(id)?;
        self.record()?;
        self.nodes[index].data.label = label.into();
        self.commit();
        Ok(())
    }

    /// Move a node to a new position
    pub fn move_node(&mut self, id: &str, position: Position) -> Result<()> {
        let index = self.node_index(id)?;
        self.record()?;
        self.nodes[index].position = position;
        self.commit();
        Ok(())
    }

    /// Add the edge `source -> target` if it keeps the graph a DAG
    ///
    /// Rejections are reported as data and leave graph and history untouched.
    pub fn connect(&mut self, source: &str, target: &str) -> Result<ConnectOutcome> {
        if let Some(rejection) = self.check_connection(source, target) {
            log::debug!("Rejected connection {} -> {}: {}", source, target, rejection);
            self.emit(EditorEvent::ConnectionRejected {
                source: source.to_string(),
                target: target.to_string(),
                reason: rejection.to_string(),
            });
            return Ok(ConnectOutcome::Rejected(rejection));
        }

        let edge = GraphEdge::new(self.unique_edge_id(source, target), source, target);
        let id = edge.id.clone();

        self.record()?;
        self.edges.push(edge);
        self.commit();
        Ok(ConnectOutcome::Connected(id))
    }

    fn check_connection(&self, source: &str, target: &str) -> Option<ConnectionRejection> {
        for endpoint in [source, target] {
            if self.find_node(endpoint).is_none() {
                return Some(ConnectionRejection::UnknownNode(endpoint.to_string()));
            }
        }

        if !validate_connection(source, target, &self.edges) {
            return Some(if source == target {
                ConnectionRejection::SelfLoop
            } else {
                ConnectionRejection::Duplicate
            });
        }

        let mut candidate = self.edges.clone();
        candidate.push(GraphEdge::new(
            GraphEdge::conventional_id(source, target),
            source,
            target,
        ));
        if detect_cycles(&self.nodes, &candidate) {
            return Some(ConnectionRejection::WouldCreateCycle {
                source_label: label_of(&self.nodes, source).to_string(),
                target_label: label_of(&self.nodes, target).to_string(),
            });
        }

        None
    }

    /// Remove a node and every edge touching it
    ///
    /// Every node carrying `id` goes, so a loaded graph with repeated ids can
    /// be cleaned up.
    pub fn delete_node(&mut self, id: &str) -> Result<()> {
        self.node_index(id)?;
        self.record()?;
        self.nodes.retain(|node| node.id != id);
        self.edges.retain(|edge| !edge.touches(id));
        self.commit();
        Ok(())
    }

    /// Remove the edge (or every edge) carrying `id`
    pub fn delete_edge(&mut self, id: &str) -> Result<()> {
        if !self.edges.iter().any(|edge| edge.id == id) {
            return Err(DagEngineError::edge_not_found(id));
        }
        self.record()?;
        self.edges.retain(|edge| edge.id != id);
        self.commit();
        Ok(())
    }

    /// Mark the node (or every node) carrying `id` as selected
    pub fn select_node(&mut self, id: &str) -> Result<()> {
        self.node_index(id)?;
        self.nodes
            .iter_mut()
            .filter(|node| node.id == id)
            .for_each(|node| node.selected = true);
        Ok(())
    }

    /// Mark an edge as selected
    pub fn select_edge(&mut self, id: &str) -> Result<()> {
        let edge = self
            .edges
            .iter_mut()
            .find(|edge| edge.id == id)
            .ok_or_else(|| DagEngineError::edge_not_found(id))?;
        edge.selected = true;
        Ok(())
    }

    /// Deselect everything
    pub fn clear_selection(&mut self) {
        self.nodes.iter_mut().for_each(|node| node.selected = false);
        self.edges.iter_mut().for_each(|edge| edge.selected = false);
    }

    /// Delete selected nodes (with their edges) and selected edges
    ///
    /// Returns false when nothing was selected.
    pub fn delete_selected(&mut self) -> Result<bool> {
        let doomed: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|node| node.selected)
            .map(|node| node.id.clone())
            .collect();
        let has_selected_edges = self.edges.iter().any(|edge| edge.selected);
        if doomed.is_empty() && !has_selected_edges {
            return Ok(false);
        }

        self.record()?;
        self.nodes.retain(|node| !node.selected);
        self.edges
            .retain(|edge| !edge.selected && !doomed.iter().any(|id| edge.touches(id)));
        self.commit();
        Ok(true)
    }

    /// Remove every node and edge
    ///
    /// Returns false (and records nothing) when the graph is already empty.
    pub fn clear(&mut self) -> Result<bool> {
        if self.nodes.is_empty() && self.edges.is_empty() {
            return Ok(false);
        }
        self.record()?;
        self.nodes.clear();
        self.edges.clear();
        self.commit();
        Ok(true)
    }

    /// Lay out in the direction from the editor configuration
    pub fn apply_default_layout(&mut self) -> Result<()> {
        self.apply_layout(self.config.layout.direction)
    }

    /// Reposition all nodes with the layered layout
    ///
    /// Spacing comes from the editor configuration; `direction` overrides the
    /// configured one.
    pub fn apply_layout(&mut self, direction: LayoutDirection) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(DagEngineError::EmptyGraph);
        }
        if detect_cycles(&self.nodes, &self.edges) {
            let path = find_cycle_path(&self.nodes, &self.edges);
            let labels: Vec<&str> = path.iter().map(|id| label_of(&self.nodes, id)).collect();
            return Err(DagEngineError::CyclicGraph(labels.join(" → ")));
        }

        let options = LayoutOptions {
            direction,
            ..self.config.layout
        };
        let mut result = compute_layout(&self.nodes, &self.edges, &options);
        if self.config.center_after_layout {
            result = center_layout(&result.nodes, &result.edges);
        }

        self.record()?;
        self.nodes = result.nodes;
        self.edges = result.edges;
        log::info!("Applied {} layout to {} nodes", direction, self.nodes.len());
        self.emit(EditorEvent::LayoutApplied { direction });
        self.commit();
        Ok(())
    }

    /// Step back one change; returns false when there is nothing to undo
    pub fn undo(&mut self) -> Result<bool> {
        match self.history.undo(&self.nodes, &self.edges)? {
            Some(snapshot) => {
                self.restore(snapshot);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Re-apply the last undone change; returns false when there is nothing to redo
    pub fn redo(&mut self) -> Result<bool> {
        match self.history.redo(&self.nodes, &self.edges)? {
            Some(snapshot) => {
                self.restore(snapshot);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Replace the graph, e.g. after a bulk load
    ///
    /// The load is undoable and is never blocked by validation: structural
    /// problems show up in the validation report.
    pub fn load_graph(&mut self, nodes: Vec<GraphNode>, edges: Vec<GraphEdge>) -> Result<()> {
        self.record()?;
        self.next_node_id = next_id_after(&nodes);
        self.nodes = nodes;
        self.edges = edges;
        log::info!(
            "Loaded graph with {} nodes and {} edges",
            self.nodes.len(),
            self.edges.len()
        );
        self.commit();
        Ok(())
    }

    /// Load from JSON carrying `nodes` and `edges` (exports and documents)
    pub fn load_json(&mut self, json: &str) -> Result<()> {
        let loaded: LoadedGraph = serde_json::from_str(json)?;
        self.load_graph(loaded.nodes, loaded.edges)
    }

    /// Load a graph file written by [`DagEditor::save_to_path`]
    pub fn load_from_path(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let json = std::fs::read_to_string(path)?;
        self.load_json(&json)
    }

    /// Current graph with its validation report and a timestamp
    pub fn export(&self) -> GraphExport {
        GraphExport {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
            validation: self.validation.clone(),
            timestamp: Utc::now(),
        }
    }

    /// Pretty JSON of [`DagEditor::export`]
    pub fn export_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.export())?)
    }

    /// Write the export to a file
    pub fn save_to_path(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.export_json()?)?;
        Ok(())
    }

    /// Persistable document for the graph service
    pub fn to_document(&self, name: impl Into<String>) -> GraphDocument {
        GraphDocument::new(name).with_graph(self.nodes.clone(), self.edges.clone())
    }

    /// Current state as a snapshot
    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot::capture(&self.nodes, &self.edges)
    }

    fn insert_node(&mut self, node: GraphNode) -> Result<NodeId> {
        let id = node.id.clone();
        self.record()?;
        self.nodes.push(node);
        self.commit();
        Ok(id)
    }

    fn node_index(&self, id: &str) -> Result<usize> {
        self.nodes
            .iter()
            .position(|node| node.id == id)
            .ok_or_else(|| DagEngineError::node_not_found(id))
    }

    fn allocate_node_id(&mut self) -> Result<NodeId> {
        loop {
            let candidate = self.next_node_id.to_string();
            if self.find_node(&candidate).is_none() {
                self.next_node_id = self.next_node_id.saturating_add(1);
                return Ok(candidate);
            }
            match self.next_node_id.checked_add(1) {
                Some(next) => self.next_node_id = next,
                None => return self.lowest_free_node_id(),
            }
        }
    }

    /// Smallest unused numeric id; only reached once the counter is at `u64::MAX`
    fn lowest_free_node_id(&self) -> Result<NodeId> {
        (defaults::FIRST_NODE_ID..=u64::MAX)
            .map(|n| n.to_string())
            .find(|candidate| self.find_node(candidate).is_none())
            .ok_or(DagEngineError::NodeIdsExhausted)
    }

    fn unique_edge_id(&self, source: &str, target: &str) -> EdgeId {
        let base = GraphEdge::conventional_id(source, target);
        let taken = |id: &str| self.edges.iter().any(|edge| edge.id == id);
        if !taken(&base) {
            return base;
        }
        let mut suffix = 2;
        loop {
            let candidate = format!("{}-{}", base, suffix);
            if !taken(&candidate) {
                return candidate;
            }
            suffix += 1;
        }
    }

    fn record(&mut self) -> Result<()> {
        self.history.take_snapshot(&self.nodes, &self.edges)
    }

    fn restore(&mut self, snapshot: GraphSnapshot) {
        self.nodes = snapshot.nodes;
        self.edges = snapshot.edges;
        self.next_node_id = self.next_node_id.max(next_id_after(&self.nodes));
        self.commit();
    }

    /// Refresh the validation report and notify listeners
    fn commit(&mut self) {
        let validation = validate_dag(&self.nodes, &self.edges);
        let validation_changed = validation != self.validation;
        self.validation = validation;

        self.emit(EditorEvent::GraphChanged {
            node_count: self.nodes.len(),
            edge_count: self.edges.len(),
        });
        if validation_changed {
            self.emit(EditorEvent::ValidationChanged {
                result: self.validation.clone(),
            });
        }
        self.emit(EditorEvent::HistoryChanged {
            can_undo: self.history.can_undo(),
            can_redo: self.history.can_redo(),
        });
    }

    fn emit(&self, event: EditorEvent) {
        if let Err(e) = self.events.send(event) {
            log::warn!("Failed to deliver editor event: {}", e);
        }
    }
}

impl Default for DagEditor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

/// First id after the largest numeric node id
fn next_id_after(nodes: &[GraphNode]) -> u64 {
    nodes
        .iter()
        .filter_map(|node| node.id.parse::<u64>().ok())
        .max()
        .map_or(defaults::FIRST_NODE_ID, |max| max.saturating_add(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GraphBuilder;
    use crate::events::{EventError, VecEventSink};
    use crate::validation::ValidationStatus;

    fn sample_editor() -> DagEditor {
        let graph = GraphBuilder::new()
            .add_node("1", "Start Node", (250.0, 25.0))
            .add_node("2", "Process A", (100.0, 125.0))
            .add_node("3", "Process B", (400.0, 125.0))
            .connect("1", "2")
            .connect("1", "3")
            .build();
        DagEditor::from_graph(EditorConfig::default(), graph.nodes, graph.edges)
    }

    #[test]
    fn test_seeded_editor_is_valid_and_not_undoable() {
        let editor = sample_editor();
        assert!(editor.validation().is_valid);
        assert_eq!(editor.validation().status(), ValidationStatus::ValidWithWarnings);
        assert!(!editor.can_undo());
    }

    #[test]
    fn test_add_node_assigns_sequential_ids() {
        let mut editor = sample_editor();
        let id = editor.add_node(Position::new(10.0, 10.0)).unwrap();
        assert_eq!(id, "4");
        assert_eq!(editor.find_node("4").unwrap().data.label, "Node 4");

        // The new node is isolated, which the live report flags
        assert!(!editor.validation().is_valid);
        assert!(editor.can_undo());
    }

    #[test]
    fn test_connect_adds_edge_with_conventional_id() {
        let mut editor = sample_editor();
        let outcome = editor.connect("2", "3").unwrap();
        assert_eq!(outcome, ConnectOutcome::Connected("e2-3".to_string()));
        assert_eq!(editor.edges().len(), 3);
    }

    #[test]
    fn test_connect_rejections_leave_state_untouched() {
        let sink = Arc::new(VecEventSink::new());
        let mut editor = sample_editor().with_event_sink(sink.clone());
        editor.connect("2", "3").unwrap();
        let undo_steps_before = editor.history.undo_len();
        let edges_before = editor.edges().to_vec();
        sink.clear();

        let cases = [
            ("1", "1", ConnectionRejection::SelfLoop),
            ("1", "2", ConnectionRejection::Duplicate),
            ("1", "ghost", ConnectionRejection::UnknownNode("ghost".to_string())),
            (
                "3",
                "1",
                ConnectionRejection::WouldCreateCycle {
                    source_label: "Process B".to_string(),
                    target_label: "Start Node".to_string(),
                },
            ),
        ];
        for (source, target, expected) in cases {
            let outcome = editor.connect(source, target).unwrap();
            assert_eq!(outcome, ConnectOutcome::Rejected(expected));
        }

        assert_eq!(editor.edges(), edges_before.as_slice());
        assert_eq!(editor.history.undo_len(), undo_steps_before);
        let events = sink.events();
        assert_eq!(events.len(), 4);
        assert!(events
            .iter()
            .all(|e| matches!(e, EditorEvent::ConnectionRejected { .. })));
    }

    #[test]
    fn test_cycle_rejection_message() {
        let rejection = ConnectionRejection::WouldCreateCycle {
            source_label: "B".to_string(),
            target_label: "A".to_string(),
        };
        assert_eq!(
            rejection.to_string(),
            "Cannot create connection from \"B\" to \"A\": This would create a cycle in the graph."
        );
    }

    #[test]
    fn test_edge_id_collision_gets_suffix() {
        let graph = GraphBuilder::new()
            .add_node("1", "A", (0.0, 0.0))
            .add_node("2", "B", (0.0, 0.0))
            .add_node("3", "C", (0.0, 0.0))
            .add_edge_with_id("e1-2", "3", "2")
            .build();
        let mut editor = DagEditor::from_graph(EditorConfig::default(), graph.nodes, graph.edges);

        let outcome = editor.connect("1", "2").unwrap();
        assert_eq!(outcome, ConnectOutcome::Connected("e1-2-2".to_string()));
    }

    #[test]
    fn test_delete_node_cascades_edges() {
        let mut editor = sample_editor();
        editor.delete_node("1").unwrap();

        assert_eq!(editor.nodes().len(), 2);
        assert!(editor.edges().is_empty());
        assert!(matches!(
            editor.delete_node("1"),
            Err(DagEngineError::NodeNotFound(_))
        ));
    }

    #[test]
    fn test_delete_edge() {
        let mut editor = sample_editor();
        editor.delete_edge("e1-2").unwrap();
        assert_eq!(editor.edges().len(), 1);
        assert!(matches!(
            editor.delete_edge("e1-2"),
            Err(DagEngineError::EdgeNotFound(_))
        ));
    }

    #[test]
    fn test_delete_selected() {
        let mut editor = sample_editor();
        assert!(!editor.delete_selected().unwrap());

        editor.select_node("2").unwrap();
        editor.select_edge("e1-3").unwrap();
        assert!(editor.delete_selected().unwrap());

        assert_eq!(editor.nodes().len(), 2);
        assert!(editor.edges().is_empty());
    }

    #[test]
    fn test_clear_selection() {
        let mut editor = sample_editor();
        editor.select_node("1").unwrap();
        editor.select_edge("e1-2").unwrap();
        editor.clear_selection();
        assert!(!editor.delete_selected().unwrap());
    }

    #[test]
    fn test_duplicate_node() {
        let mut editor = sample_editor();
        let id = editor.duplicate_node("2").unwrap();
        let copy = editor.find_node(&id).unwrap();

        assert_eq!(copy.data.label, "Process A Copy");
        assert_eq!(copy.position, Position::new(150.0, 175.0));
        assert_eq!(editor.edges().len(), 2);
    }

    #[test]
    fn test_update_label_and_move_are_undoable() {
        let mut editor = sample_editor();
        editor.update_label("2", "Renamed").unwrap();
        editor.move_node("2", Position::new(5.0, 5.0)).unwrap();

        editor.undo().unwrap();
        assert_eq!(editor.find_node("2").unwrap().position, Position::new(100.0, 125.0));
        editor.undo().unwrap();
        assert_eq!(editor.find_node("2").unwrap().data.label, "Process A");
    }

    #[test]
    fn test_undo_redo_round_trip() {
        let mut editor = sample_editor();
        let original = editor.snapshot();

        editor.connect("2", "3").unwrap();
        let connected = editor.snapshot();

        assert!(editor.undo().unwrap());
        assert_eq!(editor.snapshot(), original);
        assert!(editor.can_redo());

        assert!(editor.redo().unwrap());
        assert_eq!(editor.snapshot(), connected);
        assert!(!editor.redo().unwrap());
    }

    #[test]
    fn test_new_edit_after_undo_clears_redo() {
        let mut editor = sample_editor();
        editor.add_node(Position::default()).unwrap();
        editor.undo().unwrap();
        assert!(editor.can_redo());

        editor.add_node(Position::default()).unwrap();
        assert!(!editor.can_redo());
    }

    #[test]
    fn test_undo_does_not_reuse_ids() {
        let mut editor = sample_editor();
        editor.add_node(Position::default()).unwrap();
        editor.undo().unwrap();
        let id = editor.add_node(Position::default()).unwrap();
        assert_eq!(id, "5");
    }

    #[test]
    fn test_clear_and_undo() {
        let mut editor = sample_editor();
        assert!(editor.clear().unwrap());
        assert!(editor.nodes().is_empty());
        assert_eq!(editor.validation().warnings, vec!["Graph is empty"]);
        assert!(!editor.clear().unwrap());

        editor.undo().unwrap();
        assert_eq!(editor.nodes().len(), 3);
    }

    #[test]
    fn test_apply_layout() {
        let sink = Arc::new(VecEventSink::new());
        let mut editor = sample_editor().with_event_sink(sink.clone());
        let edges_before = editor.edges().to_vec();

        editor.apply_layout(LayoutDirection::TopDown).unwrap();

        assert_eq!(editor.edges(), edges_before.as_slice());
        let root = editor.find_node("1").unwrap();
        let child = editor.find_node("2").unwrap();
        assert!(root.position.y < child.position.y);
        assert!(sink.events().contains(&EditorEvent::LayoutApplied {
            direction: LayoutDirection::TopDown
        }));

        editor.undo().unwrap();
        assert_eq!(editor.find_node("1").unwrap().position, Position::new(250.0, 25.0));
    }

    #[test]
    fn test_apply_layout_gates() {
        let mut editor = DagEditor::default();
        assert!(matches!(
            editor.apply_layout(LayoutDirection::TopDown),
            Err(DagEngineError::EmptyGraph)
        ));

        let cyclic = GraphBuilder::new()
            .add_node("1", "A", (0.0, 0.0))
            .add_node("2", "B", (0.0, 0.0))
            .connect("1", "2")
            .connect("2", "1")
            .build();
        editor.load_graph(cyclic.nodes, cyclic.edges).unwrap();
        let undo_steps = editor.history.undo_len();

        match editor.apply_layout(LayoutDirection::LeftRight) {
            Err(DagEngineError::CyclicGraph(path)) => assert_eq!(path, "A → B"),
            other => panic!("Expected CyclicGraph, got {:?}", other.map(|_| ())),
        }
        assert_eq!(editor.history.undo_len(), undo_steps);
    }

    #[test]
    fn test_load_reports_problems_without_blocking() {
        let mut editor = DagEditor::default();
        let json = r#"{
            "nodes": [
                {"id": "7", "position": {"x": 0, "y": 0}, "data": {"label": "A"}},
                {"id": "9", "position": {"x": 0, "y": 0}, "data": {"label": "B"}}
            ],
            "edges": [],
            "timestamp": "2024-01-01T00:00:00Z"
        }"#;

        editor.load_json(json).unwrap();
        assert_eq!(editor.nodes().len(), 2);
        assert!(!editor.validation().is_valid);

        let id = editor.add_node(Position::default()).unwrap();
        assert_eq!(id, "10");
    }

    #[test]
    fn test_export_and_reload_file() {
        let _ = env_logger::builder().is_test(true).try_init();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.json");

        let editor = sample_editor();
        editor.save_to_path(&path).unwrap();

        let mut reloaded = DagEditor::default();
        reloaded.load_from_path(&path).unwrap();
        assert_eq!(reloaded.snapshot(), editor.snapshot());
        assert_eq!(reloaded.validation(), editor.validation());
    }

    #[test]
    fn test_events_follow_changes() {
        let sink = Arc::new(VecEventSink::new());
        let mut editor = DagEditor::default().with_event_sink(sink.clone());

        editor.add_node(Position::default()).unwrap();

        let events = sink.events();
        assert_eq!(
            events[0],
            EditorEvent::GraphChanged {
                node_count: 1,
                edge_count: 0
            }
        );
        assert!(matches!(events[1], EditorEvent::ValidationChanged { .. }));
        assert_eq!(
            events[2],
            EditorEvent::HistoryChanged {
                can_undo: true,
                can_redo: false
            }
        );
    }

    #[test]
    fn test_add_node_after_largest_possible_id() {
        let max_id = u64::MAX.to_string();
        let nodes = vec![GraphNode::new(max_id.clone(), "Last", Position::default())];
        let mut editor = DagEditor::from_graph(EditorConfig::default(), nodes, Vec::new());

        assert_eq!(editor.add_node(Position::default()).unwrap(), "1");
        assert_eq!(editor.add_node(Position::default()).unwrap(), "2");
        assert!(editor.find_node(&max_id).is_some());
        assert_eq!(editor.nodes().len(), 3);
    }

    fn graph_with_repeated_ids() -> DagEditor {
        let graph = GraphBuilder::new()
            .add_node("1", "A", (0.0, 0.0))
            .add_node("1", "B", (0.0, 0.0))
            .add_node("2", "C", (0.0, 0.0))
            .add_edge_with_id("e", "1", "2")
            .add_edge_with_id("e", "2", "1")
            .build();
        let mut editor = DagEditor::default();
        editor.load_graph(graph.nodes, graph.edges).unwrap();
        editor
    }

    #[test]
    fn test_load_reports_repeated_ids() {
        let editor = graph_with_repeated_ids();
        let errors = &editor.validation().errors;
        assert!(errors.contains(&"Duplicate node ids: 1".to_string()));
        assert!(errors.contains(&"Duplicate connection ids: e".to_string()));
    }

    #[test]
    fn test_delete_edge_removes_every_repeat() {
        let mut editor = graph_with_repeated_ids();
        editor.delete_edge("e").unwrap();
        assert!(editor.edges().is_empty());
        assert!(!editor
            .validation()
            .errors
            .iter()
            .any(|e| e.starts_with("Duplicate connection ids")));
    }

    #[test]
    fn test_delete_node_removes_every_repeat() {
        let mut editor = graph_with_repeated_ids();
        editor.delete_node("1").unwrap();

        let ids: Vec<&str> = editor.nodes().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["2"]);
        assert!(editor.edges().is_empty());

        editor.undo().unwrap();
        assert_eq!(editor.nodes().len(), 3);
    }

    #[test]
    fn test_select_node_marks_every_repeat() {
        let mut editor = graph_with_repeated_ids();
        editor.select_node("1").unwrap();
        assert!(editor.delete_selected().unwrap());
        assert_eq!(editor.nodes().len(), 1);
    }

    #[test]
    fn test_apply_default_layout_uses_configured_direction() {
        let mut config = EditorConfig::default();
        config.layout.direction = LayoutDirection::LeftRight;
        config.center_after_layout = false;
        let graph = GraphBuilder::new()
            .add_node("1", "A", (0.0, 0.0))
            .add_node("2", "B", (0.0, 0.0))
            .connect("1", "2")
            .build();
        let sink = Arc::new(VecEventSink::new());
        let mut editor =
            DagEditor::from_graph(config, graph.nodes, graph.edges).with_event_sink(sink.clone());

        editor.apply_default_layout().unwrap();

        let a = editor.find_node("1").unwrap();
        let b = editor.find_node("2").unwrap();
        assert!(a.position.x < b.position.x);
        assert_eq!(a.position.y, b.position.y);
        assert_eq!(a.source_position, Some(crate::types::HandleSide::Right));
        assert!(sink.events().contains(&EditorEvent::LayoutApplied {
            direction: LayoutDirection::LeftRight
        }));
    }

    struct ClosedSink;

    impl EventSink for ClosedSink {
        fn send(&self, _event: EditorEvent) -> std::result::Result<(), EventError> {
            Err(EventError::channel_closed())
        }
    }

    #[test]
    fn test_closed_event_sink_does_not_fail_edits() {
        let mut editor = sample_editor().with_event_sink(Arc::new(ClosedSink));

        let outcome = editor.connect("2", "3").unwrap();
        assert!(outcome.is_connected());
        assert!(!editor.connect("2", "3").unwrap().is_connected());
        assert_eq!(editor.edges().len(), 3);
    }

    #[test]
    fn test_to_document() {
        let doc = sample_editor().to_document("Sample");
        assert_eq!(doc.name, "Sample");
        assert_eq!(doc.nodes.len(), 3);
        assert_eq!(doc.edges.len(), 2);
    }
}
