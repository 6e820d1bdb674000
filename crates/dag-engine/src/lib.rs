//! DAG Engine - consistency, layout and history core for the graph editor
//!
//! This crate keeps a user-edited directed graph acyclic and well formed.
//! It provides:
//!
//! - Connection checks and cycle prevention before an edge is added
//! - A full validation report (cycles, isolated nodes, flow hints)
//! - Layered auto-layout in four directions, plus re-centering
//! - Compressed snapshot-based undo/redo
//!
//! # Architecture
//!
//! - `validation`: pure functions over node and edge slices
//! - `layout`: pure layered placement producing new node positions
//! - `UndoStack`: zstd-compressed immutable snapshots
//! - `DagEditor`: gates each action, snapshots, mutates, then revalidates
//! - `EventSink`: generic event streaming (not tied to any UI)
//!
//! # Example
//!
//! ```ignore
//! use dag_engine::{DagEditor, EditorConfig, LayoutDirection, Position};
//!
//! let mut editor = DagEditor::new(EditorConfig::default());
//! let a = editor.add_node(Position::new(0.0, 0.0))?;
//! let b = editor.add_node(Position::new(0.0, 100.0))?;
//! editor.connect(&a, &b)?;
//! editor.apply_layout(LayoutDirection::LeftRight)?;
//! assert!(editor.validation().is_valid);
//! ```

pub mod builder;
pub mod config;
pub mod constants;
pub mod editor;
pub mod error;
pub mod events;
pub mod layout;
pub mod types;
pub mod undo;
pub mod validation;

// Re-export key types
pub use builder::GraphBuilder;
pub use config::EditorConfig;
pub use editor::{ConnectOutcome, ConnectionRejection, DagEditor, GraphExport};
pub use error::{DagEngineError, Result};
pub use events::{EditorEvent, EventError, EventSink, NullEventSink, VecEventSink};
pub use layout::{
    center_layout, compute_layout, layout_bounds, LayoutBounds, LayoutDirection, LayoutOptions,
    LayoutResult,
};
pub use types::{
    EdgeId, GraphDocument, GraphEdge, GraphNode, GraphSnapshot, HandleSide, NodeData, NodeId,
    Position,
};
pub use undo::UndoStack;
pub use validation::{
    detect_cycles, find_cycle_path, get_graph_stats, get_isolated_nodes, get_node_connections,
    validate_connection, validate_dag, GraphStats, NodeConnections, ValidationResult,
    ValidationStatus,
};
