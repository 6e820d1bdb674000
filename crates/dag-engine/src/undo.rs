//! Undo/redo system using compressed snapshots
//!
//! The history holds two stacks of compressed immutable graph snapshots.
//! `past` holds states to return to on undo, `future` holds states to
//! return to on redo; both are oldest first.
//!
//! Undo and redo are exact inverses: undoing pushes the live state onto
//! `future`, so a following redo restores precisely what the undo replaced.

use std::collections::VecDeque;

use crate::error::{DagEngineError, Result};
use crate::types::{GraphEdge, GraphNode, GraphSnapshot};

/// zstd level used for snapshots
const COMPRESSION_LEVEL: i32 = 3;

/// Undo/redo stack using compressed snapshots
#[derive(Debug, Default)]
pub struct UndoStack {
    /// Compressed states reachable by undo, oldest first
    past: VecDeque<Vec<u8>>,
    /// Compressed states reachable by redo, oldest first
    future: Vec<Vec<u8>>,
    /// Maximum number of undo steps kept (unbounded when `None`)
    limit: Option<usize>,
}

impl UndoStack {
    /// Create an unbounded undo stack
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an undo stack keeping at most `max_snapshots` undo steps
    pub fn with_limit(max_snapshots: usize) -> Self {
        Self {
            limit: Some(max_snapshots.max(1)),
            ..Self::default()
        }
    }

    /// Record the pre-mutation state
    ///
    /// Call before applying any change. This clears the redo history.
    pub fn take_snapshot(&mut self, nodes: &[GraphNode], edges: &[GraphEdge]) -> Result<()> {
        let compressed = compress(&GraphSnapshot::capture(nodes, edges))?;

        self.past.push_back(compressed);
        self.future.clear();

        if let Some(limit) = self.limit {
            while self.past.len() > limit {
                self.past.pop_front();
            }
        }

        log::trace!("History snapshot taken ({} undo steps)", self.past.len());
        Ok(())
    }

    /// Undo: step back one snapshot
    ///
    /// `nodes`/`edges` are the live state, kept for redo. Returns the state
    /// to apply, or `None` if there is nothing to undo. On error both stacks
    /// are left untouched.
    pub fn undo(
        &mut self,
        nodes: &[GraphNode],
        edges: &[GraphEdge],
    ) -> Result<Option<GraphSnapshot>> {
        let Some(compressed) = self.past.back() else {
            return Ok(None);
        };
        let previous = decompress(compressed)?;
        let current = compress(&GraphSnapshot::capture(nodes, edges))?;

        self.past.pop_back();
        self.future.push(current);
        Ok(Some(previous))
    }

    /// Redo: step forward one snapshot
    ///
    /// Mirror image of [`UndoStack::undo`].
    pub fn redo(
        &mut self,
        nodes: &[GraphNode],
        edges: &[GraphEdge],
    ) -> Result<Option<GraphSnapshot>> {
        let Some(compressed) = self.future.last() else {
            return Ok(None);
        };
        let next = decompress(compressed)?;
        let current = compress(&GraphSnapshot::capture(nodes, edges))?;

        self.future.pop();
        self.past.push_back(current);
        Ok(Some(next))
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    /// Number of available undo steps
    pub fn undo_len(&self) -> usize {
        self.past.len()
    }

    /// Number of available redo steps
    pub fn redo_len(&self) -> usize {
        self.future.len()
    }

    /// Drop all history
    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }

    /// Get the total compressed size of all snapshots
    pub fn compressed_size(&self) -> usize {
        self.past.iter().chain(self.future.iter()).map(Vec::len).sum()
    }
}

fn compress(snapshot: &GraphSnapshot) -> Result<Vec<u8>> {
    let json = serde_json::to_vec(snapshot)?;
    zstd::encode_all(&json[..], COMPRESSION_LEVEL)
        .map_err(|e| DagEngineError::Compression(e.to_string()))
}

fn decompress(compressed: &[u8]) -> Result<GraphSnapshot> {
    let json = zstd::decode_all(compressed)
        .map_err(|e| DagEngineError::Compression(e.to_string()))?;
    Ok(serde_json::from_slice(&json)?)
}
