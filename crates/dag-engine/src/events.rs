//! Event types for editor state changes
//!
//! Events are sent from the editor to the UI (or any consumer) to report
//! graph changes, the live validation report, rejected connections and
//! history availability.

use serde::{Deserialize, Serialize};

use crate::layout::LayoutDirection;
use crate::validation::ValidationResult;

/// Trait for sending editor events
///
/// This abstracts over the transport mechanism (UI channel, mpsc, etc.)
/// so the editor can be driven from different front ends.
pub trait EventSink: Send + Sync {
    /// Send an event
    ///
    /// Returns an error if the event could not be sent (e.g., channel closed)
    fn send(&self, event: EditorEvent) -> Result<(), EventError>;
}

/// Error when sending events fails
#[derive(Debug, Clone)]
pub struct EventError {
    pub message: String,
}

impl std::fmt::Display for EventError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Event error: {}", self.message)
    }
}

impl std::error::Error for EventError {}

impl EventError {
    pub fn channel_closed() -> Self {
        Self {
            message: "Channel closed".to_string(),
        }
    }
}

/// Events emitted by the editor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EditorEvent {
    /// Nodes or edges changed
    #[serde(rename_all = "camelCase")]
    GraphChanged { node_count: usize, edge_count: usize },

    /// The live validation report was recomputed
    #[serde(rename_all = "camelCase")]
    ValidationChanged { result: ValidationResult },

    /// A connection attempt was refused before any mutation
    #[serde(rename_all = "camelCase")]
    ConnectionRejected {
        source: String,
        target: String,
        reason: String,
    },

    /// Auto-layout was applied
    #[serde(rename_all = "camelCase")]
    LayoutApplied { direction: LayoutDirection },

    /// Undo/redo availability after a change
    #[serde(rename_all = "camelCase")]
    HistoryChanged { can_undo: bool, can_redo: bool },
}

/// A no-op event sink that discards all events
///
/// Useful for testing or when events aren't needed.
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn send(&self, _event: EditorEvent) -> Result<(), EventError> {
        Ok(())
    }
}

/// A vector-based event sink that collects events
///
/// Useful for testing to verify events were emitted correctly.
pub struct VecEventSink {
    events: parking_lot::Mutex<Vec<EditorEvent>>,
}

impl VecEventSink {
    pub fn new() -> Self {
        Self {
            events: parking_lot::Mutex::new(Vec::new()),
        }
    }

    /// Get all collected events
    pub fn events(&self) -> Vec<EditorEvent> {
        self.events.lock().clone()
    }

    /// Clear all collected events
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl Default for VecEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for VecEventSink {
    fn send(&self, event: EditorEvent) -> Result<(), EventError> {
        self.events.lock().push(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_event_sink() {
        let sink = VecEventSink::new();

        sink.send(EditorEvent::GraphChanged {
            node_count: 2,
            edge_count: 1,
        })
        .unwrap();

        let events = sink.events();
        assert_eq!(events.len(), 1);

        match &events[0] {
            EditorEvent::GraphChanged { node_count, .. } => assert_eq!(*node_count, 2),
            _ => panic!("Expected GraphChanged event"),
        }

        sink.clear();
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_null_event_sink() {
        let sink = NullEventSink;
        // Should not panic
        sink.send(EditorEvent::HistoryChanged {
            can_undo: false,
            can_redo: false,
        })
        .unwrap();
    }

    #[test]
    fn test_event_tagging() {
        let value = serde_json::to_value(EditorEvent::LayoutApplied {
            direction: LayoutDirection::LeftRight,
        })
        .unwrap();
        assert_eq!(value["type"], "layoutApplied");
        assert_eq!(value["direction"], "LR");
    }
}
