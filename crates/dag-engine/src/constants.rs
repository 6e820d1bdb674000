//! Engine-wide constants
//!
//! Single source of truth for node footprint, spacing and editor defaults.

/// Node footprint used for layout and bounding boxes
pub mod footprint {
    /// Width of a node on the canvas
    pub const NODE_WIDTH: f64 = 172.0;
    /// Height of a node on the canvas
    pub const NODE_HEIGHT: f64 = 60.0;
}

/// Layout spacing defaults
pub mod spacing {
    /// Gap between neighbouring nodes in the same rank
    pub const NODE: f64 = 50.0;
    /// Gap between consecutive ranks
    pub const RANK: f64 = 100.0;
    /// Gap next to edges routed through a rank
    pub const EDGE: f64 = 10.0;
    /// Margin around a computed layout
    pub const LAYOUT_MARGIN: f64 = 20.0;
    /// Margin applied when centering a layout
    pub const CENTER_MARGIN: f64 = 50.0;
}

/// Editor defaults
pub mod defaults {
    /// Renderer type tag for new nodes
    pub const NODE_TYPE: &str = "editableNode";
    /// First id handed out by a fresh editor
    pub const FIRST_NODE_ID: u64 = 1;
    /// Offset applied to duplicated nodes on both axes
    pub const DUPLICATE_OFFSET: f64 = 50.0;
    /// Number of barycenter sweeps during crossing reduction
    pub const ORDERING_PASSES: usize = 4;
}
