//! Editor configuration
//!
//! Every field has a default so partial JSON files load cleanly.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::defaults;
use crate::error::Result;
use crate::layout::LayoutOptions;

/// Editor behaviour settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorConfig {
    /// Spacing for auto-layout, and the direction used by `apply_default_layout`
    pub layout: LayoutOptions,
    /// Maximum undo steps kept; unbounded when absent
    pub history_limit: Option<usize>,
    /// Offset applied on both axes when duplicating a node
    pub duplicate_offset: f64,
    /// Re-center the graph after every auto-layout
    pub center_after_layout: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            layout: LayoutOptions::default(),
            history_limit: None,
            duplicate_offset: defaults::DUPLICATE_OFFSET,
            center_after_layout: true,
        }
    }
}

impl EditorConfig {
    /// Parse a configuration from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a configuration file, falling back to defaults when it is missing
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::info!("No editor config at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Write the configuration as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
