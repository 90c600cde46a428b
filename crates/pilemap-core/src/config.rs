//! Startup configuration of an editor session.

use crate::quota::CategoryTable;
use kurbo::Size;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {message}")]
    Io { path: String, message: String },
    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Whether the user may edit the scene or only look at it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityMode {
    #[default]
    Interactive,
    /// Panning only.
    ReadOnly,
}

/// Everything an editor needs to know before the first load starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Document id passed to the load and persistence channels.
    pub document_id: String,
    /// Category list as `id,name,capacity` triples separated by `;`.
    pub types: String,
    pub capability: CapabilityMode,
    /// Label to highlight; every other pile is drawn muted.
    pub highlight: Option<String>,
    /// Label to select and center on after loading.
    pub focus: Option<String>,
    /// Design mode shifts the canvas to a fixed origin once the background
    /// has loaded.
    pub design: bool,
    pub viewport: Size,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            document_id: "default".to_string(),
            types: String::new(),
            capability: CapabilityMode::Interactive,
            highlight: None,
            focus: None,
            design: false,
            viewport: Size::new(800.0, 600.0),
        }
    }
}

impl EditorConfig {
    pub fn new(types: impl Into<String>) -> Self {
        Self {
            types: types.into(),
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json(&json)
    }

    pub fn with_document_id(mut self, id: impl Into<String>) -> Self {
        self.document_id = id.into();
        self
    }

    pub fn with_capability(mut self, capability: CapabilityMode) -> Self {
        self.capability = capability;
        self
    }

    pub fn with_highlight(mut self, label: impl Into<String>) -> Self {
        self.highlight = Some(label.into());
        self
    }

    pub fn with_focus(mut self, label: impl Into<String>) -> Self {
        self.focus = Some(label.into());
        self
    }

    pub fn with_design(mut self, design: bool) -> Self {
        self.design = design;
        self
    }

    pub fn with_viewport(mut self, viewport: Size) -> Self {
        self.viewport = viewport;
        self
    }

    /// Parsed category table.
    pub fn categories(&self) -> CategoryTable {
        CategoryTable::parse(&self.types)
    }

    pub fn is_read_only(&self) -> bool {
        self.capability == CapabilityMode::ReadOnly
    }

    /// Highlight label, lowercased for comparison. Blank counts as unset.
    pub fn highlight_key(&self) -> Option<String> {
        normalized(self.highlight.as_deref())
    }

    /// Focus label, lowercased for comparison. Blank counts as unset.
    pub fn focus_key(&self) -> Option<String> {
        normalized(self.focus.as_deref())
    }
}

fn normalized(label: Option<&str>) -> Option<String> {
    label
        .map(|text| text.trim().to_lowercase())
        .filter(|text| !text.is_empty())
}
