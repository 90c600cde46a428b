//! Document snapshots and the checks that gate persistence.

use crate::error::{EditorError, EditorResult};
use crate::quota::{Category, CategoryTable};
use crate::scene::PileRecord;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// How strict a save is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SaveKind {
    /// "Save": labels must be valid, unfinished categories only warn.
    Partial,
    /// "Commit": every category must be complete as well.
    Final,
}

/// Serializable document handed to the persistence channel.
///
/// The envelope keeps whatever the load channel delivered, untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    #[serde(flatten)]
    pub envelope: Map<String, Value>,
    #[serde(rename = "Items")]
    pub items: Vec<PileRecord>,
    /// Category list; drawn counts are never serialized.
    #[serde(rename = "Types")]
    pub types: Vec<Category>,
}

impl DocumentSnapshot {
    pub fn new(envelope: &Map<String, Value>, items: Vec<PileRecord>, categories: &CategoryTable) -> Self {
        let mut envelope = envelope.clone();
        envelope.remove("Items");
        envelope.remove("Types");
        Self {
            envelope,
            items,
            types: categories.iter().cloned().collect(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// A request to persist a validated snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveRequest {
    /// Sequence number; responses are matched back by it.
    pub id: u64,
    pub kind: SaveKind,
    pub document: DocumentSnapshot,
}

/// Fail on the first pile (in order) whose label is empty or shared with a
/// different pile. Labels compare case-sensitively.
pub fn validate_names(items: &[PileRecord]) -> EditorResult<()> {
    let mut owners: HashMap<&str, usize> = HashMap::new();
    for item in items {
        *owners.entry(item.label.as_str()).or_default() += 1;
    }
    match items
        .iter()
        .find(|item| item.label.is_empty() || owners.get(item.label.as_str()).is_some_and(|n| *n > 1))
    {
        Some(offender) => Err(EditorError::DuplicateOrEmptyName {
            pile: offender.id.clone(),
            label: offender.label.clone(),
        }),
        None => Ok(()),
    }
}

/// Fail on the first category, in configuration order, that still has
/// piles left to draw.
pub fn validate_completion(categories: &CategoryTable) -> EditorResult<()> {
    match categories.first_incomplete() {
        Some(category) => Err(EditorError::IncompleteCategory {
            category: category.name.clone(),
            remaining: category.remaining(),
        }),
        None => Ok(()),
    }
}

/// Decide whether a snapshot may be persisted.
///
/// `Ok(None)` means persist cleanly, `Ok(Some(warning))` means persist but
/// tell the user, and `Err` blocks persistence.
pub fn check(kind: SaveKind, items: &[PileRecord], categories: &CategoryTable) -> EditorResult<Option<EditorError>> {
    validate_names(items)?;
    match (validate_completion(categories), kind) {
        (Ok(()), _) => Ok(None),
        (Err(incomplete), SaveKind::Partial) => Ok(Some(incomplete)),
        (Err(incomplete), SaveKind::Final) => Err(incomplete),
    }
}
