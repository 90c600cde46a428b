//! Scene store: the placed piles and the category quotas they draw from.

use crate::pile::{Pile, PileGeometry, PileId, Scheme};
use crate::quota::CategoryTable;
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Serializable projection of one pile, as exchanged with the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PileRecord {
    #[serde(rename = "Id", alias = "id")]
    pub id: PileId,
    #[serde(rename = "Name", alias = "label", default)]
    pub label: String,
    #[serde(rename = "Type", alias = "categoryId")]
    pub category_id: String,
    /// JSON text of the pile's [`PileGeometry`].
    #[serde(rename = "Info", alias = "geometry")]
    pub geometry: String,
}

/// Outcome of [`Scene::import_data`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
}

/// All piles of the open document plus the category quotas.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    piles: HashMap<PileId, Pile>,
    /// Insertion order (oldest first).
    order: Vec<PileId>,
    categories: CategoryTable,
}

impl Scene {
    pub fn new(categories: CategoryTable) -> Self {
        Self {
            piles: HashMap::new(),
            order: Vec::new(),
            categories,
        }
    }

    pub fn categories(&self) -> &CategoryTable {
        &self.categories
    }

    pub fn categories_mut(&mut self) -> &mut CategoryTable {
        &mut self.categories
    }

    /// Create a pile, counting it against its category.
    ///
    /// Returns `None` without touching anything when the category is full
    /// or unknown.
    pub fn add_pile(&mut self, category: &str, center: Point, diameter: f64, scheme: Scheme) -> Option<PileId> {
        if self.categories.is_full(category) {
            return None;
        }
        let pile = Pile::new(category, center, diameter, scheme);
        let id = pile.id().clone();
        self.insert(pile);
        self.categories.increment(category, 1);
        Some(id)
    }

    /// Delete a pile and release its quota slot.
    pub fn remove_pile(&mut self, id: &PileId) -> Option<Pile> {
        let pile = self.piles.remove(id)?;
        self.order.retain(|other| other != id);
        self.categories.decrement(pile.category(), 1);
        Some(pile)
    }

    /// Copy a pile with a fresh id and the next label in sequence.
    ///
    /// Returns `None` when the source is gone or its category is full.
    pub fn duplicate_pile(&mut self, id: &PileId) -> Option<PileId> {
        let source = self.piles.get(id)?;
        if self.categories.is_full(source.category()) {
            return None;
        }
        let copy = source.duplicate();
        let copy_id = copy.id().clone();
        let category = copy.category().to_string();
        self.insert(copy);
        self.categories.increment(&category, 1);
        Some(copy_id)
    }

    /// Assign a trimmed label. Returns false when the pile is gone.
    pub fn set_label(&mut self, id: &PileId, text: &str) -> bool {
        match self.piles.get_mut(id) {
            Some(pile) => {
                pile.set_label(text);
                true
            }
            None => false,
        }
    }

    /// Piles whose label contains `query`, ignoring case, in insertion
    /// order. An empty query matches nothing.
    pub fn find_by_label(&self, query: &str) -> Vec<PileId> {
        let needle = query.to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.piles_ordered()
            .filter(|pile| pile.label().to_lowercase().contains(&needle))
            .map(|pile| pile.id().clone())
            .collect()
    }

    /// Serializable projection of every pile, in insertion order.
    pub fn export_all(&self) -> Result<Vec<PileRecord>, serde_json::Error> {
        self.piles_ordered()
            .map(|pile| {
                Ok(PileRecord {
                    id: pile.id().clone(),
                    label: pile.label().to_string(),
                    category_id: pile.category().to_string(),
                    geometry: pile.geometry().to_json()?,
                })
            })
            .collect()
    }

    /// Rebuild piles from exported records.
    ///
    /// Records of unknown categories, records whose geometry does not parse,
    /// and records beyond a category's capacity are skipped so that every
    /// drawn count matches the piles actually present.
    pub fn import_data(&mut self, records: &[PileRecord]) -> ImportSummary {
        let mut summary = ImportSummary::default();
        for record in records {
            let Some(category) = self.categories.get(&record.category_id) else {
                log::debug!("Skipping pile {} of unknown category {:?}", record.id, record.category_id);
                summary.skipped += 1;
                continue;
            };
            if category.is_full() {
                log::warn!(
                    "Skipping pile {}: category {:?} already holds {} piles",
                    record.id,
                    category.name,
                    category.capacity
                );
                summary.skipped += 1;
                continue;
            }
            let geometry = match PileGeometry::from_json(&record.geometry) {
                Ok(geometry) => geometry,
                Err(e) => {
                    log::warn!("Skipping pile {}: bad geometry: {}", record.id, e);
                    summary.skipped += 1;
                    continue;
                }
            };
            if self.piles.contains_key(&record.id) {
                log::warn!("Skipping pile {}: duplicate id", record.id);
                summary.skipped += 1;
                continue;
            }

            let pile = Pile::reconstruct(
                record.id.clone(),
                record.category_id.clone(),
                record.label.clone(),
                geometry,
            );
            self.insert(pile);
            self.categories.increment(&record.category_id, 1);
            summary.imported += 1;
        }
        summary
    }

    pub fn get(&self, id: &PileId) -> Option<&Pile> {
        self.piles.get(id)
    }

    pub fn get_mut(&mut self, id: &PileId) -> Option<&mut Pile> {
        self.piles.get_mut(id)
    }

    pub fn contains(&self, id: &PileId) -> bool {
        self.piles.contains_key(id)
    }

    /// Piles in insertion order (oldest first).
    pub fn piles_ordered(&self) -> impl Iterator<Item = &Pile> {
        self.order.iter().filter_map(|id| self.piles.get(id))
    }

    /// Most recently added pile still in the scene.
    pub fn last_added(&self) -> Option<&PileId> {
        self.order.last()
    }

    /// Topmost pile under a point (later piles sit on top).
    pub fn pile_at(&self, point: Point) -> Option<PileId> {
        self.order
            .iter()
            .rev()
            .find(|id| self.piles.get(*id).is_some_and(|pile| pile.hit_test(point)))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.piles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.piles.is_empty()
    }

    fn insert(&mut self, pile: Pile) {
        self.order.push(pile.id().clone());
        self.piles.insert(pile.id().clone(), pile);
    }
}
