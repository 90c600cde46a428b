//! Per-category quotas ("pile types").
//!
//! Categories are configured once at startup. Only the drawn count changes
//! afterwards, and it is always clamped to `0..=capacity`.

use crate::pile::Scheme;
use serde::{Deserialize, Serialize};

/// A quota bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    /// Maximum number of piles of this category.
    #[serde(rename = "Total")]
    pub capacity: u32,
    /// Piles of this category currently in the scene.
    #[serde(rename = "Count", default, skip_serializing)]
    pub drawn: u32,
    /// Colors given to new piles of this category.
    #[serde(skip, default)]
    pub scheme: Scheme,
}

impl Category {
    pub fn new(id: impl Into<String>, name: impl Into<String>, capacity: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            capacity,
            drawn: 0,
            scheme: Scheme::default(),
        }
    }

    pub fn is_full(&self) -> bool {
        self.drawn >= self.capacity
    }

    /// Piles still to be drawn before the category is complete.
    pub fn remaining(&self) -> u32 {
        self.capacity.saturating_sub(self.drawn)
    }

    /// Parse one `id,name,capacity` entry. A missing or malformed capacity
    /// counts as zero.
    pub fn parse(entry: &str) -> Self {
        let mut fields = entry.split(',');
        let id = fields.next().unwrap_or_default().trim();
        let name = fields.next().unwrap_or_default().trim();
        let capacity = fields.next().map(parse_capacity).unwrap_or(0);
        Self::new(id, name, capacity)
    }
}

/// Whole-field numeric parse: `"12"`, `" 12 "` and `"12.5"` give 12.
/// Anything else, trailing text such as `"12abc"` included, gives 0.
fn parse_capacity(text: &str) -> u32 {
    let text = text.trim();
    if let Ok(n) = text.parse::<u32>() {
        return n;
    }
    match text.parse::<f64>() {
        Ok(n) if n.is_finite() && n > 0.0 => n.min(u32::MAX as f64) as u32,
        _ => 0,
    }
}

/// All configured categories, in configuration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryTable {
    categories: Vec<Category>,
}

impl CategoryTable {
    pub fn new(categories: Vec<Category>) -> Self {
        Self { categories }
    }

    /// Parse a `;`-separated list of `id,name,capacity` triples. Each
    /// category gets the built-in scheme for its position.
    pub fn parse(config: &str) -> Self {
        let categories = config
            .split(';')
            .filter(|entry| !entry.trim().is_empty())
            .enumerate()
            .map(|(index, entry)| {
                let mut category = Category::parse(entry);
                category.scheme = Scheme::palette(index);
                category
            })
            .collect();
        Self { categories }
    }

    pub fn get(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Category> {
        self.categories.iter_mut().find(|c| c.id == id)
    }

    /// Add `delta` to a category's drawn count, clamped to `0..=capacity`.
    /// Unknown categories are ignored.
    pub fn increment(&mut self, id: &str, delta: i64) {
        if let Some(category) = self.get_mut(id) {
            let next = (category.drawn as i64 + delta).clamp(0, category.capacity as i64);
            category.drawn = next as u32;
        }
    }

    pub fn decrement(&mut self, id: &str, delta: i64) {
        self.increment(id, -delta);
    }

    /// Whether a category has reached its capacity. Unknown categories
    /// count as full so nothing can be created against them.
    pub fn is_full(&self, id: &str) -> bool {
        self.get(id).is_none_or(Category::is_full)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Sum of drawn counts.
    pub fn drawn_total(&self) -> u32 {
        self.categories.iter().map(|c| c.drawn).sum()
    }

    /// Sum of capacities.
    pub fn capacity_total(&self) -> u32 {
        self.categories.iter().map(|c| c.capacity).sum()
    }

    /// First category, in configuration order, that is not yet complete.
    pub fn first_incomplete(&self) -> Option<&Category> {
        self.categories.iter().find(|c| c.drawn < c.capacity)
    }
}
