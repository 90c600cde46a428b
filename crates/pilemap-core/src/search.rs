//! Search overlay: a label filter with a paged result cursor.

use crate::pile::PileId;

/// Label search state with a 1-based cursor over the current results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchOverlay {
    visible: bool,
    query: String,
    results: Vec<PileId>,
    /// 1-based; 0 when there are no results.
    current: usize,
}

impl SearchOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&mut self) {
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query(&mut self, text: &str) {
        self.query = text.to_string();
    }

    /// Replace the result set and put the cursor on the first result.
    /// Returns the pile the cursor now points at.
    pub fn set_results(&mut self, results: Vec<PileId>) -> Option<PileId> {
        self.results = results;
        self.current = if self.results.is_empty() { 0 } else { 1 };
        self.selected().cloned()
    }

    /// Advance the cursor. Returns `None` when already on the last result.
    pub fn next(&mut self) -> Option<PileId> {
        if !self.can_next() {
            return None;
        }
        self.current += 1;
        self.selected().cloned()
    }

    /// Step the cursor back. Returns `None` when already on the first result.
    pub fn previous(&mut self) -> Option<PileId> {
        if !self.can_previous() {
            return None;
        }
        self.current -= 1;
        self.selected().cloned()
    }

    pub fn can_next(&self) -> bool {
        self.current < self.results.len()
    }

    pub fn can_previous(&self) -> bool {
        self.current > 1
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// Pile under the cursor.
    pub fn selected(&self) -> Option<&PileId> {
        self.current.checked_sub(1).and_then(|index| self.results.get(index))
    }

    /// Text shown next to the search field.
    pub fn prompt(&self) -> String {
        if self.results.is_empty() {
            "No results".to_string()
        } else {
            format!("{} of {}", self.current, self.results.len())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<PileId> {
        names.iter().map(|n| PileId::from(*n)).collect()
    }

    #[test]
    fn test_cursor_clamps_at_bounds() {
        let mut search = SearchOverlay::new();
        assert_eq!(search.set_results(ids(&["a", "b"])), Some(PileId::from("a")));
        assert_eq!(search.current(), 1);
        assert!(!search.can_previous());
        assert_eq!(search.previous(), None);

        assert_eq!(search.next(), Some(PileId::from("b")));
        assert_eq!(search.current(), 2);
        assert!(!search.can_next());
        assert_eq!(search.next(), None);
        assert_eq!(search.current(), 2);

        assert_eq!(search.previous(), Some(PileId::from("a")));
        assert_eq!(search.prompt(), "1 of 2");
    }

    #[test]
    fn test_empty_results() {
        let mut search = SearchOverlay::new();
        assert_eq!(search.set_results(Vec::new()), None);
        assert_eq!(search.current(), 0);
        assert!(!search.can_next());
        assert!(!search.can_previous());
        assert_eq!(search.prompt(), "No results");
    }

    #[test]
    fn test_visibility_keeps_query() {
        let mut search = SearchOverlay::new();
        search.show();
        search.set_query("p-0");
        search.hide();
        assert!(!search.is_visible());
        assert_eq!(search.query(), "p-0");
    }
}
