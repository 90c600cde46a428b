//! Model of the status display: two text slots plus drawn counters.

use crate::editor::Editor;
use crate::events::{CountSnapshot, EditorEvent};
use std::cell::RefCell;
use std::rc::Rc;

pub const INFO_READY: &str = "Ready";
pub const INFO_DRAW: &str = "Draw mode";
pub const INFO_MOVE: &str = "Move mode";
pub const INFO_COPY: &str = "Copy mode";
pub const INFO_PAN: &str = "Pan mode";
pub const INFO_NUDGE: &str = "Nudge mode";
pub const INFO_DELETED: &str = "Deleted";
pub const INFO_SAVE: &str = "Saving";
pub const INFO_SAVE_DONE: &str = "Save finished";
pub const DETAIL_SAVING: &str = "Saving data";
pub const DETAIL_SAVED: &str = "Saved";
pub const DETAIL_SAVE_FAILED: &str = "Save failed";

/// What the status bar currently shows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusBoard {
    pub info: String,
    pub detail: String,
    pub counts: CountSnapshot,
    /// Latest user-facing message.
    pub last_message: Option<String>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a fresh board to `editor` and seed it with the current
    /// counts.
    pub fn attach(editor: &mut Editor) -> Rc<RefCell<Self>> {
        let board = Rc::new(RefCell::new(Self::new()));
        let sink = Rc::clone(&board);
        editor.subscribe(move |event| sink.borrow_mut().apply(event));
        editor.refresh_counts();
        board
    }

    pub fn apply(&mut self, event: &EditorEvent) {
        match event {
            EditorEvent::Status { info, detail } => {
                if let Some(info) = info {
                    self.info.clone_from(info);
                }
                if let Some(detail) = detail {
                    self.detail.clone_from(detail);
                }
            }
            EditorEvent::Counts(counts) => self.counts = counts.clone(),
            EditorEvent::Message { text, .. } => self.last_message = Some(text.clone()),
            _ => {}
        }
    }

    /// Overall counter text, e.g. `Piles: 3/10`.
    pub fn total_text(&self) -> String {
        format!("Piles: {}/{}", self.counts.drawn_total, self.counts.capacity_total)
    }

    /// Counter text of one category, e.g. `Bored( 1/2 )`.
    pub fn category_text(&self, id: &str) -> Option<String> {
        self.counts
            .categories
            .iter()
            .find(|c| c.id == id)
            .map(|c| format!("{}( {}/{} )", c.name, c.drawn, c.capacity))
    }
}
