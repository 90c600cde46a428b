//! Editor events and the subscriber list that distributes them.
//!
//! Everything the editor wants the outside world to know about (status
//! text, counters, messages, navigation, persistence requests) is published
//! as an [`EditorEvent`]. Hosts subscribe once and react to the variants
//! they care about.

use crate::editor::ModeKind;
use crate::error::ErrorKind;
use crate::pile::PileId;
use crate::quota::CategoryTable;
use crate::validation::SaveRequest;
use kurbo::Vec2;
use std::fmt;
use uuid::Uuid;

/// Drawn count of one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryCount {
    pub id: String,
    pub name: String,
    pub drawn: u32,
    pub capacity: u32,
}

/// Running counters for the status display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountSnapshot {
    pub drawn_total: u32,
    pub capacity_total: u32,
    pub categories: Vec<CategoryCount>,
}

impl CountSnapshot {
    pub fn from_table(table: &CategoryTable) -> Self {
        Self {
            drawn_total: table.drawn_total(),
            capacity_total: table.capacity_total(),
            categories: table
                .iter()
                .map(|c| CategoryCount {
                    id: c.id.clone(),
                    name: c.name.clone(),
                    drawn: c.drawn,
                    capacity: c.capacity,
                })
                .collect(),
        }
    }
}

/// Notifications published by the editor.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    /// Update the status text slots. `None` leaves a slot unchanged.
    Status {
        info: Option<String>,
        detail: Option<String>,
    },
    /// Drawn counts changed.
    Counts(CountSnapshot),
    /// A transient message for the user, tagged with an error kind when it
    /// reports a failure.
    Message {
        text: String,
        kind: Option<ErrorKind>,
    },
    ModeChanged {
        from: ModeKind,
        to: ModeKind,
    },
    SelectionChanged(Option<PileId>),
    /// The camera was recentred on a pile.
    Navigated {
        pile: PileId,
        offset: Vec2,
    },
    /// Piles were added, removed or changed.
    SceneChanged,
    /// The label editor opened over a pile, pre-filled with `text`.
    LabelEditorOpened {
        pile: PileId,
        text: String,
    },
    LabelEditorClosed,
    /// The search overlay's result cursor changed.
    SearchUpdated {
        current: usize,
        total: usize,
        prompt: String,
    },
    SearchVisibility(bool),
    /// A validated document should be handed to the persistence channel.
    SaveRequested(SaveRequest),
    /// Every outstanding load finished; the scene is interactive.
    Ready,
}

/// Subscription handle for unsubscribing from events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sub({})", &self.0.to_string()[..8])
    }
}

type EventHandler = Box<dyn FnMut(&EditorEvent)>;

/// Ordered list of event subscribers.
///
/// The editor is single-threaded, so handlers are plain `FnMut` closures
/// called synchronously in subscription order.
#[derive(Default)]
pub struct EventBus {
    handlers: Vec<(SubscriptionId, EventHandler)>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.handlers.len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, handler: impl FnMut(&EditorEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId::new();
        self.handlers.push((id, Box::new(handler)));
        log::debug!("Added event subscriber {}", id);
        id
    }

    /// Remove a subscriber. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(sub, _)| *sub != id);
        self.handlers.len() != before
    }

    pub fn publish(&mut self, event: EditorEvent) {
        for (_, handler) in &mut self.handlers {
            handler(&event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.handlers.len()
    }
}
