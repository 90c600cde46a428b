//! The editor context and its interaction state machine.
//!
//! All mutation enters through [`Editor::dispatch`]. Pointer and keyboard
//! input drive a single [`Mode`]; the outcome of every step is published to
//! subscribers as [`EditorEvent`]s.

use crate::camera::{Camera, DESIGN_CANVAS_ORIGIN};
use crate::config::EditorConfig;
use crate::error::EditorError;
use crate::events::{CountSnapshot, EditorEvent, EventBus, SubscriptionId};
use crate::geometry::{self, Corner, MIN_PILE_SIZE, PileBox};
use crate::handles::{HANDLE_HIT_TOLERANCE, hit_test_handles};
use crate::input::{InputState, Key, KeyEvent, Modifiers, MouseButton, PointerEvent};
use crate::loading::{LoadTask, LoadTracker};
use crate::pile::{PileId, Scheme};
use crate::scene::{ImportSummary, PileRecord, Scene};
use crate::search::SearchOverlay;
use crate::status;
use crate::storage::{LoadResponse, StorageResult};
use crate::validation::{self, DocumentSnapshot, SaveKind, SaveRequest};
use kurbo::{Point, Size, Vec2};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Discriminant of [`Mode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModeKind {
    Idle,
    Panning,
    Drawing,
    MovingShape,
    ResizingShape,
    EditingLabel,
}

/// Current interaction. Exactly one is active at a time.
#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    Idle,
    /// Dragging the camera. `last` is the previous pointer position in
    /// screen coordinates.
    Panning { last: Point },
    /// Growing a new pile from its center.
    Drawing { pile: PileId, center: Point },
    /// Dragging a pile; `press` and `origin` are the document-space press
    /// point and the pile center at that moment.
    MovingShape { pile: PileId, press: Point, origin: Point },
    /// Dragging a corner handle of the selected pile.
    ResizingShape {
        pile: PileId,
        corner: Corner,
        press: Point,
        original: PileBox,
    },
    /// The label editor is open over a pile.
    EditingLabel { pile: PileId, draft: String },
}

impl Mode {
    pub fn kind(&self) -> ModeKind {
        match self {
            Mode::Idle => ModeKind::Idle,
            Mode::Panning { .. } => ModeKind::Panning,
            Mode::Drawing { .. } => ModeKind::Drawing,
            Mode::MovingShape { .. } => ModeKind::MovingShape,
            Mode::ResizingShape { .. } => ModeKind::ResizingShape,
            Mode::EditingLabel { .. } => ModeKind::EditingLabel,
        }
    }
}

/// Everything a host can ask the editor to do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EditorCommand {
    Pointer(PointerEvent),
    Key(KeyEvent),
    SetModifiers(Modifiers),
    SetViewport(Size),
    /// Choose the category new piles are drawn from.
    SelectCategory(String),
    /// Change the scheme of the selected category.
    SetScheme(Scheme),
    SetPanToggle(bool),
    SetCopyToggle(bool),
    /// Delete the selected pile.
    Delete,
    /// Open the label editor on the selected pile.
    EditLabel,
    /// Replace the label editor's text.
    LabelInput(String),
    CommitLabel,
    /// Validate names and persist; unfinished categories only warn.
    Save,
    /// Validate names and completion, then persist.
    Commit,
    OpenSearch,
    SearchInput(String),
    SearchNext,
    SearchPrevious,
    CloseSearch,
    /// Response of the persistence channel for a [`SaveRequest`].
    PersistFinished {
        request_id: u64,
        result: Result<(), String>,
    },
}

impl EditorCommand {
    /// Commands honored while loads are still outstanding.
    fn allowed_while_loading(&self) -> bool {
        matches!(
            self,
            EditorCommand::SetModifiers(_) | EditorCommand::SetViewport(_) | EditorCommand::PersistFinished { .. }
        )
    }

    /// Commands honored in read-only mode. Pointer and key input is further
    /// restricted to panning.
    fn allowed_read_only(&self) -> bool {
        matches!(
            self,
            EditorCommand::Pointer(_)
                | EditorCommand::Key(_)
                | EditorCommand::SetModifiers(_)
                | EditorCommand::SetViewport(_)
                | EditorCommand::SetPanToggle(_)
                | EditorCommand::PersistFinished { .. }
        )
    }
}

/// The editing session: scene, camera, selection, mode and subscribers.
///
/// Single-threaded; hosts keep it on one thread and feed it commands.
#[derive(Debug)]
pub struct Editor {
    config: EditorConfig,
    scene: Scene,
    camera: Camera,
    input: InputState,
    mode: Mode,
    selection: Option<PileId>,
    selected_category: Option<String>,
    pan_toggle: bool,
    copy_toggle: bool,
    search: SearchOverlay,
    /// Loaded piles drawn greyed out because they miss the highlight.
    muted: HashSet<PileId>,
    loads: LoadTracker,
    events: EventBus,
    /// Opaque document fields handed back unchanged on save.
    envelope: Map<String, Value>,
    next_request_id: u64,
    last_persisted: Option<u64>,
}

impl Editor {
    pub fn new(config: EditorConfig) -> Self {
        let categories = config.categories();
        let selected_category = categories.iter().next().map(|c| c.id.clone());
        let mut camera = Camera::new();
        camera.set_viewport(config.viewport);
        Self {
            config,
            scene: Scene::new(categories),
            camera,
            input: InputState::new(),
            mode: Mode::Idle,
            selection: None,
            selected_category,
            pan_toggle: false,
            copy_toggle: false,
            search: SearchOverlay::new(),
            muted: HashSet::new(),
            loads: LoadTracker::new(),
            events: EventBus::new(),
            envelope: Map::new(),
            next_request_id: 1,
            last_persisted: None,
        }
    }

    // --- accessors ---

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn mode_kind(&self) -> ModeKind {
        self.mode.kind()
    }

    pub fn selection(&self) -> Option<&PileId> {
        self.selection.as_ref()
    }

    pub fn selected_category(&self) -> Option<&str> {
        self.selected_category.as_deref()
    }

    pub fn search(&self) -> &SearchOverlay {
        &self.search
    }

    pub fn envelope(&self) -> &Map<String, Value> {
        &self.envelope
    }

    pub fn is_ready(&self) -> bool {
        self.loads.is_ready()
    }

    pub fn is_read_only(&self) -> bool {
        self.config.is_read_only()
    }

    /// Pile whose label editor is open, if any.
    pub fn editing_pile(&self) -> Option<&PileId> {
        match &self.mode {
            Mode::EditingLabel { pile, .. } => Some(pile),
            _ => None,
        }
    }

    /// Whether the pile is shown greyed out. Only affects rendering; the
    /// pile keeps its own scheme.
    pub fn is_muted(&self, pile: &PileId) -> bool {
        self.muted.contains(pile)
    }

    /// Request id of the latest persistence response received.
    pub fn last_persisted(&self) -> Option<u64> {
        self.last_persisted
    }

    pub fn pan_active(&self) -> bool {
        self.pan_toggle || self.input.is_key_pressed(&Key::Space) || self.is_read_only()
    }

    pub fn copy_active(&self) -> bool {
        self.copy_toggle || self.input.modifiers.ctrl || self.input.is_key_pressed(&Key::Control)
    }

    // --- events ---

    pub fn subscribe(&mut self, handler: impl FnMut(&EditorEvent) + 'static) -> SubscriptionId {
        self.events.subscribe(handler)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Publish the current drawn counters.
    pub fn refresh_counts(&mut self) {
        let counts = CountSnapshot::from_table(self.scene.categories());
        self.events.publish(EditorEvent::Counts(counts));
    }

    fn status(&mut self, info: &str, detail: Option<String>) {
        self.events.publish(EditorEvent::Status {
            info: Some(info.to_string()),
            detail,
        });
    }

    fn status_detail(&mut self, detail: &str) {
        self.events.publish(EditorEvent::Status {
            info: None,
            detail: Some(detail.to_string()),
        });
    }

    fn report(&mut self, error: EditorError) {
        log::warn!("{}", error);
        self.events.publish(EditorEvent::Message {
            text: error.to_string(),
            kind: Some(error.kind()),
        });
    }

    fn scene_changed(&mut self) {
        self.refresh_counts();
        self.events.publish(EditorEvent::SceneChanged);
    }

    fn set_mode(&mut self, mode: Mode) {
        let from = self.mode.kind();
        let to = mode.kind();
        self.mode = mode;
        if from != to {
            log::debug!("Mode {:?} -> {:?}", from, to);
            self.events.publish(EditorEvent::ModeChanged { from, to });
        }
    }

    fn select(&mut self, pile: Option<PileId>) {
        if self.selection != pile {
            self.selection = pile.clone();
            self.events.publish(EditorEvent::SelectionChanged(pile));
        }
    }

    fn capacity_error(&self, category: &str) -> Option<EditorError> {
        self.scene
            .categories()
            .get(category)
            .map(|c| EditorError::CapacityExceeded {
                category: c.name.clone(),
                drawn: c.drawn,
                capacity: c.capacity,
            })
    }

    /// Select a pile and move the camera so it sits at the viewport center.
    fn navigate(&mut self, pile: &PileId) {
        let Some(center) = self.scene.get(pile).map(|p| p.center) else {
            return;
        };
        self.select(Some(pile.clone()));
        self.camera.center_on(center);
        self.events.publish(EditorEvent::Navigated {
            pile: pile.clone(),
            offset: self.camera.offset,
        });
    }

    // --- loading ---

    /// Register an outstanding load.
    pub fn begin_load(&mut self, task: LoadTask) {
        self.loads.begin(task);
    }

    /// Complete a load successfully.
    pub fn finish_load(&mut self, task: LoadTask) {
        if task == LoadTask::Background && self.config.design {
            self.camera.offset = DESIGN_CANVAS_ORIGIN;
        }
        if self.loads.finish(task) {
            log::info!("Scene ready with {} piles", self.scene.len());
            self.status(status::INFO_READY, Some(String::new()));
            self.events.publish(EditorEvent::Ready);
        }
    }

    /// The background image could not be loaded. The load stays
    /// outstanding, so the editor never becomes interactive.
    pub fn asset_failed(&mut self, name: &str) {
        self.report(EditorError::AssetMissing(name.to_string()));
    }

    /// Apply the answer of the load channel to a pending document load.
    pub fn apply_load_response(&mut self, response: StorageResult<LoadResponse>) {
        let response = match response {
            Ok(response) => response,
            Err(e) => {
                self.report(EditorError::LoadFailed(e.to_string()));
                return;
            }
        };
        if !response.is_success() {
            let reason = response
                .message
                .unwrap_or_else(|| format!("response code {}", response.code));
            self.report(EditorError::LoadFailed(reason));
            return;
        }

        if let Some(data) = response.data {
            self.envelope = data.envelope;
            let summary = self.import(&data.items);
            log::info!("Loaded {} piles ({} skipped)", summary.imported, summary.skipped);
        }
        self.finish_load(LoadTask::Document);
    }

    /// Add previously exported piles, then apply the highlight and focus
    /// options.
    pub fn import(&mut self, items: &[PileRecord]) -> ImportSummary {
        let summary = self.scene.import_data(items);
        let highlight = self.config.highlight_key();
        let focus = self.config.focus_key();

        let mut target = None;
        for pile in self.scene.piles_ordered() {
            let label = pile.label().to_lowercase();
            if let Some(key) = &highlight {
                if *key != label {
                    self.muted.insert(pile.id().clone());
                } else if target.is_none() {
                    target = Some(pile.id().clone());
                }
            }
            if target.is_none() && focus.as_ref() == Some(&label) {
                target = Some(pile.id().clone());
            }
        }
        if let Some(target) = target {
            self.navigate(&target);
        }
        self.scene_changed();
        summary
    }

    // --- dispatch ---

    /// Apply one command.
    pub fn dispatch(&mut self, command: EditorCommand) {
        if !self.loads.is_ready() && !command.allowed_while_loading() {
            log::debug!("Ignoring {:?} while loading", command);
            return;
        }
        if self.is_read_only() && !command.allowed_read_only() {
            log::debug!("Ignoring {:?} in read-only mode", command);
            return;
        }

        match command {
            EditorCommand::Pointer(event) => self.handle_pointer(event),
            EditorCommand::Key(event) => self.handle_key(event),
            EditorCommand::SetModifiers(modifiers) => self.input.set_modifiers(modifiers),
            EditorCommand::SetViewport(size) => self.camera.set_viewport(size),
            EditorCommand::SelectCategory(id) => self.select_category(id),
            EditorCommand::SetScheme(scheme) => self.set_scheme(scheme),
            EditorCommand::SetPanToggle(on) => {
                self.pan_toggle = on;
                if on {
                    self.copy_toggle = false;
                }
                self.status(if on { status::INFO_PAN } else { "" }, None);
            }
            EditorCommand::SetCopyToggle(on) => {
                self.copy_toggle = on;
                if on {
                    self.pan_toggle = false;
                }
                self.status(if on { status::INFO_COPY } else { "" }, None);
            }
            EditorCommand::Delete => self.delete_selected(),
            EditorCommand::EditLabel => {
                if let Some(pile) = self.selection.clone() {
                    self.start_label_edit(pile);
                }
            }
            EditorCommand::LabelInput(text) => {
                if let Mode::EditingLabel { draft, .. } = &mut self.mode {
                    *draft = text.replace(['\r', '\n'], "");
                }
            }
            EditorCommand::CommitLabel => self.commit_label(),
            EditorCommand::Save => {
                self.save(SaveKind::Partial);
            }
            EditorCommand::Commit => {
                self.save(SaveKind::Final);
            }
            EditorCommand::OpenSearch => self.open_search(),
            EditorCommand::SearchInput(text) => self.search_input(&text),
            EditorCommand::SearchNext => {
                let target = self.search.next();
                self.search_moved(target);
            }
            EditorCommand::SearchPrevious => {
                let target = self.search.previous();
                self.search_moved(target);
            }
            EditorCommand::CloseSearch => self.close_search(),
            EditorCommand::PersistFinished { request_id, result } => self.persist_finished(request_id, result),
        }
    }

    // --- pointer ---

    fn handle_pointer(&mut self, event: PointerEvent) {
        self.input.handle_pointer_event(&event);
        match event {
            PointerEvent::Down {
                position,
                button: MouseButton::Left,
                ..
            } => self.pointer_down(position),
            PointerEvent::Move { position } => self.pointer_move(position),
            PointerEvent::Up {
                button: MouseButton::Left,
                ..
            } => self.pointer_up(),
            PointerEvent::Leave => self.pointer_leave(),
            _ => {}
        }
    }

    fn pointer_down(&mut self, screen: Point) {
        if matches!(self.mode, Mode::EditingLabel { .. }) {
            self.commit_label();
        }
        if self.mode != Mode::Idle {
            return;
        }

        if self.pan_active() {
            self.set_mode(Mode::Panning { last: screen });
            return;
        }

        let world = self.camera.screen_to_world(screen);

        let handle = self.selection.as_ref().and_then(|selected| {
            let pile = self.scene.get(selected)?;
            let corner = hit_test_handles(pile, world, HANDLE_HIT_TOLERANCE)?;
            Some((selected.clone(), corner, pile.bounds()))
        });
        if let Some((pile, corner, original)) = handle {
            self.set_mode(Mode::ResizingShape {
                pile,
                corner,
                press: world,
                original,
            });
            return;
        }

        match self.scene.pile_at(world) {
            Some(hit) => self.start_move(hit, world),
            None => self.start_draw(world),
        }
    }

    fn start_move(&mut self, hit: PileId, world: Point) {
        let target = if self.copy_active() {
            match self.scene.duplicate_pile(&hit) {
                Some(copy) => {
                    self.scene_changed();
                    copy
                }
                None => {
                    let category = self.scene.get(&hit).map(|p| p.category().to_string());
                    if let Some(error) = category.and_then(|c| self.capacity_error(&c)) {
                        self.report(error);
                    }
                    return;
                }
            }
        } else {
            hit
        };

        let Some(origin) = self.scene.get(&target).map(|p| p.center) else {
            return;
        };
        self.select(Some(target.clone()));
        let info = if self.copy_active() { status::INFO_COPY } else { status::INFO_MOVE };
        self.status(info, None);
        self.set_mode(Mode::MovingShape {
            pile: target,
            press: world,
            origin,
        });
    }

    fn start_draw(&mut self, world: Point) {
        let Some(category) = self.selected_category.clone() else {
            log::warn!("No category selected, ignoring draw");
            return;
        };
        if self.scene.categories().is_full(&category) {
            if let Some(error) = self.capacity_error(&category) {
                self.report(error);
            }
            return;
        }
        let scheme = self
            .scene
            .categories()
            .get(&category)
            .map(|c| c.scheme)
            .unwrap_or_default();
        let Some(pile) = self.scene.add_pile(&category, world, 0.0, scheme) else {
            return;
        };

        self.select(None);
        self.scene_changed();
        self.status(status::INFO_DRAW, Some(String::new()));
        self.set_mode(Mode::Drawing { pile, center: world });
    }

    fn pointer_move(&mut self, screen: Point) {
        let world = self.camera.screen_to_world(screen);
        match self.mode.clone() {
            Mode::Panning { last } => {
                self.camera.pan(screen - last);
                self.mode = Mode::Panning { last: screen };
            }
            Mode::Drawing { pile, center } => {
                let Some(shape) = self.scene.get_mut(&pile) else {
                    self.set_mode(Mode::Idle);
                    return;
                };
                shape.diameter = geometry::draw_diameter(center, world);
                let detail = format!("Center: {}, {}", center.x, center.y);
                self.status(status::INFO_DRAW, Some(detail));
                self.events.publish(EditorEvent::SceneChanged);
            }
            Mode::MovingShape { pile, press, origin } => {
                let Some(shape) = self.scene.get_mut(&pile) else {
                    self.set_mode(Mode::Idle);
                    return;
                };
                shape.center = origin + (world - press);
                let bounds = shape.bounds();
                let detail = format!("x: {}, y: {}", bounds.left, bounds.top);
                self.status_detail(&detail);
                self.events.publish(EditorEvent::SceneChanged);
            }
            Mode::ResizingShape {
                pile,
                corner,
                press,
                original,
            } => {
                let Some(shape) = self.scene.get_mut(&pile) else {
                    self.set_mode(Mode::Idle);
                    return;
                };
                if let Some(resized) = geometry::resize_from_corner(original, corner, world - press) {
                    shape.center = resized.center();
                    shape.diameter = resized.size;
                    self.events.publish(EditorEvent::SceneChanged);
                }
            }
            Mode::Idle | Mode::EditingLabel { .. } => {}
        }
    }

    fn pointer_up(&mut self) {
        match self.mode.clone() {
            Mode::Drawing { pile, .. } => self.finish_draw(pile),
            Mode::MovingShape { pile, .. } => {
                self.set_mode(Mode::Idle);
                if !self.scene.contains(&pile) {
                    return;
                }
                if self.input.is_double_click() {
                    self.start_label_edit(pile);
                } else {
                    self.select(Some(pile));
                }
            }
            Mode::Panning { .. } | Mode::ResizingShape { .. } => self.set_mode(Mode::Idle),
            Mode::Idle | Mode::EditingLabel { .. } => {}
        }
    }

    fn pointer_leave(&mut self) {
        if let Mode::Drawing { pile, .. } = self.mode.clone() {
            self.finish_draw(pile);
        }
    }

    /// Keep a drawn pile if it reached the minimum size, otherwise discard
    /// it and release its quota slot.
    fn finish_draw(&mut self, pile: PileId) {
        self.set_mode(Mode::Idle);
        let diameter = self.scene.get(&pile).map(|p| p.diameter);
        match diameter {
            Some(d) if d >= MIN_PILE_SIZE => self.select(Some(pile)),
            Some(_) => {
                log::debug!("Discarding pile {} below minimum size", pile);
                self.scene.remove_pile(&pile);
                self.scene_changed();
            }
            None => {}
        }
        self.status(status::INFO_DRAW, Some(String::new()));
    }

    // --- keyboard ---

    fn handle_key(&mut self, event: KeyEvent) {
        self.input.handle_key_event(&event);
        match event {
            KeyEvent::Released(Key::Space) => {
                self.pan_toggle = false;
                if matches!(self.mode, Mode::Panning { .. }) {
                    self.set_mode(Mode::Idle);
                }
            }
            KeyEvent::Pressed(Key::Control) if !self.is_read_only() => {
                self.status(status::INFO_COPY, None);
            }
            KeyEvent::Released(Key::Control) if !self.is_read_only() => {
                self.copy_toggle = false;
                self.status("", None);
            }
            KeyEvent::Pressed(key) if !self.is_read_only() => self.key_pressed(key),
            _ => {}
        }
    }

    fn key_pressed(&mut self, key: Key) {
        if matches!(self.mode, Mode::EditingLabel { .. }) {
            if matches!(key, Key::Enter | Key::Escape) {
                self.commit_label();
            }
            return;
        }
        if key == Key::Escape && self.search.is_visible() {
            self.close_search();
            return;
        }
        if self.mode != Mode::Idle {
            return;
        }
        match key {
            Key::Delete => self.delete_selected(),
            Key::ArrowLeft | Key::ArrowRight | Key::ArrowUp | Key::ArrowDown => self.nudge(&key),
            _ => {}
        }
    }

    /// Arrow keys move the selected pile by one unit, or with Shift grow
    /// (Right/Down) or shrink (Left/Up) it.
    fn nudge(&mut self, key: &Key) {
        let Some(selected) = self.selection.clone() else {
            return;
        };
        let resize = self.input.shift_held();
        let Some(pile) = self.scene.get_mut(&selected) else {
            return;
        };

        let detail = if resize {
            let step = if matches!(key, Key::ArrowRight | Key::ArrowDown) { 1.0 } else { -1.0 };
            pile.diameter = geometry::inch_diameter(pile.diameter, step);
            format!("Size: {}", pile.diameter)
        } else {
            let delta = match key {
                Key::ArrowLeft => Vec2::new(-1.0, 0.0),
                Key::ArrowRight => Vec2::new(1.0, 0.0),
                Key::ArrowUp => Vec2::new(0.0, -1.0),
                _ => Vec2::new(0.0, 1.0),
            };
            pile.translate(delta);
            let bounds = pile.bounds();
            format!("x: {}, y: {}", bounds.left, bounds.top)
        };
        self.status(status::INFO_NUDGE, Some(detail));
        self.events.publish(EditorEvent::SceneChanged);
    }

    // --- toolbar ---

    fn select_category(&mut self, id: String) {
        if self.scene.categories().get(&id).is_none() {
            log::warn!("Unknown category {:?}", id);
            return;
        }
        self.selected_category = Some(id);
    }

    fn set_scheme(&mut self, scheme: Scheme) {
        let Some(id) = self.selected_category.clone() else {
            return;
        };
        if let Some(category) = self.scene.categories_mut().get_mut(&id) {
            category.scheme = scheme;
        }
    }

    fn delete_selected(&mut self) {
        if self.mode != Mode::Idle {
            return;
        }
        let Some(selected) = self.selection.clone() else {
            return;
        };
        if self.scene.remove_pile(&selected).is_none() {
            return;
        }
        let next = self.scene.last_added().cloned();
        self.select(next);
        self.scene_changed();
        self.status(status::INFO_DELETED, None);
    }

    fn start_label_edit(&mut self, pile: PileId) {
        if self.mode != Mode::Idle {
            return;
        }
        let Some(text) = self.scene.get(&pile).map(|p| p.label().to_string()) else {
            return;
        };
        self.select(Some(pile.clone()));
        self.set_mode(Mode::EditingLabel {
            pile: pile.clone(),
            draft: text.clone(),
        });
        self.events.publish(EditorEvent::LabelEditorOpened { pile, text });
    }

    fn commit_label(&mut self) {
        let Mode::EditingLabel { pile, draft } = self.mode.clone() else {
            return;
        };
        self.set_mode(Mode::Idle);
        self.input.reset_click_sequence();
        if self.scene.set_label(&pile, &draft) {
            self.events.publish(EditorEvent::SceneChanged);
        }
        self.events.publish(EditorEvent::LabelEditorClosed);
    }

    // --- search ---

    fn open_search(&mut self) {
        self.search.show();
        self.events.publish(EditorEvent::SearchVisibility(true));
        let query = self.search.query().to_string();
        self.search_input(&query);
    }

    fn search_input(&mut self, text: &str) {
        self.search.set_query(text);
        let results = self.scene.find_by_label(text);
        let target = self.search.set_results(results);
        self.search_moved(target);
    }

    fn search_moved(&mut self, target: Option<PileId>) {
        if let Some(pile) = target {
            self.navigate(&pile);
        }
        self.events.publish(EditorEvent::SearchUpdated {
            current: self.search.current(),
            total: self.search.total(),
            prompt: self.search.prompt(),
        });
    }

    fn close_search(&mut self) {
        if self.search.is_visible() {
            self.search.hide();
            self.events.publish(EditorEvent::SearchVisibility(false));
        }
    }

    // --- persistence ---

    /// Validate the scene and, if allowed, publish a [`SaveRequest`].
    /// Returns the request id when a request went out.
    pub fn save(&mut self, kind: SaveKind) -> Option<u64> {
        if self.is_read_only() || !self.is_ready() {
            return None;
        }
        self.commit_label();
        self.status(status::INFO_SAVE, Some(String::new()));

        let items = match self.scene.export_all() {
            Ok(items) => items,
            Err(e) => {
                log::error!("Failed to export piles: {}", e);
                self.events.publish(EditorEvent::Message {
                    text: format!("Failed to export piles: {}", e),
                    kind: None,
                });
                return None;
            }
        };

        let request_id = match validation::check(kind, &items, self.scene.categories()) {
            Ok(warning) => {
                if let Some(warning) = warning {
                    self.report(warning);
                }
                let document = DocumentSnapshot::new(&self.envelope, items, self.scene.categories());
                let id = self.next_request_id;
                self.next_request_id += 1;
                log::info!("Requesting {:?} save #{}", kind, id);
                self.status_detail(status::DETAIL_SAVING);
                self.events
                    .publish(EditorEvent::SaveRequested(SaveRequest { id, kind, document }));
                Some(id)
            }
            Err(error) => {
                if let EditorError::DuplicateOrEmptyName { pile, .. } = &error {
                    let pile = pile.clone();
                    self.navigate(&pile);
                }
                self.report(error);
                None
            }
        };
        self.status(status::INFO_SAVE_DONE, None);
        request_id
    }

    fn persist_finished(&mut self, request_id: u64, result: Result<(), String>) {
        if request_id == 0 || request_id >= self.next_request_id {
            log::warn!("Ignoring response for unknown save #{}", request_id);
            return;
        }
        self.last_persisted = Some(request_id);
        match result {
            Ok(()) => {
                log::info!("Save #{} persisted", request_id);
                self.status_detail(status::DETAIL_SAVED);
            }
            Err(reason) => {
                log::error!("Save #{} failed: {}", request_id, reason);
                self.status_detail(status::DETAIL_SAVE_FAILED);
                self.events.publish(EditorEvent::Message {
                    text: format!("{}: {}", status::DETAIL_SAVE_FAILED, reason),
                    kind: None,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn editor(types: &str) -> (Editor, Rc<RefCell<Vec<EditorEvent>>>) {
        let mut editor = Editor::new(EditorConfig::new(types));
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        editor.subscribe(move |event| sink.borrow_mut().push(event.clone()));
        (editor, log)
    }

    fn press(editor: &mut Editor, x: f64, y: f64) {
        press_at(editor, x, y, 0);
    }

    fn press_at(editor: &mut Editor, x: f64, y: f64, time_ms: u64) {
        editor.dispatch(EditorCommand::Pointer(PointerEvent::Down {
            position: Point::new(x, y),
            button: MouseButton::Left,
            time_ms,
        }));
    }

    fn drag_to(editor: &mut Editor, x: f64, y: f64) {
        editor.dispatch(EditorCommand::Pointer(PointerEvent::Move {
            position: Point::new(x, y),
        }));
    }

    fn release(editor: &mut Editor, x: f64, y: f64) {
        editor.dispatch(EditorCommand::Pointer(PointerEvent::Up {
            position: Point::new(x, y),
            button: MouseButton::Left,
        }));
    }

    fn draw(editor: &mut Editor, x: f64, y: f64, radius: f64) {
        press(editor, x, y);
        drag_to(editor, x + radius, y);
        release(editor, x + radius, y);
    }

    fn key(editor: &mut Editor, key: Key) {
        editor.dispatch(EditorCommand::Key(KeyEvent::Pressed(key)));
    }

    #[test]
    fn test_draw_creates_and_selects() {
        let (mut editor, _) = editor("a,Bored,2");
        press(&mut editor, 100.0, 100.0);
        assert_eq!(editor.mode_kind(), ModeKind::Drawing);
        drag_to(&mut editor, 120.0, 100.0);
        release(&mut editor, 120.0, 100.0);

        assert_eq!(editor.mode_kind(), ModeKind::Idle);
        let id = editor.selection().cloned().unwrap();
        let pile = editor.scene().get(&id).unwrap();
        assert_eq!(pile.diameter, 40.0);
        assert_eq!(pile.center, Point::new(100.0, 100.0));
        assert_eq!(editor.scene().categories().get("a").unwrap().drawn, 1);
    }

    #[test]
    fn test_small_draw_is_discarded() {
        let (mut editor, _) = editor("a,Bored,2");
        draw(&mut editor, 100.0, 100.0, 5.0);
        assert!(editor.scene().is_empty());
        assert_eq!(editor.selection(), None);
        assert_eq!(editor.scene().categories().get("a").unwrap().drawn, 0);
    }

    #[test]
    fn test_leave_finishes_draw() {
        let (mut editor, _) = editor("a,Bored,2");
        press(&mut editor, 100.0, 100.0);
        drag_to(&mut editor, 130.0, 100.0);
        editor.dispatch(EditorCommand::Pointer(PointerEvent::Leave));
        assert_eq!(editor.mode_kind(), ModeKind::Idle);
        assert_eq!(editor.scene().len(), 1);
    }

    #[test]
    fn test_full_category_rejects_draw() {
        let (mut editor, log) = editor("a,Bored,1");
        draw(&mut editor, 100.0, 100.0, 20.0);
        log.borrow_mut().clear();

        press(&mut editor, 300.0, 300.0);
        assert_eq!(editor.mode_kind(), ModeKind::Idle);
        assert_eq!(editor.scene().len(), 1);
        let log = log.borrow();
        let message = log.iter().find_map(|e| match e {
            EditorEvent::Message { text, kind } => Some((text.clone(), *kind)),
            _ => None,
        });
        let (text, kind) = message.unwrap();
        assert_eq!(kind, Some(ErrorKind::CapacityExceeded));
        assert!(text.contains("[Bored]") && text.contains("1 of 1"));
    }

    #[test]
    fn test_move_follows_pointer() {
        let (mut editor, _) = editor("a,Bored,2");
        draw(&mut editor, 100.0, 100.0, 20.0);
        let id = editor.selection().cloned().unwrap();

        press(&mut editor, 105.0, 100.0);
        assert_eq!(editor.mode_kind(), ModeKind::MovingShape);
        drag_to(&mut editor, 135.0, 90.0);
        release(&mut editor, 135.0, 90.0);

        assert_eq!(editor.scene().get(&id).unwrap().center, Point::new(130.0, 90.0));
        assert_eq!(editor.selection(), Some(&id));
    }

    #[test]
    fn test_copy_drag_duplicates() {
        let (mut editor, _) = editor("a,Bored,2");
        draw(&mut editor, 100.0, 100.0, 20.0);
        let original = editor.selection().cloned().unwrap();
        editor.dispatch(EditorCommand::SetCopyToggle(true));

        press(&mut editor, 100.0, 100.0);
        drag_to(&mut editor, 200.0, 100.0);
        release(&mut editor, 200.0, 100.0);

        assert_eq!(editor.scene().len(), 2);
        let copy = editor.selection().cloned().unwrap();
        assert_ne!(copy, original);
        assert_eq!(editor.scene().get(&original).unwrap().center, Point::new(100.0, 100.0));
        assert_eq!(editor.scene().get(&copy).unwrap().center, Point::new(200.0, 100.0));
    }

    #[test]
    fn test_resize_by_handle() {
        let (mut editor, _) = editor("a,Bored,2");
        draw(&mut editor, 100.0, 100.0, 20.0);
        let id = editor.selection().cloned().unwrap();

        // bottom-right handle of a 40px pile centered at (100, 100)
        press(&mut editor, 120.0, 120.0);
        assert_eq!(editor.mode_kind(), ModeKind::ResizingShape);
        drag_to(&mut editor, 130.0, 120.0);
        release(&mut editor, 130.0, 120.0);

        let bounds = editor.scene().get(&id).unwrap().bounds();
        assert_eq!(bounds.size, 50.0);
        assert_eq!((bounds.left, bounds.top), (80.0, 80.0));
    }

    #[test]
    fn test_resize_stops_at_minimum() {
        let (mut editor, _) = editor("a,Bored,2");
        draw(&mut editor, 100.0, 100.0, 20.0);
        let id = editor.selection().cloned().unwrap();

        press(&mut editor, 120.0, 120.0);
        drag_to(&mut editor, 100.0, 120.0);
        drag_to(&mut editor, 80.0, 120.0);
        release(&mut editor, 80.0, 120.0);

        assert_eq!(editor.scene().get(&id).unwrap().diameter, 20.0);
    }

    #[test]
    fn test_pan_with_space() {
        let (mut editor, _) = editor("a,Bored,2");
        key(&mut editor, Key::Space);
        press(&mut editor, 10.0, 10.0);
        assert_eq!(editor.mode_kind(), ModeKind::Panning);
        drag_to(&mut editor, 25.0, 5.0);
        assert_eq!(editor.camera().offset, Vec2::new(15.0, -5.0));

        editor.dispatch(EditorCommand::Key(KeyEvent::Released(Key::Space)));
        assert_eq!(editor.mode_kind(), ModeKind::Idle);
        assert!(editor.scene().is_empty());
    }

    #[test]
    fn test_pan_and_copy_toggles_exclude_each_other() {
        let (mut editor, _) = editor("a,Bored,2");
        editor.dispatch(EditorCommand::SetPanToggle(true));
        editor.dispatch(EditorCommand::SetCopyToggle(true));
        assert!(editor.copy_active());
        assert!(!editor.pan_active());

        editor.dispatch(EditorCommand::SetPanToggle(true));
        assert!(editor.pan_active());
        assert!(!editor.copy_active());
    }

    #[test]
    fn test_key_release_clears_toolbar_toggles() {
        let (mut editor, _) = editor("a,Bored,2");
        editor.dispatch(EditorCommand::SetCopyToggle(true));
        key(&mut editor, Key::Control);
        editor.dispatch(EditorCommand::Key(KeyEvent::Released(Key::Control)));
        assert!(!editor.copy_active());

        editor.dispatch(EditorCommand::SetPanToggle(true));
        key(&mut editor, Key::Space);
        editor.dispatch(EditorCommand::Key(KeyEvent::Released(Key::Space)));
        assert!(!editor.pan_active());
    }

    #[test]
    fn test_delete_moves_selection_to_latest() {
        let (mut editor, _) = editor("a,Bored,3");
        draw(&mut editor, 100.0, 100.0, 20.0);
        let first = editor.selection().cloned().unwrap();
        draw(&mut editor, 300.0, 100.0, 20.0);
        draw(&mut editor, 500.0, 100.0, 20.0);
        let third = editor.selection().cloned().unwrap();

        // select the first and delete it
        press(&mut editor, 100.0, 100.0);
        release(&mut editor, 100.0, 100.0);
        key(&mut editor, Key::Delete);

        assert_eq!(editor.scene().len(), 2);
        assert_eq!(editor.selection(), Some(&third));
        assert!(!editor.scene().contains(&first));
        assert_eq!(editor.scene().categories().get("a").unwrap().drawn, 2);
    }

    #[test]
    fn test_arrow_nudges() {
        let (mut editor, _) = editor("a,Bored,1");
        draw(&mut editor, 100.0, 100.0, 8.0);
        let id = editor.selection().cloned().unwrap();

        key(&mut editor, Key::ArrowRight);
        key(&mut editor, Key::ArrowUp);
        assert_eq!(editor.scene().get(&id).unwrap().center, Point::new(101.0, 99.0));

        editor.dispatch(EditorCommand::SetModifiers(Modifiers {
            shift: true,
            ..Modifiers::default()
        }));
        key(&mut editor, Key::ArrowDown);
        assert_eq!(editor.scene().get(&id).unwrap().diameter, 17.0);
        for _ in 0..5 {
            key(&mut editor, Key::ArrowLeft);
        }
        assert_eq!(editor.scene().get(&id).unwrap().diameter, MIN_PILE_SIZE);
    }

    #[test]
    fn test_double_click_edits_label() {
        let (mut editor, log) = editor("a,Bored,1");
        draw(&mut editor, 100.0, 100.0, 20.0);
        let id = editor.selection().cloned().unwrap();

        press_at(&mut editor, 100.0, 100.0, 1000);
        release(&mut editor, 100.0, 100.0);
        press_at(&mut editor, 100.0, 100.0, 1250);
        assert_eq!(editor.mode_kind(), ModeKind::MovingShape);
        release(&mut editor, 100.0, 100.0);
        assert_eq!(editor.mode_kind(), ModeKind::EditingLabel);
        assert_eq!(editor.editing_pile(), Some(&id));

        editor.dispatch(EditorCommand::LabelInput("  P-01\n".to_string()));
        key(&mut editor, Key::Enter);
        assert_eq!(editor.mode_kind(), ModeKind::Idle);
        assert_eq!(editor.scene().get(&id).unwrap().label(), "P-01");
        assert!(log.borrow().contains(&EditorEvent::LabelEditorClosed));
    }

    #[test]
    fn test_second_press_can_still_drag() {
        let (mut editor, _) = editor("a,Bored,1");
        draw(&mut editor, 100.0, 100.0, 20.0);
        let id = editor.selection().cloned().unwrap();

        press_at(&mut editor, 100.0, 100.0, 1000);
        release(&mut editor, 100.0, 100.0);
        press_at(&mut editor, 100.0, 100.0, 1100);
        drag_to(&mut editor, 160.0, 100.0);
        release(&mut editor, 160.0, 100.0);

        assert_eq!(editor.mode_kind(), ModeKind::Idle);
        assert_eq!(editor.scene().get(&id).unwrap().center, Point::new(160.0, 100.0));
    }

    #[test]
    fn test_slow_clicks_do_not_edit() {
        let (mut editor, _) = editor("a,Bored,1");
        draw(&mut editor, 100.0, 100.0, 20.0);

        press_at(&mut editor, 100.0, 100.0, 1000);
        release(&mut editor, 100.0, 100.0);
        press_at(&mut editor, 100.0, 100.0, 1600);
        release(&mut editor, 100.0, 100.0);
        assert_eq!(editor.mode_kind(), ModeKind::Idle);
    }

    #[test]
    fn test_replayed_clicks_give_same_result() {
        let commands = vec![
            EditorCommand::Pointer(PointerEvent::Down {
                position: Point::new(100.0, 100.0),
                button: MouseButton::Left,
                time_ms: 10,
            }),
            EditorCommand::Pointer(PointerEvent::Move {
                position: Point::new(120.0, 100.0),
            }),
            EditorCommand::Pointer(PointerEvent::Up {
                position: Point::new(120.0, 100.0),
                button: MouseButton::Left,
            }),
            EditorCommand::Pointer(PointerEvent::Down {
                position: Point::new(100.0, 100.0),
                button: MouseButton::Left,
                time_ms: 2000,
            }),
            EditorCommand::Pointer(PointerEvent::Up {
                position: Point::new(100.0, 100.0),
                button: MouseButton::Left,
            }),
            EditorCommand::Pointer(PointerEvent::Down {
                position: Point::new(102.0, 100.0),
                button: MouseButton::Left,
                time_ms: 2400,
            }),
            EditorCommand::Pointer(PointerEvent::Up {
                position: Point::new(102.0, 100.0),
                button: MouseButton::Left,
            }),
        ];
        let replay = || {
            let (mut editor, _) = editor("a,Bored,1");
            for command in &commands {
                editor.dispatch(command.clone());
            }
            (editor.mode_kind(), editor.editing_pile().cloned())
        };

        let first = replay();
        assert_eq!(first.0, ModeKind::EditingLabel);
        assert!(first.1.is_some());
        assert_eq!(replay().0, first.0);
    }

    #[test]
    fn test_press_while_editing_commits_then_acts() {
        let (mut editor, _) = editor("a,Bored,2");
        draw(&mut editor, 100.0, 100.0, 20.0);
        let id = editor.selection().cloned().unwrap();
        editor.dispatch(EditorCommand::EditLabel);
        editor.dispatch(EditorCommand::LabelInput("A".to_string()));

        press(&mut editor, 300.0, 300.0);
        assert_eq!(editor.scene().get(&id).unwrap().label(), "A");
        assert_eq!(editor.mode_kind(), ModeKind::Drawing);
    }

    #[test]
    fn test_read_only_only_pans() {
        let config = EditorConfig::new("a,Bored,2").with_capability(crate::config::CapabilityMode::ReadOnly);
        let mut editor = Editor::new(config);
        press(&mut editor, 100.0, 100.0);
        assert_eq!(editor.mode_kind(), ModeKind::Panning);
        drag_to(&mut editor, 110.0, 100.0);
        release(&mut editor, 110.0, 100.0);
        assert!(editor.scene().is_empty());
        assert_eq!(editor.camera().offset, Vec2::new(10.0, 0.0));

        editor.dispatch(EditorCommand::Save);
        assert_eq!(editor.save(SaveKind::Partial), None);
    }

    #[test]
    fn test_input_ignored_until_ready() {
        let (mut editor, log) = editor("a,Bored,2");
        editor.begin_load(LoadTask::Background);
        press(&mut editor, 100.0, 100.0);
        assert_eq!(editor.mode_kind(), ModeKind::Idle);

        editor.finish_load(LoadTask::Background);
        assert!(editor.is_ready());
        assert!(log.borrow().contains(&EditorEvent::Ready));
    }

    #[test]
    fn test_failed_load_keeps_editor_waiting() {
        let (mut editor, log) = editor("a,Bored,2");
        editor.begin_load(LoadTask::Document);
        editor.apply_load_response(Ok(LoadResponse::failure(500, "boom")));
        assert!(!editor.is_ready());
        assert!(log.borrow().iter().any(|e| matches!(
            e,
            EditorEvent::Message { kind: Some(ErrorKind::LoadFailed), text } if text.contains("boom")
        )));
    }

    #[test]
    fn test_design_mode_offsets_canvas() {
        let mut editor = Editor::new(EditorConfig::new("a,Bored,2").with_design(true));
        editor.begin_load(LoadTask::Background);
        editor.finish_load(LoadTask::Background);
        assert_eq!(editor.camera().offset, DESIGN_CANVAS_ORIGIN);
    }

    #[test]
    fn test_persist_response_matching() {
        let (mut editor, log) = editor("a,Bored,1");
        draw(&mut editor, 100.0, 100.0, 20.0);
        editor.dispatch(EditorCommand::EditLabel);
        editor.dispatch(EditorCommand::LabelInput("P-01".to_string()));
        editor.dispatch(EditorCommand::CommitLabel);

        let id = editor.save(SaveKind::Final).unwrap();
        editor.dispatch(EditorCommand::PersistFinished {
            request_id: id + 5,
            result: Ok(()),
        });
        assert_eq!(editor.last_persisted(), None);

        editor.dispatch(EditorCommand::PersistFinished {
            request_id: id,
            result: Err("offline".to_string()),
        });
        assert_eq!(editor.last_persisted(), Some(id));
        assert!(log.borrow().iter().any(|e| matches!(
            e,
            EditorEvent::Message { text, kind: None } if text.contains("offline")
        )));
    }
}
