//! Pilemap Core Library
//!
//! Scene model, interaction state machine and save pipeline of the pile
//! diagram editor.

pub mod camera;
pub mod config;
pub mod editor;
pub mod error;
pub mod events;
pub mod geometry;
pub mod handles;
pub mod input;
pub mod loading;
pub mod pile;
pub mod quota;
pub mod scene;
pub mod search;
pub mod status;
pub mod storage;
pub mod validation;
pub mod view;

pub use camera::Camera;
pub use config::{CapabilityMode, ConfigError, EditorConfig};
pub use editor::{Editor, EditorCommand, Mode, ModeKind};
pub use error::{EditorError, EditorResult, ErrorKind};
pub use events::{CountSnapshot, EditorEvent, EventBus, SubscriptionId};
pub use geometry::{Corner, MIN_PILE_SIZE, PileBox};
pub use input::{InputState, Key, KeyEvent, Modifiers, MouseButton, PointerEvent};
pub use loading::{LoadTask, LoadTracker};
pub use pile::{Pile, PileGeometry, PileId, Scheme, SerializableColor, next_label};
pub use quota::{Category, CategoryTable};
pub use scene::{ImportSummary, PileRecord, Scene};
pub use search::SearchOverlay;
pub use status::StatusBoard;
pub use storage::{FileStorage, LoadResponse, MemoryStorage, SceneData, Storage, StorageError, StorageResult};
pub use validation::{DocumentSnapshot, SaveKind, SaveRequest};
pub use view::{PileView, project};
