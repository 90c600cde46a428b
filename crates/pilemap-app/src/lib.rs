//! Pilemap Application
//!
//! Command-line shell that loads a document, replays scripted editor
//! commands and forwards save requests to file storage.

mod app;

pub use app::{App, AppConfig, AppError};
