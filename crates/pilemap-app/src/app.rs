//! Application shell: wires storage, assets and scripted input to the editor.

use kurbo::Size;
use pilemap_core::{
    CapabilityMode, ConfigError, Editor, EditorCommand, EditorConfig, EditorEvent, FileStorage, LoadTask, SaveKind,
    SaveRequest, StatusBoard, Storage, StorageError,
};
use std::cell::RefCell;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use thiserror::Error;

/// Application errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("Script line {line}: {source}")]
    Script {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Startup options of the shell.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Editor configuration file; flags below override its fields.
    pub config_file: Option<PathBuf>,
    pub types: Option<String>,
    pub document: Option<String>,
    pub storage_dir: Option<PathBuf>,
    pub background: Option<PathBuf>,
    pub read_only: bool,
    pub design: bool,
    pub highlight: Option<String>,
    pub focus: Option<String>,
    pub viewport: Option<Size>,
}

impl AppConfig {
    /// Merge the configuration file (if any) with the command-line overrides.
    pub fn editor_config(&self) -> Result<EditorConfig, AppError> {
        let mut config = match &self.config_file {
            Some(path) => EditorConfig::load(path)?,
            None => EditorConfig::default(),
        };
        if let Some(types) = &self.types {
            config.types.clone_from(types);
        }
        if let Some(document) = &self.document {
            config.document_id.clone_from(document);
        }
        if self.read_only {
            config.capability = CapabilityMode::ReadOnly;
        }
        if self.design {
            config.design = true;
        }
        if let Some(highlight) = &self.highlight {
            config.highlight = Some(highlight.clone());
        }
        if let Some(focus) = &self.focus {
            config.focus = Some(focus.clone());
        }
        if let Some(viewport) = self.viewport {
            config.viewport = viewport;
        }
        Ok(config)
    }
}

/// A running editor session bound to a storage backend.
pub struct App {
    editor: Editor,
    storage: Box<dyn Storage>,
    board: Rc<RefCell<StatusBoard>>,
    pending_saves: Rc<RefCell<Vec<SaveRequest>>>,
}

impl App {
    pub fn new(config: &AppConfig) -> Result<Self, AppError> {
        let editor_config = config.editor_config()?;
        let storage = match &config.storage_dir {
            Some(dir) => FileStorage::new(dir.clone())?,
            None => FileStorage::default_location()?,
        };
        log::info!("Using storage at {}", storage.base_path().display());
        Ok(Self::with_storage(editor_config, Box::new(storage)))
    }

    pub fn with_storage(config: EditorConfig, storage: Box<dyn Storage>) -> Self {
        let mut editor = Editor::new(config);
        let board = StatusBoard::attach(&mut editor);

        let pending_saves = Rc::new(RefCell::new(Vec::new()));
        let queue = Rc::clone(&pending_saves);
        editor.subscribe(move |event| match event {
            EditorEvent::SaveRequested(request) => queue.borrow_mut().push(request.clone()),
            EditorEvent::Message { text, .. } => log::warn!("{}", text),
            _ => {}
        });

        Self {
            editor,
            storage,
            board,
            pending_saves,
        }
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn status(&self) -> StatusBoard {
        self.board.borrow().clone()
    }

    /// Run the startup loads: background image, SVG size probe, document.
    pub fn load(&mut self, background: Option<&Path>) {
        if let Some(path) = background {
            self.load_background(path);
        }

        let id = self.editor.config().document_id.clone();
        match pollster::block_on(self.storage.exists(&id)) {
            Ok(false) => log::info!("Starting new document {:?}", id),
            Ok(true) => {
                self.editor.begin_load(LoadTask::Document);
                let response = pollster::block_on(self.storage.load(&id));
                self.editor.apply_load_response(response);
            }
            Err(e) => {
                self.editor.begin_load(LoadTask::Document);
                self.editor.apply_load_response(Err(e));
            }
        }
    }

    fn load_background(&mut self, path: &Path) {
        let is_svg = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("svg"));

        self.editor.begin_load(LoadTask::Background);
        if is_svg {
            self.editor.begin_load(LoadTask::SvgProbe);
        }
        if !path.is_file() {
            self.editor.asset_failed(&path.display().to_string());
            return;
        }
        self.editor.finish_load(LoadTask::Background);
        if is_svg {
            self.editor.finish_load(LoadTask::SvgProbe);
        }
    }

    /// Apply one command, then hand any save it produced to storage.
    pub fn dispatch(&mut self, command: EditorCommand) {
        self.editor.dispatch(command);
        self.flush_saves();
    }

    pub fn save(&mut self, kind: SaveKind) {
        self.editor.save(kind);
        self.flush_saves();
    }

    fn flush_saves(&mut self) {
        let requests: Vec<SaveRequest> = self.pending_saves.borrow_mut().drain(..).collect();
        let id = self.editor.config().document_id.clone();
        for request in requests {
            let result = pollster::block_on(self.storage.persist(&id, &request.document)).map_err(|e| e.to_string());
            self.editor.dispatch(EditorCommand::PersistFinished {
                request_id: request.id,
                result,
            });
        }
    }

    /// Feed JSON-lines commands. Blank lines and `#` comments are skipped.
    pub fn run_script(&mut self, reader: impl BufRead) -> Result<usize, AppError> {
        let mut applied = 0;
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let command: EditorCommand =
                serde_json::from_str(line).map_err(|source| AppError::Script { line: index + 1, source })?;
            log::debug!("Script: {:?}", command);
            self.dispatch(command);
            applied += 1;
        }
        Ok(applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pilemap_core::MemoryStorage;

    #[test]
    fn test_script_save_reaches_storage() {
        let config = EditorConfig::new("a,Bored,1").with_document_id("doc");
        let mut app = App::with_storage(config, Box::new(MemoryStorage::new()));
        app.load(None);
        assert!(app.editor().is_ready());

        let script = r#"
            # draw one pile and name it
            {"Pointer": {"Down": {"position": {"x": 100.0, "y": 100.0}, "button": "Left"}}}
            {"Pointer": {"Move": {"position": {"x": 120.0, "y": 100.0}}}}
            {"Pointer": {"Up": {"position": {"x": 120.0, "y": 100.0}, "button": "Left"}}}
            "EditLabel"
            {"LabelInput": "P-01"}
            "CommitLabel"
            "Commit"
        "#;
        let applied = app.run_script(script.as_bytes()).unwrap();
        assert_eq!(applied, 7);
        assert_eq!(app.editor().last_persisted(), Some(1));
        assert_eq!(app.status().detail, "Saved");
        assert!(pollster::block_on(app.storage.exists("doc")).unwrap());
    }

    #[test]
    fn test_missing_background_blocks_input() {
        let mut app = App::with_storage(EditorConfig::new("a,Bored,1"), Box::new(MemoryStorage::new()));
        app.load(Some(Path::new("/nonexistent/background.svg")));
        assert!(!app.editor().is_ready());
        assert!(app.status().last_message.unwrap().contains("[E1]"));
    }

    #[test]
    fn test_bad_script_line() {
        let mut app = App::with_storage(EditorConfig::new("a,Bored,1"), Box::new(MemoryStorage::new()));
        let err = app.run_script("\"Save\"\n{oops}\n".as_bytes()).unwrap_err();
        assert!(matches!(err, AppError::Script { line: 2, .. }));
    }
}
