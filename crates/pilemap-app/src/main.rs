//! Pilemap CLI
//!
//! Usage:
//!   pilemap [OPTIONS] [SCRIPT]
//!
//! Replays JSON-lines editor commands from SCRIPT (or stdin) against the
//! document, then optionally saves or commits it.

use std::fs::File;
use std::io::{self, BufReader, IsTerminal};
use std::path::PathBuf;

use clap::Parser;
use kurbo::Size;

use pilemap_app::{App, AppConfig};
use pilemap_core::SaveKind;

#[derive(Parser)]
#[command(name = "pilemap")]
#[command(about = "Pile layout editor driven by scripted commands")]
struct Cli {
    /// Command script, one JSON command per line (reads stdin if omitted)
    script: Option<PathBuf>,

    /// Editor configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Categories as `id,name,capacity` triples separated by `;`
    #[arg(short, long)]
    types: Option<String>,

    /// Document id
    #[arg(short, long)]
    document: Option<String>,

    /// Directory holding documents (defaults to the user data directory)
    #[arg(long)]
    storage: Option<PathBuf>,

    /// Background image the piles are placed over
    #[arg(short, long)]
    background: Option<PathBuf>,

    /// Open the document read-only
    #[arg(long)]
    read_only: bool,

    /// Design mode: place the canvas at its fixed design origin
    #[arg(long)]
    design: bool,

    /// Highlight piles with this label and mute the others
    #[arg(long)]
    highlight: Option<String>,

    /// Select and center the pile with this label after loading
    #[arg(long)]
    focus: Option<String>,

    /// Viewport width and height
    #[arg(long, num_args = 2, value_names = ["WIDTH", "HEIGHT"])]
    viewport: Option<Vec<f64>>,

    /// Save after the script (unfinished categories only warn)
    #[arg(long, conflicts_with = "commit")]
    save: bool,

    /// Commit after the script (every category must be complete)
    #[arg(long)]
    commit: bool,
}

impl Cli {
    fn app_config(&self) -> AppConfig {
        AppConfig {
            config_file: self.config.clone(),
            types: self.types.clone(),
            document: self.document.clone(),
            storage_dir: self.storage.clone(),
            background: self.background.clone(),
            read_only: self.read_only,
            design: self.design,
            highlight: self.highlight.clone(),
            focus: self.focus.clone(),
            viewport: self.viewport.as_deref().and_then(|v| match v {
                [width, height] => Some(Size::new(*width, *height)),
                _ => None,
            }),
        }
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let config = cli.app_config();

    let mut app = match App::new(&config) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    app.load(config.background.as_deref());

    let applied = match &cli.script {
        Some(path) => match File::open(path) {
            Ok(file) => app.run_script(BufReader::new(file)),
            Err(e) => {
                eprintln!("Error reading script '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None if io::stdin().is_terminal() => Ok(0),
        None => app.run_script(io::stdin().lock()),
    };
    match applied {
        Ok(count) => log::info!("Applied {} commands", count),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }

    if cli.commit {
        app.save(SaveKind::Final);
    } else if cli.save {
        app.save(SaveKind::Partial);
    }

    let status = app.status();
    println!("{}", status.total_text());
    for category in &status.counts.categories {
        if let Some(text) = status.category_text(&category.id) {
            println!("  {}", text);
        }
    }
    if !status.info.is_empty() || !status.detail.is_empty() {
        println!("{} {}", status.info, status.detail);
    }
    if let Some(message) = status.last_message {
        println!("{}", message);
    }
}
