use std::fs::File;
use std::io::stdout;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, enable_raw_mode},
};
use log::{error, info};
use ratatui::{Terminal, backend::CrosstermBackend};
use simplelog::{Config, LevelFilter, WriteLogger};

use pagebook::app::{App, AppConfig, Collaborators, run_app_with_event_source};
use pagebook::content::BookContent;
use pagebook::event_source::KeyboardEventSource;
use pagebook::narration::{CommandNarrationEngine, NarrationEngine};
use pagebook::panic_handler::{initialize_panic_handler, restore_terminal};
use pagebook::paths::{resolve_log_path, resolve_storage_path};
use pagebook::settings::Settings;
use pagebook::share::SystemShareActions;
use pagebook::storage::{JsonFileStore, KeyValueStore, MemoryStore};
use pagebook::theme::TerminalSurface;

#[derive(Parser)]
#[command(name = "pagebook")]
#[command(author, version, about = "Read an illustrated picture book in the terminal", long_about = None)]
struct Args {
    /// Book file (YAML). The bundled sample book is opened when omitted
    book: Option<PathBuf>,

    /// Settings file to use instead of the default one
    #[arg(long)]
    config: Option<PathBuf>,

    /// Where view/read counters and the reader profile are stored
    #[arg(long)]
    data_file: Option<PathBuf>,

    #[arg(long)]
    log_file: Option<PathBuf>,

    /// off, error, warn, info, debug or trace
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Keep counters in memory only
    #[arg(long)]
    ephemeral: bool,

    /// Don't ask for the reader's name on first start
    #[arg(long)]
    skip_welcome: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_path = match &args.log_file {
        Some(path) => path.clone(),
        None => resolve_log_path()?,
    };
    let log_level: LevelFilter = args
        .log_level
        .parse()
        .map_err(|_| anyhow!("Unknown log level {:?}", args.log_level))?;
    WriteLogger::init(
        log_level,
        Config::default(),
        File::create(&log_path).with_context(|| format!("Failed to create log file {log_path:?}"))?,
    )?;

    info!("Starting pagebook");

    let book = match &args.book {
        Some(path) => {
            BookContent::load(path).with_context(|| format!("Failed to load book {path:?}"))?
        }
        None => BookContent::sample().context("Bundled sample book is broken")?,
    };

    let settings = match &args.config {
        Some(path) => Settings::load_from_path(path),
        None => Settings::load_default(),
    };

    let store: Box<dyn KeyValueStore> = if args.ephemeral {
        Box::new(MemoryStore::new())
    } else {
        let path = match &args.data_file {
            Some(path) => path.clone(),
            None => resolve_storage_path()?,
        };
        Box::new(JsonFileStore::open_or_reset(&path))
    };

    let narration =
        CommandNarrationEngine::new(&settings.narration_command, &settings.narration_voices)
            .map(|engine| Box::new(engine) as Box<dyn NarrationEngine>);

    initialize_panic_handler();

    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut config = AppConfig::from_settings(&settings);
    config.show_welcome = !args.skip_welcome;
    config.initial_width = terminal.size()?.width;

    let mut app = App::new(
        book,
        Collaborators {
            store,
            narration,
            surface: Box::new(TerminalSurface),
            share_actions: Box::new(SystemShareActions),
        },
        config,
    );
    let res = run_app_with_event_source(&mut terminal, &mut app, &mut KeyboardEventSource);

    // silences any utterance still playing
    drop(app);
    restore_terminal();
    terminal.show_cursor()?;

    if let Err(err) = res {
        error!("Application error: {err:?}");
        eprintln!("{err:?}");
    }

    info!("Shutting down pagebook");
    Ok(())
}
