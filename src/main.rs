use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use starscape::app::App;
use starscape::config::{self, Config};
use starscape::logging;
use starscape::prefs::{FilePreferences, MemoryPreferences, PreferenceStorage};
use starscape::store::ThemeStore;
use starscape::theme::ThemeState;
use starscape::ui::ui;
use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

// ============================================================================
// MAIN
// ============================================================================

#[derive(Parser)]
#[command(name = "starscape")]
#[command(author = "Ninso112")]
#[command(version)]
#[command(about = "An animated starfield and nebula backdrop for your terminal", long_about = None)]
struct Cli {
    /// Generate default configuration file
    #[arg(short, long)]
    init: bool,

    /// Specify custom config file path
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Background style to switch to: starfield or nebula
    #[arg(short, long, value_name = "STYLE")]
    style: Option<String>,

    /// Color scheme to switch to (red, rose, orange, green, blue, yellow, violet, none)
    #[arg(long, value_name = "SCHEME")]
    scheme: Option<String>,

    /// Switch to light mode
    #[arg(short, long)]
    light: bool,

    /// Write logs here instead of the cache directory
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Handle --init flag
    if cli.init {
        return generate_config_file();
    }

    let _log_guard = match cli.log_file.clone().or_else(logging::default_log_path) {
        Some(path) => Some(logging::init_logging(&path)?),
        None => None,
    };
    info!(version = env!("CARGO_PKG_VERSION"), "starscape starting");

    // Load configuration
    let config = if let Some(config_path) = &cli.config {
        config::load_config_from_path(config_path)?
    } else {
        config::load_config()
    };

    let store = open_store(&cli)?;

    // Setup terminal
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableFocusChange
    )
    .context("Failed to setup terminal")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;
    terminal.hide_cursor().context("Failed to hide cursor")?;

    // Run the app
    let size = terminal.size().context("Failed to query terminal size")?;
    let mut app = App::new(config, store, size.width, size.height);
    let res = run_app(&mut terminal, &mut app);
    drop(app);

    // Restore terminal
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableFocusChange
    )
    .context("Failed to restore terminal")?;
    terminal.show_cursor().context("Failed to show cursor")?;

    if let Err(err) = res {
        error!("{:#}", err);
        eprintln!("Error: {:?}", err);
    }

    info!("starscape exiting");
    Ok(())
}

fn generate_config_file() -> Result<()> {
    let config_path = config::get_config_path().context("Could not determine config directory")?;

    config::generate_config_file(&config_path)?;

    println!(
        "Default configuration file created at: {}",
        config_path.display()
    );
    println!("Edit this file to customize starscape's appearance and behavior.");

    Ok(())
}

/// Loads the persisted theme and applies command line overrides, which are
/// persisted like any other change.
fn open_store(cli: &Cli) -> Result<ThemeStore> {
    let storage: Box<dyn PreferenceStorage> =
        match FilePreferences::default_path().and_then(FilePreferences::open) {
            Ok(prefs) => {
                info!(path = %prefs.path().display(), "preferences opened");
                Box::new(prefs)
            }
            Err(err) => {
                warn!(%err, "preferences unavailable, theme changes will not be saved");
                Box::new(MemoryPreferences::new())
            }
        };

    let mut store = ThemeStore::load(storage, ThemeState::default());

    if let Some(style) = &cli.style {
        store
            .set_background_style_str(style)
            .with_context(|| format!("Invalid --style value: {}", style))?;
    }
    if let Some(scheme) = &cli.scheme {
        store
            .set_color_scheme_str(scheme)
            .with_context(|| format!("Invalid --scheme value: {}", scheme))?;
    }
    if cli.light {
        store.set_dark_mode(false);
    }

    Ok(store)
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    let frame_interval = Duration::from_millis(app.config.background.frame_interval_ms());
    let started = Instant::now();
    let mut next_frame = started;
    let mut dirty = true;

    loop {
        let now = Instant::now();
        if now >= next_frame {
            let now_ms = now.duration_since(started).as_secs_f64() * 1000.0;
            dirty |= app.tick(now_ms);
            next_frame = now + frame_interval;
        }

        if dirty {
            terminal.draw(|f| ui(f, app))?;
            dirty = false;
        }

        if app.should_quit() {
            break;
        }

        let timeout = next_frame.saturating_duration_since(Instant::now());
        if event::poll(timeout)? {
            app.handle_event(&event::read()?);
            dirty = true;
        }
    }
    Ok(())
}
