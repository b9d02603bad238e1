//! termframe - full-frame terminal renderer
//!
//! Displays a text file through the renderer: line numbers, the visible part
//! of the file, and a status line. Every frame is a full repaint.
//!
//! # Quick Start
//!
//! ```text
//! termframe notes.txt              # View a file
//! termframe --headless 40x10 a.rs  # Render once to stdout, no terminal needed
//! termframe --probe                # Find the terminal's real color pair ceiling
//! ```
//!
//! # Keys
//!
//! | Key | Action |
//! |-----|--------|
//! | q / Esc / Ctrl+C | Quit |
//! | Up/Down, j/k | Scroll one line |
//! | PageUp/PageDown | Scroll one page |
//! | g | Top |

use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use termframe::config::{self, Config, Palette, Theme};
use termframe::core::backend::TerminalBackend;
use termframe::core::crossterm_backend::{self, CrosstermBackend};
use termframe::core::memory::MemoryBackend;
use termframe::core::pairs::ColorPairRegistry;
use termframe::core::session::TerminalSession;
use termframe::ui::{DocumentView, FrameRenderer};

/// Probe a bit past the conventional 256 pair limit
const PROBE_LIMIT: u16 = 300;

const SAMPLE: &str = "termframe\n\
\n\
Every frame is erased and repainted in full.\n\
Parts are written left to right; columns advance by cell width.\n\
Text past the right edge is clipped, as are rows past the bottom.\n\
\n\
Wide glyphs count as two cells: 日本語\n\
\n\
Press q to quit.";

enum Mode {
    View,
    Headless { cols: u16, rows: u16 },
    Probe,
}

struct Args {
    mode: Mode,
    config_path: Option<PathBuf>,
    file: Option<PathBuf>,
}

/// Version string from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

fn print_help() {
    eprintln!("termframe {} - full-frame terminal renderer", VERSION);
    eprintln!();
    eprintln!("Usage: termframe [OPTIONS] [FILE]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -c, --config <PATH>       Config file (default: ~/.termframe/config.toml)");
    eprintln!("      --headless <COLSxROWS> Render once into memory and print the grid");
    eprintln!("      --probe               Probe the terminal's color pair ceiling");
    eprintln!("  -v, --version             Show version");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Keys: q/Esc/Ctrl+C quit, Up/Down/j/k scroll, PageUp/PageDown page, g top");
    eprintln!();
    eprintln!("Themes: {}", Theme::list().join(", "));
}

fn parse_size(s: &str) -> Result<(u16, u16), String> {
    let (cols, rows) = s
        .split_once(|c: char| c == 'x' || c == 'X')
        .ok_or_else(|| format!("Invalid size '{}', expected COLSxROWS", s))?;
    let cols = cols.parse().map_err(|_| format!("Invalid column count '{}'", cols))?;
    let rows = rows.parse().map_err(|_| format!("Invalid row count '{}'", rows))?;
    Ok((cols, rows))
}

fn parse_args() -> Result<Args, String> {
    let args: Vec<String> = env::args().collect();
    let mut parsed = Args {
        mode: Mode::View,
        config_path: None,
        file: None,
    };
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-v" | "--version" => {
                eprintln!("termframe {}", VERSION);
                std::process::exit(0);
            }
            "-c" | "--config" => {
                i += 1;
                let path = args.get(i).ok_or("Missing config path")?;
                parsed.config_path = Some(PathBuf::from(path));
            }
            "--headless" => {
                i += 1;
                let size = args.get(i).ok_or("Missing headless size")?;
                let (cols, rows) = parse_size(size)?;
                parsed.mode = Mode::Headless { cols, rows };
            }
            "--probe" => parsed.mode = Mode::Probe,
            arg if arg.starts_with('-') => {
                return Err(format!("Unknown option: {}", arg));
            }
            arg => parsed.file = Some(PathBuf::from(arg)),
        }
        i += 1;
    }

    Ok(parsed)
}

fn init_logging(level: &str) {
    let log_path = config::config_dir()
        .map(|dir| dir.join("termframe.log"))
        .unwrap_or_else(|| PathBuf::from("termframe.log"));

    // Open log file (append mode)
    let log_file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .ok();

    if let Some(file) = log_file {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }
}

/// Restore the terminal before the default hook prints the panic.
fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        crossterm_backend::restore_terminal();
        default_hook(info);
    }));
}

fn main() -> anyhow::Result<()> {
    let args = match parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Use --help for usage information");
            std::process::exit(1);
        }
    };

    // Logging needs the configured level, so report config problems after
    let loaded = Config::load_from(args.config_path.as_deref());
    let config = loaded.as_ref().cloned().unwrap_or_default();
    init_logging(&config.log_level);
    if let Err(e) = &loaded {
        warn!("Using default configuration: {}", e);
    }

    info!("termframe {} starting...", VERSION);

    let (name, text) = match &args.file {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            (path.display().to_string(), text)
        }
        None => ("[sample]".to_string(), SAMPLE.to_string()),
    };
    let view = DocumentView::new(name, &text);

    let result = match args.mode {
        Mode::View => run_view(&config, view),
        Mode::Headless { cols, rows } => run_headless(&config, &view, cols, rows),
        Mode::Probe => run_probe(),
    };
    if let Err(e) = &result {
        error!("{:#}", e);
    }
    result
}

/// Initialize colors and register the theme; monochrome terminals get an
/// empty palette and render unstyled.
fn start_session<B: TerminalBackend>(
    session: &mut TerminalSession<B>,
    config: &Config,
) -> (ColorPairRegistry, Palette) {
    let theme = config.theme();
    let mut themed = None;
    let capabilities = session.init_colors_with(|session, caps| {
        themed = Some(theme.setup(session, caps.max_pairs));
    });
    info!(
        "Colors: has_colors={} can_change_color={} max_pairs={} theme={}",
        capabilities.has_colors, capabilities.can_change_color, capabilities.max_pairs, theme.name
    );

    if config.hide_cursor {
        // Might fail on vt100 terminal emulators
        session.set_cursor_visibility(false);
    }

    themed.unwrap_or_else(|| (ColorPairRegistry::new(0), Palette::default()))
}

fn run_view(config: &Config, mut view: DocumentView) -> anyhow::Result<()> {
    install_panic_hook();

    let mut session = TerminalSession::initialize(CrosstermBackend::new())?;
    let (cols, rows) = session.size();
    info!("Terminal size: {}x{}", cols, rows);

    let (registry, palette) = start_session(&mut session, config);
    info!("Registered {} color pairs", registry.len());

    let mut renderer = FrameRenderer::new();
    let mut dirty = true;

    loop {
        if dirty {
            let (cols, rows) = session.size();
            let screen = view.build_screen(cols, rows, &palette);
            let stats = renderer.render(&mut session, &screen)?;
            if stats.failed_writes > 0 {
                warn!("Frame had {} failed writes", stats.failed_writes);
            }
            dirty = false;
        }

        let page = session.size().1.saturating_sub(1).max(1) as isize;
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                match (key.code, key.modifiers) {
                    (KeyCode::Char('q'), _) | (KeyCode::Esc, _) => break,
                    (KeyCode::Char('c'), KeyModifiers::CONTROL) => break,
                    (KeyCode::Up, _) | (KeyCode::Char('k'), _) => view.scroll_by(-1),
                    (KeyCode::Down, _) | (KeyCode::Char('j'), _) => view.scroll_by(1),
                    (KeyCode::PageUp, _) => view.scroll_by(-page),
                    (KeyCode::PageDown, _) | (KeyCode::Char(' '), _) => view.scroll_by(page),
                    (KeyCode::Char('g'), _) => view.scroll_to_top(),
                    _ => continue,
                }
                dirty = true;
            }
            Event::Resize(_, _) => {
                let (cols, rows) = session.query_dimensions()?;
                info!("Resize: {}x{}", cols, rows);
                dirty = true;
            }
            _ => {}
        }
    }

    session.shutdown();
    info!("termframe exiting");
    Ok(())
}

fn run_headless(
    config: &Config,
    view: &DocumentView,
    cols: u16,
    rows: u16,
) -> anyhow::Result<()> {
    let mut session = TerminalSession::initialize(MemoryBackend::new(cols, rows))?;
    let (_registry, palette) = start_session(&mut session, config);

    let screen = view.build_screen(cols, rows, &palette);
    let stats = FrameRenderer::new().render(&mut session, &screen)?;
    info!("Headless frame: {:?}", stats);

    println!("{}", session.backend().contents());
    Ok(())
}

fn run_probe() -> anyhow::Result<()> {
    install_panic_hook();

    let report = {
        let mut session = TerminalSession::initialize(CrosstermBackend::new())?;
        session.init_colors();
        ColorPairRegistry::capability_probe(&mut session, PROBE_LIMIT)
    };
    info!("Probe: {:?}", report);

    println!("Advertised color pairs: {}", report.advertised);
    println!("Highest accepted pair id: {}", report.ceiling());
    match report.first_rejected {
        Some(id) => println!("First rejected pair id: {}", id),
        None => println!("No pair id below {} was rejected", PROBE_LIMIT),
    }
    Ok(())
}
