//! Brickdrop — drag bricks onto the grid until the counts match the level target.

mod app;
mod board;
mod drag;
mod game;
mod input;
mod level;
mod presentation;
mod reconcile;
mod theme;
mod ui;
mod win;

use anyhow::{Context, Result};
use app::App;
use clap::{Parser, ValueEnum};
use level::{LevelBook, LevelId};
use std::path::PathBuf;

/// Options derived from CLI that affect the session (poll rate, feedback switches).
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub tick_rate: f64,
    pub mute: bool,
    pub particles: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args)?;

    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "theme load failed; using defaults");
        theme::Theme::default()
    });
    let levels = LevelBook::load(args.levels.as_deref()).with_context(|| match &args.levels {
        Some(p) => format!("loading levels from {}", p.display()),
        None => "loading built-in levels".to_string(),
    })?;
    let start = match args.level.as_deref() {
        Some(name) => {
            let id: LevelId = name.parse()?;
            levels
                .get(id)
                .map(|l| l.id)
                .with_context(|| format!("{id} is not in the level book"))?
        }
        None => levels.first().map(|l| l.id).context("level book is empty")?,
    };
    let config = GameConfig {
        tick_rate: args.tick_rate.clamp(1.0, 240.0),
        mute: args.mute,
        particles: !args.no_particles,
    };
    tracing::info!(levels = levels.levels().len(), %start, "starting brickdrop");

    let mut app = App::new(args.no_menu, config, theme, levels, start)?;
    app.run()?;
    Ok(())
}

/// The terminal belongs to the UI, so logs only go to a file when one is given.
fn init_logging(args: &Args) -> Result<()> {
    let Some(path) = &args.log_file else {
        return Ok(());
    };
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .with_max_level(args.log_level)
        .init();
    Ok(())
}

/// Drag-and-drop brick placement puzzle in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "brickdrop",
    version,
    about = "Drag bricks onto the grid until the stone and gold counts match the level target.",
    long_about = "Brickdrop is a terminal brick placement puzzle.\n\n\
        Drag a brick from the tray with the left mouse button and release it over a box. \
        A box takes the type of the brick dropped on it; dropping a different type replaces \
        the old one. Match every count in the target to clear the level.\n\n\
        CONTROLS:\n  Mouse drag  Move a brick   C  Check target   R  Restart level\n  \
        N / Enter   Next level     Q / Esc  Quit menu"
)]
pub struct Args {
    /// Level to start on: a number or a scene-style name such as "Level 2".
    #[arg(short, long, value_name = "LEVEL")]
    pub level: Option<String>,

    /// Level file with `level[ID].key = value` lines. Uses the built-in levels if not set.
    #[arg(long, value_name = "FILE")]
    pub levels: Option<PathBuf>,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Input poll ticks per second.
    #[arg(long, default_value = "60.0", value_name = "RATE")]
    pub tick_rate: f64,

    /// Do not ring the terminal bell on drops.
    #[arg(long)]
    pub mute: bool,

    /// Disable drop particle bursts.
    #[arg(long)]
    pub no_particles: bool,

    /// Skip the level menu and start immediately.
    #[arg(long)]
    pub no_menu: bool,

    /// Write logs to this file.
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Log level for --log-file.
    #[arg(long, default_value = "info", value_name = "LEVEL")]
    pub log_level: tracing::Level,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}
