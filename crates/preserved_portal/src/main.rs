//! preserved-portal - a video player that survives navigation
//!
//! Main entry point for the headless demo. Each argument is one step:
//! a path to navigate to (`/video/1`), or one of `back`, `close`, `play`,
//! `seek=<seconds>`, `tick=<seconds>`. The final document is printed as
//! markup.

mod app;
mod layout;
mod media;
mod mini_player;
mod routes;

use anyhow::{bail, Context, Result};
use app::App;
use once_cell::sync::Lazy;
use std::time::Instant;
use tracing::{error, info};

/// Application startup time for performance monitoring
static STARTUP_TIME: Lazy<Instant> = Lazy::new(Instant::now);

/// Steps run when no arguments are given.
const DEMO_SCRIPT: &[&str] = &["/video/1", "play", "tick=12", "/about", "back", "/", "close"];

/// Check if debug mode is enabled via environment variable.
fn is_debug_mode() -> bool {
    std::env::var("PRESERVED_PORTAL_DEBUG").is_ok()
}

/// Initialize the logging system.
fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let default_filter = if is_debug_mode() {
        "preserved_portal=trace,portal=trace,player=debug,render_tree=debug,info"
    } else {
        "preserved_portal=info,warn"
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_line_number(true))
        .with(filter)
        .init();

    if is_debug_mode() {
        info!(
            "preserved-portal v{} starting up (DEBUG MODE ENABLED)",
            env!("CARGO_PKG_VERSION")
        );
        info!("Set RUST_LOG for custom log levels, e.g. RUST_LOG=portal=trace");
    } else {
        info!("preserved-portal v{} starting up", env!("CARGO_PKG_VERSION"));
    }
}

/// One scripted step.
#[derive(Debug, PartialEq)]
enum Step {
    Navigate(String),
    Back,
    Close,
    Play,
    Seek(f64),
    Tick(f64),
}

impl Step {
    fn parse(arg: &str) -> Result<Self> {
        if arg.starts_with('/') {
            return Ok(Self::Navigate(arg.to_string()));
        }
        let seconds = |value: &str| {
            value
                .parse::<f64>()
                .with_context(|| format!("Invalid seconds in '{}'", arg))
        };
        match arg.split_once('=') {
            None if arg == "back" => Ok(Self::Back),
            None if arg == "close" => Ok(Self::Close),
            None if arg == "play" => Ok(Self::Play),
            Some(("seek", value)) => Ok(Self::Seek(seconds(value)?)),
            Some(("tick", value)) => Ok(Self::Tick(seconds(value)?)),
            _ => bail!("Unknown step '{}'", arg),
        }
    }

    fn run(&self, app: &mut App) -> Result<()> {
        match self {
            Self::Navigate(path) => app.navigate(path)?,
            Self::Back => app.return_from_mini_player()?,
            Self::Close => app.close_mini_player(),
            Self::Play => app.player().toggle_play(),
            Self::Seek(seconds) => app.player().seek(*seconds),
            Self::Tick(seconds) => {
                let duration = app.player().state().duration;
                app.video().on_time_update(*seconds, duration);
            }
        }
        Ok(())
    }
}

fn run(args: Vec<String>) -> Result<()> {
    if let Some(path) = settings::ensure_config_file() {
        info!("Using config at {:?}", path);
    }
    let config = settings::load_config();
    let mut app = App::new(&config).context("Failed to start")?;

    let steps = if args.is_empty() {
        DEMO_SCRIPT.iter().map(|step| step.to_string()).collect()
    } else {
        args
    };
    for arg in &steps {
        let step = Step::parse(arg)?;
        step.run(&mut app)
            .with_context(|| format!("Step '{}' failed", arg))?;
        let state = app.portal().state();
        info!(
            step = %arg,
            active_slot = ?state.active_slot(),
            return_path = ?state.return_path(),
            suspended = app.host().is_suspended(),
            "step done"
        );
    }

    println!("{}", app.markup());
    info!("Finished in {:?}", STARTUP_TIME.elapsed());
    Ok(())
}

fn main() {
    let _ = *STARTUP_TIME;
    init_logging();

    if let Err(e) = run(std::env::args().skip(1).collect()) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}
