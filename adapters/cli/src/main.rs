#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that boots the Pattern Loom experience.

mod config;
mod scene;

use std::ops::ControlFlow;

use anyhow::{Context, Result};
use clap::Parser;
use pattern_loom_rendering::{BoardLayout, Color, Presentation, RenderingBackend};
use pattern_loom_rendering_macroquad::MacroquadBackend;
use pattern_loom_session::PuzzleSession;
use pattern_loom_world::query;
use tracing::info;
use tracing_subscriber::EnvFilter;

use self::config::{CliArgs, LaunchConfig};

const WINDOW_TITLE: &str = "Pattern Loom";

/// Entry point for the Pattern Loom command-line interface.
fn main() -> Result<()> {
    init_tracing();

    let args = CliArgs::parse();
    let launch = LaunchConfig::from_args(&args)?;
    let seed = launch.seed.unwrap_or_else(rand::random);

    let mut session = PuzzleSession::seeded(seed, launch.tuning);
    info!("{}", query::welcome_banner(session.world()));
    let tuning = session.tuning();
    info!(
        seed,
        anomalies = tuning.count(),
        corruption_chance = tuning.corruption_chance(),
        "session started"
    );

    let layout = BoardLayout::new(
        BoardLayout::STANDARD_GRID_ORIGIN,
        BoardLayout::STANDARD_CELL_LENGTH,
        BoardLayout::STANDARD_PREVIEW_ORIGIN,
        BoardLayout::STANDARD_PREVIEW_SPACING,
    )
    .context("invalid board layout")?;
    let presentation = Presentation::new(
        WINDOW_TITLE,
        Color::BLACK,
        layout,
        scene::snapshot(&session),
    );
    let backend = MacroquadBackend::new()
        .with_vsync(launch.vsync)
        .with_show_fps(launch.show_fps);

    backend
        .run(presentation, move |dt, input, scene| {
            for press in input.key_presses {
                if session.handle_key(press).is_break() {
                    info!("quit requested");
                    return ControlFlow::Break(());
                }
            }
            let _ = session.advance(dt);
            *scene = scene::snapshot(&session);
            ControlFlow::Continue(())
        })
        .context("rendering backend failed")
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
