//! Native egui/eframe binary for the autocollimator lab.
//!
//! Loads the typed settings (file plus `AUTOLAB_` environment overrides),
//! initializes tracing, builds the Tokio runtime that drives the snapshot
//! broadcast and the auto-advance timer, and hands control to eframe.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use eframe::egui;
use mimalloc::MiMalloc;

use autocollimator_lab::app::LabApp;
use autocollimator_lab::config::LabSettings;
use autocollimator_lab::gui::LabGui;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Interactive autocollimator metrology experiment simulator.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Path to the configuration file (defaults to autocollimator.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let settings = match &args.config {
        Some(path) => LabSettings::load_from(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => LabSettings::load().context("loading configuration")?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_new(&settings.application.log_level)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!(
        focal_length_mm = settings.instrument.focal_length_mm,
        "Starting Autocollimator Lab"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .context("building Tokio runtime")?;

    let app = LabApp::new(
        settings.instrument.focal_length_mm,
        Duration::from_millis(settings.instrument.auto_advance_ms),
        runtime.handle().clone(),
    );

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([settings.window.width, settings.window.height])
            .with_min_inner_size([800.0, 600.0])
            .with_title(settings.application.name.clone()),
        ..Default::default()
    };

    eframe::run_native(
        &settings.application.name,
        options,
        Box::new(|cc| Ok(Box::new(LabGui::new(cc, app)))),
    )
    .map_err(|e| anyhow::anyhow!("eframe error: {e}"))
}
