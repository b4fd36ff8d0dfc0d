use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use crossbeam_channel::bounded;
use tracing_subscriber::EnvFilter;

mod backend_bridge;
mod config;
mod controller;
mod ui;

use backend_bridge::commands::BackendCommand;
use controller::events::UiEvent;

#[derive(Parser, Debug)]
struct Args {
    /// Settings file to load instead of ./geofix.toml.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let args = Args::parse();
    let settings = config::load_settings(args.config.as_deref());

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(64);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(256);

    backend_bridge::runtime::launch(settings, cmd_rx, ui_tx);

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([420.0, 420.0])
            .with_title("Geofix"),
        ..Default::default()
    };
    eframe::run_native(
        "Geofix",
        native_options,
        Box::new(move |_cc| Ok(Box::new(ui::FinderApp::new(cmd_tx, ui_rx)))),
    )
    .map_err(|err| anyhow::anyhow!("failed to run the UI shell: {err}"))
}
