//! Open the interactive drill window (requires `--features egui`).
//!
//! Usage:
//!   cargo run --features egui --example drill -- [PRESET.json] --search presets/ --state ~/.rephrase
//!
//! Without PRESET the last preset opened is looked up again in the search directories.

#[cfg(feature = "egui")]
use anyhow::{Result, anyhow};
#[cfg(feature = "egui")]
use camino::Utf8PathBuf;
#[cfg(feature = "egui")]
use clap::Parser;

#[cfg(feature = "egui")]
use {
    eframe::egui,
    rephrase::collab::LogSpeaker,
    rephrase::config::EngineConfig,
    rephrase::controller::SystemClock,
    rephrase::dom::template::build_default_document,
    rephrase::egui_app::DrillApp,
    rephrase::session::Session,
    rephrase::store::PresetResolver,
    rephrase::visibility::{FileStorage, KeyValueStorage, VisibilityStore},
    std::rc::Rc,
};

#[cfg(feature = "egui")]
#[derive(Parser, Debug)]
#[command(author, version, about = "Interactive slot drill", long_about = None)]
struct Args {
    /// Preset JSON file
    #[arg(value_name = "PRESET")]
    preset: Option<Utf8PathBuf>,

    /// Directories searched for the last opened preset
    #[arg(long = "search", value_name = "DIR")]
    search: Vec<Utf8PathBuf>,

    /// Directory holding visibility flags and UI preferences
    #[arg(long, value_name = "DIR", default_value = ".rephrase")]
    state: Utf8PathBuf,

    /// Engine config (JSON)
    #[arg(long, value_name = "FILE")]
    config: Option<Utf8PathBuf>,
}

#[cfg(feature = "egui")]
fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .format_timestamp(None)
        .init();
    let args = Args::parse();

    let cfg = match &args.config {
        Some(p) => EngineConfig::load(p)?,
        None => EngineConfig::default(),
    };
    let storage = Rc::new(FileStorage::new(&args.state));
    let vis = VisibilityStore::open_with_key(storage.clone(), &cfg.visibility_key);
    let session = Session::new(cfg, build_default_document()?, vis, Rc::new(SystemClock::new()))
        .with_speaker(Box::new(LogSpeaker));
    let prefs_storage: Rc<dyn KeyValueStorage> = storage;
    let mut app = DrillApp::new(session, prefs_storage);

    let preset = match args.preset {
        Some(p) => Some(p),
        None => app
            .prefs
            .last_preset
            .as_deref()
            .and_then(|id| PresetResolver::new(&args.search).find(id)),
    };
    match &preset {
        Some(path) => app.open_preset(path),
        None => log::info!("no preset given and none remembered; starting empty"),
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1280.0, 800.0]),
        ..Default::default()
    };
    eframe::run_native("rephrase drill", options, Box::new(|_cc| Ok(Box::new(app))))
        .map_err(|e| anyhow!("{e}"))?;
    Ok(())
}

#[cfg(not(feature = "egui"))]
fn main() {
    eprintln!("This example requires the `egui` feature: cargo run --features egui --example drill");
}
