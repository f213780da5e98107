use std::rc::Rc;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow, bail};
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};

use rephrase::collab::{LogSpeaker, TagTableLookup};
use rephrase::config::EngineConfig;
use rephrase::controller::SystemClock;
use rephrase::dom::template::build_default_document;
use rephrase::model::{Channel, SlotName};
use rephrase::projector::DomProjector;
use rephrase::projector::layout::FixedWidthMeasurer;
use rephrase::session::Session;
use rephrase::store::{ExampleStore, FsSource, PresetResolver, ZipSource};
use rephrase::visibility::{FileStorage, VisibilityStore};

#[derive(Parser, Debug)]
#[command(author, version, about = "Render and validate slot drill presets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Project one sentence of a preset and print the HTML snapshot
    Render {
        /// Preset .json file, preset .zip bundle, or preset id (with --search)
        #[arg(value_name = "PRESET")]
        preset: String,
        /// Directories searched for `<PRESET>.json` when PRESET is an id
        #[arg(long = "search", value_name = "DIR")]
        search: Vec<Utf8PathBuf>,
        /// Sentence to show (random otherwise)
        #[arg(long)]
        sentence: Option<String>,
        /// Seed for the random sentence choice
        #[arg(long)]
        seed: Option<u64>,
        /// Expand the subslot region of this slot
        #[arg(long, value_name = "SLOT")]
        expand: Option<String>,
        /// Hide a channel, e.g. `slot-m1-sub-o1:text` (repeatable)
        #[arg(long = "hide", value_name = "ELEMENT:CHANNEL")]
        hide: Vec<String>,
        /// Log the phrase of this slot or subslot element as speech (repeatable)
        #[arg(long = "speak", value_name = "ELEMENT")]
        speak: Vec<String>,
        /// Directory holding persisted visibility state
        #[arg(long, value_name = "DIR")]
        state: Option<Utf8PathBuf>,
        /// Image tag table (JSON)
        #[arg(long, value_name = "FILE")]
        images: Option<Utf8PathBuf>,
        /// Engine config (JSON)
        #[arg(long, value_name = "FILE")]
        config: Option<Utf8PathBuf>,
        /// Print the slot tree and flags as JSON instead of HTML
        #[arg(long)]
        json: bool,
    },
    /// Validate preset files
    Check {
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<Utf8PathBuf>,
    },
    /// List presets found below the given directories
    Presets {
        #[arg(value_name = "DIR", required = true)]
        dirs: Vec<Utf8PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .format_timestamp(None)
        .init();
    let cli = Cli::parse();
    match cli.command {
        Command::Render {
            preset,
            search,
            sentence,
            seed,
            expand,
            hide,
            speak,
            state,
            images,
            config,
            json,
        } => render(RenderArgs {
            preset,
            search,
            sentence,
            seed,
            expand,
            hide,
            speak,
            state,
            images,
            config,
            json,
        }),
        Command::Check { paths } => check(&paths),
        Command::Presets { dirs } => presets(&dirs),
    }
}

struct RenderArgs {
    preset: String,
    search: Vec<Utf8PathBuf>,
    sentence: Option<String>,
    seed: Option<u64>,
    expand: Option<String>,
    hide: Vec<String>,
    speak: Vec<String>,
    state: Option<Utf8PathBuf>,
    images: Option<Utf8PathBuf>,
    config: Option<Utf8PathBuf>,
    json: bool,
}

fn render(args: RenderArgs) -> Result<()> {
    let cfg = match &args.config {
        Some(p) => EngineConfig::load(p)?,
        None => EngineConfig::default(),
    };
    let vis = match &args.state {
        Some(dir) => VisibilityStore::open_with_key(Rc::new(FileStorage::new(dir)), &cfg.visibility_key),
        None => VisibilityStore::in_memory(),
    };
    let mut projector = DomProjector::new(
        Box::new(rephrase::collab::NoImages),
        Box::new(FixedWidthMeasurer::default()),
    );
    if let Some(path) = &args.images {
        let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))?;
        projector.set_images(Box::new(TagTableLookup::from_json(&text)?));
    }

    let doc = build_default_document()?;
    let mut session = Session::new(cfg, doc, vis, Rc::new(SystemClock::new()))
        .with_projector(projector)
        .with_speaker(Box::new(LogSpeaker));
    if let Some(seed) = args.seed {
        session = session.with_seed(seed);
    }

    load(&mut session, &args.preset, &args.search)?;
    match &args.sentence {
        Some(id) => session.randomize_to(id)?,
        None => session.randomize()?,
    };

    for spec in &args.hide {
        let (element, channel) = spec
            .rsplit_once(':')
            .ok_or_else(|| anyhow!("--hide expects ELEMENT:CHANNEL, got '{}'", spec))?;
        let channel = Channel::from_str(channel)?;
        if let Err(err) = session.set_visibility(element, channel, false) {
            log::warn!("--hide {}: {}", spec, err);
        }
    }
    if let Some(slot) = &args.expand {
        let slot = SlotName::from_str(slot)?;
        session.toggle_subslot(slot)?;
    }
    for element in &args.speak {
        if let Err(err) = session.speak(element) {
            log::warn!("--speak {}: {}", element, err);
        }
    }

    if args.json {
        let out = serde_json::json!({
            "preset": session.store().preset_id(),
            "sentence": session.current_sentence(),
            "tree": session.tree(),
            "visibility": session.visibility().to_json(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        print!("{}", session.render_html());
    }
    Ok(())
}

fn load(session: &mut Session, preset: &str, search: &[Utf8PathBuf]) -> Result<()> {
    let path = Utf8PathBuf::from(preset);
    if path.extension() == Some("zip") {
        let file = std::fs::File::open(&path).with_context(|| format!("Open {}", path))?;
        let mut source = ZipSource::new(std::io::BufReader::new(file))?;
        let entry = source
            .entries()?
            .into_iter()
            .find(|p| p.extension() == Some("json"))
            .ok_or_else(|| anyhow!("No preset JSON inside {}", path))?;
        let id = entry.file_stem().unwrap_or("bundle").to_string();
        session.load_preset(&id, &mut source, &entry)?;
        return Ok(());
    }
    let resolved = if path.is_file() {
        path.clone()
    } else if search.is_empty() {
        bail!("{} is not a file; pass --search DIR to look it up as a preset id", path);
    } else {
        PresetResolver::new(search)
            .find(preset)
            .ok_or_else(|| anyhow!("Preset '{}' not found in {:?}", preset, search))?
    };
    let id = resolved.file_stem().unwrap_or(preset).to_string();
    session.load_preset(&id, &mut FsSource, &resolved)?;
    Ok(())
}

fn check(paths: &[Utf8PathBuf]) -> Result<()> {
    let mut failed = 0usize;
    for (path, result) in ExampleStore::validate_all(paths) {
        match result {
            Ok(n) => println!("ok    {} ({} rows)", path, n),
            Err(err) => {
                failed += 1;
                println!("FAIL  {}: {:#}", path, err);
            }
        }
    }
    if failed > 0 {
        bail!("{} of {} preset files failed", failed, paths.len());
    }
    Ok(())
}

fn presets(dirs: &[Utf8PathBuf]) -> Result<()> {
    for entry in PresetResolver::new(dirs).scan() {
        println!("{}\t{}", entry.id, entry.path);
    }
    Ok(())
}
