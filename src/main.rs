//! WeldVision - weld groove symbol interpretation from the command line

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use weld_vision::analysis::context::WeldSymbolContext;
use weld_vision::config::{self, AppConfig};
use weld_vision::vision::overlay::draw_detections;
use weld_vision::vision::{Detection, JsonTextSource, NoText, RecognizedText, TemplateSet, TextRecognizer};
use weld_vision::{capture, set_manual, GrooveSymbol, ManualEntry, WeldAnalyzer};

/// Default template directory when neither the command line nor the config names one
const DEFAULT_TEMPLATE_DIR: &str = "assets/templates";

/// WeldVision - read groove details from a weld symbol photo
#[derive(Parser, Debug)]
#[command(name = "weld-vision")]
#[command(about = "Interprets welding symbol photos into structured groove data")]
struct Cli {
    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to the platform config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze a weld symbol image
    Analyze(AnalyzeArgs),
    /// Validate manually entered groove data
    Manual(ManualArgs),
    /// Write the default configuration file
    InitConfig {
        /// Destination (defaults to the platform config directory)
        path: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Image to analyze
    image: PathBuf,

    /// JSON file of recognized text fragments for the image
    #[arg(long)]
    ocr: Option<PathBuf>,

    /// Directory holding the eight groove templates
    #[arg(long)]
    templates: Option<PathBuf>,

    /// Save the normalized image with detections drawn on it
    #[arg(long)]
    overlay: Option<PathBuf>,

    /// Save the normalized image
    #[arg(long)]
    save_normalized: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ManualArgs {
    #[arg(long, default_value = "None")]
    arrow_groove: String,
    #[arg(long, default_value = "None")]
    other_groove: String,
    #[arg(long, default_value = "")]
    arrow_depth: String,
    #[arg(long, default_value = "")]
    other_depth: String,
    #[arg(long, default_value = "")]
    root_opening: String,
    #[arg(long, default_value = "")]
    arrow_angle: String,
    #[arg(long, default_value = "")]
    other_angle: String,
}

/// JSON report printed by `analyze`
#[derive(Serialize)]
struct Report<'a> {
    image: &'a Path,
    normalized_size: (u32, u32),
    reference_line: Option<u32>,
    detections: &'a [Detection],
    recognized_texts: &'a [RecognizedText],
    context: &'a WeldSymbolContext,
    groove: &'a GrooveSymbol,
    processing_time_ms: u64,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Command::Analyze(args) => {
            let config = load_or_default_config(cli.config.as_deref());
            run_analyze(&args, &config)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Manual(args) => run_manual(args),
        Command::InitConfig { path } => {
            let path = match path.or(cli.config) {
                Some(path) => path,
                None => config::default_config_path()?,
            };
            config::save_config(&AppConfig::default(), &path)
                .with_context(|| format!("Failed to write config to {:?}", path))?;
            println!("Wrote default configuration to {}", path.display());
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Explicit config path must load; the platform default is optional
fn load_or_default_config(explicit: Option<&Path>) -> AppConfig {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => config::default_config_path().ok().filter(|p| p.exists()),
    };

    if let Some(path) = path {
        match config::load_config(&path) {
            Ok(config) => {
                info!("Loaded configuration from {:?}", path);
                return config;
            }
            Err(e) => warn!("Ignoring configuration {:?}: {:#}", path, e),
        }
    }
    info!("Using default configuration");
    AppConfig::default()
}

fn run_analyze(args: &AnalyzeArgs, config: &AppConfig) -> Result<()> {
    let template_dir = args
        .templates
        .clone()
        .or_else(|| config.templates.directory.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_TEMPLATE_DIR));
    let templates = TemplateSet::load_dir(&template_dir, config.detection.default_threshold)
        .with_context(|| format!("Failed to load templates from {:?}", template_dir))?;

    let frame = capture::load_image(&args.image)
        .with_context(|| format!("Cannot analyze {:?}", args.image))?;

    match &args.ocr {
        Some(path) => {
            let source = JsonTextSource::from_path(path)?;
            analyze_and_report(args, config, templates, source, frame)
        }
        None => analyze_and_report(args, config, templates, NoText, frame),
    }
}

fn analyze_and_report<R: TextRecognizer>(
    args: &AnalyzeArgs,
    config: &AppConfig,
    templates: TemplateSet,
    recognizer: R,
    frame: capture::CapturedFrame,
) -> Result<()> {
    let analyzer = WeldAnalyzer::with_recognizer(Arc::new(templates), recognizer, config);
    let analysis = analyzer.analyze(&frame);

    if let Some(path) = &args.save_normalized {
        analysis
            .normalized
            .save(path)
            .with_context(|| format!("Failed to save normalized image to {:?}", path))?;
        info!("Saved normalized image to {:?}", path);
    }

    if let Some(path) = &args.overlay {
        draw_detections(&analysis.normalized, &analysis.detections, analysis.reference_line)
            .save(path)
            .with_context(|| format!("Failed to save overlay to {:?}", path))?;
        info!("Saved overlay to {:?}", path);
    }

    let report = Report {
        image: &args.image,
        normalized_size: analysis.normalized.dimensions(),
        reference_line: analysis.reference_line,
        detections: &analysis.detections,
        recognized_texts: &analysis.recognized_texts,
        context: &analysis.context,
        groove: &analysis.groove,
        processing_time_ms: analysis.processing_time_ms,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn run_manual(args: ManualArgs) -> Result<ExitCode> {
    let entry = ManualEntry {
        arrow_groove: args.arrow_groove,
        other_groove: args.other_groove,
        arrow_depth: args.arrow_depth,
        other_depth: args.other_depth,
        root_opening: args.root_opening,
        arrow_angle: args.arrow_angle,
        other_angle: args.other_angle,
    };

    match set_manual(&entry) {
        Ok(symbol) => {
            println!("{}", serde_json::to_string_pretty(&symbol)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            let fields: Vec<String> = e.fields().iter().map(ToString::to_string).collect();
            if fields.is_empty() {
                eprintln!("{}", e);
            } else {
                eprintln!("{} ({})", e, fields.join(", "));
            }
            Ok(ExitCode::FAILURE)
        }
    }
}
