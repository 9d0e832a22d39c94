use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use addrscan::detection::{build_geometry_pipeline, load_image};
use addrscan::{AddressDetector, AppConfig, Session, Startup};

#[derive(Parser)]
#[command(name = "addrscan")]
#[command(about = "Find and read postal address blocks in scanned documents")]
struct Cli {
    /// Path to input image file
    #[arg(value_name = "IMAGE")]
    image_path: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// TOML file with detection tolerances and model paths
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Save per-step debug images to directory (must be empty)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,

    /// Write the annotated detection overlay to this file
    #[arg(long, value_name = "FILE")]
    annotated: Option<PathBuf>,

    /// Skip recognition and print the block hypotheses only
    #[arg(long)]
    skip_ocr: bool,

    /// Directory holding the ocrs detection/recognition models
    #[arg(long, value_name = "DIR")]
    models: Option<PathBuf>,

    /// Entity lexicon (token<TAB>LABEL per line)
    #[arg(long, value_name = "FILE")]
    lexicon: Option<PathBuf>,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "addrscan=debug" } else { "addrscan=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(args: &Cli) -> anyhow::Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(dir) = &args.models {
        config.models.ocr_dir = Some(dir.clone());
    }
    if let Some(lexicon) = &args.lexicon {
        config.models.lexicon = Some(lexicon.clone());
    }
    Ok(config)
}

fn print_hypotheses(args: &Cli, config: &AppConfig) -> anyhow::Result<()> {
    let mut pipeline = build_geometry_pipeline(&config.detection);
    if let Some(dir) = &args.debug_out {
        pipeline = pipeline.with_debug(dir.clone())?;
    }
    if args.verbose {
        println!("Steps: {}", pipeline.step_names().join(" -> "));
    }

    let img = load_image(&args.image_path)?;
    let data = pipeline.run(img)?;
    let window = config.detection.validation;

    println!("\n=== Block Hypotheses ===");
    println!("Merged line boxes: {}", data.merged.len());
    println!("Groups: {}", data.groups.len());

    for (i, group) in data.groups.iter().enumerate() {
        let Some(bounds) = group.bounds() else { continue };
        let marker = if window.accepts_group_size(group.len()) { "*" } else { " " };
        println!("{} Group {}: {} line(s) at {}", marker, i + 1, group.len(), bounds);
    }
    println!("(* would be sent for recognition)");

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    init_logging(args.verbose);

    let config = load_config(&args)?;

    if args.skip_ocr {
        return print_hypotheses(&args, &config);
    }

    let startup = Startup::load(config.models.clone());
    if args.verbose {
        println!("Loading OCR models and entity lexicon...");
    }
    let collaborators = startup
        .wait()
        .await
        .context("Failed to initialize recognition collaborators")?;

    let mut detector = AddressDetector::new(config.detection.clone(), collaborators);
    if let Some(dir) = args.debug_out.clone() {
        detector = detector.with_debug_dir(dir)?;
    }
    let session = Session::new(detector);

    if args.verbose {
        println!("Running detection on {:?}...", args.image_path);
    }
    let result = session.run(args.image_path.clone()).await?;

    if let Some(path) = &args.annotated {
        result
            .debug_image
            .save(path)
            .with_context(|| format!("Failed to save annotated image {}", path.display()))?;
    }

    println!("\n=== Address Detection Results ===");
    println!("Addresses found: {}", result.candidates.len());

    if result.candidates.is_empty() {
        println!("No address blocks detected.");
    } else {
        println!();
        print!("{}", result.extracted_text);
    }

    Ok(())
}
