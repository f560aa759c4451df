//! CLI tool for removing watermark links and corner logos from PowerPoint files.

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use unmark_core::{
    CleanReport, CleanerConfig, PresentationFormat, WatermarkCleaner, DEFAULT_CORNER_THRESHOLD,
    DEFAULT_TARGET_DOMAIN,
};
use unmark_pptx::PptxPackage;

/// Remove watermark hyperlinks, linked shapes, and corner logos from a presentation.
#[derive(Parser, Debug)]
#[command(name = "pptx-unmark")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input PowerPoint file (.pptx)
    input: PathBuf,

    /// Output file (default: <input>-cleaned.pptx next to the input)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Hyperlink substring identifying the watermark (case-insensitive)
    #[arg(short, long, default_value_t = DEFAULT_TARGET_DOMAIN.to_string())]
    domain: String,

    /// Fraction of slide width/height where the bottom-right corner region starts
    #[arg(short = 't', long, default_value_t = DEFAULT_CORNER_THRESHOLD)]
    corner_threshold: f64,

    /// Clean in memory and report, without writing an output file
    #[arg(long)]
    dry_run: bool,

    /// Print the cleaning report as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let config = CleanerConfig::new()
        .with_target_domain(&args.domain)
        .with_corner_threshold(args.corner_threshold);
    let cleaner = WatermarkCleaner::new(config).context("Invalid cleaner settings")?;

    check_format(&args.input)?;

    let output_path = match &args.output {
        Some(path) => path.clone(),
        None => default_output_path(&args.input),
    };

    if !args.json {
        println!("Processing file: {}", args.input.display());
        println!("Target domain: {}", cleaner.config().target_domain());
    }

    let mut package = PptxPackage::open(&args.input)
        .with_context(|| format!("Failed to open {}", args.input.display()))?;

    if !args.json {
        println!("Slides: {}", package.slide_count());
    }

    let report = cleaner.clean(&mut package);
    log::debug!("Output path: {}", output_path.display());

    if !args.dry_run {
        package
            .save(&output_path)
            .with_context(|| format!("Failed to write {}", output_path.display()))?;
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, (!args.dry_run).then_some(output_path.as_path()));
    }

    Ok(())
}

/// Reject inputs that are not PPTX packages before trying to open them.
fn check_format(input_path: &Path) -> Result<()> {
    let mut file = File::open(input_path)
        .with_context(|| format!("Failed to open {}", input_path.display()))?;

    // Read magic bytes to detect format
    let mut magic = [0u8; 8];
    let read = file
        .read(&mut magic)
        .with_context(|| "Failed to read file header")?;

    let extension = input_path.extension().and_then(|e| e.to_str());
    PresentationFormat::require_pptx(&magic[..read], extension)
        .with_context(|| format!("Cannot clean {}", input_path.display()))?;

    Ok(())
}

/// `<dir>/<stem>-cleaned.pptx` for an input `<dir>/<stem>.pptx`.
fn default_output_path(input_path: &Path) -> PathBuf {
    let stem = input_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");

    let output_filename = format!("{}-cleaned.pptx", stem);

    match input_path.parent() {
        Some(parent) => parent.join(output_filename),
        None => PathBuf::from(output_filename),
    }
}

/// Human-readable summary, one block per container that changed.
fn print_report(report: &CleanReport, output_path: Option<&Path>) {
    for container in report.containers.iter().filter(|c| c.is_eventful()) {
        println!("\n[{} {}] {}", container.kind, container.number, container.label);

        if container.corner_pictures_removed > 0 {
            println!(
                "  ✓ Removed {} corner picture(s) due to target-domain link",
                container.corner_pictures_removed
            );
        }
        if container.shapes_removed > 0 {
            println!(
                "  ✓ Removed {} shape(s) with target-domain link",
                container.shapes_removed
            );
        }
        if container.links_removed > 0 {
            println!(
                "  ✓ Stripped {} hyperlink(s) from text",
                container.links_removed
            );
        }
        for warning in &container.warnings {
            println!("  ! {}", warning);
        }
        if let Some(error) = &container.error {
            println!("  ! Error processing shapes: {}", error);
        }
    }

    println!("\n{}", "=".repeat(60));
    println!("RESULT");
    println!("Links removed: {}", report.links_removed());
    println!("Shapes removed (incl. pictures): {}", report.shapes_removed());
    println!("Corner pictures removed: {}", report.corner_pictures_removed());
    println!("Total removed: {}", report.total());

    match output_path {
        Some(path) => println!("Cleaned file: {}", path.display()),
        None => println!("Dry run: no file written"),
    }
}
