//! `tryon` CLI - virtual shoe try-on.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use virtual_tryon::model::{ModelSource, DEFAULT_MODEL_PATH};
use virtual_tryon::{Catalog, Config, ModelHandle, TryOnService};

/// Try a catalog shoe on a sample foot with a pix2pix generator.
#[derive(Parser, Debug)]
#[command(name = "tryon")]
#[command(version, about, long_about = None)]
struct Args {
    /// Catalog JSON file. Defaults to the built-in catalog.
    #[arg(long, global = true, value_name = "FILE")]
    catalog: Option<PathBuf>,

    /// Directory catalog image paths are relative to.
    #[arg(long, global = true, default_value = ".", value_name = "DIR")]
    assets: PathBuf,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List shoes and foot samples.
    Catalog,

    /// Composite a shoe onto a foot sample and save the result.
    TryOn(TryOnArgs),
}

#[derive(clap::Args, Debug)]
struct TryOnArgs {
    /// Shoe identifier, e.g. `shoe_1`.
    #[arg(long, value_name = "ID")]
    shoe: String,

    /// Foot sample identifier, e.g. `sample_1`.
    #[arg(long, default_value = "sample_1", value_name = "ID")]
    foot: String,

    /// Output image path.
    #[arg(short, long, value_name = "OUTPUT")]
    output: PathBuf,

    /// Generator ONNX file.
    #[arg(long, default_value = DEFAULT_MODEL_PATH, value_name = "PATH")]
    model: PathBuf,

    /// Download the generator from this URL instead (cached after the first run).
    #[arg(long, value_name = "URL", conflicts_with = "model")]
    model_url: Option<String>,

    /// Output JPEG quality (1-100).
    #[arg(short, long, default_value = "95", value_name = "INT")]
    quality: u8,
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("virtual_tryon={log_level},tryon={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    if let Err(err) = run(&args) {
        tracing::error!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn run(args: &Args) -> Result<()> {
    let catalog = match &args.catalog {
        Some(path) => Catalog::from_json_file(path)
            .with_context(|| format!("Failed to read catalog {}", path.display()))?,
        None => Catalog::default(),
    }
    .with_root(&args.assets);

    match &args.command {
        Command::Catalog => {
            print_catalog(&catalog);
            Ok(())
        }
        Command::TryOn(try_on) => run_try_on(&catalog, try_on),
    }
}

fn print_catalog(catalog: &Catalog) {
    println!("Shoes:");
    for shoe in catalog.shoes() {
        println!(
            "  {:<8} {:<24} {} (was {})  {}",
            shoe.id,
            shoe.name,
            shoe.price,
            catalog.list_price,
            shoe.image_path.display()
        );
    }

    println!("Foot samples:");
    for sample in catalog.foot_samples() {
        println!(
            "  {:<8} {:<24} {}",
            sample.id,
            sample.label(),
            sample.image_path.display()
        );
    }
}

fn run_try_on(catalog: &Catalog, args: &TryOnArgs) -> Result<()> {
    // Resolve the selection and options before paying for the model load
    let request = catalog.request(&args.shoe, &args.foot)?;

    let config = Config {
        output_quality: args.quality,
        ..Config::default()
    };
    config.validate().context("Invalid options")?;

    let source = args.model_url.as_deref().map_or_else(
        || ModelSource::Local(args.model.clone()),
        ModelSource::remote,
    );
    let model_path = source.resolve().context("Failed to locate generator")?;

    let handle: ModelHandle = ModelHandle::new(model_path);
    let generator = handle.get_or_load().context("Failed to load generator")?;
    let service =
        TryOnService::new(Arc::clone(&generator), config).context("Failed to initialize try-on")?;

    let spinner = spinner("Running try-on...");
    let result = service.render(&request, &args.output);
    spinner.finish_and_clear();
    result.context("Try-on failed")?;

    println!(
        "Tried {} on {} -> {}",
        request.shoe.name,
        request.foot.label(),
        args.output.display()
    );

    Ok(())
}

fn spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
