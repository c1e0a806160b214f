use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use grid_compositor::{
    assets::{flatten_file, square_batch, OverlayBurner},
    composition::GridCompositor,
    config::Config,
    labels::{render_label_image, LabelFont},
    CompositorError,
};

#[derive(Parser)]
#[command(
    name = "grid-compositor",
    version,
    about = "Compose labelled comparison-grid videos",
    long_about = "Grid-Compositor lays out a grid of video clips with row and column captions and a side image, trims them to the shortest clip, and renders the result with FFmpeg. It also prepares the figure assets that go with it."
)]
struct Cli {
    /// Run manifest (TOML); defaults are used when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compose the comparison-grid video
    Grid {
        /// Override the output video path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Probe clips, write the label image and print the ffmpeg command without running it
        #[arg(long)]
        dry_run: bool,
    },

    /// Render only the label overlay image
    Labels {
        /// Where to write the PNG (defaults to the scratch directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Flatten a transparent image onto white
    Flatten {
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Defaults to overwriting the input
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Square-crop the configured pose images
    Square,

    /// Burn overlay images into the corner of the configured videos
    Overlay,

    /// Write a manifest with the default settings
    InitConfig {
        #[arg(default_value = "manifest.toml")]
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    info!("Starting Grid-Compositor v{}", env!("CARGO_PKG_VERSION"));

    if let Command::InitConfig { path } = &cli.command {
        Config::default().save_to_file(path).map_err(friendly)?;
        info!("Default manifest written to {:?}", path);
        return Ok(());
    }

    // Load configuration
    let config = match &cli.config {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(config_path).map_err(friendly)?
        }
        None => {
            info!("Using default configuration");
            Config::default()
        }
    };

    match cli.command {
        Command::Grid { output, dry_run } => run_grid(config, output, dry_run).await,
        Command::Labels { output } => run_labels(config, output),
        Command::Flatten { input, output } => {
            let input = input.unwrap_or(config.flatten.input);
            let output = output.or(config.flatten.output).unwrap_or_else(|| input.clone());
            let outcome = flatten_file(&input, &output).map_err(friendly)?;
            info!("{:?} {:?}", outcome, output);
            Ok(())
        }
        Command::Square => {
            config.validate().map_err(friendly)?;
            let square = &config.square;
            let report = square_batch(&square.input_dir, &square.output_dir, &square.files, square.size)
                .and_then(|report| report.into_result())
                .map_err(friendly)?;
            info!("Square-cropped {} images into {:?}", report.processed.len(), square.output_dir);
            Ok(())
        }
        Command::Overlay => {
            config.validate().map_err(friendly)?;
            let burner = OverlayBurner::new(
                config.tools.ffmpeg.clone(),
                config.scratch_dir.clone(),
                &config.overlay,
            );
            let report = burner.run(&config.overlay.jobs).await.map_err(friendly)?;

            info!("Summary: {} OK, {} skipped, {} failed",
                  report.burned.len(), report.skipped.len(), report.failed.len());
            if !report.failed.is_empty() {
                anyhow::bail!("{} of {} overlay jobs failed", report.failed.len(), config.overlay.jobs.len());
            }
            Ok(())
        }
        Command::InitConfig { .. } => Ok(()),
    }
}

async fn run_grid(mut config: Config, output: Option<PathBuf>, dry_run: bool) -> Result<()> {
    if let Some(output) = output {
        config.grid.output = output;
    }
    let compositor = GridCompositor::new(config);

    if dry_run {
        let prepared = compositor.prepare().await.map_err(friendly)?;
        println!("{}", prepared.command.display_line());
        return Ok(());
    }

    let report = compositor.compose().await.map_err(friendly)?;
    info!("Duration: {:.3}s", report.duration);
    match report.frame_size {
        Some((w, h)) => info!("Frame: {}x{}", w, h),
        None => warn!("Frame size unknown (side image unreadable)"),
    }
    Ok(())
}

fn run_labels(config: Config, output: Option<PathBuf>) -> Result<()> {
    config.validate().map_err(friendly)?;

    let font = LabelFont::resolve(&config.labels.font_candidates, config.labels.font_size);
    let image = render_label_image(&config.grid.layout(), &config.grid.label_set(), &font)
        .map_err(friendly)?;

    let path = output.unwrap_or_else(|| config.scratch_dir.join(grid_compositor::labels::LABEL_FILE_NAME));
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {:?}", parent))?;
    }
    image.save(&path).with_context(|| format!("writing {:?}", path))?;

    info!("Label image ({}x{}) saved to {:?}", image.width(), image.height(), path);
    Ok(())
}

fn friendly(err: CompositorError) -> anyhow::Error {
    anyhow::anyhow!(err.user_message())
}
