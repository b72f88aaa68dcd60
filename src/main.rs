use anyhow::{bail, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use drivelens::browse;
use drivelens::config::AppConfig;
use drivelens::detection::DetectionParams;
use drivelens::interrupt::Interrupt;
use drivelens::output::PngDirOutput;
use drivelens::pipeline::{Controls, Pipeline, COUNT_RANGE};
use drivelens::progress::DownloadBar;
use drivelens::remote::SchemeSource;
use drivelens::weights::WeightsProvisioner;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// TOML file overriding the built-in configuration
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// URL or local directory holding labels.csv.gz and the frame images
    #[arg(long, global = true)]
    data_root: Option<String>,

    /// Where to download detector weights from
    #[arg(long, global = true)]
    weights_url: Option<String>,

    /// Expected SHA-256 of the weights file
    #[arg(long, global = true)]
    weights_sha256: Option<String>,

    /// Directory the weights file is kept in
    #[arg(long, global = true)]
    weights_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print object totals per label
    Summary,

    /// List frames whose label count falls in a range
    Select {
        #[command(flatten)]
        range: RangeArgs,
    },

    /// Render one selected frame with ground truth (and optionally detected) boxes
    Render {
        #[command(flatten)]
        range: RangeArgs,

        /// Index into the selected frames
        #[arg(short, long, default_value_t = 0)]
        index: usize,

        #[command(flatten)]
        detection: DetectionArgs,

        /// Directory rendered PNGs are written to
        #[arg(short, long, default_value = "renders")]
        out: PathBuf,
    },

    /// Download and verify the detector weights
    Weights,

    /// Interactively browse frames
    Browse {
        /// Directory rendered PNGs are written to
        #[arg(short, long, default_value = "renders")]
        out: PathBuf,
    },
}

#[derive(ClapArgs, Debug)]
struct RangeArgs {
    /// Label to filter on (defaults to the first label in the dataset)
    #[arg(short, long)]
    label: Option<String>,

    /// Minimum number of objects with the label
    #[arg(long, default_value_t = 10)]
    min: u32,

    /// Maximum number of objects with the label
    #[arg(long, default_value_t = 20)]
    max: u32,
}

#[derive(ClapArgs, Debug)]
struct DetectionArgs {
    /// Run the detector and render its boxes too
    #[arg(long)]
    detect: bool,

    /// Minimum detection score
    #[arg(long, default_value_t = 0.5)]
    confidence: f32,

    /// Non-max-suppression IoU threshold
    #[arg(long, default_value_t = 0.3)]
    overlap: f32,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    let config = resolve_config(&args)?;
    tracing::info!("drivelens starting");
    tracing::info!("Data: {}", config.data.url_root);

    let interrupt = Interrupt::new();
    if let Err(e) = interrupt.install() {
        tracing::warn!("Ctrl+C will not cancel downloads: {}", e);
    }

    let source = SchemeSource::new().context("Failed to initialize HTTP client")?;
    let mut pipeline = Pipeline::new(config, Box::new(source));

    match args.command {
        Command::Summary => {
            let summary = pipeline.summary().context("Failed to build summary")?;
            println!("{} frames", summary.frames().len());
            for (label, total) in summary.totals() {
                println!("{:>14} {}", label, total);
            }
        }

        Command::Select { range } => {
            check_range(&range)?;
            let label = resolve_label(&mut pipeline, range.label.as_deref())?;
            let selection = pipeline
                .select(&label, range.min, range.max)
                .context("Failed to select frames")?;
            if selection.is_empty() {
                println!("{}", drivelens::pipeline::NO_FRAMES_MESSAGE);
            }
            for (index, (frame, count)) in selection.frames.iter().zip(&selection.counts).enumerate() {
                println!("{:>5} {:>3} {}", index, count, frame);
            }
        }

        Command::Render {
            range,
            index,
            detection,
            out,
        } => {
            check_range(&range)?;
            let controls = Controls {
                label: range.label,
                min_elts: range.min,
                max_elts: range.max,
                frame_index: index,
                detection: if detection.detect {
                    Some(DetectionParams::new(detection.confidence, detection.overlap)?)
                } else {
                    None
                },
            };

            let mut output = PngDirOutput::new(&out).context("Failed to create output directory")?;
            let cancel = interrupt.arm();
            let mut bar = DownloadBar::new();
            let outcome = pipeline.render(&controls, &mut output, &mut |p| bar.update(p), &cancel);
            bar.finish();
            interrupt.disarm();
            browse::print_outcome(&outcome.context("Render failed")?);
        }

        Command::Weights => {
            let config = pipeline.config();
            let provisioner = WeightsProvisioner::new(&config.weights, pipeline.source());
            let cancel = interrupt.arm();
            let mut bar = DownloadBar::new();
            let path = provisioner.ensure(&mut |p| bar.update(p), &cancel);
            bar.finish();
            interrupt.disarm();
            let path = path.context("Failed to provision weights")?;
            println!("{}", path.display());
        }

        Command::Browse { out } => {
            let mut output = PngDirOutput::new(&out).context("Failed to create output directory")?;
            browse::run(&mut pipeline, &mut output, &interrupt)?;
        }
    }

    Ok(())
}

/// Defaults, then the config file, then flags.
fn resolve_config(args: &Args) -> Result<AppConfig> {
    let mut config = AppConfig::load(args.config.as_deref()).context("Failed to load config")?;

    if let Some(root) = &args.data_root {
        config.data.url_root = root.clone();
    }
    if let Some(url) = &args.weights_url {
        config.weights.url = Some(url.clone());
    }
    if let Some(sha) = &args.weights_sha256 {
        config.weights.sha256 = Some(sha.clone());
    }
    if let Some(dir) = &args.weights_dir {
        config.weights.dir = dir.clone();
    }

    Ok(config)
}

fn check_range(range: &RangeArgs) -> Result<()> {
    let (lo, hi) = COUNT_RANGE;
    if range.max > hi {
        bail!("counts must lie within {}..={}", lo, hi);
    }
    Ok(())
}

fn resolve_label(pipeline: &mut Pipeline, label: Option<&str>) -> Result<String> {
    if let Some(label) = label {
        return Ok(label.to_string());
    }
    let summary = pipeline.summary().context("Failed to build summary")?;
    summary
        .labels()
        .first()
        .cloned()
        .context("The labels file has no annotations")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(min: u32, max: u32) -> RangeArgs {
        RangeArgs {
            label: None,
            min,
            max,
        }
    }

    #[test]
    fn range_is_checked_against_the_upper_bound() {
        let (lo, hi) = COUNT_RANGE;
        assert!(check_range(&range(lo, hi)).is_ok());
        assert!(check_range(&range(lo, hi + 1)).is_err());
    }
}
