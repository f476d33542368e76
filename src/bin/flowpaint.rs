use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use flowpaint::{
    DEFAULT_MASK_THRESHOLD, MotionEstimator as _, MotionMethod, PipelineConfig,
    PropagationStrategy, PropagationThreading,
};

#[derive(Parser, Debug)]
#[command(name = "flowpaint", version, about = "Propagate a single-frame edit across a video")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the pipeline described by a JSON config file.
    Run(RunArgs),
    /// Run the pipeline from command-line flags.
    Propagate(PropagateArgs),
    /// Assemble a saved frame directory into an MP4 (requires `ffmpeg` on PATH).
    Export(ExportArgs),
    /// Estimate one motion field and print its statistics as JSON.
    Flow(FlowArgs),
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Pipeline config JSON.
    #[arg(long)]
    config: PathBuf,
}

#[derive(Parser, Debug)]
struct PropagateArgs {
    /// Directory of frame_<digits>.png inputs.
    #[arg(long)]
    frames: PathBuf,

    /// 0-based position of the edited frame in the sequence.
    #[arg(long)]
    reference_index: usize,

    /// Edited reference frame.
    #[arg(long)]
    edited: PathBuf,

    /// Single-channel mask of the edited region.
    #[arg(long)]
    mask: PathBuf,

    /// Motion estimation method (pyramidal, inverse-search).
    #[arg(long)]
    method: MotionMethod,

    /// Output frame directory.
    #[arg(long)]
    out: PathBuf,

    /// Video frame rate.
    #[arg(long)]
    fps: u32,

    /// Also export an MP4 here.
    #[arg(long)]
    video: Option<PathBuf>,

    /// Propagation strategy (reference, sequential).
    #[arg(long, default_value_t = PropagationStrategy::Reference)]
    strategy: PropagationStrategy,

    /// Mask re-binarization threshold.
    #[arg(long, default_value_t = DEFAULT_MASK_THRESHOLD)]
    threshold: f32,

    /// Enable frame-level parallelism.
    #[arg(long, default_value_t = false)]
    parallel: bool,

    /// Override rayon worker threads (parallel mode only).
    #[arg(long)]
    threads: Option<usize>,
}

#[derive(Parser, Debug)]
struct ExportArgs {
    /// Directory of frame_<digits>.png files.
    #[arg(long)]
    frames: PathBuf,

    /// Output MP4 path.
    #[arg(long)]
    out: PathBuf,

    /// Frame rate.
    #[arg(long)]
    fps: u32,
}

#[derive(Parser, Debug)]
struct FlowArgs {
    /// Source image; the field lives in its coordinates.
    #[arg(long)]
    src: PathBuf,

    /// Destination image.
    #[arg(long)]
    dst: PathBuf,

    /// Motion estimation method (pyramidal, inverse-search).
    #[arg(long)]
    method: MotionMethod,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Run(args) => cmd_run(args),
        Command::Propagate(args) => cmd_propagate(args),
        Command::Export(args) => cmd_export(args),
        Command::Flow(args) => cmd_flow(args),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_run(args: RunArgs) -> anyhow::Result<()> {
    let cfg = PipelineConfig::from_path(&args.config)?;
    run(&cfg)
}

fn cmd_propagate(args: PropagateArgs) -> anyhow::Result<()> {
    let cfg = PipelineConfig {
        frames_dir: args.frames,
        reference_index: args.reference_index,
        edited_reference: args.edited,
        mask: args.mask,
        method: args.method,
        output_dir: args.out,
        video: args.video,
        fps: args.fps,
        strategy: args.strategy,
        mask_threshold: args.threshold,
        threading: PropagationThreading {
            parallel: args.parallel,
            threads: args.threads,
        },
    };
    run(&cfg)
}

fn run(cfg: &PipelineConfig) -> anyhow::Result<()> {
    let report = flowpaint::run_pipeline(cfg)?;
    eprintln!(
        "wrote {} frames to {}",
        report.frames,
        cfg.output_dir.display()
    );
    if let Some(video) = &report.video {
        eprintln!("wrote {}", video.display());
    }
    Ok(())
}

fn cmd_export(args: ExportArgs) -> anyhow::Result<()> {
    flowpaint::export_video_from_dir(&args.frames, &args.out, args.fps)?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_flow(args: FlowArgs) -> anyhow::Result<()> {
    let src = flowpaint::load_rgb_image(&args.src)?;
    let dst = flowpaint::load_rgb_image(&args.dst)?;
    let field = flowpaint::create_estimator(args.method).estimate(&src, &dst)?;
    let stats = serde_json::to_string_pretty(&field.stats()).context("serialize field stats")?;
    println!("{stats}");
    Ok(())
}
