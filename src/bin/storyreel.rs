use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "storyreel", version)]
struct Cli {
    /// Verbose logging (debug level unless RUST_LOG is set).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compose a job into an MP4 (requires `ffmpeg` and `ffprobe` on PATH).
    Render(RenderArgs),
    /// Compose a job and write the frame at one instant as a PNG.
    Frame(FrameArgs),
    /// Check a job file without touching any media.
    Validate(ValidateArgs),
}

#[derive(Parser, Debug)]
struct JobArgs {
    /// Input job JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Override the transition mode (`cut`, `fade`, `slide`; `none` means `cut`).
    #[arg(long)]
    transition: Option<String>,

    /// Override the transition overlap in seconds.
    #[arg(long)]
    overlap: Option<f64>,

    /// Render scenes one at a time.
    #[arg(long, default_value_t = false)]
    sequential: bool,

    /// Override rayon worker threads.
    #[arg(long)]
    threads: Option<usize>,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    #[command(flatten)]
    job: JobArgs,

    /// Output MP4 path (defaults to the job's `output`).
    #[arg(long)]
    out: Option<PathBuf>,

    /// Overwrite output if it already exists.
    #[arg(long, default_value_t = true)]
    overwrite: bool,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    #[command(flatten)]
    job: JobArgs,

    /// Timeline instant in seconds.
    #[arg(long)]
    time: f64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct ValidateArgs {
    /// Input job JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Validate(args) => cmd_validate(args),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_job(args: &JobArgs) -> anyhow::Result<(storyreel::ComposeJob, storyreel::RenderThreading)> {
    let mut job = storyreel::ComposeJob::from_path(&args.in_path)
        .with_context(|| format!("load job '{}'", args.in_path.display()))?;

    if let Some(mode) = args.transition.as_deref() {
        job.transition.mode = if mode.trim().eq_ignore_ascii_case("none") {
            storyreel::TransitionMode::Cut
        } else {
            mode.parse()?
        };
    }
    if let Some(secs) = args.overlap {
        job.transition.overlap = storyreel::Micros::from_secs_f64(secs)?;
    }

    let threading = storyreel::RenderThreading {
        parallel: !args.sequential,
        threads: args.threads,
    };
    Ok((job, threading))
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let (mut job, threading) = load_job(&args.job)?;
    if let Some(out) = args.out {
        job.output = out;
    }

    let mut sink_opts = storyreel::FfmpegSinkOpts::new(&job.output);
    sink_opts.overwrite = args.overwrite;
    let mut sink = storyreel::FfmpegTimelineSink::new(sink_opts);

    let output = storyreel::compose(
        &job,
        &storyreel::MediaSceneRenderer,
        &mut sink,
        &threading,
    )?;

    eprintln!(
        "wrote {} ({}, {}x{})",
        output.path.display(),
        output.total_duration,
        output.canvas.width,
        output.canvas.height
    );
    Ok(())
}

/// Timeline sink that keeps a single PNG frame instead of encoding video.
struct PngFrameSink {
    time: storyreel::Micros,
    out: PathBuf,
}

impl storyreel::TimelineSink for PngFrameSink {
    fn encode(
        &mut self,
        mut timeline: storyreel::Timeline,
        canvas: &storyreel::CanvasSpec,
    ) -> storyreel::ReelResult<storyreel::FinalOutput> {
        storyreel::render_frame_png(&mut timeline, canvas, self.time, &self.out)?;
        Ok(storyreel::FinalOutput {
            path: self.out.clone(),
            canvas: *canvas,
            total_duration: timeline.total_duration(),
        })
    }
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let (job, threading) = load_job(&args.job)?;
    let mut sink = PngFrameSink {
        time: storyreel::Micros::from_secs_f64(args.time)?,
        out: args.out,
    };

    let output = storyreel::compose(
        &job,
        &storyreel::MediaSceneRenderer,
        &mut sink,
        &threading,
    )?;

    eprintln!("wrote {}", output.path.display());
    Ok(())
}

fn cmd_validate(args: ValidateArgs) -> anyhow::Result<()> {
    let job = storyreel::ComposeJob::from_path(&args.in_path)
        .with_context(|| format!("load job '{}'", args.in_path.display()))?;
    job.validate()?;

    eprintln!(
        "{}: {} scenes, {}x{} @ {} fps, transition {} ({}), output {}",
        display_name(&args.in_path),
        job.scene_count(),
        job.canvas.width,
        job.canvas.height,
        job.canvas.fps.as_f64(),
        job.transition.effective_mode(),
        job.transition.effective_overlap(),
        job.output.display()
    );
    Ok(())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
