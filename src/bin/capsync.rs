use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context as _;
use capsync::{
    Canvas, CaptionEngine, EngineConfig, ExportConfig, ExportFormat, ExportJob, ExportObserver,
    ExportQuality, ExportState, FfmpegEncoderCaps, FfmpegMediaSource, FfmpegSink, FontBook,
    FrameRGBA, LoadStatus, MediaSource, PaintSpec, SleepTicker, SpeakerId, UtteranceFilter,
    UtteranceStore,
};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "capsync", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the built-in caption themes.
    Themes,
    /// Write the transcript as WebVTT.
    Vtt(VttArgs),
    /// Render one captioned frame as a PNG.
    Frame(FrameArgs),
    /// Burn captions into a video (requires `ffmpeg` and `ffprobe` on PATH).
    Export(ExportArgs),
}

#[derive(Args, Debug)]
struct EngineArgs {
    /// Transcript JSON (`{"utterances": [...]}` or a bare array).
    #[arg(long)]
    transcript: PathBuf,

    /// Engine config JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Caption theme id.
    #[arg(long)]
    theme: Option<String>,

    /// Custom theme JSON; selected as `custom`.
    #[arg(long, conflicts_with = "theme")]
    custom_theme: Option<PathBuf>,

    /// Font files to register (repeatable).
    #[arg(long = "font")]
    fonts: Vec<PathBuf>,
}

#[derive(Args, Debug)]
struct VttArgs {
    /// Transcript JSON.
    #[arg(long)]
    transcript: PathBuf,

    /// Keep only this speaker.
    #[arg(long)]
    speaker: Option<String>,

    /// Keep only utterances containing this text (case-insensitive).
    #[arg(long)]
    query: Option<String>,

    /// Output path; stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct FrameArgs {
    #[command(flatten)]
    engine: EngineArgs,

    /// Playback position in milliseconds.
    #[arg(long)]
    at: u64,

    /// Source video; a solid background is used when omitted.
    #[arg(long)]
    video: Option<PathBuf>,

    /// Surface width without a video.
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Surface height without a video.
    #[arg(long, default_value_t = 720)]
    height: u32,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct ExportArgs {
    #[command(flatten)]
    engine: EngineArgs,

    /// Source video.
    #[arg(long)]
    video: PathBuf,

    /// Output container.
    #[arg(long, default_value_t = ExportFormat::Webm)]
    format: ExportFormat,

    /// Output quality.
    #[arg(long, default_value_t = ExportQuality::High)]
    quality: ExportQuality,

    /// Output path.
    #[arg(long)]
    out: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Themes => cmd_themes(),
        Command::Vtt(args) => cmd_vtt(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Export(args) => cmd_export(args),
    }
}

fn cmd_themes() -> anyhow::Result<()> {
    for entry in capsync::ThemeTable::builtin().entries() {
        println!("{:<12} {}", entry.id.as_str(), entry.description);
    }
    Ok(())
}

fn cmd_vtt(args: VttArgs) -> anyhow::Result<()> {
    let store = UtteranceStore::from_path(&args.transcript)?;
    let filter = UtteranceFilter {
        speaker: args.speaker.map(SpeakerId::new),
        query: args.query,
    };
    let kept = store
        .filter(|u| filter.matches(u))
        .map(|(_, u)| u.clone())
        .collect();
    let vtt = capsync::to_webvtt(&UtteranceStore::new(kept));
    match args.out {
        Some(out) => {
            ensure_parent_dir(&out)?;
            std::fs::write(&out, vtt).with_context(|| format!("write vtt '{}'", out.display()))?;
            eprintln!("wrote {}", out.display());
        }
        None => print!("{vtt}"),
    }
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let mut engine = build_engine(&args.engine)?;
    let source = match &args.video {
        Some(video) => Some(decode_still(video, &engine, args.at)?),
        None => None,
    };
    let canvas = match &source {
        Some(frame) => frame.canvas(),
        None => Canvas {
            width: args.width,
            height: args.height,
        },
    };
    let backdrop = source.unwrap_or_else(|| FrameRGBA::solid(canvas, [24, 24, 32, 255]));
    let frame = engine.render_preview(canvas, Some(&backdrop), args.at)?;

    ensure_parent_dir(&args.out)?;
    image::save_buffer_with_format(
        &args.out,
        &frame.to_straight_rgba(),
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_export(args: ExportArgs) -> anyhow::Result<()> {
    let mut engine = build_engine(&args.engine)?;
    let caps = FfmpegEncoderCaps::probe();
    let source = FfmpegMediaSource::new(&args.video, engine.config().export_fps);
    let sink = FfmpegSink::new(caps.clone());
    let mut pipeline = engine.export_pipeline(
        ExportConfig {
            format: args.format,
            quality: args.quality,
        },
        Box::new(source),
        Box::new(sink),
    );
    pipeline.observe(Box::new(ProgressLine::default()));

    let job = pipeline.run(&caps, &mut SleepTicker::new()).clone();
    eprintln!();
    if job.state != ExportState::Completed {
        let reason = job
            .error
            .map(|e| e.to_string())
            .unwrap_or_else(|| format!("{:?}", job.state));
        anyhow::bail!("export failed: {reason}");
    }
    let artifact = pipeline
        .take_artifact()
        .context("export completed without an artifact")?;

    ensure_parent_dir(&args.out)?;
    std::fs::write(&args.out, &artifact.bytes)
        .with_context(|| format!("write export '{}'", args.out.display()))?;
    eprintln!(
        "wrote {} ({}, {} frames)",
        args.out.display(),
        artifact.mime,
        artifact.frames
    );
    Ok(())
}

fn build_engine(args: &EngineArgs) -> anyhow::Result<CaptionEngine> {
    let config = match &args.config {
        Some(path) => EngineConfig::from_path(path)?,
        None => EngineConfig::default(),
    };
    let store = UtteranceStore::from_path(&args.transcript)?;
    let fonts = FontBook::from_paths(args.fonts.as_slice())?;
    let mut engine = CaptionEngine::new(config, store, fonts)?;

    if let Some(path) = &args.custom_theme {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read theme '{}'", path.display()))?;
        let spec: PaintSpec = serde_json::from_str(&text)
            .with_context(|| format!("parse theme '{}'", path.display()))?;
        let id = engine.add_custom_theme(spec);
        engine.select_theme(id.as_str())?;
    } else if let Some(theme) = &args.theme {
        engine.select_theme(theme)?;
    }
    Ok(engine)
}

fn decode_still(video: &Path, engine: &CaptionEngine, at: u64) -> anyhow::Result<FrameRGBA> {
    let mut source = FfmpegMediaSource::new(video, engine.config().export_fps);
    source.open()?;
    let deadline = Instant::now() + Duration::from_millis(engine.config().ready_timeout_ms);
    loop {
        match source.poll_ready() {
            LoadStatus::Ready(_) => break,
            LoadStatus::Failed(msg) => anyhow::bail!("load '{}': {msg}", video.display()),
            LoadStatus::Pending if Instant::now() >= deadline => {
                anyhow::bail!("timed out loading '{}'", video.display())
            }
            LoadStatus::Pending => std::thread::sleep(Duration::from_millis(10)),
        }
    }
    let frame = source.frame_at(at);
    source.close();
    Ok(frame?)
}

fn ensure_parent_dir(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    Ok(())
}

#[derive(Default)]
struct ProgressLine {
    last: u32,
}

impl ExportObserver for ProgressLine {
    fn on_state(&mut self, job: &ExportJob) {
        tracing::info!(state = ?job.state, "export");
    }

    fn on_progress(&mut self, progress: f32) {
        let whole = progress.floor() as u32;
        if whole > self.last {
            self.last = whole;
            eprint!("\rexport {whole:>3}%");
        }
    }
}
