use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use mediaframe::{
    EditArgs, FfmpegConfig, FontDescriptor, FrameTransform, ImageFrame, MediaFormat, MediaReader,
    MediaReaderFactory, MediaResult, MediaSink, MediaSource, OverlayData, ReaderOpts, TextDrawData,
    TextStage, WriterOpts, compose_overlay, text_glyphs, transcode,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "mediaframe", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print stream information as JSON.
    Probe(ProbeArgs),
    /// Convert between formats.
    Transcode(TranscodeArgs),
    /// Composite an image onto every frame.
    Overlay(OverlayArgs),
    /// Draw a line of text onto every frame.
    Caption(CaptionArgs),
}

#[derive(Parser, Debug)]
struct ToolArgs {
    /// `ffmpeg` executable (video formats only).
    #[arg(long, default_value = "ffmpeg")]
    ffmpeg: PathBuf,

    /// `ffprobe` executable (video formats only).
    #[arg(long, default_value = "ffprobe")]
    ffprobe: PathBuf,
}

impl ToolArgs {
    fn config(&self) -> FfmpegConfig {
        FfmpegConfig::new(&self.ffmpeg, &self.ffprobe)
    }
}

#[derive(Parser, Debug)]
struct ProbeArgs {
    /// Input media path.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Input format. Defaults to the file extension.
    #[arg(long)]
    format: Option<String>,

    #[command(flatten)]
    tools: ToolArgs,
}

#[derive(Parser, Debug)]
struct TranscodeArgs {
    /// Input media path.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output path.
    #[arg(long)]
    out: PathBuf,

    /// Input format. Defaults to the input extension.
    #[arg(long)]
    in_format: Option<String>,

    /// Output format. Defaults to the output extension.
    #[arg(long)]
    out_format: Option<String>,

    /// Constant output frame rate (video only).
    #[arg(long)]
    fps: Option<f64>,

    /// Refuse to replace an existing output.
    #[arg(long, default_value_t = false)]
    no_overwrite: bool,

    #[command(flatten)]
    tools: ToolArgs,
}

#[derive(Parser, Debug)]
struct OverlayArgs {
    /// Base media path.
    #[arg(long = "in")]
    in_path: Option<String>,

    /// Still image composited on top.
    #[arg(long)]
    overlay: Option<String>,

    /// Output path.
    #[arg(long)]
    out: Option<String>,

    #[arg(long, allow_hyphen_values = true)]
    x: Option<String>,

    #[arg(long, allow_hyphen_values = true)]
    y: Option<String>,

    #[command(flatten)]
    tools: ToolArgs,
}

#[derive(Parser, Debug)]
struct CaptionArgs {
    /// Base media path.
    #[arg(long = "in")]
    in_path: Option<String>,

    /// Text to draw.
    #[arg(long)]
    text: Option<String>,

    /// Output path.
    #[arg(long)]
    out: Option<String>,

    /// Font family.
    #[arg(long)]
    font: Option<String>,

    /// Font size in pixels.
    #[arg(long)]
    size: Option<String>,

    /// Text color as RRGGBB or RRGGBBAA.
    #[arg(long)]
    color: Option<String>,

    #[arg(long, allow_hyphen_values = true)]
    x: Option<String>,

    #[arg(long, allow_hyphen_values = true)]
    y: Option<String>,

    #[command(flatten)]
    tools: ToolArgs,
}

#[derive(serde::Serialize, Debug)]
struct ProbeReport {
    format: &'static str,
    width: Option<u32>,
    height: Option<u32>,
    frame_count: u64,
    duration_ms: Option<u128>,
    has_audio: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Probe(args) => cmd_probe(args),
        Command::Transcode(args) => cmd_transcode(args),
        Command::Overlay(args) => cmd_overlay(args),
        Command::Caption(args) => cmd_caption(args),
    }
}

fn format_of(explicit: Option<&str>, path: &Path) -> anyhow::Result<String> {
    if let Some(f) = explicit {
        return Ok(f.to_string());
    }
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .with_context(|| format!("cannot infer format of '{}'; pass it explicitly", path.display()))
}

fn reader_factory(tools: &ToolArgs) -> MediaReaderFactory {
    MediaReaderFactory::new(ReaderOpts {
        ffmpeg: tools.config(),
        ..ReaderOpts::new()
    })
}

fn cmd_probe(args: ProbeArgs) -> anyhow::Result<()> {
    let format = format_of(args.format.as_deref(), &args.in_path)?;
    let fmt = MediaFormat::parse(&format)?;
    let factory = reader_factory(&args.tools);

    let mut reader = factory
        .image_reader(MediaSource::path(&args.in_path), &format)
        .with_context(|| format!("open '{}'", args.in_path.display()))?;
    let dims = reader.dimensions();
    let mut counted = 0u64;
    for frame in reader.frames() {
        frame?;
        counted += 1;
    }

    let has_audio = fmt.has_audio_track()
        && factory
            .audio_reader(MediaSource::path(&args.in_path), &format)
            .is_ok();

    let report = ProbeReport {
        format: fmt.name(),
        width: dims.map(|d| d.0),
        height: dims.map(|d| d.1),
        frame_count: reader.frame_count().unwrap_or(counted),
        duration_ms: reader.duration().map(|d| d.as_millis()),
        has_audio,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn cmd_transcode(args: TranscodeArgs) -> anyhow::Result<()> {
    let in_format = format_of(args.in_format.as_deref(), &args.in_path)?;
    let out_format = format_of(args.out_format.as_deref(), &args.out)?;
    let opts = WriterOpts {
        ffmpeg: args.tools.config(),
        overwrite: !args.no_overwrite,
        fps: args.fps,
        ..WriterOpts::new()
    };

    let stats = transcode(
        &reader_factory(&args.tools),
        MediaSource::path(&args.in_path),
        &in_format,
        MediaSink::path(&args.out),
        &out_format,
        &mut mediaframe::Identity,
        &opts,
    )?;
    eprintln!(
        "wrote {} ({} image frames, {} audio frames)",
        args.out.display(),
        stats.image_frames,
        stats.audio_frames
    );
    Ok(())
}

/// Overlay anchored at a fixed offset inside each frame's own canvas.
struct PlaceOverlay {
    overlay: ImageFrame,
    x: i32,
    y: i32,
}

impl FrameTransform for PlaceOverlay {
    fn apply(&mut self, frame: ImageFrame) -> MediaResult<ImageFrame> {
        let data =
            OverlayData::new(frame.width(), frame.height()).with_overlay_at(self.x, self.y);
        compose_overlay(&frame, &self.overlay, &data)
    }
}

fn edit_output(args: &EditArgs) -> anyhow::Result<(PathBuf, PathBuf)> {
    let input = PathBuf::from(args.require("in", "media to edit")?);
    let out = PathBuf::from(args.require("out", "where the edited media is written")?);
    Ok((input, out))
}

fn run_edit(
    input: &Path,
    out: &Path,
    tools: &ToolArgs,
    transform: &mut dyn FrameTransform,
) -> anyhow::Result<()> {
    let in_format = format_of(None, input)?;
    let out_format = format_of(None, out)?;
    let opts = WriterOpts {
        ffmpeg: tools.config(),
        ..WriterOpts::new()
    };
    transcode(
        &reader_factory(tools),
        MediaSource::path(input),
        &in_format,
        MediaSink::path(out),
        &out_format,
        transform,
        &opts,
    )?;
    eprintln!("wrote {}", out.display());
    Ok(())
}

fn cmd_overlay(args: OverlayArgs) -> anyhow::Result<()> {
    let edit = EditArgs::new()
        .with("in", args.in_path)
        .with("overlay", args.overlay)
        .with("out", args.out)
        .with("x", args.x)
        .with("y", args.y);
    let (input, out) = edit_output(&edit)?;
    let overlay_path = PathBuf::from(edit.require("overlay", "image placed on top")?);
    let x = edit.parse::<i32>("x")?.unwrap_or(0);
    let y = edit.parse::<i32>("y")?.unwrap_or(0);

    let factory = reader_factory(&args.tools);
    let overlay_format = format_of(None, &overlay_path)?;
    let mut reader = factory.image_reader(MediaSource::path(&overlay_path), &overlay_format)?;
    let first = reader
        .next_frame()?
        .with_context(|| format!("overlay '{}' has no frames", overlay_path.display()))?;
    let overlay = ImageFrame::still(first.into_image())?;

    run_edit(&input, &out, &args.tools, &mut PlaceOverlay { overlay, x, y })
}

fn parse_color(hex: &str) -> anyhow::Result<[u8; 4]> {
    let hex = hex.trim_start_matches('#');
    if !matches!(hex.len(), 6 | 8) {
        anyhow::bail!("color must be RRGGBB or RRGGBBAA, got '{hex}'");
    }
    let mut rgba = [255u8; 4];
    for (i, chunk) in hex.as_bytes().chunks(2).enumerate() {
        let s = std::str::from_utf8(chunk)?;
        rgba[i] = u8::from_str_radix(s, 16).with_context(|| format!("bad color '{hex}'"))?;
    }
    Ok(rgba)
}

fn cmd_caption(args: CaptionArgs) -> anyhow::Result<()> {
    let edit = EditArgs::new()
        .with("in", args.in_path)
        .with("text", args.text)
        .with("out", args.out)
        .with("font", args.font)
        .with("size", args.size)
        .with("color", args.color)
        .with("x", args.x)
        .with("y", args.y);
    let (input, out) = edit_output(&edit)?;
    let text = edit.require("text", "caption text")?.to_string();
    let size = edit.parse::<f32>("size")?.unwrap_or(32.0);
    let family = edit.optional("font").unwrap_or("sans-serif");
    let color = parse_color(edit.optional("color").unwrap_or("ffffff"))?;

    let font = FontDescriptor::new(family, size);
    let mut stage = TextStage::new(TextDrawData {
        glyphs: text_glyphs(text, font.clone(), color),
        x: edit.parse::<i32>("x")?.unwrap_or(0),
        y: edit.parse::<i32>("y")?.unwrap_or(0),
        font,
    });
    run_edit(&input, &out, &args.tools, &mut stage)
}
