use std::{
    io::Write as _,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use vitrine::{
    CpuSurface, EngineConfig, RevealSurface, Script, Size,
    reveal::{AnimationDriver, GridParams, ImagePool, layout},
};

#[derive(Parser, Debug)]
#[command(name = "vitrine", version)]
struct Cli {
    /// Log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single reveal-grid frame as a PNG.
    Frame(FrameArgs),
    /// Replay a JSON event script and print the effects as JSON lines.
    Simulate(SimulateArgs),
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Directory the image prefix is resolved against.
    #[arg(long)]
    images: PathBuf,

    /// Image file prefix; image `i` is `<prefix><i>.webp`.
    #[arg(long, default_value = "")]
    prefix: String,

    /// Number of images in the pool.
    #[arg(long)]
    count: u32,

    /// Canvas width in CSS pixels.
    #[arg(long, default_value_t = 1280.0)]
    width: f64,

    /// Canvas height in CSS pixels.
    #[arg(long, default_value_t = 720.0)]
    height: f64,

    /// Focus point; defaults to the canvas center.
    #[arg(long, num_args = 2, value_names = ["X", "Y"])]
    focus: Option<Vec<f64>>,

    /// Seconds since the zone became active.
    #[arg(long, default_value_t = 0.0)]
    elapsed: f64,

    /// Device pixel ratio (capped by the config).
    #[arg(long, default_value_t = 1.0)]
    dpr: f64,

    /// Optional engine config JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct SimulateArgs {
    /// Input script JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Pretty-print each step instead of one line per step.
    #[arg(long)]
    pretty: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Simulate(args) => cmd_simulate(args),
    }
}

fn read_config(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    match path {
        Some(p) => Ok(EngineConfig::from_path(p)?),
        None => Ok(EngineConfig::default()),
    }
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let cfg = read_config(args.config.as_deref())?;

    let mut pool = ImagePool::new(&args.prefix, args.count);
    let decoded = vitrine::assets::load_pool(&mut pool, &args.images);
    if decoded.is_empty() {
        anyhow::bail!(
            "no reveal images could be loaded from '{}'",
            args.images.display()
        );
    }

    let extent = Size::new(args.width, args.height);
    let focus = match args.focus.as_deref() {
        Some([x, y]) => vitrine::Point::new(*x, *y),
        _ => vitrine::Point::new(extent.width / 2.0, extent.height / 2.0),
    };
    let pixel_ratio = AnimationDriver::new(&cfg.reveal).pixel_ratio(args.dpr);

    let mut surface = CpuSurface::new();
    for (index, img) in &decoded {
        surface.insert_image(*index, img)?;
    }
    surface.resize(extent, pixel_ratio)?;

    let params = GridParams::resolve(extent.width, &cfg.reveal);
    let sprites = layout(&params, extent, args.elapsed, focus, &pool.ready());
    surface.draw(pixel_ratio, &sprites)?;
    let frame = surface.readback_rgba8();

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    image::save_buffer_with_format(
        &args.out,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {} ({} sprites)", args.out.display(), sprites.len());
    Ok(())
}

fn cmd_simulate(args: SimulateArgs) -> anyhow::Result<()> {
    let script = Script::from_path(&args.in_path)?;
    let outputs = script.run()?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for step in &outputs {
        let line = if args.pretty {
            serde_json::to_string_pretty(step)
        } else {
            serde_json::to_string(step)
        }
        .context("serialize step effects")?;
        writeln!(out, "{line}").context("write to stdout")?;
    }
    Ok(())
}
