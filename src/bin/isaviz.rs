use std::{
    io::{BufWriter, Write as _},
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

/// Upper bound on simulated ticks for `play`.
const MAX_PLAY_TICKS: f64 = 1_000_000.0;

#[derive(Parser, Debug)]
#[command(name = "isaviz", version)]
struct Cli {
    /// Log parser and playback diagnostics to stderr (repeat for more).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the DSL with shorthand statements expanded.
    Expand(InArgs),
    /// Parse DSL into document JSON.
    Parse(ParseArgs),
    /// Report dangling references and duplicate ids. Exits with 1 on issues.
    Lint(InArgs),
    /// Simulate playback and print one JSON scene frame per line.
    Play(PlayArgs),
}

#[derive(Parser, Debug)]
struct InArgs {
    /// Input DSL file.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Parser, Debug)]
struct ParseArgs {
    /// Input DSL file.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output JSON path (stdout when omitted).
    #[arg(long)]
    out: Option<PathBuf>,

    #[arg(long)]
    pretty: bool,
}

#[derive(Parser, Debug)]
struct PlayArgs {
    /// Input DSL file.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Playback config JSON (step durations, speed, fps).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Simulated time between ticks, in ms. Defaults to one frame at the configured fps.
    #[arg(long)]
    frame_ms: Option<f64>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Expand(args) => cmd_expand(args),
        Command::Parse(args) => cmd_parse(args),
        Command::Lint(args) => cmd_lint(args),
        Command::Play(args) => cmd_play(args),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn read_source(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("read dsl '{}'", path.display()))
}

fn cmd_expand(args: InArgs) -> anyhow::Result<()> {
    let src = read_source(&args.in_path)?;
    println!("{}", isaviz::expand(&src));
    Ok(())
}

fn cmd_parse(args: ParseArgs) -> anyhow::Result<()> {
    let src = read_source(&args.in_path)?;
    let doc = isaviz::parse_dsl(&src);
    let json = doc
        .to_json(args.pretty)
        .with_context(|| "serialize document JSON")?;

    match args.out {
        Some(out) => {
            if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create output dir '{}'", parent.display()))?;
            }
            std::fs::write(&out, json + "\n")
                .with_context(|| format!("write json '{}'", out.display()))?;
            eprintln!("wrote {}", out.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn cmd_lint(args: InArgs) -> anyhow::Result<()> {
    let src = read_source(&args.in_path)?;
    let doc = isaviz::parse_dsl(&src);
    let issues = isaviz::lint(&doc);
    if issues.is_empty() {
        eprintln!(
            "ok: {} steps, {} shapes, {} anims",
            doc.steps.len(),
            doc.shapes.len(),
            doc.anims.len()
        );
        return Ok(());
    }
    for issue in &issues {
        println!("{issue}");
    }
    eprintln!("{} issue(s)", issues.len());
    std::process::exit(1);
}

fn cmd_play(args: PlayArgs) -> anyhow::Result<()> {
    let src = read_source(&args.in_path)?;
    let doc = isaviz::parse_dsl(&src);
    let cfg = match &args.config {
        Some(path) => isaviz::PlaybackConfig::load(path)?,
        None => isaviz::PlaybackConfig::default(),
    };
    let frame_ms = args
        .frame_ms
        .or(cfg.fps.map(|fps| 1000.0 / fps))
        .unwrap_or(1000.0 / isaviz::config::DEFAULT_FPS);
    if !frame_ms.is_finite() || frame_ms <= 0.0 {
        anyhow::bail!("--frame-ms must be > 0");
    }

    let mut animator = isaviz::Animator::for_document(&doc, &cfg);
    let total_ms = animator.total_ms();
    let needed = if total_ms > 0.0 {
        total_ms / (frame_ms * animator.speed())
    } else {
        0.0
    };
    if !needed.is_finite() || needed > MAX_PLAY_TICKS {
        anyhow::bail!(
            "playback at speed {} needs more than {MAX_PLAY_TICKS} ticks; \
             raise speed or --frame-ms",
            animator.speed()
        );
    }
    let evaluator = isaviz::Evaluator::new(&doc);
    let mut out = BufWriter::new(std::io::stdout().lock());

    let mut now = 0.0;
    let mut last = animator.tick(now);
    if let Some(state) = &last {
        write_frame(&mut out, &evaluator.eval_state(state))?;
    }
    animator.play();

    // Overflow carry can land the final step one tick late.
    let mut budget = MAX_PLAY_TICKS as u64 + animator.step_count() as u64 + 2;
    while animator.state().playing && budget > 0 {
        budget -= 1;
        now += frame_ms;
        last = animator.tick(now);
        if let Some(state) = &last {
            write_frame(&mut out, &evaluator.eval_state(state))?;
        }
    }
    // The throttle may have swallowed the final tick.
    if last.is_none() {
        write_frame(&mut out, &evaluator.eval_state(&animator.state()))?;
    }

    out.flush().with_context(|| "flush stdout")?;
    Ok(())
}

fn write_frame(out: &mut impl std::io::Write, frame: &isaviz::SceneFrame) -> anyhow::Result<()> {
    serde_json::to_writer(&mut *out, frame).with_context(|| "serialize scene frame")?;
    writeln!(out).with_context(|| "write scene frame")?;
    Ok(())
}
