use anyhow::Context;
use clap::{Parser, Subcommand};
use frameloop_input::Action;
use frameloop_kernel::{ManualClock, MonotonicClock, Pacer, Tick};
use frameloop_lessons::{LessonConfig, LessonKind};
use frameloop_render::DebugTextRenderer;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "frameloop-cli", about = "Run frameloop lessons headless")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the available lessons
    List,
    /// Show a lesson's steps and initial scene
    Info {
        lesson: LessonKind,
        /// Lesson settings (YAML)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Print the default lesson settings as YAML
    Config,
    /// Run a lesson with the text renderer
    Run {
        lesson: LessonKind,
        /// Stop after this many frames
        #[arg(short = 'n', long, value_parser = clap::value_parser!(u64).range(1..))]
        frames: Option<u64>,
        /// Target frame rate
        #[arg(long)]
        fps: Option<f64>,
        /// Advance a simulated clock by exactly 1/fps per frame instead of waiting
        #[arg(long)]
        simulated: bool,
        /// Lesson settings (YAML)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Print the rendered frame every K frames (0 disables)
        #[arg(long, default_value = "0")]
        print_every: u64,
        /// Queue an action before a frame, e.g. `30:spawn-sphere` or `60:zoom=1.5`
        #[arg(short, long = "action", value_parser = parse_scripted)]
        actions: Vec<(u64, Action)>,
    },
}

fn parse_scripted(raw: &str) -> Result<(u64, Action), String> {
    let (frame, action) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected `frame:action`, got `{raw}`"))?;
    let frame = frame
        .trim()
        .parse()
        .map_err(|e| format!("bad frame number `{frame}`: {e}"))?;
    let action = action.parse().map_err(|e| format!("{e}"))?;
    Ok((frame, action))
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<LessonConfig> {
    match path {
        Some(path) => LessonConfig::load(path)
            .with_context(|| format!("loading lesson config {}", path.display())),
        None => Ok(LessonConfig::default()),
    }
}

struct RunOptions {
    frames: Option<u64>,
    fps: f64,
    simulated: bool,
    print_every: u64,
    script: BTreeMap<u64, Vec<Action>>,
}

fn run(kind: LessonKind, config: &LessonConfig, mut options: RunOptions) -> anyhow::Result<()> {
    let clock = ManualClock::new();
    let mut lesson = if options.simulated {
        frameloop_lessons::build(kind, config, clock.clone())?
    } else {
        frameloop_lessons::build(kind, config, MonotonicClock::new())?
    };
    let mut pacer = if options.simulated {
        Pacer::unpaced()
    } else {
        Pacer::new(options.fps)
    };
    let step = Duration::from_secs_f64(1.0 / options.fps);
    let mut renderer = DebugTextRenderer::new();

    tracing::info!(lesson = %kind, fps = options.fps, simulated = options.simulated, "running");
    let mut frames = 0u64;
    let mut last_elapsed = Duration::ZERO;
    loop {
        for action in options.script.remove(&(frames + 1)).unwrap_or_default() {
            lesson.push_action(action);
        }
        if options.simulated {
            clock.advance(step);
        }

        let time = match lesson.tick(&mut renderer, &mut pacer)? {
            Tick::Scheduled(time) | Tick::Finished(time) => time,
            Tick::Inactive => break,
        };
        frames += 1;
        last_elapsed = time.elapsed;
        if options.print_every > 0 && time.frame % options.print_every == 0 {
            println!("{}", renderer.last_output());
            println!("status: {}", lesson.status());
        }

        if options.frames.is_some_and(|limit| frames >= limit) {
            lesson.liveness().stop();
            break;
        }
        if !pacer.wait() {
            break;
        }
    }

    println!(
        "{kind}: {frames} frames in {:.3}s ({})",
        last_elapsed.as_secs_f64(),
        lesson.status()
    );
    Ok(())
}

fn info(kind: LessonKind, config: &LessonConfig) -> anyhow::Result<()> {
    let lesson = frameloop_lessons::build(kind, config, ManualClock::new())?;
    let stage = lesson.stage();
    println!("{kind}: {}", kind.description());
    println!("steps: {}", lesson.step_names().join(" -> "));
    println!(
        "scene: {} nodes, {} geometries, {} materials, background {}",
        stage.scene.len(),
        stage.pool.live_geometries(),
        stage.pool.live_materials(),
        stage.scene.background.to_hex_string()
    );
    for (id, node) in stage.scene.nodes() {
        println!("  [{}] {}", id.short(), node.name);
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::List => {
            for kind in LessonKind::ALL {
                println!("{:<16} {}", kind.name(), kind.description());
            }
        }
        Commands::Info { lesson, config } => {
            let config = load_config(config.as_ref())?;
            info(lesson, &config)?;
        }
        Commands::Config => {
            print!("{}", LessonConfig::default().to_yaml()?);
        }
        Commands::Run {
            lesson,
            frames,
            fps,
            simulated,
            config,
            print_every,
            actions,
        } => {
            let mut config = load_config(config.as_ref())?;
            if let Some(fps) = fps {
                config.driver.refresh_hz = fps;
                config.validate().context("invalid --fps")?;
            }
            let mut script: BTreeMap<u64, Vec<Action>> = BTreeMap::new();
            for (frame, action) in actions {
                script.entry(frame).or_default().push(action);
            }
            let options = RunOptions {
                frames: frames.or(config.driver.frame_limit),
                fps: config.driver.refresh_hz,
                simulated,
                print_every,
                script,
            };
            run(lesson, &config, options)?;
        }
    }

    Ok(())
}
