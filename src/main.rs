//! nodescript - command line front end
//!
//! Compiles node graph projects to Rhai and runs them headless.

use anyhow::Context;
use clap::{Parser, Subcommand};
use nodescript_rs::{
    compiler::CodeGenerator,
    config::EngineConfig,
    graph::{Project, SocketDirection},
    host::{FrameOutcome, HostLoop},
    world::WorldSnapshot,
    NodeCatalog,
};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "nodescript",
    about = "Compile node graphs into game scripts and run them"
)]
struct Cli {
    /// Engine configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print or write the generated script for a project
    Compile {
        project: PathBuf,
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Skip the re-indentation pass
        #[arg(long)]
        raw: bool,
    },
    /// Compile a project and run it headless, printing the final world
    Run {
        project: PathBuf,
        /// Number of frames to run
        #[arg(short, long, default_value = "60")]
        frames: u64,
        /// Seconds per frame (default: from config frame rate)
        #[arg(short, long)]
        delta: Option<f64>,
        /// Initial world snapshot (JSON)
        #[arg(short, long)]
        world: Option<PathBuf>,
        /// Pace frames in real time instead of as fast as possible
        #[arg(long)]
        realtime: bool,
    },
    /// List node kinds and their sockets
    Catalog,
}

fn init_logging(log_file: Option<&Path>) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,nodescript_rs=debug"));
    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    match log_file {
        Some(path) => {
            let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
            let name = path
                .file_name()
                .context("log file path has no file name")?;
            let appender = tracing_appender::rolling::never(dir.unwrap_or(Path::new(".")), name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(writer),
                )
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .init();
            Ok(None)
        }
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(EngineConfig::load_default_location()),
    }
}

fn compile(project: &Path, raw: bool) -> anyhow::Result<nodescript_rs::GeneratedScript> {
    let project = Project::load(project)
        .with_context(|| format!("loading project {}", project.display()))?;

    let catalog = NodeCatalog::global();
    for (scene, graph) in &project.scenes {
        for issue in graph.validate(catalog) {
            tracing::warn!(%scene, ?issue, "graph issue");
        }
    }

    let generator = CodeGenerator::new(catalog);
    let generator = if raw {
        generator.without_formatting()
    } else {
        generator
    };
    Ok(generator.generate_project(&project))
}

fn print_catalog() {
    for def in NodeCatalog::global().iter() {
        let sockets = |direction| {
            def.sockets
                .iter()
                .filter(|s| s.direction == direction)
                .map(|s| format!("{}:{}", s.name, s.ty))
                .collect::<Vec<_>>()
                .join(", ")
        };
        println!(
            "{:<14} {:<8} in [{}] out [{}]",
            def.kind.as_str(),
            format!("{:?}", def.category),
            sockets(SocketDirection::Input),
            sockets(SocketDirection::Output)
        );
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_logging(cli.log_file.as_deref())?;
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Compile {
            project,
            output,
            raw,
        } => {
            let script = compile(&project, raw)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, &script.source)
                        .with_context(|| format!("writing {}", path.display()))?;
                    tracing::info!(path = %path.display(), stats = ?script.stats, "script written");
                }
                None => print!("{}", script.source),
            }
        }
        Commands::Run {
            project,
            frames,
            delta,
            world,
            realtime,
        } => {
            let script = compile(&project, false)?;
            let world = match world {
                Some(path) => WorldSnapshot::load(&path)
                    .with_context(|| format!("loading world {}", path.display()))?,
                None => config.world.snapshot(),
            };

            let mut host = HostLoop::spawn(&config)?.with_world(world);
            host.load(script.source)?;

            let mut outcome = host.init()?;
            if outcome == FrameOutcome::Continue {
                outcome = if realtime {
                    host.run_realtime(Some(frames))?
                } else {
                    host.run_frames(frames, delta.unwrap_or(config.host.frame_delta()))?
                };
            }
            if let FrameOutcome::Failed(detail) = &outcome {
                tracing::error!(%detail, "run stopped on sandbox error");
            }
            tracing::info!(frames = host.frames(), ended = host.is_ended(), "run finished");

            let world = host
                .into_world()
                .context("sandbox did not return the world snapshot")?;
            println!("{}", serde_json::to_string_pretty(&world)?);
        }
        Commands::Catalog => print_catalog(),
    }

    Ok(())
}
