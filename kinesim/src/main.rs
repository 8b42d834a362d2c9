use kinesim::{AnimationLoop, FrameQueue, SceneRenderer, SimulationFile, TerminalPolicy, TextRenderer};
use kinesim::{bench_tick, bench_trajectory};
#[cfg(feature = "viewer")]
use kinesim::run_2d;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(about = "Closed-form 2D physics scenario player")]
struct Args {
    /// Scenario file (YAML or JSON), as a path or a name under scenarios/
    #[arg(short, default_value = "projectile.yaml")]
    file_name: String,

    /// Print frames instead of opening a window
    #[arg(long)]
    headless: bool,

    /// Number of ticks to run in headless mode
    #[arg(long, default_value_t = 180)]
    ticks: usize,

    /// Stop on the terminal frame instead of looping
    #[arg(long)]
    halt: bool,

    /// Run the tick and trajectory benchmarks and exit
    #[arg(long)]
    bench: bool,
}

fn resolve_path(file_name: &str) -> PathBuf {
    let direct = PathBuf::from(file_name);
    if direct.exists() {
        return direct;
    }
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios").join(file_name)
}

fn load_simulation_file(path: &Path) -> Result<SimulationFile> {
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    let reader = BufReader::new(file);
    let parsed = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_reader(reader)?,
        _ => serde_yaml::from_reader(reader)?,
    };
    Ok(parsed)
}

fn run_headless(mut animation: AnimationLoop<FrameQueue>, ticks: usize) {
    animation.subscribe_errors(|err| warn!("{err}"));
    let mut renderer = TextRenderer;

    for _ in 0..ticks {
        if !animation.pump(0.0) {
            break;
        }
        if animation.last_error().is_some() {
            continue;
        }
        let stepper = animation.stepper();
        if let (Some(frame), Some(scenario), Some(params)) = (stepper.last_frame(), stepper.scenario(), stepper.snapshot()) {
            println!("{}", renderer.render(frame, scenario, &params));
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if args.bench {
        bench_tick();
        bench_trajectory();
        return Ok(());
    }

    let path = resolve_path(&args.file_name);
    let mut sim = load_simulation_file(&path)?;
    info!("loaded {}", path.display());
    if args.halt {
        sim.engine.on_terminal = TerminalPolicy::Halt;
    }

    let mut animation = AnimationLoop::new(sim.engine, FrameQueue::new()).context("invalid engine settings")?;
    animation.load(sim.scenario).context("scenario rejected")?;

    #[cfg(feature = "viewer")]
    {
        if !args.headless {
            run_2d(animation, sim.viewport);
            return Ok(());
        }
    }

    run_headless(animation, args.ticks);
    Ok(())
}
