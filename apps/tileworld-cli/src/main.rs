mod demo;

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tileworld_engine::{Clock, Engine, EngineConfig, ManualClock, SystemClock, shared};
use tileworld_input::{KeyEvent, PointerEvent};
use tileworld_render::{
    AsciiGridRenderer, DebugTextRenderer, HeadlessPresentation, JsonRenderer, Renderer,
};
use tileworld_tools::{EngineInspector, WorldInspector};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tileworld-cli", about = "Headless tileworld runner")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print crate versions
    Info,
    /// Run the demo garden with scripted input
    Run {
        /// Ticks per second
        #[arg(short, long, default_value = "20")]
        tps: f64,
        /// Simulated seconds to run
        #[arg(short, long, default_value = "3")]
        seconds: f64,
        /// Seed of the world's random source
        #[arg(long, default_value = "42")]
        seed: u64,
        /// Run on the wall clock in a background thread instead of virtual time
        #[arg(long)]
        realtime: bool,
        /// Print the final frame as JSON
        #[arg(long)]
        json: bool,
    },
    /// Step the demo garden and print inspector summaries
    Inspect {
        /// Steps to take before inspecting
        #[arg(long, default_value = "0")]
        steps: u64,
        #[arg(long, default_value = "42")]
        seed: u64,
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("tileworld-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", tileworld_common::crate_info());
            println!("input: {}", tileworld_input::crate_info());
            println!("kernel: {}", tileworld_kernel::crate_info());
            println!("engine: {}", tileworld_engine::crate_info());
            println!("render: {}", tileworld_render::crate_info());
            println!("assets: {}", tileworld_assets::crate_info());
            println!("tools: {}", tileworld_tools::crate_info());
        }
        Commands::Run {
            tps,
            seconds,
            seed,
            realtime,
            json,
        } => {
            anyhow::ensure!(
                seconds.is_finite() && seconds > 0.0,
                "--seconds must be positive, got {seconds}"
            );
            let config = EngineConfig::default().with_ticks_per_second(tps);
            if realtime {
                let engine = Engine::with_clock(config, SystemClock::default())?;
                run_demo(&engine, seconds, seed, json, true)?;
            } else {
                let engine = Engine::with_clock(config, ManualClock::new())?;
                run_demo(&engine, seconds, seed, json, false)?;
            }
        }
        Commands::Inspect { steps, seed, json } => {
            let (mut world, gardener) = demo::garden(seed)?;
            for _ in 0..steps {
                world.step();
            }
            let summary = WorldInspector::summary(&world);
            let info = WorldInspector::inspect_entity(&world, gardener);
            if json {
                let out = serde_json::json!({ "world": summary, "gardener": info });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!("{summary}");
                if let Some(info) = info {
                    println!("{info}");
                }
                print!("{}", AsciiGridRenderer::default().render(&world.frame()));
            }
        }
    }

    Ok(())
}

/// Three phases: walk right, walk down, then click the gardener to pause it.
fn run_demo<C: Clock>(
    engine: &Engine<C>,
    seconds: f64,
    seed: u64,
    json: bool,
    realtime: bool,
) -> anyhow::Result<()> {
    let presentation = Arc::new(HeadlessPresentation::new());
    engine.set_presentation(presentation.clone());
    let (world, gardener) = demo::garden(seed)?;
    let world = shared(world);
    engine.switch_active_world(world.clone());
    presentation.sync();

    let phase = Duration::from_secs_f64(seconds / 3.0);
    let advance = |d: Duration| {
        if realtime {
            std::thread::sleep(d);
        } else {
            engine.run_for(d);
        }
    };
    if realtime {
        engine.start()?;
    }

    presentation.key(KeyEvent::pressed('d'));
    presentation.key(KeyEvent::typed('d'));
    advance(phase);
    presentation.key(KeyEvent::released('d'));
    presentation.key(KeyEvent::pressed('s'));
    advance(phase);
    presentation.key(KeyEvent::released('s'));
    let target = {
        let world = world.lock().map_err(|_| anyhow::anyhow!("world lock poisoned"))?;
        world.position(gardener)?
    };
    let (x, y) = demo::cell_center(target.x, target.y);
    presentation.pointer(PointerEvent::click(x, y));
    advance(phase);

    engine.stop();

    let summary = EngineInspector::summary(engine);
    tracing::info!(cycles = summary.cycles, overruns = summary.overruns, "demo finished");
    if json {
        if let Some(frame) = presentation.present(&JsonRenderer) {
            println!("{}", frame?);
        }
        return Ok(());
    }
    if let Some(grid) = presentation.present(&AsciiGridRenderer::default()) {
        print!("{grid}");
    }
    if let Some(text) = presentation.present(&DebugTextRenderer::new()) {
        print!("{text}");
    }
    println!("{summary}");
    let world = world.lock().map_err(|_| anyhow::anyhow!("world lock poisoned"))?;
    if let Some(g) = world.behavior::<demo::Gardener>(gardener) {
        println!("gardener: collected={} paused={}", g.collected, g.paused);
    }
    if let Some(garden) = world.logic::<demo::Garden>() {
        println!(
            "garden: regrowths={} typed={} clicks={}",
            garden.regrowths, garden.typed, garden.clicks_on_entities
        );
    }
    Ok(())
}
