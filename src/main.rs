use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use karst::{Engine, EngineConfig, EngineOutput};
use karst_blocks::BlockRegistry;
use karst_world::{World, load_params_from_path};

/// Headless chunk streamer: walks an observer through the world and reports
/// chunk lifecycle activity.
#[derive(Debug, Parser)]
#[command(name = "karst")]
struct Args {
    /// World seed.
    #[arg(long, default_value_t = 1337)]
    seed: i32,
    /// Chunk radius kept meshed around the observer.
    #[arg(long, default_value_t = 6)]
    view_radius: i32,
    /// Ticks to run before exiting.
    #[arg(long, default_value_t = 600)]
    ticks: u64,
    /// Observer speed in blocks per tick along +x.
    #[arg(long, default_value_t = 0.5)]
    speed: f32,
    /// Optional worldgen TOML overriding the default parameters.
    #[arg(long)]
    worldgen: Option<PathBuf>,
    /// Optional block table TOML overriding the built-in registry.
    #[arg(long)]
    blocks: Option<PathBuf>,
    /// Optional streaming config TOML.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let world = match &args.worldgen {
        Some(path) => World::new(args.seed, load_params_from_path(path)?),
        None => World::with_default_params(args.seed),
    };
    let reg = match &args.blocks {
        Some(path) => BlockRegistry::load_from_path(path)?,
        None => BlockRegistry::default_table(),
    };
    let mut cfg = match &args.config {
        Some(path) => EngineConfig::load_from_path(path)?,
        None => EngineConfig::default(),
    };
    cfg.view_radius = args.view_radius;

    log::info!(
        "streaming seed={} view_radius={} ticks={}",
        args.seed,
        cfg.view_radius,
        args.ticks
    );
    let mut engine = Engine::with_parts(Arc::new(world), Arc::new(reg), cfg);

    let start = Instant::now();
    let mut loaded = 0u64;
    let mut meshed = 0u64;
    let mut unloaded = 0u64;
    for tick in 0..args.ticks {
        let x = tick as f32 * args.speed;
        for out in engine.tick(x, 0.0) {
            match out {
                EngineOutput::ChunkReady { .. } => loaded += 1,
                EngineOutput::MeshUpdated { .. } => meshed += 1,
                EngineOutput::ChunkUnloaded { .. } => unloaded += 1,
                EngineOutput::DropSpawned { wx, wy, wz, block } => {
                    log::info!("drop {:?} at {},{},{}", block, wx, wy, wz);
                }
            }
        }
        if tick % 100 == 0 {
            log::info!(
                "tick {}: resident={} meshes={} inflight={}",
                tick,
                engine.resident_count(),
                engine.mesh_count(),
                engine.inflight_count()
            );
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    log::info!(
        "done in {:.1}s: loaded={} meshed={} unloaded={} resident={}",
        start.elapsed().as_secs_f32(),
        loaded,
        meshed,
        unloaded,
        engine.resident_count()
    );
    Ok(())
}
