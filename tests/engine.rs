use std::time::{Duration, Instant};

use karst::{Engine, EngineConfig, EngineOutput};
use karst_blocks::Block;
use karst_world::ChunkCoord;

fn small_cfg() -> EngineConfig {
    EngineConfig {
        view_radius: 2,
        margin: 1,
        hysteresis: 1,
        gen_per_tick: 2,
        mesh_per_tick: 8,
        combined_neighbor_min: 4,
    }
}

/// Tick until the engine has no queued or in-flight work for a few
/// consecutive ticks, collecting every output along the way.
fn quiesce(engine: &mut Engine, x: f32, z: f32) -> Vec<EngineOutput> {
    let deadline = Instant::now() + Duration::from_secs(60);
    let mut all = Vec::new();
    let mut idle = 0;
    loop {
        let out = engine.tick(x, z);
        let busy = !out.is_empty()
            || engine.inflight_count() > 0
            || !engine.debug_mesh_queue().is_empty();
        all.extend(out);
        if busy {
            idle = 0;
        } else {
            idle += 1;
            if idle >= 5 {
                return all;
            }
        }
        assert!(Instant::now() < deadline, "engine did not quiesce");
        std::thread::sleep(Duration::from_millis(2));
    }
}

fn circle_coords(center: ChunkCoord, r: i32) -> Vec<ChunkCoord> {
    let mut out = Vec::new();
    for dz in -r..=r {
        for dx in -r..=r {
            if dx * dx + dz * dz <= r * r {
                out.push(center.offset(dx, dz));
            }
        }
    }
    out
}

#[test]
fn streaming_fills_circular_needed_set() {
    let mut engine = Engine::new(42, small_cfg());
    let outs = quiesce(&mut engine, 8.0, 8.0);

    let center = ChunkCoord::new(0, 0);
    let needed = circle_coords(center, 3);
    for c in &needed {
        assert!(engine.is_resident(*c), "chunk {},{} not resident", c.cx, c.cz);
    }
    assert_eq!(engine.resident_count(), needed.len());
    assert!(!engine.is_resident(ChunkCoord::new(4, 0)));

    let ready = outs
        .iter()
        .filter(|o| matches!(o, EngineOutput::ChunkReady { .. }))
        .count();
    assert_eq!(ready, needed.len());

    // Terrain chunks in view end up with geometry.
    for c in circle_coords(center, 2) {
        assert!(engine.mesh(c).is_some(), "chunk {},{} has no mesh", c.cx, c.cz);
    }
}

#[test]
fn absent_chunks_read_as_air() {
    let engine = Engine::new(7, small_cfg());
    assert_eq!(engine.get_block(10_000, 10, 10_000), Block::AIR);
    assert_eq!(engine.get_block(0, -1, 0), Block::AIR);
    assert_eq!(engine.get_block(0, 10_000, 0), Block::AIR);
}

#[test]
fn edit_rebuild_targets_only_boundary_neighbors() {
    let mut engine = Engine::new(42, small_cfg());
    quiesce(&mut engine, 40.0, 56.0);
    let stone = engine.registry().block_by_name("stone").expect("stone");

    // lx == 0 face of chunk (2,3): only the -x neighbor shares the seam.
    engine.set_block(32, 10, 52, stone);
    assert_eq!(engine.get_block(32, 10, 52), stone);

    let q = engine.debug_mesh_queue();
    assert_eq!(q.first().copied(), Some(ChunkCoord::new(2, 3)));
    assert!(q.contains(&ChunkCoord::new(1, 3)));
    assert!(!q.contains(&ChunkCoord::new(3, 3)));
    assert!(!q.contains(&ChunkCoord::new(2, 2)));
    assert!(!q.contains(&ChunkCoord::new(2, 4)));

    let outs = quiesce(&mut engine, 40.0, 56.0);
    for c in [ChunkCoord::new(2, 3), ChunkCoord::new(1, 3)] {
        assert!(
            outs.contains(&EngineOutput::MeshUpdated { coord: c }),
            "no rebuild for {},{}",
            c.cx,
            c.cz
        );
    }
}

#[test]
fn duplicate_rebuild_requests_collapse() {
    let mut engine = Engine::new(42, small_cfg());
    quiesce(&mut engine, 40.0, 56.0);
    let stone = engine.registry().block_by_name("stone").expect("stone");

    // Two interior edits in the same chunk queue one rebuild.
    engine.set_block(40, 10, 56, stone);
    engine.set_block(41, 11, 56, stone);
    assert_eq!(engine.debug_mesh_queue(), vec![ChunkCoord::new(2, 3)]);
}

#[test]
fn clearing_support_drops_dependent_block() {
    let mut engine = Engine::new(42, small_cfg());
    quiesce(&mut engine, 8.0, 8.0);
    let grass = engine.registry().block_by_name("grass").expect("grass");
    let flower = engine.registry().block_by_name("flower").expect("flower");

    engine.set_block(5, 120, 5, grass);
    engine.set_block(5, 121, 5, flower);
    assert_eq!(engine.get_block(5, 121, 5), flower);

    engine.set_block(5, 120, 5, Block::AIR);
    assert_eq!(engine.get_block(5, 121, 5), Block::AIR);
    let outs = engine.tick(8.0, 8.0);
    assert!(outs.contains(&EngineOutput::DropSpawned {
        wx: 5,
        wy: 121,
        wz: 5,
        block: flower,
    }));
}

#[test]
fn clearing_a_chunk_to_empty_reports_mesh_removal() {
    let mut engine = Engine::new(42, small_cfg());
    quiesce(&mut engine, 8.0, 8.0);
    let coord = ChunkCoord::new(0, 0);
    assert!(engine.mesh(coord).is_some());

    // Empty the whole chunk; consumers holding the old geometry must be
    // told to drop it even though no new geometry exists.
    let height = engine.world().world_height as i32;
    for y in 0..height {
        for z in 0..16 {
            for x in 0..16 {
                if !engine.get_block(x, y, z).is_air() {
                    engine.set_block(x, y, z, Block::AIR);
                }
            }
        }
    }
    let outs = quiesce(&mut engine, 8.0, 8.0);
    assert!(outs.contains(&EngineOutput::MeshUpdated { coord }));
    assert!(engine.mesh(coord).is_none());
}

#[test]
fn eviction_unloads_chunks_beyond_retained_ring() {
    let mut engine = Engine::new(42, small_cfg());
    quiesce(&mut engine, 8.0, 8.0);
    let before = engine.resident_count();
    assert!(before > 0);

    let outs = quiesce(&mut engine, 3200.0, 0.0);
    let unloaded = outs
        .iter()
        .filter(|o| matches!(o, EngineOutput::ChunkUnloaded { .. }))
        .count();
    assert_eq!(unloaded, before);
    assert!(!engine.is_resident(ChunkCoord::new(0, 0)));
    assert!(engine.is_resident(ChunkCoord::new(200, 0)));
    assert_eq!(engine.resident_count(), circle_coords(ChunkCoord::new(200, 0), 3).len());
}

#[test]
fn results_for_evicted_chunks_are_discarded() {
    let mut engine = Engine::new(42, small_cfg());
    // Dispatch generation near the origin, then leave before it lands.
    engine.tick(8.0, 8.0);
    quiesce(&mut engine, 3200.0, 0.0);
    assert!(!engine.is_resident(ChunkCoord::new(0, 0)));
    assert_eq!(engine.resident_count(), circle_coords(ChunkCoord::new(200, 0), 3).len());
}

#[test]
fn overlay_survives_reload_and_overrides_terrain() {
    let mut engine = Engine::new(42, small_cfg());
    quiesce(&mut engine, 8.0, 8.0);
    let glass = engine.registry().block_by_name("glass").expect("glass");
    engine.set_block(5, 100, 5, glass);
    let saved = engine.export_edits();
    drop(engine);

    let mut engine = Engine::new(42, small_cfg());
    engine.load_edits(saved);
    // Overlay answers before the chunk is even generated.
    assert_eq!(engine.get_block(5, 100, 5), glass);

    quiesce(&mut engine, 8.0, 8.0);
    assert_eq!(engine.get_block(5, 100, 5), glass);
    assert!(engine.mesh(ChunkCoord::new(0, 0)).is_some());
}
