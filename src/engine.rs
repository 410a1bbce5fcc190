use std::collections::VecDeque;
use std::sync::Arc;

use hashbrown::HashMap;
use karst_blocks::{Block, BlockRegistry};
use karst_chunk::{ChunkBuf, ChunkOccupancy};
use karst_edit::{EditStore, EditStoreStats};
use karst_mesh_cpu::ChunkMeshCPU;
use karst_runtime::{BuildJob, JobKind, Runtime};
use karst_world::{CHUNK_SIZE, ChunkCoord, World};

use crate::config::EngineConfig;

/// State changes surfaced to the embedding application each tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineOutput {
    /// A chunk buffer became resident (queryable via `get_block`).
    ChunkReady { coord: ChunkCoord },
    /// A chunk's geometry changed; `Engine::mesh` now returns the fresh
    /// buffers, or `None` when nothing remains visible (dispose it).
    MeshUpdated { coord: ChunkCoord },
    /// A chunk left the retained ring and was dropped.
    ChunkUnloaded { coord: ChunkCoord },
    /// An unsupported block was cleared and yielded an item.
    DropSpawned { wx: i32, wy: i32, wz: i32, block: Block },
}

struct ChunkEntry {
    buf: Arc<ChunkBuf>,
    occupancy: ChunkOccupancy,
    mesh: Option<ChunkMeshCPU>,
}

struct InflightJob {
    job_id: u64,
}

/// Chunk lifecycle manager: streams a circular set of chunks around the
/// observer, routes build jobs through the runtime, and applies edits with
/// seam-aware rebuilds.
pub struct Engine {
    world: Arc<World>,
    reg: Arc<BlockRegistry>,
    cfg: EngineConfig,
    runtime: Runtime,
    edits: EditStore,
    chunks: HashMap<ChunkCoord, ChunkEntry>,
    inflight: HashMap<ChunkCoord, InflightJob>,
    mesh_queue: VecDeque<ChunkCoord>,
    center: ChunkCoord,
    outputs: Vec<EngineOutput>,
}

impl Engine {
    pub fn new(seed: i32, cfg: EngineConfig) -> Self {
        Self::with_parts(
            Arc::new(World::with_default_params(seed)),
            Arc::new(BlockRegistry::default_table()),
            cfg,
        )
    }

    pub fn with_parts(world: Arc<World>, reg: Arc<BlockRegistry>, cfg: EngineConfig) -> Self {
        let runtime = Runtime::new(Arc::clone(&world));
        let s = world.chunk_size as i32;
        Self {
            world,
            reg,
            cfg,
            runtime,
            edits: EditStore::new(s, s),
            chunks: HashMap::new(),
            inflight: HashMap::new(),
            mesh_queue: VecDeque::new(),
            center: ChunkCoord::new(0, 0),
            outputs: Vec::new(),
        }
    }

    /// Advance the streaming state machine one step. Results that arrived
    /// since the last tick are applied first so dispatch sees fresh residency.
    pub fn tick(&mut self, observer_x: f32, observer_z: f32) -> Vec<EngineOutput> {
        self.center = ChunkCoord::of_world(
            observer_x.floor() as i32,
            observer_z.floor() as i32,
            CHUNK_SIZE,
        );
        self.apply_worker_results();
        self.evict_far_chunks();
        self.dispatch_generation();
        self.dispatch_meshing();
        std::mem::take(&mut self.outputs)
    }

    /// Block at a world position. Absent chunks and out-of-range heights read
    /// as air; the edit overlay has precedence over generated terrain.
    pub fn get_block(&self, wx: i32, wy: i32, wz: i32) -> Block {
        if wy < 0 || wy >= self.world.world_height as i32 {
            return Block::AIR;
        }
        if let Some(b) = self.edits.get(wx, wy, wz) {
            return b;
        }
        let coord = ChunkCoord::of_world(wx, wz, CHUNK_SIZE);
        self.chunks
            .get(&coord)
            .and_then(|e| e.buf.get_world(wx, wy, wz))
            .unwrap_or(Block::AIR)
    }

    /// Write a block: records the edit in the overlay, patches the resident
    /// buffer, and queues rebuilds for the chunk and any seam neighbors. A
    /// block above that loses its support is cleared recursively and yields
    /// a drop.
    pub fn set_block(&mut self, wx: i32, wy: i32, wz: i32, b: Block) {
        if wy < 0 || wy >= self.world.world_height as i32 {
            log::debug!("ignoring edit outside world height at y={}", wy);
            return;
        }
        self.edits.set(wx, wy, wz, b);
        self.edits.bump_region_around(wx, wz);

        let coord = ChunkCoord::of_world(wx, wz, CHUNK_SIZE);
        if let Some(entry) = self.chunks.get_mut(&coord) {
            let s = CHUNK_SIZE as i32;
            let lx = wx.rem_euclid(s) as usize;
            let lz = wz.rem_euclid(s) as usize;
            let buf = Arc::make_mut(&mut entry.buf);
            buf.set_local(lx, wy as usize, lz, b);
            entry.occupancy = if buf.has_non_air() {
                ChunkOccupancy::Populated
            } else {
                ChunkOccupancy::Empty
            };
            self.queue_mesh_front(coord);
            for n in self.edits.get_affected_chunks(wx, wz) {
                if n != coord && self.chunks.contains_key(&n) {
                    self.queue_mesh(n);
                }
            }
        }

        // Support cascade: the voxel above may have required the one we just
        // replaced (flowers on grass). Clearing it recurses upward.
        let above = self.get_block(wx, wy + 1, wz);
        if !above.is_air() {
            let reg = Arc::clone(&self.reg);
            if let Some(ty) = reg.get(above) {
                if ty.unsupported_on(b) {
                    if let Some(drop) = ty.drop {
                        self.outputs.push(EngineOutput::DropSpawned {
                            wx,
                            wy: wy + 1,
                            wz,
                            block: Block(drop),
                        });
                    }
                    self.set_block(wx, wy + 1, wz, Block::AIR);
                }
            }
        }
    }

    /// Seed the edit overlay from persisted entries. Intended for startup,
    /// before streaming begins; does not trigger rebuilds.
    pub fn load_edits(&mut self, entries: impl IntoIterator<Item = ((i32, i32, i32), Block)>) {
        self.edits.load_entries(entries);
    }

    /// All overlay entries, for persistence.
    pub fn export_edits(&self) -> Vec<((i32, i32, i32), Block)> {
        self.edits.snapshot_all()
    }

    pub fn edit_stats(&self) -> EditStoreStats {
        self.edits.stats()
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn registry(&self) -> &BlockRegistry {
        &self.reg
    }

    pub fn is_resident(&self, coord: ChunkCoord) -> bool {
        self.chunks.contains_key(&coord)
    }

    pub fn resident_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn mesh(&self, coord: ChunkCoord) -> Option<&ChunkMeshCPU> {
        self.chunks.get(&coord).and_then(|e| e.mesh.as_ref())
    }

    pub fn occupancy(&self, coord: ChunkCoord) -> Option<ChunkOccupancy> {
        self.chunks.get(&coord).map(|e| e.occupancy)
    }

    pub fn mesh_count(&self) -> usize {
        self.chunks.values().filter(|e| e.mesh.is_some()).count()
    }

    pub fn inflight_count(&self) -> usize {
        self.inflight.len()
    }

    pub fn debug_mesh_queue(&self) -> Vec<ChunkCoord> {
        self.mesh_queue.iter().copied().collect()
    }

    fn retained_radius_sq(&self) -> i64 {
        let keep = self.cfg.view_radius + self.cfg.margin + self.cfg.hysteresis;
        i64::from(keep) * i64::from(keep)
    }

    fn is_retained(&self, coord: ChunkCoord) -> bool {
        coord.distance_sq(self.center) <= self.retained_radius_sq()
    }

    fn apply_worker_results(&mut self) {
        for out in self.runtime.drain_worker_results() {
            let coord = out.coord;
            match self.inflight.get(&coord) {
                Some(inf) if inf.job_id == out.job_id => {
                    self.inflight.remove(&coord);
                }
                _ => {
                    log::trace!("superseded result for {},{} dropped", coord.cx, coord.cz);
                    continue;
                }
            }
            // Evicted while the job was in flight: discard, the needed-set
            // scan will regenerate it if the observer comes back.
            if !self.is_retained(coord) {
                continue;
            }
            let payload = match out.result {
                Ok(p) => p,
                Err(err) => {
                    log::warn!(
                        "{:?} job for chunk {},{} failed: {}",
                        out.kind,
                        coord.cx,
                        coord.cz,
                        err
                    );
                    continue;
                }
            };

            if out.kind == JobKind::MeshOnly {
                if let Some(entry) = self.chunks.get_mut(&coord) {
                    let had_mesh = entry.mesh.is_some();
                    let has_mesh = payload.cpu.is_some();
                    entry.mesh = payload.cpu;
                    self.edits.mark_built(coord, out.rev);
                    // A chunk meshed down to nothing still owes the consumer
                    // an update so it can drop the stale geometry.
                    if has_mesh || had_mesh {
                        self.outputs.push(EngineOutput::MeshUpdated { coord });
                    }
                    if self.edits.needs_rebuild(coord) {
                        self.queue_mesh_front(coord);
                    }
                }
                continue;
            }

            let mut buf = payload.buf;
            // Edits recorded after the job snapshot still belong in the
            // buffer before the chunk is marked ready.
            let late = self.edits.snapshot_for_chunk(coord);
            if !late.is_empty() {
                let s = CHUNK_SIZE as i32;
                let patched = Arc::make_mut(&mut buf);
                for ((ewx, ewy, ewz), b) in late {
                    if ewy >= 0 && (ewy as usize) < patched.sy {
                        let lx = ewx.rem_euclid(s) as usize;
                        let lz = ewz.rem_euclid(s) as usize;
                        patched.set_local(lx, ewy as usize, lz, b);
                    }
                }
            }
            let occupancy = if buf.has_non_air() {
                ChunkOccupancy::Populated
            } else {
                ChunkOccupancy::Empty
            };
            let newly = !self.chunks.contains_key(&coord);
            let meshed = payload.cpu.is_some();
            self.chunks.insert(
                coord,
                ChunkEntry {
                    buf,
                    occupancy,
                    mesh: payload.cpu,
                },
            );
            self.edits.mark_built(coord, out.rev);
            if newly {
                self.outputs.push(EngineOutput::ChunkReady { coord });
            }
            if meshed {
                self.outputs.push(EngineOutput::MeshUpdated { coord });
            }
            if self.edits.needs_rebuild(coord) {
                self.queue_mesh_front(coord);
            } else if !meshed && occupancy.has_blocks() {
                self.queue_mesh(coord);
            }
            // Neighbors meshed against a missing chunk have stale seams.
            for dz in -1..=1 {
                for dx in -1..=1 {
                    if dx == 0 && dz == 0 {
                        continue;
                    }
                    let n = coord.offset(dx, dz);
                    let meshed_neighbor =
                        self.chunks.get(&n).map(|e| e.mesh.is_some()).unwrap_or(false);
                    if meshed_neighbor {
                        self.queue_mesh(n);
                    }
                }
            }
        }
    }

    fn evict_far_chunks(&mut self) {
        let keep_sq = self.retained_radius_sq();
        let center = self.center;
        let dead: Vec<ChunkCoord> = self
            .chunks
            .keys()
            .filter(|c| c.distance_sq(center) > keep_sq)
            .copied()
            .collect();
        if dead.is_empty() {
            return;
        }
        for coord in dead {
            self.chunks.remove(&coord);
            self.outputs.push(EngineOutput::ChunkUnloaded { coord });
        }
        self.mesh_queue
            .retain(|c| c.distance_sq(center) <= keep_sq);
    }

    fn dispatch_generation(&mut self) {
        if self.cfg.gen_per_tick == 0 {
            return;
        }
        let r = self.cfg.view_radius + self.cfg.margin;
        let r_sq = i64::from(r) * i64::from(r);
        let mut wanted: Vec<(i64, ChunkCoord)> = Vec::new();
        for dz in -r..=r {
            for dx in -r..=r {
                let c = self.center.offset(dx, dz);
                let d = c.distance_sq(self.center);
                if d <= r_sq && !self.chunks.contains_key(&c) && !self.inflight.contains_key(&c) {
                    wanted.push((d, c));
                }
            }
        }
        wanted.sort_by_key(|&(d, c)| (d, c.cx, c.cz));
        for (_, coord) in wanted.into_iter().take(self.cfg.gen_per_tick) {
            let neighbor_bufs = self.resident_neighbor_bufs(coord);
            let kind = if neighbor_bufs.len() >= self.cfg.combined_neighbor_min {
                JobKind::GenerateAndMesh
            } else {
                JobKind::Generate
            };
            let job_id = self.runtime.next_job_id();
            self.inflight.insert(coord, InflightJob { job_id });
            self.runtime.submit_build_job_bg(BuildJob {
                coord,
                kind,
                rev: self.edits.get_rev(coord),
                job_id,
                chunk_edits: self.edits.snapshot_for_chunk(coord),
                prev_buf: None,
                neighbor_bufs,
                reg: Arc::clone(&self.reg),
            });
        }
    }

    fn dispatch_meshing(&mut self) {
        let mut budget = self.cfg.mesh_per_tick;
        let mut deferred: Vec<ChunkCoord> = Vec::new();
        while budget > 0 {
            let Some(coord) = self.mesh_queue.pop_front() else {
                break;
            };
            if self.inflight.contains_key(&coord) {
                // A build is already running; revisit once it lands.
                deferred.push(coord);
                continue;
            }
            let prev = match self.chunks.get(&coord) {
                // Shared, not copied; the worker copy-on-writes if needed.
                Some(e) => Arc::clone(&e.buf),
                // Evicted after it was queued.
                None => continue,
            };
            let job_id = self.runtime.next_job_id();
            let job = BuildJob {
                coord,
                kind: JobKind::MeshOnly,
                rev: self.edits.get_rev(coord),
                job_id,
                chunk_edits: self.edits.snapshot_for_chunk(coord),
                prev_buf: Some(prev),
                neighbor_bufs: self.resident_neighbor_bufs(coord),
                reg: Arc::clone(&self.reg),
            };
            self.inflight.insert(coord, InflightJob { job_id });
            if self.edits.needs_rebuild(coord) {
                self.runtime.submit_build_job_priority(job);
            } else {
                self.runtime.submit_build_job_bg(job);
            }
            budget -= 1;
        }
        for c in deferred {
            self.queue_mesh(c);
        }
    }

    fn resident_neighbor_bufs(&self, coord: ChunkCoord) -> Vec<Arc<ChunkBuf>> {
        let mut bufs = Vec::with_capacity(8);
        for dz in -1..=1 {
            for dx in -1..=1 {
                if dx == 0 && dz == 0 {
                    continue;
                }
                if let Some(e) = self.chunks.get(&coord.offset(dx, dz)) {
                    bufs.push(Arc::clone(&e.buf));
                }
            }
        }
        bufs
    }

    fn queue_mesh(&mut self, coord: ChunkCoord) {
        if !self.mesh_queue.contains(&coord) {
            self.mesh_queue.push_back(coord);
        }
    }

    fn queue_mesh_front(&mut self, coord: ChunkCoord) {
        self.mesh_queue.retain(|c| *c != coord);
        self.mesh_queue.push_front(coord);
    }
}
