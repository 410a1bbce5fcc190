//! Runtime job queues and worker orchestration (slim, engine-only).
#![forbid(unsafe_code)]

mod gen_ctx_pool;

use std::any::Any;
use std::fmt;
use std::panic;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::thread;
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender, TryRecvError, select, unbounded};
use karst_blocks::{Block, BlockRegistry};
use karst_chunk as chunkbuf;
use karst_mesh_cpu::{ChunkMeshCPU, NeighborSnapshots, build_chunk_mesh_cpu};
use karst_world::{ChunkCoord, World};
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::gen_ctx_pool::GenCtxPool;

pub use crate::gen_ctx_pool::PooledGenCtx;

/// What a worker should produce for one chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobKind {
    /// Terrain buffer only; meshing happens later.
    Generate,
    /// Terrain buffer and mesh in one pass.
    GenerateAndMesh,
    /// Remesh an existing buffer (edits, neighbor seams).
    MeshOnly,
}

#[derive(Clone, Debug)]
pub struct BuildJob {
    pub coord: ChunkCoord,
    pub kind: JobKind,
    pub rev: u64,
    pub job_id: u64,
    pub chunk_edits: Vec<((i32, i32, i32), Block)>,
    /// Shared with the engine; workers copy-on-write only when edits apply.
    pub prev_buf: Option<Arc<chunkbuf::ChunkBuf>>,
    pub neighbor_bufs: Vec<Arc<chunkbuf::ChunkBuf>>,
    pub reg: Arc<BlockRegistry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobError {
    /// `MeshOnly` submitted without a buffer to remesh.
    MissingBuffer { coord: ChunkCoord },
    /// The build panicked; the worker caught it and stayed alive.
    WorkerPanicked { coord: ChunkCoord, detail: String },
}

impl fmt::Display for JobError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobError::MissingBuffer { coord } => {
                write!(f, "mesh job for {},{} has no chunk buffer", coord.cx, coord.cz)
            }
            JobError::WorkerPanicked { coord, detail } => {
                write!(
                    f,
                    "worker panicked building chunk {},{}: {}",
                    coord.cx, coord.cz, detail
                )
            }
        }
    }
}

impl std::error::Error for JobError {}

pub struct JobPayload {
    pub buf: Arc<chunkbuf::ChunkBuf>,
    pub occupancy: chunkbuf::ChunkOccupancy,
    /// `None` when the job did not mesh, or the chunk has no visible faces.
    pub cpu: Option<ChunkMeshCPU>,
}

pub struct JobOut {
    pub coord: ChunkCoord,
    pub rev: u64,
    pub job_id: u64,
    pub kind: JobKind,
    pub result: Result<JobPayload, JobError>,
    pub t_total_ms: u32,
    pub t_gen_ms: u32,
    pub t_mesh_ms: u32,
}

/// Runs one job and always answers it, even when the build panics. A
/// panicking build must reject its `JobOut`, not take the worker (or the
/// process) down with it.
fn process_build_job(
    job: BuildJob,
    world: &World,
    ctx_pool: &GenCtxPool,
    tx: &Sender<JobOut>,
) {
    let coord = job.coord;
    let rev = job.rev;
    let job_id = job.job_id;
    let kind = job.kind;
    let t_job_start = Instant::now();

    let outcome = panic::catch_unwind(panic::AssertUnwindSafe(|| {
        run_build_job(job, world, ctx_pool)
    }));
    let (result, t_gen_ms, t_mesh_ms) = match outcome {
        Ok(done) => done,
        Err(payload) => {
            let detail = panic_detail(payload.as_ref());
            log::error!(
                "worker panicked building chunk {},{}: {}",
                coord.cx,
                coord.cz,
                detail
            );
            (Err(JobError::WorkerPanicked { coord, detail }), 0, 0)
        }
    };

    let t_total_ms = elapsed_ms(t_job_start);
    let _ = tx.send(JobOut {
        coord,
        rev,
        job_id,
        kind,
        result,
        t_total_ms,
        t_gen_ms,
        t_mesh_ms,
    });
}

fn panic_detail(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

fn run_build_job(
    job: BuildJob,
    world: &World,
    ctx_pool: &GenCtxPool,
) -> (Result<JobPayload, JobError>, u32, u32) {
    let BuildJob {
        coord,
        kind,
        chunk_edits,
        prev_buf,
        neighbor_bufs,
        reg,
        ..
    } = job;

    let mut t_gen_ms: u32 = 0;
    let mut buf = match (kind, prev_buf) {
        (_, Some(prev)) => prev,
        (JobKind::MeshOnly, None) => {
            return (Err(JobError::MissingBuffer { coord }), 0, 0);
        }
        (JobKind::Generate | JobKind::GenerateAndMesh, None) => {
            let t0 = Instant::now();
            let mut ctx = ctx_pool.acquire();
            let generated =
                chunkbuf::generate_chunk_buffer_with_ctx(world, coord, &reg, &mut ctx);
            t_gen_ms = elapsed_ms(t0);
            Arc::new(generated.buf)
        }
    };

    if !chunk_edits.is_empty() {
        let base_x = coord.cx * buf.sx as i32;
        let base_z = coord.cz * buf.sz as i32;
        let patched = Arc::make_mut(&mut buf);
        for ((wx, wy, wz), b) in chunk_edits.iter().copied() {
            if wy < 0 || wy >= patched.sy as i32 {
                continue;
            }
            let lx = wx - base_x;
            let lz = wz - base_z;
            if lx >= 0 && lz >= 0 && (lx as usize) < patched.sx && (lz as usize) < patched.sz {
                patched.set_local(lx as usize, wy as usize, lz as usize, b);
            }
        }
    }

    let occupancy = if buf.has_non_air() {
        chunkbuf::ChunkOccupancy::Populated
    } else {
        chunkbuf::ChunkOccupancy::Empty
    };

    let mut t_mesh_ms: u32 = 0;
    let cpu = match kind {
        JobKind::Generate => None,
        JobKind::GenerateAndMesh | JobKind::MeshOnly => {
            if occupancy.has_blocks() {
                let t0 = Instant::now();
                let mut snaps = NeighborSnapshots::new(coord);
                snaps.insert(&buf);
                for nb in neighbor_bufs.iter() {
                    snaps.insert(nb);
                }
                let cpu = build_chunk_mesh_cpu(&buf, &snaps, &reg);
                t_mesh_ms = elapsed_ms(t0);
                cpu
            } else {
                None
            }
        }
    };

    (
        Ok(JobPayload {
            buf,
            occupancy,
            cpu,
        }),
        t_gen_ms,
        t_mesh_ms,
    )
}

#[inline]
fn elapsed_ms(t0: Instant) -> u32 {
    t0.elapsed().as_millis().min(u128::from(u32::MAX)) as u32
}

pub struct Runtime {
    job_tx_priority: Sender<BuildJob>,
    job_tx_bg: Sender<BuildJob>,
    res_rx: Receiver<JobOut>,
    _priority_pool: Option<Arc<ThreadPool>>,
    _bg_pool: Option<Arc<ThreadPool>>,
    q_priority: Arc<AtomicUsize>,
    q_bg: Arc<AtomicUsize>,
    inflight_priority: Arc<AtomicUsize>,
    inflight_bg: Arc<AtomicUsize>,
    job_ids: AtomicU64,
    pub w_priority: usize,
    pub w_bg: usize,
    _ctx_pool: Arc<GenCtxPool>,
}

impl Runtime {
    pub fn new(world: Arc<World>) -> Self {
        let (job_tx_priority, job_rx_priority) = unbounded::<BuildJob>();
        let (job_tx_bg, job_rx_bg) = unbounded::<BuildJob>();
        let (res_tx, res_rx) = unbounded::<JobOut>();

        let worker_count: usize = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4)
            .clamp(2, 6);
        let w_priority = 1usize;
        let w_bg = worker_count - w_priority;
        let ctx_pool = GenCtxPool::new(world.as_ref(), worker_count);

        let q_priority_ctr = Arc::new(AtomicUsize::new(0));
        let q_bg_ctr = Arc::new(AtomicUsize::new(0));
        let inflight_priority_ctr = Arc::new(AtomicUsize::new(0));
        let inflight_bg_ctr = Arc::new(AtomicUsize::new(0));

        let priority_pool = {
            let pool = Arc::new(
                ThreadPoolBuilder::new()
                    .num_threads(w_priority)
                    .thread_name(|i| format!("karst-priority-{i}"))
                    .build()
                    .expect("priority pool"),
            );
            for _ in 0..w_priority {
                let rx = job_rx_priority.clone();
                let tx = res_tx.clone();
                let world = world.clone();
                let q = q_priority_ctr.clone();
                let inflight = inflight_priority_ctr.clone();
                let ctx_pool = ctx_pool.clone();
                pool.spawn(move || {
                    while let Ok(job) = rx.recv() {
                        q.fetch_sub(1, Ordering::Relaxed);
                        inflight.fetch_add(1, Ordering::Relaxed);
                        process_build_job(job, world.as_ref(), ctx_pool.as_ref(), &tx);
                        inflight.fetch_sub(1, Ordering::Relaxed);
                    }
                });
            }
            Some(pool)
        };

        let bg_pool = if w_bg > 0 {
            let pool = Arc::new(
                ThreadPoolBuilder::new()
                    .num_threads(w_bg)
                    .thread_name(|i| format!("karst-bg-{i}"))
                    .build()
                    .expect("bg pool"),
            );
            for _ in 0..w_bg {
                let prio_rx = job_rx_priority.clone();
                let bg_rx = job_rx_bg.clone();
                let tx = res_tx.clone();
                let world = world.clone();
                let q_priority = q_priority_ctr.clone();
                let q_bg = q_bg_ctr.clone();
                let inflight_bg = inflight_bg_ctr.clone();
                let inflight_priority = inflight_priority_ctr.clone();
                let ctx_pool = ctx_pool.clone();
                pool.spawn(move || {
                    loop {
                        // Priority work drains first.
                        match prio_rx.try_recv() {
                            Ok(job) => {
                                q_priority.fetch_sub(1, Ordering::Relaxed);
                                inflight_priority.fetch_add(1, Ordering::Relaxed);
                                process_build_job(job, world.as_ref(), ctx_pool.as_ref(), &tx);
                                inflight_priority.fetch_sub(1, Ordering::Relaxed);
                                continue;
                            }
                            Err(TryRecvError::Disconnected) => {
                                while let Ok(job) = bg_rx.try_recv() {
                                    q_bg.fetch_sub(1, Ordering::Relaxed);
                                    inflight_bg.fetch_add(1, Ordering::Relaxed);
                                    process_build_job(job, world.as_ref(), ctx_pool.as_ref(), &tx);
                                    inflight_bg.fetch_sub(1, Ordering::Relaxed);
                                }
                                break;
                            }
                            Err(TryRecvError::Empty) => {}
                        }

                        match bg_rx.try_recv() {
                            Ok(job) => {
                                q_bg.fetch_sub(1, Ordering::Relaxed);
                                inflight_bg.fetch_add(1, Ordering::Relaxed);
                                process_build_job(job, world.as_ref(), ctx_pool.as_ref(), &tx);
                                inflight_bg.fetch_sub(1, Ordering::Relaxed);
                                continue;
                            }
                            Err(TryRecvError::Disconnected) => break,
                            Err(TryRecvError::Empty) => {}
                        }

                        select! {
                            recv(prio_rx) -> res => match res {
                                Ok(job) => {
                                    q_priority.fetch_sub(1, Ordering::Relaxed);
                                    inflight_priority.fetch_add(1, Ordering::Relaxed);
                                    process_build_job(job, world.as_ref(), ctx_pool.as_ref(), &tx);
                                    inflight_priority.fetch_sub(1, Ordering::Relaxed);
                                }
                                Err(_) => {}
                            },
                            recv(bg_rx) -> res => match res {
                                Ok(job) => {
                                    q_bg.fetch_sub(1, Ordering::Relaxed);
                                    inflight_bg.fetch_add(1, Ordering::Relaxed);
                                    process_build_job(job, world.as_ref(), ctx_pool.as_ref(), &tx);
                                    inflight_bg.fetch_sub(1, Ordering::Relaxed);
                                }
                                Err(_) => {}
                            },
                        }
                    }
                });
            }
            Some(pool)
        } else {
            None
        };

        log::info!(
            "runtime started: {} priority + {} background workers",
            w_priority,
            w_bg
        );

        Self {
            job_tx_priority,
            job_tx_bg,
            res_rx,
            _priority_pool: priority_pool,
            _bg_pool: bg_pool,
            q_priority: q_priority_ctr,
            q_bg: q_bg_ctr,
            inflight_priority: inflight_priority_ctr,
            inflight_bg: inflight_bg_ctr,
            job_ids: AtomicU64::new(1),
            w_priority,
            w_bg,
            _ctx_pool: ctx_pool,
        }
    }

    /// Monotonic id used to discard stale results after requeues.
    pub fn next_job_id(&self) -> u64 {
        self.job_ids.fetch_add(1, Ordering::Relaxed)
    }

    pub fn submit_build_job_priority(&self, job: BuildJob) {
        self.q_priority.fetch_add(1, Ordering::Relaxed);
        if self.job_tx_priority.send(job).is_err() {
            self.q_priority.fetch_sub(1, Ordering::Relaxed);
        }
    }

    pub fn submit_build_job_bg(&self, job: BuildJob) {
        self.q_bg.fetch_add(1, Ordering::Relaxed);
        if self.job_tx_bg.send(job).is_err() {
            self.q_bg.fetch_sub(1, Ordering::Relaxed);
        }
    }

    pub fn drain_worker_results(&self) -> Vec<JobOut> {
        self.res_rx.try_iter().collect()
    }

    pub fn queue_debug_counts(&self) -> (usize, usize, usize, usize) {
        (
            self.q_priority.load(Ordering::Relaxed),
            self.inflight_priority.load(Ordering::Relaxed),
            self.q_bg.load(Ordering::Relaxed),
            self.inflight_bg.load(Ordering::Relaxed),
        )
    }
}
