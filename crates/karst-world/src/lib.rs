//! World description and deterministic terrain generation.
#![forbid(unsafe_code)]

mod chunk_coord;
pub mod generation;
mod world;
pub mod worldgen;

pub use chunk_coord::ChunkCoord;
pub use generation::{Biome, ColumnProfile, ColumnSampler};
pub use world::{GenCtx, World};
pub use worldgen::{WorldGenConfig, WorldGenParams, load_params_from_path};

/// Edge length of a chunk in voxels (x and z).
pub const CHUNK_SIZE: usize = 16;
/// Vertical extent of the world in voxels.
pub const WORLD_HEIGHT: usize = 128;
