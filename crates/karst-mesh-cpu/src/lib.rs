//! CPU meshing: per-face culling with baked vertex AO (engine-only).
#![forbid(unsafe_code)]

mod build;
mod constants;
mod face;
mod mesh_build;
mod neighbors;

pub use build::{ChunkMeshCPU, build_chunk_mesh_cpu};
pub use constants::AO_SHADE;
pub use face::{ALL_FACES, Face};
pub use mesh_build::MeshBuild;
pub use neighbors::NeighborSnapshots;
