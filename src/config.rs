use std::error::Error;
use std::path::Path;

use serde::Deserialize;

fn default_view_radius() -> i32 {
    6
}
fn default_margin() -> i32 {
    1
}
fn default_hysteresis() -> i32 {
    2
}
fn default_gen_per_tick() -> usize {
    1
}
fn default_mesh_per_tick() -> usize {
    8
}
fn default_combined_neighbor_min() -> usize {
    4
}

/// Streaming knobs for the chunk lifecycle manager.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Chunk radius kept meshed around the observer.
    #[serde(default = "default_view_radius")]
    pub view_radius: i32,
    /// Extra ring generated past the view radius.
    #[serde(default = "default_margin")]
    pub margin: i32,
    /// Extra ring a resident chunk may drift into before eviction.
    #[serde(default = "default_hysteresis")]
    pub hysteresis: i32,
    /// Generation jobs dispatched per tick, nearest first.
    #[serde(default = "default_gen_per_tick")]
    pub gen_per_tick: usize,
    /// Remesh jobs dispatched per tick.
    #[serde(default = "default_mesh_per_tick")]
    pub mesh_per_tick: usize,
    /// Resident neighbors needed to fold meshing into the generate job.
    #[serde(default = "default_combined_neighbor_min")]
    pub combined_neighbor_min: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            view_radius: default_view_radius(),
            margin: default_margin(),
            hysteresis: default_hysteresis(),
            gen_per_tick: default_gen_per_tick(),
            mesh_per_tick: default_mesh_per_tick(),
            combined_neighbor_min: default_combined_neighbor_min(),
        }
    }
}

impl EngineConfig {
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let cfg: EngineConfig = toml::from_str(&text)?;
        Ok(cfg)
    }
}
