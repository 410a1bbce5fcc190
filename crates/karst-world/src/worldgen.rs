use serde::Deserialize;
use std::error::Error;
use std::fs;
use std::path::Path;

#[derive(Clone, Debug, Deserialize, Default)]
pub struct WorldGenConfig {
    #[serde(default)]
    pub height: Height,
    #[serde(default)]
    pub mountains: Mountains,
    #[serde(default)]
    pub biomes: Biomes,
    #[serde(default)]
    pub surface: Surface,
    #[serde(default)]
    pub ores: Ores,
    #[serde(default)]
    pub trees: Trees,
    #[serde(default)]
    pub water: Water,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Height {
    #[serde(default = "default_height_freq")]
    pub frequency: f32,
    #[serde(default = "default_height_octaves")]
    pub octaves: i32,
    #[serde(default = "default_persistence")]
    pub persistence: f32,
    #[serde(default = "default_lacunarity")]
    pub lacunarity: f32,
    #[serde(default = "default_min_y_ratio")]
    pub min_y_ratio: f32,
    #[serde(default = "default_max_y_ratio")]
    pub max_y_ratio: f32,
    #[serde(default = "default_detail_freq")]
    pub detail_frequency: f32,
    #[serde(default = "default_detail_octaves")]
    pub detail_octaves: i32,
    #[serde(default = "default_detail_amp")]
    pub detail_amplitude: f32,
}
fn default_height_freq() -> f32 {
    0.008
}
fn default_height_octaves() -> i32 {
    4
}
fn default_persistence() -> f32 {
    0.5
}
fn default_lacunarity() -> f32 {
    2.0
}
fn default_min_y_ratio() -> f32 {
    0.15
}
fn default_max_y_ratio() -> f32 {
    0.55
}
fn default_detail_freq() -> f32 {
    0.05
}
fn default_detail_octaves() -> i32 {
    2
}
fn default_detail_amp() -> f32 {
    4.0
}
impl Default for Height {
    fn default() -> Self {
        Self {
            frequency: default_height_freq(),
            octaves: default_height_octaves(),
            persistence: default_persistence(),
            lacunarity: default_lacunarity(),
            min_y_ratio: default_min_y_ratio(),
            max_y_ratio: default_max_y_ratio(),
            detail_frequency: default_detail_freq(),
            detail_octaves: default_detail_octaves(),
            detail_amplitude: default_detail_amp(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Mountains {
    #[serde(default = "default_mountain_freq")]
    pub frequency: f32,
    #[serde(default = "default_mountain_thr")]
    pub threshold: f32,
    #[serde(default = "default_mountain_boost")]
    pub boost_ratio: f32,
}
fn default_mountain_freq() -> f32 {
    0.0015
}
fn default_mountain_thr() -> f32 {
    0.35
}
fn default_mountain_boost() -> f32 {
    0.45
}
impl Default for Mountains {
    fn default() -> Self {
        Self {
            frequency: default_mountain_freq(),
            threshold: default_mountain_thr(),
            boost_ratio: default_mountain_boost(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Biomes {
    #[serde(default = "default_temp_freq")]
    pub temp_frequency: f32,
    #[serde(default = "default_moist_freq")]
    pub moisture_frequency: f32,
    #[serde(default = "default_snow_max")]
    pub snow_max: f32,
    #[serde(default = "default_desert_min")]
    pub desert_min: f32,
    #[serde(default = "default_forest_moist")]
    pub forest_moisture_min: f32,
}
fn default_temp_freq() -> f32 {
    0.004
}
fn default_moist_freq() -> f32 {
    0.005
}
fn default_snow_max() -> f32 {
    0.25
}
fn default_desert_min() -> f32 {
    0.72
}
fn default_forest_moist() -> f32 {
    0.55
}
impl Default for Biomes {
    fn default() -> Self {
        Self {
            temp_frequency: default_temp_freq(),
            moisture_frequency: default_moist_freq(),
            snow_max: default_snow_max(),
            desert_min: default_desert_min(),
            forest_moisture_min: default_forest_moist(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Surface {
    #[serde(default = "default_topsoil")]
    pub topsoil_thickness: i32,
    #[serde(default = "default_shoreline")]
    pub shoreline_margin: i32,
}
fn default_topsoil() -> i32 {
    3
}
fn default_shoreline() -> i32 {
    1
}
impl Default for Surface {
    fn default() -> Self {
        Self {
            topsoil_thickness: default_topsoil(),
            shoreline_margin: default_shoreline(),
        }
    }
}

/// Probability bands for a single hash draw per stone voxel, evaluated
/// rarest-first. `max_y` caps how high the ore appears.
#[derive(Clone, Debug, Deserialize)]
pub struct OreBand {
    pub probability: f32,
    pub max_y: i32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Ores {
    #[serde(default = "default_coal")]
    pub coal: OreBand,
    #[serde(default = "default_iron")]
    pub iron: OreBand,
    #[serde(default = "default_gold")]
    pub gold: OreBand,
    #[serde(default = "default_diamond")]
    pub diamond: OreBand,
}
fn default_coal() -> OreBand {
    OreBand {
        probability: 0.028,
        max_y: 128,
    }
}
fn default_iron() -> OreBand {
    OreBand {
        probability: 0.014,
        max_y: 48,
    }
}
fn default_gold() -> OreBand {
    OreBand {
        probability: 0.006,
        max_y: 24,
    }
}
fn default_diamond() -> OreBand {
    OreBand {
        probability: 0.002,
        max_y: 14,
    }
}
impl Default for Ores {
    fn default() -> Self {
        Self {
            coal: default_coal(),
            iron: default_iron(),
            gold: default_gold(),
            diamond: default_diamond(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Trees {
    #[serde(default = "default_tree_prob")]
    pub probability: f32,
    #[serde(default = "default_forest_boost")]
    pub forest_boost: f32,
    #[serde(default = "default_trunk_min")]
    pub trunk_min: i32,
    #[serde(default = "default_trunk_max")]
    pub trunk_max: i32,
    #[serde(default = "default_leaf_radius")]
    pub leaf_radius: i32,
}
fn default_tree_prob() -> f32 {
    0.01
}
fn default_forest_boost() -> f32 {
    4.0
}
fn default_trunk_min() -> i32 {
    4
}
fn default_trunk_max() -> i32 {
    6
}
fn default_leaf_radius() -> i32 {
    2
}
impl Default for Trees {
    fn default() -> Self {
        Self {
            probability: default_tree_prob(),
            forest_boost: default_forest_boost(),
            trunk_min: default_trunk_min(),
            trunk_max: default_trunk_max(),
            leaf_radius: default_leaf_radius(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Water {
    #[serde(default = "default_water_enable")]
    pub enable: bool,
    #[serde(default = "default_water_level_ratio")]
    pub level_ratio: f32,
}
fn default_water_enable() -> bool {
    true
}
fn default_water_level_ratio() -> f32 {
    0.25
}
impl Default for Water {
    fn default() -> Self {
        Self {
            enable: true,
            level_ratio: default_water_level_ratio(),
        }
    }
}

// Flattened snapshot of the config used in tight loops.
#[derive(Clone, Debug)]
pub struct WorldGenParams {
    pub height_frequency: f32,
    pub height_octaves: i32,
    pub persistence: f32,
    pub lacunarity: f32,
    pub min_y_ratio: f32,
    pub max_y_ratio: f32,
    pub detail_frequency: f32,
    pub detail_octaves: i32,
    pub detail_amplitude: f32,
    pub mountain_frequency: f32,
    pub mountain_threshold: f32,
    pub mountain_boost_ratio: f32,
    pub temp_frequency: f32,
    pub moisture_frequency: f32,
    pub snow_max: f32,
    pub desert_min: f32,
    pub forest_moisture_min: f32,
    pub topsoil_thickness: i32,
    pub shoreline_margin: i32,
    pub ores: Ores,
    pub tree_probability: f32,
    pub forest_boost: f32,
    pub trunk_min: i32,
    pub trunk_max: i32,
    pub leaf_radius: i32,
    pub water_enable: bool,
    pub water_level_ratio: f32,
}

impl WorldGenParams {
    pub fn from_config(cfg: &WorldGenConfig) -> Self {
        Self {
            height_frequency: cfg.height.frequency,
            height_octaves: cfg.height.octaves,
            persistence: cfg.height.persistence,
            lacunarity: cfg.height.lacunarity,
            min_y_ratio: cfg.height.min_y_ratio,
            max_y_ratio: cfg.height.max_y_ratio,
            detail_frequency: cfg.height.detail_frequency,
            detail_octaves: cfg.height.detail_octaves,
            detail_amplitude: cfg.height.detail_amplitude,
            mountain_frequency: cfg.mountains.frequency,
            mountain_threshold: cfg.mountains.threshold,
            mountain_boost_ratio: cfg.mountains.boost_ratio,
            temp_frequency: cfg.biomes.temp_frequency,
            moisture_frequency: cfg.biomes.moisture_frequency,
            snow_max: cfg.biomes.snow_max,
            desert_min: cfg.biomes.desert_min,
            forest_moisture_min: cfg.biomes.forest_moisture_min,
            topsoil_thickness: cfg.surface.topsoil_thickness,
            shoreline_margin: cfg.surface.shoreline_margin,
            ores: cfg.ores.clone(),
            tree_probability: cfg.trees.probability,
            forest_boost: cfg.trees.forest_boost,
            trunk_min: cfg.trees.trunk_min,
            trunk_max: cfg.trees.trunk_max,
            leaf_radius: cfg.trees.leaf_radius,
            water_enable: cfg.water.enable,
            water_level_ratio: cfg.water.level_ratio,
        }
    }
}

impl Default for WorldGenParams {
    fn default() -> Self {
        Self::from_config(&WorldGenConfig::default())
    }
}

pub fn load_params_from_path(path: &Path) -> Result<WorldGenParams, Box<dyn Error>> {
    let s = fs::read_to_string(path)?;
    let cfg: WorldGenConfig = toml::from_str(&s)?;
    Ok(WorldGenParams::from_config(&cfg))
}
