use serde::Deserialize;

use super::types::BlockId;

#[derive(Clone, Debug, Deserialize)]
pub struct BlocksConfig {
    pub blocks: Vec<BlockDef>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct BlockDef {
    pub name: String,
    #[serde(default)]
    pub id: Option<BlockId>,
    #[serde(default)]
    pub solid: Option<bool>,
    #[serde(default)]
    pub transparent: Option<bool>,
    #[serde(default)]
    pub color: Option<ColorConfig>,
    #[serde(default)]
    pub hardness: Option<f32>,
    #[serde(default)]
    pub tool: Option<String>,
    #[serde(default)]
    pub drop: Option<String>,
    /// Names of blocks this one must rest on; empty/absent = no requirement.
    #[serde(default)]
    pub place_on: Option<Vec<String>>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum ColorConfig {
    // Simple: color = [0.5, 0.8, 0.3]
    Uniform([f32; 3]),
    // Detailed: color = { top = [...], bottom = [...], side = [...] }
    PerFace {
        #[serde(default)]
        all: Option<[f32; 3]>,
        #[serde(default)]
        top: Option<[f32; 3]>,
        #[serde(default)]
        bottom: Option<[f32; 3]>,
        #[serde(default)]
        side: Option<[f32; 3]>,
    },
}
