use std::collections::HashMap;
use std::error::Error;
use std::fs;
use std::path::Path;

use super::config::{BlockDef, BlocksConfig, ColorConfig};
use super::types::{Block, BlockId, FaceRole};

/// Compiled, immutable attributes for one block-type byte.
#[derive(Clone, Debug)]
pub struct BlockType {
    pub id: BlockId,
    pub name: String,
    pub solid: bool,
    pub transparent: bool,
    // Face colors resolved per role: [top, bottom, side]
    pub colors: [[f32; 3]; 3],
    pub hardness: f32,
    pub tool: Option<String>,
    pub drop: Option<BlockId>,
    // Block ids the voxel must rest on; empty = no support requirement.
    pub place_on: Vec<BlockId>,
}

impl BlockType {
    fn placeholder(id: BlockId) -> Self {
        BlockType {
            id,
            name: String::new(),
            solid: false,
            transparent: false,
            colors: [[1.0, 0.0, 1.0]; 3],
            hardness: 0.0,
            tool: None,
            drop: None,
            place_on: Vec::new(),
        }
    }

    #[inline]
    pub fn color_for(&self, role: FaceRole) -> [f32; 3] {
        match role {
            FaceRole::Top | FaceRole::All => self.colors[0],
            FaceRole::Bottom => self.colors[1],
            FaceRole::Side => self.colors[2],
        }
    }

    /// True when this block type requires support and `below` does not provide it.
    #[inline]
    pub fn unsupported_on(&self, below: Block) -> bool {
        !self.place_on.is_empty() && !self.place_on.contains(&below.0)
    }
}

#[derive(Default, Clone, Debug)]
pub struct BlockRegistry {
    pub blocks: Vec<BlockType>,
    pub by_name: HashMap<String, BlockId>,
}

impl BlockRegistry {
    #[inline]
    pub fn get(&self, b: Block) -> Option<&BlockType> {
        self.blocks.get(b.0 as usize).filter(|t| !t.name.is_empty())
    }

    pub fn id_by_name(&self, name: &str) -> Option<BlockId> {
        self.by_name.get(name).copied()
    }

    pub fn block_by_name(&self, name: &str) -> Option<Block> {
        self.id_by_name(name).map(Block)
    }

    /// Solid and not transparent: occludes neighbors and AO samples.
    #[inline]
    pub fn is_occluder(&self, b: Block) -> bool {
        self.get(b).map(|t| t.solid && !t.transparent).unwrap_or(false)
    }

    #[inline]
    pub fn is_solid(&self, b: Block) -> bool {
        self.get(b).map(|t| t.solid).unwrap_or(false)
    }

    #[inline]
    pub fn is_transparent(&self, b: Block) -> bool {
        self.get(b).map(|t| t.transparent).unwrap_or(false)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let s = fs::read_to_string(path)?;
        let cfg: BlocksConfig = toml::from_str(&s)?;
        Self::from_config(cfg)
    }

    /// The compiled-in table used when no blocks.toml override is given.
    pub fn default_table() -> Self {
        let cfg: BlocksConfig =
            toml::from_str(DEFAULT_BLOCKS_TOML).expect("built-in blocks table parses");
        Self::from_config(cfg).expect("built-in blocks table compiles")
    }

    pub fn from_config(cfg: BlocksConfig) -> Result<Self, Box<dyn Error>> {
        let mut reg = BlockRegistry::default();
        // First pass: allocate ids and compile per-block attributes.
        for def in &cfg.blocks {
            let id = def.id.unwrap_or(reg.blocks.len() as BlockId);
            let ty = compile_block(id, def);
            if reg.blocks.len() <= id as usize {
                reg.blocks
                    .resize(id as usize + 1, BlockType::placeholder(id));
            }
            reg.blocks[id as usize] = ty;
        }
        reg.by_name = reg
            .blocks
            .iter()
            .filter(|t| !t.name.is_empty())
            .map(|t| (t.name.clone(), t.id))
            .collect();
        // Second pass: resolve name references now that every id exists.
        let mut drops: Vec<(usize, Option<BlockId>, Vec<BlockId>)> = Vec::new();
        for (i, def) in cfg.blocks.iter().enumerate() {
            let idx = def.id.unwrap_or(i as BlockId) as usize;
            let drop = match def.drop.as_deref() {
                Some("none") | Some("") => None,
                Some(name) => Some(
                    reg.id_by_name(name)
                        .ok_or_else(|| format!("block {}: unknown drop {:?}", def.name, name))?,
                ),
                // Default: a broken block drops itself.
                None => Some(idx as BlockId),
            };
            let mut place_on = Vec::new();
            for name in def.place_on.iter().flatten() {
                let id = reg.id_by_name(name).ok_or_else(|| {
                    format!("block {}: unknown place_on {:?}", def.name, name)
                })?;
                place_on.push(id);
            }
            drops.push((idx, drop, place_on));
        }
        for (idx, drop, place_on) in drops {
            reg.blocks[idx].drop = drop;
            reg.blocks[idx].place_on = place_on;
        }
        if let Some(air) = reg.blocks.get_mut(0) {
            // Air never drops anything regardless of the table.
            air.drop = None;
            air.solid = false;
        }
        Ok(reg)
    }
}

fn compile_block(id: BlockId, def: &BlockDef) -> BlockType {
    let solid = def.solid.unwrap_or(true);
    let transparent = def.transparent.unwrap_or(false);
    let colors = match &def.color {
        Some(ColorConfig::Uniform(c)) => [*c, *c, *c],
        Some(ColorConfig::PerFace {
            all,
            top,
            bottom,
            side,
        }) => {
            let base = all.unwrap_or([1.0, 1.0, 1.0]);
            [
                top.unwrap_or(base),
                bottom.unwrap_or(base),
                side.unwrap_or(base),
            ]
        }
        None => [[1.0, 1.0, 1.0]; 3],
    };
    BlockType {
        id,
        name: def.name.clone(),
        solid,
        transparent,
        colors,
        hardness: def.hardness.unwrap_or(1.0),
        tool: def.tool.clone(),
        drop: None,
        place_on: Vec::new(),
    }
}

// Byte values are load-bearing: the terrain generator and saved overlays
// both refer to blocks by id, so explicit ids keep worlds stable if the
// table is reordered.
const DEFAULT_BLOCKS_TOML: &str = r#"
[[blocks]]
name = "air"
id = 0
solid = false
hardness = 0.0
drop = "none"

[[blocks]]
name = "bedrock"
id = 1
color = [0.22, 0.22, 0.24]
hardness = -1.0
drop = "none"

[[blocks]]
name = "stone"
id = 2
color = [0.55, 0.55, 0.57]
hardness = 1.5
tool = "pickaxe"

[[blocks]]
name = "dirt"
id = 3
color = [0.52, 0.38, 0.26]
hardness = 0.5
tool = "shovel"

[[blocks]]
name = "grass"
id = 4
color = { top = [0.36, 0.62, 0.26], bottom = [0.52, 0.38, 0.26], side = [0.44, 0.50, 0.26] }
hardness = 0.6
tool = "shovel"
drop = "dirt"

[[blocks]]
name = "sand"
id = 5
color = [0.86, 0.80, 0.58]
hardness = 0.5
tool = "shovel"

[[blocks]]
name = "snow"
id = 6
color = { top = [0.94, 0.95, 0.97], bottom = [0.52, 0.38, 0.26], side = [0.84, 0.86, 0.90] }
hardness = 0.5
tool = "shovel"

[[blocks]]
name = "water"
id = 7
solid = false
transparent = true
color = [0.22, 0.42, 0.79]
hardness = -1.0
drop = "none"

[[blocks]]
name = "oak_log"
id = 8
color = { top = [0.62, 0.50, 0.32], bottom = [0.62, 0.50, 0.32], side = [0.42, 0.32, 0.19] }
hardness = 2.0
tool = "axe"

[[blocks]]
name = "oak_leaves"
id = 9
transparent = true
color = [0.26, 0.46, 0.18]
hardness = 0.2
drop = "none"

[[blocks]]
name = "coal_ore"
id = 10
color = [0.35, 0.35, 0.36]
hardness = 3.0
tool = "pickaxe"

[[blocks]]
name = "iron_ore"
id = 11
color = [0.62, 0.54, 0.48]
hardness = 3.0
tool = "pickaxe"

[[blocks]]
name = "gold_ore"
id = 12
color = [0.72, 0.64, 0.30]
hardness = 3.0
tool = "pickaxe"

[[blocks]]
name = "diamond_ore"
id = 13
color = [0.42, 0.70, 0.72]
hardness = 3.0
tool = "pickaxe"

[[blocks]]
name = "glass"
id = 14
transparent = true
color = [0.80, 0.88, 0.92]
hardness = 0.3

[[blocks]]
name = "flower"
id = 15
solid = false
hardness = 0.0
place_on = ["grass", "dirt"]
"#;
