//! Deterministic column generation: height, biome, ores, water, trees.
//!
//! Everything here is a pure function of (world seed, coordinates). Voxel
//! "randomness" is a coordinate hash, never a stateful stream, so a chunk
//! regenerated after eviction is byte-identical to its first build.

use fastnoise_lite::FastNoiseLite;
use karst_blocks::{Block, BlockId, BlockRegistry};

use crate::world::{GenCtx, World};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Biome {
    Desert,
    Snow,
    Forest,
    Plains,
}

/// Per-column result of the terrain function, memoized in `GenCtx`.
#[derive(Clone, Copy, Debug)]
pub struct ColumnProfile {
    /// Number of solid terrain layers; top terrain voxel sits at `height - 1`.
    pub height: i32,
    pub biome: Biome,
    /// Highest trunk voxel, when a tree spawns in this column.
    pub trunk_top: Option<i32>,
}

/// Block ids the generator emits, resolved from the registry once per task.
#[derive(Clone, Copy, Debug)]
struct GenBlocks {
    bedrock: BlockId,
    stone: BlockId,
    dirt: BlockId,
    grass: BlockId,
    sand: BlockId,
    snow: BlockId,
    water: BlockId,
    log: BlockId,
    leaves: BlockId,
    coal: BlockId,
    iron: BlockId,
    gold: BlockId,
    diamond: BlockId,
}

impl GenBlocks {
    fn resolve(reg: &BlockRegistry) -> Self {
        let id = |name: &str| reg.id_by_name(name).unwrap_or(0);
        Self {
            bedrock: id("bedrock"),
            stone: id("stone"),
            dirt: id("dirt"),
            grass: id("grass"),
            sand: id("sand"),
            snow: id("snow"),
            water: id("water"),
            log: id("oak_log"),
            leaves: id("oak_leaves"),
            coal: id("coal_ore"),
            iron: id("iron_ore"),
            gold: id("gold_ore"),
            diamond: id("diamond_ore"),
        }
    }
}

/// Column-oriented sampler over a reusable `GenCtx`. Construct one per
/// generation task; it memoizes column profiles so the tree overlay's
/// neighbor scans stay cheap.
pub struct ColumnSampler<'a> {
    world: &'a World,
    ctx: &'a mut GenCtx,
    ids: GenBlocks,
}

impl<'a> ColumnSampler<'a> {
    pub fn new(world: &'a World, ctx: &'a mut GenCtx, reg: &BlockRegistry) -> Self {
        let ids = GenBlocks::resolve(reg);
        Self { world, ctx, ids }
    }

    pub fn profile(&mut self, x: i32, z: i32) -> ColumnProfile {
        if let Some(p) = self.ctx.columns.get(&(x, z)) {
            return *p;
        }
        let p = compute_profile(self.world, self.ctx, x, z);
        self.ctx.columns.insert((x, z), p);
        p
    }

    /// Conservative highest-occupied bound for one column: terrain, water
    /// surface, and canopy top (one above the trunk top) all count.
    pub fn column_y_max(&mut self, x: i32, z: i32) -> i32 {
        let p = self.profile(x, z);
        let mut top = p.height - 1;
        if self.world.gen_params.water_enable {
            top = top.max(self.world.sea_level());
        }
        if let Some(tt) = p.trunk_top {
            top = top.max(tt + 1);
        }
        top
    }

    /// The block at a world coordinate. Pure in (seed, x, y, z).
    pub fn block_at(&mut self, x: i32, y: i32, z: i32) -> Block {
        let h = self.world.world_height as i32;
        if y < 0 || y >= h {
            return Block::AIR;
        }
        if y == 0 {
            return Block(self.ids.bedrock);
        }
        let p = self.profile(x, z);
        if y < p.height {
            return self.terrain_block(x, y, z, p);
        }
        // Above the terrain surface: water, then trees, else air.
        let sea = self.world.sea_level();
        if self.world.gen_params.water_enable && y <= sea {
            return Block(self.ids.water);
        }
        if let Some(tt) = p.trunk_top {
            if y >= p.height && y <= tt {
                return Block(self.ids.log);
            }
        }
        if self.canopy_at(x, y, z) {
            return Block(self.ids.leaves);
        }
        Block::AIR
    }

    fn terrain_block(&mut self, x: i32, y: i32, z: i32, p: ColumnProfile) -> Block {
        let params = &self.ctx.params;
        let stone_top = p.height - params.topsoil_thickness - 1;
        if y <= stone_top {
            let seed = self.world.seed as u32;
            let r = rand01_3(seed, x, y, z, SALT_ORE);
            let ores = &params.ores;
            let id = if y <= ores.diamond.max_y && r < ores.diamond.probability {
                self.ids.diamond
            } else if y <= ores.gold.max_y && r < ores.gold.probability {
                self.ids.gold
            } else if y <= ores.iron.max_y && r < ores.iron.probability {
                self.ids.iron
            } else if y <= ores.coal.max_y && r < ores.coal.probability {
                self.ids.coal
            } else {
                self.ids.stone
            };
            return Block(id);
        }
        if y < p.height - 1 {
            let id = match p.biome {
                Biome::Desert => self.ids.sand,
                _ => self.ids.dirt,
            };
            return Block(id);
        }
        // Top voxel: shoreline sand beats the biome pick.
        let sea = self.world.sea_level();
        if p.height - 1 <= sea + params.shoreline_margin {
            return Block(self.ids.sand);
        }
        let id = match p.biome {
            Biome::Snow => self.ids.snow,
            Biome::Desert => self.ids.sand,
            Biome::Forest | Biome::Plains => self.ids.grass,
        };
        Block(id)
    }

    /// True when (x,y,z) falls inside some nearby tree's canopy. Scans the
    /// columns within leaf radius; profiles are memoized so this is a table
    /// walk, not repeated noise evaluation.
    fn canopy_at(&mut self, x: i32, y: i32, z: i32) -> bool {
        let leaf_r = self.ctx.params.leaf_radius;
        let seed = self.world.seed as u32;
        for tx in (x - leaf_r)..=(x + leaf_r) {
            for tz in (z - leaf_r)..=(z + leaf_r) {
                let p = self.profile(tx, tz);
                let Some(top_y) = p.trunk_top else { continue };
                let dy = y - top_y;
                if !(-2..=1).contains(&dy) {
                    continue;
                }
                // Outer layers pull in by one to round the silhouette.
                let rad = if dy == 1 || dy == -2 {
                    leaf_r - 1
                } else {
                    leaf_r
                };
                let dx = x - tx;
                let dz = z - tz;
                if dx.abs() > rad || dz.abs() > rad {
                    continue;
                }
                // The trunk column itself stays log up to top_y.
                if dx == 0 && dz == 0 && dy <= 0 {
                    continue;
                }
                // Drop roughly half the outer corner cells.
                if rad > 0
                    && dx.abs() == rad
                    && dz.abs() == rad
                    && (hash3(x, y, z, seed ^ SALT_CANOPY) & 1) == 1
                {
                    continue;
                }
                return true;
            }
        }
        false
    }
}

fn compute_profile(world: &World, ctx: &GenCtx, x: i32, z: i32) -> ColumnProfile {
    let params = &ctx.params;
    let hmax = world.world_height as f32;
    let xf = x as f32;
    let zf = z as f32;

    let base = fractal2(
        &ctx.terrain,
        xf,
        zf,
        params.height_octaves,
        params.persistence,
        params.lacunarity,
    ) * 0.5
        + 0.5;
    let mut height = hmax * params.min_y_ratio
        + base * hmax * (params.max_y_ratio - params.min_y_ratio);
    height += fractal2(
        &ctx.detail,
        xf,
        zf,
        params.detail_octaves,
        params.persistence,
        params.lacunarity,
    ) * params.detail_amplitude;
    // Localized peaks: only where the large-scale field clears the threshold.
    let m = ctx.mountain.get_noise_2d(xf, zf) * 0.5 + 0.5;
    if m > params.mountain_threshold {
        let excess = (m - params.mountain_threshold) / (1.0 - params.mountain_threshold);
        height += excess * params.mountain_boost_ratio * hmax;
    }
    let height = (height as i32).clamp(1, world.world_height as i32 - 10);

    let temp = (ctx.temp2d.get_noise_2d(xf, zf) * 0.5 + 0.5).clamp(0.0, 1.0);
    let moist = (ctx.moist2d.get_noise_2d(xf, zf) * 0.5 + 0.5).clamp(0.0, 1.0);
    // Temperature dominates; forest only claims the temperate band.
    let biome = if temp < params.snow_max {
        Biome::Snow
    } else if temp > params.desert_min {
        Biome::Desert
    } else if moist > params.forest_moisture_min {
        Biome::Forest
    } else {
        Biome::Plains
    };

    let trunk_top = trunk_top_for(world, params, x, z, height, biome);
    ColumnProfile {
        height,
        biome,
        trunk_top,
    }
}

fn trunk_top_for(
    world: &World,
    params: &crate::worldgen::WorldGenParams,
    x: i32,
    z: i32,
    height: i32,
    biome: Biome,
) -> Option<i32> {
    let prob = match biome {
        Biome::Forest => params.tree_probability * params.forest_boost,
        Biome::Plains => params.tree_probability,
        Biome::Desert | Biome::Snow => 0.0,
    };
    if prob <= 0.0 {
        return None;
    }
    // Trees only grow on grass tops clear of the shoreline and world top.
    let sea = world.sea_level();
    if height - 1 <= sea + params.shoreline_margin {
        return None;
    }
    if height >= world.world_height as i32 - 8 {
        return None;
    }
    let seed = world.seed as u32;
    if rand01_2(seed, x, z, SALT_TREE_GATE) >= prob {
        return None;
    }
    let span = (params.trunk_max - params.trunk_min).max(0) as u32;
    let th = params.trunk_min + (hash2(x, z, seed ^ SALT_TRUNK) % (span + 1)) as i32;
    Some(height + th - 1)
}

fn fractal2(noise: &FastNoiseLite, x: f32, z: f32, octaves: i32, persistence: f32, lacunarity: f32) -> f32 {
    let mut amp = 1.0_f32;
    let mut freq = 1.0_f32;
    let mut sum = 0.0_f32;
    let mut max_amp = 0.0_f32;
    for _ in 0..octaves.max(1) {
        sum += noise.get_noise_2d(x * freq, z * freq) * amp;
        max_amp += amp;
        amp *= persistence;
        freq *= lacunarity;
    }
    if max_amp > 0.0 { sum / max_amp } else { sum }
}

const SALT_ORE: u32 = 0x0BAD_5EED;
const SALT_TREE_GATE: u32 = 0x000A_53F9;
const SALT_TRUNK: u32 = 0x0051_F0A7;
const SALT_CANOPY: u32 = 0x00CA_0F1E;

#[inline]
fn avalanche(mut a: u32) -> u32 {
    a ^= a >> 16;
    a = a.wrapping_mul(0x7feb_352d);
    a ^= a >> 15;
    a = a.wrapping_mul(0x846c_a68b);
    a ^= a >> 16;
    a
}

pub fn hash2(ix: i32, iz: i32, seed: u32) -> u32 {
    let h = (ix as u32).wrapping_mul(0x85eb_ca6b)
        ^ (iz as u32).wrapping_mul(0xc2b2_ae35)
        ^ seed.wrapping_mul(0x27d4_eb2d);
    avalanche(h)
}

pub fn hash3(x: i32, y: i32, z: i32, seed: u32) -> u32 {
    let mut h = seed ^ 0x9e37_79b9;
    h ^= avalanche((x as u32).wrapping_add(0x85eb_ca6b));
    h ^= avalanche((y as u32).wrapping_add(0xc2b2_ae35));
    h ^= avalanche((z as u32).wrapping_add(0x27d4_eb2f));
    avalanche(h)
}

#[inline]
pub fn rand01_2(world_seed: u32, ix: i32, iz: i32, salt: u32) -> f32 {
    let h = hash2(ix, iz, (world_seed ^ salt).wrapping_add(0x9E37_79B9));
    ((h & 0x00FF_FFFF) as f32) / 16_777_216.0
}

#[inline]
pub fn rand01_3(world_seed: u32, x: i32, y: i32, z: i32, salt: u32) -> f32 {
    let h = hash3(x, y, z, world_seed ^ salt);
    ((h & 0x00FF_FFFF) as f32) / 16_777_216.0
}
