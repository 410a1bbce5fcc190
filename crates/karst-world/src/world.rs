use std::collections::HashMap;
use std::sync::Arc;

use fastnoise_lite::{FastNoiseLite, NoiseType};

use crate::generation::ColumnProfile;
use crate::worldgen::WorldGenParams;
use crate::{CHUNK_SIZE, WORLD_HEIGHT};

pub struct World {
    pub chunk_size: usize,
    pub world_height: usize,
    pub seed: i32,
    pub gen_params: Arc<WorldGenParams>,
}

impl World {
    pub fn new(seed: i32, params: WorldGenParams) -> Self {
        Self {
            chunk_size: CHUNK_SIZE,
            world_height: WORLD_HEIGHT,
            seed,
            gen_params: Arc::new(params),
        }
    }

    pub fn with_default_params(seed: i32) -> Self {
        Self::new(seed, WorldGenParams::default())
    }

    #[inline]
    pub fn sea_level(&self) -> i32 {
        if self.gen_params.water_enable {
            (self.world_height as f32 * self.gen_params.water_level_ratio) as i32
        } else {
            -1
        }
    }

    /// Builds the per-task noise context. Every field is seeded purely from
    /// the world seed, so two contexts always agree.
    pub fn make_gen_ctx(&self) -> GenCtx {
        let params = Arc::clone(&self.gen_params);
        let mut terrain = FastNoiseLite::with_seed(self.seed);
        terrain.set_noise_type(Some(NoiseType::OpenSimplex2));
        terrain.set_frequency(Some(params.height_frequency));
        let mut detail = FastNoiseLite::with_seed(self.seed ^ 0x51_C0DE);
        detail.set_noise_type(Some(NoiseType::OpenSimplex2));
        detail.set_frequency(Some(params.detail_frequency));
        let mut mountain = FastNoiseLite::with_seed(self.seed ^ 0x3A_D0E1);
        mountain.set_noise_type(Some(NoiseType::OpenSimplex2));
        mountain.set_frequency(Some(params.mountain_frequency));
        let mut temp2d = FastNoiseLite::with_seed(self.seed ^ 0x1203_5F31);
        temp2d.set_noise_type(Some(NoiseType::OpenSimplex2));
        temp2d.set_frequency(Some(params.temp_frequency));
        let mut moist2d = FastNoiseLite::with_seed(((self.seed as u32) ^ 0x92E3_A1B2u32) as i32);
        moist2d.set_noise_type(Some(NoiseType::OpenSimplex2));
        moist2d.set_frequency(Some(params.moisture_frequency));
        GenCtx {
            terrain,
            detail,
            mountain,
            temp2d,
            moist2d,
            params,
            columns: HashMap::new(),
        }
    }
}

/// Reusable worldgen context: seeded noise fields plus a column memo so the
/// tree overlay's neighbor-column scans do not recompute heights per voxel.
pub struct GenCtx {
    pub terrain: FastNoiseLite,
    pub detail: FastNoiseLite,
    pub mountain: FastNoiseLite,
    pub temp2d: FastNoiseLite,
    pub moist2d: FastNoiseLite,
    pub params: Arc<WorldGenParams>,
    pub(crate) columns: HashMap<(i32, i32), ColumnProfile>,
}

impl GenCtx {
    /// Drops memoized columns; call between chunks to bound memory.
    pub fn reset(&mut self) {
        self.columns.clear();
    }
}
