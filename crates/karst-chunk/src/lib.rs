//! Chunk buffer and world generation helpers.
#![forbid(unsafe_code)]

use karst_blocks::types::Block;
use karst_blocks::BlockRegistry;
use karst_world::generation::ColumnSampler;
use karst_world::{ChunkCoord, GenCtx, World};

/// Dense voxel storage for one chunk column. `sx`/`sz` are the chunk edge,
/// `sy` the world height; the buffer length is always exactly
/// `sx * sy * sz` and is never resized after construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkBuf {
    pub coord: ChunkCoord,
    pub sx: usize,
    pub sy: usize,
    pub sz: usize,
    pub blocks: Vec<Block>,
    /// Conservative highest occupied y (may overestimate, never under).
    pub y_max: i32,
}

impl ChunkBuf {
    #[inline]
    pub fn idx(&self, x: usize, y: usize, z: usize) -> usize {
        x + y * self.sx + z * self.sx * self.sy
    }

    #[inline]
    pub fn get_local(&self, x: usize, y: usize, z: usize) -> Block {
        self.blocks[self.idx(x, y, z)]
    }

    #[inline]
    pub fn set_local(&mut self, x: usize, y: usize, z: usize, b: Block) {
        let i = self.idx(x, y, z);
        self.blocks[i] = b;
        if b != Block::AIR {
            self.y_max = self.y_max.max(y as i32);
        }
    }

    #[inline]
    pub fn contains_world(&self, wx: i32, wy: i32, wz: i32) -> bool {
        if wy < 0 || wy >= self.sy as i32 {
            return false;
        }
        let base_x = self.coord.cx * self.sx as i32;
        let base_z = self.coord.cz * self.sz as i32;
        wx >= base_x && wx < base_x + self.sx as i32 && wz >= base_z && wz < base_z + self.sz as i32
    }

    #[inline]
    pub fn get_world(&self, wx: i32, wy: i32, wz: i32) -> Option<Block> {
        if !self.contains_world(wx, wy, wz) {
            return None;
        }
        let base_x = self.coord.cx * self.sx as i32;
        let base_z = self.coord.cz * self.sz as i32;
        let lx = (wx - base_x) as usize;
        let ly = wy as usize;
        let lz = (wz - base_z) as usize;
        Some(self.get_local(lx, ly, lz))
    }

    pub fn from_blocks_local(
        coord: ChunkCoord,
        sx: usize,
        sy: usize,
        sz: usize,
        blocks: Vec<Block>,
    ) -> Self {
        let mut b = blocks;
        let expect = sx * sy * sz;
        if b.len() != expect {
            b.resize(expect, Block::AIR);
        }
        let mut buf = ChunkBuf {
            coord,
            sx,
            sy,
            sz,
            blocks: b,
            y_max: 0,
        };
        buf.y_max = buf.recompute_y_max();
        buf
    }

    pub fn air(coord: ChunkCoord, sx: usize, sy: usize, sz: usize) -> Self {
        ChunkBuf {
            coord,
            sx,
            sy,
            sz,
            blocks: vec![Block::AIR; sx * sy * sz],
            y_max: 0,
        }
    }

    /// Exact highest non-air y, or 0 for an all-air buffer.
    pub fn recompute_y_max(&self) -> i32 {
        for y in (0..self.sy).rev() {
            for z in 0..self.sz {
                for x in 0..self.sx {
                    if self.get_local(x, y, z) != Block::AIR {
                        return y as i32;
                    }
                }
            }
        }
        0
    }

    #[inline]
    pub fn has_non_air(&self) -> bool {
        self.blocks.iter().any(|b| *b != Block::AIR)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ChunkOccupancy {
    Empty,
    Populated,
}

impl ChunkOccupancy {
    #[inline]
    pub fn is_empty(self) -> bool {
        matches!(self, ChunkOccupancy::Empty)
    }

    #[inline]
    pub fn has_blocks(self) -> bool {
        matches!(self, ChunkOccupancy::Populated)
    }
}

#[derive(Clone, Debug)]
pub struct ChunkGenerateResult {
    pub buf: ChunkBuf,
    pub occupancy: ChunkOccupancy,
}

pub fn generate_chunk_buffer(
    world: &World,
    coord: ChunkCoord,
    reg: &BlockRegistry,
) -> ChunkGenerateResult {
    let mut ctx = world.make_gen_ctx();
    generate_chunk_buffer_with_ctx(world, coord, reg, &mut ctx)
}

/// Column-ordered fill over a reusable worldgen context. `y_max` is taken
/// from the column bounds of the chunk's own columns plus the leaf-radius
/// apron, so canopy spilling in from a neighbor column is always covered.
pub fn generate_chunk_buffer_with_ctx(
    world: &World,
    coord: ChunkCoord,
    reg: &BlockRegistry,
    ctx: &mut GenCtx,
) -> ChunkGenerateResult {
    let sx = world.chunk_size;
    let sy = world.world_height;
    let sz = world.chunk_size;
    ctx.reset();
    let leaf_r = ctx.params.leaf_radius;
    let mut sampler = ColumnSampler::new(world, ctx, reg);
    let base_x = coord.cx * sx as i32;
    let base_z = coord.cz * sz as i32;

    let mut y_max = 0i32;
    for wx in (base_x - leaf_r)..(base_x + sx as i32 + leaf_r) {
        for wz in (base_z - leaf_r)..(base_z + sz as i32 + leaf_r) {
            y_max = y_max.max(sampler.column_y_max(wx, wz));
        }
    }
    let y_top = (y_max.min(sy as i32 - 1)) as usize;

    let mut blocks = vec![Block::AIR; sx * sy * sz];
    let mut has_blocks = false;
    for z in 0..sz {
        for x in 0..sx {
            let wx = base_x + x as i32;
            let wz = base_z + z as i32;
            for y in 0..=y_top {
                let b = sampler.block_at(wx, y as i32, wz);
                if b != Block::AIR {
                    has_blocks = true;
                    blocks[x + y * sx + z * sx * sy] = b;
                }
            }
        }
    }
    ChunkGenerateResult {
        buf: ChunkBuf {
            coord,
            sx,
            sy,
            sz,
            blocks,
            y_max,
        },
        occupancy: if has_blocks {
            ChunkOccupancy::Populated
        } else {
            ChunkOccupancy::Empty
        },
    }
}
