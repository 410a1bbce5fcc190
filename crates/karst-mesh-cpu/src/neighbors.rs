use karst_blocks::types::Block;
use karst_chunk::ChunkBuf;
use karst_world::ChunkCoord;

/// Read-only snapshots of the 3x3 chunk window around a mesh job's center.
/// Missing entries read as unloaded; the mesher treats those voxels as air.
pub struct NeighborSnapshots<'a> {
    center: ChunkCoord,
    grid: [Option<&'a ChunkBuf>; 9],
}

impl<'a> NeighborSnapshots<'a> {
    pub fn new(center: ChunkCoord) -> Self {
        Self {
            center,
            grid: [None; 9],
        }
    }

    #[inline]
    fn slot(&self, coord: ChunkCoord) -> Option<usize> {
        let dx = coord.cx - self.center.cx;
        let dz = coord.cz - self.center.cz;
        if dx.abs() > 1 || dz.abs() > 1 {
            return None;
        }
        Some(((dz + 1) * 3 + (dx + 1)) as usize)
    }

    /// Registers a chunk buffer; buffers outside the 3x3 window are ignored.
    pub fn insert(&mut self, buf: &'a ChunkBuf) -> bool {
        match self.slot(buf.coord) {
            Some(i) => {
                self.grid[i] = Some(buf);
                true
            }
            None => false,
        }
    }

    /// Number of loaded neighbors, excluding the center slot.
    pub fn loaded_neighbors(&self) -> usize {
        self.grid
            .iter()
            .enumerate()
            .filter(|(i, s)| *i != 4 && s.is_some())
            .count()
    }

    #[inline]
    pub fn center(&self) -> Option<&'a ChunkBuf> {
        self.grid[4]
    }

    /// Resolves a world position against the window. `None` means the
    /// owning chunk is not loaded; out-of-height positions read as air.
    pub fn block_at(&self, wx: i32, wy: i32, wz: i32) -> Option<Block> {
        let sample = self.grid[4].or_else(|| self.grid.iter().flatten().next().copied())?;
        if wy < 0 || wy >= sample.sy as i32 {
            return Some(Block::AIR);
        }
        let coord = ChunkCoord::of_world(wx, wz, sample.sx);
        let buf = self.grid[self.slot(coord)?]?;
        buf.get_world(wx, wy, wz)
    }
}
