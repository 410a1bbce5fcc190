//! Persistent world edits and revisions.
#![forbid(unsafe_code)]

use karst_blocks::types::Block;
use karst_world::ChunkCoord;
use std::collections::HashMap;

#[derive(Default, Debug, Clone, Copy)]
pub struct EditStoreStats {
    pub chunk_entries: usize,
    pub block_edits: usize,
    pub rev_entries: usize,
    pub built_entries: usize,
}

/// Chunk-aware persistent edit store with simple change tracking.
/// Chunks span the full world height, so only x/z seams have neighbors.
pub struct EditStore {
    sx: i32,
    sz: i32,
    // Map per-chunk: coord -> map of world coords -> Block
    inner: HashMap<ChunkCoord, HashMap<(i32, i32, i32), Block>>,
    // Change-tracking
    rev: HashMap<ChunkCoord, u64>, // latest requested change affecting chunk
    built: HashMap<ChunkCoord, u64>, // last built rev for chunk
    counter: u64,
}

impl EditStore {
    pub fn new(sx: i32, sz: i32) -> Self {
        Self {
            sx,
            sz,
            inner: HashMap::new(),
            rev: HashMap::new(),
            built: HashMap::new(),
            counter: 0,
        }
    }

    pub fn stats(&self) -> EditStoreStats {
        EditStoreStats {
            chunk_entries: self.inner.len(),
            block_edits: self.inner.values().map(|m| m.len()).sum(),
            rev_entries: self.rev.len(),
            built_entries: self.built.len(),
        }
    }

    #[inline]
    fn chunk_key(&self, wx: i32, wz: i32) -> ChunkCoord {
        ChunkCoord::new(wx.div_euclid(self.sx), wz.div_euclid(self.sz))
    }

    pub fn get(&self, wx: i32, wy: i32, wz: i32) -> Option<Block> {
        let k = self.chunk_key(wx, wz);
        self.inner
            .get(&k)
            .and_then(|m| m.get(&(wx, wy, wz)).copied())
    }

    pub fn set(&mut self, wx: i32, wy: i32, wz: i32, b: Block) {
        let k = self.chunk_key(wx, wz);
        let entry = self.inner.entry(k).or_default();
        entry.insert((wx, wy, wz), b);
    }

    /// Snapshot of all edits for a specific chunk
    pub fn snapshot_for_chunk(&self, coord: ChunkCoord) -> Vec<((i32, i32, i32), Block)> {
        if let Some(m) = self.inner.get(&coord) {
            return m.iter().map(|(k, v)| (*k, *v)).collect();
        }
        Vec::new()
    }

    /// Snapshot of all edits across a chunk region (inclusive radius in chunk units)
    pub fn snapshot_for_region(
        &self,
        center: ChunkCoord,
        radius: i32,
    ) -> Vec<((i32, i32, i32), Block)> {
        let mut out = Vec::new();
        for dz in -radius..=radius {
            for dx in -radius..=radius {
                let k = center.offset(dx, dz);
                if let Some(m) = self.inner.get(&k) {
                    for (k2, v) in m.iter() {
                        out.push((*k2, *v));
                    }
                }
            }
        }
        out
    }

    /// Snapshot of every stored edit, for persistence or debugging.
    pub fn snapshot_all(&self) -> Vec<((i32, i32, i32), Block)> {
        let mut out = Vec::new();
        for m in self.inner.values() {
            for (k, v) in m.iter() {
                out.push((*k, *v));
            }
        }
        out
    }

    /// Bulk-load edits without bumping revisions (startup path).
    pub fn load_entries(&mut self, entries: impl IntoIterator<Item = ((i32, i32, i32), Block)>) {
        for ((wx, wy, wz), b) in entries {
            self.set(wx, wy, wz, b);
        }
    }

    /// Change-tracking: mark the chunk containing (wx,wz) and any immediate x/z
    /// neighbors if the edit touches a border. Returns a new monotonically
    /// increasing stamp.
    pub fn bump_region_around(&mut self, wx: i32, wz: i32) -> u64 {
        self.counter = self.counter.wrapping_add(1).max(1);
        let stamp = self.counter;
        let c = self.chunk_key(wx, wz);
        let lx = wx - c.cx * self.sx;
        let lz = wz - c.cz * self.sz;

        // Always bump the current chunk
        self.rev.insert(c, stamp);

        let mut offsets_x = vec![0];
        let mut offsets_z = vec![0];
        if lx == 0 {
            offsets_x.push(-1);
        }
        if lx == self.sx - 1 {
            offsets_x.push(1);
        }
        if lz == 0 {
            offsets_z.push(-1);
        }
        if lz == self.sz - 1 {
            offsets_z.push(1);
        }

        for dx in offsets_x {
            for dz in &offsets_z {
                if dx == 0 && *dz == 0 {
                    continue;
                }
                self.rev.insert(c.offset(dx, *dz), stamp);
            }
        }
        stamp
    }

    /// Chunks whose mesh is stale after an edit at the given world position.
    pub fn get_affected_chunks(&self, wx: i32, wz: i32) -> Vec<ChunkCoord> {
        let c = self.chunk_key(wx, wz);
        let lx = wx - c.cx * self.sx;
        let lz = wz - c.cz * self.sz;

        let mut affected = vec![c];
        let mut offsets_x = vec![0];
        let mut offsets_z = vec![0];
        if lx == 0 {
            offsets_x.push(-1);
        }
        if lx == self.sx - 1 {
            offsets_x.push(1);
        }
        if lz == 0 {
            offsets_z.push(-1);
        }
        if lz == self.sz - 1 {
            offsets_z.push(1);
        }

        for dx in offsets_x {
            for dz in &offsets_z {
                if dx == 0 && *dz == 0 {
                    continue;
                }
                let key = c.offset(dx, *dz);
                if !affected.contains(&key) {
                    affected.push(key);
                }
            }
        }
        affected
    }

    pub fn get_rev(&self, coord: ChunkCoord) -> u64 {
        self.rev.get(&coord).copied().unwrap_or(0)
    }

    pub fn mark_built(&mut self, coord: ChunkCoord, rev: u64) {
        // Only update if this is a newer revision
        let e = self.built.entry(coord).or_insert(0);
        if rev > *e {
            *e = rev;
        }
    }

    pub fn needs_rebuild(&self, coord: ChunkCoord) -> bool {
        self.get_rev(coord) > self.get_built_rev(coord)
    }

    pub fn get_built_rev(&self, coord: ChunkCoord) -> u64 {
        self.built.get(&coord).copied().unwrap_or(0)
    }
}
