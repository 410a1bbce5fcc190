use karst_blocks::types::Block;
use karst_chunk::ChunkBuf;
use karst_world::ChunkCoord;
use proptest::prelude::*;

fn dim() -> impl Strategy<Value = usize> {
    1usize..=8
}

fn small_i32() -> impl Strategy<Value = i32> {
    -1_000_000i32..=1_000_000
}

proptest! {
    // idx maps each (x,y,z) within bounds to unique in-range indices
    #[test]
    fn idx_is_unique_and_in_range(cx in small_i32(), cz in small_i32(), sx in dim(), sy in dim(), sz in dim()) {
        let expect = sx*sy*sz;
        let blocks = vec![Block::AIR; expect];
        let buf = ChunkBuf::from_blocks_local(ChunkCoord::new(cx, cz), sx, sy, sz, blocks);

        let mut seen = vec![false; expect];
        for y in 0..sy { for z in 0..sz { for x in 0..sx {
            let i = buf.idx(x,y,z);
            prop_assert!(i < expect);
            prop_assert!(!seen[i]);
            seen[i] = true;
        }}}
        // All indices hit exactly once
        prop_assert!(seen.into_iter().all(|b| b));
    }

    // get_local reads from linearized storage at idx
    #[test]
    fn get_local_matches_linear(cx in small_i32(), cz in small_i32(), sx in dim(), sy in dim(), sz in dim()) {
        let expect = sx*sy*sz;
        let blocks = (0..expect).map(|i| Block((i % 256) as u8)).collect();
        let buf = ChunkBuf::from_blocks_local(ChunkCoord::new(cx, cz), sx, sy, sz, blocks);
        for y in 0..sy { for z in 0..sz { for x in 0..sx {
            let i = buf.idx(x,y,z);
            prop_assert_eq!(buf.get_local(x,y,z), buf.blocks[i]);
        }}}
    }

    // contains_world aligns with get_world at the chunk borders
    #[test]
    fn contains_world_and_get_world_agree(cx in small_i32(), cz in small_i32(), sx in dim(), sy in dim(), sz in dim()) {
        let expect = sx*sy*sz;
        let blocks = (0..expect).map(|i| Block((i*31 % 256) as u8)).collect();
        let buf = ChunkBuf::from_blocks_local(ChunkCoord::new(cx, cz), sx, sy, sz, blocks);

        let x0 = cx * sx as i32;
        let z0 = cz * sz as i32;

        // Sample a mix of inside/outside positions
        let candidates = vec![
            (x0,               0,                z0),
            (x0 + sx as i32-1, sy as i32-1,     z0 + sz as i32-1),
            (x0 - 1,           0,                z0),
            (x0 + sx as i32,   0,                z0),
            (x0,              -1,                z0),
            (x0,               sy as i32,        z0),
            (x0,               0,                z0 - 1),
            (x0,               0,                z0 + sz as i32),
        ];

        for (wx,wy,wz) in candidates {
            let inside = wy >= 0 && wy < sy as i32 && wx >= x0 && wx < x0 + sx as i32 && wz >= z0 && wz < z0 + sz as i32;
            prop_assert_eq!(buf.contains_world(wx,wy,wz), inside);
            match buf.get_world(wx,wy,wz) {
                None => prop_assert!(!inside),
                Some(b) => {
                    prop_assert!(inside);
                    let lx = (wx - x0) as usize; let ly = wy as usize; let lz = (wz - z0) as usize;
                    prop_assert_eq!(b, buf.get_local(lx, ly, lz));
                }
            }
        }
    }

    // from_blocks_local pads or preserves to exact length
    #[test]
    fn from_blocks_local_normalizes_length(sx in dim(), sy in dim(), sz in dim(), extra in 0usize..4) {
        let expect = sx*sy*sz;
        let short: Vec<Block> = vec![Block(2); expect.saturating_sub(extra)];
        let buf = ChunkBuf::from_blocks_local(ChunkCoord::new(0, 0), sx, sy, sz, short);
        prop_assert_eq!(buf.blocks.len(), expect);
    }

    // y_max never underestimates occupancy
    #[test]
    fn y_max_covers_highest_set_voxel(sx in dim(), sy in dim(), sz in dim(), x in 0usize..8, y in 0usize..8, z in 0usize..8) {
        let (x, y, z) = (x % sx, y % sy, z % sz);
        let mut buf = ChunkBuf::air(ChunkCoord::new(0, 0), sx, sy, sz);
        buf.set_local(x, y, z, Block(2));
        prop_assert!(buf.y_max >= y as i32);
        prop_assert_eq!(buf.recompute_y_max(), y as i32);
    }
}
