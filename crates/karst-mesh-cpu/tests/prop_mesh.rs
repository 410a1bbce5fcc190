use karst_blocks::{Block, BlockRegistry};
use karst_chunk::ChunkBuf;
use karst_mesh_cpu::{NeighborSnapshots, build_chunk_mesh_cpu};
use karst_world::ChunkCoord;
use proptest::prelude::*;

const SX: usize = 8;
const SY: usize = 16;
const SZ: usize = 8;

proptest! {
    #[test]
    fn mesh_buffers_stay_consistent(cells in proptest::collection::vec(0u8..6, SX * SY * SZ)) {
        let reg = BlockRegistry::default_table();
        let mut buf = ChunkBuf::air(ChunkCoord::new(0, 0), SX, SY, SZ);
        for (i, b) in cells.iter().enumerate() {
            if *b != 0 {
                let x = i % SX;
                let y = (i / SX) % SY;
                let z = i / (SX * SY);
                buf.set_local(x, y, z, Block(*b));
            }
        }
        let mut n = NeighborSnapshots::new(buf.coord);
        n.insert(&buf);
        if let Some(m) = build_chunk_mesh_cpu(&buf, &n, &reg) {
            for mb in [&m.opaque, &m.transparent] {
                prop_assert_eq!(mb.pos.len() % 12, 0);
                prop_assert_eq!(mb.idx.len() % 6, 0);
                prop_assert_eq!(mb.pos.len() / 3, mb.col.len() / 4);
                prop_assert_eq!(mb.pos.len(), mb.norm.len());
                let vc = mb.vertex_count() as u32;
                prop_assert!(mb.idx.iter().all(|&i| i < vc));
                for p in mb.pos.chunks(3) {
                    prop_assert!(p[0] >= m.bbox.min.x && p[0] <= m.bbox.max.x);
                    prop_assert!(p[1] >= m.bbox.min.y && p[1] <= m.bbox.max.y);
                    prop_assert!(p[2] >= m.bbox.min.z && p[2] <= m.bbox.max.z);
                }
            }
        }
    }
}
