use karst_blocks::BlockRegistry;
use karst_blocks::types::Block;
use karst_chunk::ChunkBuf;
use karst_geom::{Aabb, Vec3};
use karst_world::ChunkCoord;

use crate::constants::{AO_SHADE, LIGHT_NEG_Y, LIGHT_POS_Y, LIGHT_X, LIGHT_Z, TINT_JITTER};
use crate::face::{ALL_FACES, Face};
use crate::mesh_build::MeshBuild;
use crate::neighbors::NeighborSnapshots;

/// Opaque and transparent geometry stay separate so the consumer can blend
/// transparent parts without depth writes.
pub struct ChunkMeshCPU {
    pub coord: ChunkCoord,
    pub bbox: Aabb,
    pub opaque: MeshBuild,
    pub transparent: MeshBuild,
}

struct VoxelView<'a> {
    buf: &'a ChunkBuf,
    neighbors: &'a NeighborSnapshots<'a>,
}

impl<'a> VoxelView<'a> {
    /// `None` means the owning chunk is not loaded.
    #[inline]
    fn block_at(&self, wx: i32, wy: i32, wz: i32) -> Option<Block> {
        if wy < 0 || wy >= self.buf.sy as i32 {
            return Some(Block::AIR);
        }
        if let Some(b) = self.buf.get_world(wx, wy, wz) {
            return Some(b);
        }
        self.neighbors.block_at(wx, wy, wz)
    }

    /// Unloaded chunks read as non-occluding so seams stay visible until the
    /// neighbor arrives and triggers a rebuild.
    #[inline]
    fn occludes(&self, reg: &BlockRegistry, wx: i32, wy: i32, wz: i32) -> bool {
        self.block_at(wx, wy, wz)
            .map(|b| reg.is_occluder(b))
            .unwrap_or(false)
    }
}

#[inline]
fn face_light(face: Face) -> f32 {
    match face {
        Face::PosY => LIGHT_POS_Y,
        Face::NegY => LIGHT_NEG_Y,
        Face::PosX | Face::NegX => LIGHT_X,
        Face::PosZ | Face::NegZ => LIGHT_Z,
    }
}

/// Whether a face of `here` against neighbor `nb` is visible.
#[inline]
fn face_visible(reg: &BlockRegistry, here: Block, nb: Block) -> bool {
    if nb.is_air() {
        return true;
    }
    let Some(nt) = reg.get(nb) else {
        // Unknown neighbor id reads as air.
        return true;
    };
    if nt.solid && !nt.transparent {
        return false;
    }
    if nt.transparent {
        let here_transparent = reg.get(here).map(|t| t.transparent).unwrap_or(false);
        if !here_transparent {
            return true;
        }
        // Same transparent type merges into one volume (no internal faces).
        return here.0 != nb.0;
    }
    // Non-solid cutout shapes (flowers) never hide faces.
    true
}

/// Vertex AO level in `[0,3]` for the face corner reached by stepping
/// `du`/`dv` along the face tangents. Two occluding edges force level 0.
#[inline]
fn ao_level(
    view: &VoxelView,
    reg: &BlockRegistry,
    wx: i32,
    wy: i32,
    wz: i32,
    face: Face,
    du: i32,
    dv: i32,
) -> u8 {
    let (dx, dy, dz) = face.delta();
    let (u, v) = face.tangents();
    let bx = wx + dx;
    let by = wy + dy;
    let bz = wz + dz;
    let e1 = view.occludes(reg, bx + u.0 * du, by + u.1 * du, bz + u.2 * du);
    let e2 = view.occludes(reg, bx + v.0 * dv, by + v.1 * dv, bz + v.2 * dv);
    if e1 && e2 {
        return 0;
    }
    let c = view.occludes(
        reg,
        bx + u.0 * du + v.0 * dv,
        by + u.1 * du + v.1 * dv,
        bz + u.2 * du + v.2 * dv,
    );
    3 - (e1 as u8 + e2 as u8 + c as u8)
}

#[inline]
fn avalanche(mut h: u32) -> u32 {
    h ^= h >> 16;
    h = h.wrapping_mul(0x7feb_352d);
    h ^= h >> 15;
    h = h.wrapping_mul(0x846c_a68b);
    h ^= h >> 16;
    h
}

#[inline]
fn column_tint(wx: i32, wz: i32) -> f32 {
    const SALT_TINT: u32 = 0x00B1_0C5E;
    let h = avalanche(
        (wx as u32)
            .wrapping_mul(0x85eb_ca6b)
            .wrapping_add((wz as u32).wrapping_mul(0xc2b2_ae35))
            ^ SALT_TINT,
    );
    let r = (h & 0x00FF_FFFF) as f32 / 16_777_216.0;
    1.0 - TINT_JITTER + 2.0 * TINT_JITTER * r
}

#[inline]
fn shade_color(base: [f32; 3], tint: f32, shade: f32) -> [u8; 4] {
    let mut out = [0u8; 4];
    for i in 0..3 {
        let c = (base[i] * tint * shade).clamp(0.0, 1.0);
        out[i] = (c * 255.0) as u8;
    }
    out[3] = 255;
    out
}

#[inline]
fn uv_from(face: Face, p: Vec3) -> (f32, f32) {
    match face {
        Face::PosY | Face::NegY => (p.x, p.z),
        Face::PosX | Face::NegX => (p.z, p.y),
        Face::PosZ | Face::NegZ => (p.x, p.y),
    }
}

/// Culled per-face mesher with baked vertex AO and directional shading.
/// Returns `None` for a mesh with no visible faces.
pub fn build_chunk_mesh_cpu(
    buf: &ChunkBuf,
    neighbors: &NeighborSnapshots,
    reg: &BlockRegistry,
) -> Option<ChunkMeshCPU> {
    let sx = buf.sx;
    let sy = buf.sy;
    let sz = buf.sz;
    let base_x = buf.coord.cx * sx as i32;
    let base_z = buf.coord.cz * sz as i32;
    let view = VoxelView { buf, neighbors };

    // Scanning past the occupancy bound is wasted work; the +2 floor keeps
    // the loop sane for buffers with a stale zero bound.
    let y_top = (buf.y_max.max(2)).min(sy as i32 - 1) as usize;

    let mut opaque = MeshBuild::default();
    opaque.reserve_quads(sx * sz * 2);
    let mut transparent = MeshBuild::default();
    let mut unknown_ids = 0usize;

    for z in 0..sz {
        for x in 0..sx {
            let wx = base_x + x as i32;
            let wz = base_z + z as i32;
            let tint = column_tint(wx, wz);
            for y in 0..=y_top {
                let here = buf.get_local(x, y, z);
                if here.is_air() {
                    continue;
                }
                let Some(ty) = reg.get(here) else {
                    unknown_ids += 1;
                    continue;
                };
                let wy = y as i32;
                let sink_is_transparent = ty.transparent;
                for face in ALL_FACES {
                    let (dx, dy, dz) = face.delta();
                    let nb = view
                        .block_at(wx + dx, wy + dy, wz + dz)
                        .unwrap_or(Block::AIR);
                    if !face_visible(reg, here, nb) {
                        continue;
                    }

                    let light = face_light(face);
                    let base = ty.color_for(face.role());
                    let n = face.normal();
                    let (u, v) = face.tangents();
                    let origin = Vec3::new(
                        wx as f32 + dx.max(0) as f32,
                        wy as f32 + dy.max(0) as f32,
                        wz as f32 + dz.max(0) as f32,
                    );
                    let uvec = Vec3::new(u.0 as f32, u.1 as f32, u.2 as f32);
                    let vvec = Vec3::new(v.0 as f32, v.1 as f32, v.2 as f32);

                    // Corner order (0,0),(1,0),(1,1),(0,1) around the face.
                    let mut vs = [Vec3::ZERO; 4];
                    let mut uvs = [(0.0f32, 0.0f32); 4];
                    let mut cols = [[0u8; 4]; 4];
                    let mut ao = [0u8; 4];
                    for (i, &(a, b)) in [(0i32, 0i32), (1, 0), (1, 1), (0, 1)].iter().enumerate() {
                        let p = origin + uvec * (a as f32) + vvec * (b as f32);
                        vs[i] = p;
                        uvs[i] = uv_from(face, p);
                        let lv = ao_level(&view, reg, wx, wy, wz, face, a * 2 - 1, b * 2 - 1);
                        ao[i] = lv;
                        cols[i] = shade_color(base, tint, light * AO_SHADE[lv as usize]);
                    }
                    // Split along the diagonal through the darker corner pair.
                    let flip = ao[0] + ao[2] > ao[1] + ao[3];
                    let sink = if sink_is_transparent {
                        &mut transparent
                    } else {
                        &mut opaque
                    };
                    sink.add_quad_shaded(vs, n, uvs, cols, flip);
                }
            }
        }
    }

    if unknown_ids > 0 {
        log::warn!(
            "mesh {},{}: skipped {} voxels with unknown block ids",
            buf.coord.cx,
            buf.coord.cz,
            unknown_ids
        );
    }
    if opaque.idx.is_empty() && transparent.idx.is_empty() {
        return None;
    }
    let bbox = Aabb::new(
        Vec3::new(base_x as f32, 0.0, base_z as f32),
        Vec3::new(
            base_x as f32 + sx as f32,
            sy as f32,
            base_z as f32 + sz as f32,
        ),
    );
    Some(ChunkMeshCPU {
        coord: buf.coord,
        bbox,
        opaque,
        transparent,
    })
}
