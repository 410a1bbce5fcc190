pub type BlockId = u8;

/// One voxel cell: a bare block-type byte. `0` is always air.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Block(pub BlockId);

impl Block {
    pub const AIR: Block = Block(0);

    #[inline]
    pub fn is_air(self) -> bool {
        self.0 == 0
    }
}

/// Which face of a cube a color applies to.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum FaceRole {
    All,
    Top,
    Bottom,
    Side,
}
