/// Shade multiplier per vertex ambient-occlusion level (0 = darkest).
pub const AO_SHADE: [f32; 4] = [0.55, 0.75, 0.88, 1.0];

/// Static directional light per face orientation.
pub const LIGHT_POS_Y: f32 = 1.0;
pub const LIGHT_NEG_Y: f32 = 0.55;
pub const LIGHT_X: f32 = 0.80;
pub const LIGHT_Z: f32 = 0.70;

/// Per-column tint jitter amplitude (fraction of base color).
pub const TINT_JITTER: f32 = 0.08;
