/// Number of parallel texture-coordinate arrays in the store.
pub const TEX_COORD_CHANNELS: usize = 5;

/// Texture-coordinate channel.
///
/// Channels map onto the texture units a draw list binds: `Main` feeds the
/// primary unit, `Blend` the interpolation target, `Detail`/`BlendDetail`
/// their detail units, and `Light` the light/modulation unit.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum TexCoordChannel {
    Main,
    Blend,
    Detail,
    BlendDetail,
    Light,
}

impl TexCoordChannel {
    pub const ALL: [TexCoordChannel; TEX_COORD_CHANNELS] = [
        TexCoordChannel::Main,
        TexCoordChannel::Blend,
        TexCoordChannel::Detail,
        TexCoordChannel::BlendDetail,
        TexCoordChannel::Light,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}
