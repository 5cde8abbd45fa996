//! PPUSTATUS ($2002).

use bitflags::bitflags;

bitflags! {
    /// Status register. Only the top three bits are driven; the low five
    /// read back as whatever is decaying on the data pins.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PpuStatus: u8 {
        const SPRITE_OVERFLOW = 1 << 5;
        const SPRITE_ZERO_HIT = 1 << 6;
        const VBLANK          = 1 << 7;
    }
}

impl PpuStatus {
    /// VBlank flag state.
    #[inline]
    #[must_use]
    pub fn in_vblank(self) -> bool {
        self.contains(Self::VBLANK)
    }
}
