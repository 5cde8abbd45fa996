//! PPUMASK ($2001).

use bitflags::bitflags;

bitflags! {
    /// Mask register: rendering enables, left-edge clipping, greyscale and
    /// the colour emphasis bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PpuMask: u8 {
        const GREYSCALE       = 1 << 0;
        const SHOW_BG_LEFT    = 1 << 1;
        const SHOW_SPRITES_LEFT = 1 << 2;
        const SHOW_BG         = 1 << 3;
        const SHOW_SPRITES    = 1 << 4;
        const EMPHASIZE_RED   = 1 << 5;
        const EMPHASIZE_GREEN = 1 << 6;
        const EMPHASIZE_BLUE  = 1 << 7;
    }
}

impl PpuMask {
    /// Background layer enabled.
    #[inline]
    #[must_use]
    pub fn show_bg(self) -> bool {
        self.contains(Self::SHOW_BG)
    }

    /// Sprite layer enabled.
    #[inline]
    #[must_use]
    pub fn show_sprites(self) -> bool {
        self.contains(Self::SHOW_SPRITES)
    }

    /// Either layer enabled. Gates every v update and the odd-frame skip.
    #[inline]
    #[must_use]
    pub fn rendering_enabled(self) -> bool {
        self.intersects(Self::SHOW_BG | Self::SHOW_SPRITES)
    }

    /// Background visible in the left 8 pixels.
    #[inline]
    #[must_use]
    pub fn show_bg_left(self) -> bool {
        self.contains(Self::SHOW_BG_LEFT)
    }

    /// Sprites visible in the left 8 pixels.
    #[inline]
    #[must_use]
    pub fn show_sprites_left(self) -> bool {
        self.contains(Self::SHOW_SPRITES_LEFT)
    }

    /// Greyscale mode: palette reads are masked to the grey column.
    #[inline]
    #[must_use]
    pub fn greyscale(self) -> bool {
        self.contains(Self::GREYSCALE)
    }
}
