//! PPUCTRL ($2000).

use bitflags::bitflags;

bitflags! {
    /// Control register.
    ///
    /// ```text
    /// 7  6  5  4  3  2  1  0
    /// V  P  H  B  S  I  N  N
    /// │  │  │  │  │  │  └──┴─ nametable select (also lands in t)
    /// │  │  │  │  │  └─────── VRAM increment (0: +1, 1: +32)
    /// │  │  │  │  └────────── sprite pattern table (8x8 only)
    /// │  │  │  └───────────── background pattern table
    /// │  │  └──────────────── sprite size (0: 8x8, 1: 8x16)
    /// │  └─────────────────── master/slave (unused here)
    /// └────────────────────── NMI at VBlank start
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PpuCtrl: u8 {
        const NAMETABLE_LO   = 1 << 0;
        const NAMETABLE_HI   = 1 << 1;
        const VRAM_INCREMENT = 1 << 2;
        const SPRITE_TABLE   = 1 << 3;
        const BG_TABLE       = 1 << 4;
        const SPRITE_SIZE    = 1 << 5;
        const MASTER_SLAVE   = 1 << 6;
        const NMI_ENABLE     = 1 << 7;
    }
}

impl PpuCtrl {
    /// Address step applied to v after a $2007 access.
    #[inline]
    #[must_use]
    pub fn vram_increment(self) -> u16 {
        if self.contains(Self::VRAM_INCREMENT) {
            32
        } else {
            1
        }
    }

    /// Base address of the background pattern table.
    #[inline]
    #[must_use]
    pub fn bg_table_addr(self) -> u16 {
        if self.contains(Self::BG_TABLE) {
            0x1000
        } else {
            0x0000
        }
    }

    /// Base address of the sprite pattern table (ignored for 8x16).
    #[inline]
    #[must_use]
    pub fn sprite_table_addr(self) -> u16 {
        if self.contains(Self::SPRITE_TABLE) {
            0x1000
        } else {
            0x0000
        }
    }

    /// Sprite height in pixels: 8 or 16.
    #[inline]
    #[must_use]
    pub fn sprite_height(self) -> u16 {
        if self.contains(Self::SPRITE_SIZE) {
            16
        } else {
            8
        }
    }

    /// NMI requested at VBlank start.
    #[inline]
    #[must_use]
    pub fn nmi_enabled(self) -> bool {
        self.contains(Self::NMI_ENABLE)
    }
}
