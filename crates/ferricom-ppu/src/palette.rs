//! Palette RAM and the 2C02 master palette.
//!
//! 32 bytes of palette RAM sit at $3F00-$3F1F (mirrored through $3FFF).
//! Entry 0 of each sprite palette aliases the corresponding background
//! entry: $3F10/$3F14/$3F18/$3F1C are the same cells as $3F00/$3F04/
//! $3F08/$3F0C.

/// Palette RAM.
#[derive(Debug, Clone)]
pub struct PaletteRam {
    data: [u8; 32],
}

impl PaletteRam {
    /// Zeroed palette RAM.
    #[must_use]
    pub fn new() -> Self {
        Self { data: [0; 32] }
    }

    /// Fold a $3F00-$3FFF address onto a cell index, applying the sprite
    /// backdrop aliasing.
    fn index(addr: u16) -> usize {
        let mut i = (addr & 0x1F) as usize;
        if i >= 0x10 && i % 4 == 0 {
            i -= 0x10;
        }
        i
    }

    /// Read a palette entry. Only 6 bits are significant; greyscale mode
    /// masks the hue column away.
    #[must_use]
    pub fn read(&self, addr: u16, greyscale: bool) -> u8 {
        let value = self.data[Self::index(addr)] & 0x3F;
        if greyscale {
            value & 0x30
        } else {
            value
        }
    }

    /// Write a palette entry.
    pub fn write(&mut self, addr: u16, value: u8) {
        self.data[Self::index(addr)] = value & 0x3F;
    }
}

impl Default for PaletteRam {
    fn default() -> Self {
        Self::new()
    }
}

/// The 2C02 master palette: 64 colours as (R, G, B).
#[rustfmt::skip]
pub static NES_PALETTE: [(u8, u8, u8); 64] = [
    ( 84,  84,  84), (  0,  30, 116), (  8,  16, 144), ( 48,   0, 136),
    ( 68,   0, 100), ( 92,   0,  48), ( 84,   4,   0), ( 60,  24,   0),
    ( 32,  42,   0), (  8,  58,   0), (  0,  64,   0), (  0,  60,   0),
    (  0,  50,  60), (  0,   0,   0), (  0,   0,   0), (  0,   0,   0),
    (152, 150, 152), (  8,  76, 196), ( 48,  50, 236), ( 92,  30, 228),
    (136,  20, 176), (160,  20, 100), (152,  34,  32), (120,  60,   0),
    ( 84,  90,   0), ( 40, 114,   0), (  8, 124,   0), (  0, 118,  40),
    (  0, 102, 120), (  0,   0,   0), (  0,   0,   0), (  0,   0,   0),
    (236, 238, 236), ( 76, 154, 236), (120, 124, 236), (176,  98, 236),
    (228,  84, 236), (236,  88, 180), (236, 106, 100), (212, 136,  32),
    (160, 170,   0), (116, 196,   0), ( 76, 208,  32), ( 56, 204, 108),
    ( 56, 180, 204), ( 60,  60,  60), (  0,   0,   0), (  0,   0,   0),
    (236, 238, 236), (168, 204, 236), (188, 188, 236), (212, 178, 236),
    (236, 174, 236), (236, 174, 212), (236, 180, 176), (228, 196, 144),
    (204, 210, 120), (180, 222, 120), (168, 226, 144), (152, 226, 180),
    (152, 226, 224), (160, 162, 160), (  0,   0,   0), (  0,   0,   0),
];
