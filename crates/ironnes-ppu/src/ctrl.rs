//! PPU control register ($2000).
//!
//! ```text
//! 7  6  5  4  3  2  1  0
//! V  P  H  B  S  I  N  N
//! |  |  |  |  |  |  +--+-- Base nametable address
//! |  |  |  |  |  +------- VRAM address increment (0: +1, 1: +32)
//! |  |  |  |  +---------- Sprite pattern table for 8x8 sprites
//! |  |  |  +------------- Background pattern table
//! |  |  +---------------- Sprite size (0: 8x8, 1: 8x16)
//! |  +------------------- PPU master/slave select
//! +---------------------- Generate NMI at the start of vblank
//! ```

use bitflags::bitflags;

bitflags! {
    /// PPU control register flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Ctrl: u8 {
        /// Base nametable address bit 0.
        const NAMETABLE_LO = 1 << 0;
        /// Base nametable address bit 1.
        const NAMETABLE_HI = 1 << 1;
        /// VRAM address increment mode.
        const VRAM_INCREMENT = 1 << 2;
        /// Sprite pattern table select (8x8 sprites).
        const SPRITE_PATTERN = 1 << 3;
        /// Background pattern table select.
        const BG_PATTERN = 1 << 4;
        /// Sprite size select.
        const SPRITE_SIZE = 1 << 5;
        /// Master/slave select (unused by the core).
        const MASTER_SLAVE = 1 << 6;
        /// NMI enable at the start of vblank.
        const NMI_ENABLE = 1 << 7;
    }
}

impl Ctrl {
    /// Nametable select bits (0-3).
    #[inline]
    #[must_use]
    pub const fn nametable_select(self) -> u8 {
        self.bits() & 0x03
    }

    /// VRAM address increment applied by $2007 accesses.
    #[inline]
    #[must_use]
    pub const fn vram_increment(self) -> u16 {
        if self.contains(Self::VRAM_INCREMENT) {
            32
        } else {
            1
        }
    }

    /// Background pattern table base address.
    #[inline]
    #[must_use]
    pub const fn bg_pattern_addr(self) -> u16 {
        if self.contains(Self::BG_PATTERN) {
            0x1000
        } else {
            0x0000
        }
    }

    /// Sprite pattern table base address for 8x8 sprites.
    #[inline]
    #[must_use]
    pub const fn sprite_pattern_addr(self) -> u16 {
        if self.contains(Self::SPRITE_PATTERN) {
            0x1000
        } else {
            0x0000
        }
    }

    /// Sprite height in pixels.
    #[inline]
    #[must_use]
    pub const fn sprite_height(self) -> u16 {
        if self.contains(Self::SPRITE_SIZE) {
            16
        } else {
            8
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vram_increment_modes() {
        assert_eq!(Ctrl::empty().vram_increment(), 1);
        assert_eq!(Ctrl::VRAM_INCREMENT.vram_increment(), 32);
    }

    #[test]
    fn pattern_table_select() {
        assert_eq!(Ctrl::empty().bg_pattern_addr(), 0x0000);
        assert_eq!(Ctrl::BG_PATTERN.bg_pattern_addr(), 0x1000);
        assert_eq!(Ctrl::SPRITE_PATTERN.sprite_pattern_addr(), 0x1000);
    }
}
