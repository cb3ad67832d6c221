//! PPU status register ($2002).

use bitflags::bitflags;

bitflags! {
    /// PPU status register flags. The low five bits are open bus.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PpuStatus: u8 {
        /// Sprite overflow (more than 8 sprites on a scanline).
        const SPRITE_OVERFLOW = 1 << 5;
        /// Sprite 0 hit.
        const SPRITE0_HIT = 1 << 6;
        /// Vertical blank has started. Cleared by reading $2002.
        const VBLANK = 1 << 7;
    }
}
