//! NES 2C02 PPU (Picture Processing Unit) emulation.
//!
//! Scanline-granular picture processor: the eight CPU-visible registers
//! with their side effects (status latch, shared write toggle, buffered
//! data reads, OAM access), NTSC frame timing of 341 dots by 262
//! scanlines, vblank NMI generation, and a row-at-a-time renderer
//! producing a 256x240 0RGB framebuffer.
//!
//! Pattern table and nametable memory is reached through the [`PpuBus`]
//! trait; the system crate routes it to the cartridge mapper and the
//! console-internal CIRAM. Call [`Ppu::tick`] three times per CPU cycle.

mod ctrl;
mod mask;
mod palette;
mod ppu;
mod state;
mod status;

pub use ctrl::Ctrl;
pub use mask::Mask;
pub use palette::MASTER_PALETTE;
pub use ppu::{Ppu, PpuBus};
pub use state::PpuState;
pub use status::PpuStatus;
