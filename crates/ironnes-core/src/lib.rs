//! IronNES emulation core.
//!
//! Ties the chip crates together into a runnable console: the
//! [`SystemBus`] decodes the CPU address map and owns the PPU, APU,
//! mapper, and controllers; the [`Console`] drives the interlocked
//! clocks (three PPU dots and one APU cycle per CPU cycle), forwards
//! NMI/IRQ between chips, performs OAM DMA and DMC stalls, and exposes
//! the framebuffer, audio levels, and save states to the host.
//!
//! # Example
//!
//! ```
//! use ironnes_core::Console;
//!
//! // Minimal iNES image: one PRG bank of NOPs, reset vector at $8000.
//! let mut image = vec![0u8; 16 + 16 * 1024];
//! image[0..4].copy_from_slice(&[0x4E, 0x45, 0x53, 0x1A]);
//! image[4] = 1;
//! for byte in &mut image[16..16 + 16 * 1024 - 6] {
//!     *byte = 0xEA;
//! }
//! image[16 + 0x3FFC] = 0x00;
//! image[16 + 0x3FFD] = 0x80;
//!
//! let mut console = Console::new(&image).unwrap();
//! console.step_frame();
//! assert_eq!(console.framebuffer().len(), 256 * 240);
//! ```

mod bus;
mod console;
mod controller;
mod snapshot;

pub use bus::SystemBus;
pub use console::{timing, Console, ConsoleError};
pub use controller::Controller;
pub use snapshot::Snapshot;
