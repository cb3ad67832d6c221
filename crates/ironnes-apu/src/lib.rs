//! NES 2A03 APU (Audio Processing Unit) emulation.
//!
//! Five sample generators - two pulse waves, a triangle, an LFSR noise
//! source, and a delta-modulation channel - driven by a 240 Hz frame
//! sequencer that clocks their length, sweep, envelope, and linear
//! counter units and raises the periodic frame IRQ.
//!
//! The APU is clocked once per CPU cycle via [`Apu::clock`]. DMC sample
//! bytes are pulled from PRG space through the [`DmcBus`] trait and each
//! fetch reports the CPU stall it costs. The crate produces momentary
//! per-channel sample levels ([`Apu::levels`]); mixing and resampling
//! are left to an external audio sink.
//!
//! # Example
//!
//! ```
//! use ironnes_apu::{Apu, DmcBus};
//!
//! struct NoPrg;
//!
//! impl DmcBus for NoPrg {
//!     fn read_sample(&mut self, _addr: u16) -> u8 {
//!         0
//!     }
//! }
//!
//! let mut apu = Apu::new();
//! apu.write(0x15, 0x01); // enable pulse 1
//! apu.write(0x03, 0x08); // load its length counter
//! apu.clock(&mut NoPrg);
//! assert_ne!(apu.peek_status() & 0x01, 0);
//! ```

mod apu;
mod channel;
mod regs;
mod sequencer;

pub use apu::{Apu, DmcBus, DMC_PERIODS, LENGTH_COUNTERS, NOISE_PERIODS};
pub use regs::ChannelRegs;
pub use sequencer::{FrameSequencer, SequencerTick};
