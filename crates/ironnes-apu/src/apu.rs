//! APU register file, clocking, and waveform generation.
//!
//! The APU is clocked once per CPU cycle. Each clock advances the 240 Hz
//! frame sequencer (length/sweep/envelope/linear units, periodic IRQ)
//! and steps all five waveform timers, updating the momentary sample
//! level of each channel. An external sink mixes and resamples those
//! levels; no mixing happens here.

use crate::channel::{lfsr_step, Channel};
use crate::regs::ChannelRegs;
use crate::sequencer::FrameSequencer;

/// Length counter reload values, indexed by the 5-bit load field.
pub const LENGTH_COUNTERS: [u8; 32] = [
    10, 254, 20, 2, 40, 4, 80, 6, 160, 8, 60, 10, 14, 12, 26, 14, //
    12, 16, 24, 18, 48, 20, 96, 22, 192, 24, 72, 26, 16, 28, 32, 30,
];

/// Noise channel timer periods in CPU cycles.
pub const NOISE_PERIODS: [u16; 16] = [
    2, 4, 8, 16, 32, 48, 64, 80, 101, 127, 190, 254, 381, 508, 1017, 2034,
];

/// DMC timer periods in CPU cycles, indexed by the rate field.
pub const DMC_PERIODS: [u16; 16] = [
    428, 380, 340, 320, 286, 254, 226, 214, 190, 160, 142, 128, 106, 84, 72, 54,
];

/// Pulse duty sequences, packed as four 8-step waveforms.
const DUTY_MASK: u32 = 0xF33C_0C04;

/// CPU cycles lost to one DMC sample fetch.
const DMC_FETCH_STALL: u8 = 4;

/// Silence levels for disabled channels.
const TONAL_SILENCE: u8 = 8;
const DMC_SILENCE: u8 = 64;

/// PRG memory access for DMC sample fetches.
///
/// The DMC reads sample bytes out of cartridge space ($8000-$FFFF)
/// while the CPU is stalled; the system bus implements this.
pub trait DmcBus {
    /// Read one sample byte from PRG space.
    fn read_sample(&mut self, addr: u16) -> u8;
}

/// NES 2A03 APU.
#[derive(Debug, Clone)]
pub struct Apu {
    channels: [Channel; 5],
    enabled: [bool; 5],
    sequencer: FrameSequencer,
    periodic_irq: bool,
    dmc_irq: bool,
}

impl Apu {
    /// Create an APU with all channels disabled.
    #[must_use]
    pub fn new() -> Self {
        Self {
            channels: [Channel::default(); 5],
            enabled: [false; 5],
            sequencer: FrameSequencer::new(),
            periodic_irq: false,
            dmc_irq: false,
        }
    }

    /// Reset the APU to power-on state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Write an APU register. `index` is the CPU address masked to
    /// $00-$1F; indices below $10 address the four tonal channels, the
    /// rest the DMC, channel enables ($15), and the frame counter ($17).
    #[allow(clippy::too_many_lines)]
    pub fn write(&mut self, index: u8, value: u8) {
        let ci = (usize::from(index) / 4) % 5;
        match if index < 0x10 { index & 3 } else { index } {
            0 => {
                let ch = &mut self.channels[ci];
                // A linear-control write takes effect immediately when the
                // previous control bit allowed it.
                if ch.regs.linear_control() {
                    ch.linear_counter = i32::from(value & 0x7F);
                }
                ch.regs.set_reg0(value);
            }
            1 => {
                let ch = &mut self.channels[ci];
                ch.regs.set_reg1(value);
                ch.sweep_delay = i32::from(ch.regs.sweep_period());
            }
            2 => {
                self.channels[ci].regs.set_reg2(value);
            }
            3 => {
                let enabled = self.enabled[ci];
                let ch = &mut self.channels[ci];
                ch.regs.set_reg3(value);
                if enabled {
                    ch.length_counter =
                        i32::from(LENGTH_COUNTERS[ch.regs.length_load() as usize]);
                }
                ch.linear_counter = i32::from(ch.regs.linear_load());
                ch.env_delay = i32::from(ch.regs.env_period());
                ch.envelope = 15;
                if index < 8 {
                    ch.phase = 0;
                }
            }
            0x10 => {
                let ch = &mut self.channels[4];
                ch.regs.set_reg3(value);
                ch.regs
                    .set_wavelength(DMC_PERIODS[(value & 0x0F) as usize]);
            }
            0x11 => {
                // Direct DAC load.
                self.channels[4].linear_counter = i32::from(value & 0x7F);
            }
            0x12 => {
                let ch = &mut self.channels[4];
                ch.regs.set_reg0(value);
                ch.address = (u16::from(value) | 0x300) << 6;
            }
            0x13 => {
                let ch = &mut self.channels[4];
                ch.regs.set_reg1(value);
                ch.length_counter = i32::from(ch.regs.pcm_length()) * 16 + 1;
            }
            0x15 => {
                for c in 0..5 {
                    self.enabled[c] = value & (1 << c) != 0;
                }
                for c in 0..5 {
                    if !self.enabled[c] {
                        self.channels[c].length_counter = 0;
                    } else if c == 4 && self.channels[4].length_counter == 0 {
                        self.channels[4].length_counter =
                            i32::from(self.channels[4].regs.pcm_length()) * 16 + 1;
                    }
                }
            }
            0x17 => {
                self.sequencer.write_ctrl(value);
                if self.sequencer.irq_disabled() {
                    self.periodic_irq = false;
                    self.dmc_irq = false;
                }
            }
            other => {
                log::warn!("write to unmapped APU register index ${other:02X}");
            }
        }
    }

    /// Read the $4015 status register: per-channel length-counter
    /// activity, frame IRQ (bit 6) and DMC IRQ (bit 7). Reading clears
    /// both IRQ latches.
    pub fn read_status(&mut self) -> u8 {
        let status = self.peek_status();
        self.periodic_irq = false;
        self.dmc_irq = false;
        status
    }

    /// Status register value without the read side effect.
    #[must_use]
    pub fn peek_status(&self) -> u8 {
        let mut status = 0u8;
        for (c, ch) in self.channels.iter().enumerate() {
            if ch.length_counter > 0 {
                status |= 1 << c;
            }
        }
        if self.periodic_irq {
            status |= 0x40;
        }
        if self.dmc_irq {
            status |= 0x80;
        }
        status
    }

    /// True while either IRQ latch is set; feeds the CPU IRQ line.
    #[must_use]
    pub fn irq_pending(&self) -> bool {
        self.periodic_irq || self.dmc_irq
    }

    /// Advance one CPU cycle. Returns the CPU stall cycles incurred by a
    /// DMC sample fetch (0 or 4).
    pub fn clock(&mut self, dmc: &mut impl DmcBus) -> u8 {
        if let Some(tick) = self.sequencer.clock() {
            if tick.irq {
                self.periodic_irq = true;
            }
            for c in 0..5 {
                self.sequencer_tick(c, tick.half, tick.full);
            }
        }

        for c in 0..4 {
            self.update_tonal_level(c);
        }
        self.update_dmc_level(dmc)
    }

    /// Momentary sample levels of the five channels, for an external
    /// mixer: pulse 1, pulse 2, triangle, noise, DMC.
    #[must_use]
    pub fn levels(&self) -> [u8; 5] {
        [
            self.channels[0].level,
            self.channels[1].level,
            self.channels[2].level,
            self.channels[3].level,
            self.channels[4].level,
        ]
    }

    /// Inspect a channel's length counter (used by tests and debugging).
    #[must_use]
    pub fn length_counter(&self, channel: usize) -> i32 {
        self.channels[channel].length_counter
    }

    /// Frame sequencer state, for inspection.
    #[must_use]
    pub fn sequencer(&self) -> &FrameSequencer {
        &self.sequencer
    }

    /// Channel register word, for inspection.
    #[must_use]
    pub fn channel_regs(&self, channel: usize) -> ChannelRegs {
        self.channels[channel].regs
    }

    /// Apply one frame-sequencer subtick to a channel.
    fn sequencer_tick(&mut self, c: usize, half: bool, full: bool) {
        let ch = &mut self.channels[c];
        // The triangle's halt bit is the linear-counter control.
        let halt = if c == 2 {
            ch.regs.linear_control()
        } else {
            ch.regs.loop_envelope()
        };

        if half {
            ch.clock_length(halt);
            if c < 2 {
                ch.clock_sweep(c);
            }
        }
        if full {
            if c == 2 {
                ch.clock_linear();
            } else {
                ch.clock_envelope();
            }
        }
    }

    /// Step the waveform timer of a tonal channel (pulse 1/2, triangle,
    /// noise) and refresh its sample level.
    fn update_tonal_level(&mut self, c: usize) {
        if !self.enabled[c] {
            self.channels[c].level = TONAL_SILENCE;
            return;
        }
        let ch = &mut self.channels[c];

        // Effective period in CPU cycles.
        let period = if c == 3 {
            i32::from(NOISE_PERIODS[ch.regs.noise_period_index() as usize])
        } else {
            (i32::from(ch.regs.wavelength()) + 1) * if c == 2 { 1 } else { 2 }
        };

        if !Channel::count(&mut ch.wave_counter, period) {
            return;
        }
        let volume = ch.volume();

        match c {
            0 | 1 => {
                if ch.regs.wavelength() < 8 {
                    ch.level = TONAL_SILENCE;
                } else {
                    ch.phase = ch.phase.wrapping_add(1);
                    let bit = ch.phase % 8 + u32::from(ch.regs.duty()) * 8;
                    ch.level = if DUTY_MASK & (1 << bit) != 0 { volume } else { 0 };
                }
            }
            2 => {
                if ch.length_counter > 0 && ch.linear_counter > 0 && ch.regs.wavelength() >= 3 {
                    ch.phase = ch.phase.wrapping_add(1);
                }
                let step = (ch.phase & 15) as u8;
                ch.level = step ^ if ch.phase & 16 != 0 { 15 } else { 0 };
            }
            _ => {
                if ch.hold == 0 {
                    ch.hold = 1;
                }
                ch.hold = lfsr_step(ch.hold, ch.regs.noise_loop());
                ch.level = if ch.hold & 1 != 0 { 0 } else { volume };
            }
        }
    }

    /// Step the DMC: refill the bit buffer from PRG space when empty
    /// (stalling the CPU), shift delta bits into the output level.
    fn update_dmc_level(&mut self, dmc: &mut impl DmcBus) -> u8 {
        if !self.enabled[4] {
            self.channels[4].level = DMC_SILENCE;
            return 0;
        }

        let period = i32::from(self.channels[4].regs.wavelength()) + 1;
        if !Channel::count(&mut self.channels[4].wave_counter, period) {
            return 0;
        }

        let mut stall = 0;
        if self.channels[4].phase == 0 {
            // Buffer empty: loop back around, fetch the next byte, or
            // run out and raise the completion IRQ.
            {
                let ch = &mut self.channels[4];
                if ch.length_counter == 0 && ch.regs.dmc_loop() {
                    ch.length_counter = i32::from(ch.regs.pcm_length()) * 16 + 1;
                    ch.address = (u16::from(ch.regs.reg0()) | 0x300) << 6;
                }
            }
            if self.channels[4].length_counter > 0 {
                let addr = self.channels[4].address | 0x8000;
                let byte = dmc.read_sample(addr);
                let ch = &mut self.channels[4];
                ch.hold = u16::from(byte);
                ch.address = ch.address.wrapping_add(1);
                ch.phase = 8;
                ch.length_counter -= 1;
                stall = DMC_FETCH_STALL;
            } else {
                if self.channels[4].regs.dmc_irq_enabled() {
                    self.dmc_irq = true;
                }
                self.enabled[4] = false;
            }
        }

        let ch = &mut self.channels[4];
        if ch.phase != 0 {
            ch.phase -= 1;
            let delta = if ch.hold & (0x80 >> ch.phase) != 0 { 2 } else { -2 };
            let next = ch.linear_counter + delta;
            if (0..=0x7F).contains(&next) {
                ch.linear_counter = next;
            }
        }
        ch.level = ch.linear_counter as u8;
        stall
    }
}

impl Default for Apu {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// PRG space stub returning a fixed byte pattern.
    struct FlatPrg {
        byte: u8,
        reads: u32,
    }

    impl DmcBus for FlatPrg {
        fn read_sample(&mut self, _addr: u16) -> u8 {
            self.reads += 1;
            self.byte
        }
    }

    fn silent_prg() -> FlatPrg {
        FlatPrg { byte: 0, reads: 0 }
    }

    #[test]
    fn length_counter_load_via_reg3() {
        let mut apu = Apu::new();
        apu.write(0x15, 0x01); // enable pulse 1
        apu.write(0x03, 0x08); // length index 1

        assert_eq!(apu.length_counter(0), i32::from(LENGTH_COUNTERS[1]));
        assert_eq!(apu.length_counter(0), 254);
    }

    #[test]
    fn length_counter_not_loaded_when_disabled() {
        let mut apu = Apu::new();
        apu.write(0x03, 0x08);
        assert_eq!(apu.length_counter(0), 0);
    }

    #[test]
    fn frame_counter_mode_switch() {
        let mut apu = Apu::new();
        apu.periodic_irq = true;
        apu.dmc_irq = true;

        apu.write(0x17, 0xC0);

        assert!(apu.sequencer().five_step());
        assert!(apu.sequencer().irq_disabled());
        assert!(!apu.periodic_irq);
        assert!(!apu.dmc_irq);
        assert_eq!(apu.sequencer().counter(), (0, 0));
    }

    #[test]
    fn channel_disable_clears_length() {
        let mut apu = Apu::new();
        apu.write(0x15, 0x01);
        apu.write(0x03, 0x08);
        assert_eq!(apu.length_counter(0), 254);

        apu.write(0x15, 0x00);
        assert_eq!(apu.length_counter(0), 0);
    }

    #[test]
    fn status_reports_active_channels_and_clears_irqs() {
        let mut apu = Apu::new();
        apu.write(0x15, 0x03);
        apu.write(0x03, 0x08);
        apu.periodic_irq = true;

        let status = apu.read_status();
        assert_eq!(status & 0x1F, 0x01);
        assert_ne!(status & 0x40, 0);
        assert_eq!(apu.read_status() & 0x40, 0);
    }

    #[test]
    fn four_step_periodic_irq_rate() {
        let mut apu = Apu::new();
        let mut prg = silent_prg();
        apu.write(0x17, 0x00); // 4-step, IRQ enabled

        let mut assertions = 0;
        for _ in 0..4 * 29830 {
            apu.clock(&mut prg);
            if apu.irq_pending() {
                assertions += 1;
                apu.read_status();
            }
        }
        // One IRQ per full 4-step pass of the 240 Hz divider.
        assert_eq!(assertions, 4);
    }

    #[test]
    fn five_step_mode_raises_no_irq() {
        let mut apu = Apu::new();
        let mut prg = silent_prg();
        apu.write(0x17, 0x80);

        for _ in 0..4 * 29830 {
            apu.clock(&mut prg);
        }
        assert!(!apu.irq_pending());
    }

    #[test]
    fn pulse_emits_at_duty_rate() {
        let mut apu = Apu::new();
        let mut prg = silent_prg();
        apu.write(0x15, 0x01);
        apu.write(0x00, 0x7F); // duty 1, constant volume 15, halt
        apu.write(0x02, 0x20); // wavelength 0x20
        apu.write(0x03, 0x08); // load length, reset phase

        let mut seen = [false; 16];
        for _ in 0..(0x21 * 2 * 16) {
            apu.clock(&mut prg);
            seen[apu.levels()[0] as usize & 15] = true;
        }
        // Duty 1 alternates between volume and silence.
        assert!(seen[15]);
        assert!(seen[0]);
    }

    #[test]
    fn short_pulse_wavelength_is_silenced() {
        let mut apu = Apu::new();
        let mut prg = silent_prg();
        apu.write(0x15, 0x01);
        apu.write(0x00, 0x1F); // constant volume 15
        apu.write(0x02, 0x04); // wavelength 4 < 8
        apu.write(0x03, 0x08);

        for _ in 0..64 {
            apu.clock(&mut prg);
        }
        assert_eq!(apu.levels()[0], 8);
    }

    #[test]
    fn triangle_steps_through_32_levels() {
        let mut apu = Apu::new();
        let mut prg = silent_prg();
        apu.write(0x15, 0x04);
        apu.write(0x08, 0xFF); // control set, load 0x7F
        apu.write(0x0A, 0x10); // wavelength 0x10
        apu.write(0x0B, 0x08); // load length + linear

        let mut seen = [false; 16];
        for _ in 0..(0x11 * 64) {
            apu.clock(&mut prg);
            seen[apu.levels()[2] as usize] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn dmc_fetch_stalls_and_consumes_length() {
        let mut apu = Apu::new();
        let mut prg = FlatPrg {
            byte: 0xFF,
            reads: 0,
        };
        apu.write(0x10, 0x0F); // fastest rate, no loop, no IRQ
        apu.write(0x12, 0x00); // address $C000
        apu.write(0x13, 0x01); // length 17
        apu.write(0x15, 0x10); // enable DMC

        let mut stalls = 0u32;
        for _ in 0..54 * 16 {
            stalls += u32::from(apu.clock(&mut prg));
        }
        assert!(prg.reads >= 1);
        assert_eq!(stalls, u32::from(prg.reads) * 4);
        assert!(apu.length_counter(4) < 17);
        // All-ones deltas push the level upward.
        assert!(apu.levels()[4] > 0);
    }

    #[test]
    fn dmc_exhaustion_raises_irq() {
        let mut apu = Apu::new();
        let mut prg = silent_prg();
        apu.write(0x10, 0x8F); // IRQ enabled, fastest rate
        apu.write(0x12, 0x00);
        apu.write(0x13, 0x00); // length 1: one byte then exhaustion
        apu.write(0x15, 0x10);

        for _ in 0..54 * 16 {
            apu.clock(&mut prg);
        }
        assert!(apu.irq_pending());
        assert_ne!(apu.read_status() & 0x80, 0);
        // The channel disabled itself.
        assert_eq!(apu.peek_status() & 0x10, 0);
    }

    #[test]
    fn dmc_loop_reloads_instead_of_irq() {
        let mut apu = Apu::new();
        let mut prg = FlatPrg {
            byte: 0xFF,
            reads: 0,
        };
        apu.write(0x10, 0xCF); // IRQ enabled + loop, fastest rate
        apu.write(0x12, 0x00);
        apu.write(0x13, 0x00); // one-byte sample, looped forever
        apu.write(0x15, 0x10);

        for _ in 0..54 * 64 {
            apu.clock(&mut prg);
        }
        // The loop path reloads instead of exhausting: no completion IRQ,
        // and the all-ones deltas keep ramping the DAC.
        assert!(!apu.irq_pending());
        assert!(prg.reads > 1);
        assert!(apu.levels()[4] > 64);
    }
}
