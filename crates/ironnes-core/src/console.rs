//! Console driver: the composition root tying CPU, bus, and timing
//! together.
//!
//! The CPU is the master clock. Each [`Console::step`] executes one
//! instruction (or drains a DMA/stall), then advances the PPU by three
//! dots and the APU by one cycle for every CPU cycle consumed, PPU
//! first. Interrupt lines are forwarded between instructions: the PPU's
//! vblank NMI edge and the APU's IRQ level.

use crate::bus::SystemBus;
use crate::snapshot::Snapshot;
use ironnes_cpu::Cpu;
use ironnes_mappers::{create_mapper, Mapper, Rom, RomError};

/// NTSC timing constants.
pub mod timing {
    /// CPU clock frequency in Hz.
    pub const CPU_CLOCK: u32 = 1_789_773;
    /// PPU dots per CPU cycle.
    pub const DOTS_PER_CPU_CYCLE: u32 = 3;
    /// Approximate CPU cycles per frame.
    pub const CPU_CYCLES_PER_FRAME: u32 = 29_780;
}

/// Console construction errors.
#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    /// The ROM image could not be parsed or has no mapper support.
    #[error(transparent)]
    Rom(#[from] RomError),
}

/// NES console.
pub struct Console {
    cpu: Cpu,
    bus: SystemBus,
    total_cycles: u64,
}

impl Console {
    /// Build a console from an iNES image.
    pub fn new(rom_data: &[u8]) -> Result<Self, ConsoleError> {
        let rom = Rom::load(rom_data)?;
        let mapper = create_mapper(&rom)?;
        Ok(Self::with_mapper(mapper))
    }

    /// Build a console around a pre-built mapper.
    #[must_use]
    pub fn with_mapper(mapper: Box<dyn Mapper>) -> Self {
        let mut console = Self {
            cpu: Cpu::new(),
            bus: SystemBus::new(mapper),
            total_cycles: 0,
        };
        console.cpu.reset(&mut console.bus);
        console
    }

    /// Swap the cartridge for a new image. Chip state persists across
    /// the swap; call [`Console::reset`] to restart execution.
    pub fn load_rom(&mut self, rom_data: &[u8]) -> Result<(), ConsoleError> {
        let rom = Rom::load(rom_data)?;
        let mapper = create_mapper(&rom)?;
        log::info!("cartridge swapped to {}", mapper.mapper_name());
        self.bus.replace_mapper(mapper);
        Ok(())
    }

    /// Reset: the CPU is rebuilt and revectored, other chips stay alive.
    pub fn reset(&mut self) {
        self.cpu = Cpu::new();
        self.cpu.reset(&mut self.bus);
    }

    /// Execute one CPU instruction (or one pending DMA) and advance the
    /// PPU and APU in lockstep. Returns the CPU cycles consumed.
    pub fn step(&mut self) -> u32 {
        // A latched $4014 write stalls the CPU for a full page copy.
        if let Some(page) = self.bus.take_oam_dma() {
            self.bus.run_oam_dma(page);
            let cycles = 513 + u32::from(self.total_cycles % 2 == 1);
            self.tick_components(cycles);
            return cycles;
        }

        // Forward interrupt lines sampled at the instruction boundary.
        if self.bus.take_nmi() {
            self.cpu.pull_nmi();
        }
        self.cpu.set_irq_line(self.bus.irq_line());

        let mut cycles = u32::from(self.cpu.step(&mut self.bus));
        cycles += self.tick_components(cycles);
        cycles
    }

    /// Tick PPU (x3) and APU (x1) for `cycles` CPU cycles, PPU first.
    /// DMC fetches stall the CPU; stall cycles still clock both chips.
    /// Returns the total stall incurred.
    fn tick_components(&mut self, cycles: u32) -> u32 {
        let mut pending = cycles;
        let mut stalled = 0;
        while pending > 0 {
            pending -= 1;
            self.bus.step_ppu();
            let stall = u32::from(self.bus.step_apu());
            stalled += stall;
            pending += stall;
            self.total_cycles += 1;
        }
        stalled
    }

    /// Run until the PPU finishes the current frame.
    pub fn step_frame(&mut self) -> u64 {
        let start = self.total_cycles;
        loop {
            self.step();
            if self.bus.take_frame_complete() {
                break;
            }
        }
        self.total_cycles - start
    }

    /// Run instruction-by-instruction until `halted` reports true. The
    /// flag is sampled between instructions only.
    pub fn run_until(&mut self, mut halted: impl FnMut() -> bool) {
        while !halted() {
            self.step();
        }
    }

    /// Copy CPU, PPU, and RAM state into the bus's snapshot slot.
    pub fn save_state(&mut self) {
        let snapshot = Snapshot {
            cpu: self.cpu.save_state(),
            ppu: self.bus.ppu.save_state(),
            ram: self.bus.ram,
        };
        self.bus.store_snapshot(snapshot);
    }

    /// Restore the snapshot slot, if one was saved.
    pub fn restore_state(&mut self) {
        if let Some(snapshot) = self.bus.stored_snapshot() {
            self.cpu.load_state(&snapshot.cpu);
            self.bus.ppu.load_state(&snapshot.ppu);
            self.bus.ram = snapshot.ram;
        }
    }

    /// Total CPU cycles executed.
    #[must_use]
    pub fn total_cycles(&self) -> u64 {
        self.total_cycles
    }

    /// The rendered frame, 256x240 0RGB pixels.
    #[must_use]
    pub fn framebuffer(&self) -> &[u32] {
        self.bus.ppu.framebuffer()
    }

    /// Momentary APU channel levels for an audio sink.
    #[must_use]
    pub fn audio_levels(&self) -> [u8; 5] {
        self.bus.apu.levels()
    }

    /// Set the buttons held on controller 1.
    pub fn set_controller1(&mut self, buttons: u8) {
        self.bus.controller1.set_buttons(buttons);
    }

    /// Set the buttons held on controller 2.
    pub fn set_controller2(&mut self, buttons: u8) {
        self.bus.controller2.set_buttons(buttons);
    }

    /// CPU reference, for inspection.
    #[must_use]
    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    /// Bus reference, for inspection.
    #[must_use]
    pub fn bus(&self) -> &SystemBus {
        &self.bus
    }

    /// Mutable bus reference.
    pub fn bus_mut(&mut self) -> &mut SystemBus {
        &mut self.bus
    }

    /// Peek memory without side effects.
    #[must_use]
    pub fn peek_memory(&self, addr: u16) -> u8 {
        use ironnes_cpu::Bus;
        self.bus.peek(addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ironnes_mappers::{Mirroring, Nrom};

    /// 32 KiB NROM image: a NOP sled with the reset vector at $8000.
    fn nop_console() -> Console {
        let mut prg = vec![0xEA; 2 * Rom::PRG_BANK];
        prg[0x7FFC] = 0x00;
        prg[0x7FFD] = 0x80;
        let rom = Rom {
            mapper: 0,
            mirroring: Mirroring::Vertical,
            has_battery: false,
            prg_rom: prg,
            chr_rom: vec![],
        };
        Console::with_mapper(Box::new(Nrom::new(&rom)))
    }

    #[test]
    fn reset_vectors_the_cpu() {
        let console = nop_console();
        assert_eq!(console.cpu().pc, 0x8000);
    }

    #[test]
    fn step_consumes_cycles() {
        let mut console = nop_console();
        let cycles = console.step();
        assert_eq!(cycles, 2); // NOP
        assert_eq!(console.total_cycles(), 2);
    }

    #[test]
    fn frame_takes_roughly_a_frame_of_cycles() {
        let mut console = nop_console();
        let cycles = console.step_frame();
        // 341 * 262 / 3 CPU cycles, within one instruction of slack.
        let expected: u64 = 341 * 262 / 3;
        assert!(cycles.abs_diff(expected) < 10, "{cycles} vs {expected}");
    }

    #[test]
    fn oam_dma_costs_513_or_514_cycles() {
        let mut console = nop_console();
        use ironnes_cpu::Bus;
        Bus::write(console.bus_mut(), 0x4014, 0x02);
        let cycles = console.step();
        assert!(cycles == 513 || cycles == 514);
    }

    #[test]
    fn run_until_halts_between_instructions() {
        let mut console = nop_console();
        let mut remaining = 10;
        console.run_until(|| {
            remaining -= 1;
            remaining == 0
        });
        assert_eq!(console.total_cycles(), 9 * 2);
    }

    #[test]
    fn save_restore_is_identity() {
        let mut console = nop_console();
        for _ in 0..1000 {
            console.step();
        }
        console.save_state();
        let cpu_before = console.cpu().save_state();
        let ppu_before = console.bus().ppu.save_state();
        let ram_before = console.bus().ram;

        for _ in 0..1000 {
            console.step();
        }
        console.restore_state();

        assert_eq!(console.cpu().save_state(), cpu_before);
        assert_eq!(console.bus().ppu.save_state(), ppu_before);
        assert_eq!(console.bus().ram, ram_before);
    }

    #[test]
    fn rom_swap_keeps_chip_state() {
        let mut console = nop_console();
        for _ in 0..100 {
            console.step();
        }
        use ironnes_cpu::Bus;
        Bus::write(console.bus_mut(), 0x0010, 0x77);

        let mut image = vec![0u8; 16 + Rom::PRG_BANK];
        image[0..4].copy_from_slice(&[0x4E, 0x45, 0x53, 0x1A]);
        image[4] = 1;
        console.load_rom(&image).unwrap();

        assert_eq!(console.peek_memory(0x0010), 0x77);
    }
}
