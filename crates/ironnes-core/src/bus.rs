//! System bus: address decoding and inter-chip routing.
//!
//! The bus owns every chip instance and implements the CPU-side address
//! map:
//!
//! | Range         | Target                                     |
//! |---------------|--------------------------------------------|
//! | $0000-$1FFF   | 2 KiB work RAM, mirrored every $0800       |
//! | $2000-$3FFF   | PPU registers, mirrored every 8 bytes      |
//! | $4000-$4013   | APU channel registers                      |
//! | $4014         | OAM DMA trigger                            |
//! | $4015         | APU status / channel enable                |
//! | $4016         | Controller 1 read / strobe write           |
//! | $4017         | Controller 2 read / APU frame counter write|
//! | $4018-$401F   | unmapped, reads return 0                   |
//! | $4020-$FFFF   | Cartridge (mapper)                         |

use crate::controller::Controller;
use crate::snapshot::Snapshot;
use ironnes_apu::{Apu, DmcBus};
use ironnes_cpu::Bus;
use ironnes_mappers::{Mapper, Mirroring};
use ironnes_ppu::{Ppu, PpuBus};

/// PPU memory adapter: CHR through the mapper, nametables in CIRAM with
/// the cartridge-selected mirroring.
struct PpuMemory<'a> {
    mapper: &'a mut dyn Mapper,
    ciram: &'a mut [u8; 2048],
    mirroring: Mirroring,
}

impl PpuMemory<'_> {
    /// CIRAM offset for a nametable address, with mirroring applied.
    fn ciram_index(&self, addr: u16) -> usize {
        let addr = addr & 0x0FFF;
        let table = match self.mirroring {
            // $2000/$2400 share, $2800/$2C00 share.
            Mirroring::Horizontal => (addr >> 11) & 1,
            // $2000/$2800 share, $2400/$2C00 share.
            Mirroring::Vertical => (addr >> 10) & 1,
        };
        (table * 0x400 + (addr & 0x03FF)) as usize
    }
}

impl PpuBus for PpuMemory<'_> {
    fn read(&mut self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x1FFF => self.mapper.read_chr(addr),
            0x2000..=0x3EFF => self.ciram[self.ciram_index(addr)],
            _ => 0,
        }
    }

    fn write(&mut self, addr: u16, value: u8) {
        match addr {
            0x0000..=0x1FFF => self.mapper.write_chr(addr, value),
            0x2000..=0x3EFF => self.ciram[self.ciram_index(addr)] = value,
            _ => {}
        }
    }
}

/// DMC sample memory: PRG space through the mapper.
struct DmcMemory<'a> {
    mapper: &'a dyn Mapper,
}

impl DmcBus for DmcMemory<'_> {
    fn read_sample(&mut self, addr: u16) -> u8 {
        self.mapper.read_prg(addr)
    }
}

/// NES system bus.
pub struct SystemBus {
    /// 2 KiB CPU work RAM.
    pub ram: [u8; 2048],
    /// 2 KiB nametable RAM (CIRAM).
    pub ciram: [u8; 2048],
    /// Picture processor.
    pub ppu: Ppu,
    /// Audio processor.
    pub apu: Apu,
    /// Cartridge mapper.
    pub mapper: Box<dyn Mapper>,
    /// Controller port 1.
    pub controller1: Controller,
    /// Controller port 2.
    pub controller2: Controller,
    /// Page latched by a $4014 write, pending DMA.
    oam_dma_page: Option<u8>,
    /// The single save-state slot.
    snapshot: Option<Snapshot>,
}

impl SystemBus {
    /// Create a bus around a mapper, with the deterministic RAM
    /// power-on pattern.
    #[must_use]
    pub fn new(mapper: Box<dyn Mapper>) -> Self {
        Self {
            ram: power_on_ram(),
            ciram: [0; 2048],
            ppu: Ppu::new(),
            apu: Apu::new(),
            mapper,
            controller1: Controller::new(),
            controller2: Controller::new(),
            oam_dma_page: None,
            snapshot: None,
        }
    }

    /// Swap in a new cartridge, leaving chip state alone.
    pub fn replace_mapper(&mut self, mapper: Box<dyn Mapper>) {
        self.mapper = mapper;
    }

    /// Advance the PPU by the three dots of one CPU cycle.
    pub fn step_ppu(&mut self) {
        let mirroring = self.mapper.mirroring();
        let mut memory = PpuMemory {
            mapper: &mut *self.mapper,
            ciram: &mut self.ciram,
            mirroring,
        };
        for _ in 0..3 {
            self.ppu.tick(&mut memory);
        }
    }

    /// Advance the APU by one CPU cycle. Returns the CPU stall cycles
    /// charged by a DMC sample fetch.
    pub fn step_apu(&mut self) -> u8 {
        let mut memory = DmcMemory {
            mapper: &*self.mapper,
        };
        self.apu.clock(&mut memory)
    }

    /// Consume the PPU's latched NMI edge.
    pub fn take_nmi(&mut self) -> bool {
        self.ppu.take_nmi()
    }

    /// Consume the PPU's frame-complete flag.
    pub fn take_frame_complete(&mut self) -> bool {
        self.ppu.take_frame_complete()
    }

    /// Level of the shared IRQ line (APU frame counter or DMC).
    #[must_use]
    pub fn irq_line(&self) -> bool {
        self.apu.irq_pending()
    }

    /// Take a pending OAM DMA request.
    pub(crate) fn take_oam_dma(&mut self) -> Option<u8> {
        self.oam_dma_page.take()
    }

    /// Perform the 256-byte OAM copy for a $4014 write: 256 reads from
    /// `page << 8` paired with 256 writes to the PPU OAM port.
    pub(crate) fn run_oam_dma(&mut self, page: u8) {
        let base = u16::from(page) << 8;
        for i in 0..256u16 {
            let value = Bus::read(self, base.wrapping_add(i));
            self.ppu.write_oam(value);
        }
    }

    /// Store a snapshot in the single slot.
    pub(crate) fn store_snapshot(&mut self, snapshot: Snapshot) {
        self.snapshot = Some(snapshot);
    }

    /// Clone the snapshot out of the slot.
    pub(crate) fn stored_snapshot(&self) -> Option<Snapshot> {
        self.snapshot.clone()
    }
}

impl Bus for SystemBus {
    fn read(&mut self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize],
            0x2000..=0x3FFF => {
                let mirroring = self.mapper.mirroring();
                let mut memory = PpuMemory {
                    mapper: &mut *self.mapper,
                    ciram: &mut self.ciram,
                    mirroring,
                };
                self.ppu.read_register(addr, &mut memory)
            }
            0x4000..=0x401F => match addr {
                0x4015 => self.apu.read_status(),
                0x4016 => self.controller1.read(),
                0x4017 => self.controller2.read(),
                // Write-only and unmapped registers read as zero.
                _ => 0,
            },
            0x4020..=0xFFFF => self.mapper.read_prg(addr),
        }
    }

    fn write(&mut self, addr: u16, value: u8) {
        match addr {
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize] = value,
            0x2000..=0x3FFF => {
                let mirroring = self.mapper.mirroring();
                let mut memory = PpuMemory {
                    mapper: &mut *self.mapper,
                    ciram: &mut self.ciram,
                    mirroring,
                };
                self.ppu.write_register(addr, value, &mut memory);
            }
            0x4000..=0x401F => match addr {
                0x4014 => self.oam_dma_page = Some(value),
                0x4016 => {
                    self.controller1.strobe(value & 1 != 0);
                    self.controller2.strobe(value & 1 != 0);
                }
                0x4000..=0x4013 | 0x4015 | 0x4017 => {
                    self.apu.write((addr & 0x1F) as u8, value);
                }
                _ => {}
            },
            0x4020..=0xFFFF => self.mapper.write_prg(addr, value),
        }
    }

    fn peek(&self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize],
            // PPU register reads have side effects; stay out.
            0x2000..=0x3FFF => 0,
            0x4015 => self.apu.peek_status(),
            0x4000..=0x401F => 0,
            0x4020..=0xFFFF => self.mapper.read_prg(addr),
        }
    }
}

/// Deterministic RAM power-on pattern: $FF everywhere except a handful
/// of bytes games are known to probe.
fn power_on_ram() -> [u8; 2048] {
    let mut ram = [0xFF; 2048];
    ram[0x008] = 0xF7;
    ram[0x009] = 0xEF;
    ram[0x00A] = 0xDF;
    ram[0x00F] = 0xBF;
    ram[0x1FC] = 0x69;
    ram
}

#[cfg(test)]
mod tests {
    use super::*;
    use ironnes_mappers::{Nrom, Rom};

    fn test_bus() -> SystemBus {
        let rom = Rom {
            mapper: 0,
            mirroring: Mirroring::Vertical,
            has_battery: false,
            prg_rom: vec![0; Rom::PRG_BANK],
            chr_rom: vec![],
        };
        SystemBus::new(Box::new(Nrom::new(&rom)))
    }

    #[test]
    fn ram_mirrors_every_0x800() {
        let mut bus = test_bus();
        Bus::write(&mut bus, 0x0000, 0x42);

        assert_eq!(Bus::read(&mut bus, 0x0000), 0x42);
        assert_eq!(Bus::read(&mut bus, 0x0800), 0x42);
        assert_eq!(Bus::read(&mut bus, 0x1000), 0x42);
        assert_eq!(Bus::read(&mut bus, 0x1800), 0x42);

        Bus::write(&mut bus, 0x1A34, 0xAB);
        assert_eq!(Bus::read(&mut bus, 0x0234), 0xAB);
    }

    #[test]
    fn ram_power_on_pattern() {
        let mut bus = test_bus();
        assert_eq!(Bus::read(&mut bus, 0x0008), 0xF7);
        assert_eq!(Bus::read(&mut bus, 0x0009), 0xEF);
        assert_eq!(Bus::read(&mut bus, 0x000A), 0xDF);
        assert_eq!(Bus::read(&mut bus, 0x000F), 0xBF);
        assert_eq!(Bus::read(&mut bus, 0x01FC), 0x69);
        assert_eq!(Bus::read(&mut bus, 0x0000), 0xFF);
    }

    #[test]
    fn ppu_registers_mirror_every_8_bytes() {
        let mut bus = test_bus();
        // $2006 and its mirror $3FFE address the same latch pair.
        Bus::write(&mut bus, 0x2006, 0x21);
        Bus::write(&mut bus, 0x3FFE, 0x55);
        Bus::write(&mut bus, 0x2007, 0x99);

        // Read back through a mirrored data port.
        Bus::write(&mut bus, 0x2006, 0x21);
        Bus::write(&mut bus, 0x2006, 0x55);
        let _ = Bus::read(&mut bus, 0x3FFF); // prime the buffer
        assert_eq!(Bus::read(&mut bus, 0x3FFF), 0x99);
    }

    #[test]
    fn unmapped_io_reads_zero() {
        let mut bus = test_bus();
        for addr in 0x4018..=0x401F {
            assert_eq!(Bus::read(&mut bus, addr), 0);
        }
        // Write-only APU register.
        assert_eq!(Bus::read(&mut bus, 0x4000), 0);
    }

    #[test]
    fn controller_strobe_and_serial_read() {
        let mut bus = test_bus();
        bus.controller1.set_buttons(Controller::A | Controller::START);

        Bus::write(&mut bus, 0x4016, 1);
        Bus::write(&mut bus, 0x4016, 0);

        let bits: Vec<u8> = (0..8).map(|_| Bus::read(&mut bus, 0x4016) & 1).collect();
        assert_eq!(bits, [1, 0, 0, 1, 0, 0, 0, 0]);
    }

    #[test]
    fn oam_dma_copies_a_page() {
        let mut bus = test_bus();
        for i in 0..256u16 {
            Bus::write(&mut bus, 0x0200 + i, i as u8);
        }

        Bus::write(&mut bus, 0x4014, 0x02);
        let page = bus.take_oam_dma().expect("DMA latched");
        bus.run_oam_dma(page);

        // OAM address starts at 0, so the page lands in order.
        let state = bus.ppu.save_state();
        assert_eq!(state.oam[0], 0);
        assert_eq!(state.oam[255], 255);
    }

    #[test]
    fn cartridge_writes_reach_the_mapper() {
        let mut bus = test_bus();
        Bus::write(&mut bus, 0x6000, 0x5A);
        assert_eq!(Bus::read(&mut bus, 0x6000), 0x5A);
    }

    #[test]
    fn apu_status_via_4015() {
        let mut bus = test_bus();
        Bus::write(&mut bus, 0x4015, 0x01);
        Bus::write(&mut bus, 0x4003, 0x08);
        assert_eq!(Bus::read(&mut bus, 0x4015) & 0x1F, 0x01);
    }
}
