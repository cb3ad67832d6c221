//! Cartridge mapper contract.

/// Nametable mirroring mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mirroring {
    /// Horizontal mirroring (vertical arrangement).
    #[default]
    Horizontal,
    /// Vertical mirroring (horizontal arrangement).
    Vertical,
}

/// Cartridge mapper.
///
/// Owns the PRG and CHR data and performs banking. The CPU side covers
/// all of $4020-$FFFF; writes anywhere in that range reach the mapper,
/// which may interpret them as bank selects or PRG-RAM stores.
pub trait Mapper {
    /// Read a byte from CPU cartridge space ($4020-$FFFF).
    fn read_prg(&self, addr: u16) -> u8;

    /// Write a byte into CPU cartridge space ($4020-$FFFF).
    fn write_prg(&mut self, addr: u16, value: u8);

    /// Read a byte of CHR memory (PPU $0000-$1FFF).
    fn read_chr(&self, addr: u16) -> u8;

    /// Write a byte of CHR memory; only effective with CHR-RAM.
    fn write_chr(&mut self, addr: u16, value: u8);

    /// Current nametable mirroring.
    fn mirroring(&self) -> Mirroring;

    /// iNES mapper number.
    fn mapper_number(&self) -> u8;

    /// Human-readable mapper name.
    fn mapper_name(&self) -> &'static str;

    /// Restore power-on banking.
    fn reset(&mut self) {}
}
