//! iNES ROM loading and cartridge mappers for IronNES.
//!
//! The [`Mapper`] trait is the cartridge side of the system bus: it owns
//! PRG and CHR data, performs banking, and reports nametable mirroring.
//! [`Rom::load`] parses an iNES image and [`create_mapper`] picks the
//! implementation for its mapper number.

mod mapper;
mod nrom;
mod rom;
mod uxrom;

pub use mapper::{Mapper, Mirroring};
pub use nrom::Nrom;
pub use rom::{Rom, RomError};
pub use uxrom::Uxrom;

/// Instantiate the mapper for a parsed ROM image.
///
/// # Errors
///
/// Returns [`RomError::UnsupportedMapper`] for mapper numbers this crate
/// does not implement.
pub fn create_mapper(rom: &Rom) -> Result<Box<dyn Mapper>, RomError> {
    match rom.mapper {
        0 => Ok(Box::new(Nrom::new(rom))),
        2 => Ok(Box::new(Uxrom::new(rom))),
        n => {
            log::warn!("unsupported mapper {n}");
            Err(RomError::UnsupportedMapper(n))
        }
    }
}
