//! In-memory save-state record.

use ironnes_cpu::CpuState;
use ironnes_ppu::PpuState;

/// Complete CPU + PPU + work-RAM snapshot.
///
/// Taking a snapshot is a plain copy and restoring overwrites in place;
/// APU state is deliberately not captured. The system bus owns a single
/// snapshot slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// CPU register file.
    pub cpu: CpuState,
    /// PPU registers, OAM, and palette RAM.
    pub ppu: PpuState,
    /// 2 KiB work RAM.
    pub ram: [u8; 2048],
}
