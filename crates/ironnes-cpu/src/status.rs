//! CPU status register (P register) flags.
//!
//! ```text
//! 7  6  5  4  3  2  1  0
//! N  V  U  B  D  I  Z  C
//! │  │  │  │  │  │  │  └─ Carry
//! │  │  │  │  │  │  └──── Zero
//! │  │  │  │  │  └─────── Interrupt Disable
//! │  │  │  │  └────────── Decimal Mode (flag works, BCD arithmetic does not)
//! │  │  │  └───────────── Break (1 when pushed by PHP/BRK, 0 by IRQ/NMI)
//! │  │  └──────────────── Unused (always 1 when pushed to the stack)
//! │  └─────────────────── Overflow
//! └────────────────────── Negative
//! ```

use bitflags::bitflags;

bitflags! {
    /// CPU status register flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Status: u8 {
        /// Carry flag.
        const C = 1 << 0;
        /// Zero flag.
        const Z = 1 << 1;
        /// Interrupt disable. Masks IRQ; NMI is unaffected.
        const I = 1 << 2;
        /// Decimal mode. The NES 6502 honors the flag but never switches
        /// the ALU to BCD.
        const D = 1 << 3;
        /// Break flag. Distinguishes BRK/PHP pushes from IRQ/NMI pushes.
        const B = 1 << 4;
        /// Unused flag. Reads as 1 whenever the register is pushed.
        const U = 1 << 5;
        /// Overflow flag.
        const V = 1 << 6;
        /// Negative flag.
        const N = 1 << 7;
    }
}

impl Status {
    /// Power-on state: I and U set.
    pub const POWER_ON: Self = Self::I.union(Self::U);

    /// Creates a new status register in the power-on state.
    #[must_use]
    pub const fn new() -> Self {
        Self::POWER_ON
    }

    /// Sets or clears the Zero and Negative flags from a result byte.
    #[inline]
    pub fn set_zn(&mut self, value: u8) {
        self.set(Self::Z, value == 0);
        self.set(Self::N, value & 0x80 != 0);
    }

    /// Converts the register to the byte pushed on the stack.
    ///
    /// U is always set; B reflects the push origin (true for BRK/PHP,
    /// false for IRQ/NMI).
    #[inline]
    #[must_use]
    pub const fn to_stack_byte(self, brk: bool) -> u8 {
        let mut value = self.bits() | Self::U.bits();
        if brk {
            value |= Self::B.bits();
        }
        value
    }

    /// Builds the register from a byte pulled off the stack.
    ///
    /// B is discarded and U forced to 1, matching PLP/RTI behavior.
    #[inline]
    #[must_use]
    pub fn from_stack_byte(value: u8) -> Self {
        Self::from_bits_truncate((value & !Self::B.bits()) | Self::U.bits())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_on_state() {
        let status = Status::new();
        assert!(status.contains(Status::I));
        assert!(status.contains(Status::U));
        assert!(!status.contains(Status::C));
        assert!(!status.contains(Status::N));
    }

    #[test]
    fn set_zn_zero_and_negative() {
        let mut status = Status::empty();
        status.set_zn(0);
        assert!(status.contains(Status::Z));
        assert!(!status.contains(Status::N));

        status.set_zn(0x80);
        assert!(!status.contains(Status::Z));
        assert!(status.contains(Status::N));

        status.set_zn(0x42);
        assert!(!status.contains(Status::Z));
        assert!(!status.contains(Status::N));
    }

    #[test]
    fn stack_byte_brk_origin() {
        let status = Status::C | Status::Z;
        let byte = status.to_stack_byte(true);
        assert_ne!(byte & Status::B.bits(), 0);
        assert_ne!(byte & Status::U.bits(), 0);

        let byte = status.to_stack_byte(false);
        assert_eq!(byte & Status::B.bits(), 0);
        assert_ne!(byte & Status::U.bits(), 0);
    }

    #[test]
    fn from_stack_byte_discards_b() {
        let status = Status::from_stack_byte(0xFF);
        assert!(!status.contains(Status::B));
        assert!(status.contains(Status::U));
        assert!(status.contains(Status::C));
        assert!(status.contains(Status::N));
    }
}
