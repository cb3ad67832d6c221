//! Instruction semantics and opcode dispatch.
//!
//! Official instructions follow the 6502 data sheet; the unofficial
//! opcodes implemented here are the ones commercial ROMs actually use.
//! Decimal mode is accepted as a flag but never switches the ALU to BCD.

use crate::addressing::AddrMode;
use crate::bus::Bus;
use crate::cpu::Cpu;
use crate::opcodes::OPCODE_TABLE;
use crate::status::Status;
use crate::vectors;

impl Cpu {
    /// Dispatch one fetched opcode.
    #[allow(clippy::too_many_lines)]
    pub(crate) fn execute(&mut self, opcode: u8, bus: &mut impl Bus) {
        let mode = OPCODE_TABLE[opcode as usize].mode;
        match opcode {
            // Load/store
            0xA9 | 0xA5 | 0xB5 | 0xAD | 0xBD | 0xB9 | 0xA1 | 0xB1 => self.lda(bus, mode),
            0xA2 | 0xA6 | 0xB6 | 0xAE | 0xBE => self.ldx(bus, mode),
            0xA0 | 0xA4 | 0xB4 | 0xAC | 0xBC => self.ldy(bus, mode),
            0x85 | 0x95 | 0x8D | 0x9D | 0x99 | 0x81 | 0x91 => self.sta(bus, mode),
            0x86 | 0x96 | 0x8E => self.stx(bus, mode),
            0x84 | 0x94 | 0x8C => self.sty(bus, mode),

            // Transfers
            0xAA => self.tax(),
            0xA8 => self.tay(),
            0x8A => self.txa(),
            0x98 => self.tya(),
            0xBA => self.tsx(),
            0x9A => self.txs(),

            // Stack
            0x48 => self.pha(bus),
            0x08 => self.php(bus),
            0x68 => self.pla(bus),
            0x28 => self.plp(bus),

            // Arithmetic
            0x69 | 0x65 | 0x75 | 0x6D | 0x7D | 0x79 | 0x61 | 0x71 => self.adc(bus, mode),
            0xE9 | 0xE5 | 0xF5 | 0xED | 0xFD | 0xF9 | 0xE1 | 0xF1 | 0xEB => self.sbc(bus, mode),

            // Increment/decrement
            0xE6 | 0xF6 | 0xEE | 0xFE => self.inc(bus, mode),
            0xC6 | 0xD6 | 0xCE | 0xDE => self.dec(bus, mode),
            0xE8 => self.inx(),
            0xC8 => self.iny(),
            0xCA => self.dex(),
            0x88 => self.dey(),

            // Logic
            0x29 | 0x25 | 0x35 | 0x2D | 0x3D | 0x39 | 0x21 | 0x31 => self.and(bus, mode),
            0x09 | 0x05 | 0x15 | 0x0D | 0x1D | 0x19 | 0x01 | 0x11 => self.ora(bus, mode),
            0x49 | 0x45 | 0x55 | 0x4D | 0x5D | 0x59 | 0x41 | 0x51 => self.eor(bus, mode),
            0x24 | 0x2C => self.bit(bus, mode),

            // Shift/rotate
            0x0A | 0x06 | 0x16 | 0x0E | 0x1E => self.asl(bus, mode),
            0x4A | 0x46 | 0x56 | 0x4E | 0x5E => self.lsr(bus, mode),
            0x2A | 0x26 | 0x36 | 0x2E | 0x3E => self.rol(bus, mode),
            0x6A | 0x66 | 0x76 | 0x6E | 0x7E => self.ror(bus, mode),

            // Compare
            0xC9 | 0xC5 | 0xD5 | 0xCD | 0xDD | 0xD9 | 0xC1 | 0xD1 => self.cmp(bus, mode),
            0xE0 | 0xE4 | 0xEC => self.cpx(bus, mode),
            0xC0 | 0xC4 | 0xCC => self.cpy(bus, mode),

            // Branches
            0x10 => self.branch(bus, !self.status.contains(Status::N)),
            0x30 => self.branch(bus, self.status.contains(Status::N)),
            0x50 => self.branch(bus, !self.status.contains(Status::V)),
            0x70 => self.branch(bus, self.status.contains(Status::V)),
            0x90 => self.branch(bus, !self.status.contains(Status::C)),
            0xB0 => self.branch(bus, self.status.contains(Status::C)),
            0xD0 => self.branch(bus, !self.status.contains(Status::Z)),
            0xF0 => self.branch(bus, self.status.contains(Status::Z)),

            // Jumps and returns
            0x4C | 0x6C => self.jmp(bus, mode),
            0x20 => self.jsr(bus),
            0x60 => self.rts(bus),
            0x40 => self.rti(bus),
            0x00 => self.brk(bus),

            // Flags
            0x18 => self.status.remove(Status::C),
            0x38 => self.status.insert(Status::C),
            0x58 => self.status.remove(Status::I),
            0x78 => self.status.insert(Status::I),
            0xB8 => self.status.remove(Status::V),
            0xD8 => self.status.remove(Status::D),
            0xF8 => self.status.insert(Status::D),

            // NOPs, official and unofficial
            0xEA | 0x1A | 0x3A | 0x5A | 0x7A | 0xDA | 0xFA => {}
            0x80 | 0x82 | 0x89 | 0xC2 | 0xE2 | 0x04 | 0x44 | 0x64 | 0x14 | 0x34 | 0x54 | 0x74
            | 0xD4 | 0xF4 | 0x0C | 0x1C | 0x3C | 0x5C | 0x7C | 0xDC | 0xFC => {
                let _ = self.read_operand(bus, mode);
            }

            // Unofficial opcodes
            0xA7 | 0xB7 | 0xAF | 0xBF | 0xA3 | 0xB3 => self.lax(bus, mode),
            0x87 | 0x97 | 0x8F | 0x83 => self.sax(bus, mode),
            0xC7 | 0xD7 | 0xCF | 0xDF | 0xDB | 0xC3 | 0xD3 => self.dcp(bus, mode),
            0xE7 | 0xF7 | 0xEF | 0xFF | 0xFB | 0xE3 | 0xF3 => self.isc(bus, mode),
            0x07 | 0x17 | 0x0F | 0x1F | 0x1B | 0x03 | 0x13 => self.slo(bus, mode),
            0x27 | 0x37 | 0x2F | 0x3F | 0x3B | 0x23 | 0x33 => self.rla(bus, mode),
            0x47 | 0x57 | 0x4F | 0x5F | 0x5B | 0x43 | 0x53 => self.sre(bus, mode),
            0x67 | 0x77 | 0x6F | 0x7F | 0x7B | 0x63 | 0x73 => self.rra(bus, mode),
            0x0B | 0x2B => self.anc(bus),
            0x4B => self.alr(bus),
            0x6B => self.arr(bus),
            0x8B => self.xaa(bus),
            0xAB => self.lxa(bus),
            0xCB => self.axs(bus),
            0xBB => self.las(bus, mode),
            0x93 | 0x9F => self.sha(bus, mode),
            0x9C => self.shy(bus),
            0x9E => self.shx(bus),
            0x9B => self.tas(bus),

            // Jam opcodes halt real silicon; here they are a development
            // fault and a 2-cycle NOP otherwise.
            0x02 | 0x12 | 0x22 | 0x32 | 0x42 | 0x52 | 0x62 | 0x72 | 0x92 | 0xB2 | 0xD2 | 0xF2 => {
                self.jam(opcode);
            }
        }
    }

    // ----- load/store -----

    fn lda(&mut self, bus: &mut impl Bus, mode: AddrMode) {
        self.a = self.read_operand(bus, mode);
        self.set_zn(self.a);
    }

    fn ldx(&mut self, bus: &mut impl Bus, mode: AddrMode) {
        self.x = self.read_operand(bus, mode);
        self.set_zn(self.x);
    }

    fn ldy(&mut self, bus: &mut impl Bus, mode: AddrMode) {
        self.y = self.read_operand(bus, mode);
        self.set_zn(self.y);
    }

    fn sta(&mut self, bus: &mut impl Bus, mode: AddrMode) {
        self.write_operand(bus, mode, self.a);
    }

    fn stx(&mut self, bus: &mut impl Bus, mode: AddrMode) {
        self.write_operand(bus, mode, self.x);
    }

    fn sty(&mut self, bus: &mut impl Bus, mode: AddrMode) {
        self.write_operand(bus, mode, self.y);
    }

    // ----- transfers -----

    fn tax(&mut self) {
        self.x = self.a;
        self.set_zn(self.x);
    }

    fn tay(&mut self) {
        self.y = self.a;
        self.set_zn(self.y);
    }

    fn txa(&mut self) {
        self.a = self.x;
        self.set_zn(self.a);
    }

    fn tya(&mut self) {
        self.a = self.y;
        self.set_zn(self.a);
    }

    fn tsx(&mut self) {
        self.x = self.sp;
        self.set_zn(self.x);
    }

    fn txs(&mut self) {
        self.sp = self.x;
    }

    // ----- stack -----

    fn pha(&mut self, bus: &mut impl Bus) {
        self.push(bus, self.a);
    }

    fn php(&mut self, bus: &mut impl Bus) {
        let p = self.status.to_stack_byte(true);
        self.push(bus, p);
    }

    fn pla(&mut self, bus: &mut impl Bus) {
        self.a = self.pop(bus);
        self.set_zn(self.a);
    }

    fn plp(&mut self, bus: &mut impl Bus) {
        let p = self.pop(bus);
        self.status = Status::from_stack_byte(p);
    }

    // ----- arithmetic -----

    fn adc(&mut self, bus: &mut impl Bus, mode: AddrMode) {
        let value = self.read_operand(bus, mode);
        self.do_adc(value);
    }

    /// SBC is ADC of the one's complement: A + ~M + C.
    fn sbc(&mut self, bus: &mut impl Bus, mode: AddrMode) {
        let value = self.read_operand(bus, mode);
        self.do_adc(!value);
    }

    fn do_adc(&mut self, value: u8) {
        let carry = u16::from(self.status.contains(Status::C));
        let sum = u16::from(self.a) + u16::from(value) + carry;
        let result = sum as u8;

        self.status.set(Status::C, sum > 0xFF);
        self.status
            .set(Status::V, (!(self.a ^ value) & (self.a ^ result) & 0x80) != 0);
        self.a = result;
        self.set_zn(self.a);
    }

    // ----- increment/decrement -----

    fn inc(&mut self, bus: &mut impl Bus, mode: AddrMode) {
        self.modify_operand(bus, mode, |cpu, v| {
            let result = v.wrapping_add(1);
            cpu.set_zn(result);
            result
        });
    }

    fn dec(&mut self, bus: &mut impl Bus, mode: AddrMode) {
        self.modify_operand(bus, mode, |cpu, v| {
            let result = v.wrapping_sub(1);
            cpu.set_zn(result);
            result
        });
    }

    fn inx(&mut self) {
        self.x = self.x.wrapping_add(1);
        self.set_zn(self.x);
    }

    fn iny(&mut self) {
        self.y = self.y.wrapping_add(1);
        self.set_zn(self.y);
    }

    fn dex(&mut self) {
        self.x = self.x.wrapping_sub(1);
        self.set_zn(self.x);
    }

    fn dey(&mut self) {
        self.y = self.y.wrapping_sub(1);
        self.set_zn(self.y);
    }

    // ----- logic -----

    fn and(&mut self, bus: &mut impl Bus, mode: AddrMode) {
        self.a &= self.read_operand(bus, mode);
        self.set_zn(self.a);
    }

    fn ora(&mut self, bus: &mut impl Bus, mode: AddrMode) {
        self.a |= self.read_operand(bus, mode);
        self.set_zn(self.a);
    }

    fn eor(&mut self, bus: &mut impl Bus, mode: AddrMode) {
        self.a ^= self.read_operand(bus, mode);
        self.set_zn(self.a);
    }

    fn bit(&mut self, bus: &mut impl Bus, mode: AddrMode) {
        let value = self.read_operand(bus, mode);
        self.status.set(Status::Z, self.a & value == 0);
        self.status.set(Status::V, value & 0x40 != 0);
        self.status.set(Status::N, value & 0x80 != 0);
    }

    // ----- shift/rotate -----

    fn asl(&mut self, bus: &mut impl Bus, mode: AddrMode) {
        self.modify_operand(bus, mode, Self::do_asl);
    }

    fn lsr(&mut self, bus: &mut impl Bus, mode: AddrMode) {
        self.modify_operand(bus, mode, Self::do_lsr);
    }

    fn rol(&mut self, bus: &mut impl Bus, mode: AddrMode) {
        self.modify_operand(bus, mode, Self::do_rol);
    }

    fn ror(&mut self, bus: &mut impl Bus, mode: AddrMode) {
        self.modify_operand(bus, mode, Self::do_ror);
    }

    fn do_asl(&mut self, value: u8) -> u8 {
        self.status.set(Status::C, value & 0x80 != 0);
        let result = value << 1;
        self.set_zn(result);
        result
    }

    fn do_lsr(&mut self, value: u8) -> u8 {
        self.status.set(Status::C, value & 0x01 != 0);
        let result = value >> 1;
        self.set_zn(result);
        result
    }

    fn do_rol(&mut self, value: u8) -> u8 {
        let carry_in = u8::from(self.status.contains(Status::C));
        self.status.set(Status::C, value & 0x80 != 0);
        let result = (value << 1) | carry_in;
        self.set_zn(result);
        result
    }

    fn do_ror(&mut self, value: u8) -> u8 {
        let carry_in = u8::from(self.status.contains(Status::C));
        self.status.set(Status::C, value & 0x01 != 0);
        let result = (value >> 1) | (carry_in << 7);
        self.set_zn(result);
        result
    }

    // ----- compare -----

    fn cmp(&mut self, bus: &mut impl Bus, mode: AddrMode) {
        let value = self.read_operand(bus, mode);
        self.do_compare(self.a, value);
    }

    fn cpx(&mut self, bus: &mut impl Bus, mode: AddrMode) {
        let value = self.read_operand(bus, mode);
        self.do_compare(self.x, value);
    }

    fn cpy(&mut self, bus: &mut impl Bus, mode: AddrMode) {
        let value = self.read_operand(bus, mode);
        self.do_compare(self.y, value);
    }

    fn do_compare(&mut self, register: u8, value: u8) {
        self.status.set(Status::C, register >= value);
        self.set_zn(register.wrapping_sub(value));
    }

    // ----- jumps and returns -----

    /// JMP, absolute or indirect. Indirect pointers whose low byte is
    /// $FF read their high byte from the same page (hardware bug).
    fn jmp(&mut self, bus: &mut impl Bus, mode: AddrMode) {
        self.pc = self.operand_addr(bus, mode).addr;
    }

    fn jsr(&mut self, bus: &mut impl Bus) {
        let target = self.fetch16(bus);
        self.push_u16(bus, self.pc.wrapping_sub(1));
        self.pc = target;
    }

    fn rts(&mut self, bus: &mut impl Bus) {
        self.pc = self.pop_u16(bus).wrapping_add(1);
    }

    fn rti(&mut self, bus: &mut impl Bus) {
        let p = self.pop(bus);
        self.status = Status::from_stack_byte(p);
        self.pc = self.pop_u16(bus);
    }

    fn brk(&mut self, bus: &mut impl Bus) {
        self.push_u16(bus, self.pc.wrapping_add(1));
        let p = self.status.to_stack_byte(true);
        self.push(bus, p);
        self.status.insert(Status::I);
        self.pc = bus.read_u16(vectors::IRQ);
    }

    // ----- unofficial opcodes -----

    fn lax(&mut self, bus: &mut impl Bus, mode: AddrMode) {
        let value = self.read_operand(bus, mode);
        self.a = value;
        self.x = value;
        self.set_zn(value);
    }

    fn sax(&mut self, bus: &mut impl Bus, mode: AddrMode) {
        self.write_operand(bus, mode, self.a & self.x);
    }

    fn dcp(&mut self, bus: &mut impl Bus, mode: AddrMode) {
        self.modify_operand(bus, mode, |cpu, v| {
            let result = v.wrapping_sub(1);
            cpu.do_compare(cpu.a, result);
            result
        });
    }

    fn isc(&mut self, bus: &mut impl Bus, mode: AddrMode) {
        self.modify_operand(bus, mode, |cpu, v| {
            let result = v.wrapping_add(1);
            cpu.do_adc(!result);
            result
        });
    }

    fn slo(&mut self, bus: &mut impl Bus, mode: AddrMode) {
        self.modify_operand(bus, mode, |cpu, v| {
            let result = cpu.do_asl(v);
            cpu.a |= result;
            cpu.set_zn(cpu.a);
            result
        });
    }

    fn rla(&mut self, bus: &mut impl Bus, mode: AddrMode) {
        self.modify_operand(bus, mode, |cpu, v| {
            let result = cpu.do_rol(v);
            cpu.a &= result;
            cpu.set_zn(cpu.a);
            result
        });
    }

    fn sre(&mut self, bus: &mut impl Bus, mode: AddrMode) {
        self.modify_operand(bus, mode, |cpu, v| {
            let result = cpu.do_lsr(v);
            cpu.a ^= result;
            cpu.set_zn(cpu.a);
            result
        });
    }

    fn rra(&mut self, bus: &mut impl Bus, mode: AddrMode) {
        self.modify_operand(bus, mode, |cpu, v| {
            let result = cpu.do_ror(v);
            cpu.do_adc(result);
            result
        });
    }

    fn anc(&mut self, bus: &mut impl Bus) {
        self.a &= self.fetch8(bus);
        self.set_zn(self.a);
        self.status.set(Status::C, self.a & 0x80 != 0);
    }

    fn alr(&mut self, bus: &mut impl Bus) {
        self.a &= self.fetch8(bus);
        self.a = self.do_lsr(self.a);
    }

    fn arr(&mut self, bus: &mut impl Bus) {
        let value = self.fetch8(bus);
        let carry_in = u8::from(self.status.contains(Status::C));
        self.a = ((self.a & value) >> 1) | (carry_in << 7);
        self.set_zn(self.a);
        self.status.set(Status::C, self.a & 0x40 != 0);
        self.status
            .set(Status::V, ((self.a >> 6) ^ (self.a >> 5)) & 1 != 0);
    }

    fn xaa(&mut self, bus: &mut impl Bus) {
        let value = self.fetch8(bus);
        self.a = (self.a | 0xEE) & self.x & value;
        self.set_zn(self.a);
    }

    fn lxa(&mut self, bus: &mut impl Bus) {
        let value = self.fetch8(bus);
        self.a = (self.a | 0xEE) & value;
        self.x = self.a;
        self.set_zn(self.a);
    }

    fn axs(&mut self, bus: &mut impl Bus) {
        let value = self.fetch8(bus);
        let masked = self.a & self.x;
        self.status.set(Status::C, masked >= value);
        self.x = masked.wrapping_sub(value);
        self.set_zn(self.x);
    }

    fn las(&mut self, bus: &mut impl Bus, mode: AddrMode) {
        let result = self.read_operand(bus, mode) & self.sp;
        self.a = result;
        self.x = result;
        self.sp = result;
        self.set_zn(result);
    }

    fn sha(&mut self, bus: &mut impl Bus, mode: AddrMode) {
        let resolved = self.operand_addr(bus, mode);
        let value = self.a & self.x & ((resolved.addr >> 8) as u8).wrapping_add(1);
        bus.write(resolved.addr, value);
    }

    fn shx(&mut self, bus: &mut impl Bus) {
        let resolved = self.operand_addr(bus, AddrMode::Aby);
        let value = self.x & ((resolved.addr >> 8) as u8).wrapping_add(1);
        bus.write(resolved.addr, value);
    }

    fn shy(&mut self, bus: &mut impl Bus) {
        let resolved = self.operand_addr(bus, AddrMode::Abx);
        let value = self.y & ((resolved.addr >> 8) as u8).wrapping_add(1);
        bus.write(resolved.addr, value);
    }

    fn tas(&mut self, bus: &mut impl Bus) {
        self.sp = self.a & self.x;
        let resolved = self.operand_addr(bus, AddrMode::Aby);
        let value = self.sp & ((resolved.addr >> 8) as u8).wrapping_add(1);
        bus.write(resolved.addr, value);
    }

    fn jam(&mut self, opcode: u8) {
        debug_assert!(false, "jam opcode {opcode:02X} at {:04X}", self.last_pc);
        log::warn!("jam opcode {opcode:02X} at {:04X}, treating as NOP", self.last_pc);
        // The table carries no cycles for jams; charge two so the device
        // clocks keep advancing on buggy dumps.
        self.extra_cycles += 2;
    }
}
