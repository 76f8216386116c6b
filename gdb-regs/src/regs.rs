/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// Number of general purpose registers sent over the wire.
pub const GPR_REGS: usize = 16;

/// Number of segment selectors sent over the wire.
pub const SEGMENT_REGS: usize = 6;

/// Number of x87 data registers.
pub const FPU_REGS: usize = 8;

/// Size in bytes of an x87 data register.
pub const FP80_SIZE: usize = 10;

/// Size in bytes of the encoded x87 control block, see [`X87Regs`].
pub const X87_REGS_SIZE: usize = 8 * 4;

/// Size of [`CoreRegs`] on the wire. This is the sum of the field widths,
/// there is never any padding in between.
pub const CORE_REGS_SIZE: usize =
    GPR_REGS * 8 + 8 + 4 + SEGMENT_REGS * 4 + FPU_REGS * FP80_SIZE + X87_REGS_SIZE; // 276.

#[repr(transparent)]
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Deserialize, Serialize)]
/// 80-bit FPU register, see gdb/64bit-core.xml. The bytes are moved around
/// verbatim and never interpreted as a floating point value.
pub struct Fp80([u8; FP80_SIZE]);

impl Fp80 {
    /// Raw significand and exponent bytes, little-endian.
    pub fn as_bytes(&self) -> &[u8; FP80_SIZE] {
        &self.0
    }
}

impl From<[u8; FP80_SIZE]> for Fp80 {
    fn from(bytes: [u8; FP80_SIZE]) -> Self {
        Fp80(bytes)
    }
}

impl From<Fp80> for [u8; FP80_SIZE] {
    fn from(fp: Fp80) -> Self {
        fp.0
    }
}

/// i387 regs, gdb layout.
///
/// Everything here is 32 bits wide on the wire even though `fctrl`, `fstat`,
/// `ftag` and `fop` are only 16 bits natively. The last instruction and
/// operand pointers are split into a high (`*seg`) and a low (`*off`) half.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Deserialize, Serialize)]
pub struct X87Regs {
    /// fctrl
    pub fctrl: u32,
    /// fstat
    pub fstat: u32,
    /// ftag
    pub ftag: u32,
    /// fiseg
    pub fiseg: u32,
    /// fioff
    pub fioff: u32,
    /// foseg
    pub foseg: u32,
    /// fooff
    pub fooff: u32,
    /// fop
    pub fop: u32,
}

/// amd64 core regs, see gdb/64bit-core.xml.
///
/// This is the snapshot of a single vcpu taken at a debug stop. Field order
/// is the register order of the target description and must not change.
/// `Default` gives the all-zero snapshot.
#[derive(Default, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct CoreRegs {
    /// general purpose registers
    /// rax/rbx/rcx/rdx/rsi/rdi/rbp/rsp/r8..r15
    pub regs: [u64; GPR_REGS],
    /// rip aka instruction pointer
    pub rip: u64,
    /// eflags, 32 bits in the gdb wire protocol.
    pub eflags: u32,
    /// cs, ss, ds, es, fs, gs
    pub segments: [u32; SEGMENT_REGS],
    /// 80-bit fpu regs
    pub st: [Fp80; FPU_REGS],
    /// fpu control regs
    pub x87: X87Regs,
}

impl fmt::Debug for CoreRegs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoreRegs")
            .field("rax", &self.regs[0])
            .field("rbx", &self.regs[1])
            .field("rcx", &self.regs[2])
            .field("rdx", &self.regs[3])
            .field("rsi", &self.regs[4])
            .field("rdi", &self.regs[5])
            .field("rbp", &self.regs[6])
            .field("rsp", &self.regs[7])
            .field("r8", &self.regs[8])
            .field("r9", &self.regs[9])
            .field("r10", &self.regs[10])
            .field("r11", &self.regs[11])
            .field("r12", &self.regs[12])
            .field("r13", &self.regs[13])
            .field("r14", &self.regs[14])
            .field("r15", &self.regs[15])
            .field("rip", &self.rip)
            .field("eflags", &self.eflags)
            .field("cs", &self.segments[0])
            .field("ss", &self.segments[1])
            .field("ds", &self.segments[2])
            .field("es", &self.segments[3])
            .field("fs", &self.segments[4])
            .field("gs", &self.segments[5])
            .field("st", &self.st)
            .field("x87", &self.x87)
            .finish()
    }
}
