/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! The monitor side of a register snapshot: vcpu state at architectural
//! widths, and the conversion to and from the gdb wire layout.

#[cfg(target_arch = "x86_64")]
mod kvm;
#[cfg(all(target_os = "linux", target_arch = "x86_64"))]
mod ptrace;

use serde::Deserialize;
use serde::Serialize;

use crate::error::Error;
use crate::regs::CoreRegs;
use crate::regs::Fp80;
use crate::regs::X87Regs;
use crate::regs::FP80_SIZE;
use crate::regs::FPU_REGS;

/// Size of a register slot in the fxsave area. Only the low 10 bytes hold
/// the 80-bit value.
pub const FXSAVE_ST_SIZE: usize = 16;

/// Segment selectors.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Deserialize, Serialize)]
pub struct VcpuSegments {
    pub cs: u16,
    pub ss: u16,
    pub ds: u16,
    pub es: u16,
    pub fs: u16,
    pub gs: u16,
}

/// x87 state as laid out by fxsave.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Deserialize, Serialize)]
pub struct VcpuFpu {
    /// st0..st7, one fxsave slot each.
    pub st: [[u8; FXSAVE_ST_SIZE]; FPU_REGS],
    /// Control word.
    pub fcw: u16,
    /// Status word.
    pub fsw: u16,
    /// Tag word.
    pub ftw: u16,
    /// Last instruction opcode.
    pub fop: u16,
    /// Last instruction pointer.
    pub fip: u64,
    /// Last data (operand) pointer.
    pub fdp: u64,
}

/// Register state of one vcpu, as captured by the monitor after a trap.
#[derive(Debug, Default, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct VcpuRegs {
    pub rax: u64,
    pub rbx: u64,
    pub rcx: u64,
    pub rdx: u64,
    pub rsi: u64,
    pub rdi: u64,
    pub rbp: u64,
    pub rsp: u64,
    pub r8: u64,
    pub r9: u64,
    pub r10: u64,
    pub r11: u64,
    pub r12: u64,
    pub r13: u64,
    pub r14: u64,
    pub r15: u64,
    pub rip: u64,
    pub rflags: u64,
    pub segments: VcpuSegments,
    pub fpu: VcpuFpu,
}

fn to_fp80(slot: &[u8; FXSAVE_ST_SIZE]) -> Fp80 {
    let mut bytes = [0u8; FP80_SIZE];
    bytes.copy_from_slice(&slot[..FP80_SIZE]);
    Fp80::from(bytes)
}

fn from_fp80(fp: &Fp80) -> [u8; FXSAVE_ST_SIZE] {
    let mut slot = [0u8; FXSAVE_ST_SIZE];
    slot[..FP80_SIZE].copy_from_slice(fp.as_bytes());
    slot
}

/// Narrow a 32-bit wire field into a 16-bit native register, refusing to
/// drop any set bit.
fn narrow(register: &'static str, value: u32) -> Result<u16, Error> {
    u16::try_from(value).map_err(|_| {
        tracing::debug!("{} = {:#x} does not fit in 16 bits", register, value);
        Error::OutOfRange {
            register,
            value: value as u64,
        }
    })
}

impl CoreRegs {
    /// Build the wire-ordered snapshot from a native capture.
    ///
    /// Selectors and x87 control words are zero-extended. `rflags` keeps its
    /// low 32 bits only; the upper half is reserved. The last instruction and
    /// operand pointers are split into seg (high) and off (low) halves.
    pub fn from_native(native: &VcpuRegs) -> Self {
        let fpu = &native.fpu;
        CoreRegs {
            regs: [
                native.rax, native.rbx, native.rcx, native.rdx, native.rsi, native.rdi,
                native.rbp, native.rsp, native.r8, native.r9, native.r10, native.r11, native.r12,
                native.r13, native.r14, native.r15,
            ],
            rip: native.rip,
            eflags: native.rflags as u32,
            segments: [
                native.segments.cs as u32,
                native.segments.ss as u32,
                native.segments.ds as u32,
                native.segments.es as u32,
                native.segments.fs as u32,
                native.segments.gs as u32,
            ],
            st: std::array::from_fn(|i| to_fp80(&fpu.st[i])),
            x87: X87Regs {
                fctrl: fpu.fcw as u32,
                fstat: fpu.fsw as u32,
                ftag: fpu.ftw as u32,
                fiseg: (fpu.fip >> 32) as u32,
                fioff: (fpu.fip & 0xffffffff) as u32,
                foseg: (fpu.fdp >> 32) as u32,
                fooff: (fpu.fdp & 0xffffffff) as u32,
                fop: fpu.fop as u32,
            },
        }
    }

    /// Convert back into a native capture, e.g. to apply a `G` packet.
    ///
    /// Fails with [`Error::OutOfRange`] if a selector or an x87 control word
    /// has any of its upper 16 bits set. Nothing is returned on failure, so
    /// a rejected write can never be partially applied.
    pub fn to_native(&self) -> Result<VcpuRegs, Error> {
        let segments = VcpuSegments {
            cs: narrow("cs", self.segments[0])?,
            ss: narrow("ss", self.segments[1])?,
            ds: narrow("ds", self.segments[2])?,
            es: narrow("es", self.segments[3])?,
            fs: narrow("fs", self.segments[4])?,
            gs: narrow("gs", self.segments[5])?,
        };
        let fpu = VcpuFpu {
            st: std::array::from_fn(|i| from_fp80(&self.st[i])),
            fcw: narrow("fctrl", self.x87.fctrl)?,
            fsw: narrow("fstat", self.x87.fstat)?,
            ftw: narrow("ftag", self.x87.ftag)?,
            fop: narrow("fop", self.x87.fop)?,
            fip: self.x87.fioff as u64 | ((self.x87.fiseg as u64) << 32),
            fdp: self.x87.fooff as u64 | ((self.x87.foseg as u64) << 32),
        };
        Ok(VcpuRegs {
            rax: self.regs[0],
            rbx: self.regs[1],
            rcx: self.regs[2],
            rdx: self.regs[3],
            rsi: self.regs[4],
            rdi: self.regs[5],
            rbp: self.regs[6],
            rsp: self.regs[7],
            r8: self.regs[8],
            r9: self.regs[9],
            r10: self.regs[10],
            r11: self.regs[11],
            r12: self.regs[12],
            r13: self.regs[13],
            r14: self.regs[14],
            r15: self.regs[15],
            rip: self.rip,
            rflags: self.eflags as u64,
            segments,
            fpu,
        })
    }
}

impl From<&VcpuRegs> for CoreRegs {
    fn from(native: &VcpuRegs) -> Self {
        CoreRegs::from_native(native)
    }
}

impl TryFrom<&CoreRegs> for VcpuRegs {
    type Error = Error;

    fn try_from(regs: &CoreRegs) -> Result<Self, Error> {
        regs.to_native()
    }
}
