/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! gdb register numbers for the amd64 core feature, used by the `p`/`P`
//! packets to address a single register inside the encoded [`CoreRegs`].

use crate::codec;
use crate::error::Error;
use crate::regs::CoreRegs;
use crate::regs::CORE_REGS_SIZE;
use crate::regs::FP80_SIZE;

/// Number of registers in the core feature.
pub const CORE_REGS_COUNT: usize = 40;

/// Location of a single register inside the encoded core regs.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct RegInfo {
    /// Name as it appears in gdb/64bit-core.xml.
    pub name: &'static str,
    /// Byte offset from the start of the buffer.
    pub offset: usize,
    /// Size in bytes.
    pub size: usize,
}

const NAMES: [&str; CORE_REGS_COUNT] = [
    "rax", "rbx", "rcx", "rdx", "rsi", "rdi", "rbp", "rsp", "r8", "r9", "r10", "r11", "r12", "r13",
    "r14", "r15", "rip", "eflags", "cs", "ss", "ds", "es", "fs", "gs", "st0", "st1", "st2", "st3",
    "st4", "st5", "st6", "st7", "fctrl", "fstat", "ftag", "fiseg", "fioff", "foseg", "fooff", "fop",
];

const fn reg_size(regno: usize) -> usize {
    match regno {
        0..=16 => 8,
        24..=31 => FP80_SIZE,
        _ => 4,
    }
}

const fn build_layout() -> [RegInfo; CORE_REGS_COUNT] {
    let mut layout = [RegInfo {
        name: "",
        offset: 0,
        size: 0,
    }; CORE_REGS_COUNT];
    let mut offset = 0;
    let mut regno = 0;
    while regno < CORE_REGS_COUNT {
        let size = reg_size(regno);
        layout[regno] = RegInfo {
            name: NAMES[regno],
            offset,
            size,
        };
        offset += size;
        regno += 1;
    }
    layout
}

/// Core registers indexed by gdb register number.
pub static CORE_REGS_LAYOUT: [RegInfo; CORE_REGS_COUNT] = build_layout();

const _: () = {
    let layout = build_layout();
    let last = &layout[CORE_REGS_COUNT - 1];
    assert!(last.offset + last.size == CORE_REGS_SIZE);
};

impl RegInfo {
    /// Look up a register by its gdb register number.
    pub fn lookup(regno: usize) -> Result<&'static RegInfo, Error> {
        CORE_REGS_LAYOUT
            .get(regno)
            .ok_or(Error::UnknownRegister(regno))
    }

    /// Look up a register by name, returning its register number as well.
    pub fn by_name(name: &str) -> Option<(usize, &'static RegInfo)> {
        CORE_REGS_LAYOUT
            .iter()
            .enumerate()
            .find(|(_, info)| info.name == name)
    }

    fn range(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.size
    }
}

/// Read the wire bytes of register `regno`.
pub fn read_register(regs: &CoreRegs, regno: usize) -> Result<Vec<u8>, Error> {
    let info = RegInfo::lookup(regno)?;
    let encoded = codec::encode(regs);
    Ok(encoded[info.range()].to_vec())
}

/// Overwrite register `regno` with `value`, given in wire format. `regs` is
/// left untouched on error.
pub fn write_register(regs: &mut CoreRegs, regno: usize, value: &[u8]) -> Result<(), Error> {
    let info = RegInfo::lookup(regno)?;
    if value.len() != info.size {
        tracing::debug!(
            "rejecting write of {} bytes to {}, expected {}",
            value.len(),
            info.name,
            info.size
        );
        return Err(Error::LengthMismatch {
            expected: info.size,
            actual: value.len(),
        });
    }
    let mut encoded = codec::encode(regs);
    encoded[info.range()].copy_from_slice(value);
    *regs = codec::decode(&encoded)?;
    Ok(())
}
