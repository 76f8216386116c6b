/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! x86_64 register state for a gdb stub debugging a virtual machine guest.
//!
//! [`CoreRegs`] is the snapshot of one vcpu in the register order of
//! gdb's `64bit-core.xml`. [`encode`] and [`decode`] convert it to and from
//! the flat little-endian buffer carried by `g`/`G` packets (before hex
//! encoding), and [`CoreRegs::from_native`]/[`CoreRegs::to_native`] convert
//! it to and from [`VcpuRegs`], the state the monitor reads from and writes
//! back to the vcpu.
//!
//! ```
//! use gdb_regs::CoreRegs;
//! use gdb_regs::CORE_REGS_SIZE;
//!
//! let mut regs = CoreRegs::default();
//! regs.rip = 0x401000;
//! let bytes = gdb_regs::encode(&regs);
//! assert_eq!(bytes.len(), CORE_REGS_SIZE);
//! assert_eq!(gdb_regs::decode(&bytes), Ok(regs));
//! ```

mod codec;
mod error;
mod layout;
mod native;
mod regs;

pub use codec::decode;
pub use codec::encode;
pub use error::Error;
pub use layout::read_register;
pub use layout::write_register;
pub use layout::RegInfo;
pub use layout::CORE_REGS_COUNT;
pub use layout::CORE_REGS_LAYOUT;
pub use native::VcpuFpu;
pub use native::VcpuRegs;
pub use native::VcpuSegments;
pub use native::FXSAVE_ST_SIZE;
pub use regs::CoreRegs;
pub use regs::Fp80;
pub use regs::X87Regs;
pub use regs::CORE_REGS_SIZE;
pub use regs::FP80_SIZE;
pub use regs::FPU_REGS;
pub use regs::GPR_REGS;
pub use regs::SEGMENT_REGS;
pub use regs::X87_REGS_SIZE;
