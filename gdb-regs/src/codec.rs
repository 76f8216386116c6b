/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Conversion between [`CoreRegs`] and the flat byte buffer carried by the
//! `g`/`G` packets.
//!
//! bincode writes every field in declaration order with fixed-width
//! little-endian integers and no length prefix for fixed arrays, which is
//! exactly the layout gdb expects. The in-memory layout of `CoreRegs` is
//! never looked at.

use crate::error::Error;
use crate::regs::CoreRegs;
use crate::regs::CORE_REGS_SIZE;

/// Serialize `regs` into the gdb register buffer. The result is always
/// [`CORE_REGS_SIZE`] bytes long.
pub fn encode(regs: &CoreRegs) -> Vec<u8> {
    let encoded: Vec<u8> =
        bincode::serialize(regs).expect("core regs are plain integers and cannot fail to encode");
    debug_assert_eq!(encoded.len(), CORE_REGS_SIZE);
    tracing::trace!("encoded {} bytes of core regs, rip={:#x}", encoded.len(), regs.rip);
    encoded
}

/// Deserialize a gdb register buffer. `bytes` must be exactly
/// [`CORE_REGS_SIZE`] long; register values themselves are not validated.
pub fn decode(bytes: &[u8]) -> Result<CoreRegs, Error> {
    // NB: bincode::deserialize silently ignores trailing bytes.
    if bytes.len() != CORE_REGS_SIZE {
        tracing::debug!(
            "rejecting core regs buffer of {} bytes, expected {}",
            bytes.len(),
            CORE_REGS_SIZE
        );
        return Err(Error::LengthMismatch {
            expected: CORE_REGS_SIZE,
            actual: bytes.len(),
        });
    }
    let regs: CoreRegs = bincode::deserialize(bytes).map_err(|_| Error::LengthMismatch {
        expected: CORE_REGS_SIZE,
        actual: bytes.len(),
    })?;
    tracing::trace!("decoded core regs, rip={:#x}", regs.rip);
    Ok(regs)
}
