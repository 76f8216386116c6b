/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

use thiserror::Error;

/// Errors raised while converting register state to or from the gdb wire
/// layout. None of them are fatal: the caller is expected to reject the
/// offending request and leave the vcpu untouched.
#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum Error {
    /// Input buffer does not have the exact size of the target layout.
    #[error("Register buffer has {actual} bytes, expected {expected}")]
    LengthMismatch { expected: usize, actual: usize },
    /// A wire value does not fit into the native register width.
    #[error("Value {value:#x} does not fit in native register {register}")]
    OutOfRange { register: &'static str, value: u64 },
    /// Register number is not part of the core register set.
    #[error("Unknown register number {0}")]
    UnknownRegister(usize),
}
