/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

use kvm_bindings::kvm_fpu;
use kvm_bindings::kvm_regs;
use kvm_bindings::kvm_sregs;

use super::VcpuFpu;
use super::VcpuRegs;
use super::VcpuSegments;
use crate::error::Error;

impl VcpuRegs {
    /// Capture a vcpu from the `KVM_GET_REGS`, `KVM_GET_SREGS` and
    /// `KVM_GET_FPU` results.
    pub fn from_kvm(regs: &kvm_regs, sregs: &kvm_sregs, fpu: &kvm_fpu) -> Self {
        VcpuRegs {
            rax: regs.rax,
            rbx: regs.rbx,
            rcx: regs.rcx,
            rdx: regs.rdx,
            rsi: regs.rsi,
            rdi: regs.rdi,
            rbp: regs.rbp,
            rsp: regs.rsp,
            r8: regs.r8,
            r9: regs.r9,
            r10: regs.r10,
            r11: regs.r11,
            r12: regs.r12,
            r13: regs.r13,
            r14: regs.r14,
            r15: regs.r15,
            rip: regs.rip,
            rflags: regs.rflags,
            segments: VcpuSegments {
                cs: sregs.cs.selector,
                ss: sregs.ss.selector,
                ds: sregs.ds.selector,
                es: sregs.es.selector,
                fs: sregs.fs.selector,
                gs: sregs.gs.selector,
            },
            fpu: VcpuFpu {
                st: fpu.fpr,
                fcw: fpu.fcw,
                fsw: fpu.fsw,
                // NB: kvm only keeps the abridged (fxsave) tag byte.
                ftw: fpu.ftwx as u16,
                fop: fpu.last_opcode,
                fip: fpu.last_ip,
                fdp: fpu.last_dp,
            },
        }
    }

    /// Write this state into structures fetched from kvm, ready for
    /// `KVM_SET_REGS`, `KVM_SET_SREGS` and `KVM_SET_FPU`.
    ///
    /// Only what gdb can see is overwritten: segment descriptors other than
    /// the selector, control registers and sse state are kept as they are.
    /// Nothing is modified if the tag word does not fit kvm's abridged byte.
    pub fn apply_to_kvm(
        &self,
        regs: &mut kvm_regs,
        sregs: &mut kvm_sregs,
        fpu: &mut kvm_fpu,
    ) -> Result<(), Error> {
        let ftwx = u8::try_from(self.fpu.ftw).map_err(|_| Error::OutOfRange {
            register: "ftag",
            value: self.fpu.ftw as u64,
        })?;

        regs.rax = self.rax;
        regs.rbx = self.rbx;
        regs.rcx = self.rcx;
        regs.rdx = self.rdx;
        regs.rsi = self.rsi;
        regs.rdi = self.rdi;
        regs.rbp = self.rbp;
        regs.rsp = self.rsp;
        regs.r8 = self.r8;
        regs.r9 = self.r9;
        regs.r10 = self.r10;
        regs.r11 = self.r11;
        regs.r12 = self.r12;
        regs.r13 = self.r13;
        regs.r14 = self.r14;
        regs.r15 = self.r15;
        regs.rip = self.rip;
        regs.rflags = self.rflags;

        sregs.cs.selector = self.segments.cs;
        sregs.ss.selector = self.segments.ss;
        sregs.ds.selector = self.segments.ds;
        sregs.es.selector = self.segments.es;
        sregs.fs.selector = self.segments.fs;
        sregs.gs.selector = self.segments.gs;

        fpu.fpr = self.fpu.st;
        fpu.fcw = self.fpu.fcw;
        fpu.fsw = self.fpu.fsw;
        fpu.ftwx = ftwx;
        fpu.last_opcode = self.fpu.fop;
        fpu.last_ip = self.fpu.fip;
        fpu.last_dp = self.fpu.fdp;
        Ok(())
    }
}
