/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

use super::VcpuFpu;
use super::VcpuRegs;
use super::VcpuSegments;
use super::FXSAVE_ST_SIZE;
use crate::regs::FPU_REGS;

// NB: st from `libc::user_fpregs_struct' is four u32s per slot.
fn st_from_u32s(st_space: &[u32; 32]) -> [[u8; FXSAVE_ST_SIZE]; FPU_REGS] {
    let mut st = [[0u8; FXSAVE_ST_SIZE]; FPU_REGS];
    for (slot, words) in st.iter_mut().zip(st_space.chunks_exact(4)) {
        for (bytes, word) in slot.chunks_exact_mut(4).zip(words) {
            bytes.copy_from_slice(&word.to_le_bytes());
        }
    }
    st
}

fn st_to_u32s(st: &[[u8; FXSAVE_ST_SIZE]; FPU_REGS], st_space: &mut [u32; 32]) {
    for (words, slot) in st_space.chunks_exact_mut(4).zip(st.iter()) {
        for (word, bytes) in words.iter_mut().zip(slot.chunks_exact(4)) {
            *word = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        }
    }
}

impl VcpuRegs {
    /// Capture a stopped tracee from `PTRACE_GETREGS` and `PTRACE_GETFPREGS`.
    pub fn from_ptrace(regs: &libc::user_regs_struct, i387: &libc::user_fpregs_struct) -> Self {
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
            rflags: regs.eflags,
            segments: VcpuSegments {
                cs: regs.cs as u16,
                ss: regs.ss as u16,
                ds: regs.ds as u16,
                es: regs.es as u16,
                fs: regs.fs as u16,
                gs: regs.gs as u16,
            },
            // NB: fpu/fxsave layout, see
            // https://elixir.bootlin.com/linux/latest/source/arch/x86/include/asm/user_64.h#L51
            fpu: VcpuFpu {
                st: st_from_u32s(&i387.st_space),
                fcw: i387.cwd,
                fsw: i387.swd,
                ftw: i387.ftw,
                fop: i387.fop,
                fip: i387.rip,
                fdp: i387.rdp,
            },
        }
    }

    /// Write this state into structures fetched with `PTRACE_GETREGS` and
    /// `PTRACE_GETFPREGS`. `orig_rax`, the fs/gs bases, `mxcsr` and the xmm
    /// registers are left alone.
    pub fn apply_to_ptrace(
        &self,
        regs: &mut libc::user_regs_struct,
        i387: &mut libc::user_fpregs_struct,
    ) {
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
        regs.eflags = self.rflags;
        regs.cs = self.segments.cs as u64;
        regs.ss = self.segments.ss as u64;
        regs.ds = self.segments.ds as u64;
        regs.es = self.segments.es as u64;
        regs.fs = self.segments.fs as u64;
        regs.gs = self.segments.gs as u64;

        i387.cwd = self.fpu.fcw;
        i387.swd = self.fpu.fsw;
        i387.ftw = self.fpu.ftw;
        i387.fop = self.fpu.fop;
        i387.rip = self.fpu.fip;
        i387.rdp = self.fpu.fdp;
        st_to_u32s(&self.fpu.st, &mut i387.st_space);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::regs::CoreRegs;

    fn user_regs() -> libc::user_regs_struct {
        libc::user_regs_struct {
            r15: 0,
            r14: 0,
            r13: 0x7fffffffdd20,
            r12: 0x401040,
            rbp: 0,
            rbx: 0,
            r11: 0,
            r10: 0xc2,
            r9: 0x7ffff7f91860,
            r8: 0x4d,
            rax: 0x1c,
            rcx: 0,
            rdx: 0x7ffff7fe2f80,
            rsi: 0x7ffff7ffe6c8,
            rdi: 0x7ffff7ffe130,
            orig_rax: 0xffffffffffffffff,
            rip: 0x401040,
            cs: 0x33,
            eflags: 0x206,
            rsp: 0x7fffffffdd20,
            ss: 0x2b,
            fs_base: 0x7ffff7fcd540,
            gs_base: 0,
            ds: 0,
            es: 0,
            fs: 0,
            gs: 0,
        }
    }

    fn user_fpregs() -> libc::user_fpregs_struct {
        // NB: `padding` is private so we cannot use struct literal syntax.
        let mut i387: libc::user_fpregs_struct =
            unsafe { std::mem::MaybeUninit::zeroed().assume_init() };
        i387.cwd = 0x37f;
        i387.ftw = 0x80;
        i387.mxcsr = 0x1f80;
        i387.st_space[0] = 0x12345678;
        i387.st_space[1] = 0x87654321;
        i387.st_space[2] = 0xabcd;
        i387.xmm_space[0] = 0xff000000;
        i387
    }

    #[test]
    fn st_sanity() {
        let u32s: [u32; 32] = [
            0x12345678, 0x87654321, 0xabcd, 0, 0x34127856, 0x56781234, 0xcdab, 0, 0x11223344,
            0x44332211, 0xcadb, 0, 0x55667788, 0xaabbccdd, 0x1423, 0, 0x44332211, 0x11223344,
            0x5678, 0, 0xaabbccdd, 0xddccbbaa, 0x1234, 0, 0xabcdabcd, 0xdeadbeef, 0x9876, 0,
            0xdeadbeef, 0xdcbadcba, 0xac12, 0,
        ];
        let st = st_from_u32s(&u32s);
        assert_eq!(
            &st[0][..10],
            &[0x78, 0x56, 0x34, 0x12, 0x21, 0x43, 0x65, 0x87, 0xcd, 0xab]
        );
        let mut u32s_1 = [0u32; 32];
        st_to_u32s(&st, &mut u32s_1);
        assert_eq!(u32s, u32s_1);
    }

    #[test]
    fn ptrace_capture() {
        let native = VcpuRegs::from_ptrace(&user_regs(), &user_fpregs());
        let core_regs = CoreRegs::from_native(&native);
        assert_eq!(core_regs.regs[0], 0x1c);
        assert_eq!(core_regs.regs[3], 0x7ffff7fe2f80);
        assert_eq!(core_regs.regs[7], 0x7fffffffdd20);
        assert_eq!(core_regs.rip, 0x401040);
        assert_eq!(core_regs.eflags, 0x206);
        assert_eq!(core_regs.segments, [0x33, 0x2b, 0, 0, 0, 0]);
        assert_eq!(core_regs.x87.fctrl, 0x37f);
        assert_eq!(core_regs.x87.ftag, 0x80);
        assert_eq!(
            core_regs.st[0].as_bytes(),
            &[0x78, 0x56, 0x34, 0x12, 0x21, 0x43, 0x65, 0x87, 0xcd, 0xab]
        );
    }

    #[test]
    fn ptrace_apply_keeps_hidden_state() {
        let mut regs = user_regs();
        let mut i387 = user_fpregs();
        let mut core_regs = CoreRegs::from_native(&VcpuRegs::from_ptrace(&regs, &i387));
        core_regs.regs[0] = 0x3c;
        core_regs.segments[5] = 0x63;
        core_regs.x87.fop = 0x5d9;

        core_regs
            .to_native()
            .unwrap()
            .apply_to_ptrace(&mut regs, &mut i387);

        assert_eq!(regs.rax, 0x3c);
        assert_eq!(regs.gs, 0x63);
        assert_eq!(regs.orig_rax, 0xffffffffffffffff);
        assert_eq!(regs.fs_base, 0x7ffff7fcd540);
        assert_eq!(i387.fop, 0x5d9);
        assert_eq!(i387.mxcsr, 0x1f80);
        assert_eq!(i387.xmm_space[0], 0xff000000);
        assert_eq!(&i387.st_space[..4], &[0x12345678, 0x87654321, 0xabcd, 0]);
    }
}
