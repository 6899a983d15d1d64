//! Interrupt controller (component H): a synchronous, polled model.
//!
//! Grounded directly on `runtime/interrupt.c` in the system this crate's
//! design is distilled from: `generate`/`poll_at` below are a line-for-line
//! port of `interrupt_generate`/`interrupt_process_any_pending`, adapted to
//! dispatch through the retained 68k exception machinery
//! (`CpuCore::take_exception`) instead of a bespoke `trap_direct`.

use std::sync::atomic::{AtomicI32, Ordering};

use crate::core::cpu::CpuCore;
use crate::core::memory::AddressBus;

/// "Something changed, re-check" sentinel value for the status word.
const STATUS_CHANGED: i32 = -1;
/// "Nothing pending" sentinel value for the status word.
const STATUS_UNCHANGED: i32 = i32::MAX;

/// Per-priority (1..7) pending flags plus the cross-context status sentinel.
///
/// The sentinel is an `AtomicI32` rather than a plain field: it is the one
/// piece of state in this otherwise single-threaded design (§5) that an
/// asynchronous host signal handler may write to from another OS-level
/// context while the emulator thread is mid-Block. `SeqCst` on both sides
/// is stronger than strictly required but keeps the one cross-context
/// channel trivially easy to reason about.
pub struct InterruptController {
    status: AtomicI32,
    pending: [bool; 8],
}

impl InterruptController {
    pub fn new() -> Self {
        Self {
            status: AtomicI32::new(STATUS_UNCHANGED),
            pending: [false; 8],
        }
    }

    /// Record priority `p` as pending. No-op outside 1..=7 (0 means "no
    /// interrupt", matching the 68k IPL encoding).
    pub fn generate(&mut self, priority: u8) {
        if (1..=7).contains(&priority) {
            self.pending[priority as usize] = true;
            self.status.store(STATUS_CHANGED, Ordering::SeqCst);
        }
    }

    /// True if any priority is currently pending, without consuming it.
    pub fn note_if_present(&self) -> bool {
        self.status.load(Ordering::SeqCst) != STATUS_UNCHANGED
    }

    /// Called once per Block entry. If nothing changed since the last poll,
    /// returns `pc` unchanged. Otherwise selects the highest pending
    /// priority that exceeds the current SR interrupt mask (priority 7 is
    /// NMI and is never masked), delivers it via the exception machinery,
    /// and returns the new guest PC.
    pub fn poll_at<B: AddressBus>(&mut self, cpu: &mut CpuCore, bus: &mut B, pc: u32) -> u32 {
        if self.status.load(Ordering::SeqCst) == STATUS_UNCHANGED {
            return pc;
        }
        self.status.store(STATUS_UNCHANGED, Ordering::SeqCst);

        let mask = ((cpu.int_mask >> 8) & 7) as u8;
        let priority = if self.pending[7] {
            Some(7u8)
        } else {
            (1..=6).rev().find(|&p| self.pending[p as usize] && p > mask)
        };

        let Some(priority) = priority else {
            return pc;
        };
        self.pending[priority as usize] = false;

        cpu.pc = pc;
        cpu.take_exception(bus, 24 + priority as u32);

        // The 68k exception sequence for an interrupt raises the SR
        // interrupt mask to the level just serviced; the generic
        // `take_exception` (shared with traps/faults, which don't do this)
        // doesn't, so it's applied here, after the old SR was already
        // stacked with its pre-interrupt mask.
        cpu.int_mask = (priority as u32) << 8;

        cpu.pc
    }
}

impl Default for InterruptController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::CpuType;

    struct FlatBus {
        mem: Vec<u8>,
    }

    impl AddressBus for FlatBus {
        fn read_byte(&mut self, addr: u32) -> u8 {
            self.mem[addr as usize]
        }
        fn write_byte(&mut self, addr: u32, value: u8) {
            self.mem[addr as usize] = value;
        }
        fn read_word(&mut self, addr: u32) -> u16 {
            u16::from_be_bytes([self.mem[addr as usize], self.mem[addr as usize + 1]])
        }
        fn write_word(&mut self, addr: u32, value: u16) {
            let b = value.to_be_bytes();
            self.mem[addr as usize] = b[0];
            self.mem[addr as usize + 1] = b[1];
        }
        fn read_long(&mut self, addr: u32) -> u32 {
            ((self.read_word(addr) as u32) << 16) | self.read_word(addr + 2) as u32
        }
        fn write_long(&mut self, addr: u32, value: u32) {
            self.write_word(addr, (value >> 16) as u16);
            self.write_word(addr + 2, value as u16);
        }
    }

    fn bus() -> FlatBus {
        FlatBus {
            mem: vec![0u8; 0x10_0000],
        }
    }

    #[test]
    fn generate_outside_range_is_ignored() {
        let mut ic = InterruptController::new();
        ic.generate(0);
        ic.generate(8);
        assert!(!ic.note_if_present());
    }

    #[test]
    fn poll_with_nothing_pending_returns_pc_unchanged() {
        let mut ic = InterruptController::new();
        let mut cpu = CpuCore::new();
        cpu.set_cpu_type(CpuType::M68000);
        let mut b = bus();
        assert_eq!(ic.poll_at(&mut cpu, &mut b, 0x4000), 0x4000);
    }

    #[test]
    fn priority_7_is_never_masked() {
        let mut ic = InterruptController::new();
        let mut cpu = CpuCore::new();
        cpu.set_cpu_type(CpuType::M68000);
        cpu.int_mask = 0x0700; // mask everything else
        cpu.vbr = 0;
        let mut b = bus();
        ic.generate(7);
        let new_pc = ic.poll_at(&mut cpu, &mut b, 0x4000);
        assert_ne!(new_pc, 0x4000);
        assert_eq!((cpu.int_mask >> 8) & 7, 7);
    }

    #[test]
    fn lower_priority_masked_is_not_delivered() {
        let mut ic = InterruptController::new();
        let mut cpu = CpuCore::new();
        cpu.set_cpu_type(CpuType::M68000);
        cpu.int_mask = 0x0500; // mask <=5
        let mut b = bus();
        ic.generate(4);
        let new_pc = ic.poll_at(&mut cpu, &mut b, 0x4000);
        assert_eq!(new_pc, 0x4000);
    }

    #[test]
    fn scenario_generate_priority_4_delivers_via_vector_28() {
        let mut ic = InterruptController::new();
        let mut cpu = CpuCore::new();
        cpu.set_cpu_type(CpuType::M68000);
        cpu.int_mask = 0x0300; // mask <=3
        cpu.vbr = 0;
        let mut b = bus();
        b.write_long(4 * 28, 0x0000_5000);
        ic.generate(4);
        let new_pc = ic.poll_at(&mut cpu, &mut b, 0x4000);
        assert_eq!(new_pc, 0x0000_5000);
        assert_eq!((cpu.int_mask >> 8) & 7, 4);
    }
}
