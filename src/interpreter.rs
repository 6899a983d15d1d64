//! Interpreter (component F): the dispatch core that walks a Block's
//! synthetic-code stream, executing hoisted ops directly and delegating to
//! the retained per-instruction 68k core for [`SynthOp::Generic`].
//!
//! Real direct-threaded runtimes dispatch by jumping through a table of
//! label addresses; this crate's dispatch is a `match` over [`SynthOp`]
//! (§9 Design Notes, resolved in `SPEC_FULL.md` §4.F). A Block's code is
//! cloned out of the store before it runs so the dispatch loop never holds
//! a borrow of [`BlockStore`] across calls that also need to mutate it
//! (translating a newly discovered target, bumping a call counter).

use crate::block::{Block, BlockId};
use crate::block_store::BlockStore;
use crate::callback::CallbackTable;
use crate::core::cpu::{CpuCore, CFLAG_SET, NFLAG_SET, VFLAG_SET, XFLAG_SET};
use crate::core::memory::AddressBus;
use crate::core::types::{Size, StepResult};
use crate::interrupt::InterruptController;
use crate::synth::{AmodeSlot, SynthOp, SynthWord};
use crate::translator;

/// Depth of the shadow ring RTS consults before falling back to a full
/// Block-store lookup (§4.F).
const FAST_JSR_RING_SIZE: usize = 8;

/// What happened at the end of a dispatch-loop turn.
enum RunOutcome {
    /// Keep running; resume translation/dispatch at this guest address.
    /// The caller still needs a Block-store lookup to continue.
    Continue(u32),
    /// Keep running at this already-resolved Block, skipping the lookup
    /// `Continue` would otherwise need (JSR/RTS via the fast-JSR ring).
    ContinueBlock(BlockId),
    /// `SynthOp::ExitEmulator` was reached.
    Exit,
    /// The debugger hook asked execution to stop.
    Breakpoint(u32),
    /// The guest executed STOP and no pending interrupt can wake it.
    Stopped(u32),
}

/// Reason [`Interpreter::execute`] returned to its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    ExitEmulator,
    Breakpoint(u32),
    Stopped(u32),
}

pub struct Interpreter {
    pub blocks: BlockStore,
    pub callbacks: CallbackTable,
    pub interrupts: InterruptController,
    amode_p: u32,
    reversed_amode_p: u32,
    jsr_ring: [Option<(u32, BlockId)>; FAST_JSR_RING_SIZE],
    jsr_ring_next: usize,
    debugger: Option<Box<dyn FnMut(&mut CpuCore, u32) -> bool>>,
    next_breakpoint: Option<u32>,
}

impl Interpreter {
    pub fn new(blocks: BlockStore, callbacks: CallbackTable, interrupts: InterruptController) -> Self {
        Self {
            blocks,
            callbacks,
            interrupts,
            amode_p: 0,
            reversed_amode_p: 0,
            jsr_ring: [None; FAST_JSR_RING_SIZE],
            jsr_ring_next: 0,
            debugger: None,
            next_breakpoint: None,
        }
    }

    /// Install a debugger hook, called once per `SynthOp::Debugger` (only
    /// emitted by a translator that hoists a breakpoint at a given address;
    /// this crate's `translator` does not emit it, so this hook only fires
    /// for Blocks a caller constructs by hand). Return `true` to stop.
    pub fn set_debugger(&mut self, hook: Box<dyn FnMut(&mut CpuCore, u32) -> bool>) {
        self.debugger = Some(hook);
    }

    /// Stop `execute` the next time dispatch reaches this guest address, via
    /// a plain address comparison at each Block boundary rather than a
    /// translated-in breakpoint op. `None` clears it.
    pub fn set_next_breakpoint(&mut self, addr: Option<u32>) {
        self.next_breakpoint = addr;
    }

    fn amode_slot_mut(&mut self, slot: AmodeSlot) -> &mut u32 {
        match slot {
            AmodeSlot::Normal => &mut self.amode_p,
            AmodeSlot::Reversed => &mut self.reversed_amode_p,
        }
    }

    fn amode_slot(&self, slot: AmodeSlot) -> u32 {
        match slot {
            AmodeSlot::Normal => self.amode_p,
            AmodeSlot::Reversed => self.reversed_amode_p,
        }
    }

    /// Find (translating if necessary) the Block starting at `guest_pc`. A
    /// callback magic address resolves to a one-op `Callback` Block instead
    /// of being translated out of guest memory, which is zeroed there.
    fn block_for<B: AddressBus>(&mut self, bus: &mut B, guest_pc: u32) -> BlockId {
        if let Some(id) = self.blocks.lookup_fast(guest_pc) {
            return id;
        }
        if let Some(id) = self.blocks.lookup_slow(guest_pc) {
            return id;
        }
        let block = if self.callbacks.is_callback_address(guest_pc) {
            Block::new(guest_pc, 2, vec![SynthWord::Op(SynthOp::Callback { id: guest_pc })])
        } else {
            translator::translate(bus, guest_pc)
        };
        let id = self.blocks.insert(block);
        // Retire the single oldest Block if that push carried total Block
        // memory over the configured threshold (§4.D death queue policy).
        self.blocks.retire_if_over_threshold();
        id
    }

    /// Cache a JSR's `(return_addr, continuation_block)` pair for RTS to
    /// consult. `continuation_block` is the Block at `return_addr` itself
    /// (translated eagerly here), not the JSR's call target.
    fn jsr_ring_push(&mut self, return_addr: u32, continuation: BlockId) {
        self.jsr_ring[self.jsr_ring_next] = Some((return_addr, continuation));
        self.jsr_ring_next = (self.jsr_ring_next + 1) % FAST_JSR_RING_SIZE;
    }

    /// Look up `return_addr` in the ring, verifying the cached Block is
    /// still live and still starts where expected (it may have been
    /// destroyed and its slot reused since the JSR that cached it).
    fn jsr_ring_find<B: AddressBus>(&mut self, bus: &mut B, return_addr: u32) -> BlockId {
        for entry in self.jsr_ring.iter().flatten() {
            let (addr, id) = *entry;
            if addr == return_addr {
                let still_live = self
                    .blocks
                    .try_get(id)
                    .map(|block| block.guest_start_address == return_addr)
                    .unwrap_or(false);
                if still_live {
                    return id;
                }
            }
        }
        self.block_for(bus, return_addr)
    }

    /// Run guest code starting at `start_pc` until `ExitEmulator`, a
    /// breakpoint, or a STOP with nothing left to wake it.
    pub fn execute<B: AddressBus>(&mut self, cpu: &mut CpuCore, bus: &mut B, start_pc: u32) -> ExitReason {
        let mut id = self.block_for(bus, start_pc);
        loop {
            if Some(self.blocks.get(id).guest_start_address) == self.next_breakpoint {
                let at = self.blocks.get(id).guest_start_address;
                return ExitReason::Breakpoint(at);
            }
            match self.run_block(cpu, bus, id) {
                RunOutcome::Continue(next_pc) => id = self.block_for(bus, next_pc),
                RunOutcome::ContinueBlock(next_id) => id = next_id,
                RunOutcome::Exit => return ExitReason::ExitEmulator,
                RunOutcome::Breakpoint(at) => return ExitReason::Breakpoint(at),
                RunOutcome::Stopped(at) => return ExitReason::Stopped(at),
            }
        }
    }

    fn run_block<B: AddressBus>(&mut self, cpu: &mut CpuCore, bus: &mut B, id: BlockId) -> RunOutcome {
        let block_start = self.blocks.get(id).guest_start_address;
        let block_end = self.blocks.get(id).guest_range().end;
        let code = self.blocks.get(id).synthetic_code.clone();

        let read_operand = |code: &[SynthWord], at: usize| -> u32 {
            match code[at] {
                SynthWord::Operand(v) => v,
                SynthWord::Op(_) => panic!("expected operand word at index {at}"),
            }
        };

        let mut i = 0;
        while i < code.len() {
            let op = match code[i] {
                SynthWord::Op(op) => op,
                // A leading guest-start-address word (the translator's
                // preamble marker) carries no independent meaning here.
                SynthWord::Operand(_) => {
                    i += 1;
                    continue;
                }
            };
            let operand_base = i + 1;
            i += 1 + op.operand_words();

            match op {
                SynthOp::ExitEmulator => return RunOutcome::Exit,

                SynthOp::Preamble => {
                    let redirected = self.interrupts.poll_at(cpu, bus, block_start);
                    if redirected != block_start {
                        return RunOutcome::Continue(redirected);
                    }
                }

                SynthOp::Debugger => {
                    if let Some(hook) = self.debugger.as_mut() {
                        if hook(cpu, block_start) {
                            return RunOutcome::Breakpoint(block_start);
                        }
                    }
                }

                SynthOp::CountExecution => {
                    self.blocks.get_mut(id).num_times_called += 1;
                }

                SynthOp::AmodeIndirect { reg, slot } => {
                    let addr = cpu.a(reg as usize);
                    *self.amode_slot_mut(slot) = addr;
                }

                SynthOp::AmodePreDecrement { reg, size, slot } => {
                    let delta = if reg == 7 && size == Size::Byte {
                        2
                    } else {
                        size.bytes()
                    };
                    let new_addr = cpu.a(reg as usize).wrapping_sub(delta);
                    cpu.set_a(reg as usize, new_addr);
                    *self.amode_slot_mut(slot) = new_addr;
                }

                SynthOp::AmodeCleanup { reg, delta } => {
                    let new_addr = (cpu.a(reg as usize) as i64 + delta as i64) as u32;
                    cpu.set_a(reg as usize, new_addr);
                }

                SynthOp::AmodeDisplacement { reg, slot } => {
                    let disp = read_operand(&code, operand_base) as u16 as i16;
                    let addr = cpu.a(reg as usize).wrapping_add(disp as i32 as u32);
                    *self.amode_slot_mut(slot) = addr;
                }

                SynthOp::AmodeAbsoluteLong { slot } => {
                    let addr = read_operand(&code, operand_base);
                    *self.amode_slot_mut(slot) = addr;
                }

                SynthOp::Callback { id: magic_addr } => {
                    let next = self.callbacks.invoke(magic_addr, block_start);
                    return RunOutcome::Continue(next);
                }

                SynthOp::FastJsr { target, return_addr } => {
                    cpu.push_32(bus, return_addr);
                    let continuation_id = self.block_for(bus, return_addr);
                    self.jsr_ring_push(return_addr, continuation_id);
                    let target_id = self.block_for(bus, target);
                    return RunOutcome::ContinueBlock(target_id);
                }

                SynthOp::MoveImmediateToReg { is_addr, reg, size } => {
                    let imm = read_operand(&code, operand_base);
                    if is_addr {
                        let v = match size {
                            Size::Word => (imm as u16) as i16 as i32 as u32,
                            _ => imm,
                        };
                        cpu.set_a(reg as usize, v);
                    } else {
                        write_dreg_sized(cpu, reg as usize, imm, size);
                        set_move_flags(cpu, imm, size);
                    }
                }

                SynthOp::MoveFromAmodeToReg { reg, size } => {
                    let addr = self.amode_slot(AmodeSlot::Normal);
                    let value = match size {
                        Size::Byte => cpu.read_8(bus, addr) as u32,
                        Size::Word => cpu.read_16(bus, addr) as u32,
                        Size::Long => cpu.read_32(bus, addr),
                    };
                    write_dreg_sized(cpu, reg as usize, value, size);
                    set_move_flags(cpu, value, size);
                }

                SynthOp::AddImmediateToReg { reg, size } => {
                    let imm = read_operand(&code, operand_base);
                    let old = cpu.d(reg as usize);
                    let (sum, carry, overflow) = add_with_flags(old, imm, size);
                    let mask = size.mask();
                    let new_full = (old & !mask) | sum;
                    cpu.set_d(reg as usize, new_full);
                    cpu.x_flag = if carry { XFLAG_SET } else { 0 };
                    cpu.c_flag = if carry { CFLAG_SET } else { 0 };
                    cpu.v_flag = if overflow { VFLAG_SET } else { 0 };
                    cpu.n_flag = if sum & size.msb_mask() != 0 { NFLAG_SET } else { 0 };
                    cpu.not_z_flag = if sum == 0 { 0 } else { 1 };
                }

                SynthOp::JsrAbsoluteLong => {
                    let target = read_operand(&code, operand_base);
                    let return_addr = read_operand(&code, operand_base + 1);
                    cpu.push_32(bus, return_addr);
                    let continuation_id = self.block_for(bus, return_addr);
                    self.jsr_ring_push(return_addr, continuation_id);
                    let target_id = self.block_for(bus, target);
                    return RunOutcome::ContinueBlock(target_id);
                }

                SynthOp::Rts => {
                    let return_addr = cpu.pull_32(bus);
                    let target_id = self.jsr_ring_find(bus, return_addr);
                    return RunOutcome::ContinueBlock(target_id);
                }

                SynthOp::Branch { condition, target } => {
                    let taken = match condition {
                        None => true,
                        Some(cc) => cpu.test_condition(cc),
                    };
                    return RunOutcome::Continue(if taken { target } else { block_end });
                }

                SynthOp::Generic => {
                    let guest_addr = read_operand(&code, operand_base);
                    cpu.pc = guest_addr;
                    match cpu.step(bus) {
                        StepResult::Ok { .. } => {}
                        StepResult::AlineTrap { .. } => {
                            cpu.take_aline_exception(bus);
                        }
                        StepResult::FlineTrap { .. } => {
                            cpu.take_fline_exception(bus);
                        }
                        StepResult::TrapInstruction { trap_num } => {
                            cpu.take_trap_exception(bus, trap_num);
                        }
                        StepResult::Breakpoint { .. } => {
                            cpu.take_bkpt_exception(bus);
                        }
                        StepResult::IllegalInstruction { .. } => {
                            cpu.take_illegal_exception(bus);
                        }
                        StepResult::Stopped => return RunOutcome::Stopped(cpu.pc),
                    }
                    return RunOutcome::Continue(cpu.pc);
                }
            }
        }

        // A Block with no control-transfer op (shouldn't happen for
        // translator output, but a hand-built Block may omit one): fall
        // through to the next guest instruction.
        RunOutcome::Continue(block_end)
    }
}

fn write_dreg_sized(cpu: &mut CpuCore, reg: usize, value: u32, size: Size) {
    let old = cpu.d(reg);
    let new = match size {
        Size::Byte => (old & !0xFF) | (value & 0xFF),
        Size::Word => (old & !0xFFFF) | (value & 0xFFFF),
        Size::Long => value,
    };
    cpu.set_d(reg, new);
}

/// N/Z set from the truncated value, V and C cleared, X unaffected. Shared
/// by plain MOVE and the hoisted `MoveFromAmodeToReg`.
fn set_move_flags(cpu: &mut CpuCore, value: u32, size: Size) {
    let masked = value & size.mask();
    cpu.n_flag = if masked & size.msb_mask() != 0 { NFLAG_SET } else { 0 };
    cpu.not_z_flag = if masked == 0 { 0 } else { 1 };
    cpu.v_flag = 0;
    cpu.c_flag = 0;
}

fn add_with_flags(a: u32, b: u32, size: Size) -> (u32, bool, bool) {
    let mask = size.mask();
    let msb = size.msb_mask();
    let aa = a & mask;
    let bb = b & mask;
    let sum = aa.wrapping_add(bb) & mask;
    let carry = (aa as u64 + bb as u64) > mask as u64;
    let overflow = ((!(aa ^ bb)) & (aa ^ sum)) & msb != 0;
    (sum, carry, overflow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::CpuType;

    struct FlatBus {
        mem: Vec<u8>,
    }
    impl AddressBus for FlatBus {
        fn read_byte(&mut self, a: u32) -> u8 {
            self.mem[a as usize]
        }
        fn write_byte(&mut self, a: u32, v: u8) {
            self.mem[a as usize] = v;
        }
        fn read_word(&mut self, a: u32) -> u16 {
            u16::from_be_bytes([self.mem[a as usize], self.mem[a as usize + 1]])
        }
        fn write_word(&mut self, a: u32, v: u16) {
            let b = v.to_be_bytes();
            self.mem[a as usize] = b[0];
            self.mem[a as usize + 1] = b[1];
        }
        fn read_long(&mut self, a: u32) -> u32 {
            ((self.read_word(a) as u32) << 16) | self.read_word(a + 2) as u32
        }
        fn write_long(&mut self, a: u32, v: u32) {
            self.write_word(a, (v >> 16) as u16);
            self.write_word(a + 2, v as u16);
        }
    }

    fn bus() -> FlatBus {
        FlatBus {
            mem: vec![0u8; 0x10_0000],
        }
    }

    fn interp() -> Interpreter {
        Interpreter::new(
            BlockStore::new(64, usize::MAX),
            CallbackTable::new(),
            InterruptController::new(),
        )
    }

    fn cpu() -> CpuCore {
        let mut c = CpuCore::new();
        c.set_cpu_type(CpuType::M68000);
        c
    }

    #[test]
    fn move_l_immediate_sets_register_and_ccr() {
        let mut it = interp();
        let mut cpu = cpu();
        let mut b = bus();
        // MOVE.L #$2A,D3
        b.write_word(0x1000, 0x2000 | (3 << 9) | 0x3C);
        b.write_long(0x1002, 0x2A);
        let id = it.block_for(&mut b, 0x1000);
        match it.run_block(&mut cpu, &mut b, id) {
            RunOutcome::Continue(next) => {
                assert_eq!(cpu.d(3), 0x2A);
                assert_eq!(next, 0x1006);
                assert!(!cpu.flag_z());
                assert!(!cpu.flag_n());
            }
            _ => panic!("expected continue"),
        }
    }

    #[test]
    fn addi_b_updates_flags_and_register() {
        let mut it = interp();
        let mut cpu = cpu();
        let mut b = bus();
        // ADDI.B #1,D0 with D0 = 0xFF -> result 0x00, Z set, C/X set.
        cpu.set_d(0, 0xFF);
        b.write_word(0x2000, 0x0600);
        b.write_word(0x2002, 0x0001);
        let id = it.block_for(&mut b, 0x2000);
        match it.run_block(&mut cpu, &mut b, id) {
            RunOutcome::Continue(_) => {
                assert_eq!(cpu.d(0) & 0xFF, 0x00);
                assert!(cpu.flag_z());
                assert!(cpu.flag_c());
            }
            _ => panic!("expected continue"),
        }
    }

    #[test]
    fn branch_not_taken_falls_through_to_block_end() {
        let mut it = interp();
        let mut cpu = cpu();
        let mut b = bus();
        // BEQ.B +4, Z clear so it's not taken.
        cpu.not_z_flag = 1;
        b.write_word(0x3000, 0x6704);
        let id = it.block_for(&mut b, 0x3000);
        match it.run_block(&mut cpu, &mut b, id) {
            RunOutcome::Continue(next) => assert_eq!(next, 0x3002),
            _ => panic!("expected continue"),
        }
    }

    #[test]
    fn branch_taken_jumps_to_resolved_target() {
        let mut it = interp();
        let mut cpu = cpu();
        let mut b = bus();
        cpu.not_z_flag = 0; // Z set, BEQ taken
        b.write_word(0x3000, 0x6704);
        let id = it.block_for(&mut b, 0x3000);
        match it.run_block(&mut cpu, &mut b, id) {
            RunOutcome::Continue(next) => assert_eq!(next, 0x3006),
            _ => panic!("expected continue"),
        }
    }

    #[test]
    fn jsr_then_rts_round_trips_through_the_ring() {
        let mut it = interp();
        let mut cpu = cpu();
        let mut b = bus();
        cpu.set_sp(0x8000);
        b.write_word(0x4000, 0x4EB9); // JSR $5000.L
        b.write_long(0x4002, 0x5000);
        b.write_word(0x5000, 0x4E75); // RTS
        let id = it.block_for(&mut b, 0x4000);
        let target_id = match it.run_block(&mut cpu, &mut b, id) {
            RunOutcome::ContinueBlock(id) => id,
            _ => panic!("expected continue-block"),
        };
        assert_eq!(it.blocks.get(target_id).guest_start_address, 0x5000);
        let back_id = match it.run_block(&mut cpu, &mut b, target_id) {
            RunOutcome::ContinueBlock(id) => id,
            _ => panic!("expected continue-block"),
        };
        assert_eq!(it.blocks.get(back_id).guest_start_address, 0x4006);
    }

    #[test]
    fn block_for_retires_oldest_block_once_over_threshold() {
        let mut it = Interpreter::new(
            BlockStore::new(64, 2),
            CallbackTable::new(),
            InterruptController::new(),
        );
        let mut b = bus();
        b.write_word(0x1000, 0x4E71); // NOP, falls back to Generic
        b.write_word(0x2000, 0x4E71); // NOP, falls back to Generic
        let first = it.block_for(&mut b, 0x1000);
        it.block_for(&mut b, 0x2000);
        assert!(it.blocks.try_get(first).is_none(), "first Block should be retired");
    }

    #[test]
    fn exit_emulator_block_stops_the_loop() {
        let mut it = interp();
        it.blocks.insert(crate::magic::exit_emulator_block());
        let mut cpu = cpu();
        let mut b = bus();
        let reason = it.execute(&mut cpu, &mut b, crate::magic::EXIT_EMULATOR_ADDRESS);
        assert_eq!(reason, ExitReason::ExitEmulator);
    }
}
