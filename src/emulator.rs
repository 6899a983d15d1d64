//! External interfaces (§6): `Emulator` is the crate's entry point, wiring
//! guest memory, the CPU core, the translation cache, and the interrupt and
//! callback machinery into one runnable instance.

use crate::addr_space::{AddressSpace, AddressSpaceError, Segmented, SingleOffset};
use crate::block_store::BlockStore;
use crate::callback::{CallbackFn, CallbackTable};
use crate::config::{AddressSpaceKind, Config};
use crate::core::cpu::CpuCore;
use crate::core::memory::AddressBus;
use crate::error::EmulatorError;
use crate::interpreter::{ExitReason, Interpreter};
use crate::magic;

/// Reset value written to USP. Recognizably invalid so guest code that reads
/// SP before its own startup code sets it up fails loudly rather than
/// silently running against address 0 (§9 Open Questions, resolved).
pub const USP_RESET_SENTINEL: u32 = 0xDEAD_F00D;
/// Reset value written to MSP (68020+ only; unused on plain 68000/68010).
pub const MSP_RESET_SENTINEL: u32 = 0xDEAD_0666;

/// SP bank indices, matching `CpuCore::sp`'s documented layout
/// (`s_flag | ((s_flag >> 1) & m_flag)`).
const USP_INDEX: usize = 0;
const MSP_INDEX: usize = 6;

/// RAM-backed guest address space: an [`AddressSpace`] mapping plus the
/// byte buffer it maps into. Implements [`AddressBus`] so it can be handed
/// straight to the retained per-instruction core and to the interpreter.
pub struct GuestMemory {
    address_space: Box<dyn AddressSpace>,
    buffer: Vec<u8>,
}

impl GuestMemory {
    pub fn new(address_space: Box<dyn AddressSpace>) -> Self {
        let len = address_space.host_len();
        Self {
            address_space,
            buffer: vec![0u8; len],
        }
    }

    /// Map a host buffer offset back to a guest address; exposed for
    /// callers (debuggers, the segmented-remap miss path) that need the
    /// inverse direction directly rather than through a CPU access.
    pub fn host_to_guest(&mut self, host: usize) -> Result<u32, AddressSpaceError> {
        self.address_space.host_to_guest(host)
    }

    /// Read `len` bytes starting at `addr` without going through the
    /// [`AddressBus`] trait's `&mut self` contract. Safe to call from a
    /// plain `Fn` closure, which `BlockStore::invalidate`'s checksum
    /// recomputation needs (`guest_to_host` alone needs no mutation).
    pub fn read_bytes(&self, addr: u32, len: u32) -> Vec<u8> {
        (0..len)
            .map(|i| self.buffer[self.address_space.guest_to_host(addr + i)])
            .collect()
    }
}

impl AddressBus for GuestMemory {
    fn read_byte(&mut self, address: u32) -> u8 {
        self.buffer[self.address_space.guest_to_host(address)]
    }

    fn write_byte(&mut self, address: u32, value: u8) {
        let h = self.address_space.guest_to_host(address);
        self.buffer[h] = value;
    }

    fn read_word(&mut self, address: u32) -> u16 {
        u16::from_be_bytes([self.read_byte(address), self.read_byte(address + 1)])
    }

    fn write_word(&mut self, address: u32, value: u16) {
        let b = value.to_be_bytes();
        self.write_byte(address, b[0]);
        self.write_byte(address + 1, b[1]);
    }

    fn read_long(&mut self, address: u32) -> u32 {
        ((self.read_word(address) as u32) << 16) | self.read_word(address + 2) as u32
    }

    fn write_long(&mut self, address: u32, value: u32) {
        self.write_word(address, (value >> 16) as u16);
        self.write_word(address + 2, value as u16);
    }
}

pub struct Emulator {
    pub cpu: CpuCore,
    pub memory: GuestMemory,
    pub interp: Interpreter,
    checksum_mode: bool,
    /// Nesting depth of `execute`/`call_emulator` invocations (§5 resource
    /// lifecycle). A callback re-entering the guest via `call_emulator`
    /// bumps this past 1. Mirrors the original's counter for diagnostics.
    emulation_depth: u32,
}

impl Emulator {
    pub fn new(config: Config) -> Self {
        let address_space: Box<dyn AddressSpace> = match config.address_space {
            AddressSpaceKind::SingleOffset { len } => Box::new(SingleOffset::new(len)),
            AddressSpaceKind::Segmented { segment_bits } => Box::new(Segmented::new(segment_bits)),
        };
        let mut memory = GuestMemory::new(address_space);
        memory.write_word(magic::RTE_ADDRESS, magic::RTE_OPCODE);

        let mut cpu = CpuCore::new();
        cpu.set_cpu_type(config.cpu_type);
        cpu.set_sr(0x2000); // supervisor mode, interrupt mask 0 (all priorities enabled)
        cpu.sp[USP_INDEX] = USP_RESET_SENTINEL;
        cpu.sp[MSP_INDEX] = MSP_RESET_SENTINEL;

        let mut blocks = BlockStore::new(config.hash_buckets, config.death_queue_byte_threshold);
        blocks.insert(magic::exit_emulator_block());
        blocks.insert(magic::rte_block());

        let interp = Interpreter::new(blocks, CallbackTable::new(), crate::interrupt::InterruptController::new());

        log::info!(
            "emulator initialized: cpu={:?} address_space={:?}",
            config.cpu_type,
            config.address_space
        );

        Self {
            cpu,
            memory,
            interp,
            checksum_mode: config.checksum_mode,
            emulation_depth: 0,
        }
    }

    /// Run guest code starting at `start_pc` until `ExitEmulator`, a
    /// breakpoint, or an unwakeable STOP.
    pub fn execute(&mut self, start_pc: u32) -> ExitReason {
        self.emulation_depth += 1;
        log::trace!("execute({start_pc:#x}) entering at depth {}", self.emulation_depth);
        let reason = self.interp.execute(&mut self.cpu, &mut self.memory, start_pc);
        log::trace!("execute({start_pc:#x}) -> {reason:?}");
        self.emulation_depth -= 1;
        reason
    }

    /// Current nesting depth of `execute`/`call_emulator` invocations.
    pub fn emulation_depth(&self) -> u32 {
        self.emulation_depth
    }

    /// Call into guest code as a subroutine: push the exit-emulator magic
    /// address as the return address, then run from `guest_addr` until that
    /// address is reached (or any other exit condition fires first). Lets a
    /// host-side callback invoke guest code and get control back afterwards,
    /// rather than only ever entering guest code once at top level.
    pub fn call_emulator(&mut self, guest_addr: u32) -> ExitReason {
        self.cpu.push_32(&mut self.memory, magic::EXIT_EMULATOR_ADDRESS);
        self.execute(guest_addr)
    }

    pub fn callback_install(&mut self, func: CallbackFn, arg: u64) -> u32 {
        self.interp.callbacks.install(func, arg)
    }

    pub fn callback_remove(&mut self, magic_addr: u32) -> Result<(), EmulatorError> {
        self.interp.callbacks.remove(magic_addr)
    }

    pub fn trap_install_handler(&mut self, n: u8, func: CallbackFn, arg: u64) -> Result<u32, EmulatorError> {
        self.interp
            .callbacks
            .trap_install_handler(&mut self.memory, self.cpu.vbr, n, func, arg)
    }

    pub fn trap_remove_handler(&mut self, n: u8) -> Result<(), EmulatorError> {
        self.interp.callbacks.trap_remove_handler(n)
    }

    pub fn generate_interrupt(&mut self, priority: u8) {
        self.interp.interrupts.generate(priority);
    }

    /// Invalidate every Block overlapping `[addr, addr+bytes)`. Recomputes
    /// checksums before destroying a Block when `checksum_mode` is set
    /// (§6 Configuration surface); otherwise every overlapping Block goes.
    pub fn invalidate(&mut self, addr: u32, bytes: u32) -> usize {
        if self.checksum_mode {
            let memory = &self.memory;
            let read: &dyn Fn(u32, u32) -> Vec<u8> = &|a, l| memory.read_bytes(a, l);
            self.interp.blocks.invalidate(addr, bytes, Some(read))
        } else {
            self.interp.blocks.invalidate(addr, bytes, None)
        }
    }

    pub fn set_debugger(&mut self, hook: Box<dyn FnMut(&mut CpuCore, u32) -> bool>) {
        self.interp.set_debugger(hook);
    }

    pub fn set_next_breakpoint(&mut self, addr: Option<u32>) {
        self.interp.set_next_breakpoint(addr);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_emulator_sets_reset_sentinels_and_supervisor_mode() {
        let em = Emulator::new(Config::default());
        assert_eq!(em.cpu.sp[USP_INDEX], USP_RESET_SENTINEL);
        assert_eq!(em.cpu.sp[MSP_INDEX], MSP_RESET_SENTINEL);
        assert!(em.cpu.is_supervisor());
    }

    #[test]
    fn rte_magic_address_holds_the_real_opcode_bytes() {
        let mut em = Emulator::new(Config::default());
        assert_eq!(em.memory.read_word(magic::RTE_ADDRESS), magic::RTE_OPCODE);
    }

    #[test]
    fn execute_stops_at_exit_emulator_address() {
        let mut em = Emulator::new(Config::default());
        let reason = em.execute(magic::EXIT_EMULATOR_ADDRESS);
        assert_eq!(reason, ExitReason::ExitEmulator);
    }

    #[test]
    fn execute_runs_a_translated_block_then_exits() {
        let mut em = Emulator::new(Config::default());
        em.cpu.set_sp(0x0010_0000);
        // MOVE.L #$1,D0 then JSR to the exit-emulator magic address.
        em.memory.write_word(0x2000, 0x2000 | 0x3C);
        em.memory.write_long(0x2002, 1);
        em.memory.write_word(0x2006, 0x4EB9); // JSR (xxx).L
        em.memory.write_long(0x2008, magic::EXIT_EMULATOR_ADDRESS);
        let reason = em.execute(0x2000);
        assert_eq!(em.cpu.d(0), 1);
        assert_eq!(reason, ExitReason::ExitEmulator);
    }

    #[test]
    fn invalidate_without_checksum_destroys_overlapping_block() {
        let mut em = Emulator::new(Config::default());
        em.memory.write_word(0x3000, 0x2000 | 0x3C);
        em.memory.write_long(0x3002, 1);
        em.memory.write_word(0x3006, 0x4E75); // RTS, ends the block deterministically
        let block = crate::translator::translate(&mut em.memory, 0x3000);
        em.interp.blocks.insert(block);
        assert_eq!(em.invalidate(0x3000, 2), 1);
    }

    #[test]
    fn call_emulator_pushes_exit_emulator_as_return_address() {
        let mut em = Emulator::new(Config::default());
        em.cpu.set_sp(0x0010_0000);
        em.memory.write_word(0x4000, 0x4E75); // RTS, returns straight to EXIT_EMULATOR
        let reason = em.call_emulator(0x4000);
        assert_eq!(reason, ExitReason::ExitEmulator);
    }

    #[test]
    fn callback_install_then_invoke_roundtrip() {
        let mut em = Emulator::new(Config::default());
        let addr = em.callback_install(Box::new(|pc, _| pc + 10), 0);
        let next = em.interp.callbacks.invoke(addr, 0x5000);
        assert_eq!(next, 0x5010);
    }

    #[test]
    fn jsr_to_callback_invokes_host_func_once_then_resumes_on_following_instruction() {
        use std::cell::Cell;
        use std::rc::Rc;

        let mut em = Emulator::new(Config::default());
        em.cpu.set_sp(0x0010_0000);
        em.cpu.set_d(1, 0x1234_5678);

        let seen_pc = Rc::new(Cell::new(0u32));
        let seen_pc_cb = Rc::clone(&seen_pc);
        let call_count = Rc::new(Cell::new(0u32));
        let call_count_cb = Rc::clone(&call_count);
        let resume_addr = 0x2006;

        let cb_addr = em.callback_install(
            Box::new(move |pc, _arg| {
                seen_pc_cb.set(pc);
                call_count_cb.set(call_count_cb.get() + 1);
                resume_addr
            }),
            0,
        );

        em.memory.write_word(0x2000, 0x4EB9); // JSR (xxx).L
        em.memory.write_long(0x2002, cb_addr);
        em.memory.write_word(resume_addr, 0x2401); // MOVE.L D1,D2
        em.memory.write_word(resume_addr + 2, 0x4EB9); // JSR (xxx).L
        em.memory.write_long(resume_addr + 4, magic::EXIT_EMULATOR_ADDRESS);

        let reason = em.execute(0x2000);

        assert_eq!(seen_pc.get(), cb_addr);
        assert_eq!(call_count.get(), 1);
        assert_eq!(em.cpu.d(2), 0x1234_5678);
        assert_eq!(reason, ExitReason::ExitEmulator);
    }

    #[test]
    fn trap_install_writes_vbr_relative_vector_entry() {
        let mut em = Emulator::new(Config::default());
        em.cpu.vbr = 0x1000;
        let magic_addr = em
            .trap_install_handler(3, Box::new(|pc, _| pc), 0)
            .unwrap();
        assert_eq!(em.memory.read_long(0x1000 + 3 * 4), magic_addr);
    }
}
