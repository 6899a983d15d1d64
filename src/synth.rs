//! Synthetic opcode format (§6): the intermediate representation a [`Block`]'s
//! body is made of.
//!
//! Real direct-threaded interpreters make each synthetic opcode the address
//! of a host code fragment and dispatch by jumping through it. Rust has no
//! portable way to take a label's address, so per the spec's explicitly
//! sanctioned fallback (§9 Design Notes) this crate represents a synthetic
//! opcode as an enum (the integer token) and dispatches with `match` in
//! [`crate::interpreter`]. The shape is preserved: a flat word stream with
//! embedded immediate operands and hoisted addressing-mode results.
//!
//! [`Block`]: crate::block::Block

use crate::core::types::Size;

/// Which per-CPU addressing-mode result slot a hoisted amode-compute opcode
/// fills. Most instructions read `Normal`; two-operand instructions whose
/// destination is the left-hand operand read `Reversed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmodeSlot {
    Normal,
    Reversed,
}

/// A single word of a Block's synthetic code stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthWord {
    Op(SynthOp),
    /// An embedded 32-bit operand (displacement, absolute address, or
    /// immediate literal) pasted into the stream by the translator.
    Operand(u32),
}

/// The dispatch token catalog. Reserved low-numbered tokens are the
/// meta-operations every Block may use regardless of which guest
/// instructions it translates; `Generic` is the catch-all that routes to the
/// full per-instruction 68k core for anything not given a hoisted fast path
/// (see `translator` module docs for the exact hoisted list).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthOp {
    /// Reserved. Exit emulator. Numeric value 0 in the original catalog;
    /// the only clean way out of `execute`.
    ExitEmulator,
    /// Reserved. Preamble NOP landed on at Block entry; this is where the
    /// once-per-Block interrupt poll (§4.H) happens.
    Preamble,
    /// Reserved. Debugger breakpoint/single-step hook.
    Debugger,
    /// Reserved. Counts this Block's execution. Drives optional native
    /// recompilation, which this crate does not implement.
    CountExecution,

    /// Hoisted amode-compute: Address Register Indirect / Postincrement.
    /// Modes 2/3 share a body; postincrement's cleanup is a separate op.
    AmodeIndirect { reg: u8, slot: AmodeSlot },
    /// Hoisted amode-compute: Address Register Indirect with Pre-Decrement
    /// (mode 4). `size` determines the pre-decrement amount (byte writes to
    /// A7 decrement by 2, per 68k stack-alignment rules).
    AmodePreDecrement {
        reg: u8,
        size: Size,
        slot: AmodeSlot,
    },
    /// Cleanup opcode following a postincrement/predecrement instruction
    /// body: adjusts the address register by `delta` bytes.
    AmodeCleanup { reg: u8, delta: i32 },
    /// Hoisted amode-compute: Address Register Indirect with Displacement
    /// (mode 5); the 16-bit displacement follows as the next `Operand` word.
    AmodeDisplacement { reg: u8, slot: AmodeSlot },
    /// Hoisted amode-compute: Absolute Long (xxx).L; the address follows as
    /// the next `Operand` word.
    AmodeAbsoluteLong { slot: AmodeSlot },

    /// Reserved. Callback dispatch (§4.G): saves CPU state, invokes the
    /// installed host function, reloads state, and dispatches to the
    /// returned guest PC.
    Callback { id: u32 },
    /// Reserved. Fast-JSR (§4.F): records `(return_addr, target)` in the
    /// recent-JSR ring and jumps directly to `target` without a hash lookup.
    FastJsr { target: u32, return_addr: u32 },

    /// MOVE(A).{B,W,L} #imm,<Dn|An>: the immediate (byte/word/long alike)
    /// follows as a single 32-bit `Operand` word.
    MoveImmediateToReg { is_addr: bool, reg: u8, size: Size },
    /// MOVE.{B,W,L} <ea>,<Dn>: moves from the resolved `amode_p` slot into a
    /// data register, setting N/Z/V=0/C=0.
    MoveFromAmodeToReg { reg: u8, size: Size },
    /// ADDI.{B,W,L} #imm,Dn: the immediate follows as `Operand` word(s).
    AddImmediateToReg { reg: u8, size: Size },

    /// JSR (xxx).L: absolute long target, then the guest return address,
    /// follow as two `Operand` words.
    JsrAbsoluteLong,
    /// RTS: pulls the return address; consults the recent-JSR ring before
    /// falling back to a Block-store hash lookup.
    Rts,
    /// Bcc / BRA with an 8-bit displacement pre-resolved to an absolute
    /// target address at translation time (`Operand` word). `condition ==
    /// None` means unconditional (BRA).
    Branch { condition: Option<u8>, target: u32 },

    /// Catch-all: delegate to the full per-instruction 68k decoder/executor.
    /// The instruction's own guest address follows as `Operand`, so the
    /// interpreter can point the retained core at it and let it re-fetch and
    /// decode the real opcode bytes out of guest memory. This also lets a
    /// `Generic` op sit inside a checksummed magic Block (`magic::rte_block`)
    /// without the stream and guest memory disagreeing about its encoding.
    Generic,
}

impl SynthOp {
    /// How many `Operand` words (beyond this op's own word) immediately
    /// follow it in the stream, mirroring `INCREMENT_CODE(n)` in the
    /// original catalog.
    pub fn operand_words(&self) -> usize {
        match self {
            SynthOp::JsrAbsoluteLong => 2,
            SynthOp::AmodeDisplacement { .. }
            | SynthOp::AmodeAbsoluteLong { .. }
            | SynthOp::MoveImmediateToReg { .. }
            | SynthOp::AddImmediateToReg { .. }
            | SynthOp::Branch { .. }
            | SynthOp::Generic => 1,
            _ => 0,
        }
    }
}
