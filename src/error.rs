//! Error handling (§7): typed host-side conditions a caller can reasonably
//! handle, as distinct from the "implementation bug" conditions that remain
//! log-and-panic (see module docs on `interpreter::Interpreter::execute`).

use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EmulatorError {
    #[error("trap vector {0} is out of range (0..64)")]
    TrapVectorOutOfRange(u8),
    #[error("trap vector {0} already has a handler installed")]
    TrapAlreadyInstalled(u8),
    #[error("trap vector {0} has no handler installed")]
    TrapNotInstalled(u8),
    #[error("the magic-address region is exhausted; no more callback slots available")]
    CallbackRegionExhausted,
    #[error("magic address {0:#x} has no callback installed")]
    CallbackNotInstalled(u32),
    #[error("guest address mapping failed: {0}")]
    AddressSpace(#[from] crate::addr_space::AddressSpaceError),
}
