//! Configuration surface (§1.1, §6).
//!
//! A plain constructor-argument struct gathered once at `Emulator::new`
//! time, matching the ambient-stack pattern observed in the broader example
//! pack (a `Config` struct with a `Default` impl) rather than scattering
//! magic numbers through the Block store and address-space constructors.

/// Which address-space mapping model `Emulator::new` should build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressSpaceKind {
    /// Single additive offset over a flat guest buffer of `len` bytes.
    SingleOffset { len: usize },
    /// Segmented mapping with `2^segment_bits` equal segments.
    Segmented { segment_bits: u32 },
}

impl Default for AddressSpaceKind {
    fn default() -> Self {
        AddressSpaceKind::SingleOffset { len: 0x0100_0000 }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub address_space: AddressSpaceKind,
    /// Which 68k family member the retained per-instruction core emulates.
    pub cpu_type: crate::core::types::CpuType,
    /// Hash-bucket count for the Block store; must be a power of two.
    pub hash_buckets: usize,
    /// Death-queue byte threshold before Blocks are retired. `usize::MAX`
    /// effectively disables retirement, matching the original's
    /// unbounded-in-practice default.
    pub death_queue_byte_threshold: usize,
    /// Whether `invalidate` recomputes checksums before destroying a Block.
    pub checksum_mode: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address_space: AddressSpaceKind::default(),
            cpu_type: crate::core::types::CpuType::default(),
            hash_buckets: crate::block_store::DEFAULT_HASH_BUCKETS,
            death_queue_byte_threshold: usize::MAX,
            checksum_mode: false,
        }
    }
}
