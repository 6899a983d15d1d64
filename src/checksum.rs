//! Block checksum / self-modifying-code defense (component I).
//!
//! A fold of the guest source bytes covering a Block's range, computed once
//! at translation time and recomputed on invalidation. This is purely an
//! optimization: correctness of the emulator does not depend on it, only the
//! amount of unnecessary retranslation does.

/// Fold `bytes` into a 32-bit checksum. The fold is a simple rotate-xor over
/// 32-bit words (matching the coarse, cheap-to-recompute folds the original
/// runtime used for this purpose); it is not a cryptographic checksum and
/// intentionally isn't one — the full byte range is still compared
/// implicitly by the caller re-running `fold` over the current bytes.
pub fn fold(bytes: &[u8]) -> u32 {
    let mut acc: u32 = 0;
    for chunk in bytes.chunks(4) {
        let mut word = [0u8; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        let w = u32::from_be_bytes(word);
        acc = acc.rotate_left(5) ^ w;
    }
    acc
}

/// Returns true if `bytes` still matches the checksum taken at translation
/// time (i.e. the Block is still valid and need not be destroyed).
pub fn matches(bytes: &[u8], checksum: u32) -> bool {
    fold(bytes) == checksum
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_bytes_checksum_equal() {
        let code = [0x70, 0x00, 0x4E, 0x75];
        assert!(matches(&code, fold(&code)));
    }

    #[test]
    fn modified_byte_changes_checksum() {
        let original = [0x70, 0x00, 0x4E, 0x75];
        let modified = [0x70, 0x01, 0x4E, 0x75];
        assert!(!matches(&modified, fold(&original)));
    }

    #[test]
    fn reload_of_identical_code_keeps_checksum() {
        let code = vec![0x20, 0x3C, 0x12, 0x34, 0x56, 0x78];
        let checksum = fold(&code);
        let reloaded = code.clone();
        assert!(matches(&reloaded, checksum));
    }
}
