//! Stable name and content hashing.
//!
//! Names (skins, animations, constants, node identifiers) hash to a
//! [`NameHash`] via FNV-1a 64. Batch keys fold heterogeneous bytes through
//! the incremental 32-bit [`Hash32`] state. Both must be identical across
//! processes and runs, which rules out `std::hash` (randomized per process).

use serde::{Deserialize, Serialize};

const FNV64_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV64_PRIME: u64 = 0x0000_0100_0000_01b3;
const FNV32_OFFSET: u32 = 0x811c_9dc5;
const FNV32_PRIME: u32 = 0x0100_0193;

/// 64-bit hash of a name. Opaque apart from equality; `NameHash::EMPTY`
/// is reserved for "no name".
#[derive(
    Copy, Clone, Debug, Default, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct NameHash(pub u64);

impl NameHash {
    pub const EMPTY: NameHash = NameHash(0);

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// Hash a name string. The empty string maps to [`NameHash::EMPTY`].
pub fn hash_name(name: &str) -> NameHash {
    if name.is_empty() {
        return NameHash::EMPTY;
    }
    let mut h = FNV64_OFFSET;
    for b in name.as_bytes() {
        h ^= u64::from(*b);
        h = h.wrapping_mul(FNV64_PRIME);
    }
    NameHash(h)
}

/// Incremental 32-bit content hash.
///
/// Chunk boundaries do not affect the result: feeding one buffer or the
/// same bytes split across several `update` calls yields the same key.
#[derive(Clone, Debug)]
pub struct Hash32 {
    state: u32,
}

impl Hash32 {
    pub fn new() -> Self {
        Self {
            state: FNV32_OFFSET,
        }
    }

    #[inline]
    pub fn update(&mut self, bytes: &[u8]) {
        for b in bytes {
            self.state ^= u32::from(*b);
            self.state = self.state.wrapping_mul(FNV32_PRIME);
        }
    }

    #[inline]
    pub fn finish(self) -> u32 {
        self.state
    }
}

impl Default for Hash32 {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_hash_is_stable_and_discriminating() {
        assert_eq!(hash_name("skin"), hash_name("skin"));
        assert_ne!(hash_name("skin"), hash_name("Skin"));
        assert_ne!(hash_name("cursor"), hash_name("playback_rate"));
        assert_eq!(hash_name(""), NameHash::EMPTY);
    }

    #[test]
    fn content_hash_ignores_chunking() {
        let mut one = Hash32::new();
        one.update(b"material+blend+constants");

        let mut split = Hash32::new();
        split.update(b"material+");
        split.update(b"blend+");
        split.update(b"constants");

        assert_eq!(one.finish(), split.finish());
    }

    #[test]
    fn content_hash_discriminates() {
        let mut a = Hash32::new();
        a.update(&1u64.to_le_bytes());
        let mut b = Hash32::new();
        b.update(&2u64.to_le_bytes());
        assert_ne!(a.finish(), b.finish());
    }
}
