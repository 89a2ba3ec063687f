//! Deterministic hashing of state valuations.
//!
//! FNV-1a over the grounded id and tagged bit pattern of every set
//! entry. Not cryptographic; used to compare rollouts for determinism.

use rddl_core::{GroundId, Value};

/// FNV-1a offset basis for 64-bit.
const FNV_OFFSET: u64 = 0xcbf29ce484222325;
/// FNV-1a prime for 64-bit.
const FNV_PRIME: u64 = 0x00000100000001B3;

#[inline]
fn fnv1a_u64(mut hash: u64, v: u64) -> u64 {
    for &b in &v.to_le_bytes() {
        hash = (hash ^ b as u64).wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Hash a sequence of `(id, value)` entries.
///
/// Order matters. An empty sequence hashes to the offset basis.
pub fn valuation_hash(entries: impl IntoIterator<Item = (GroundId, Value)>) -> u64 {
    let mut hash = FNV_OFFSET;
    for (id, value) in entries {
        hash = fnv1a_u64(hash, u64::from(id.0));
        hash = fnv1a_u64(hash, value.to_bits());
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_hash_is_offset_basis() {
        assert_eq!(valuation_hash([]), FNV_OFFSET);
    }

    #[test]
    fn values_and_positions_both_matter() {
        let a = valuation_hash([(GroundId(0), Value::Real(1.0))]);
        let b = valuation_hash([(GroundId(0), Value::Real(2.0))]);
        let c = valuation_hash([(GroundId(1), Value::Real(1.0))]);
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn tags_are_distinguished() {
        let int = valuation_hash([(GroundId(0), Value::Int(1))]);
        let boolean = valuation_hash([(GroundId(0), Value::Bool(true))]);
        assert_ne!(int, boolean);
    }
}
