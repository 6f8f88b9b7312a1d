//! Configuration hashing.
//!
//! FNV-1a over the binning axes, so a reader can check that stored output
//! was produced with the binning it expects. Not cryptographically secure.

use trackeff_engine::AxisSet;

/// FNV-1a offset basis for 64-bit.
const FNV_OFFSET: u64 = 0xcbf29ce484222325;
/// FNV-1a prime for 64-bit.
const FNV_PRIME: u64 = 0x00000100000001B3;

#[inline]
fn fnv1a_bytes(mut hash: u64, bytes: &[u8]) -> u64 {
    for &b in bytes {
        hash = (hash ^ u64::from(b)).wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Hash every axis of `axes`: name, bin count, and edge bits, in
/// [`AxisSet::named`] order.
pub fn config_hash(axes: &AxisSet) -> u64 {
    let mut hash = FNV_OFFSET;
    for a in axes.named() {
        hash = fnv1a_bytes(hash, a.name.as_bytes());
        hash = fnv1a_bytes(hash, &a.axis.bins().to_le_bytes());
        hash = fnv1a_bytes(hash, &a.axis.low().to_bits().to_le_bytes());
        hash = fnv1a_bytes(hash, &a.axis.high().to_bits().to_le_bytes());
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;
    use trackeff_axis::AxisDef;

    #[test]
    fn empty_input_is_offset_basis() {
        assert_eq!(fnv1a_bytes(FNV_OFFSET, &[]), FNV_OFFSET);
    }

    #[test]
    fn known_vector() {
        // FNV-1a 64 of "a".
        assert_eq!(fnv1a_bytes(FNV_OFFSET, b"a"), 0xaf63dc4c8601ec8c);
    }

    #[test]
    fn hash_is_deterministic() {
        assert_eq!(config_hash(&AxisSet::default()), config_hash(&AxisSet::default()));
    }

    #[test]
    fn any_axis_change_alters_hash() {
        let base = config_hash(&AxisSet::default());
        let mut axes = AxisSet::default();
        axes.phi = AxisDef::new(12, axes.phi.low(), axes.phi.high());
        assert_ne!(config_hash(&axes), base);
        let mut axes = AxisSet::default();
        axes.vertex_z = AxisDef::new(5, -30.0, 30.000001);
        assert_ne!(config_hash(&axes), base);
    }
}
