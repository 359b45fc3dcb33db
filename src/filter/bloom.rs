use super::FilterPolicy;

/// Bloom filter policy
/// Uses k hash functions to reduce false positive rate
/// Default: 10 bits per key gives ~1% false positive rate
#[derive(Debug, Clone, Copy)]
pub struct BloomFilterPolicy {
    bits_per_key: usize,
}

impl BloomFilterPolicy {
    /// Create a new Bloom filter policy
    /// bits_per_key: Number of bits to use per key (10 gives ~1% false positive rate)
    pub fn new(bits_per_key: usize) -> Self {
        BloomFilterPolicy { bits_per_key }
    }

    /// k = (m/n) * ln(2), clamped to [1, 30]
    fn num_hash_functions(bits_per_key: usize) -> usize {
        let k = (bits_per_key as f64 * 0.69) as usize;
        k.clamp(1, 30)
    }

    fn bloom_hash(data: &[u8]) -> u32 {
        let mut h = 0xbc9f1d34u32;
        for &b in data {
            h = h.wrapping_mul(0x9e3779b9).wrapping_add(b as u32);
        }
        h
    }
}

impl Default for BloomFilterPolicy {
    fn default() -> Self {
        Self::new(10)
    }
}

impl FilterPolicy for BloomFilterPolicy {
    fn name(&self) -> &str {
        "strata.BloomFilter"
    }

    fn create_filter(&self, keys: &[Vec<u8>]) -> Vec<u8> {
        if keys.is_empty() {
            // k = 0
            return vec![0];
        }

        // Minimum size to avoid false positives with small key sets
        let bits = (keys.len() * self.bits_per_key).max(64);
        let bytes = bits.div_ceil(8);
        let bits = bytes * 8;

        // Last byte stores k
        let mut filter = vec![0u8; bytes + 1];
        let k = Self::num_hash_functions(self.bits_per_key);
        filter[bytes] = k as u8;

        for key in keys {
            let h = Self::bloom_hash(key);
            let delta = h.rotate_right(17);

            for i in 0..k {
                let bit_pos = h.wrapping_add((i as u32).wrapping_mul(delta)) as usize % bits;
                filter[bit_pos / 8] |= 1 << (bit_pos % 8);
            }
        }

        filter
    }

    fn may_contain(&self, filter: &[u8], key: &[u8]) -> bool {
        if filter.len() < 2 {
            return false;
        }

        let bytes = filter.len() - 1;
        let bits = bytes * 8;
        let k = filter[bytes] as usize;

        if k > 30 {
            // Unknown encoding, treat as a match
            return true;
        }

        let h = Self::bloom_hash(key);
        let delta = h.rotate_right(17);

        for i in 0..k {
            let bit_pos = h.wrapping_add((i as u32).wrapping_mul(delta)) as usize % bits;
            if (filter[bit_pos / 8] & (1 << (bit_pos % 8))) == 0 {
                return false;
            }
        }

        true
    }
}
