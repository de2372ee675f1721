/*
MIT License

Copyright (c) 2025 debye-rs developers
*/

//! Flat triangular enumeration of unordered atom pairs
//!
//! The N(N-1)/2 unordered pairs (i, j) with i > j map to a linear index
//! k = i(i-1)/2 + j. The closed-form inverse lets any worker recompute
//! (i, j) from its local k plus a chunk offset without materializing a
//! pair list, which makes a contiguous index range the unit of work for
//! every multi-worker backend.

/// Total number of unordered pairs for `n_atoms` atoms
pub fn pair_count(n_atoms: usize) -> u64 {
    let n = n_atoms as u64;
    n * n.saturating_sub(1) / 2
}

#[inline]
fn triangle(i: u64) -> u64 {
    i * (i - 1) / 2
}

/// Decode a flat pair index into (i, j) with i > j
///
/// Uses the closed form i = floor((1 + sqrt(1 + 8k)) / 2) with an
/// integer fixup against square-root round-off.
#[inline]
pub fn decode(k: u64) -> (usize, usize) {
    let mut i = (((1.0 + (1.0 + 8.0 * k as f64).sqrt()) / 2.0).floor() as u64).max(1);
    while triangle(i) > k {
        i -= 1;
    }
    while triangle(i + 1) <= k {
        i += 1;
    }
    (i as usize, (k - triangle(i)) as usize)
}

/// Encode a pair (i, j), i > j, into its flat index
#[inline]
pub fn encode(i: usize, j: usize) -> u64 {
    debug_assert!(i > j);
    triangle(i as u64) + j as u64
}

/// One contiguous range of the flat pair-index space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairChunk {
    /// First flat index covered
    pub offset: u64,
    /// Number of pairs covered
    pub len: usize,
}

impl PairChunk {
    /// Chunk spanning the whole pair space of `n_atoms` atoms
    pub fn full(n_atoms: usize) -> Self {
        Self {
            offset: 0,
            len: pair_count(n_atoms) as usize,
        }
    }

    /// Flat index of the p-th pair in this chunk
    #[inline]
    pub fn flat(&self, p: usize) -> u64 {
        self.offset + p as u64
    }
}

/// Split `total` pairs into contiguous chunks of at most `chunk_pairs`
pub fn partition(total: u64, chunk_pairs: usize) -> Vec<PairChunk> {
    assert!(chunk_pairs > 0);
    let mut chunks = Vec::new();
    let mut offset = 0u64;
    while offset < total {
        let len = (total - offset).min(chunk_pairs as u64) as usize;
        chunks.push(PairChunk { offset, len });
        offset += len as u64;
    }
    chunks
}

/// Split `total` pairs into `workers` contiguous, nearly equal ranges
///
/// Used to spread the pair space across physical devices; empty ranges
/// are omitted.
pub fn partition_even(total: u64, workers: usize) -> Vec<PairChunk> {
    assert!(workers > 0);
    let base = total / workers as u64;
    let extra = (total % workers as u64) as usize;
    let mut chunks = Vec::new();
    let mut offset = 0u64;
    for w in 0..workers {
        let len = base + u64::from(w < extra);
        if len > 0 {
            chunks.push(PairChunk {
                offset,
                len: len as usize,
            });
            offset += len;
        }
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_count() {
        assert_eq!(pair_count(0), 0);
        assert_eq!(pair_count(1), 0);
        assert_eq!(pair_count(2), 1);
        assert_eq!(pair_count(100), 4950);
    }

    #[test]
    fn test_decode_first_pairs() {
        assert_eq!(decode(0), (1, 0));
        assert_eq!(decode(1), (2, 0));
        assert_eq!(decode(2), (2, 1));
        assert_eq!(decode(3), (3, 0));
        assert_eq!(decode(5), (3, 2));
    }

    #[test]
    fn test_round_trip_exhaustive() {
        let n = 65;
        for k in 0..pair_count(n) {
            let (i, j) = decode(k);
            assert!(j < i && i < n);
            assert_eq!(encode(i, j), k);
        }
    }

    #[test]
    fn test_round_trip_large_indices() {
        // Far beyond any exhaustive sweep; exercises the sqrt fixup
        for k in [
            1_000_000u64,
            999_999_999,
            4_999_999_999,
            (1u64 << 52) + 12345,
        ] {
            let (i, j) = decode(k);
            assert_eq!(encode(i, j), k);
        }
    }

    #[test]
    fn test_partition_covers_disjointly() {
        let total = pair_count(101);
        let chunks = partition(total, 1024);
        let mut expected = 0u64;
        for chunk in &chunks {
            assert_eq!(chunk.offset, expected);
            assert!(chunk.len <= 1024);
            expected += chunk.len as u64;
        }
        assert_eq!(expected, total);
    }

    #[test]
    fn test_partition_even() {
        let chunks = partition_even(10, 4);
        let lens: Vec<usize> = chunks.iter().map(|c| c.len).collect();
        assert_eq!(lens, vec![3, 3, 2, 2]);
        assert_eq!(chunks[3].offset + chunks[3].len as u64, 10);

        // More workers than work
        let chunks = partition_even(2, 8);
        assert_eq!(chunks.len(), 2);

        // No work at all
        assert!(partition_even(0, 4).is_empty());
    }
}
