//! Deterministic random number generation.
//!
//! RULE: Nothing in the generator may call any platform RNG.
//! All randomness flows through RandomSource instances handed in
//! by the caller, normally derived from one master seed via RngBank.
//!
//! The generator draws from two streams, seeded deterministically
//! from (master_seed XOR slot_index):
//!   - Uniform:  identity fields, jitter, catalog picks, gaps, ids.
//!   - Weighted: categorical draws over probability tables.
//!
//! Each stream is fully reproducible in isolation, so adding a draw to
//! one stream never shifts the other.

use rand::{Rng, RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;

/// The random operations the synthesis engine needs.
///
/// Tests supply stub implementations to pin boundary behaviour.
pub trait RandomSource {
    /// Integer in `[lo, hi]`, both ends inclusive.
    fn uniform_int(&mut self, lo: i64, hi: i64) -> i64;

    /// Float in `[lo, hi]`.
    fn uniform_real(&mut self, lo: f64, hi: f64) -> f64;

    /// Index into `weights`, drawn proportionally to each weight.
    fn weighted_index(&mut self, weights: &[f64]) -> usize;

    /// Raw bits for opaque identifiers.
    fn next_u64(&mut self) -> u64;
}

impl<'r> dyn RandomSource + 'r {
    /// Uniform pick from a non-empty slice.
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        assert!(!items.is_empty(), "choose() on empty slice");
        let idx = self.uniform_int(0, items.len() as i64 - 1) as usize;
        &items[idx]
    }

    /// Weighted pick from `(value, weight)` pairs. Returns None when empty.
    pub fn weighted_choice<'a, T>(&mut self, pairs: &'a [(T, f64)]) -> Option<&'a T> {
        if pairs.is_empty() {
            return None;
        }
        let weights: Vec<f64> = pairs.iter().map(|(_, w)| *w).collect();
        let idx = self.weighted_index(&weights);
        pairs.get(idx).map(|(v, _)| v)
    }

    /// Bernoulli trial with p = 0.5.
    pub fn coin_flip(&mut self) -> bool {
        self.uniform_int(0, 1) == 1
    }

    /// `len` lowercase hex characters drawn from the raw bit stream.
    pub fn hex_token(&mut self, len: usize) -> String {
        let mut bytes = [0u8; 16];
        bytes[..8].copy_from_slice(&self.next_u64().to_le_bytes());
        bytes[8..].copy_from_slice(&self.next_u64().to_le_bytes());
        let id = uuid::Builder::from_random_bytes(bytes).into_uuid();
        let mut hex = id.simple().to_string();
        hex.truncate(len.min(32));
        hex
    }
}

/// A named, deterministic RNG for a single stream.
pub struct StreamRng {
    pub name: &'static str,
    inner: Pcg64Mcg,
}

impl StreamRng {
    /// Create a stream RNG from the master seed and a stable
    /// slot index. The index must never change once assigned.
    pub fn new(master_seed: u64, slot_index: u64) -> Self {
        let derived_seed = master_seed ^ (slot_index.wrapping_mul(0x9e37_79b9_7f4a_7c15));
        Self {
            name: "unnamed",
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }
}

impl RandomSource for StreamRng {
    fn uniform_int(&mut self, lo: i64, hi: i64) -> i64 {
        if hi <= lo {
            return lo;
        }
        self.inner.gen_range(lo..=hi)
    }

    fn uniform_real(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    fn weighted_index(&mut self, weights: &[f64]) -> usize {
        let total: f64 = weights.iter().filter(|w| **w > 0.0).sum();
        if weights.is_empty() || total <= 0.0 {
            return 0;
        }
        let roll = self.next_f64() * total;
        let mut cumulative = 0.0;
        let mut last_positive = 0;
        for (i, &w) in weights.iter().enumerate() {
            if w <= 0.0 {
                continue;
            }
            last_positive = i;
            cumulative += w;
            if roll < cumulative {
                return i;
            }
        }
        // Float accumulation can leave roll a hair above the final sum.
        last_positive
    }

    fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }
}

/// All stream RNGs for a single run, indexed by stable slot.
pub struct RngBank {
    master_seed: u64,
}

impl RngBank {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn for_stream(&self, slot: StreamSlot) -> StreamRng {
        StreamRng::new(self.master_seed, slot as u64).with_name(slot.name())
    }
}

/// Stable stream slot assignments.
/// NEVER reorder or remove entries, only append.
/// Reordering changes every stream's seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum StreamSlot {
    Uniform = 0,
    Weighted = 1,
}

impl StreamSlot {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Uniform => "uniform",
            Self::Weighted => "weighted",
        }
    }
}

/// The two streams every synthesis step draws from.
pub struct RandomStreams {
    pub uniform: Box<dyn RandomSource>,
    pub weighted: Box<dyn RandomSource>,
}

impl RandomStreams {
    /// Both streams derived from one master seed.
    pub fn seeded(seed: u64) -> Self {
        let bank = RngBank::new(seed);
        Self {
            uniform: Box::new(bank.for_stream(StreamSlot::Uniform)),
            weighted: Box::new(bank.for_stream(StreamSlot::Weighted)),
        }
    }

    /// Wire in arbitrary sources, e.g. stubs in tests.
    pub fn from_sources(uniform: Box<dyn RandomSource>, weighted: Box<dyn RandomSource>) -> Self {
        Self { uniform, weighted }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_int_is_inclusive_and_bounded() {
        let mut rng = RngBank::new(7).for_stream(StreamSlot::Uniform);
        let mut seen_lo = false;
        let mut seen_hi = false;
        for _ in 0..2_000 {
            let v = rng.uniform_int(-10, 15);
            assert!((-10..=15).contains(&v), "out of range: {v}");
            seen_lo |= v == -10;
            seen_hi |= v == 15;
        }
        assert!(seen_lo && seen_hi, "both bounds should be reachable");
    }

    #[test]
    fn weighted_index_never_picks_zero_weight() {
        let mut rng = RngBank::new(99).for_stream(StreamSlot::Weighted);
        for _ in 0..5_000 {
            let idx = rng.weighted_index(&[0.7, 0.3, 0.0]);
            assert!(idx < 2, "zero-weight entry picked");
        }
    }

    #[test]
    fn streams_are_independent_of_each_other() {
        let bank = RngBank::new(12345);
        let mut a = bank.for_stream(StreamSlot::Uniform);
        let mut b = bank.for_stream(StreamSlot::Weighted);
        let seq_a: Vec<u64> = (0..8).map(|_| a.next_u64()).collect();
        let seq_b: Vec<u64> = (0..8).map(|_| b.next_u64()).collect();
        assert_ne!(seq_a, seq_b, "slots must derive distinct seeds");
    }

    #[test]
    fn hex_token_has_requested_length() {
        let mut streams = RandomStreams::seeded(1);
        let token = streams.uniform.hex_token(12);
        assert_eq!(token.len(), 12);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
