//! Deterministic PRNG for reproducible shuffles and jitter.

/// Minimal xorshift64 PRNG.
///
/// Use a fixed, non-zero seed so test results are identical across runs.
pub struct Xorshift64(u64);

impl Xorshift64 {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self(seed.max(1))
    }

    pub fn next_u64(&mut self) -> u64 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        self.0
    }

    /// Returns `u64` in `[min, max)`. `max` must be greater than `min`.
    pub fn range_u64(&mut self, min: u64, max: u64) -> u64 {
        min + self.next_u64() % (max - min)
    }

    /// Fisher-Yates shuffle.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.range_u64(0, i as u64 + 1) as usize;
            items.swap(i, j);
        }
    }
}
