use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// 2^-53, the spacing of f64 values in [0, 1) built from 53 random bits.
const UNIT_SCALE: f64 = 1.0 / (1u64 << 53) as f64;

/// Seeded random source for world generation.
///
/// Output depends only on the seed: ChaCha8 is value-stable across platforms,
/// and reals are built from raw `next_u64` bits rather than `rand`'s
/// distribution code, so independently built clients agree bit-for-bit.
#[derive(Debug, Clone)]
pub struct WorldRng {
    inner: ChaCha8Rng,
}

impl WorldRng {
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Uniform real in [0, 1).
    pub fn next_unit(&mut self) -> f64 {
        (self.inner.next_u64() >> 11) as f64 * UNIT_SCALE
    }

    /// Uniform real in [min, max).
    pub fn range(&mut self, min: f64, max: f64) -> f64 {
        self.next_unit() * (max - min) + min
    }
}
