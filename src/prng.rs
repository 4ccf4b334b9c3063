//! SplitMix64 PRNG for stimulus draws and rule switching.
//!
//! SplitMix64 has a single u64 state word and a fully specified output
//! function, so a seed reproduces the identical stimulus sequence on every
//! platform and every crate version. The seed is written on
//! every trial record and a session must be replayable from it.
//!
//! Draws are addressed by `(seed, stream, index)` through [`SplitMix64::keyed`],
//! which makes draw `i` independent of how many draws came before it.

use crate::error::{Result, WcstError};

/// SplitMix64 PRNG with a single u64 state.
#[derive(Clone, Debug)]
pub struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    /// Create from seed.
    #[inline(always)]
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Generator positioned for draw `index` of `stream` under `seed`.
    pub fn keyed(seed: u64, stream: u64, index: u64) -> Self {
        let mut mixer = Self::new(seed ^ stream.rotate_left(32));
        let base = mixer.next_u64();
        Self::new(base ^ mix64(index.wrapping_add(0x632b_e59b_d9b4_e019)))
    }

    /// Generate next u64.
    #[inline(always)]
    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9e3779b97f4a7c15);
        mix64(self.state)
    }

    /// Uniform value in `0..n` via multiply-high. `n` must be non-zero.
    ///
    /// Bias is at most n / 2^64, far below anything measurable for n ≤ 64.
    #[inline(always)]
    pub fn below(&mut self, n: usize) -> usize {
        debug_assert!(n > 0);
        ((self.next_u64() as u128 * n as u128) >> 64) as usize
    }
}

#[inline(always)]
fn mix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
    z ^ (z >> 31)
}

/// Fresh seed from the OS-seeded thread RNG, for hosts that don't supply one.
pub fn generate_seed() -> u64 {
    rand::random::<u64>()
}

/// Parse a host-supplied seed: decimal, or hex with a `0x` prefix.
pub fn parse_seed(input: &str) -> Result<u64> {
    let trimmed = input.trim();
    let err = |reason: &str| WcstError::InvalidSeed {
        input: input.to_string(),
        reason: reason.to_string(),
    };
    if trimmed.is_empty() {
        return Err(err("empty"));
    }
    let parsed = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => trimmed.parse::<u64>(),
    };
    parsed.map_err(|e| err(&e.to_string()))
}
