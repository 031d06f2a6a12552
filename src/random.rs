//! Random number source used by the grain scheduler.

use rand::{rngs::SmallRng, RngCore, SeedableRng};

// -------------------------------------------------------------------------------------------------

/// Uniform random draws for distribution table lookups and stochastic grain masking.
///
/// Automatically implemented for all [`rand::RngCore`] impls, so any rand rng can be injected.
pub trait RandomSource: Send {
    /// A uniformly distributed 32-bit value.
    fn next_u32(&mut self) -> u32;

    /// A uniformly distributed value in range `[0, 1]`.
    fn next_unit(&mut self) -> f64 {
        self.next_u32() as f64 / u32::MAX as f64
    }

    /// A uniformly distributed index in range `[0, length)`.
    fn next_index(&mut self, length: usize) -> usize {
        ((self.next_u32() as u64 * length as u64) >> u32::BITS) as usize
    }
}

impl<R: RngCore + Send> RandomSource for R {
    fn next_u32(&mut self) -> u32 {
        RngCore::next_u32(self)
    }
}

// -------------------------------------------------------------------------------------------------

/// Default random source for grain synths: a small, fast rng, seeded from the OS.
pub fn default_random_source() -> Box<dyn RandomSource> {
    Box::new(SmallRng::from_os_rng())
}

// -------------------------------------------------------------------------------------------------
