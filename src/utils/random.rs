//! Random identifier generation

use rand::distributions::Alphanumeric;
use rand::Rng;

/// Source of random ASCII identifiers.
///
/// Lets callers swap in a deterministic generator, e.g. in tests.
pub trait RandomSource {
    /// Return a random alphanumeric string of exactly `len` characters.
    fn seq(&self, len: usize) -> String;
}

/// [`RandomSource`] backed by the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn seq(&self, len: usize) -> String {
        random_seq(len)
    }
}

/// Random string of `len` ASCII letters and digits.
pub fn random_seq(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| rng.sample(Alphanumeric) as char)
        .collect()
}
