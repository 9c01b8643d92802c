pub mod random;

// Re-export common utilities
pub use random::{random_seq, RandomSource, ThreadRandom};
