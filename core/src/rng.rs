//! Sub-second tiebreakers for time keys.
//!
//! RULE: Nothing in the ledger may call a platform RNG.
//! Every tiebreak comes from a Tiebreaker handed to the Ledger,
//! seeded explicitly so a run is reproducible from its seed.

use crate::types::TIME_KEY_SCALE;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;

pub trait Tiebreaker {
    /// Next tiebreak in `[0, TIME_KEY_SCALE)`.
    fn next_tiebreak(&mut self) -> i64;
}

/// Deterministic pseudo-random tiebreaks from a fixed seed.
pub struct SeededTiebreaker {
    seed:  u64,
    inner: Pcg64Mcg,
}

impl SeededTiebreaker {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            inner: Pcg64Mcg::seed_from_u64(seed),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl Tiebreaker for SeededTiebreaker {
    fn next_tiebreak(&mut self) -> i64 {
        self.inner.gen_range(0..TIME_KEY_SCALE)
    }
}

/// Hands out 0, 1, 2, ... wrapping at TIME_KEY_SCALE.
/// Keys inserted within the same second then sort in insertion order.
#[derive(Debug, Clone, Default)]
pub struct SequentialTiebreaker {
    next: i64,
}

impl SequentialTiebreaker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(next: i64) -> Self {
        Self { next: next.rem_euclid(TIME_KEY_SCALE) }
    }
}

impl Tiebreaker for SequentialTiebreaker {
    fn next_tiebreak(&mut self) -> i64 {
        let value = self.next;
        self.next = (self.next + 1) % TIME_KEY_SCALE;
        value
    }
}
