//! Seedable random helpers
//!
//! Every session owns one `GameRng` seeded at match start. Spawn types,
//! loot rolls and opponent luck all draw from it.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

#[derive(Debug, Clone)]
pub struct GameRng {
    seed: u64,
    inner: Pcg32,
}

impl GameRng {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            inner: Pcg32::seed_from_u64(seed),
        }
    }

    /// Seed from OS entropy
    pub fn from_entropy() -> Self {
        Self::new(rand::random())
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Fresh seed for a child RNG
    pub fn next_seed(&mut self) -> u64 {
        self.inner.random::<u64>()
    }

    /// Uniform float in [0, 1)
    #[inline]
    pub fn unit(&mut self) -> f32 {
        self.inner.random::<f32>()
    }

    /// Uniform float in [min, max); returns `min` for an empty range
    pub fn range(&mut self, min: f32, max: f32) -> f32 {
        if max <= min {
            return min;
        }
        self.inner.random_range(min..max)
    }

    /// Uniform integer in [min, max] (inclusive)
    pub fn int(&mut self, min: i32, max: i32) -> i32 {
        if max <= min {
            return min;
        }
        self.inner.random_range(min..=max)
    }

    /// Bernoulli trial. Always consumes exactly one draw so that callers
    /// replaying a cloned generator stay in lockstep.
    pub fn chance(&mut self, p: f32) -> bool {
        self.unit() < p.clamp(0.0, 1.0)
    }

    /// Uniform index into a collection of `len` items
    pub fn index(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        Some(self.inner.random_range(0..len))
    }

    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        self.index(items.len()).map(|i| &items[i])
    }

    /// Pick a value from a `(value, weight)` table. Weights need not sum to 1;
    /// non-positive weights never win. Returns `None` for an empty table or
    /// when every weight is zero.
    pub fn weighted_pick<T: Copy>(&mut self, table: &[(T, f32)]) -> Option<T> {
        let total: f32 = table.iter().map(|&(_, w)| w.max(0.0)).sum();
        if total <= 0.0 {
            return None;
        }
        let mut roll = self.unit() * total;
        let mut last = None;
        for &(value, weight) in table {
            let weight = weight.max(0.0);
            if weight == 0.0 {
                continue;
            }
            if roll < weight {
                return Some(value);
            }
            roll -= weight;
            last = Some(value);
        }
        // Float drift can leave a sliver past the final bucket
        last
    }

    /// Draw `candidates` samples and keep the highest-ranked one.
    /// Ties keep the earliest sample.
    pub fn best_of<T, K, S, R>(&mut self, candidates: usize, mut sample: S, rank: R) -> T
    where
        K: Ord,
        S: FnMut(&mut Self) -> T,
        R: Fn(&T) -> K,
    {
        let mut best = sample(self);
        for _ in 1..candidates.max(1) {
            let next = sample(self);
            if rank(&next) > rank(&best) {
                best = next;
            }
        }
        best
    }

    /// Retry `sample` until `accept` passes, giving up after `attempts` tries
    pub fn sample_until<T, S, A>(&mut self, attempts: u32, mut sample: S, accept: A) -> Option<T>
    where
        S: FnMut(&mut Self) -> T,
        A: Fn(&T) -> bool,
    {
        for _ in 0..attempts {
            let candidate = sample(self);
            if accept(&candidate) {
                return Some(candidate);
            }
        }
        None
    }
}
