//! Seeded pseudo-random number generator
//!
//! Deterministic PRNG shared by every draw the engine makes: initial
//! strategy assignment, activation order and randomized decisions.
//! Uses a simple but effective xorshift algorithm.

/// Fallback state used when seed mixing lands on zero (xorshift fixpoint).
const NONZERO_STATE: u64 = 0x9e3779b97f4a7c15;

/// Seeded random number generator
///
/// Deterministic: same seed = same sequence
#[derive(Clone, Debug)]
pub struct SeededRng {
    state: u64,
}

impl SeededRng {
    /// Create a new RNG from a 64-bit seed
    pub fn new(seed: u64) -> Self {
        // splitmix-style scramble so that nearby seeds diverge immediately
        let mut state = seed.wrapping_add(NONZERO_STATE);
        state = (state ^ (state >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
        state = (state ^ (state >> 27)).wrapping_mul(0x94d049bb133111eb);
        state ^= state >> 31;
        if state == 0 {
            state = NONZERO_STATE;
        }

        // Warm up the generator
        let mut rng = Self { state };
        for _ in 0..8 {
            rng.next_u64();
        }

        rng
    }

    /// Generate next u64
    pub fn next_u64(&mut self) -> u64 {
        // xorshift64*
        self.state ^= self.state >> 12;
        self.state ^= self.state << 25;
        self.state ^= self.state >> 27;
        self.state.wrapping_mul(0x2545f4914f6cdd1d)
    }

    /// Generate next u32
    pub fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    /// Generate a float uniformly distributed in [0, 1)
    pub fn next_f64(&mut self) -> f64 {
        // 53 high bits -> exact mantissa
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Fair coin flip
    pub fn next_bool(&mut self) -> bool {
        self.next_u64() >> 63 == 1
    }

    /// Generate a value in range [0, max)
    pub fn next_range(&mut self, max: u64) -> u64 {
        if max == 0 {
            return 0;
        }
        self.next_u64() % max
    }

    /// Pick an index with probability proportional to its weight.
    ///
    /// Returns `None` when every weight is zero.
    pub fn weighted_index(&mut self, weights: &[u32]) -> Option<usize> {
        let total: u64 = weights.iter().map(|&w| w as u64).sum();
        if total == 0 {
            return None;
        }

        let mut ticket = self.next_range(total);
        for (index, &weight) in weights.iter().enumerate() {
            let weight = weight as u64;
            if ticket < weight {
                return Some(index);
            }
            ticket -= weight;
        }
        unreachable!("ticket drawn below total weight")
    }

    /// In-place Fisher-Yates shuffle
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.next_range(i as u64 + 1) as usize;
            items.swap(i, j);
        }
    }
}
