//! Seeded dice for combat resolution
//!
//! The only source of randomness in the engine. Same seed plus the same
//! sequence of calls yields the same rolls on every platform (ChaCha8).

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

#[derive(Debug, Clone)]
pub struct DiceRng {
    seed: u64,
    rng: ChaCha8Rng,
    draws: u64,
}

impl DiceRng {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
            draws: 0,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of values drawn so far
    pub fn draws(&self) -> u64 {
        self.draws
    }

    /// Uniform integer in `[0, max)`. `max == 0` yields 0 without drawing.
    pub fn next_int(&mut self, max: u32) -> u32 {
        if max == 0 {
            return 0;
        }
        self.draws += 1;
        self.rng.gen_range(0..max)
    }

    /// Uniform float in `[0, 1)`
    pub fn next_float(&mut self) -> f64 {
        self.draws += 1;
        self.rng.gen::<f64>()
    }

    pub fn roll_d6(&mut self) -> u32 {
        self.next_int(6) + 1
    }

    pub fn roll_2d6(&mut self) -> u32 {
        self.roll_d6() + self.roll_d6()
    }

    /// Index into a collection of `len` items
    pub fn pick(&mut self, len: usize) -> usize {
        self.next_int(len as u32) as usize
    }

    pub fn random_bytes(&mut self) -> [u8; 16] {
        let mut bytes = [0u8; 16];
        self.rng.fill_bytes(&mut bytes);
        self.draws += 1;
        bytes
    }

    /// Roll under a probability in `[0, 1]`
    pub fn chance(&mut self, probability: f64) -> bool {
        self.next_float() < probability
    }
}
