use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::clock::FrameClock;
use crate::uniforms::{UniformBridge, UniformSink};

/// Three independent uniform samples in `[0, 1)` fed to the `seed` uniform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RandomSeed([f32; 3]);

impl RandomSeed {
    pub fn new(values: [f32; 3]) -> Self {
        Self(values)
    }

    pub fn draw<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self([rng.gen(), rng.gen(), rng.gen()])
    }

    pub fn values(self) -> [f32; 3] {
        self.0
    }
}

/// Owns the seed RNG and restarts the pattern on request.
pub struct SeedController {
    rng: StdRng,
    current: RandomSeed,
}

impl SeedController {
    /// Seeds from OS entropy unless a fixed seed is supplied.
    pub fn new(seed: Option<u64>) -> Self {
        let mut rng = match seed {
            Some(value) => StdRng::seed_from_u64(value),
            None => StdRng::from_entropy(),
        };
        let current = RandomSeed::draw(&mut rng);
        Self { rng, current }
    }

    pub fn current(&self) -> RandomSeed {
        self.current
    }

    /// Draws a fresh seed, pushes it, and rebases the clock so the next
    /// adjusted time starts from zero.
    pub fn reset_pattern<S: UniformSink + ?Sized>(
        &mut self,
        clock: &mut FrameClock,
        bridge: &UniformBridge,
        sink: &mut S,
    ) -> RandomSeed {
        let seed = RandomSeed::draw(&mut self.rng);
        bridge.push_seed(seed, sink);
        clock.reset_offset();
        self.current = seed;
        debug!(
            seed = ?seed.values(),
            offset_ms = clock.state().time_offset(),
            "pattern reset"
        );
        seed
    }
}
