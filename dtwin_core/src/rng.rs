//! Seeded measurement-noise source.
//!
//! The engine's only source of non-determinism is additive Gaussian noise on
//! the plant's process variables (§4.3). Routing every draw through one
//! seeded generator, held by value and stepped in a fixed order, is what
//! makes two runs of the same scenario with `noise: true` bit-identical.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Seeded Gaussian noise source using the Box–Muller transform over two
/// uniforms, per spec rather than a library normal distribution (which would
/// use a different algorithm and break reproducibility against a fixed seed).
#[derive(Debug, Clone)]
pub struct NoiseRng {
    rng: StdRng,
    spare: Option<f64>,
}

impl NoiseRng {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            spare: None,
        }
    }

    /// Draw one sample from `Normal(mean, std_dev)`.
    ///
    /// Box–Muller produces two independent standard-normal draws per pair of
    /// uniforms; the second is cached and returned on the following call so
    /// each pair of uniforms is consumed exactly once.
    pub fn gaussian(&mut self, mean: f64, std_dev: f64) -> f64 {
        if let Some(z) = self.spare.take() {
            return mean + std_dev * z;
        }
        let u1: f64 = self.rng.gen_range(f64::EPSILON..1.0);
        let u2: f64 = self.rng.gen_range(0.0..1.0);
        let r = (-2.0 * u1.ln()).sqrt();
        let theta = std::f64::consts::TAU * u2;
        let z0 = r * theta.cos();
        let z1 = r * theta.sin();
        self.spare = Some(z1);
        mean + std_dev * z0
    }
}
