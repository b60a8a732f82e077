use std::sync::{Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Display noise added to momentum before it is clamped.
pub trait Jitter: Send + Sync {
    fn sample(&self) -> f64;
}

/// Always zero. Used by tests and whenever the configured amplitude is 0.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoJitter;

impl Jitter for NoJitter {
    fn sample(&self) -> f64 {
        0.0
    }
}

/// Uniform noise in `[0, amplitude)`.
pub struct RandomJitter {
    rng: Mutex<StdRng>,
    amplitude: f64,
}

impl RandomJitter {
    #[must_use]
    pub fn new(amplitude: f64) -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
            amplitude,
        }
    }

    #[must_use]
    pub fn seeded(amplitude: f64, seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            amplitude,
        }
    }
}

impl Jitter for RandomJitter {
    fn sample(&self) -> f64 {
        if self.amplitude <= 0.0 {
            return 0.0;
        }
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        rng.random::<f64>() * self.amplitude
    }
}

/// Jitter for a configured amplitude; zero means none.
#[must_use]
pub fn jitter_from_amplitude(amplitude: f64) -> Box<dyn Jitter> {
    if amplitude > 0.0 {
        Box::new(RandomJitter::new(amplitude))
    } else {
        Box::new(NoJitter)
    }
}
