use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

/// Uniform samples in `[0, 1)`.
pub trait RandomSource: Send + Sync {
    fn next_f64(&self) -> f64;
}

pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_f64(&self) -> f64 {
        rand::random::<f64>()
    }
}

/// Replays a fixed list of samples, then keeps repeating the last one.
pub struct ScriptedRandom {
    state: Mutex<(VecDeque<f64>, f64)>,
}

impl ScriptedRandom {
    pub fn new(values: impl IntoIterator<Item = f64>) -> Self {
        let values: VecDeque<f64> = values.into_iter().collect();
        let fallback = values.back().copied().unwrap_or(0.0);
        Self {
            state: Mutex::new((values, fallback)),
        }
    }
}

impl RandomSource for ScriptedRandom {
    fn next_f64(&self) -> f64 {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match state.0.pop_front() {
            Some(v) => v,
            None => state.1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_random_replays_then_repeats_last() {
        let rng = ScriptedRandom::new([0.1, 0.7]);
        assert_eq!(rng.next_f64(), 0.1);
        assert_eq!(rng.next_f64(), 0.7);
        assert_eq!(rng.next_f64(), 0.7);
    }

    #[test]
    fn test_thread_random_stays_in_unit_interval() {
        let rng = ThreadRandom;
        for _ in 0..1000 {
            let v = rng.next_f64();
            assert!((0.0..1.0).contains(&v));
        }
    }
}
