use rand::rngs::ThreadRng;
use rand::Rng;

/// Source of the randomness used by the shuffled and scored rankings.
pub trait RandomSource {
    /// A draw in [0, 1).
    fn next_unit(&mut self) -> f64;

    /// A draw in [0, bound). `bound` is never zero.
    fn next_index(&mut self, bound: usize) -> usize;
}

pub struct ThreadRandomSource {
    rng: ThreadRng,
}

impl Default for ThreadRandomSource {
    fn default() -> Self {
        ThreadRandomSource { rng: rand::rng() }
    }
}

impl RandomSource for ThreadRandomSource {
    fn next_unit(&mut self) -> f64 {
        self.rng.random::<f64>()
    }

    fn next_index(&mut self, bound: usize) -> usize {
        self.rng.random_range(0..bound)
    }
}

/// Replays a fixed list of unit draws, wrapping around at the end.
pub struct SequenceRandomSource {
    values: Vec<f64>,
    cursor: usize,
}

impl SequenceRandomSource {
    pub fn new(values: Vec<f64>) -> Self {
        SequenceRandomSource { values, cursor: 0 }
    }
}

impl RandomSource for SequenceRandomSource {
    fn next_unit(&mut self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let value = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        value
    }

    fn next_index(&mut self, bound: usize) -> usize {
        let index = (self.next_unit() * bound as f64) as usize;
        index.min(bound.saturating_sub(1))
    }
}
