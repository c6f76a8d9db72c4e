//! Swap mutation.

use crate::solution::Individual;
use rand::prelude::*;

/// Swaps the genes at two random positions of an individual
#[derive(Debug, Clone)]
pub struct SwapMutation {
    /// Chance, in percent (0..=100), that an individual gets one swap
    pub probability_percent: u32,
}

impl SwapMutation {
    pub fn new(probability_percent: u32) -> Self {
        SwapMutation { probability_percent }
    }

    /// Mutate the population in place and return the number of swaps attempted.
    ///
    /// Each individual draws `p` in `1..=100` and is mutated when
    /// `p <= probability_percent`. Both positions are drawn with replacement,
    /// so a swap may be a no-op.
    pub fn mutate<R: Rng + ?Sized>(&self, population: &mut [Individual], rng: &mut R) -> usize {
        let mut events = 0;

        for individual in population.iter_mut() {
            let p = rng.gen_range(1..=100);
            if p > self.probability_percent || individual.is_empty() {
                continue;
            }

            let n = individual.len();
            let i = rng.gen_range(0..n);
            let j = rng.gen_range(0..n);
            individual.apply_swap(i, j);
            events += 1;
        }

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_chacha::ChaCha8Rng;

    fn population(rng: &mut ChaCha8Rng) -> Vec<Individual> {
        (0..50)
            .map(|_| Individual::new((0..12).map(|_| rng.gen_range(0..4)).collect()))
            .collect()
    }

    #[test]
    fn test_zero_probability_never_mutates() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let original = population(&mut rng);
        let mut pop = original.clone();

        let mutation = SwapMutation::new(0);
        for _ in 0..100 {
            assert_eq!(mutation.mutate(&mut pop, &mut rng), 0);
        }
        assert_eq!(pop, original);
    }

    #[test]
    fn test_full_probability_mutates_everyone_once() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut pop = population(&mut rng);

        assert_eq!(SwapMutation::new(100).mutate(&mut pop, &mut rng), pop.len());
    }

    #[test]
    fn test_swap_preserves_genes() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let original = population(&mut rng);
        let mut pop = original.clone();

        SwapMutation::new(100).mutate(&mut pop, &mut rng);

        for (before, after) in original.iter().zip(&pop) {
            let mut a = before.genes.clone();
            let mut b = after.genes.clone();
            a.sort_unstable();
            b.sort_unstable();
            assert_eq!(a, b);

            let changed = before.genes.iter().zip(&after.genes).filter(|(x, y)| x != y).count();
            assert!(changed == 0 || changed == 2);
        }
    }

    #[test]
    fn test_partial_probability() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut pop: Vec<Individual> = (0..10_000).map(|_| Individual::new(vec![0, 1])).collect();

        let events = SwapMutation::new(30).mutate(&mut pop, &mut rng);
        let rate = events as f64 / pop.len() as f64;
        assert!((rate - 0.30).abs() < 0.03, "rate = {}", rate);
    }
}
