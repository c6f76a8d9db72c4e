//! Probability model of the EDA.
//!
//! The model replaces crossover: it counts, for every job, how often each
//! machine appears among the elite individuals, and new individuals are drawn
//! job by job from those counts with a roulette wheel.

use crate::error::EdaError;
use crate::solution::Individual;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

/// Per-job machine frequencies learned from elite individuals
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbabilityMatrix {
    jobs: usize,
    machines: usize,
    counts: Vec<Vec<usize>>,
}

impl ProbabilityMatrix {
    /// All-zero model for a `jobs x machines` problem
    pub fn zeros(jobs: usize, machines: usize) -> Self {
        ProbabilityMatrix {
            jobs,
            machines,
            counts: vec![vec![0; machines]; jobs],
        }
    }

    /// Count machine assignments over the elite individuals.
    ///
    /// Every elite adds exactly one count per job, so each row sums to the
    /// number of elites.
    pub fn build<'a, I>(jobs: usize, machines: usize, elites: I) -> Result<Self, EdaError>
    where
        I: IntoIterator<Item = &'a Individual>,
    {
        let mut model = Self::zeros(jobs, machines);
        let mut observed = 0usize;

        for individual in elites {
            individual.validate(jobs, machines)?;
            for (job, &machine) in individual.genes.iter().enumerate() {
                model.counts[job][machine] += 1;
            }
            observed += 1;
        }

        if observed == 0 {
            return Err(EdaError::EmptyPopulation("probability model"));
        }

        Ok(model)
    }

    #[inline]
    pub fn jobs(&self) -> usize {
        self.jobs
    }

    #[inline]
    pub fn machines(&self) -> usize {
        self.machines
    }

    /// Counts for one job
    #[inline]
    pub fn row(&self, job: usize) -> &[usize] {
        &self.counts[job]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[usize]> {
        self.counts.iter().map(|r| r.as_slice())
    }
}

/// Roulette-wheel draw: index `i` is returned with probability `weights[i] / S`.
///
/// Draws `r` uniformly in `[0, S)` and returns the smallest index whose
/// cumulative weight exceeds `r`. A row summing to zero has nothing to draw
/// from and yields [`EdaError::ZeroWeightRow`] tagged with `job`.
pub fn sample<R: Rng + ?Sized>(weights: &[usize], job: usize, rng: &mut R) -> Result<usize, EdaError> {
    let total: usize = weights.iter().sum();
    if total == 0 {
        return Err(EdaError::ZeroWeightRow { job });
    }

    let pick = rng.gen_range(0..total);
    let mut cumulative = 0;
    for (i, &weight) in weights.iter().enumerate() {
        cumulative += weight;
        if pick < cumulative {
            return Ok(i);
        }
    }

    // pick < total == final cumulative, so the loop always returns
    Err(EdaError::ZeroWeightRow { job })
}

/// Samples new individuals from a [`ProbabilityMatrix`]
#[derive(Debug, Clone)]
pub struct IndividualFactory {
    /// Create batches on the rayon pool
    pub parallel: bool,
}

impl IndividualFactory {
    pub fn new() -> Self {
        IndividualFactory { parallel: true }
    }

    pub fn sequential() -> Self {
        IndividualFactory { parallel: false }
    }

    /// Uniformly random individual, used for the initial population
    pub fn random<R: Rng + ?Sized>(jobs: usize, machines: usize, rng: &mut R) -> Individual {
        Individual::new((0..jobs).map(|_| rng.gen_range(0..machines)).collect())
    }

    /// Sample one machine per job, row by row
    pub fn create<R: Rng + ?Sized>(&self, model: &ProbabilityMatrix, rng: &mut R) -> Result<Individual, EdaError> {
        let genes = model
            .rows()
            .enumerate()
            .map(|(job, row)| sample(row, job, rng))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Individual::new(genes))
    }

    /// Create `count` independent individuals.
    ///
    /// One seed per individual is drawn from `rng` up front and each creation
    /// runs with its own `ChaCha8Rng`, so the batch is the same whether it is
    /// built in parallel or not.
    pub fn create_population<R: Rng + ?Sized>(
        &self,
        model: &ProbabilityMatrix,
        count: usize,
        rng: &mut R,
    ) -> Result<Vec<Individual>, EdaError> {
        let seeds: Vec<u64> = (0..count).map(|_| rng.gen()).collect();

        if self.parallel {
            seeds
                .into_par_iter()
                .map(|seed| self.create(model, &mut ChaCha8Rng::seed_from_u64(seed)))
                .collect()
        } else {
            seeds
                .into_iter()
                .map(|seed| self.create(model, &mut ChaCha8Rng::seed_from_u64(seed)))
                .collect()
        }
    }
}

impl Default for IndividualFactory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn elites() -> Vec<Individual> {
        vec![
            Individual::new(vec![0, 1, 2]),
            Individual::new(vec![0, 1, 1]),
            Individual::new(vec![0, 2, 1]),
            Individual::new(vec![0, 1, 0]),
        ]
    }

    #[test]
    fn test_build_counts() {
        let model = ProbabilityMatrix::build(3, 3, &elites()).unwrap();

        assert_eq!(model.row(0), &[4, 0, 0]);
        assert_eq!(model.row(1), &[0, 3, 1]);
        assert_eq!(model.row(2), &[1, 2, 1]);
        assert!(model.rows().all(|r| r.iter().sum::<usize>() == 4));
    }

    #[test]
    fn test_row_sums_equal_elite_count() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let population: Vec<Individual> = (0..37)
            .map(|_| IndividualFactory::random(20, 5, &mut rng))
            .collect();

        let model = ProbabilityMatrix::build(20, 5, &population).unwrap();
        for row in model.rows() {
            assert_eq!(row.iter().sum::<usize>(), 37);
        }
    }

    #[test]
    fn test_build_rejects_empty_and_invalid() {
        let empty: Vec<Individual> = Vec::new();
        assert!(matches!(
            ProbabilityMatrix::build(3, 3, &empty),
            Err(EdaError::EmptyPopulation(_))
        ));
        assert!(matches!(
            ProbabilityMatrix::build(3, 2, &elites()),
            Err(EdaError::GeneOutOfRange { .. })
        ));
    }

    #[test]
    fn test_sample_frequencies() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let weights = [1, 0, 3];
        let mut hits = [0usize; 3];
        let trials = 40_000;

        for _ in 0..trials {
            hits[sample(&weights, 0, &mut rng).unwrap()] += 1;
        }

        assert_eq!(hits[1], 0);
        let share0 = hits[0] as f64 / trials as f64;
        let share2 = hits[2] as f64 / trials as f64;
        assert!((share0 - 0.25).abs() < 0.02, "share0 = {}", share0);
        assert!((share2 - 0.75).abs() < 0.02, "share2 = {}", share2);
    }

    #[test]
    fn test_sample_single_weight() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..100 {
            assert_eq!(sample(&[0, 0, 5, 0], 0, &mut rng).unwrap(), 2);
        }
    }

    #[test]
    fn test_sample_zero_row() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(matches!(
            sample(&[0, 0, 0], 4, &mut rng),
            Err(EdaError::ZeroWeightRow { job: 4 })
        ));
    }

    #[test]
    fn test_create_respects_model() {
        let model = ProbabilityMatrix::build(3, 3, &elites()).unwrap();
        let factory = IndividualFactory::new();
        let mut rng = ChaCha8Rng::seed_from_u64(9);

        for _ in 0..200 {
            let ind = factory.create(&model, &mut rng).unwrap();
            assert_eq!(ind.len(), 3);
            // job 0 was always on machine 0, job 1 never on machine 0
            assert_eq!(ind.genes[0], 0);
            assert_ne!(ind.genes[1], 0);
            assert!(ind.genes.iter().all(|&m| m < 3));
        }
    }

    #[test]
    fn test_create_fails_on_zero_row() {
        let model = ProbabilityMatrix::zeros(2, 2);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(matches!(
            IndividualFactory::new().create(&model, &mut rng),
            Err(EdaError::ZeroWeightRow { job: 0 })
        ));
    }

    #[test]
    fn test_parallel_and_sequential_batches_match() {
        let model = ProbabilityMatrix::build(3, 3, &elites()).unwrap();

        let mut rng_a = ChaCha8Rng::seed_from_u64(11);
        let mut rng_b = ChaCha8Rng::seed_from_u64(11);
        let parallel = IndividualFactory::new().create_population(&model, 64, &mut rng_a).unwrap();
        let sequential = IndividualFactory::sequential()
            .create_population(&model, 64, &mut rng_b)
            .unwrap();

        assert_eq!(parallel.len(), 64);
        assert_eq!(parallel, sequential);
    }

    #[test]
    fn test_random_individual_bounds() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let ind = IndividualFactory::random(100, 4, &mut rng);
        assert_eq!(ind.len(), 100);
        assert!(ind.validate(100, 4).is_ok());
    }
}
