//! Estimation-of-Distribution Algorithm for makespan minimisation.
//!
//! Each generation:
//! - ranks the population by makespan (in parallel),
//! - learns a per-job machine distribution from the best individuals,
//! - samples new individuals from it and keeps the elites unchanged,
//! - applies swap mutation and re-ranks.
//!
//! The loop always runs the configured number of generations.

use crate::error::EdaError;
use crate::heuristics::model::{IndividualFactory, ProbabilityMatrix};
use crate::heuristics::mutation::SwapMutation;
use crate::heuristics::ranking::{self, PopulationRanker};
use crate::instance::ProcessingTimeMatrix;
use crate::solution::{Individual, Ranked, Solution};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// EDA configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EDAConfig {
    /// Number of jobs
    pub jobs: usize,
    /// Number of machines
    pub machines: usize,
    /// Population size
    pub population_size: usize,
    /// Number of generations
    pub generations: usize,
    /// Share of the ranked population (percent) used to build the model
    pub to_matrix_percent: usize,
    /// Elite count (best individuals preserved)
    pub elitism_count: usize,
    /// Per-individual mutation probability in percent
    pub mutation_prob_percent: u32,
    /// Random seed
    pub seed: u64,
    /// Sample offspring on the rayon pool
    pub parallel_sampling: bool,
}

impl Default for EDAConfig {
    fn default() -> Self {
        EDAConfig {
            jobs: 512,
            machines: 16,
            population_size: 100,
            generations: 100,
            to_matrix_percent: 10,
            elitism_count: 10,
            mutation_prob_percent: 10,
            seed: 42,
            parallel_sampling: true,
        }
    }
}

impl EDAConfig {
    /// Number of top-ranked individuals that feed the probability model
    pub fn model_size(&self) -> usize {
        self.to_matrix_percent * self.population_size / 100
    }

    /// Check every parameter range before a run starts
    pub fn validate(&self) -> Result<(), EdaError> {
        if self.jobs == 0 || self.machines == 0 {
            return Err(EdaError::InvalidConfig(format!(
                "jobs and machines must be positive (jobs={}, machines={})",
                self.jobs, self.machines
            )));
        }
        if self.population_size == 0 {
            return Err(EdaError::InvalidConfig("population size must be positive".to_string()));
        }
        if self.to_matrix_percent > 100 {
            return Err(EdaError::InvalidConfig(format!(
                "to_matrix_percent must be at most 100, got {}",
                self.to_matrix_percent
            )));
        }
        if self.model_size() == 0 {
            return Err(EdaError::InvalidConfig(format!(
                "{}% of {} individuals leaves no individual to build the model from",
                self.to_matrix_percent, self.population_size
            )));
        }
        if self.elitism_count > self.population_size {
            return Err(EdaError::InvalidConfig(format!(
                "elitism count {} exceeds population size {}",
                self.elitism_count, self.population_size
            )));
        }
        if self.mutation_prob_percent > 100 {
            return Err(EdaError::InvalidConfig(format!(
                "mutation probability must be at most 100%, got {}",
                self.mutation_prob_percent
            )));
        }
        Ok(())
    }
}

impl std::fmt::Display for EDAConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "jobs={} machines={} numInd={} numGen={} toMatrix={}% elitism={} mutate={}% seed={}",
            self.jobs,
            self.machines,
            self.population_size,
            self.generations,
            self.to_matrix_percent,
            self.elitism_count,
            self.mutation_prob_percent,
            self.seed
        )
    }
}

/// Makespan summary of one ranked population
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationRecord {
    pub generation: usize,
    pub best: f64,
    pub mean: f64,
    pub worst: f64,
}

/// EDA engine
pub struct EstimationOfDistribution<'a> {
    config: EDAConfig,
    matrix: &'a ProcessingTimeMatrix,
    ranker: PopulationRanker,
    factory: IndividualFactory,
    mutation: SwapMutation,
    population: Vec<Ranked>,
    previous: Option<Vec<Ranked>>,
    rng: ChaCha8Rng,
    generation: usize,
    trace: Vec<GenerationRecord>,
}

impl<'a> EstimationOfDistribution<'a> {
    pub fn new(matrix: &'a ProcessingTimeMatrix, config: EDAConfig) -> Result<Self, EdaError> {
        config.validate()?;

        if matrix.jobs() != config.jobs || matrix.machines() != config.machines {
            return Err(EdaError::DimensionMismatch {
                jobs: config.jobs,
                machines: config.machines,
                actual_jobs: matrix.jobs(),
                actual_machines: matrix.machines(),
            });
        }

        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        let factory = if config.parallel_sampling {
            IndividualFactory::new()
        } else {
            IndividualFactory::sequential()
        };
        let mutation = SwapMutation::new(config.mutation_prob_percent);

        Ok(EstimationOfDistribution {
            config,
            matrix,
            ranker: PopulationRanker::new(),
            factory,
            mutation,
            population: Vec::new(),
            previous: None,
            rng,
            generation: 0,
            trace: Vec::new(),
        })
    }

    /// Random initial population, ranked once
    pub fn initialize_population(&mut self) -> Result<(), EdaError> {
        let jobs = self.config.jobs;
        let machines = self.config.machines;

        let individuals: Vec<Individual> = (0..self.config.population_size)
            .map(|_| IndividualFactory::random(jobs, machines, &mut self.rng))
            .collect();

        self.population = self.ranker.rank(self.matrix, individuals)?;
        self.previous = None;
        self.generation = 0;
        self.trace.clear();
        self.record();

        Ok(())
    }

    /// Model, sample and merge: the population that enters mutation.
    ///
    /// The first `elitism_count` members are value copies of the current
    /// elites; the rest are sampled from a model learned from the top
    /// `model_size()` ranked individuals.
    pub fn breed(&mut self) -> Result<Vec<Individual>, EdaError> {
        if self.population.is_empty() {
            return Err(EdaError::EmptyPopulation("breed"));
        }

        let model_size = self.config.model_size().min(self.population.len());
        let model = ProbabilityMatrix::build(
            self.config.jobs,
            self.config.machines,
            self.population[..model_size].iter().map(|r| &r.individual),
        )?;

        let elite_count = self.config.elitism_count.min(self.population.len());
        let mut merged: Vec<Individual> = Vec::with_capacity(self.config.population_size);
        merged.extend(self.population[..elite_count].iter().map(|r| r.individual.clone()));

        let offspring = self.config.population_size - elite_count;
        merged.extend(self.factory.create_population(&model, offspring, &mut self.rng)?);

        Ok(merged)
    }

    /// Create new generation
    pub fn evolve(&mut self) -> Result<(), EdaError> {
        let mut merged = self.breed()?;

        let swaps = self.mutation.mutate(&mut merged, &mut self.rng);

        let mut ranked = self.ranker.rank(self.matrix, merged)?;
        ranked.truncate(self.config.population_size);

        self.previous = Some(std::mem::replace(&mut self.population, ranked));
        self.generation += 1;
        self.record();

        log::debug!(
            "[EDA] Gen {}  Best {:.3}  Swaps {}  Diversity {:.2}",
            self.generation,
            self.population[0].fitness,
            swaps,
            self.population_diversity()
        );

        Ok(())
    }

    /// Run the EDA for the configured number of generations
    pub fn run(&mut self) -> Result<Solution, EdaError> {
        let start = std::time::Instant::now();

        self.initialize_population()?;
        log::info!(
            "[EDA] {} | initial best {:.3}",
            self.config,
            self.population[0].fitness
        );

        while self.generation < self.config.generations {
            self.evolve()?;
        }

        let best = self.best().ok_or(EdaError::EmptyPopulation("run"))?;
        let mut solution = Solution::from_individual(self.matrix, &best.individual, "EDA")?;
        solution.computation_time = start.elapsed().as_secs_f64();
        solution.iterations = Some(self.generation);

        log::info!(
            "[EDA] finished {} generations  best {:.3}  elapsed {:.2}s",
            self.generation,
            solution.makespan,
            solution.computation_time
        );

        Ok(solution)
    }

    fn record(&mut self) {
        let (best, mean, worst) = ranking::summarize(&self.population);
        self.trace.push(GenerationRecord {
            generation: self.generation,
            best,
            mean,
            worst,
        });
    }

    /// Best member of the current ranked population
    pub fn best(&self) -> Option<&Ranked> {
        self.population.first()
    }

    /// Current ranked population
    pub fn population(&self) -> &[Ranked] {
        &self.population
    }

    /// Ranked population of the generation before the current one
    pub fn previous_population(&self) -> Option<&[Ranked]> {
        self.previous.as_deref()
    }

    /// Per-generation makespan summary, starting with the initial population
    pub fn trace(&self) -> &[GenerationRecord] {
        &self.trace
    }

    /// Get current generation
    pub fn current_generation(&self) -> usize {
        self.generation
    }

    /// Get population diversity (average number of differing genes between
    /// pairs of the 20 best individuals)
    pub fn population_diversity(&self) -> f64 {
        let top = self.population.len().min(20);
        if top < 2 {
            return 0.0;
        }

        let mut total_diff = 0usize;
        let mut count = 0usize;

        for i in 0..top {
            for j in i + 1..top {
                total_diff += self.population[i]
                    .individual
                    .genes
                    .iter()
                    .zip(&self.population[j].individual.genes)
                    .filter(|(a, b)| a != b)
                    .count();
                count += 1;
            }
        }

        total_diff as f64 / count as f64
    }
}
