//! Concurrent fitness evaluation and ranking of a population.

use crate::error::EdaError;
use crate::heuristics::fitness;
use crate::instance::ProcessingTimeMatrix;
use crate::solution::{Individual, Ranked};
use ordered_float::OrderedFloat;
use rayon::prelude::*;

/// Evaluates a population on the rayon pool and sorts it by makespan
#[derive(Debug, Clone, Copy, Default)]
pub struct PopulationRanker;

impl PopulationRanker {
    pub fn new() -> Self {
        PopulationRanker
    }

    /// Rank a population ascending by fitness.
    ///
    /// Each individual is evaluated as an independent task; the collect acts as
    /// the join before sorting. The sort is stable, so individuals with equal
    /// makespan keep their original population order.
    pub fn rank(&self, matrix: &ProcessingTimeMatrix, population: Vec<Individual>) -> Result<Vec<Ranked>, EdaError> {
        if population.is_empty() {
            return Err(EdaError::EmptyPopulation("rank"));
        }

        let fitnesses: Vec<f64> = population
            .par_iter()
            .map(|individual| fitness::evaluate(matrix, individual))
            .collect::<Result<_, _>>()?;

        let mut ranked: Vec<Ranked> = population
            .into_iter()
            .zip(fitnesses)
            .map(|(individual, fitness)| Ranked { individual, fitness })
            .collect();

        ranked.sort_by_key(|r| OrderedFloat(r.fitness));

        Ok(ranked)
    }
}

/// Best, mean and worst makespan of a ranked population
pub fn summarize(ranked: &[Ranked]) -> (f64, f64, f64) {
    if ranked.is_empty() {
        return (f64::NAN, f64::NAN, f64::NAN);
    }

    let best = ranked[0].fitness;
    let worst = ranked[ranked.len() - 1].fitness;
    let mean = ranked.iter().map(|r| r.fitness).sum::<f64>() / ranked.len() as f64;

    (best, mean, worst)
}
