//! Solution representation for the unrelated parallel machines problem.
//!
//! An [`Individual`] is a raw job -> machine assignment as manipulated by the
//! EDA operators; a [`Solution`] is the evaluated result reported to callers.

use crate::error::EdaError;
use crate::instance::ProcessingTimeMatrix;
use serde::{Deserialize, Serialize};

/// One candidate assignment: `genes[j]` is the machine job `j` runs on
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Individual {
    pub genes: Vec<usize>,
}

impl Individual {
    pub fn new(genes: Vec<usize>) -> Self {
        Individual { genes }
    }

    /// Number of jobs covered by this assignment
    #[inline]
    pub fn len(&self) -> usize {
        self.genes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// Check that the assignment fits a `jobs x machines` problem
    pub fn validate(&self, jobs: usize, machines: usize) -> Result<(), EdaError> {
        if self.genes.len() != jobs {
            return Err(EdaError::IndividualLength {
                expected: jobs,
                actual: self.genes.len(),
            });
        }

        if let Some((job, &machine)) = self.genes.iter().enumerate().find(|(_, m)| **m >= machines) {
            return Err(EdaError::GeneOutOfRange { job, machine, machines });
        }

        Ok(())
    }

    /// Apply a swap move
    #[inline]
    pub fn apply_swap(&mut self, i: usize, j: usize) {
        self.genes.swap(i, j);
    }
}

/// An individual together with its makespan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ranked {
    pub individual: Individual,
    pub fitness: f64,
}

/// Represents the best schedule found by a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solution {
    /// Machine assigned to each job
    pub assignment: Vec<usize>,
    /// Makespan (maximum machine load)
    pub makespan: f64,
    /// Total processing time on each machine
    pub machine_loads: Vec<f64>,
    /// Algorithm that generated this solution
    pub algorithm: String,
    /// Computation time in seconds
    pub computation_time: f64,
    /// Number of generations (if applicable)
    pub iterations: Option<usize>,
}

impl Solution {
    /// Create a new empty solution
    pub fn new() -> Self {
        Solution {
            assignment: Vec::new(),
            makespan: f64::INFINITY,
            machine_loads: Vec::new(),
            algorithm: String::new(),
            computation_time: 0.0,
            iterations: None,
        }
    }

    /// Create a solution from an assignment, evaluating it against the matrix
    pub fn from_individual(
        matrix: &ProcessingTimeMatrix,
        individual: &Individual,
        algorithm: &str,
    ) -> Result<Self, EdaError> {
        let machine_loads = crate::heuristics::fitness::machine_loads(matrix, individual)?;
        let makespan = machine_loads.iter().cloned().fold(0.0, f64::max);

        Ok(Solution {
            assignment: individual.genes.clone(),
            makespan,
            machine_loads,
            algorithm: algorithm.to_string(),
            computation_time: 0.0,
            iterations: None,
        })
    }

    /// Number of jobs placed on each machine. Assignments past the last
    /// machine load are not counted.
    pub fn jobs_per_machine(&self) -> Vec<usize> {
        let mut counts = vec![0; self.machine_loads.len()];
        for &machine in &self.assignment {
            if let Some(count) = counts.get_mut(machine) {
                *count += 1;
            }
        }
        counts
    }

    /// Index of the machine that determines the makespan
    pub fn critical_machine(&self) -> Option<usize> {
        self.machine_loads
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(m, _)| m)
    }
}

impl Default for Solution {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for Solution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Solution ({})", self.algorithm)?;
        writeln!(f, "  Makespan: {:.2}", self.makespan)?;
        writeln!(f, "  Time: {:.4}s", self.computation_time)?;
        if let Some(iter) = self.iterations {
            writeln!(f, "  Generations: {}", iter)?;
        }
        writeln!(f, "  Assignment: {:?}", self.assignment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix() -> ProcessingTimeMatrix {
        ProcessingTimeMatrix::from_rows(&[
            vec![2.0, 8.0],
            vec![6.0, 3.0],
            vec![5.0, 5.0],
            vec![1.0, 9.0],
        ])
        .unwrap()
    }

    #[test]
    fn test_solution_creation() {
        let sol = Solution::new();
        assert!(sol.assignment.is_empty());
        assert_eq!(sol.makespan, f64::INFINITY);
    }

    #[test]
    fn test_from_individual() {
        let sol = Solution::from_individual(&matrix(), &Individual::new(vec![0, 1, 0, 0]), "test").unwrap();

        assert_eq!(sol.makespan, 8.0);
        assert_eq!(sol.machine_loads, vec![8.0, 3.0]);
        assert_eq!(sol.jobs_per_machine(), vec![3, 1]);
        assert_eq!(sol.critical_machine(), Some(0));
    }

    #[test]
    fn test_jobs_per_machine_ignores_unknown_machines() {
        let sol: Solution = serde_json::from_str(
            r#"{"assignment":[0,3,1],"makespan":4.0,"machine_loads":[4.0,1.0],
                "algorithm":"EDA","computation_time":0.0,"iterations":null}"#,
        )
        .unwrap();

        assert_eq!(sol.jobs_per_machine(), vec![1, 1]);
    }

    #[test]
    fn test_validate() {
        let ind = Individual::new(vec![0, 1, 2]);
        assert!(ind.validate(3, 3).is_ok());
        assert!(matches!(
            ind.validate(4, 3),
            Err(EdaError::IndividualLength { expected: 4, actual: 3 })
        ));
        assert!(matches!(
            ind.validate(3, 2),
            Err(EdaError::GeneOutOfRange { job: 2, machine: 2, machines: 2 })
        ));
    }
}
