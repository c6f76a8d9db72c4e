//! EDA Scheduler Library
//!
//! Minimises the makespan of independent jobs on unrelated parallel machines
//! with an Estimation-of-Distribution Algorithm.
//!
//! # Features
//!
//! - ETC matrix loading (one processing time per line, row-major)
//! - Parallel fitness evaluation and ranking (rayon)
//! - Elite-driven probability model with roulette sampling
//! - Elitism and swap mutation
//! - Parameter sweeps with CSV export and statistics
//!
//! # Example
//!
//! ```no_run
//! use eda_scheduler::instance::ProcessingTimeMatrix;
//! use eda_scheduler::heuristics::eda::{EDAConfig, EstimationOfDistribution};
//!
//! // Load instance
//! let matrix = ProcessingTimeMatrix::from_file("512x16/u_c_hihi.0", 512, 16).unwrap();
//!
//! // Evolve
//! let config = EDAConfig { generations: 200, ..Default::default() };
//! let mut eda = EstimationOfDistribution::new(&matrix, config).unwrap();
//! let solution = eda.run().unwrap();
//!
//! println!("Makespan: {:.2}", solution.makespan);
//! ```

pub mod error;
pub mod instance;
pub mod solution;
pub mod heuristics;
pub mod benchmark;

pub use error::EdaError;
pub use instance::ProcessingTimeMatrix;
pub use solution::{Individual, Solution};
