//! Parameter sweeps over the EDA.
//!
//! Enumerates a hyperparameter grid, runs the EDA once per combination and
//! seed, and exports the results as CSV and a text report. A failing
//! combination is recorded with its error and does not stop the sweep.

use crate::error::EdaError;
use crate::heuristics::eda::{EDAConfig, EstimationOfDistribution};
use crate::instance::ProcessingTimeMatrix;

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

/// Candidate values for every EDA parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterGrid {
    pub jobs: Vec<usize>,
    pub machines: Vec<usize>,
    pub population_size: Vec<usize>,
    pub generations: Vec<usize>,
    pub to_matrix_percent: Vec<usize>,
    pub elitism_count: Vec<usize>,
    pub mutation_prob_percent: Vec<u32>,
}

impl Default for ParameterGrid {
    fn default() -> Self {
        ParameterGrid {
            jobs: vec![512],
            machines: vec![16],
            population_size: vec![100, 200, 500],
            generations: vec![100, 200, 500],
            to_matrix_percent: vec![10, 20, 30, 40, 50],
            elitism_count: vec![10, 20, 30, 40, 50],
            mutation_prob_percent: vec![10, 20, 30],
        }
    }
}

impl ParameterGrid {
    /// Load a grid from a JSON file; missing keys keep their default values
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, EdaError> {
        let text = std::fs::read_to_string(&path)?;
        serde_json::from_str(&text)
            .map_err(|e| EdaError::InvalidConfig(format!("cannot parse parameter grid: {}", e)))
    }

    /// Number of combinations in the grid
    pub fn len(&self) -> usize {
        self.jobs.len()
            * self.machines.len()
            * self.population_size.len()
            * self.generations.len()
            * self.to_matrix_percent.len()
            * self.elitism_count.len()
            * self.mutation_prob_percent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cartesian product of all value lists, the last parameter varying fastest
    pub fn combinations(&self, seed: u64) -> Vec<EDAConfig> {
        let mut configs = Vec::with_capacity(self.len());

        for &jobs in &self.jobs {
            for &machines in &self.machines {
                for &population_size in &self.population_size {
                    for &generations in &self.generations {
                        for &to_matrix_percent in &self.to_matrix_percent {
                            for &elitism_count in &self.elitism_count {
                                for &mutation_prob_percent in &self.mutation_prob_percent {
                                    configs.push(EDAConfig {
                                        jobs,
                                        machines,
                                        population_size,
                                        generations,
                                        to_matrix_percent,
                                        elitism_count,
                                        mutation_prob_percent,
                                        seed,
                                        parallel_sampling: true,
                                    });
                                }
                            }
                        }
                    }
                }
            }
        }

        configs
    }
}

/// Result of one EDA run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentResult {
    /// Instance name
    pub instance: String,
    pub jobs: usize,
    pub machines: usize,
    pub population_size: usize,
    pub generations: usize,
    pub to_matrix_percent: usize,
    pub elitism_count: usize,
    pub mutation_prob_percent: u32,
    pub seed: u64,
    /// Repetition index of this configuration
    pub run: usize,
    /// Best makespan, absent when the run failed
    pub makespan: Option<f64>,
    /// Computation time in seconds
    pub time: f64,
    /// Why the run failed
    pub error: Option<String>,
    /// RFC 3339 start time
    pub started_at: String,
}

impl ExperimentResult {
    fn new(instance: &str, config: &EDAConfig, run: usize) -> Self {
        ExperimentResult {
            instance: instance.to_string(),
            jobs: config.jobs,
            machines: config.machines,
            population_size: config.population_size,
            generations: config.generations,
            to_matrix_percent: config.to_matrix_percent,
            elitism_count: config.elitism_count,
            mutation_prob_percent: config.mutation_prob_percent,
            seed: config.seed,
            run,
            makespan: None,
            time: 0.0,
            error: None,
            started_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Key identifying the configuration regardless of seed and repetition
    pub fn configuration_key(&self) -> String {
        format!(
            "{}x{} numInd={} numGen={} toMatrix={} elitism={} mutate={}",
            self.jobs,
            self.machines,
            self.population_size,
            self.generations,
            self.to_matrix_percent,
            self.elitism_count,
            self.mutation_prob_percent
        )
    }
}

/// Aggregated statistics for one configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigurationStatistics {
    pub configuration: String,
    /// Number of runs attempted
    pub num_runs: usize,
    /// Number of runs that produced a makespan
    pub num_succeeded: usize,
    pub best_makespan: f64,
    pub avg_makespan: f64,
    pub worst_makespan: f64,
    pub std_makespan: f64,
    pub avg_time: f64,
    pub total_time: f64,
}

/// Sweep configuration
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// Number of runs per configuration, each with its own seed
    pub num_runs: usize,
    /// Seed of the first run; run `r` uses `seed + r`
    pub seed: u64,
    /// Sample offspring on the rayon pool
    pub parallel_sampling: bool,
    /// Draw a progress bar on stderr
    pub show_progress: bool,
}

impl Default for SweepConfig {
    fn default() -> Self {
        SweepConfig {
            num_runs: 1,
            seed: 42,
            parallel_sampling: true,
            show_progress: true,
        }
    }
}

/// Sweep engine
pub struct Benchmark {
    config: SweepConfig,
    results: Vec<ExperimentResult>,
}

impl Benchmark {
    pub fn new(config: SweepConfig) -> Self {
        Benchmark {
            config,
            results: Vec::new(),
        }
    }

    /// Run one configuration on an already built matrix and record the outcome
    pub fn run_configuration(
        &mut self,
        matrix: &ProcessingTimeMatrix,
        config: &EDAConfig,
        run: usize,
    ) -> &ExperimentResult {
        let mut result = ExperimentResult::new(&matrix.name, config, run);

        match EstimationOfDistribution::new(matrix, config.clone()).and_then(|mut eda| eda.run()) {
            Ok(solution) => {
                result.makespan = Some(solution.makespan);
                result.time = solution.computation_time;
            }
            Err(e) => {
                log::error!("Configuration [{}] failed: {}", config, e);
                result.error = Some(e.to_string());
            }
        }

        self.results.push(result);
        &self.results[self.results.len() - 1]
    }

    /// Run every combination of the grid against flat row-major processing times.
    ///
    /// The matrix is reshaped per combination, so a combination whose
    /// dimensions do not match the data fails on its own.
    pub fn run_grid(&mut self, name: &str, times: &[f64], grid: &ParameterGrid) {
        let combinations = grid.combinations(self.config.seed);
        let total = (combinations.len() * self.config.num_runs) as u64;

        let progress = if self.config.show_progress {
            ProgressBar::new(total)
        } else {
            ProgressBar::hidden()
        };
        if let Ok(style) = ProgressStyle::with_template("{bar:40} {pos}/{len} [{elapsed_precise}] {msg}") {
            progress.set_style(style);
        }

        log::info!(
            "Running {} combinations x {} runs on {}",
            combinations.len(),
            self.config.num_runs,
            name
        );

        for (i, combination) in combinations.iter().enumerate() {
            log::info!("Combination {}: {}", i + 1, combination);

            let matrix = ProcessingTimeMatrix::from_flat(times.to_vec(), combination.jobs, combination.machines)
                .map(|mut m| {
                    m.name = name.to_string();
                    m
                });

            for run in 0..self.config.num_runs {
                let config = EDAConfig {
                    seed: self.config.seed.wrapping_add(run as u64),
                    parallel_sampling: self.config.parallel_sampling,
                    ..combination.clone()
                };

                match &matrix {
                    Ok(matrix) => {
                        let result = self.run_configuration(matrix, &config, run);
                        if let Some(makespan) = result.makespan {
                            progress.set_message(format!("last {:.2}", makespan));
                        }
                    }
                    Err(e) => {
                        log::error!("Configuration [{}] failed: {}", config, e);
                        let mut result = ExperimentResult::new(name, &config, run);
                        result.error = Some(e.to_string());
                        self.results.push(result);
                    }
                }

                progress.inc(1);
            }
        }

        progress.finish_and_clear();
    }

    /// Compute statistics for each configuration
    pub fn compute_statistics(&self) -> Vec<ConfigurationStatistics> {
        let mut grouped: BTreeMap<String, Vec<&ExperimentResult>> = BTreeMap::new();

        for result in &self.results {
            grouped.entry(result.configuration_key()).or_default().push(result);
        }

        let mut statistics = Vec::new();

        for (configuration, results) in grouped {
            let succeeded: Vec<&&ExperimentResult> = results.iter().filter(|r| r.makespan.is_some()).collect();
            if succeeded.is_empty() {
                continue;
            }

            let makespans: Vec<f64> = succeeded.iter().filter_map(|r| r.makespan).collect();
            let times: Vec<f64> = succeeded.iter().map(|r| r.time).collect();

            let std = if makespans.len() > 1 {
                Statistics::std_dev(makespans.iter())
            } else {
                0.0
            };

            statistics.push(ConfigurationStatistics {
                configuration,
                num_runs: results.len(),
                num_succeeded: succeeded.len(),
                best_makespan: makespans.iter().cloned().fold(f64::INFINITY, f64::min),
                avg_makespan: Statistics::mean(makespans.iter()),
                worst_makespan: makespans.iter().cloned().fold(0.0, f64::max),
                std_makespan: std,
                avg_time: Statistics::mean(times.iter()),
                total_time: times.iter().sum(),
            });
        }

        statistics.sort_by(|a, b| a.avg_makespan.total_cmp(&b.avg_makespan));

        statistics
    }

    /// Export results to CSV
    pub fn export_to_csv<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        for result in &self.results {
            writer.serialize(result)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Export statistics to CSV
    pub fn export_statistics_csv<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        for stat in self.compute_statistics() {
            writer.serialize(stat)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Generate summary report
    pub fn generate_report(&self) -> String {
        let mut report = String::new();

        report.push_str("========================================\n");
        report.push_str("        EDA Parameter Sweep Report\n");
        report.push_str("========================================\n");
        report.push_str(&format!("Generated: {}\n\n", chrono::Local::now().format("%Y-%m-%d %H:%M:%S")));

        let stats = self.compute_statistics();

        report.push_str("Configuration Performance Summary:\n");
        report.push_str("-".repeat(100).as_str());
        report.push('\n');
        report.push_str(&format!(
            "{:<55} {:>8} {:>10} {:>10} {:>8} {:>8}\n",
            "Configuration", "Runs", "Best", "Avg", "Std", "Time"
        ));
        report.push_str("-".repeat(100).as_str());
        report.push('\n');

        for stat in &stats {
            report.push_str(&format!(
                "{:<55} {:>8} {:>10.2} {:>10.2} {:>8.2} {:>8.2}\n",
                stat.configuration,
                format!("{}/{}", stat.num_succeeded, stat.num_runs),
                stat.best_makespan,
                stat.avg_makespan,
                stat.std_makespan,
                stat.avg_time
            ));
        }

        report.push_str("-".repeat(100).as_str());
        report.push('\n');

        let failures: Vec<&ExperimentResult> = self.results.iter().filter(|r| r.error.is_some()).collect();
        if !failures.is_empty() {
            report.push_str(&format!("\nFailed runs ({}):\n", failures.len()));
            for failure in failures {
                report.push_str(&format!(
                    "  [{}] run {}: {}\n",
                    failure.configuration_key(),
                    failure.run,
                    failure.error.as_deref().unwrap_or("")
                ));
            }
        }

        if let Some(best) = stats.first() {
            report.push_str(&format!(
                "\nBest configuration: {} (avg {:.2}, best {:.2})\n",
                best.configuration, best.avg_makespan, best.best_makespan
            ));
        }

        report
    }

    /// Get all results
    pub fn results(&self) -> &[ExperimentResult] {
        &self.results
    }
}
