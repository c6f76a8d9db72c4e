//! EDA Scheduler - Command Line Interface
//!
//! Makespan minimisation on unrelated parallel machines with an
//! Estimation-of-Distribution Algorithm.

use clap::{Parser, Subcommand};
use eda_scheduler::benchmark::{Benchmark, ParameterGrid, SweepConfig};
use eda_scheduler::heuristics::eda::{EDAConfig, EstimationOfDistribution};
use eda_scheduler::instance::ProcessingTimeMatrix;

use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "eda-scheduler")]
#[command(author = "M2 AI2D Student")]
#[command(version = "1.0")]
#[command(about = "EDA for makespan minimisation on unrelated parallel machines")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the EDA once on an ETC file
    Solve {
        /// ETC file (one processing time per line, row-major)
        #[arg(short, long)]
        data: PathBuf,

        /// Number of jobs
        #[arg(short, long, default_value = "512")]
        jobs: usize,

        /// Number of machines
        #[arg(short, long, default_value = "16")]
        machines: usize,

        /// Population size
        #[arg(short, long, default_value = "100")]
        population: usize,

        /// Number of generations
        #[arg(short, long, default_value = "100")]
        generations: usize,

        /// Percentage of the ranked population used to build the model
        #[arg(long, default_value = "10")]
        to_matrix: usize,

        /// Number of elites copied into the next generation
        #[arg(long, default_value = "10")]
        elitism: usize,

        /// Per-individual mutation probability in percent
        #[arg(long, default_value = "10")]
        mutate: u32,

        /// Random seed
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Sample offspring sequentially
        #[arg(long)]
        sequential: bool,

        /// Output solution to file (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Run a parameter sweep on an ETC file
    Sweep {
        /// ETC file (one processing time per line, row-major)
        #[arg(short, long)]
        data: PathBuf,

        /// JSON parameter grid (defaults to the reference grid)
        #[arg(short, long)]
        grid: Option<PathBuf>,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Number of runs per configuration
        #[arg(short, long, default_value = "1")]
        runs: usize,

        /// Seed of the first run
        #[arg(short, long, default_value = "42")]
        seed: u64,
    },

    /// Print statistics of an ETC file
    Analyze {
        /// ETC file (one processing time per line, row-major)
        #[arg(short, long)]
        data: PathBuf,

        /// Number of jobs
        #[arg(short, long, default_value = "512")]
        jobs: usize,

        /// Number of machines
        #[arg(short, long, default_value = "16")]
        machines: usize,
    },
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Solve {
            data,
            jobs,
            machines,
            population,
            generations,
            to_matrix,
            elitism,
            mutate,
            seed,
            sequential,
            output,
            verbose,
        } => {
            let config = EDAConfig {
                jobs,
                machines,
                population_size: population,
                generations,
                to_matrix_percent: to_matrix,
                elitism_count: elitism,
                mutation_prob_percent: mutate,
                seed,
                parallel_sampling: !sequential,
            };
            solve_instance(&data, config, output, verbose);
        }

        Commands::Sweep { data, grid, output, runs, seed } => {
            run_sweep(&data, grid, &output, runs, seed);
        }

        Commands::Analyze { data, jobs, machines } => {
            analyze_instance(&data, jobs, machines);
        }
    }
}

fn load_matrix(path: &PathBuf, jobs: usize, machines: usize) -> ProcessingTimeMatrix {
    println!("Loading instance from {:?}...", path);

    match ProcessingTimeMatrix::from_file(path, jobs, machines) {
        Ok(matrix) => matrix,
        Err(e) => {
            eprintln!("Error loading instance: {}", e);
            std::process::exit(1);
        }
    }
}

fn solve_instance(path: &PathBuf, config: EDAConfig, output: Option<PathBuf>, verbose: bool) {
    let matrix = load_matrix(path, config.jobs, config.machines);

    if verbose {
        println!("{}", matrix.statistics());
    }

    println!("Solving with {}...", config);

    let mut eda = match EstimationOfDistribution::new(&matrix, config.clone()) {
        Ok(eda) => eda,
        Err(e) => {
            eprintln!("Invalid configuration [{}]: {}", config, e);
            std::process::exit(1);
        }
    };

    let solution = match eda.run() {
        Ok(solution) => solution,
        Err(e) => {
            eprintln!("Run failed [{}]: {}", config, e);
            std::process::exit(1);
        }
    };

    println!("\n========== Results ==========");
    println!("Algorithm: {}", solution.algorithm);
    println!("Makespan: {:.6}", solution.makespan);
    println!("Time: {:.2}s", solution.computation_time);
    if let Some(iter) = solution.iterations {
        println!("Generations: {}", iter);
    }

    if verbose {
        if let Some(m) = solution.critical_machine() {
            println!("Critical machine: M{}", m);
        }
        println!("\nMachine loads:");
        let counts = solution.jobs_per_machine();
        for (m, load) in solution.machine_loads.iter().enumerate() {
            println!("  M{:<3} {:>12.2}  ({} jobs)", m, load, counts[m]);
        }
        println!("\nConvergence:");
        for record in eda.trace() {
            println!(
                "  gen {:>4}  best {:>12.2}  mean {:>12.2}  worst {:>12.2}",
                record.generation, record.best, record.mean, record.worst
            );
        }
        println!("\nAssignment: {:?}", solution.assignment);
    }

    if let Some(out_path) = output {
        let written = serde_json::to_string_pretty(&solution)
            .map_err(|e| e.to_string())
            .and_then(|json| std::fs::write(&out_path, json).map_err(|e| e.to_string()));

        match written {
            Ok(()) => println!("\nSolution saved to {:?}", out_path),
            Err(e) => {
                eprintln!("Failed to write output: {}", e);
                std::process::exit(1);
            }
        }
    }
}

fn run_sweep(path: &PathBuf, grid_path: Option<PathBuf>, output: &PathBuf, runs: usize, seed: u64) {
    println!("Loading processing times from {:?}...", path);

    let times = match ProcessingTimeMatrix::read_values(path) {
        Ok(values) => values,
        Err(e) => {
            eprintln!("Error loading instance: {}", e);
            std::process::exit(1);
        }
    };

    let grid = match grid_path {
        Some(p) => match ParameterGrid::from_json_file(&p) {
            Ok(grid) => grid,
            Err(e) => {
                eprintln!("Error loading parameter grid: {}", e);
                std::process::exit(1);
            }
        },
        None => ParameterGrid::default(),
    };

    if grid.is_empty() {
        eprintln!("Parameter grid has no combinations!");
        std::process::exit(1);
    }

    println!("Found {} combinations, {} run(s) each", grid.len(), runs);

    if let Err(e) = std::fs::create_dir_all(output) {
        eprintln!("Failed to create output directory: {}", e);
        std::process::exit(1);
    }

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let mut benchmark = Benchmark::new(SweepConfig {
        num_runs: runs,
        seed,
        ..Default::default()
    });
    benchmark.run_grid(&name, &times, &grid);

    let results_path = output.join("results.csv");
    match benchmark.export_to_csv(&results_path) {
        Ok(()) => println!("\nResults exported to {:?}", results_path),
        Err(e) => eprintln!("Failed to export results: {}", e),
    }

    let stats_path = output.join("statistics.csv");
    match benchmark.export_statistics_csv(&stats_path) {
        Ok(()) => println!("Statistics exported to {:?}", stats_path),
        Err(e) => eprintln!("Failed to export statistics: {}", e),
    }

    let report = benchmark.generate_report();
    println!("\n{}", report);

    let report_path = output.join("report.txt");
    match std::fs::write(&report_path, &report) {
        Ok(()) => println!("Report saved to {:?}", report_path),
        Err(e) => eprintln!("Failed to save report: {}", e),
    }

    let failed = benchmark.results().iter().filter(|r| r.error.is_some()).count();
    if failed > 0 {
        eprintln!("{} run(s) failed, see the report for details", failed);
        std::process::exit(1);
    }
}

fn analyze_instance(path: &PathBuf, jobs: usize, machines: usize) {
    let matrix = load_matrix(path, jobs, machines);

    println!("========== Instance Analysis ==========\n");
    println!("{}", matrix.statistics());

    // Machine that is fastest for each job, and how often each machine wins
    let mut fastest_count = vec![0usize; machines];
    for row in matrix.rows() {
        let best = row
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.total_cmp(b.1))
            .map(|(m, _)| m)
            .unwrap_or(0);
        fastest_count[best] += 1;
    }

    println!("Fastest machine per job:");
    for (m, count) in fastest_count.iter().enumerate() {
        println!("  M{:<3} {:>5} jobs", m, count);
    }
}
