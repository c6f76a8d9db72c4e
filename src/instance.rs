//! Module for loading and representing processing-time matrices.
//!
//! An instance of the unrelated parallel machines problem is a `jobs x machines`
//! matrix where entry `(j, m)` is the time machine `m` needs to process job `j`.
//! Files follow the ETC layout (one value per line, row-major), as in the
//! Braun et al. benchmark set (`512x16/u_c_hihi.0` and friends).

use crate::error::EdaError;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Immutable processing-time matrix for one experiment run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawMatrix")]
pub struct ProcessingTimeMatrix {
    /// Name of the instance (file stem when loaded from disk)
    pub name: String,
    /// Number of jobs (rows)
    jobs: usize,
    /// Number of machines (columns)
    machines: usize,
    /// Row-major processing times
    times: Vec<f64>,
}

/// Serialized form, checked by `from_flat` on the way in
#[derive(Deserialize)]
struct RawMatrix {
    #[serde(default)]
    name: String,
    jobs: usize,
    machines: usize,
    times: Vec<f64>,
}

impl TryFrom<RawMatrix> for ProcessingTimeMatrix {
    type Error = EdaError;

    fn try_from(raw: RawMatrix) -> Result<Self, Self::Error> {
        let mut matrix = ProcessingTimeMatrix::from_flat(raw.times, raw.jobs, raw.machines)?;
        matrix.name = raw.name;
        Ok(matrix)
    }
}

impl ProcessingTimeMatrix {
    /// Reshape a flat row-major sequence into `jobs` rows of `machines` columns
    pub fn from_flat(values: Vec<f64>, jobs: usize, machines: usize) -> Result<Self, EdaError> {
        if jobs == 0 || machines == 0 {
            return Err(EdaError::InvalidConfig(format!(
                "matrix needs at least one job and one machine, got {}x{}",
                jobs, machines
            )));
        }

        let expected = jobs * machines;
        if values.len() != expected {
            return Err(EdaError::DataLength {
                jobs,
                machines,
                expected,
                actual: values.len(),
            });
        }

        for (idx, &value) in values.iter().enumerate() {
            if !value.is_finite() || value < 0.0 {
                return Err(EdaError::InvalidTime {
                    job: idx / machines,
                    machine: idx % machines,
                    value,
                });
            }
        }

        Ok(ProcessingTimeMatrix {
            name: String::new(),
            jobs,
            machines,
            times: values,
        })
    }

    /// Build a matrix from explicit rows (all rows must have the same length)
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, EdaError> {
        let jobs = rows.len();
        let machines = rows.first().map(|r| r.len()).unwrap_or(0);

        let flat: Vec<f64> = rows.iter().flatten().copied().collect();

        // A ragged matrix can still have jobs * machines cells in total
        if rows.iter().any(|r| r.len() != machines) {
            return Err(EdaError::DataLength {
                jobs,
                machines,
                expected: jobs * machines,
                actual: flat.len(),
            });
        }

        Self::from_flat(flat, jobs, machines)
    }

    /// Read every whitespace-separated number of a text file, in order
    pub fn read_values<P: AsRef<Path>>(path: P) -> Result<Vec<f64>, EdaError> {
        let file = File::open(&path)?;
        let reader = BufReader::new(file);

        let mut values = Vec::new();

        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;

            for token in line.split_whitespace() {
                let value: f64 = token.parse().map_err(|_| EdaError::Parse {
                    line: line_no + 1,
                    token: token.to_string(),
                })?;
                values.push(value);
            }
        }

        Ok(values)
    }

    /// Load an ETC file and reshape it into a `jobs x machines` matrix
    pub fn from_file<P: AsRef<Path>>(path: P, jobs: usize, machines: usize) -> Result<Self, EdaError> {
        let values = Self::read_values(&path)?;
        let mut matrix = Self::from_flat(values, jobs, machines)?;

        matrix.name = path
            .as_ref()
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        Ok(matrix)
    }

    /// Number of jobs
    #[inline]
    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// Number of machines
    #[inline]
    pub fn machines(&self) -> usize {
        self.machines
    }

    /// Time machine `machine` needs for job `job`
    #[inline]
    pub fn time(&self, job: usize, machine: usize) -> f64 {
        self.times[job * self.machines + machine]
    }

    /// Processing times of one job on every machine
    #[inline]
    pub fn row(&self, job: usize) -> &[f64] {
        &self.times[job * self.machines..(job + 1) * self.machines]
    }

    /// Iterate over the rows of the matrix
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.times.chunks(self.machines)
    }

    /// Get statistics about the instance
    pub fn statistics(&self) -> InstanceStatistics {
        let min_time = self.times.iter().cloned().fold(f64::INFINITY, f64::min);
        let max_time = self.times.iter().cloned().fold(0.0, f64::max);
        let avg_time = self.times.iter().sum::<f64>() / self.times.len() as f64;

        // Every job runs at least as long as its fastest machine; spreading that
        // work perfectly gives a lower bound, and so does the slowest such job.
        let fastest: Vec<f64> = self
            .rows()
            .map(|row| row.iter().cloned().fold(f64::INFINITY, f64::min))
            .collect();
        let spread_bound = fastest.iter().sum::<f64>() / self.machines as f64;
        let job_bound = fastest.iter().cloned().fold(0.0, f64::max);

        InstanceStatistics {
            name: self.name.clone(),
            jobs: self.jobs,
            machines: self.machines,
            min_time,
            max_time,
            avg_time,
            makespan_lower_bound: spread_bound.max(job_bound),
        }
    }
}

/// Statistics about a processing-time matrix
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceStatistics {
    pub name: String,
    pub jobs: usize,
    pub machines: usize,
    pub min_time: f64,
    pub max_time: f64,
    pub avg_time: f64,
    pub makespan_lower_bound: f64,
}

impl std::fmt::Display for InstanceStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Instance: {}", self.name)?;
        writeln!(f, "  Jobs: {}", self.jobs)?;
        writeln!(f, "  Machines: {}", self.machines)?;
        writeln!(f, "  Min time: {:.2}", self.min_time)?;
        writeln!(f, "  Max time: {:.2}", self.max_time)?;
        writeln!(f, "  Avg time: {:.2}", self.avg_time)?;
        writeln!(f, "  Makespan lower bound: {:.2}", self.makespan_lower_bound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_flat_reshapes_row_major() {
        let matrix = ProcessingTimeMatrix::from_flat(vec![2.0, 8.0, 6.0, 3.0, 5.0, 5.0], 3, 2).unwrap();

        assert_eq!(matrix.jobs(), 3);
        assert_eq!(matrix.machines(), 2);
        assert_eq!(matrix.row(1), &[6.0, 3.0]);
        assert_eq!(matrix.time(2, 0), 5.0);
        assert_eq!(matrix.rows().count(), 3);
    }

    #[test]
    fn test_wrong_length_is_rejected() {
        let err = ProcessingTimeMatrix::from_flat(vec![1.0; 7], 4, 2).unwrap_err();
        assert!(matches!(err, EdaError::DataLength { expected: 8, actual: 7, .. }));
    }

    #[test]
    fn test_negative_time_is_rejected() {
        let err = ProcessingTimeMatrix::from_flat(vec![1.0, -2.0, 3.0, 4.0], 2, 2).unwrap_err();
        assert!(matches!(err, EdaError::InvalidTime { job: 0, machine: 1, .. }));
    }

    #[test]
    fn test_deserialize_validates_times() {
        let short = serde_json::from_str::<ProcessingTimeMatrix>(
            r#"{"name":"x","jobs":2,"machines":2,"times":[1.0]}"#,
        );
        assert!(short.is_err());

        let negative = serde_json::from_str::<ProcessingTimeMatrix>(
            r#"{"name":"x","jobs":1,"machines":1,"times":[-5.0]}"#,
        );
        assert!(negative.is_err());

        let matrix: ProcessingTimeMatrix = serde_json::from_str(
            r#"{"name":"x","jobs":1,"machines":2,"times":[1.0,2.0]}"#,
        )
        .unwrap();
        assert_eq!(matrix.name, "x");
        assert_eq!(matrix.row(0), &[1.0, 2.0]);
    }

    #[test]
    fn test_ragged_rows_are_rejected() {
        let rows = vec![vec![1.0, 2.0], vec![3.0]];
        assert!(ProcessingTimeMatrix::from_rows(&rows).is_err());
    }

    #[test]
    fn test_from_file() {
        let path = std::env::temp_dir().join(format!("eda-etc-{}.txt", std::process::id()));
        std::fs::write(&path, "2.0\n8.0\n6.0\n3.0\n\n5\n5\n1.5 9.0\n").unwrap();

        let matrix = ProcessingTimeMatrix::from_file(&path, 4, 2).unwrap();
        assert_eq!(matrix.row(3), &[1.5, 9.0]);
        assert!(matrix.name.starts_with("eda-etc-"));

        let err = ProcessingTimeMatrix::from_file(&path, 5, 2).unwrap_err();
        assert!(matches!(err, EdaError::DataLength { .. }));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_unparsable_file() {
        let path = std::env::temp_dir().join(format!("eda-etc-bad-{}.txt", std::process::id()));
        std::fs::write(&path, "1.0\nabc\n").unwrap();

        let err = ProcessingTimeMatrix::from_file(&path, 1, 2).unwrap_err();
        assert!(matches!(err, EdaError::Parse { line: 2, .. }));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_missing_file() {
        let err = ProcessingTimeMatrix::from_file("/nonexistent/etc.0", 1, 1).unwrap_err();
        assert!(err.is_input_error());
    }

    #[test]
    fn test_statistics() {
        let rows = vec![vec![2.0, 8.0], vec![6.0, 3.0], vec![5.0, 5.0], vec![1.0, 9.0]];
        let stats = ProcessingTimeMatrix::from_rows(&rows).unwrap().statistics();

        assert_eq!(stats.min_time, 1.0);
        assert_eq!(stats.max_time, 9.0);
        assert!((stats.avg_time - 4.875).abs() < 1e-10);
        // fastest times 2 + 3 + 5 + 1 = 11 spread over 2 machines
        assert!((stats.makespan_lower_bound - 5.5).abs() < 1e-10);
    }
}
