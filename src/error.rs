//! Error type shared by the matrix loader, the EDA operators and the
//! experiment harness.

use thiserror::Error;

/// Errors raised while loading data or running the EDA.
///
/// Every precondition the operators rely on has its own variant so that a
/// failed run reports what went wrong instead of producing a bogus makespan.
#[derive(Debug, Error)]
pub enum EdaError {
    /// Flat input data does not hold exactly `jobs * machines` values.
    #[error("expected {expected} processing times ({jobs} jobs x {machines} machines), got {actual}")]
    DataLength {
        jobs: usize,
        machines: usize,
        expected: usize,
        actual: usize,
    },

    /// Matrix shape disagrees with the configured problem size.
    #[error("matrix is {actual_jobs}x{actual_machines} but configuration expects {jobs}x{machines}")]
    DimensionMismatch {
        jobs: usize,
        machines: usize,
        actual_jobs: usize,
        actual_machines: usize,
    },

    /// A processing time is negative, NaN or infinite.
    #[error("invalid processing time {value} for job {job} on machine {machine}")]
    InvalidTime { job: usize, machine: usize, value: f64 },

    /// An individual does not carry one gene per job.
    #[error("individual has {actual} genes, expected {expected}")]
    IndividualLength { expected: usize, actual: usize },

    /// A gene names a machine that does not exist.
    #[error("job {job} assigned to machine {machine}, but only {machines} machines exist")]
    GeneOutOfRange {
        job: usize,
        machine: usize,
        machines: usize,
    },

    /// An operation that needs at least one individual received none.
    #[error("empty population passed to {0}")]
    EmptyPopulation(&'static str),

    /// A probability row has no weight to sample from.
    #[error("probability row for job {job} sums to zero")]
    ZeroWeightRow { job: usize },

    /// A configuration value is outside its allowed range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The matrix source could not be read.
    #[error("cannot read processing times: {0}")]
    Io(#[from] std::io::Error),

    /// A token of the matrix source is not a number.
    #[error("line {line}: cannot parse '{token}' as a processing time")]
    Parse { line: usize, token: String },
}

impl EdaError {
    /// Whether the error comes from reading external input rather than from
    /// a violated precondition of the algorithm.
    pub fn is_input_error(&self) -> bool {
        matches!(self, EdaError::Io(_) | EdaError::Parse { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let io = EdaError::from(std::io::Error::new(std::io::ErrorKind::NotFound, "missing"));
        assert!(io.is_input_error());
        assert!(EdaError::Parse { line: 3, token: "x".into() }.is_input_error());
        assert!(!EdaError::ZeroWeightRow { job: 1 }.is_input_error());
    }

    #[test]
    fn test_error_messages_name_the_precondition() {
        let err = EdaError::GeneOutOfRange { job: 2, machine: 7, machines: 4 };
        assert_eq!(
            err.to_string(),
            "job 2 assigned to machine 7, but only 4 machines exist"
        );
    }
}
