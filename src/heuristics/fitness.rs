//! Makespan evaluation.

use crate::error::EdaError;
use crate::instance::ProcessingTimeMatrix;
use crate::solution::Individual;

/// Total processing time assigned to each machine
pub fn machine_loads(matrix: &ProcessingTimeMatrix, individual: &Individual) -> Result<Vec<f64>, EdaError> {
    individual.validate(matrix.jobs(), matrix.machines())?;

    let mut loads = vec![0.0; matrix.machines()];
    for (job, &machine) in individual.genes.iter().enumerate() {
        loads[machine] += matrix.time(job, machine);
    }

    Ok(loads)
}

/// Makespan of an individual: the largest machine load (lower is better)
pub fn evaluate(matrix: &ProcessingTimeMatrix, individual: &Individual) -> Result<f64, EdaError> {
    let loads = machine_loads(matrix, individual)?;
    Ok(loads.into_iter().fold(0.0, f64::max))
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
    fn test_makespan_two_machines() {
        let ind = Individual::new(vec![0, 1, 0, 0]);
        // machine 0: 2 + 5 + 1, machine 1: 3
        assert_eq!(machine_loads(&matrix(), &ind).unwrap(), vec![8.0, 3.0]);
        assert_eq!(evaluate(&matrix(), &ind).unwrap(), 8.0);
    }

    #[test]
    fn test_evaluate_is_deterministic() {
        let m = matrix();
        let ind = Individual::new(vec![1, 0, 1, 0]);
        let first = evaluate(&m, &ind).unwrap();
        for _ in 0..10 {
            assert_eq!(evaluate(&m, &ind).unwrap(), first);
        }
        assert_eq!(first, 13.0);
    }

    #[test]
    fn test_precondition_violations() {
        let m = matrix();
        assert!(matches!(
            evaluate(&m, &Individual::new(vec![0, 1])),
            Err(EdaError::IndividualLength { .. })
        ));
        assert!(matches!(
            evaluate(&m, &Individual::new(vec![0, 1, 2, 0])),
            Err(EdaError::GeneOutOfRange { job: 2, .. })
        ));
    }
}
