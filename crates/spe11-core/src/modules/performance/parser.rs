use crate::domain::{ReductionError, ReductionResult};

pub(crate) const PERFORMANCE_RECORD: &str = "INPUT.PERFORMANCE_RECORD";
const MIN_COLUMNS: usize = 12;

/// One accepted or failed nonlinear step from the solver log.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InfoRecord {
    /// Simulated time [day].
    pub time: f64,
    /// Step size [day].
    pub step: f64,
    /// Sum of the assembly, linear-solve and remaining runtime columns [s].
    pub runtime: f64,
    pub linear_solve_time: f64,
    pub residual_evaluations: f64,
    pub newton_iterations: f64,
    pub linear_iterations: f64,
    /// 1 for accepted, 0 for failed steps.
    pub accepted: f64,
}

impl InfoRecord {
    fn from_columns(columns: &[f64]) -> Self {
        Self {
            time: columns[0],
            step: columns[1],
            runtime: columns[2] + columns[4] + columns[5] + columns[6],
            linear_solve_time: columns[4],
            residual_evaluations: columns[8],
            newton_iterations: columns[9],
            linear_iterations: columns[10],
            accepted: columns[11],
        }
    }
}

/// Parses the whitespace-delimited solver log, skipping its header line.
pub fn parse_infostep(source: &str) -> ReductionResult<Vec<InfoRecord>> {
    let mut records = Vec::new();
    for (index, line) in source.lines().enumerate().skip(1) {
        let line_number = index + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let columns = trimmed
            .split_whitespace()
            .map(|token| {
                token.parse::<f64>().map_err(|_| {
                    ReductionError::input_validation(
                        PERFORMANCE_RECORD,
                        format!("unparsable value '{token}' at line {line_number}"),
                    )
                })
            })
            .collect::<ReductionResult<Vec<_>>>()?;
        if columns.len() < MIN_COLUMNS {
            return Err(ReductionError::input_validation(
                PERFORMANCE_RECORD,
                format!(
                    "line {line_number} has {} columns, expected at least {MIN_COLUMNS}",
                    columns.len()
                ),
            ));
        }
        records.push(InfoRecord::from_columns(&columns));
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::parse_infostep;

    const HEADER: &str = "Time(day) TStep(day) Assembly(sec) LinSetup(sec) LinSolve(sec) \
                          Update(sec) Output(sec) Conv Nres NIter LIter Accepted";

    #[test]
    fn records_sum_runtime_columns() {
        let source = format!("{HEADER}\n0 0.5 1 9 2 3 4 0 5 6 7 1\n");
        let records = parse_infostep(&source).expect("records");

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].time, 0.0);
        assert_eq!(records[0].step, 0.5);
        assert_eq!(records[0].runtime, 10.0);
        assert_eq!(records[0].linear_solve_time, 2.0);
        assert_eq!(records[0].residual_evaluations, 5.0);
        assert_eq!(records[0].newton_iterations, 6.0);
        assert_eq!(records[0].linear_iterations, 7.0);
        assert_eq!(records[0].accepted, 1.0);
    }

    #[test]
    fn malformed_rows_are_fatal_with_line_numbers() {
        let source = format!("{HEADER}\n0 1 1 0 1 1 1 0 1 1 1 1\n0 1 x 0 1 1 1 0 1 1 1 1\n");
        let error = parse_infostep(&source).expect_err("unparsable value");
        assert_eq!(error.placeholder(), "INPUT.PERFORMANCE_RECORD");
        assert_eq!(error.message(), "unparsable value 'x' at line 3");

        let source = format!("{HEADER}\n0 1 1 0 1\n");
        let error = parse_infostep(&source).expect_err("short row");
        assert_eq!(error.message(), "line 2 has 5 columns, expected at least 12");
    }
}
