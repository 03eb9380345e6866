use crate::domain::{ReductionError, ReductionResult};

const TIME_METADATA: &str = "INPUT.TIME_METADATA";

fn metadata_error(message: impl Into<String>) -> ReductionError {
    ReductionError::input_validation(TIME_METADATA, message)
}

/// Contents of `deck/dt.txt`.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeMetadata {
    /// Injection time before the reporting window opens [s].
    pub injection_time: f64,
    /// Restart steps written before the reporting window.
    pub skipped_steps: usize,
    /// Cumulative report times from the window start [s], beginning at 0.
    pub cumulative_times: Vec<f64>,
}

pub fn parse_time_metadata(source: &str) -> ReductionResult<TimeMetadata> {
    let mut lines = source.lines().filter(|line| !line.trim().is_empty());
    let mut next_line = |what: &str| {
        lines
            .next()
            .map(str::trim)
            .ok_or_else(|| metadata_error(format!("missing {what} line")))
    };

    let injection_line = next_line("injection time")?;
    let injection_time = injection_line
        .trim_end_matches(',')
        .parse::<f64>()
        .map_err(|_| metadata_error(format!("invalid injection time '{injection_line}'")))?;

    let skipped_line = next_line("skipped restart count")?;
    let skipped_steps = skipped_line
        .trim_end_matches(',')
        .parse::<usize>()
        .map_err(|_| metadata_error(format!("invalid skipped restart count '{skipped_line}'")))?;

    let times_line = next_line("report times")?;
    let cumulative_times = times_line
        .split(|ch: char| ch.is_whitespace() || ch == ',')
        .filter(|token| !token.is_empty())
        .map(|token| {
            token
                .parse::<f64>()
                .map_err(|_| metadata_error(format!("invalid report time '{token}'")))
        })
        .collect::<ReductionResult<Vec<_>>>()?;

    Ok(TimeMetadata {
        injection_time,
        skipped_steps,
        cumulative_times,
    })
}

/// Reporting window of a run, aligned with the restart report steps.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeBase {
    pub injection_time: f64,
    /// Report step sitting at time zero of the window.
    pub skipped_steps: usize,
    /// 0 when no restart steps were skipped, 1 otherwise.
    pub offset: usize,
    /// Times [s] of report steps `skipped_steps + 1 .. report_steps - 1`.
    pub restart_times: Vec<f64>,
}

impl TimeBase {
    pub fn new(metadata: TimeMetadata, report_steps: usize) -> ReductionResult<Self> {
        let t1 = metadata.skipped_steps;
        if report_steps < t1 + 2 {
            return Err(metadata_error(format!(
                "{report_steps} report steps leave no reporting window after skipping {t1}"
            )));
        }
        let needed = report_steps - t1 - 1;
        if metadata.cumulative_times.len() < needed + 1 {
            return Err(metadata_error(format!(
                "{} report times listed, {} required for {report_steps} report steps",
                metadata.cumulative_times.len(),
                needed + 1
            )));
        }
        let restart_times = metadata.cumulative_times[1..=needed].to_vec();
        if !restart_times.windows(2).all(|pair| pair[0] <= pair[1]) {
            return Err(metadata_error("report times must be non-decreasing"));
        }

        Ok(Self {
            injection_time: metadata.injection_time,
            skipped_steps: t1,
            offset: usize::from(t1 > 0),
            restart_times,
        })
    }

    pub fn last_restart_time(&self) -> f64 {
        self.restart_times.last().copied().unwrap_or(0.0)
    }

    /// `[0] + restart_times`, the time of every report step from the window
    /// start onwards.
    pub fn report_axis(&self) -> Vec<f64> {
        let mut axis = Vec::with_capacity(self.restart_times.len() + 1);
        axis.push(0.0);
        axis.extend_from_slice(&self.restart_times);
        axis
    }

    /// Report steps `skipped_steps ..` that belong to the window.
    pub fn window_steps(&self) -> std::ops::Range<usize> {
        self.skipped_steps..self.skipped_steps + self.restart_times.len() + 1
    }
}

/// For every restart step `i` in `t1 + 1 ..= n`, the number of summary
/// entries whose report step is strictly below `i`.
pub fn summary_step_map(summary_report_steps: &[usize], t1: usize, n: usize) -> Vec<usize> {
    (t1 + 1..=n)
        .map(|step| {
            summary_report_steps
                .iter()
                .filter(|report| **report < step)
                .count()
        })
        .collect()
}
