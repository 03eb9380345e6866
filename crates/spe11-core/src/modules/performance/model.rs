use super::parser::InfoRecord;
use crate::adapter::SimulationData;
use crate::common::constants::{GAS_DEN_REF, SECONDS_IN_DAY};
use crate::domain::{ReductionError, ReductionResult};
use crate::modules::serialization::format_row;
use crate::numerics::{cadence_grid, interpolate_extrapolated, stable_sum};

pub(crate) const PERFORMANCE_HEADER: &str = "# t [s], tstep [s], fsteps [-], mass [kg], dof [-], \
nliter [-], nres [-], liniter [-], runtime [s], tlinsol [s]";

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PerformanceRow {
    pub time: f64,
    pub tstep: f64,
    pub fsteps: f64,
    pub mass: f64,
    pub dof: f64,
    pub nliter: f64,
    pub nres: f64,
    pub liniter: f64,
    pub runtime: f64,
    pub tlinsol: f64,
}

impl PerformanceRow {
    pub fn values(&self) -> [f64; 10] {
        [
            self.time,
            self.tstep,
            self.fsteps,
            self.mass,
            self.dof,
            self.nliter,
            self.nres,
            self.liniter,
            self.runtime,
            self.tlinsol,
        ]
    }
}

#[derive(Debug, Clone, Default)]
struct Bucket {
    accepted_steps: Vec<f64>,
    failed: usize,
    nliter: Vec<f64>,
    nres: Vec<f64>,
    liniter: Vec<f64>,
    runtime: Vec<f64>,
    tlinsol: Vec<f64>,
}

/// Performance time series at the sparse cadence.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceModel {
    rows: Vec<PerformanceRow>,
}

impl PerformanceModel {
    pub fn from_records(
        records: &[InfoRecord],
        data: &SimulationData,
        sparse_t: f64,
    ) -> ReductionResult<Self> {
        let injection_time = data.time_base.injection_time;
        let offset = data.time_base.offset;
        let mut grid = cadence_grid(data.time_base.last_restart_time(), sparse_t);

        let mass_source = data
            .summary
            .vector("FGIP")?
            .iter()
            .map(|fgip| GAS_DEN_REF * fgip)
            .collect::<Vec<_>>();
        let dof = (data.case.dof_per_cell() * data.grid.active_cells()) as f64;

        let mut rows = Vec::with_capacity(grid.len());
        if offset == 0 && !grid.is_empty() {
            rows.push(PerformanceRow::default());
            grid.remove(0);
        }

        let mut buckets = vec![Bucket::default(); grid.len()];
        for record in records {
            let elapsed = SECONDS_IN_DAY * record.time - injection_time;
            if elapsed < -sparse_t {
                continue;
            }
            let bucket = offset as i64 + (elapsed / sparse_t).floor() as i64;
            let Some(bucket) = usize::try_from(bucket)
                .ok()
                .and_then(|index| buckets.get_mut(index))
            else {
                continue;
            };

            let tstep = SECONDS_IN_DAY * record.step * record.accepted;
            if tstep > 0.0 {
                bucket.accepted_steps.push(tstep);
            }
            if record.accepted == 0.0 {
                bucket.failed += 1;
            }
            bucket.nliter.push(record.newton_iterations);
            bucket.nres.push(record.residual_evaluations);
            bucket.liniter.push(record.linear_iterations);
            bucket.runtime.push(record.runtime);
            bucket.tlinsol.push(record.linear_solve_time);
        }

        for (time, bucket) in grid.iter().zip(buckets) {
            let tstep = if bucket.accepted_steps.is_empty() {
                sparse_t
            } else {
                stable_sum(bucket.accepted_steps.iter().copied())
                    / bucket.accepted_steps.len() as f64
            };
            let mass = interpolate_extrapolated(*time, &data.summary.times, &mass_source)
                .ok_or_else(|| {
                    ReductionError::computation(
                        "RUN.INTERPOLATION",
                        "summary time axis cannot interpolate the CO2 mass",
                    )
                })?;
            rows.push(PerformanceRow {
                time: *time,
                tstep,
                fsteps: bucket.failed as f64,
                mass,
                dof,
                nliter: stable_sum(bucket.nliter),
                nres: stable_sum(bucket.nres),
                liniter: stable_sum(bucket.liniter),
                runtime: stable_sum(bucket.runtime),
                tlinsol: stable_sum(bucket.tlinsol),
            });
        }

        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[PerformanceRow] {
        &self.rows
    }

    pub fn render_lines(&self) -> Vec<String> {
        std::iter::once(PERFORMANCE_HEADER.to_string())
            .chain(self.rows.iter().map(|row| format_row(&row.values(), ", ")))
            .collect()
    }
}
