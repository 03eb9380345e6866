//! Normalizes any [`SimulationOutput`] into the [`SimulationData`] the
//! reduction modules share.

mod model;
mod schema;
mod time_base;

pub use model::{Grid, ReportFields, SimulationData, StaticFields, SummarySeries};
pub use schema::{NameSchema, Quantity};
pub use time_base::{TimeBase, TimeMetadata, parse_time_metadata, summary_step_map};

use crate::common::constants::SECONDS_IN_DAY;
use crate::domain::{CaseVariant, ReductionError, ReductionRequest, ReductionResult};
use crate::readers::{NativeCellCenters, SimulationOutput};
use model::field_shape_error;
use std::fs;
use tracing::{debug, info};

/// Summary vectors the reduction modules read, by keyword.
const SUMMARY_KEYWORDS: [&str; 5] = ["FGIP", "RGCDM", "RGCDI", "RWCD", "BGPR"];

/// Reads `deck/dt.txt` and normalizes the output of the run.
pub fn load_simulation_data(
    output: &dyn SimulationOutput,
    request: &ReductionRequest,
) -> ReductionResult<SimulationData> {
    let path = request.deck_dir().join("dt.txt");
    let source = fs::read_to_string(&path).map_err(|error| {
        ReductionError::io_system(
            "IO.TIME_METADATA",
            format!("failed to read time metadata '{}': {error}", path.display()),
        )
    })?;
    build_simulation_data(output, request.case, parse_time_metadata(&source)?)
}

pub fn build_simulation_data(
    output: &dyn SimulationOutput,
    case: CaseVariant,
    metadata: TimeMetadata,
) -> ReductionResult<SimulationData> {
    let schema = NameSchema::detect(output)?;
    let dims = output.dimensions();
    let grid = build_grid(output, case, dims)?;
    let statics = load_static_fields(output, &grid)?;
    let cell_centers = load_cell_centers(output, &grid)?;

    let step_count = output.report_step_count();
    let mut fields = ReportFields::new(step_count);
    for quantity in Quantity::required_for(case) {
        let keyword = quantity.keyword(schema);
        let steps = (0..step_count)
            .map(|step| output.restart_field(keyword, step))
            .collect::<ReductionResult<Vec<_>>>()?;
        fields.insert(quantity, steps, grid.active_cells())?;
    }

    let time_base = TimeBase::new(metadata, step_count)?;
    let summary = load_summary(output, time_base.injection_time)?;
    let step_map = summary_step_map(&summary.report_steps, time_base.skipped_steps, step_count);

    info!(
        backend = %output.backend(),
        schema = ?schema,
        total_cells = grid.total_cells(),
        active_cells = grid.active_cells(),
        report_steps = step_count,
        skipped_steps = time_base.skipped_steps,
        summary_entries = summary.times.len(),
        "loaded simulation output"
    );
    debug!(step_map = ?step_map, "summary entries preceding each restart step");

    Ok(SimulationData {
        case,
        backend: output.backend(),
        schema,
        grid,
        cell_centers,
        statics,
        fields,
        summary,
        time_base,
        step_map,
    })
}

/// Active cells are the cells with strictly positive pore volume; explicit
/// active flags must select the same set.
fn build_grid(
    output: &dyn SimulationOutput,
    case: CaseVariant,
    dims: [usize; 3],
) -> ReductionResult<Grid> {
    let total = dims.iter().product::<usize>();
    let pore_volume = output.static_field("PORV")?;
    if pore_volume.len() != total {
        return Err(field_shape_error(format!(
            "PORV has {} values, expected {total} for grid {dims:?}",
            pore_volume.len()
        )));
    }
    let positive = pore_volume.iter().map(|value| *value > 0.0).collect::<Vec<_>>();

    if let Some(flags) = output.active_flags() {
        if flags.len() != total {
            return Err(field_shape_error(format!(
                "active flags have {} values, expected {total}",
                flags.len()
            )));
        }
        let mismatched = flags
            .iter()
            .zip(&positive)
            .enumerate()
            .filter(|(_, (flag, porv))| flag != porv)
            .map(|(index, _)| index)
            .collect::<Vec<_>>();
        if let Some(first) = mismatched.first() {
            return Err(ReductionError::input_validation(
                "INPUT.ACTIVE_CELL_MISMATCH",
                format!(
                    "active flags and positive pore volume disagree on {} cells (first at global index {first})",
                    mismatched.len()
                ),
            ));
        }
    }

    Ok(Grid::new(dims, case.extents(), &positive))
}

fn active_sized(output: &dyn SimulationOutput, name: &str, grid: &Grid) -> ReductionResult<Vec<f64>> {
    let values = output.static_field(name)?;
    if values.len() != grid.active_cells() {
        return Err(field_shape_error(format!(
            "{name} has {} values, expected {} active cells",
            values.len(),
            grid.active_cells()
        )));
    }
    Ok(values)
}

fn load_static_fields(output: &dyn SimulationOutput, grid: &Grid) -> ReductionResult<StaticFields> {
    let porv = output.static_field("PORV")?;
    let tags = |name: &str| -> ReductionResult<Vec<i32>> {
        Ok(active_sized(output, name, grid)?
            .into_iter()
            .map(|value| value.round() as i32)
            .collect())
    };

    Ok(StaticFields {
        pore_volume: grid
            .active_to_global()
            .iter()
            .map(|global| porv[*global])
            .collect(),
        satnum: tags("SATNUM")?,
        fipnum: tags("FIPNUM")?,
        dx: active_sized(output, "DX", grid)?,
        dy: active_sized(output, "DY", grid)?,
        dz: active_sized(output, "DZ", grid)?,
    })
}

/// Active-ordered centers with the depth turned into elevation above the
/// domain bottom.
fn load_cell_centers(output: &dyn SimulationOutput, grid: &Grid) -> ReductionResult<Vec<[f64; 3]>> {
    let height = grid.extents()[2];
    let active = match output.cell_centers()? {
        NativeCellCenters::Global(centers) => {
            if centers.len() != grid.total_cells() {
                return Err(ReductionError::input_validation(
                    "INPUT.CELL_CENTERS",
                    format!(
                        "{} cell centers for {} grid cells",
                        centers.len(),
                        grid.total_cells()
                    ),
                ));
            }
            grid.active_to_global()
                .iter()
                .map(|global| centers[*global])
                .collect::<Vec<_>>()
        }
        NativeCellCenters::Active(centers) => {
            if centers.len() != grid.active_cells() {
                return Err(ReductionError::input_validation(
                    "INPUT.CELL_CENTERS",
                    format!(
                        "{} cell-center rows for {} active cells",
                        centers.len(),
                        grid.active_cells()
                    ),
                ));
            }
            centers
        }
    };

    Ok(active
        .into_iter()
        .map(|[x, y, depth]| [x, y, height - depth])
        .collect())
}

fn load_summary(output: &dyn SimulationOutput, injection_time: f64) -> ReductionResult<SummarySeries> {
    let times = output
        .summary_vector("TIME")?
        .into_iter()
        .map(|days| SECONDS_IN_DAY * days - injection_time)
        .collect::<Vec<_>>();
    let report_steps = output.summary_report_steps();
    if report_steps.len() != times.len() {
        return Err(field_shape_error(format!(
            "{} summary report steps for {} summary entries",
            report_steps.len(),
            times.len()
        )));
    }

    let mut summary = SummarySeries::new(times, report_steps);
    for key in output.summary_keys() {
        let keyword = key.split(':').next().unwrap_or_default();
        if SUMMARY_KEYWORDS.contains(&keyword) {
            summary.insert(&key, output.summary_vector(&key)?)?;
        }
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::{TimeMetadata, build_simulation_data};
    use crate::domain::{CaseVariant, ReaderBackend};
    use crate::readers::{MemoryOutput, NativeCellCenters};

    fn metadata() -> TimeMetadata {
        TimeMetadata {
            injection_time: 0.0,
            skipped_steps: 0,
            cumulative_times: vec![0.0, 86_400.0],
        }
    }

    fn output(porv: Vec<f64>, active: usize) -> MemoryOutput {
        let step = |value: f64| {
            [
                ("SGAS", vec![value; active]),
                ("RSW", vec![0.0; active]),
                ("PRESSURE", vec![100.0; active]),
                ("GAS_DEN", vec![600.0; active]),
                ("WAT_DEN", vec![1000.0; active]),
                ("GASKR", vec![0.0; active]),
            ]
        };
        MemoryOutput::new([2, 1, 2])
            .with_static_field("PORV", porv)
            .with_static_field("SATNUM", vec![1.0; active])
            .with_static_field("FIPNUM", vec![4.0; active])
            .with_static_field("DX", vec![1.0; active])
            .with_static_field("DY", vec![1.0; active])
            .with_static_field("DZ", vec![0.5; active])
            .with_report_step(step(0.0))
            .with_report_step(step(0.2))
            .with_summary_vector("TIME", vec![0.5, 1.0])
            .with_summary_vector("FGIP", vec![1.0, 2.0])
            .with_summary_vector("WBHP:INJ", vec![1.0, 2.0])
            .with_summary_report_steps(vec![1, 1])
    }

    #[test]
    fn active_cells_follow_positive_pore_volume_without_flags() {
        let output = output(vec![1.0, 0.0, 2.0, 3.0], 3)
            .with_backend(ReaderBackend::Opm)
            .with_cell_centers(NativeCellCenters::Active(vec![
                [0.5, 0.5, 0.25],
                [0.5, 0.5, 0.75],
                [1.5, 0.5, 0.75],
            ]));
        let data = build_simulation_data(&output, CaseVariant::Spe11a, metadata()).expect("data");

        assert_eq!(data.grid.active_cells(), 3);
        assert_eq!(data.grid.active_to_global(), [0, 2, 3]);
        assert_eq!(data.statics.pore_volume, vec![1.0, 2.0, 3.0]);
        assert!((data.cell_centers[0][2] - 0.95).abs() < 1.0e-12);
        assert_eq!(data.summary.times, vec![43_200.0, 86_400.0]);
        assert_eq!(data.summary.keys(), ["FGIP"]);
        assert_eq!(data.step_map, vec![0, 2]);
        assert_eq!(data.time_base.restart_times, vec![86_400.0]);
    }

    #[test]
    fn global_centers_are_filtered_to_active_cells() {
        let output = output(vec![1.0, 1.0, 0.0, 1.0], 3)
            .with_active_flags(vec![true, true, false, true])
            .with_cell_centers(NativeCellCenters::Global(vec![
                [0.5, 0.5, 0.25],
                [1.5, 0.5, 0.25],
                [0.5, 0.5, 0.75],
                [1.5, 0.5, 0.75],
            ]));
        let data = build_simulation_data(&output, CaseVariant::Spe11a, metadata()).expect("data");

        assert_eq!(data.grid.active_cells(), 3);
        assert_eq!(data.cell_centers[2][0], 1.5);
        assert!((data.cell_centers[2][2] - 0.45).abs() < 1.0e-12);
    }

    #[test]
    fn disagreeing_activity_sources_are_rejected() {
        let output = output(vec![1.0, 1.0, 0.0, 1.0], 3)
            .with_active_flags(vec![true, true, true, false])
            .with_cell_centers(NativeCellCenters::Active(vec![[0.0; 3]; 3]));
        let error = build_simulation_data(&output, CaseVariant::Spe11a, metadata())
            .expect_err("flags disagree with pore volume");
        assert_eq!(error.placeholder(), "INPUT.ACTIVE_CELL_MISMATCH");
    }

    #[test]
    fn center_table_must_match_active_count() {
        let output = output(vec![1.0, 1.0, 1.0, 1.0], 4)
            .with_cell_centers(NativeCellCenters::Active(vec![[0.0; 3]; 3]));
        let error = build_simulation_data(&output, CaseVariant::Spe11a, metadata())
            .expect_err("short center table");
        assert_eq!(error.placeholder(), "INPUT.CELL_CENTERS");
    }

    #[test]
    fn vapor_quantities_are_required_for_field_scale_cases() {
        let output = output(vec![1.0; 4], 4)
            .with_cell_centers(NativeCellCenters::Active(vec![[0.0; 3]; 4]));
        let error = build_simulation_data(&output, CaseVariant::Spe11b, metadata())
            .expect_err("no RVW");
        assert_eq!(error.placeholder(), "INPUT.RESTART_KEYWORD");
    }
}
