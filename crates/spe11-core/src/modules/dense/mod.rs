mod lookup;
mod model;

pub use lookup::NearestCellLookup;
pub use model::{DenseFields, Snapshot, dense_header, render_dense_lines, snapshot_plan};

use super::ModuleExecutor;
use super::serialization::write_table_artifact;
use crate::adapter::SimulationData;
use crate::domain::{OutputArtifact, ReductionError, ReductionRequest, ReductionResult};
use tracing::{debug, info};

/// Spatial maps on the requested output grid, one file per snapshot.
pub struct DenseModule;

impl DenseModule {
    pub fn file_name(request: &ReductionRequest, snapshot: &Snapshot) -> String {
        format!("{}_spatial_map_{}.csv", request.case, snapshot.label)
    }

    /// Output-grid lookup for the run; a run without active cells has
    /// nothing to sample.
    pub fn lookup(data: &SimulationData, resolution: [usize; 3]) -> ReductionResult<NearestCellLookup> {
        let lookup = NearestCellLookup::build(&data.grid, &data.cell_centers, resolution);
        if lookup.is_empty() {
            return Err(ReductionError::computation(
                "RUN.EMPTY_LOOKUP",
                format!(
                    "no active cell to sample for the {resolution:?} output grid ({} grid cells)",
                    data.grid.total_cells()
                ),
            ));
        }
        debug!(resolution = ?lookup.resolution(), "built nearest-cell lookup");
        Ok(lookup)
    }

    pub fn render(
        data: &SimulationData,
        lookup: &NearestCellLookup,
        snapshot: &Snapshot,
    ) -> ReductionResult<Vec<String>> {
        let fields = DenseFields::at_step(data, snapshot.step)?;
        Ok(render_dense_lines(data.case, lookup, &fields))
    }
}

impl ModuleExecutor for DenseModule {
    fn execute(
        &self,
        request: &ReductionRequest,
        data: &SimulationData,
    ) -> ReductionResult<Vec<OutputArtifact>> {
        let lookup = Self::lookup(data, request.resolution)?;

        let plan = snapshot_plan(&data.time_base, data.case, request.spatial_t);
        let mut artifacts = Vec::with_capacity(plan.len());
        for snapshot in &plan {
            info!(
                snapshot = snapshot.index + 1,
                of = plan.len(),
                report_step = snapshot.step,
                label = %snapshot.label,
                "processing dense data"
            );
            let lines = Self::render(data, &lookup, snapshot)?;
            artifacts.push(write_table_artifact(
                &request.output_dir(),
                &Self::file_name(request, snapshot),
                &lines,
            )?);
        }
        Ok(artifacts)
    }
}

#[cfg(test)]
mod tests {
    use super::{DenseFields, DenseModule, snapshot_plan};
    use crate::adapter::{SimulationData, TimeMetadata, build_simulation_data};
    use crate::domain::CaseVariant;
    use crate::modules::serialization::format_row;
    use crate::readers::{MemoryOutput, NativeCellCenters};

    /// Two active cells side by side, the right one holding gas.
    fn data(case: CaseVariant) -> SimulationData {
        let step = |sg: f64| {
            [
                ("SGAS", vec![0.0, sg]),
                ("RS", vec![0.0, 2.0]),
                ("RV", vec![0.0, 1.0e-3]),
                ("PRESSURE", vec![1.0, 1.5]),
                ("GAS_DEN", vec![700.0, 700.0]),
                ("OIL_DEN", vec![1000.0, 1000.0]),
                ("GASKR", vec![0.0, 0.2]),
                ("TEMP", vec![20.0, 21.0]),
            ]
        };
        let [x, _, z] = case.extents();
        let output = MemoryOutput::new([2, 1, 1])
            .with_static_field("PORV", vec![1.0, 1.0])
            .with_static_field("SATNUM", vec![2.0, 2.0])
            .with_static_field("FIPNUM", vec![8.0, 9.0])
            .with_static_field("DX", vec![x / 2.0; 2])
            .with_static_field("DY", vec![1.0; 2])
            .with_static_field("DZ", vec![z; 2])
            .with_cell_centers(NativeCellCenters::Active(vec![
                [x / 4.0, 0.5, z / 2.0],
                [3.0 * x / 4.0, 0.5, z / 2.0],
            ]))
            .with_report_step(step(0.0))
            .with_report_step(step(0.4))
            .with_summary_vector("TIME", vec![1.0])
            .with_summary_report_steps(vec![1]);
        let metadata = TimeMetadata {
            injection_time: 0.0,
            skipped_steps: 0,
            cumulative_times: vec![0.0, case.time_unit_seconds()],
        };
        build_simulation_data(&output, case, metadata).expect("data")
    }

    fn rows(case: CaseVariant) -> Vec<Vec<String>> {
        let data = data(case);
        let lookup = DenseModule::lookup(&data, [4, 1, 1]).expect("lookup");
        let plan = snapshot_plan(&data.time_base, case, case.time_unit_seconds());
        let lines = DenseModule::render(&data, &lookup, &plan[1]).expect("lines");
        lines[1..]
            .iter()
            .map(|line| line.split(", ").map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn lab_scale_maps_report_no_water_in_vapor() {
        let rows = rows(CaseVariant::Spe11a);
        assert_eq!(rows.len(), 4);
        for row in &rows {
            assert_eq!(row.len(), 9);
            assert_eq!(row[5], "0.000e+00");
        }
        // Left half maps to the gas-free cell, right half to the gas cell.
        assert_eq!(rows[0][2], "1.000e+05");
        assert_eq!(rows[0][6], "0.000e+00");
        assert_eq!(rows[3][2], "1.500e+05");
        assert_eq!(rows[3][3], "4.000e-01");
        assert_eq!(rows[3][6], "7.000e+02");
    }

    #[test]
    fn field_scale_maps_add_vapor_fraction_and_temperature() {
        let rows = rows(CaseVariant::Spe11b);
        assert_eq!(rows[3].len(), 10);
        assert_eq!(rows[3][9], "2.100e+01");
        assert_ne!(rows[3][5], "0.000e+00");
        assert_eq!(rows[0][5], "0.000e+00");
    }

    /// 2 x 2 x 2 field-scale grid; the bottom cell at the far corner is
    /// inactive. Pressure is `1 + global index` bar.
    fn three_dimensional_data() -> SimulationData {
        let step = || {
            [
                ("SGAS", vec![0.0; 7]),
                ("RSW", vec![0.0; 7]),
                ("RVW", vec![0.0; 7]),
                ("PRESSURE", (1..=7).map(f64::from).collect()),
                ("GAS_DEN", vec![700.0; 7]),
                ("WAT_DEN", vec![1000.0; 7]),
                ("GASKR", vec![0.0; 7]),
                ("TEMP", vec![30.0; 7]),
            ]
        };
        let mut centers = Vec::new();
        for depth in [300.0, 900.0] {
            for y in [1_250.0, 3_750.0] {
                for x in [2_100.0, 6_300.0] {
                    centers.push([x, y, depth]);
                }
            }
        }
        centers.pop();

        let output = MemoryOutput::new([2, 2, 2])
            .with_static_field("PORV", vec![1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 0.0])
            .with_static_field("SATNUM", vec![2.0; 7])
            .with_static_field("FIPNUM", vec![1.0; 7])
            .with_static_field("DX", vec![4_200.0; 7])
            .with_static_field("DY", vec![2_500.0; 7])
            .with_static_field("DZ", vec![600.0; 7])
            .with_cell_centers(NativeCellCenters::Active(centers))
            .with_report_step(step())
            .with_report_step(step())
            .with_summary_vector("TIME", vec![])
            .with_summary_report_steps(vec![]);
        let metadata = TimeMetadata {
            injection_time: 0.0,
            skipped_steps: 0,
            cumulative_times: vec![0.0, CaseVariant::Spe11c.time_unit_seconds()],
        };
        build_simulation_data(&output, CaseVariant::Spe11c, metadata).expect("data")
    }

    #[test]
    fn three_dimensional_maps_list_x_then_y_then_rising_z() {
        let data = three_dimensional_data();
        let lookup = DenseModule::lookup(&data, [2, 2, 2]).expect("lookup");
        let plan = snapshot_plan(
            &data.time_base,
            CaseVariant::Spe11c,
            CaseVariant::Spe11c.time_unit_seconds(),
        );
        assert_eq!(plan.len(), 2);
        let lines = DenseModule::render(&data, &lookup, &plan[0]).expect("lines");
        let rows = lines[1..]
            .iter()
            .map(|line| line.split(", ").collect::<Vec<_>>())
            .collect::<Vec<_>>();

        assert_eq!(rows.len(), 8);
        assert!(rows.iter().all(|row| row.len() == 11));
        let coordinates = rows
            .iter()
            .map(|row| row[..3].join(" "))
            .collect::<Vec<_>>();
        assert_eq!(
            coordinates,
            [
                "2.100e+03 1.250e+03 3.000e+02",
                "6.300e+03 1.250e+03 3.000e+02",
                "2.100e+03 3.750e+03 3.000e+02",
                "6.300e+03 3.750e+03 3.000e+02",
                "2.100e+03 1.250e+03 9.000e+02",
                "6.300e+03 1.250e+03 9.000e+02",
                "2.100e+03 3.750e+03 9.000e+02",
                "6.300e+03 3.750e+03 9.000e+02",
            ]
        );
        let pressure = rows.iter().map(|row| row[3]).collect::<Vec<_>>();
        // The inactive bottom corner takes the active cell right above it.
        assert_eq!(
            pressure,
            [
                "5.000e+05", "6.000e+05", "7.000e+05", "4.000e+05", "1.000e+05", "2.000e+05",
                "3.000e+05", "4.000e+05",
            ]
        );
        assert!(rows.iter().all(|row| row[10] == "3.000e+01"));
    }

    #[test]
    fn inactive_cells_read_as_nan_in_global_fields() {
        let data = three_dimensional_data();
        let fields = DenseFields::at_step(&data, 0).expect("fields");
        assert_eq!(fields.pressure.len(), 8);
        assert_eq!(fields.pressure[6], 7.0e5);
        assert!(fields.pressure[7].is_nan());
        assert_eq!(format_row(&fields.pressure[6..], ", "), "7.000e+05, nan");
    }

    #[test]
    fn runs_without_active_cells_are_rejected() {
        let empty_step = || {
            ["SGAS", "RSW", "PRESSURE", "GAS_DEN", "WAT_DEN", "GASKR"]
                .map(|name| (name, Vec::<f64>::new()))
        };
        let output = MemoryOutput::new([2, 1, 1])
            .with_static_field("PORV", vec![0.0, 0.0])
            .with_static_field("SATNUM", vec![])
            .with_static_field("FIPNUM", vec![])
            .with_static_field("DX", vec![])
            .with_static_field("DY", vec![])
            .with_static_field("DZ", vec![])
            .with_cell_centers(NativeCellCenters::Active(vec![]))
            .with_report_step(empty_step())
            .with_report_step(empty_step())
            .with_summary_vector("TIME", vec![])
            .with_summary_report_steps(vec![]);
        let metadata = TimeMetadata {
            injection_time: 0.0,
            skipped_steps: 0,
            cumulative_times: vec![0.0, 3_600.0],
        };
        let data = build_simulation_data(&output, CaseVariant::Spe11a, metadata).expect("data");

        let error = DenseModule::lookup(&data, [2, 1, 1]).expect_err("nothing to sample");
        assert_eq!(error.placeholder(), "RUN.EMPTY_LOOKUP");
        assert_eq!(error.exit_code(), 4);
    }
}
