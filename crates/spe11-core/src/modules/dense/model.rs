use super::lookup::NearestCellLookup;
use crate::adapter::{Quantity, SimulationData, TimeBase};
use crate::common::constants::{BAR_TO_PA, GAS_DEN_REF, WAT_DEN_REF};
use crate::domain::{CaseVariant, ReductionResult};
use crate::modules::phase_mass::PhaseMasses;
use crate::modules::serialization::format_row;
use crate::numerics::mass_fraction;

const FIELD_HEADER: &str = "pressure [Pa], gas saturation [-], mass fraction of CO2 in liquid [-], \
mass fraction of H20 in vapor [-], phase mass density gas [kg/m3], \
phase mass density water [kg/m3], total mass CO2 [kg]";

/// One spatial map to write: snapshot `index` at `index · spatial_t`.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub index: usize,
    pub time: f64,
    /// Report step whose time is nearest to `time`.
    pub step: usize,
    pub label: String,
}

/// Snapshots at `k · spatial_t` for every `k` not beyond the last restart
/// time.
pub fn snapshot_plan(time_base: &TimeBase, case: CaseVariant, spatial_t: f64) -> Vec<Snapshot> {
    let axis = time_base.report_axis();
    let count = (time_base.last_restart_time() / spatial_t + 1.0e-9).floor() as usize + 1;
    let label_step = (spatial_t / case.time_unit_seconds()).round_ties_even() as u64;

    (0..count)
        .map(|index| {
            let time = index as f64 * spatial_t;
            let mut nearest = 0;
            for (candidate, report_time) in axis.iter().enumerate() {
                if (report_time - time).abs() < (axis[nearest] - time).abs() {
                    nearest = candidate;
                }
            }
            Snapshot {
                index,
                time,
                step: time_base.skipped_steps + nearest,
                label: format!("{}{}", index as u64 * label_step, case.label_suffix()),
            }
        })
        .collect()
}

/// Global-sized field arrays of one report step; inactive cells are NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseFields {
    pub pressure: Vec<f64>,
    pub gas_saturation: Vec<f64>,
    pub liquid_co2_fraction: Vec<f64>,
    pub vapor_h2o_fraction: Vec<f64>,
    pub gas_density: Vec<f64>,
    pub liquid_density: Vec<f64>,
    pub total_co2: Vec<f64>,
    pub temperature: Option<Vec<f64>>,
}

impl DenseFields {
    pub fn at_step(data: &SimulationData, step: usize) -> ReductionResult<Self> {
        let grid = &data.grid;
        let masses = PhaseMasses::at_step(data, step)?;
        let sgas = data.field(Quantity::GasSaturation, step)?;
        let gas_density = data.field(Quantity::GasDensity, step)?;

        let vapor_h2o_fraction = if data.case.has_vapor_phase() {
            let rv = data.field(Quantity::VaporizedRatio, step)?;
            (0..sgas.len())
                .map(|cell| {
                    let h2o_vapor = rv[cell]
                        * gas_density[cell]
                        * sgas[cell]
                        * data.statics.pore_volume[cell]
                        * WAT_DEN_REF
                        / GAS_DEN_REF;
                    mass_fraction(h2o_vapor, masses.co2_gas[cell])
                })
                .collect()
        } else {
            vec![0.0; sgas.len()]
        };
        let temperature = if data.case.has_vapor_phase() {
            Some(grid.scatter(data.field(Quantity::Temperature, step)?))
        } else {
            None
        };

        Ok(Self {
            pressure: grid.scatter(
                &data
                    .field(Quantity::Pressure, step)?
                    .iter()
                    .map(|bar| bar * BAR_TO_PA)
                    .collect::<Vec<_>>(),
            ),
            gas_saturation: grid.scatter(sgas),
            liquid_co2_fraction: grid.scatter(&masses.liquid_co2_fraction()),
            vapor_h2o_fraction: grid.scatter(&vapor_h2o_fraction),
            gas_density: grid.scatter(
                &gas_density
                    .iter()
                    .zip(sgas)
                    .map(|(density, sg)| if *sg > 0.0 { *density } else { 0.0 })
                    .collect::<Vec<_>>(),
            ),
            liquid_density: grid.scatter(data.field(Quantity::LiquidDensity, step)?),
            total_co2: grid.scatter(
                &(0..sgas.len())
                    .map(|cell| masses.total_co2(cell))
                    .collect::<Vec<_>>(),
            ),
            temperature,
        })
    }

    fn columns(&self) -> Vec<&[f64]> {
        let mut columns = vec![
            self.pressure.as_slice(),
            self.gas_saturation.as_slice(),
            self.liquid_co2_fraction.as_slice(),
            self.vapor_h2o_fraction.as_slice(),
            self.gas_density.as_slice(),
            self.liquid_density.as_slice(),
            self.total_co2.as_slice(),
        ];
        if let Some(temperature) = &self.temperature {
            columns.push(temperature);
        }
        columns
    }
}

pub fn dense_header(case: CaseVariant) -> String {
    let coordinates = if case.is_three_dimensional() {
        "x [m], y [m], z [m]"
    } else {
        "x [m], z [m]"
    };
    let mut header = format!("# {coordinates}, {FIELD_HEADER}");
    if case.has_vapor_phase() {
        header.push_str(", temperature [C]");
    }
    header
}

/// Header plus one row per output cell, x fastest and z ascending.
pub fn render_dense_lines(
    case: CaseVariant,
    lookup: &NearestCellLookup,
    fields: &DenseFields,
) -> Vec<String> {
    let sampled = fields
        .columns()
        .into_iter()
        .map(|column| lookup.gather(column))
        .collect::<Vec<_>>();
    let [xs, ys, zs] = lookup.axes();

    let mut lines = Vec::with_capacity(sampled.first().map_or(0, Vec::len) + 1);
    lines.push(dense_header(case));
    let mut row = 0;
    for z in zs {
        for y in ys {
            for x in xs {
                let mut values = if case.is_three_dimensional() {
                    vec![*x, *y, *z]
                } else {
                    vec![*x, *z]
                };
                values.extend(sampled.iter().map(|column| column[row]));
                lines.push(format_row(&values, ", "));
                row += 1;
            }
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::{dense_header, snapshot_plan};
    use crate::adapter::{TimeBase, TimeMetadata};
    use crate::domain::CaseVariant;

    #[test]
    fn headers_follow_dimension_and_vapor_phase() {
        assert_eq!(
            dense_header(CaseVariant::Spe11a),
            "# x [m], z [m], pressure [Pa], gas saturation [-], mass fraction of CO2 in liquid [-], \
             mass fraction of H20 in vapor [-], phase mass density gas [kg/m3], \
             phase mass density water [kg/m3], total mass CO2 [kg]"
        );
        assert!(dense_header(CaseVariant::Spe11b).ends_with("total mass CO2 [kg], temperature [C]"));
        assert!(dense_header(CaseVariant::Spe11c).starts_with("# x [m], y [m], z [m], pressure"));
    }

    #[test]
    fn snapshots_use_the_nearest_report_step() {
        let time_base = TimeBase::new(
            TimeMetadata {
                injection_time: 0.0,
                skipped_steps: 1,
                cumulative_times: vec![0.0, 2_000.0, 3_600.0, 7_000.0, 7_200.0],
            },
            6,
        )
        .expect("time base");

        let plan = snapshot_plan(&time_base, CaseVariant::Spe11a, 3_600.0);
        let steps = plan.iter().map(|snapshot| snapshot.step).collect::<Vec<_>>();
        let labels = plan.iter().map(|snapshot| snapshot.label.as_str()).collect::<Vec<_>>();
        assert_eq!(steps, vec![1, 3, 5]);
        assert_eq!(labels, vec!["0h", "1h", "2h"]);
    }

    #[test]
    fn field_scale_labels_count_years() {
        let time_base = TimeBase::new(
            TimeMetadata {
                injection_time: 0.0,
                skipped_steps: 0,
                cumulative_times: vec![0.0, 5.0 * 31_536_000.0, 10.0 * 31_536_000.0],
            },
            3,
        )
        .expect("time base");

        let plan = snapshot_plan(&time_base, CaseVariant::Spe11b, 5.0 * 31_536_000.0);
        assert_eq!(plan.len(), 3);
        assert_eq!(plan[2].label, "10y");
        assert_eq!(plan[2].step, 2);
    }
}
