//! Box quantities integrated cell by cell from the restart fields.

use super::model::{BoxPartition, NativeSeries, SparseColumn};
use crate::adapter::{Quantity, SimulationData};
use crate::common::constants::BAR_TO_PA;
use crate::domain::ReductionResult;
use crate::modules::phase_mass::PhaseMasses;
use crate::numerics::stable_sum;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct BoxMasses {
    pub mobile: f64,
    pub immobile: f64,
    pub dissolved: f64,
    pub sealed: f64,
}

impl BoxMasses {
    /// Gas counts as mobile where the gas relative permeability is positive.
    pub fn integrate(
        cells: &[usize],
        masses: &PhaseMasses,
        gas_relperm: &[f64],
        seal: &[bool],
    ) -> Self {
        let gas = |mobile: bool| {
            stable_sum(
                cells
                    .iter()
                    .filter(|cell| (gas_relperm[**cell] > 0.0) == mobile)
                    .map(|cell| masses.co2_gas[*cell]),
            )
        };
        Self {
            mobile: gas(true),
            immobile: gas(false),
            dissolved: stable_sum(cells.iter().map(|cell| masses.co2_dissolved[*cell])),
            sealed: stable_sum(
                cells
                    .iter()
                    .filter(|cell| seal[**cell])
                    .map(|cell| masses.total_co2(*cell)),
            ),
        }
    }
}

pub(crate) fn restart_columns(
    data: &SimulationData,
    partition: &BoxPartition,
) -> ReductionResult<BTreeMap<SparseColumn, NativeSeries>> {
    let seal_cells = partition
        .seal
        .iter()
        .enumerate()
        .filter(|(_, seal)| **seal)
        .map(|(cell, _)| cell)
        .collect::<Vec<_>>();

    let mut rows: BTreeMap<SparseColumn, Vec<f64>> = BTreeMap::new();
    let mut push = |column: SparseColumn, value: f64| rows.entry(column).or_default().push(value);

    for step in data.time_base.window_steps() {
        let masses = PhaseMasses::at_step(data, step)?;
        let gas_relperm = data.field(Quantity::GasRelativePermeability, step)?;
        let pressure = data.field(Quantity::Pressure, step)?;

        let box_a = BoxMasses::integrate(&partition.box_a, &masses, gas_relperm, &partition.seal);
        let box_b = BoxMasses::integrate(&partition.box_b, &masses, gas_relperm, &partition.seal);

        push(SparseColumn::SensorPressure1, pressure[partition.sensors[0]] * BAR_TO_PA);
        push(SparseColumn::SensorPressure2, pressure[partition.sensors[1]] * BAR_TO_PA);
        push(SparseColumn::MobileA, box_a.mobile);
        push(SparseColumn::ImmobileA, box_a.immobile);
        push(SparseColumn::DissolvedA, box_a.dissolved);
        push(SparseColumn::SealA, box_a.sealed);
        push(SparseColumn::MobileB, box_b.mobile);
        push(SparseColumn::ImmobileB, box_b.immobile);
        push(SparseColumn::DissolvedB, box_b.dissolved);
        push(SparseColumn::SealB, box_b.sealed);
        push(
            SparseColumn::SealTotal,
            stable_sum(seal_cells.iter().map(|cell| masses.total_co2(*cell))),
        );
        if data.case.has_vapor_phase() {
            push(
                SparseColumn::BoundaryTotal,
                stable_sum(partition.boundary.iter().map(|cell| masses.total_co2(*cell))),
            );
        }
    }

    let axis = data.time_base.report_axis();
    Ok(rows
        .into_iter()
        .map(|(column, values)| (column, NativeSeries::new(axis.clone(), values)))
        .collect())
}
