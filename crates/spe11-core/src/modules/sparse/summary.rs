//! Box quantities from the simulator's regional summary vectors.

use super::model::{
    BOUNDARY_REGIONS, BOX_A_REGIONS, BOX_B_REGIONS, BoxPartition, NativeSeries, SparseColumn,
};
use crate::adapter::{Quantity, SimulationData};
use crate::common::constants::{BAR_TO_PA, KMOL_TO_KG};
use crate::domain::{ReductionError, ReductionResult};
use crate::readers::run_files::block_global_index;
use std::collections::BTreeMap;
use tracing::warn;

const MOBILE: &str = "RGCDM";
const IMMOBILE: &str = "RGCDI";
const DISSOLVED: &str = "RWCD";
const ALL_CATEGORIES: [&str; 3] = [MOBILE, IMMOBILE, DISSOLVED];
const BLOCK_PRESSURE: &str = "BGPR";

const SEAL_A: [i32; 2] = [5, 8];
const SEAL_B: [i32; 1] = [6];
const SEAL_OUTSIDE_BOXES: [i32; 2] = [7, 9];
const BOUNDARY_SEAL: i32 = 10;

/// Sum of `keywords` over `regions`, converted from kmol to kg.
fn region_mass(
    data: &SimulationData,
    keywords: &[&str],
    regions: &[i32],
) -> ReductionResult<Vec<f64>> {
    let mut total = vec![0.0; data.summary.times.len()];
    for keyword in keywords {
        for region in regions {
            let series = data.summary.vector(&format!("{keyword}:{region}"))?;
            for (sum, value) in total.iter_mut().zip(series) {
                *sum += value;
            }
        }
    }
    Ok(total.into_iter().map(|value| value * KMOL_TO_KG).collect())
}

fn sensor_series(
    data: &SimulationData,
    partition: &BoxPartition,
) -> ReductionResult<[NativeSeries; 2]> {
    let dims = data.grid.dimensions();
    let block_keys = data
        .summary
        .keys()
        .iter()
        .filter(|key| key.split(':').next() == Some(BLOCK_PRESSURE))
        .collect::<Vec<_>>();
    let initial_pressure = data.field(Quantity::Pressure, 0)?;

    let mut series = [NativeSeries::default(), NativeSeries::default()];
    for (index, sensor) in partition.sensors.iter().enumerate() {
        let global = data.grid.active_to_global()[*sensor];
        let key = match block_keys
            .iter()
            .find(|key| block_global_index(key, dims) == Some(global))
        {
            Some(key) => *key,
            None => {
                let fallback = block_keys.get(index).copied().ok_or_else(|| {
                    ReductionError::input_validation(
                        "INPUT.SUMMARY_KEY",
                        format!(
                            "no {BLOCK_PRESSURE} series for sensor {} (cell {global})",
                            index + 1
                        ),
                    )
                })?;
                warn!(
                    sensor = index + 1,
                    key = %fallback,
                    "no block pressure series matches the sensor cell, using appearance order"
                );
                fallback
            }
        };

        let values = data
            .summary
            .vector(key)?
            .iter()
            .map(|bar| bar * BAR_TO_PA)
            .collect();
        series[index] = NativeSeries::new(data.summary.times.clone(), values)
            .with_origin(initial_pressure[*sensor] * BAR_TO_PA);
    }
    Ok(series)
}

pub(crate) fn summary_columns(
    data: &SimulationData,
    partition: &BoxPartition,
) -> ReductionResult<BTreeMap<SparseColumn, NativeSeries>> {
    let times = &data.summary.times;
    let mass = |values: Vec<f64>| NativeSeries::new(times.clone(), values).with_origin(0.0);

    let mut seal_total_regions = [&SEAL_A[..], &SEAL_B[..], &SEAL_OUTSIDE_BOXES[..]].concat();
    if data.case.has_vapor_phase() {
        seal_total_regions.push(BOUNDARY_SEAL);
    }

    let [p1, p2] = sensor_series(data, partition)?;
    let mut columns = BTreeMap::from([
        (SparseColumn::SensorPressure1, p1),
        (SparseColumn::SensorPressure2, p2),
        (SparseColumn::MobileA, mass(region_mass(data, &[MOBILE], &BOX_A_REGIONS)?)),
        (SparseColumn::ImmobileA, mass(region_mass(data, &[IMMOBILE], &BOX_A_REGIONS)?)),
        (SparseColumn::DissolvedA, mass(region_mass(data, &[DISSOLVED], &BOX_A_REGIONS)?)),
        (SparseColumn::SealA, mass(region_mass(data, &ALL_CATEGORIES, &SEAL_A)?)),
        (SparseColumn::MobileB, mass(region_mass(data, &[MOBILE], &BOX_B_REGIONS)?)),
        (SparseColumn::ImmobileB, mass(region_mass(data, &[IMMOBILE], &BOX_B_REGIONS)?)),
        (SparseColumn::DissolvedB, mass(region_mass(data, &[DISSOLVED], &BOX_B_REGIONS)?)),
        (SparseColumn::SealB, mass(region_mass(data, &ALL_CATEGORIES, &SEAL_B)?)),
        (
            SparseColumn::SealTotal,
            mass(region_mass(data, &ALL_CATEGORIES, &seal_total_regions)?),
        ),
    ]);
    if data.case.has_vapor_phase() {
        columns.insert(
            SparseColumn::BoundaryTotal,
            mass(region_mass(data, &ALL_CATEGORIES, &BOUNDARY_REGIONS)?),
        );
    }
    Ok(columns)
}
