use crate::adapter::StaticFields;
use crate::domain::{CaseVariant, ReductionError, ReductionResult};
use crate::modules::serialization::format_row;
use crate::numerics::resample_extrapolated;

pub(crate) const BOX_A_REGIONS: [i32; 4] = [2, 4, 5, 8];
pub(crate) const BOX_B_REGIONS: [i32; 2] = [3, 6];
pub(crate) const BOX_C_REGION: i32 = 4;
pub(crate) const SENSOR_REGIONS: [i32; 2] = [8, 9];
pub(crate) const BOUNDARY_REGIONS: [i32; 2] = [10, 11];
pub(crate) const SEAL_FACIES: i32 = 1;

const SPARSE_HEADER: &str = "# t [s], p1 [Pa], p2 [Pa], mobA [kg], immA [kg], dissA [kg], \
sealA [kg], <same for B>, MC [m^2], sealTot [kg]";

/// Active cell sets of the boxes, sensors, seal and boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxPartition {
    pub box_a: Vec<usize>,
    pub box_b: Vec<usize>,
    pub box_c: Vec<usize>,
    pub sensors: [usize; 2],
    pub seal: Vec<bool>,
    pub boundary: Vec<usize>,
}

impl BoxPartition {
    pub fn from_statics(statics: &StaticFields) -> ReductionResult<Self> {
        let cells_in = |regions: &[i32]| {
            statics
                .fipnum
                .iter()
                .enumerate()
                .filter(|(_, region)| regions.contains(*region))
                .map(|(cell, _)| cell)
                .collect::<Vec<_>>()
        };
        let sensor = |region: i32| {
            statics
                .fipnum
                .iter()
                .position(|candidate| *candidate == region)
                .ok_or_else(|| {
                    ReductionError::input_validation(
                        "INPUT.SENSOR_REGION",
                        format!("no active cell carries sensor region {region}"),
                    )
                })
        };

        Ok(Self {
            box_a: cells_in(&BOX_A_REGIONS),
            box_b: cells_in(&BOX_B_REGIONS),
            box_c: cells_in(&[BOX_C_REGION]),
            sensors: [sensor(SENSOR_REGIONS[0])?, sensor(SENSOR_REGIONS[1])?],
            seal: statics
                .satnum
                .iter()
                .map(|facies| *facies == SEAL_FACIES)
                .collect(),
            boundary: cells_in(&BOUNDARY_REGIONS),
        })
    }
}

/// Output columns after the time column, in file order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SparseColumn {
    SensorPressure1,
    SensorPressure2,
    MobileA,
    ImmobileA,
    DissolvedA,
    SealA,
    MobileB,
    ImmobileB,
    DissolvedB,
    SealB,
    ConcentrationVariation,
    SealTotal,
    BoundaryTotal,
}

impl SparseColumn {
    pub const ALL: [SparseColumn; 13] = [
        Self::SensorPressure1,
        Self::SensorPressure2,
        Self::MobileA,
        Self::ImmobileA,
        Self::DissolvedA,
        Self::SealA,
        Self::MobileB,
        Self::ImmobileB,
        Self::DissolvedB,
        Self::SealB,
        Self::ConcentrationVariation,
        Self::SealTotal,
        Self::BoundaryTotal,
    ];

    pub fn for_case(case: CaseVariant) -> Vec<Self> {
        Self::ALL
            .into_iter()
            .filter(|column| case.has_vapor_phase() || *column != Self::BoundaryTotal)
            .collect()
    }
}

/// A series on its own time axis [s].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NativeSeries {
    pub times: Vec<f64>,
    pub values: Vec<f64>,
}

impl NativeSeries {
    pub fn new(times: Vec<f64>, values: Vec<f64>) -> Self {
        Self { times, values }
    }

    /// Prepends `(0, value)` unless the axis already starts at or before 0.
    pub fn with_origin(mut self, value: f64) -> Self {
        if self.times.first().is_none_or(|first| *first > 0.0) {
            self.times.insert(0, 0.0);
            self.values.insert(0, value);
        }
        self
    }
}

/// Box quantities resampled onto the sparse cadence.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseModel {
    times: Vec<f64>,
    columns: Vec<(SparseColumn, Vec<f64>)>,
}

impl SparseModel {
    /// Resamples every series of `columns` onto `times`; columns must be
    /// given in file order.
    pub fn resample(
        times: Vec<f64>,
        columns: Vec<(SparseColumn, NativeSeries)>,
    ) -> ReductionResult<Self> {
        let columns = columns
            .into_iter()
            .map(|(column, series)| {
                resample_extrapolated(&times, &series.times, &series.values)
                    .map(|values| (column, values))
                    .ok_or_else(|| {
                        ReductionError::computation(
                            "RUN.INTERPOLATION",
                            format!(
                                "{column:?} has {} samples on a time axis of {} points",
                                series.values.len(),
                                series.times.len()
                            ),
                        )
                    })
            })
            .collect::<ReductionResult<Vec<_>>>()?;
        Ok(Self { times, columns })
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn column(&self, column: SparseColumn) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|(candidate, _)| *candidate == column)
            .map(|(_, values)| values.as_slice())
    }

    pub fn render_lines(&self, case: CaseVariant) -> Vec<String> {
        let mut header = SPARSE_HEADER.to_string();
        if case.has_vapor_phase() {
            header.push_str(", boundTot [kg]");
        }

        let mut lines = Vec::with_capacity(self.times.len() + 1);
        lines.push(header);
        for (row, time) in self.times.iter().enumerate() {
            let mut values = Vec::with_capacity(self.columns.len() + 1);
            values.push(*time);
            values.extend(self.columns.iter().map(|(_, series)| series[row]));
            lines.push(format_row(&values, ","));
        }
        lines
    }
}
