mod concentration;
mod model;
mod restart;
mod summary;

pub use concentration::{BoxStencil, NeighborArrays};
pub use model::{BoxPartition, NativeSeries, SparseColumn, SparseModel};

use super::ModuleExecutor;
use super::serialization::write_table_artifact;
use crate::adapter::SimulationData;
use crate::domain::{
    OutputArtifact, ReductionError, ReductionRequest, ReductionResult, SparseSource,
};
use crate::numerics::cadence_grid;
use tracing::{debug, info};

/// Box-integrated time series, `<case>_time_series.csv`.
pub struct SparseModule;

impl SparseModule {
    pub fn file_name(request: &ReductionRequest) -> String {
        format!("{}_time_series.csv", request.case)
    }

    pub fn compute(
        data: &SimulationData,
        load: SparseSource,
        sparse_t: f64,
    ) -> ReductionResult<SparseModel> {
        let partition = BoxPartition::from_statics(&data.statics)?;
        debug!(
            box_a = partition.box_a.len(),
            box_b = partition.box_b.len(),
            box_c = partition.box_c.len(),
            sensors = ?partition.sensors,
            "resolved box partition"
        );

        let mut native = match load {
            SparseSource::Summary => summary::summary_columns(data, &partition)?,
            SparseSource::Restart => restart::restart_columns(data, &partition)?,
        };
        native.insert(
            SparseColumn::ConcentrationVariation,
            concentration::concentration_series(data, &partition.box_c)?,
        );

        let columns = SparseColumn::for_case(data.case)
            .into_iter()
            .map(|column| {
                native.remove(&column).map(|series| (column, series)).ok_or_else(|| {
                    ReductionError::internal(
                        "RUN.SPARSE_COLUMN",
                        format!("no {column:?} series computed from the {load} source"),
                    )
                })
            })
            .collect::<ReductionResult<Vec<_>>>()?;

        SparseModel::resample(
            cadence_grid(data.time_base.last_restart_time(), sparse_t),
            columns,
        )
    }
}

impl ModuleExecutor for SparseModule {
    fn execute(
        &self,
        request: &ReductionRequest,
        data: &SimulationData,
    ) -> ReductionResult<Vec<OutputArtifact>> {
        let model = Self::compute(data, request.load, request.sparse_t)?;
        info!(
            source = %request.load,
            rows = model.times().len(),
            "computed sparse time series"
        );

        let artifact = write_table_artifact(
            &request.output_dir(),
            &Self::file_name(request),
            &model.render_lines(request.case),
        )?;
        Ok(vec![artifact])
    }
}
