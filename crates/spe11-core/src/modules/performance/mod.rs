mod model;
mod parser;

pub use model::{PerformanceModel, PerformanceRow};
pub use parser::{InfoRecord, parse_infostep};

use super::ModuleExecutor;
use super::serialization::write_table_artifact;
use crate::adapter::SimulationData;
use crate::domain::{OutputArtifact, ReductionError, ReductionRequest, ReductionResult};
use std::fs;
use tracing::info;

/// Solver performance time series from `flow/<DECK>.INFOSTEP`.
pub struct PerformanceModule;

impl PerformanceModule {
    pub fn file_name(request: &ReductionRequest) -> String {
        format!("{}_performance_time_series.csv", request.case)
    }
}

impl ModuleExecutor for PerformanceModule {
    fn execute(
        &self,
        request: &ReductionRequest,
        data: &SimulationData,
    ) -> ReductionResult<Vec<OutputArtifact>> {
        let path = request.flow_file("INFOSTEP");
        let source = fs::read_to_string(&path).map_err(|source| {
            ReductionError::io_system(
                "IO.PERFORMANCE_LOG",
                format!("failed to read solver log '{}': {}", path.display(), source),
            )
        })?;
        let records = parse_infostep(&source)?;
        let model = PerformanceModel::from_records(&records, data, request.sparse_t)?;
        info!(
            records = records.len(),
            rows = model.rows().len(),
            "computed performance time series"
        );

        let artifact = write_table_artifact(
            &request.output_dir(),
            &Self::file_name(request),
            &model.render_lines(),
        )?;
        Ok(vec![artifact])
    }
}
