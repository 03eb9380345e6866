use crate::adapter::SimulationData;
use crate::domain::{OutputArtifact, ReductionRequest, ReductionResult};

/// One output kind: reads the shared run data and writes its artifacts.
pub trait ModuleExecutor {
    fn execute(
        &self,
        request: &ReductionRequest,
        data: &SimulationData,
    ) -> ReductionResult<Vec<OutputArtifact>>;
}
