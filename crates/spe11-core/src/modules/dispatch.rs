use super::dense::DenseModule;
use super::performance::PerformanceModule;
use super::sparse::SparseModule;
use super::traits::ModuleExecutor;
use crate::adapter::{SimulationData, load_simulation_data};
use crate::domain::{OutputArtifact, OutputKind, ReductionRequest, ReductionResult};
use crate::readers::open_simulation_output;
use tracing::info;

pub fn execute_output_kind(
    kind: OutputKind,
    request: &ReductionRequest,
    data: &SimulationData,
) -> ReductionResult<Vec<OutputArtifact>> {
    match kind {
        OutputKind::Performance => PerformanceModule.execute(request, data),
        OutputKind::Sparse => SparseModule.execute(request, data),
        OutputKind::Dense => DenseModule.execute(request, data),
    }
}

/// Runs every selected output kind over data loaded once; the first failure
/// aborts the run.
pub fn execute_selected(
    request: &ReductionRequest,
    data: &SimulationData,
) -> ReductionResult<Vec<OutputArtifact>> {
    let mut artifacts = Vec::new();
    for kind in request.generate.kinds() {
        let produced = execute_output_kind(kind, request, data)?;
        info!(kind = %kind, files = produced.len(), "output kind complete");
        artifacts.extend(produced);
    }
    Ok(artifacts)
}

/// Opens the run output with the requested reader and writes every selected
/// output kind to `<path>/data`.
pub fn run_reduction(request: &ReductionRequest) -> ReductionResult<Vec<OutputArtifact>> {
    info!(
        case = %request.case,
        deck = %request.deck_name,
        backend = %request.backend,
        run_dir = %request.run_dir.display(),
        "starting data reduction"
    );
    let output = open_simulation_output(request)?;
    let data = load_simulation_data(output.as_ref(), request)?;
    execute_selected(request, &data)
}
