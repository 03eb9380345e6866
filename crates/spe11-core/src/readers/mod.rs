pub mod ecl;
pub mod grid_native;
#[cfg(test)]
pub(crate) mod memory;
pub mod pore_volume;
pub mod run_files;

pub use grid_native::GridNativeOutput;
#[cfg(test)]
pub(crate) use memory::MemoryOutput;
pub use pore_volume::PoreVolumeOutput;

use crate::domain::{ReaderBackend, ReductionRequest, ReductionResult};

/// Cell centers as a backend supplies them. The third coordinate is the
/// simulator depth, not elevation.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeCellCenters {
    /// One entry per grid cell in global order.
    Global(Vec<[f64; 3]>),
    /// One entry per active cell in active order.
    Active(Vec<[f64; 3]>),
}

/// Raw simulator output as seen by the adapter.
///
/// Static fields follow the INIT convention: `PORV` is global sized, every
/// other array is active sized. Restart fields are active sized.
pub trait SimulationOutput {
    fn backend(&self) -> ReaderBackend;

    fn dimensions(&self) -> [usize; 3];

    /// Global-sized activity flags, or `None` when activity is derived from
    /// pore volume.
    fn active_flags(&self) -> Option<Vec<bool>>;

    fn static_field(&self, name: &str) -> ReductionResult<Vec<f64>>;

    fn has_restart_keyword(&self, name: &str) -> bool;

    fn report_step_count(&self) -> usize;

    fn restart_field(&self, name: &str, step: usize) -> ReductionResult<Vec<f64>>;

    fn summary_keys(&self) -> Vec<String>;

    fn summary_vector(&self, key: &str) -> ReductionResult<Vec<f64>>;

    fn summary_report_steps(&self) -> Vec<usize>;

    fn cell_centers(&self) -> ReductionResult<NativeCellCenters>;
}

/// Opens the run's `flow/` output with the backend the request selects.
pub fn open_simulation_output(
    request: &ReductionRequest,
) -> ReductionResult<Box<dyn SimulationOutput>> {
    let flow_dir = request.flow_dir();
    match request.backend {
        ReaderBackend::Resdata => Ok(Box::new(GridNativeOutput::open(
            &flow_dir,
            &request.deck_name,
        )?)),
        ReaderBackend::Opm => Ok(Box::new(PoreVolumeOutput::open(
            &flow_dir,
            &request.deck_name,
            request.deck_dir().join("centers.txt"),
        )?)),
    }
}
