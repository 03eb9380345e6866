use super::run_files::EclRunFiles;
use super::{NativeCellCenters, SimulationOutput};
use crate::domain::{ReaderBackend, ReductionResult};
use std::path::Path;

/// Reader that trusts the grid file: activity from `ACTNUM`, cell centers
/// from the corner-point geometry.
#[derive(Debug, Clone)]
pub struct GridNativeOutput {
    files: EclRunFiles,
}

impl GridNativeOutput {
    pub fn open(flow_dir: &Path, deck_name: &str) -> ReductionResult<Self> {
        Ok(Self::from_files(EclRunFiles::open(flow_dir, deck_name)?))
    }

    pub fn from_files(files: EclRunFiles) -> Self {
        Self { files }
    }
}

impl SimulationOutput for GridNativeOutput {
    fn backend(&self) -> ReaderBackend {
        ReaderBackend::Resdata
    }

    fn dimensions(&self) -> [usize; 3] {
        self.files.grid.dimensions()
    }

    fn active_flags(&self) -> Option<Vec<bool>> {
        Some(self.files.grid.active_flags())
    }

    fn static_field(&self, name: &str) -> ReductionResult<Vec<f64>> {
        self.files.static_field(name)
    }

    fn has_restart_keyword(&self, name: &str) -> bool {
        self.files.restart.has_keyword(name, 0)
    }

    fn report_step_count(&self) -> usize {
        self.files.restart.report_step_count()
    }

    fn restart_field(&self, name: &str, step: usize) -> ReductionResult<Vec<f64>> {
        self.files.restart.field(name, step)
    }

    fn summary_keys(&self) -> Vec<String> {
        self.files.summary.keys().to_vec()
    }

    fn summary_vector(&self, key: &str) -> ReductionResult<Vec<f64>> {
        self.files.summary.vector(key)
    }

    fn summary_report_steps(&self) -> Vec<usize> {
        self.files.summary.report_steps().to_vec()
    }

    fn cell_centers(&self) -> ReductionResult<NativeCellCenters> {
        Ok(NativeCellCenters::Global(self.files.grid.cell_centers()))
    }
}
