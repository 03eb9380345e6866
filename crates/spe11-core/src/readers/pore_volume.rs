use super::run_files::EclRunFiles;
use super::{NativeCellCenters, SimulationOutput};
use crate::domain::{ReaderBackend, ReductionError, ReductionResult};
use std::fs;
use std::path::{Path, PathBuf};

/// Reader that derives activity from strictly positive pore volume and takes
/// cell centers from a side table, for output whose geometry cannot be
/// trusted.
#[derive(Debug, Clone)]
pub struct PoreVolumeOutput {
    files: EclRunFiles,
    centers_path: PathBuf,
}

impl PoreVolumeOutput {
    pub fn open(
        flow_dir: &Path,
        deck_name: &str,
        centers_path: impl Into<PathBuf>,
    ) -> ReductionResult<Self> {
        Ok(Self::from_files(
            EclRunFiles::open(flow_dir, deck_name)?,
            centers_path,
        ))
    }

    pub fn from_files(files: EclRunFiles, centers_path: impl Into<PathBuf>) -> Self {
        Self {
            files,
            centers_path: centers_path.into(),
        }
    }
}

/// Parses `x,y,depth` rows, one per active cell. Blank lines are skipped.
pub fn parse_centers_table(source: &str) -> ReductionResult<Vec<[f64; 3]>> {
    let mut centers = Vec::new();
    for (index, line) in source.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let values = line
            .split(',')
            .map(|value| value.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .ok()
            .filter(|values| values.len() >= 3)
            .ok_or_else(|| {
                ReductionError::input_validation(
                    "INPUT.CELL_CENTERS",
                    format!("line {}: expected three comma-separated numbers, got '{line}'", index + 1),
                )
            })?;
        centers.push([values[0], values[1], values[2]]);
    }
    Ok(centers)
}

impl SimulationOutput for PoreVolumeOutput {
    fn backend(&self) -> ReaderBackend {
        ReaderBackend::Opm
    }

    fn dimensions(&self) -> [usize; 3] {
        self.files.grid.dimensions()
    }

    fn active_flags(&self) -> Option<Vec<bool>> {
        None
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
        let source = fs::read_to_string(&self.centers_path).map_err(|error| {
            ReductionError::io_system(
                "IO.CELL_CENTERS",
                format!(
                    "failed to read cell centers '{}': {error}",
                    self.centers_path.display()
                ),
            )
        })?;
        Ok(NativeCellCenters::Active(parse_centers_table(&source)?))
    }
}
