use super::{NativeCellCenters, SimulationOutput};
use crate::domain::{ReaderBackend, ReductionError, ReductionResult};
use std::collections::HashMap;

/// In-memory simulator output for unit tests of the adapter and modules.
#[derive(Debug, Clone, Default)]
pub struct MemoryOutput {
    backend: ReaderBackend,
    dims: [usize; 3],
    active_flags: Option<Vec<bool>>,
    static_fields: HashMap<String, Vec<f64>>,
    report_steps: Vec<HashMap<String, Vec<f64>>>,
    summary: Vec<(String, Vec<f64>)>,
    summary_report_steps: Vec<usize>,
    centers: Option<NativeCellCenters>,
}

impl MemoryOutput {
    pub fn new(dims: [usize; 3]) -> Self {
        Self {
            dims,
            ..Self::default()
        }
    }

    pub fn with_backend(mut self, backend: ReaderBackend) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_active_flags(mut self, flags: Vec<bool>) -> Self {
        self.active_flags = Some(flags);
        self
    }

    pub fn with_static_field(mut self, name: &str, values: Vec<f64>) -> Self {
        self.static_fields.insert(name.to_string(), values);
        self
    }

    /// Appends one report step holding the given restart fields.
    pub fn with_report_step<'a>(
        mut self,
        fields: impl IntoIterator<Item = (&'a str, Vec<f64>)>,
    ) -> Self {
        self.report_steps.push(
            fields
                .into_iter()
                .map(|(name, values)| (name.to_string(), values))
                .collect(),
        );
        self
    }

    pub fn with_summary_vector(mut self, key: &str, values: Vec<f64>) -> Self {
        match self.summary.iter_mut().find(|(existing, _)| existing == key) {
            Some((_, existing)) => *existing = values,
            None => self.summary.push((key.to_string(), values)),
        }
        self
    }

    pub fn with_summary_report_steps(mut self, steps: Vec<usize>) -> Self {
        self.summary_report_steps = steps;
        self
    }

    pub fn with_cell_centers(mut self, centers: NativeCellCenters) -> Self {
        self.centers = Some(centers);
        self
    }
}

impl SimulationOutput for MemoryOutput {
    fn backend(&self) -> ReaderBackend {
        self.backend
    }

    fn dimensions(&self) -> [usize; 3] {
        self.dims
    }

    fn active_flags(&self) -> Option<Vec<bool>> {
        self.active_flags.clone()
    }

    fn static_field(&self, name: &str) -> ReductionResult<Vec<f64>> {
        self.static_fields.get(name).cloned().ok_or_else(|| {
            ReductionError::input_validation(
                "INPUT.STATIC_FIELD",
                format!("no static field '{name}'"),
            )
        })
    }

    fn has_restart_keyword(&self, name: &str) -> bool {
        self.report_steps
            .first()
            .is_some_and(|fields| fields.contains_key(name))
    }

    fn report_step_count(&self) -> usize {
        self.report_steps.len()
    }

    fn restart_field(&self, name: &str, step: usize) -> ReductionResult<Vec<f64>> {
        let fields = self.report_steps.get(step).ok_or_else(|| {
            ReductionError::input_validation(
                "INPUT.REPORT_STEP",
                format!(
                    "report step {step} requested but only {} exist",
                    self.report_steps.len()
                ),
            )
        })?;
        fields.get(name).cloned().ok_or_else(|| {
            ReductionError::input_validation(
                "INPUT.RESTART_KEYWORD",
                format!("restart step {step} has no keyword '{name}'"),
            )
        })
    }

    fn summary_keys(&self) -> Vec<String> {
        self.summary.iter().map(|(key, _)| key.clone()).collect()
    }

    fn summary_vector(&self, key: &str) -> ReductionResult<Vec<f64>> {
        self.summary
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, values)| values.clone())
            .ok_or_else(|| {
                ReductionError::input_validation(
                    "INPUT.SUMMARY_KEY",
                    format!("summary has no vector '{key}'"),
                )
            })
    }

    fn summary_report_steps(&self) -> Vec<usize> {
        self.summary_report_steps.clone()
    }

    fn cell_centers(&self) -> ReductionResult<NativeCellCenters> {
        self.centers.clone().ok_or_else(|| {
            ReductionError::input_validation(
                "INPUT.CELL_CENTERS",
                "in-memory output was built without cell centers",
            )
        })
    }
}
