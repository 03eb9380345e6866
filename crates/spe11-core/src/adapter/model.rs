use super::schema::{NameSchema, Quantity};
use super::time_base::TimeBase;
use crate::domain::{CaseVariant, ReaderBackend, ReductionError, ReductionResult};
use std::collections::BTreeMap;

pub(crate) fn field_shape_error(message: impl Into<String>) -> ReductionError {
    ReductionError::computation("RUN.FIELD_SHAPE", message)
}

/// Simulator grid with its active-cell numbering.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    dims: [usize; 3],
    extents: [f64; 3],
    active_to_global: Vec<usize>,
    global_to_active: Vec<Option<usize>>,
}

impl Grid {
    pub fn new(dims: [usize; 3], extents: [f64; 3], active_flags: &[bool]) -> Self {
        let mut active_to_global = Vec::new();
        let mut global_to_active = vec![None; active_flags.len()];
        for (global, active) in active_flags.iter().enumerate() {
            if *active {
                global_to_active[global] = Some(active_to_global.len());
                active_to_global.push(global);
            }
        }
        Self {
            dims,
            extents,
            active_to_global,
            global_to_active,
        }
    }

    pub const fn dimensions(&self) -> [usize; 3] {
        self.dims
    }

    pub const fn extents(&self) -> [f64; 3] {
        self.extents
    }

    pub fn total_cells(&self) -> usize {
        self.global_to_active.len()
    }

    pub fn active_cells(&self) -> usize {
        self.active_to_global.len()
    }

    pub fn active_to_global(&self) -> &[usize] {
        &self.active_to_global
    }

    pub fn global_to_active(&self, global: usize) -> Option<usize> {
        self.global_to_active.get(global).copied().flatten()
    }

    /// Global-sized copy of an active-sized array; inactive cells hold NaN.
    pub fn scatter(&self, active_values: &[f64]) -> Vec<f64> {
        let mut global = vec![f64::NAN; self.total_cells()];
        for (value, index) in active_values.iter().zip(&self.active_to_global) {
            global[*index] = *value;
        }
        global
    }
}

/// Per-active-cell INIT arrays.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticFields {
    pub pore_volume: Vec<f64>,
    pub satnum: Vec<i32>,
    pub fipnum: Vec<i32>,
    pub dx: Vec<f64>,
    pub dy: Vec<f64>,
    pub dz: Vec<f64>,
}

/// Restart quantities for every report step, each an active-sized array.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportFields {
    step_count: usize,
    fields: BTreeMap<Quantity, Vec<Vec<f64>>>,
}

impl ReportFields {
    pub fn new(step_count: usize) -> Self {
        Self {
            step_count,
            fields: BTreeMap::new(),
        }
    }

    /// Adds all report steps of one quantity, checking the shape invariant.
    pub fn insert(
        &mut self,
        quantity: Quantity,
        steps: Vec<Vec<f64>>,
        active_cells: usize,
    ) -> ReductionResult<()> {
        if steps.len() != self.step_count {
            return Err(field_shape_error(format!(
                "{quantity:?} has {} report steps, expected {}",
                steps.len(),
                self.step_count
            )));
        }
        if let Some((step, values)) = steps
            .iter()
            .enumerate()
            .find(|(_, values)| values.len() != active_cells)
        {
            return Err(field_shape_error(format!(
                "{quantity:?} at report step {step} has {} values, expected {active_cells}",
                values.len()
            )));
        }
        self.fields.insert(quantity, steps);
        Ok(())
    }

    pub const fn step_count(&self) -> usize {
        self.step_count
    }

    pub fn contains(&self, quantity: Quantity) -> bool {
        self.fields.contains_key(&quantity)
    }

    pub fn get(&self, quantity: Quantity, step: usize) -> ReductionResult<&[f64]> {
        let steps = self.fields.get(&quantity).ok_or_else(|| {
            ReductionError::input_validation(
                "INPUT.RESTART_KEYWORD",
                format!("{quantity:?} was not loaded for this case"),
            )
        })?;
        steps.get(step).map(Vec::as_slice).ok_or_else(|| {
            field_shape_error(format!(
                "report step {step} requested but only {} exist",
                steps.len()
            ))
        })
    }
}

/// Summary vectors with their elapsed time axis.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummarySeries {
    /// `86400 · TIME − injection_time` [s]
    pub times: Vec<f64>,
    /// Report step of every summary entry.
    pub report_steps: Vec<usize>,
    keys: Vec<String>,
    vectors: BTreeMap<String, Vec<f64>>,
}

impl SummarySeries {
    pub fn new(times: Vec<f64>, report_steps: Vec<usize>) -> Self {
        Self {
            times,
            report_steps,
            keys: Vec::new(),
            vectors: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, key: &str, values: Vec<f64>) -> ReductionResult<()> {
        if values.len() != self.times.len() {
            return Err(field_shape_error(format!(
                "summary vector '{key}' has {} entries, expected {}",
                values.len(),
                self.times.len()
            )));
        }
        if self.vectors.insert(key.to_string(), values).is_none() {
            self.keys.push(key.to_string());
        }
        Ok(())
    }

    /// Keys in the order the simulator wrote them.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn vector(&self, key: &str) -> ReductionResult<&[f64]> {
        self.vectors.get(key).map(Vec::as_slice).ok_or_else(|| {
            ReductionError::input_validation(
                "INPUT.SUMMARY_KEY",
                format!("summary has no vector '{key}'"),
            )
        })
    }
}

/// Everything the reduction modules read, built once per run.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationData {
    pub case: CaseVariant,
    pub backend: ReaderBackend,
    pub schema: NameSchema,
    pub grid: Grid,
    /// `[x, y, elevation]` per active cell.
    pub cell_centers: Vec<[f64; 3]>,
    pub statics: StaticFields,
    pub fields: ReportFields,
    pub summary: SummarySeries,
    pub time_base: TimeBase,
    pub step_map: Vec<usize>,
}

impl SimulationData {
    pub fn report_step_count(&self) -> usize {
        self.fields.step_count()
    }

    pub fn field(&self, quantity: Quantity, step: usize) -> ReductionResult<&[f64]> {
        self.fields.get(quantity, step)
    }
}
