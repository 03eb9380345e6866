//! Interpretation of the five binary files a simulation run leaves in
//! `flow/`: corner-point grid, static (INIT) arrays, restart report steps and
//! the summary vectors.

use super::ecl::{EclData, EclFile, EclKeyword};
use crate::domain::{ReductionError, ReductionResult};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

const DUMMY_WELL: &str = ":+:+:+:+";

fn missing_keyword(file: &str, keyword: &str) -> ReductionError {
    ReductionError::io_system(
        "IO.ECL_KEYWORD",
        format!("{file} does not contain keyword '{keyword}'"),
    )
}

/// Corner-point geometry from an EGRID file.
#[derive(Debug, Clone, PartialEq)]
pub struct EclGrid {
    dims: [usize; 3],
    coord: Vec<f64>,
    zcorn: Vec<f64>,
    actnum: Option<Vec<i32>>,
}

impl EclGrid {
    pub fn from_file(file: &EclFile) -> ReductionResult<Self> {
        let head = file
            .find("GRIDHEAD")
            .and_then(EclKeyword::as_ints)
            .ok_or_else(|| missing_keyword("EGRID", "GRIDHEAD"))?;
        if head.len() < 4 {
            return Err(ReductionError::io_system(
                "IO.ECL_GRID",
                format!("GRIDHEAD holds {} items, expected at least 4", head.len()),
            ));
        }
        let dims = [head[1], head[2], head[3]].map(|value| usize::try_from(value).unwrap_or(0));
        let coord = file
            .find("COORD")
            .and_then(EclKeyword::to_f64)
            .ok_or_else(|| missing_keyword("EGRID", "COORD"))?;
        let zcorn = file
            .find("ZCORN")
            .and_then(EclKeyword::to_f64)
            .ok_or_else(|| missing_keyword("EGRID", "ZCORN"))?;
        let actnum = file
            .find("ACTNUM")
            .and_then(EclKeyword::as_ints)
            .map(<[i32]>::to_vec);

        let grid = Self {
            dims,
            coord,
            zcorn,
            actnum,
        };
        grid.validate()?;
        Ok(grid)
    }

    /// Regular grid of `dims` cells of size `cell_size`, depth increasing
    /// with the layer index.
    pub fn cartesian(dims: [usize; 3], cell_size: [f64; 3], actnum: Option<Vec<i32>>) -> Self {
        let [nx, ny, nz] = dims;
        let bottom = cell_size[2] * nz as f64;
        let mut coord = Vec::with_capacity(6 * (nx + 1) * (ny + 1));
        for j in 0..=ny {
            for i in 0..=nx {
                let x = cell_size[0] * i as f64;
                let y = cell_size[1] * j as f64;
                coord.extend_from_slice(&[x, y, 0.0, x, y, bottom]);
            }
        }

        let mut zcorn = Vec::with_capacity(8 * nx * ny * nz);
        for k in 0..nz {
            for corner in 0..2 {
                let depth = cell_size[2] * (k + corner) as f64;
                zcorn.extend(std::iter::repeat_n(depth, 4 * nx * ny));
            }
        }

        Self {
            dims,
            coord,
            zcorn,
            actnum,
        }
    }

    pub fn to_keywords(&self) -> Vec<EclKeyword> {
        let [nx, ny, nz] = self.dims.map(|value| value as i32);
        let mut keywords = vec![
            EclKeyword::ints("GRIDHEAD", vec![1, nx, ny, nz, 0, 0, 0, 0]),
            EclKeyword::reals("COORD", self.coord.iter().map(|value| *value as f32).collect()),
            EclKeyword::reals("ZCORN", self.zcorn.iter().map(|value| *value as f32).collect()),
        ];
        if let Some(actnum) = &self.actnum {
            keywords.push(EclKeyword::ints("ACTNUM", actnum.clone()));
        }
        keywords.push(EclKeyword::new("ENDGRID", EclData::Int(Vec::new())));
        keywords
    }

    fn validate(&self) -> ReductionResult<()> {
        let [nx, ny, nz] = self.dims;
        let expected = [
            ("COORD", self.coord.len(), 6 * (nx + 1) * (ny + 1)),
            ("ZCORN", self.zcorn.len(), 8 * nx * ny * nz),
            (
                "ACTNUM",
                self.actnum.as_ref().map_or(nx * ny * nz, Vec::len),
                nx * ny * nz,
            ),
        ];
        for (name, found, wanted) in expected {
            if found != wanted {
                return Err(ReductionError::io_system(
                    "IO.ECL_GRID",
                    format!("{name} holds {found} items, expected {wanted} for grid {nx}x{ny}x{nz}"),
                ));
            }
        }
        Ok(())
    }

    pub const fn dimensions(&self) -> [usize; 3] {
        self.dims
    }

    pub fn cell_count(&self) -> usize {
        self.dims.iter().product()
    }

    /// Every cell is active when the file carries no ACTNUM.
    pub fn active_flags(&self) -> Vec<bool> {
        match &self.actnum {
            Some(actnum) => actnum.iter().map(|flag| *flag != 0).collect(),
            None => vec![true; self.cell_count()],
        }
    }

    fn pillar_point(&self, pillar: usize, depth: f64) -> [f64; 3] {
        let line = &self.coord[6 * pillar..6 * pillar + 6];
        let (top, bottom) = ([line[0], line[1], line[2]], [line[3], line[4], line[5]]);
        if bottom[2] == top[2] {
            return [top[0], top[1], depth];
        }
        let fraction = (depth - top[2]) / (bottom[2] - top[2]);
        [
            top[0] + fraction * (bottom[0] - top[0]),
            top[1] + fraction * (bottom[1] - top[1]),
            depth,
        ]
    }

    /// Mean of the eight corner points of every cell, in global order. The
    /// third coordinate is depth.
    pub fn cell_centers(&self) -> Vec<[f64; 3]> {
        let [nx, ny, nz] = self.dims;
        let mut centers = Vec::with_capacity(self.cell_count());
        for k in 0..nz {
            for j in 0..ny {
                for i in 0..nx {
                    let mut sum = [0.0; 3];
                    for corner in 0..8 {
                        let (ci, cj, ck) = (corner & 1, (corner >> 1) & 1, corner >> 2);
                        let z_index =
                            (2 * k + ck) * 4 * nx * ny + (2 * j + cj) * 2 * nx + (2 * i + ci);
                        let pillar = (j + cj) * (nx + 1) + (i + ci);
                        let point = self.pillar_point(pillar, self.zcorn[z_index]);
                        for axis in 0..3 {
                            sum[axis] += point[axis];
                        }
                    }
                    centers.push(sum.map(|value| value / 8.0));
                }
            }
        }
        centers
    }
}

/// Restart report steps, split at every `SEQNUM`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EclRestart {
    steps: Vec<HashMap<String, EclKeyword>>,
}

impl EclRestart {
    pub fn from_file(file: EclFile) -> Self {
        let steps = file
            .into_blocks("SEQNUM")
            .into_iter()
            .map(|block| {
                block
                    .into_iter()
                    .map(|keyword| (keyword.name.clone(), keyword))
                    .collect()
            })
            .collect();
        Self { steps }
    }

    pub fn report_step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn has_keyword(&self, name: &str, step: usize) -> bool {
        self.steps
            .get(step)
            .is_some_and(|fields| fields.contains_key(name))
    }

    pub fn field(&self, name: &str, step: usize) -> ReductionResult<Vec<f64>> {
        let fields = self.steps.get(step).ok_or_else(|| {
            ReductionError::input_validation(
                "INPUT.REPORT_STEP",
                format!(
                    "report step {step} requested but the restart file holds {}",
                    self.steps.len()
                ),
            )
        })?;
        fields
            .get(name)
            .and_then(EclKeyword::to_f64)
            .ok_or_else(|| {
                ReductionError::input_validation(
                    "INPUT.RESTART_KEYWORD",
                    format!("restart step {step} has no numeric keyword '{name}'"),
                )
            })
    }
}

/// Builds the conventional `KEYWORD[:qualifier]` key of one summary vector.
/// Returns `None` for placeholder entries without a well or group name.
pub fn summary_key(keyword: &str, name: &str, num: i32, dims: [usize; 3]) -> Option<String> {
    let keyword = keyword.trim();
    let name = name.trim();
    if keyword.is_empty() {
        return None;
    }
    match keyword.as_bytes()[0] {
        b'W' | b'G' => (!name.is_empty() && name != DUMMY_WELL).then(|| format!("{keyword}:{name}")),
        b'R' if num > 0 => Some(format!("{keyword}:{num}")),
        b'B' if num > 0 => {
            let [nx, ny, _] = dims;
            let index = (num - 1) as usize;
            if nx == 0 || ny == 0 {
                return Some(format!("{keyword}:{num}"));
            }
            let i = index % nx + 1;
            let j = (index / nx) % ny + 1;
            let k = index / (nx * ny) + 1;
            Some(format!("{keyword}:{i},{j},{k}"))
        }
        _ => Some(keyword.to_string()),
    }
}

/// Parses a block key suffix `i,j,k` (1-based) into a global cell index.
pub fn block_global_index(key: &str, dims: [usize; 3]) -> Option<usize> {
    let (_, suffix) = key.split_once(':')?;
    let mut parts = suffix.split(',').map(|part| part.trim().parse::<usize>().ok());
    let (i, j, k) = (parts.next()??, parts.next()??, parts.next()??);
    if parts.next().is_some() || i == 0 || j == 0 || k == 0 {
        return None;
    }
    let [nx, ny, nz] = dims;
    if i > nx || j > ny || k > nz {
        return None;
    }
    Some((i - 1) + nx * ((j - 1) + ny * (k - 1)))
}

/// Summary vectors (SMSPEC index plus UNSMRY ministeps).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EclSummary {
    keys: Vec<String>,
    columns: HashMap<String, usize>,
    ministeps: Vec<Vec<f32>>,
    report_steps: Vec<usize>,
}

impl EclSummary {
    pub fn from_files(smspec: &EclFile, unsmry: &EclFile) -> ReductionResult<Self> {
        let keywords = smspec
            .find("KEYWORDS")
            .and_then(EclKeyword::as_strings)
            .ok_or_else(|| missing_keyword("SMSPEC", "KEYWORDS"))?;
        let names = smspec
            .find("WGNAMES")
            .or_else(|| smspec.find("NAMES"))
            .and_then(EclKeyword::as_strings);
        let nums = smspec.find("NUMS").and_then(EclKeyword::as_ints);
        let dims = smspec
            .find("DIMENS")
            .and_then(EclKeyword::as_ints)
            .filter(|dimens| dimens.len() >= 4)
            .map_or([0; 3], |dimens| {
                [dimens[1], dimens[2], dimens[3]].map(|value| usize::try_from(value).unwrap_or(0))
            });

        let mut keys = Vec::new();
        let mut columns = HashMap::new();
        for (column, keyword) in keywords.iter().enumerate() {
            let name = names
                .and_then(|names| names.get(column))
                .map_or("", String::as_str);
            let num = nums.and_then(|nums| nums.get(column)).copied().unwrap_or(0);
            if let Some(key) = summary_key(keyword, name, num, dims) {
                if !columns.contains_key(&key) {
                    columns.insert(key.clone(), column);
                    keys.push(key);
                }
            }
        }

        let mut ministeps = Vec::new();
        let mut report_steps = Vec::new();
        let mut report_step = 0;
        for keyword in unsmry.keywords() {
            match (keyword.name.as_str(), &keyword.data) {
                ("SEQHDR", _) => report_step += 1,
                ("PARAMS", EclData::Real(values)) => {
                    if values.len() < keywords.len() {
                        return Err(ReductionError::io_system(
                            "IO.ECL_SUMMARY",
                            format!(
                                "PARAMS record holds {} values but SMSPEC declares {}",
                                values.len(),
                                keywords.len()
                            ),
                        ));
                    }
                    ministeps.push(values.clone());
                    report_steps.push(report_step);
                }
                _ => {}
            }
        }

        debug!(
            vectors = keys.len(),
            ministeps = ministeps.len(),
            "loaded summary"
        );
        Ok(Self {
            keys,
            columns,
            ministeps,
            report_steps,
        })
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn vector(&self, key: &str) -> ReductionResult<Vec<f64>> {
        let column = self.columns.get(key).copied().ok_or_else(|| {
            ReductionError::input_validation(
                "INPUT.SUMMARY_KEY",
                format!("summary has no vector '{key}'"),
            )
        })?;
        Ok(self
            .ministeps
            .iter()
            .map(|values| f64::from(values[column]))
            .collect())
    }

    /// Report step (1-based, counted by `SEQHDR`) of every ministep.
    pub fn report_steps(&self) -> &[usize] {
        &self.report_steps
    }
}

/// All binary files of one run.
#[derive(Debug, Clone)]
pub struct EclRunFiles {
    pub grid: EclGrid,
    pub init: EclFile,
    pub restart: EclRestart,
    pub summary: EclSummary,
}

impl EclRunFiles {
    pub fn open(flow_dir: &Path, deck_name: &str) -> ReductionResult<Self> {
        let path = |extension: &str| flow_dir.join(format!("{deck_name}.{extension}"));
        debug!(dir = %flow_dir.display(), deck = deck_name, "reading simulator output");

        let grid = EclGrid::from_file(&EclFile::open(path("EGRID"))?)?;
        let init = EclFile::open(path("INIT"))?;
        let restart = EclRestart::from_file(EclFile::open(path("UNRST"))?);
        let summary = EclSummary::from_files(
            &EclFile::open(path("SMSPEC"))?,
            &EclFile::open(path("UNSMRY"))?,
        )?;

        Ok(Self {
            grid,
            init,
            restart,
            summary,
        })
    }

    pub fn static_field(&self, name: &str) -> ReductionResult<Vec<f64>> {
        self.init
            .find(name)
            .and_then(EclKeyword::to_f64)
            .ok_or_else(|| {
                ReductionError::input_validation(
                    "INPUT.STATIC_FIELD",
                    format!("INIT file has no numeric keyword '{name}'"),
                )
            })
    }
}
