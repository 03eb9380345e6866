pub mod errors;

pub use errors::{ErrorCategory, ReductionError, ReductionResult, SCHEMA_MISMATCH};

use crate::common::constants::{SECONDS_IN_HOUR, SECONDS_IN_YEAR};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseVariant {
    Spe11a,
    #[default]
    Spe11b,
    Spe11c,
}

impl CaseVariant {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Spe11a => "spe11a",
            Self::Spe11b => "spe11b",
            Self::Spe11c => "spe11c",
        }
    }

    /// Physical domain extents `[x, y, z]` in meters.
    pub const fn extents(self) -> [f64; 3] {
        match self {
            Self::Spe11a => [2.8, 1.0, 1.2],
            Self::Spe11b => [8400.0, 1.0, 1200.0],
            Self::Spe11c => [8400.0, 5000.0, 1200.0],
        }
    }

    pub const fn dof_per_cell(self) -> usize {
        match self {
            Self::Spe11a => 2,
            Self::Spe11b | Self::Spe11c => 3,
        }
    }

    pub const fn is_three_dimensional(self) -> bool {
        matches!(self, Self::Spe11c)
    }

    /// Vaporized water, temperature and the boundary regions are only
    /// present in the field-scale variants.
    pub const fn has_vapor_phase(self) -> bool {
        !matches!(self, Self::Spe11a)
    }

    pub const fn time_unit_seconds(self) -> f64 {
        match self {
            Self::Spe11a => SECONDS_IN_HOUR,
            Self::Spe11b | Self::Spe11c => SECONDS_IN_YEAR,
        }
    }

    pub const fn label_suffix(self) -> char {
        match self {
            Self::Spe11a => 'h',
            Self::Spe11b | Self::Spe11c => 'y',
        }
    }
}

impl Display for CaseVariant {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

impl FromStr for CaseVariant {
    type Err = ReductionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "spe11a" => Ok(Self::Spe11a),
            "spe11b" => Ok(Self::Spe11b),
            "spe11c" => Ok(Self::Spe11c),
            other => Err(ReductionError::config(
                "CONFIG.CASE_VARIANT",
                format!("unknown case '{other}', expected spe11a, spe11b or spe11c"),
            )),
        }
    }
}

/// Which reader provides the simulator output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReaderBackend {
    /// Active cells from the grid's active flags, native cell centers.
    #[default]
    Resdata,
    /// Active cells from pore volume, cell centers from `deck/centers.txt`.
    Opm,
}

impl ReaderBackend {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Resdata => "resdata",
            Self::Opm => "opm",
        }
    }
}

impl Display for ReaderBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

impl FromStr for ReaderBackend {
    type Err = ReductionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "resdata" => Ok(Self::Resdata),
            "opm" => Ok(Self::Opm),
            other => Err(ReductionError::config(
                "CONFIG.READER_BACKEND",
                format!("unknown reader '{other}', expected resdata or opm"),
            )),
        }
    }
}

/// Where the box quantities come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SparseSource {
    #[default]
    Summary,
    Restart,
}

impl SparseSource {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Summary => "summary",
            Self::Restart => "restart",
        }
    }
}

impl Display for SparseSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

impl FromStr for SparseSource {
    type Err = ReductionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "summary" => Ok(Self::Summary),
            "restart" => Ok(Self::Restart),
            other => Err(ReductionError::config(
                "CONFIG.SPARSE_SOURCE",
                format!("unknown load strategy '{other}', expected summary or restart"),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OutputKind {
    Performance,
    Sparse,
    Dense,
}

impl OutputKind {
    pub const ALL: [OutputKind; 3] = [Self::Performance, Self::Sparse, Self::Dense];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Performance => "performance",
            Self::Sparse => "sparse",
            Self::Dense => "dense",
        }
    }
}

impl Display for OutputKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

/// Selection of output kinds, written as `all` or an `_`-joined list such as
/// `dense_sparse`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OutputKinds {
    performance: bool,
    sparse: bool,
    dense: bool,
}

impl OutputKinds {
    pub const fn all() -> Self {
        Self {
            performance: true,
            sparse: true,
            dense: true,
        }
    }

    pub const fn only(kind: OutputKind) -> Self {
        Self {
            performance: matches!(kind, OutputKind::Performance),
            sparse: matches!(kind, OutputKind::Sparse),
            dense: matches!(kind, OutputKind::Dense),
        }
    }

    pub const fn contains(&self, kind: OutputKind) -> bool {
        match kind {
            OutputKind::Performance => self.performance,
            OutputKind::Sparse => self.sparse,
            OutputKind::Dense => self.dense,
        }
    }

    /// Selected kinds in the order they are generated.
    pub fn kinds(&self) -> Vec<OutputKind> {
        OutputKind::ALL
            .into_iter()
            .filter(|kind| self.contains(*kind))
            .collect()
    }
}

impl Default for OutputKinds {
    fn default() -> Self {
        Self::only(OutputKind::Sparse)
    }
}

impl FromStr for OutputKinds {
    type Err = ReductionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        if normalized == "all" {
            return Ok(Self::all());
        }

        let mut kinds = Self {
            performance: false,
            sparse: false,
            dense: false,
        };
        for token in normalized.split('_') {
            match token {
                "performance" => kinds.performance = true,
                "sparse" => kinds.sparse = true,
                "dense" => kinds.dense = true,
                _ => {
                    return Err(ReductionError::config(
                        "CONFIG.OUTPUT_KINDS",
                        format!(
                            "unknown output selection '{value}', expected 'all' or a '_'-joined \
                             list of dense, performance and sparse"
                        ),
                    ));
                }
            }
        }
        Ok(kinds)
    }
}

impl TryFrom<String> for OutputKinds {
    type Error = ReductionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<OutputKinds> for String {
    fn from(kinds: OutputKinds) -> Self {
        if kinds == OutputKinds::all() {
            return "all".to_string();
        }
        let mut names = kinds
            .kinds()
            .into_iter()
            .map(OutputKind::as_str)
            .collect::<Vec<_>>();
        names.sort_unstable();
        names.join("_")
    }
}

/// Run configuration as given by the user, in user units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RunConfig {
    pub path: PathBuf,
    pub case: CaseVariant,
    pub deck_name: Option<String>,
    pub resolution: [usize; 3],
    /// Spatial map interval, hours for spe11a and years otherwise.
    pub spatial_interval: f64,
    /// Sparse and performance interval, hours for spe11a and years otherwise.
    pub sparse_interval: f64,
    pub load: SparseSource,
    pub generate: OutputKinds,
    #[serde(rename = "use")]
    pub backend: ReaderBackend,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("output"),
            case: CaseVariant::Spe11b,
            deck_name: None,
            resolution: [10, 1, 5],
            spatial_interval: 25.0,
            sparse_interval: 0.1,
            load: SparseSource::Summary,
            generate: OutputKinds::default(),
            backend: ReaderBackend::Resdata,
        }
    }
}

impl RunConfig {
    /// Parses a JSON configuration; absent fields take their defaults.
    pub fn from_json(source: &str) -> ReductionResult<Self> {
        serde_json::from_str(source).map_err(|error| {
            ReductionError::config(
                "CONFIG.FILE",
                format!("invalid run configuration: {error}"),
            )
        })
    }

    pub fn to_request(&self) -> ReductionResult<ReductionRequest> {
        if self.resolution.contains(&0) {
            return Err(ReductionError::config(
                "CONFIG.RESOLUTION",
                format!(
                    "output resolution must be positive on every axis, got {:?}",
                    self.resolution
                ),
            ));
        }
        if !(self.spatial_interval > 0.0 && self.sparse_interval > 0.0) {
            return Err(ReductionError::config(
                "CONFIG.INTERVAL",
                format!(
                    "time intervals must be positive, got spatial={} sparse={}",
                    self.spatial_interval, self.sparse_interval
                ),
            ));
        }

        let unit = self.case.time_unit_seconds();
        let spatial_t = self.spatial_interval * unit;
        let sparse_t = match self.case {
            CaseVariant::Spe11a => (self.sparse_interval * unit).round_ties_even(),
            CaseVariant::Spe11b | CaseVariant::Spe11c => self.sparse_interval * unit,
        };
        if sparse_t <= 0.0 {
            return Err(ReductionError::config(
                "CONFIG.INTERVAL",
                format!("sparse interval {} rounds to zero seconds", self.sparse_interval),
            ));
        }

        let mut resolution = self.resolution;
        if !self.case.is_three_dimensional() {
            resolution[1] = 1;
        }

        let deck_name = match &self.deck_name {
            Some(name) => name.clone(),
            None => default_deck_name(&self.path)?,
        };

        Ok(ReductionRequest {
            case: self.case,
            run_dir: self.path.clone(),
            deck_name,
            resolution,
            spatial_t,
            sparse_t,
            load: self.load,
            generate: self.generate,
            backend: self.backend,
        })
    }
}

fn default_deck_name(path: &Path) -> ReductionResult<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_ascii_uppercase)
        .ok_or_else(|| {
            ReductionError::config(
                "CONFIG.DECK_NAME",
                format!(
                    "cannot derive a deck name from run directory '{}'",
                    path.display()
                ),
            )
        })
}

/// Fully resolved request shared by every output module; times in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct ReductionRequest {
    pub case: CaseVariant,
    pub run_dir: PathBuf,
    pub deck_name: String,
    pub resolution: [usize; 3],
    pub spatial_t: f64,
    pub sparse_t: f64,
    pub load: SparseSource,
    pub generate: OutputKinds,
    pub backend: ReaderBackend,
}

impl ReductionRequest {
    pub fn flow_dir(&self) -> PathBuf {
        self.run_dir.join("flow")
    }

    pub fn deck_dir(&self) -> PathBuf {
        self.run_dir.join("deck")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.run_dir.join("data")
    }

    pub fn flow_file(&self, extension: &str) -> PathBuf {
        self.flow_dir()
            .join(format!("{}.{}", self.deck_name, extension))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputArtifact {
    pub relative_path: PathBuf,
}

impl OutputArtifact {
    pub fn new(relative_path: impl Into<PathBuf>) -> Self {
        Self {
            relative_path: relative_path.into(),
        }
    }
}
