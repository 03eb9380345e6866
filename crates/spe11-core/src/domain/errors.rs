use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ReductionResult<T> = Result<T, ReductionError>;

pub const SCHEMA_MISMATCH: &str = "INPUT.SCHEMA_MISMATCH";

/// What went wrong in a reduction run. Each category owns one process exit
/// code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Run settings rejected before any simulator file is opened: flags,
    /// configuration file, derived intervals.
    Config,
    /// Simulator output that is present but malformed or inconsistent:
    /// naming convention, activity, time metadata, solver log records.
    InputData,
    /// Run files that cannot be read and tables that cannot be written.
    Io,
    /// Values that cannot be reduced, such as an empty resampling target.
    Computation,
    /// Broken invariant inside the pipeline.
    Internal,
}

impl ErrorCategory {
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::Config | Self::InputData => 2,
            Self::Io => 3,
            Self::Computation => 4,
            Self::Internal => 5,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Config => "config",
            Self::InputData => "input",
            Self::Io => "io",
            Self::Computation => "computation",
            Self::Internal => "internal",
        }
    }
}

/// A fatal reduction failure with a stable dotted placeholder such as
/// `IO.ECL_READ`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReductionError {
    category: ErrorCategory,
    placeholder: &'static str,
    message: String,
}

impl ReductionError {
    fn new(category: ErrorCategory, placeholder: &'static str, message: impl Into<String>) -> Self {
        Self {
            category,
            placeholder,
            message: message.into(),
        }
    }

    pub fn config(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Config, placeholder, message)
    }

    pub fn input_validation(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::InputData, placeholder, message)
    }

    pub fn io_system(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Io, placeholder, message)
    }

    pub fn computation(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Computation, placeholder, message)
    }

    pub fn internal(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Internal, placeholder, message)
    }

    /// Neither the water nor the oil naming convention was found in the
    /// restart output.
    pub fn schema_mismatch(message: impl Into<String>) -> Self {
        Self::input_validation(SCHEMA_MISMATCH, message)
    }

    pub fn is_schema_mismatch(&self) -> bool {
        self.placeholder == SCHEMA_MISMATCH
    }

    pub const fn category(&self) -> ErrorCategory {
        self.category
    }

    pub const fn placeholder(&self) -> &'static str {
        self.placeholder
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn exit_code(&self) -> i32 {
        self.category.exit_code()
    }

    pub fn diagnostic_line(&self) -> String {
        format!("ERROR: [{}] {}", self.placeholder, self.message)
    }

    pub fn fatal_exit_line(&self) -> String {
        format!("FATAL EXIT CODE: {}", self.exit_code())
    }
}

impl Display for ReductionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} error [{}] {}",
            self.category.label(),
            self.placeholder,
            self.message
        )
    }
}

impl Error for ReductionError {}

#[cfg(test)]
mod tests {
    use super::{ErrorCategory, ReductionError};

    #[test]
    fn settings_and_data_errors_share_the_input_exit_code() {
        let config = ReductionError::config("CONFIG.RESOLUTION", "zero cells");
        let data = ReductionError::input_validation("INPUT.TIME_METADATA", "short");
        assert_eq!(config.category(), ErrorCategory::Config);
        assert_eq!(data.category(), ErrorCategory::InputData);
        assert_eq!(config.exit_code(), 2);
        assert_eq!(data.exit_code(), 2);
        assert_eq!(ReductionError::io_system("IO.ECL_READ", "gone").exit_code(), 3);
        assert_eq!(ReductionError::computation("RUN.EMPTY", "none").exit_code(), 4);
        assert_eq!(ReductionError::internal("RUN.SPARSE_COLUMN", "lost").exit_code(), 5);
    }

    #[test]
    fn failures_render_diagnostic_and_exit_lines() {
        let error = ReductionError::input_validation(
            "INPUT.PERFORMANCE_RECORD",
            "unparsable value 'x' at line 3",
        );

        assert_eq!(
            error.diagnostic_line(),
            "ERROR: [INPUT.PERFORMANCE_RECORD] unparsable value 'x' at line 3"
        );
        assert_eq!(error.fatal_exit_line(), "FATAL EXIT CODE: 2");
        assert_eq!(
            error.to_string(),
            "input error [INPUT.PERFORMANCE_RECORD] unparsable value 'x' at line 3"
        );
    }

    #[test]
    fn schema_mismatch_is_an_input_error() {
        let error = ReductionError::schema_mismatch("no WAT_DEN or OIL_DEN");
        assert!(error.is_schema_mismatch());
        assert_eq!(error.category(), ErrorCategory::InputData);
        assert!(!ReductionError::computation("RUN.X", "x").is_schema_mismatch());
    }
}
