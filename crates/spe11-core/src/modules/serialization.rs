use crate::domain::{OutputArtifact, ReductionError, ReductionResult};
use std::fs;
use std::path::Path;

/// Scientific notation with three decimals and a signed two-digit exponent,
/// e.g. `1.234e+05`. NaN prints as `nan`.
pub fn format_sci(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let formatted = format!("{value:.3e}");
    let Some((mantissa, exponent)) = formatted.split_once('e') else {
        return formatted;
    };
    let exponent = exponent.parse::<i32>().unwrap_or(0);
    let sign = if exponent < 0 { '-' } else { '+' };
    format!("{mantissa}e{sign}{:02}", exponent.unsigned_abs())
}

pub fn format_row(values: &[f64], separator: &str) -> String {
    values
        .iter()
        .map(|value| format_sci(*value))
        .collect::<Vec<_>>()
        .join(separator)
}

/// One `\n`-terminated line per table row.
fn table_text(lines: &[String]) -> String {
    let mut text = String::with_capacity(lines.iter().map(|line| line.len() + 1).sum());
    for line in lines {
        text.push_str(line.trim_end_matches(['\r', '\n']));
        text.push('\n');
    }
    text
}

/// Writes `lines` as `output_dir/file_name`, creating the directory first.
pub fn write_table_artifact(
    output_dir: &Path,
    file_name: &str,
    lines: &[String],
) -> ReductionResult<OutputArtifact> {
    fs::create_dir_all(output_dir).map_err(|source| {
        ReductionError::io_system(
            "IO.OUTPUT_DIRECTORY",
            format!(
                "failed to create output directory '{}': {}",
                output_dir.display(),
                source
            ),
        )
    })?;

    let path = output_dir.join(file_name);
    fs::write(&path, table_text(lines)).map_err(|source| {
        ReductionError::io_system(
            "IO.OUTPUT_WRITE",
            format!("failed to write '{}': {}", path.display(), source),
        )
    })?;
    Ok(OutputArtifact::new(file_name))
}
