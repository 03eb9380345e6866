//! Small numeric kernels shared by the reduction modules.

fn kahan_add(sum: &mut f64, correction: &mut f64, value: f64) {
    let corrected = value - *correction;
    let next = *sum + corrected;
    *correction = (next - *sum) - corrected;
    *sum = next;
}

pub fn stable_sum(values: impl IntoIterator<Item = f64>) -> f64 {
    let mut sum = 0.0;
    let mut correction = 0.0;

    for value in values {
        kahan_add(&mut sum, &mut correction, value);
    }

    sum
}

pub fn squared_distance3(lhs: [f64; 3], rhs: [f64; 3]) -> f64 {
    let dx = lhs[0] - rhs[0];
    let dy = lhs[1] - rhs[1];
    let dz = lhs[2] - rhs[2];
    dx * dx + dy * dy + dz * dz
}

/// Inclusive, evenly spaced grid of `count` points. A single point grid is
/// just `[start]`.
pub fn linear_grid(start: f64, end: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / ((count - 1) as f64);
            let mut grid = (0..count)
                .map(|index| start + step * (index as f64))
                .collect::<Vec<_>>();
            if let Some(last) = grid.last_mut() {
                *last = end;
            }
            grid
        }
    }
}

/// `linear_grid(0, end, round(end / step) + 1)`: the output times of a
/// series reported every `step` seconds up to `end`.
pub fn cadence_grid(end: f64, step: f64) -> Vec<f64> {
    let intervals = (end / step).round_ties_even().max(0.0) as usize;
    linear_grid(0.0, end, intervals + 1)
}

/// Midpoints of `count` equal cells spanning `[0, extent]`.
pub fn cell_midpoints(extent: f64, count: usize) -> Vec<f64> {
    let edges = linear_grid(0.0, extent, count + 1);
    edges
        .windows(2)
        .map(|window| 0.5 * (window[0] + window[1]))
        .collect()
}

/// Piecewise-linear interpolation that extrapolates along the first or last
/// segment outside the grid. `x_grid` must be non-decreasing; a single point
/// grid is treated as a constant.
pub fn interpolate_extrapolated(x: f64, x_grid: &[f64], y_grid: &[f64]) -> Option<f64> {
    if x_grid.is_empty() || x_grid.len() != y_grid.len() {
        return None;
    }

    if !x_grid.windows(2).all(|window| window[0] <= window[1]) {
        return None;
    }

    if x_grid.len() == 1 {
        return Some(y_grid[0]);
    }

    let last_index = x_grid.len() - 1;
    let upper = if x <= x_grid[0] {
        1
    } else if x >= x_grid[last_index] {
        last_index
    } else {
        x_grid
            .windows(2)
            .position(|window| x <= window[1])
            .map(|index| index + 1)?
    };
    let lower = upper - 1;
    let x0 = x_grid[lower];
    let x1 = x_grid[upper];
    if x1 == x0 {
        return Some(y_grid[upper]);
    }

    let interpolation = (x - x0) / (x1 - x0);
    Some(y_grid[lower] + interpolation * (y_grid[upper] - y_grid[lower]))
}

/// Samples `(x_grid, y_grid)` at every point of `targets`.
pub fn resample_extrapolated(targets: &[f64], x_grid: &[f64], y_grid: &[f64]) -> Option<Vec<f64>> {
    targets
        .iter()
        .map(|target| interpolate_extrapolated(*target, x_grid, y_grid))
        .collect()
}

/// `numerator / (numerator + carrier)`, or 0 when the total vanishes.
pub fn mass_fraction(numerator: f64, carrier: f64) -> f64 {
    let total = numerator + carrier;
    if total == 0.0 { 0.0 } else { numerator / total }
}
