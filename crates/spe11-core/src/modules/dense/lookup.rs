use crate::adapter::Grid;
use crate::numerics::{cell_midpoints, squared_distance3};

/// Nearest active simulator cell of every output-grid cell.
///
/// Built once per run. Cells are stored layer by layer from the top layer
/// down, then along y, then along x.
#[derive(Debug, Clone, PartialEq)]
pub struct NearestCellLookup {
    resolution: [usize; 3],
    x: Vec<f64>,
    y: Vec<f64>,
    z: Vec<f64>,
    cells: Vec<usize>,
}

impl NearestCellLookup {
    /// `centers` are the active cell centers with elevation as third
    /// coordinate; the stored indices are global.
    pub fn build(grid: &Grid, centers: &[[f64; 3]], resolution: [usize; 3]) -> Self {
        let extents = grid.extents();
        let x = cell_midpoints(extents[0], resolution[0]);
        let y = cell_midpoints(extents[1], resolution[1]);
        let z = cell_midpoints(extents[2], resolution[2]);

        let mut cells = Vec::with_capacity(x.len() * y.len() * z.len());
        for zc in z.iter().rev() {
            for yc in &y {
                for xc in &x {
                    let target = [*xc, *yc, *zc];
                    let mut best: Option<(usize, f64)> = None;
                    for (active, center) in centers.iter().enumerate() {
                        let distance = squared_distance3(*center, target);
                        if best.is_none_or(|(_, nearest)| distance < nearest) {
                            best = Some((active, distance));
                        }
                    }
                    if let Some((active, _)) = best {
                        cells.push(grid.active_to_global()[active]);
                    }
                }
            }
        }

        Self {
            resolution,
            x,
            y,
            z,
            cells,
        }
    }

    pub const fn resolution(&self) -> [usize; 3] {
        self.resolution
    }

    /// Output-cell centers along x, y and z (z as elevation, ascending).
    pub fn axes(&self) -> [&[f64]; 3] {
        [&self.x, &self.y, &self.z]
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Global simulator cell of output cell `(ix, iy, iz)`, `iz` counted
    /// from the bottom layer.
    pub fn cell(&self, ix: usize, iy: usize, iz: usize) -> Option<usize> {
        let [nx, ny, nz] = self.resolution;
        if ix >= nx || iy >= ny || iz >= nz {
            return None;
        }
        self.cells
            .get(nx * ny * (nz - 1 - iz) + nx * iy + ix)
            .copied()
    }

    /// Samples a global-sized array at every output cell, in row order
    /// (x fastest, then y, then z from the bottom up).
    pub fn gather(&self, global_values: &[f64]) -> Vec<f64> {
        let [nx, ny, nz] = self.resolution;
        let mut values = Vec::with_capacity(nx * ny * nz);
        for iz in 0..nz {
            for iy in 0..ny {
                for ix in 0..nx {
                    values.push(
                        self.cell(ix, iy, iz)
                            .and_then(|global| global_values.get(global))
                            .copied()
                            .unwrap_or(f64::NAN),
                    );
                }
            }
        }
        values
    }
}
