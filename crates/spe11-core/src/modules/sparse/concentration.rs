//! Concentration-variation metric `M_C` over box C.

use super::model::NativeSeries;
use crate::adapter::{Grid, SimulationData, StaticFields};
use crate::domain::ReductionResult;
use crate::modules::phase_mass::PhaseMasses;
use crate::numerics::stable_sum;

/// Global neighbor indices along `+x`, `-y` and `-z`; `None` at the grid
/// faces.
#[derive(Debug, Clone, PartialEq)]
pub struct NeighborArrays {
    pub plus_x: Vec<Option<usize>>,
    pub minus_y: Vec<Option<usize>>,
    pub minus_z: Vec<Option<usize>>,
}

impl NeighborArrays {
    pub fn new([nx, ny, nz]: [usize; 3]) -> Self {
        let cells = nx * ny * nz;
        let layer = nx * ny;
        let mut arrays = Self {
            plus_x: Vec::with_capacity(cells),
            minus_y: Vec::with_capacity(cells),
            minus_z: Vec::with_capacity(cells),
        };
        for global in 0..cells {
            let (ix, iy, iz) = (global % nx, (global / nx) % ny, global / layer);
            arrays.plus_x.push((ix + 1 < nx).then_some(global + 1));
            arrays.minus_y.push((iy > 0).then(|| global - nx));
            arrays.minus_z.push((iz > 0).then(|| global - layer));
        }
        arrays
    }
}

/// One cell/neighbor pair inside box C with the area of the shared face.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Face {
    cell: usize,
    neighbor: usize,
    area: f64,
}

/// Faces between box-C cells, in active indexing.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxStencil {
    cells: Vec<usize>,
    faces: Vec<Face>,
}

impl BoxStencil {
    pub fn new(
        grid: &Grid,
        statics: &StaticFields,
        box_cells: &[usize],
        three_dimensional: bool,
    ) -> Self {
        let neighbors = NeighborArrays::new(grid.dimensions());
        let mut in_box = vec![false; grid.active_cells()];
        for cell in box_cells {
            in_box[*cell] = true;
        }

        let mut faces = Vec::new();
        for cell in box_cells.iter().copied() {
            let global = grid.active_to_global()[cell];
            let (dx, dy, dz) = (statics.dx[cell], statics.dy[cell], statics.dz[cell]);
            let mut directions = vec![
                (
                    neighbors.plus_x[global],
                    if three_dimensional { dy * dz } else { dz },
                ),
                (
                    neighbors.minus_z[global],
                    if three_dimensional { dx * dy } else { dx },
                ),
            ];
            if three_dimensional {
                directions.push((neighbors.minus_y[global], dx * dz));
            }

            for (neighbor, area) in directions {
                let Some(neighbor) = neighbor.and_then(|global| grid.global_to_active(global))
                else {
                    continue;
                };
                if in_box[neighbor] {
                    faces.push(Face {
                        cell,
                        neighbor,
                        area,
                    });
                }
            }
        }

        Self {
            cells: box_cells.to_vec(),
            faces,
        }
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Largest value of `field` over the box cells.
    pub fn max_over_box(&self, field: &[f64]) -> f64 {
        self.cells
            .iter()
            .map(|cell| field[*cell])
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// `Σ |x(neighbor) − x(cell)| · area` over the faces, with `x = field / scale`.
    pub fn variation(&self, field: &[f64], scale: f64) -> f64 {
        let normalized = |cell: usize| {
            if scale != 0.0 {
                field[cell] / scale
            } else {
                field[cell]
            }
        };
        stable_sum(
            self.faces
                .iter()
                .map(|face| (normalized(face.neighbor) - normalized(face.cell)).abs() * face.area),
        )
    }
}

/// `M_C` on the restart axis, 0 at the window start.
pub(crate) fn concentration_series(
    data: &SimulationData,
    box_c: &[usize],
) -> ReductionResult<NativeSeries> {
    let stencil = BoxStencil::new(
        &data.grid,
        &data.statics,
        box_c,
        data.case.is_three_dimensional(),
    );

    let fractions = data
        .time_base
        .window_steps()
        .map(|step| PhaseMasses::at_step(data, step).map(|masses| masses.liquid_co2_fraction()))
        .collect::<ReductionResult<Vec<_>>>()?;
    let maximum = if box_c.is_empty() {
        0.0
    } else {
        fractions
            .iter()
            .map(|fraction| stencil.max_over_box(fraction))
            .fold(f64::NEG_INFINITY, f64::max)
    };

    let mut values = Vec::with_capacity(fractions.len());
    values.push(0.0);
    values.extend(
        fractions
            .iter()
            .skip(1)
            .map(|fraction| stencil.variation(fraction, maximum)),
    );
    Ok(NativeSeries::new(data.time_base.report_axis(), values))
}
