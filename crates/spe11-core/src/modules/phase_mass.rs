//! Per-cell component masses derived from the restart fields.

use crate::adapter::{Quantity, SimulationData};
use crate::common::constants::{GAS_DEN_REF, WAT_DEN_REF};
use crate::domain::ReductionResult;
use crate::numerics::mass_fraction;

/// Active-sized masses [kg] at one report step.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseMasses {
    /// `sg · ρg · pv`
    pub co2_gas: Vec<f64>,
    /// `rs · ρl · (1 − sg) · pv · ρ_CO2,ref / ρ_H2O,ref`
    pub co2_dissolved: Vec<f64>,
    /// `(1 − sg) · ρl · pv`
    pub h2o_liquid: Vec<f64>,
}

impl PhaseMasses {
    pub fn at_step(data: &SimulationData, step: usize) -> ReductionResult<Self> {
        let sgas = data.field(Quantity::GasSaturation, step)?;
        let rs = data.field(Quantity::DissolvedRatio, step)?;
        let gas_density = data.field(Quantity::GasDensity, step)?;
        let liquid_density = data.field(Quantity::LiquidDensity, step)?;
        let pore_volume = &data.statics.pore_volume;

        let cells = pore_volume.len();
        let mut masses = Self {
            co2_gas: Vec::with_capacity(cells),
            co2_dissolved: Vec::with_capacity(cells),
            h2o_liquid: Vec::with_capacity(cells),
        };
        for cell in 0..cells {
            let (sg, pv) = (sgas[cell], pore_volume[cell]);
            let liquid = (1.0 - sg) * liquid_density[cell] * pv;
            masses.co2_gas.push(sg * gas_density[cell] * pv);
            masses
                .co2_dissolved
                .push(rs[cell] * liquid * GAS_DEN_REF / WAT_DEN_REF);
            masses.h2o_liquid.push(liquid);
        }
        Ok(masses)
    }

    pub fn total_co2(&self, cell: usize) -> f64 {
        self.co2_gas[cell] + self.co2_dissolved[cell]
    }

    /// Mass fraction of CO2 in the liquid phase of every cell.
    pub fn liquid_co2_fraction(&self) -> Vec<f64> {
        self.co2_dissolved
            .iter()
            .zip(&self.h2o_liquid)
            .map(|(co2, h2o)| mass_fraction(*co2, *h2o))
            .collect()
    }
}
