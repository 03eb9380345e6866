use crate::domain::{CaseVariant, ReductionError, ReductionResult};
use crate::readers::SimulationOutput;

/// Keyword convention of the liquid phase in the restart output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameSchema {
    /// `WAT_DEN`, `RSW`, `RVW`
    Water,
    /// `OIL_DEN`, `RS`, `RV`
    Oil,
}

impl NameSchema {
    /// Probes `WAT_DEN`, then `OIL_DEN`, in the first report step.
    pub fn detect(output: &dyn SimulationOutput) -> ReductionResult<Self> {
        if output.has_restart_keyword("WAT_DEN") {
            Ok(Self::Water)
        } else if output.has_restart_keyword("OIL_DEN") {
            Ok(Self::Oil)
        } else {
            Err(ReductionError::schema_mismatch(
                "restart output has neither WAT_DEN nor OIL_DEN",
            ))
        }
    }

    pub const fn liquid_density(self) -> &'static str {
        match self {
            Self::Water => "WAT_DEN",
            Self::Oil => "OIL_DEN",
        }
    }

    pub const fn dissolved_ratio(self) -> &'static str {
        match self {
            Self::Water => "RSW",
            Self::Oil => "RS",
        }
    }

    pub const fn vaporized_ratio(self) -> &'static str {
        match self {
            Self::Water => "RVW",
            Self::Oil => "RV",
        }
    }
}

/// Cell-wise restart quantities used by the reduction modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Quantity {
    GasSaturation,
    DissolvedRatio,
    /// bar
    Pressure,
    GasDensity,
    LiquidDensity,
    GasRelativePermeability,
    VaporizedRatio,
    /// °C
    Temperature,
}

impl Quantity {
    pub fn required_for(case: CaseVariant) -> Vec<Self> {
        let mut quantities = vec![
            Self::GasSaturation,
            Self::DissolvedRatio,
            Self::Pressure,
            Self::GasDensity,
            Self::LiquidDensity,
            Self::GasRelativePermeability,
        ];
        if case.has_vapor_phase() {
            quantities.extend([Self::VaporizedRatio, Self::Temperature]);
        }
        quantities
    }

    pub const fn keyword(self, schema: NameSchema) -> &'static str {
        match self {
            Self::GasSaturation => "SGAS",
            Self::DissolvedRatio => schema.dissolved_ratio(),
            Self::Pressure => "PRESSURE",
            Self::GasDensity => "GAS_DEN",
            Self::LiquidDensity => schema.liquid_density(),
            Self::GasRelativePermeability => "GASKR",
            Self::VaporizedRatio => schema.vaporized_ratio(),
            Self::Temperature => "TEMP",
        }
    }
}
