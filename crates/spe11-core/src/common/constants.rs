//! Reference densities and unit conversions shared by the reduction modules.
//!
//! Densities are the surface-condition values the simulator uses to convert
//! dissolved and vaporized ratios into masses.

/// CO2 density at reference conditions [kg/m3].
pub const GAS_DEN_REF: f64 = 1.86843;
/// Brine density at reference conditions [kg/m3].
pub const WAT_DEN_REF: f64 = 998.108;
pub const SECONDS_IN_YEAR: f64 = 31_536_000.0;
pub const SECONDS_IN_DAY: f64 = 86_400.0;
pub const SECONDS_IN_HOUR: f64 = 3_600.0;
/// Molar mass of CO2 expressed as kg per kmol.
pub const KMOL_TO_KG: f64 = 1.0e3 * 0.044;
pub const BAR_TO_PA: f64 = 1.0e5;
