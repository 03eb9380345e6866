pub mod dense;
pub mod performance;
pub mod phase_mass;
pub mod serialization;
pub mod sparse;

mod dispatch;
mod traits;

pub use dispatch::{execute_output_kind, execute_selected, run_reduction};
pub use traits::ModuleExecutor;
