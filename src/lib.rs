//! lcaforge: Monte Carlo Life-Cycle Assessment engine for metals and
//! alloys.
//!
//! One entry point: [`run_simulation`] takes a raw study mapping, normalises
//! it, draws N samples per impact category, derives the circularity / flow /
//! comparison bundles and assembles an immutable [`Report`]. Failures never
//! escape the boundary; they come back as an empty report with a message.

pub mod derived;
pub mod error;
pub mod logging;
pub mod reference;
pub mod report;
pub mod sampler;
pub mod study;

pub use error::SimError;
pub use reference::{ImpactCategory, ImpactSpec, ReferenceTable, RegionTable};
pub use report::{run_simulation, run_simulation_default, Report, Simulation, StudyState};
pub use sampler::{CancelToken, ImpactSummary, DEFAULT_NUM_RUNS};
pub use study::{normalise, Material, StudyDescriptor, StudyInput};
