//! Loads and merges the YAML task manifest.
//!
//! Out of scope per the core daemon subsystem, but something has to
//! turn a directory of YAML files into a runnable command string, so
//! this crate carries the minimal contract: parse, merge, substitute.

mod error;
mod load;
mod substitute;
mod types;

pub use error::ManifestError;
pub use load::load;
pub use substitute::substitute;
pub use types::{Manifest, ParamSpec, TaskDef, TaskKind};
