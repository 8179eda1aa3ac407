//! Data models for a conversion session
//!
//! Each sub-module covers one part of the session state: queued files and their
//! artifacts, conversion settings, run state, resource references and snapshots.

mod file;
mod resource;
mod run_state;
mod settings;
mod snapshot;

// Re-export all models for convenient imports
pub use file::*;
pub use resource::*;
pub use run_state::*;
pub use settings::*;
pub use snapshot::*;
