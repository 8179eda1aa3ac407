//! allconv session library
//!
//! The conversion session store: an ordered file queue, shared conversion settings and a
//! run driver that converts files one at a time with pause, resume and cancel.

pub mod download;
mod driver;
pub mod events;
pub mod store;

pub use download::DownloadOutcome;
pub use events::{RunSummary, SessionEvent};
pub use store::ConversionSessionStore;
