//! Row processing and batch orchestration

pub mod orchestrator;
pub mod row;

pub use orchestrator::{run, run_with, Backends, BatchResult};
pub use row::{PathLocks, RowProcessor};
