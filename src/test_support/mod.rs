//! Test utilities shared across crate-level unit tests.

pub mod task;

pub use task::{ManualTask, ManualTaskHandle, VendorError};
