//! Test Helper Utilities
//!
//! Shared utilities for testing evs-sourcing

#![allow(dead_code)]

pub mod fake_providers;
pub mod fixtures;
pub mod log_capture;

// Re-export commonly used items
pub use fake_providers::{
    napoleon_providers, CatalogProvider, FailingProvider, FlakyProvider, NAPOLEON_QUERIES,
    SHARED_NATIVE_ID,
};
pub use fixtures::{napoleon_plan, raw_result, scene, test_config};
pub use log_capture::{init_test_logging, LogCapture};
