//! Utility modules for evs-sourcing

pub mod retry;

pub use retry::{RetryPolicy, Transient};
