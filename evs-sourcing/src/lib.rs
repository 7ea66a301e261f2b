//! evs-sourcing library interface
//!
//! Turns a narrated shot plan into a license-safe, scene-assigned source pack:
//! Query Director → Multi-Source Search Adapter → Visual Curator → Source Pack
//! Builder, followed by the Coverage Gate.
//!
//! Exposes public APIs for integration testing

pub mod config;
pub mod curator;
pub mod director;
pub mod error;
pub mod gate;
pub mod search;
pub mod source_pack;
pub mod utils;
pub mod workflow;

pub use crate::config::{ConfigOverrides, SourcingConfig};
pub use crate::curator::Curator;
pub use crate::director::QueryDirector;
pub use crate::error::{SourcingError, SourcingResult};
pub use crate::gate::{CoverageGate, CoverageSummary};
pub use crate::search::{Provider, ProviderError, RawResult, SearchAdapter};
pub use crate::source_pack::SourcePackBuilder;
pub use crate::workflow::{EpisodePipeline, PipelineEvent, PipelineRun};
