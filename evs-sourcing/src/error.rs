//! Error types for evs-sourcing
//!
//! Only pipeline-fatal conditions live here. Recoverable provider failures are
//! [`crate::search::ProviderError`] and never leave the search adapter; coverage
//! deficits are reported in stage documents, not raised.

use evs_common::documents::Deficit;
use evs_common::License;
use thiserror::Error;

/// Pipeline-fatal error
#[derive(Debug, Error)]
pub enum SourcingError {
    /// An asset would be assigned to two scenes (programming defect)
    #[error("Asset {source_id} used by scene {first_scene} and again by scene {second_scene}")]
    DuplicateAssignment {
        source_id: String,
        first_scene: String,
        second_scene: String,
    },

    /// A non-whitelisted license reached curation without the override
    #[error("License gate bypass: {source_id} has license {license}")]
    LicenseGateBypass { source_id: String, license: License },

    /// The downstream compiler must refuse to render
    #[error(
        "Insufficient visual coverage: {coverage_pct:.1}% of scenes covered \
         ({scenes_covered}/{scenes_total}), minimum {min_coverage_pct:.1}%"
    )]
    InsufficientCoverage {
        coverage_pct: f64,
        min_coverage_pct: f64,
        scenes_covered: usize,
        scenes_total: usize,
        deficits: Vec<Deficit>,
    },

    /// A stage document failed boundary validation
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// evs-common error
    #[error("Common error: {0}")]
    Common(#[from] evs_common::Error),
}

/// Result type for pipeline stages
pub type SourcingResult<T> = Result<T, SourcingError>;
