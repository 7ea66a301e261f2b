//! Typed JSON documents exchanged between pipeline stages
//!
//! Each stage owns and fully replaces its output document. Documents are
//! validated at stage boundaries instead of being passed through loosely.

pub mod candidate;
pub mod curated;
pub mod query;
pub mod scene;
pub mod source_pack;

pub use candidate::{Candidate, MediaType, QueryResults, SearchReport, SearchSummary};
pub use curated::{CuratedAsset, CurationDedupeReport, CurationOutput, Deficit};
pub use query::{
    CoverageRequirement, CoverageRequirements, DirectorOutput, QueryDedupeReport, StrategicQuery,
};
pub use scene::{Scene, ShotPlan};
pub use source_pack::{AssetSlot, DuplicateUse, FallbackPools, SceneAssignment, SourcePack};
