//! # EVS Common Library
//!
//! Shared code for the episode visual sourcing crates:
//! - Stage documents (shot plan, strategic queries, candidates, curated assets, source pack)
//! - The versioned license whitelist
//! - Visual category vocabulary and keyword classification
//! - Text normalization
//! - Configuration loading

pub mod config;
pub mod documents;
pub mod error;
pub mod license;
pub mod text;
pub mod visual_type;

pub use error::{Error, Result};
pub use license::{License, LICENSE_WHITELIST, LICENSE_WHITELIST_VERSION};
pub use visual_type::VisualType;
