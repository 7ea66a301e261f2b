//! Per-build index of claimed assets

use crate::error::{SourcingError, SourcingResult};
use std::collections::HashMap;

/// `source_id` → owning scene, scoped to one build call
#[derive(Debug, Default)]
pub struct UsedAssets {
    owners: HashMap<String, String>,
}

impl UsedAssets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `source_id` for `scene_id`
    ///
    /// Re-claiming for the same scene is a no-op; a claim by a different scene
    /// is [`SourcingError::DuplicateAssignment`].
    pub fn claim(&mut self, source_id: &str, scene_id: &str) -> SourcingResult<()> {
        match self.owners.get(source_id) {
            Some(owner) if owner != scene_id => {
                tracing::error!(
                    source_id,
                    first_scene = %owner,
                    second_scene = scene_id,
                    "Asset claimed by two scenes"
                );
                Err(SourcingError::DuplicateAssignment {
                    source_id: source_id.to_string(),
                    first_scene: owner.clone(),
                    second_scene: scene_id.to_string(),
                })
            }
            Some(_) => Ok(()),
            None => {
                self.owners.insert(source_id.to_string(), scene_id.to_string());
                Ok(())
            }
        }
    }

    pub fn is_used(&self, source_id: &str) -> bool {
        self.owners.contains_key(source_id)
    }
}
