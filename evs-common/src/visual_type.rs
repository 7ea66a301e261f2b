//! Visual category vocabulary
//!
//! Shared by the shot plan (scene hints), the query director (priority weights
//! and coverage floors), the curator (classification) and the source pack
//! builder (texture preference).

use crate::text::words;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Visual category of a scene hint, query or asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisualType {
    Map,
    Portrait,
    Document,
    BattleScene,
    CivilianLife,
    Architecture,
    Artifact,
    Landscape,
    Texture,
    #[serde(other)]
    Other,
}

/// Keyword rules applied in order; the first rule with a matching cue wins
const CLASSIFICATION_RULES: &[(VisualType, &[&str])] = &[
    (
        VisualType::Map,
        &[
            "map", "maps", "atlas", "cartography", "cartographic", "territory", "territories",
            "borders", "frontier", "route", "routes", "campaign map", "chart of",
        ],
    ),
    (
        VisualType::Document,
        &[
            "document", "documents", "letter", "letters", "manuscript", "treaty", "decree",
            "newspaper", "handwritten", "charter", "declaration", "telegram", "proclamation",
            "edict", "constitution", "diary", "ledger", "poster",
        ],
    ),
    (
        VisualType::Portrait,
        &[
            "portrait", "portraits", "bust", "headshot", "likeness", "painting of",
            "photograph of", "emperor", "king", "queen", "general", "president",
        ],
    ),
    (
        VisualType::BattleScene,
        &[
            "battle", "battles", "war", "siege", "soldiers", "troops", "combat", "army",
            "armies", "cavalry", "infantry", "artillery", "warfare", "trenches",
        ],
    ),
    (
        VisualType::Architecture,
        &[
            "castle", "cathedral", "palace", "building", "buildings", "church", "temple",
            "fortress", "bridge", "monument", "tower", "ruins",
        ],
    ),
    (
        VisualType::Artifact,
        &[
            "coin", "coins", "sword", "armor", "armour", "artifact", "artefact", "pottery",
            "medal", "helmet", "jewelry", "relic", "weapon",
        ],
    ),
    (
        VisualType::CivilianLife,
        &[
            "village", "market", "street", "farm", "farmers", "family", "workers", "daily life",
            "children", "town", "peasants", "crowd", "factory",
        ],
    ),
    (
        VisualType::Landscape,
        &[
            "landscape", "mountain", "mountains", "river", "valley", "sea", "coast", "forest",
            "countryside", "desert", "lake", "aerial",
        ],
    ),
    (
        VisualType::Texture,
        &[
            "texture", "fog", "smoke", "fire", "flames", "clouds", "parchment", "abstract",
            "background", "grain", "candle", "dust",
        ],
    ),
];

impl VisualType {
    /// All categories in declaration order
    pub const ALL: [VisualType; 10] = [
        VisualType::Map,
        VisualType::Portrait,
        VisualType::Document,
        VisualType::BattleScene,
        VisualType::CivilianLife,
        VisualType::Architecture,
        VisualType::Artifact,
        VisualType::Landscape,
        VisualType::Texture,
        VisualType::Other,
    ];

    /// Fixed priority weight used by the query director (higher = more important)
    pub fn priority_weight(self) -> u32 {
        match self {
            VisualType::Portrait => 9,
            VisualType::Document => 8,
            VisualType::BattleScene => 7,
            VisualType::Artifact => 6,
            VisualType::CivilianLife => 6,
            VisualType::Map => 5,
            VisualType::Architecture => 5,
            VisualType::Landscape => 4,
            VisualType::Other => 3,
            VisualType::Texture => 1,
        }
    }

    /// Share of hinting scenes that need their own asset of this type
    ///
    /// Maps and textures reuse well across scenes, so they scale at half rate.
    pub fn coverage_ratio(self) -> f64 {
        match self {
            VisualType::Map | VisualType::Texture => 0.5,
            _ => 1.0,
        }
    }

    /// Minimum asset count once at least one scene hints this type
    pub fn coverage_floor(self) -> u32 {
        match self {
            VisualType::Texture => 0,
            _ => 1,
        }
    }

    /// Lower-motion categories suited to the texture role and texture pool
    pub fn is_low_motion(self) -> bool {
        matches!(
            self,
            VisualType::Texture | VisualType::Landscape | VisualType::Architecture
        )
    }

    /// Classify free text with the keyword rule table
    ///
    /// Returns `None` when no rule matches.
    pub fn classify(text: &str) -> Option<VisualType> {
        let padded = format!(" {} ", words(text).join(" "));
        CLASSIFICATION_RULES
            .iter()
            .find(|(_, cues)| cues.iter().any(|cue| padded.contains(&format!(" {} ", cue))))
            .map(|(visual_type, _)| *visual_type)
    }

    /// Classify free text, falling back to [`VisualType::Other`]
    pub fn classify_or_other(text: &str) -> VisualType {
        Self::classify(text).unwrap_or(VisualType::Other)
    }

    /// Wire name (snake_case)
    pub fn as_str(self) -> &'static str {
        match self {
            VisualType::Map => "map",
            VisualType::Portrait => "portrait",
            VisualType::Document => "document",
            VisualType::BattleScene => "battle_scene",
            VisualType::CivilianLife => "civilian_life",
            VisualType::Architecture => "architecture",
            VisualType::Artifact => "artifact",
            VisualType::Landscape => "landscape",
            VisualType::Texture => "texture",
            VisualType::Other => "other",
        }
    }
}

impl fmt::Display for VisualType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
