//! Normalized media license vocabulary and the license whitelist
//!
//! The whitelist is a compile-time constant shared by the search adapter, the
//! curator and any compliance audit tooling. Widening it means bumping
//! [`LICENSE_WHITELIST_VERSION`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Version of [`LICENSE_WHITELIST`]
pub const LICENSE_WHITELIST_VERSION: u32 = 1;

/// Licenses allowed to reach curated output
pub const LICENSE_WHITELIST: [License; 5] = [
    License::PublicDomain,
    License::Cc0,
    License::CcBy,
    License::CcBySa,
    License::ProviderStock,
];

/// Normalized license of a candidate asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum License {
    PublicDomain,
    Cc0,
    CcBy,
    CcBySa,
    /// Provider's own stock license (Pexels, Pixabay)
    ProviderStock,
    /// Recognized but not whitelisted (NC/ND variants, GFDL, all rights reserved)
    Restricted,
    #[serde(other)]
    Unknown,
}

impl License {
    /// Map a provider's native license string to the common vocabulary
    ///
    /// Accepts the spellings seen across providers: Wikimedia short names
    /// ("CC BY-SA 4.0", "Public domain"), Openverse codes ("by-sa", "pdm"),
    /// and SPDX-like identifiers ("CC-BY-4.0").
    pub fn from_native(raw: &str) -> Self {
        let normalized: String = raw
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c == '_' || c == ' ' { '-' } else { c })
            .collect();
        let normalized = normalized.trim_start_matches("cc-").to_string();

        if normalized.is_empty() {
            return License::Unknown;
        }

        // Strip trailing version suffixes such as "-4.0" or "-2.5-in"
        let base: String = normalized
            .split('-')
            .take_while(|part| !part.starts_with(|c: char| c.is_ascii_digit()))
            .collect::<Vec<_>>()
            .join("-");

        match base.as_str() {
            "pd" | "pdm" | "public-domain" | "publicdomain" | "pd-old" | "pd-us" | "pd-art"
            | "pd-self" | "pd-usgov" | "pd-author" | "no-known-copyright-restrictions"
            | "no-restrictions" => License::PublicDomain,
            "cc0" | "zero" => License::Cc0,
            "by" | "attribution" => License::CcBy,
            "by-sa" | "attribution-sharealike" => License::CcBySa,
            "by-nc" | "by-nd" | "by-nc-sa" | "by-nc-nd" | "nc" | "nd" | "gfdl" | "gpl"
            | "all-rights-reserved" | "copyrighted" | "fair-use" => License::Restricted,
            _ if base.starts_with("pd-") => License::PublicDomain,
            _ if base.starts_with("cc0") => License::Cc0,
            _ => License::Unknown,
        }
    }

    /// Whether the license is on the fixed whitelist
    pub fn is_whitelisted(self) -> bool {
        LICENSE_WHITELIST.contains(&self)
    }

    /// Whether reuse requires crediting the author
    pub fn requires_attribution(self) -> bool {
        matches!(self, License::CcBy | License::CcBySa)
    }

    /// Short human label used in attribution lines
    pub fn label(self) -> &'static str {
        match self {
            License::PublicDomain => "Public domain",
            License::Cc0 => "CC0",
            License::CcBy => "CC BY",
            License::CcBySa => "CC BY-SA",
            License::ProviderStock => "Stock license",
            License::Restricted => "Restricted",
            License::Unknown => "Unknown license",
        }
    }
}

impl fmt::Display for License {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            License::PublicDomain => "public_domain",
            License::Cc0 => "cc0",
            License::CcBy => "cc_by",
            License::CcBySa => "cc_by_sa",
            License::ProviderStock => "provider_stock",
            License::Restricted => "restricted",
            License::Unknown => "unknown",
        };
        f.write_str(s)
    }
}
