//! Situational signals captured once per run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where the visitor came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ReferrerKind {
    Direct,
    Search,
    SocialVideo,
    SocialProfessional,
    SocialGeneric,
    ReferralOther,
}

impl ReferrerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferrerKind::Direct => "direct",
            ReferrerKind::Search => "search",
            ReferrerKind::SocialVideo => "social_video",
            ReferrerKind::SocialProfessional => "social_professional",
            ReferrerKind::SocialGeneric => "social_generic",
            ReferrerKind::ReferralOther => "referral_other",
        }
    }
}

impl std::fmt::Display for ReferrerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Device class derived from viewport width.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    Mobile,
    Tablet,
    Desktop,
}

/// Viewport dimensions in CSS pixels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 800,
        }
    }
}

impl std::fmt::Display for Viewport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl std::str::FromStr for Viewport {
    type Err = String;

    /// Parse `WIDTHxHEIGHT`, e.g. `1280x800`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {s:?}"))?;
        let width = w.trim().parse().map_err(|_| format!("bad width in {s:?}"))?;
        let height = h.trim().parse().map_err(|_| format!("bad height in {s:?}"))?;
        Ok(Viewport { width, height })
    }
}

/// Campaign attribution parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UtmAttributes {
    pub source: Option<String>,
    pub campaign: Option<String>,
    pub medium: Option<String>,
}

/// Immutable snapshot of the visitor's context for one run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContextSnapshot {
    /// Page URL the snapshot was taken from.
    pub url: String,

    /// Raw `q` query parameter (empty when absent).
    pub query: String,

    /// Explicit `intent` parameter, if any.
    pub intent_override: Option<String>,

    /// Raw referrer (None for direct traffic).
    pub referrer: Option<String>,

    pub referrer_kind: ReferrerKind,

    pub device: DeviceClass,

    pub viewport: Viewport,

    pub utm: UtmAttributes,

    pub collected_at: DateTime<Utc>,
}
