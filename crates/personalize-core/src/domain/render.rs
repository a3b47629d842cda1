//! Render outcomes.

use serde::{Deserialize, Serialize};

/// States of one render invocation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RenderPhase {
    Validating,
    TransitioningOut,
    LoadingImage,
    SwappingContent,
    TransitioningIn,
    Done,
    Error,
}

/// Which image ended up on the page.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ImageResolution {
    /// The selected template's image was applied.
    Primary,
    /// The fallback template's image (and content) was applied.
    Fallback,
    /// No image could be loaded; the existing image was left in place.
    Unresolved,
}

/// Result of one render invocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RenderOutcome {
    pub success: bool,

    /// Template whose text content was applied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_applied: Option<String>,

    pub fallback_used: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageResolution>,

    pub elapsed_ms: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Phases visited, in order.
    pub phases: Vec<RenderPhase>,
}

impl RenderOutcome {
    /// Final phase reached.
    pub fn terminal_phase(&self) -> Option<RenderPhase> {
        self.phases.last().copied()
    }
}
