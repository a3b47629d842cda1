//! Domain models for the personalization pipeline.
//!
//! Canonical definitions for the entities passed between stages:
//! - `ContextSnapshot`: situational signals for one run
//! - `ClassificationResult`: inferred intent plus full distribution
//! - `BeliefState`: fused posterior and its update history
//! - `TemplateRecord` / `TemplateRegistry`: content variants
//! - `SelectionResult`, `RenderOutcome`, `DecisionRecord`

pub mod belief;
pub mod classification;
pub mod context;
pub mod decision;
pub mod error;
pub mod labeled;
pub mod render;
pub mod selection;
pub mod template;

// Re-export main types and errors
pub use belief::{BeliefState, BeliefStep, LikelihoodSignal};
pub use classification::{intents, ClassificationMethod, ClassificationResult};
pub use context::{ContextSnapshot, DeviceClass, ReferrerKind, UtmAttributes, Viewport};
pub use decision::{DecisionRecord, StageTimings};
pub use error::{PersonalizeError, Result};
pub use labeled::{Distribution, LabeledMap};
pub use render::{ImageResolution, RenderOutcome, RenderPhase};
pub use selection::{SelectionResult, SelectionStrategy};
pub use template::{PerformanceCounters, TemplateContent, TemplateRecord, TemplateRegistry};
