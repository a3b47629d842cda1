//! Hero content rendering.

pub mod renderer;
pub mod target;

pub use renderer::ContentRenderer;
pub use target::{HeroState, MemoryRenderTarget, RenderTarget, Slot, TargetDocument};
