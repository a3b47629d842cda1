//! The render target: the hero section's addressable slots.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

/// Named slot of the hero section.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    Image,
    Headline,
    Subheading,
    CallToAction,
    Badges,
    Container,
    ErrorSurface,
}

impl Slot {
    /// Slots a render cannot proceed without.
    pub const REQUIRED: [Slot; 4] = [Slot::Image, Slot::Headline, Slot::Subheading, Slot::CallToAction];

    pub const ALL: [Slot; 7] = [
        Slot::Image,
        Slot::Headline,
        Slot::Subheading,
        Slot::CallToAction,
        Slot::Badges,
        Slot::Container,
        Slot::ErrorSurface,
    ];

    /// Element id on the page.
    pub fn id(&self) -> &'static str {
        match self {
            Slot::Image => "hero-image",
            Slot::Headline => "hero-headline",
            Slot::Subheading => "hero-subheadline",
            Slot::CallToAction => "hero-cta",
            Slot::Badges => "hero-badges",
            Slot::Container => "hero-container",
            Slot::ErrorSurface => "error-message",
        }
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// Write interface of the page. Writes to absent slots are ignored.
pub trait RenderTarget: Send + Sync {
    fn has_slot(&self, slot: Slot) -> bool;

    fn set_opacity(&self, slot: Slot, opacity: f64);

    fn set_image(&self, src: &str);

    /// Text of the headline, subheading or call-to-action label.
    fn set_text(&self, slot: Slot, text: &str);

    /// Call-to-action href.
    fn set_link(&self, href: &str);

    /// Clear the badge list and rebuild it from `badges`.
    fn replace_badges(&self, badges: &[String]);

    /// Toggle the container's loading-state styling.
    fn set_loading(&self, loading: bool);

    fn show_error(&self, message: &str);

    fn hide_error(&self);
}

/// Observable state of a [`MemoryRenderTarget`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HeroState {
    pub image_src: Option<String>,
    pub headline: Option<String>,
    pub subheadline: Option<String>,
    pub cta_text: Option<String>,
    pub cta_link: Option<String>,
    pub badges: Vec<String>,
    pub opacity: BTreeMap<Slot, f64>,
    pub loading: bool,
    pub error: Option<String>,
}

/// Serialisable form of a [`MemoryRenderTarget`]: which slots exist, plus
/// their contents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TargetDocument {
    #[serde(default = "all_slots")]
    pub slots: BTreeSet<Slot>,
    #[serde(default)]
    pub state: HeroState,
}

fn all_slots() -> BTreeSet<Slot> {
    Slot::ALL.into_iter().collect()
}

/// In-memory render target (tests, CLI dry runs).
#[derive(Debug)]
pub struct MemoryRenderTarget {
    slots: BTreeSet<Slot>,
    state: Mutex<HeroState>,
    mutations: AtomicUsize,
}

impl Default for MemoryRenderTarget {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRenderTarget {
    /// Every slot present, all empty.
    pub fn new() -> Self {
        Self::from_document(TargetDocument {
            slots: all_slots(),
            state: HeroState::default(),
        })
    }

    pub fn from_document(doc: TargetDocument) -> Self {
        Self {
            slots: doc.slots,
            state: Mutex::new(doc.state),
            mutations: AtomicUsize::new(0),
        }
    }

    /// Existing content to render over.
    pub fn with_state(mut self, state: HeroState) -> Self {
        self.state = Mutex::new(state);
        self
    }

    /// Remove a slot from the page.
    pub fn without(mut self, slot: Slot) -> Self {
        self.slots.remove(&slot);
        self
    }

    pub fn state(&self) -> HeroState {
        self.lock().clone()
    }

    pub fn document(&self) -> TargetDocument {
        TargetDocument {
            slots: self.slots.clone(),
            state: self.state(),
        }
    }

    /// Writes to visible content or styling (error surface excluded).
    pub fn mutations(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HeroState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self, slot: Slot, apply: impl FnOnce(&mut HeroState)) {
        if !self.slots.contains(&slot) {
            return;
        }
        self.mutations.fetch_add(1, Ordering::SeqCst);
        apply(&mut *self.lock());
    }
}

impl RenderTarget for MemoryRenderTarget {
    fn has_slot(&self, slot: Slot) -> bool {
        self.slots.contains(&slot)
    }

    fn set_opacity(&self, slot: Slot, opacity: f64) {
        self.write(slot, |s| {
            s.opacity.insert(slot, opacity);
        });
    }

    fn set_image(&self, src: &str) {
        self.write(Slot::Image, |s| s.image_src = Some(src.to_string()));
    }

    fn set_text(&self, slot: Slot, text: &str) {
        let text = Some(text.to_string());
        self.write(slot, |s| match slot {
            Slot::Headline => s.headline = text,
            Slot::Subheading => s.subheadline = text,
            Slot::CallToAction => s.cta_text = text,
            _ => {}
        });
    }

    fn set_link(&self, href: &str) {
        self.write(Slot::CallToAction, |s| s.cta_link = Some(href.to_string()));
    }

    fn replace_badges(&self, badges: &[String]) {
        self.write(Slot::Badges, |s| {
            s.badges.clear();
            s.badges.extend(badges.iter().cloned());
        });
    }

    fn set_loading(&self, loading: bool) {
        self.write(Slot::Container, |s| s.loading = loading);
    }

    fn show_error(&self, message: &str) {
        if self.slots.contains(&Slot::ErrorSurface) {
            self.lock().error = Some(message.to_string());
        }
    }

    fn hide_error(&self) {
        if self.slots.contains(&Slot::ErrorSurface) {
            self.lock().error = None;
        }
    }
}
