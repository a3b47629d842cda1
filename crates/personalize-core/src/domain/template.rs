//! Content variants and the registry that holds them.

use serde::{Deserialize, Serialize};

use crate::domain::classification::intents;
use crate::domain::error::{PersonalizeError, Result};
use crate::domain::labeled::{Distribution, LabeledMap};

/// Renderable hero content. Every field may be absent; the renderer fills
/// documented defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TemplateContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subheadline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cta_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cta_link: Option<String>,
    #[serde(default)]
    pub badges: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hero_image: Option<String>,
}

/// Conversion counters for one template.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PerformanceCounters {
    pub successes: u64,
    pub failures: u64,
}

impl Default for PerformanceCounters {
    fn default() -> Self {
        Self {
            successes: 1,
            failures: 1,
        }
    }
}

/// One content variant as stored in the registry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TemplateRecord {
    pub template_id: String,

    #[serde(flatten)]
    pub content: TemplateContent,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub successes: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failures: Option<u64>,
}

impl TemplateRecord {
    pub fn new(template_id: impl Into<String>, content: TemplateContent) -> Self {
        Self {
            template_id: template_id.into(),
            content,
            successes: None,
            failures: None,
        }
    }

    pub fn with_counters(mut self, successes: u64, failures: u64) -> Self {
        self.successes = Some(successes);
        self.failures = Some(failures);
        self
    }

    /// Counters as seeded by the registry (unset counters default to 1).
    pub fn counters(&self) -> PerformanceCounters {
        let defaults = PerformanceCounters::default();
        PerformanceCounters {
            successes: self.successes.unwrap_or(defaults.successes),
            failures: self.failures.unwrap_or(defaults.failures),
        }
    }

    pub fn hero_image(&self) -> Option<&str> {
        self.content
            .hero_image
            .as_deref()
            .filter(|src| !src.trim().is_empty())
    }
}

/// Intent → template mapping plus the default entry and optional priors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TemplateRegistry {
    pub templates: LabeledMap<TemplateRecord>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priors: Option<Distribution>,
}

impl TemplateRegistry {
    /// Template registered for `intent`.
    pub fn template_for(&self, intent: &str) -> Option<&TemplateRecord> {
        self.templates.get(intent)
    }

    /// The default/fallback template.
    pub fn default_template(&self) -> Option<&TemplateRecord> {
        self.templates.get(intents::DEFAULT)
    }

    /// Check structural requirements: a DEFAULT entry, unique template ids,
    /// and non-negative priors.
    pub fn validate(&self) -> Result<()> {
        if self.default_template().is_none() {
            return Err(PersonalizeError::InvalidRegistry(format!(
                "missing {} template",
                intents::DEFAULT
            )));
        }

        let mut seen = std::collections::HashSet::new();
        for (intent, template) in self.templates.iter() {
            if template.template_id.trim().is_empty() {
                return Err(PersonalizeError::InvalidRegistry(format!(
                    "template for {intent} has an empty template_id"
                )));
            }
            if !seen.insert(template.template_id.as_str()) {
                return Err(PersonalizeError::InvalidRegistry(format!(
                    "duplicate template_id {}",
                    template.template_id
                )));
            }
        }

        if let Some(priors) = &self.priors {
            if priors.values().any(|p| !p.is_finite() || *p < 0.0) {
                return Err(PersonalizeError::InvalidRegistry(
                    "priors must be finite and non-negative".to_string(),
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_json() -> &'static str {
        r#"{
            "templates": {
                "GAMING": {
                    "template_id": "hero-gaming-v2",
                    "headline": "Dominate Every Frame",
                    "badges": ["240Hz Refresh", "1ms Response"],
                    "hero_image": "/images/gaming.jpg",
                    "successes": 42,
                    "failures": 10
                },
                "DEFAULT": {
                    "template_id": "hero-default",
                    "headline": "Premium Displays for Professionals",
                    "hero_image": "/images/default.jpg"
                }
            },
            "priors": {"GAMING": 0.3, "DEFAULT": 0.1}
        }"#
    }

    #[test]
    fn test_registry_parses_flattened_content() {
        let registry: TemplateRegistry = serde_json::from_str(registry_json()).unwrap();
        registry.validate().unwrap();

        let gaming = registry.template_for("GAMING").unwrap();
        assert_eq!(gaming.content.headline.as_deref(), Some("Dominate Every Frame"));
        assert_eq!(gaming.content.badges.len(), 2);
        assert_eq!(
            gaming.counters(),
            PerformanceCounters {
                successes: 42,
                failures: 10
            }
        );

        let default = registry.default_template().unwrap();
        assert_eq!(default.counters(), PerformanceCounters::default());
        assert!(default.content.badges.is_empty());
    }

    #[test]
    fn test_missing_default_is_invalid() {
        let registry = TemplateRegistry {
            templates: [(
                "GAMING",
                TemplateRecord::new("hero-gaming", TemplateContent::default()),
            )]
            .into_iter()
            .collect(),
            priors: None,
        };
        let err = registry.validate().unwrap_err();
        assert!(err.to_string().contains("DEFAULT"));
    }

    #[test]
    fn test_duplicate_template_ids_are_invalid() {
        let registry = TemplateRegistry {
            templates: [
                ("GAMING", TemplateRecord::new("same", TemplateContent::default())),
                ("DEFAULT", TemplateRecord::new("same", TemplateContent::default())),
            ]
            .into_iter()
            .collect(),
            priors: None,
        };
        assert!(registry.validate().is_err());
    }

    #[test]
    fn test_blank_hero_image_counts_as_missing() {
        let template = TemplateRecord::new(
            "t",
            TemplateContent {
                hero_image: Some("  ".to_string()),
                ..Default::default()
            },
        );
        assert!(template.hero_image().is_none());
    }
}
