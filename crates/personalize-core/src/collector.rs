//! Context collection: page request → [`ContextSnapshot`].
//!
//! Collection never fails. Anything missing or unparsable resolves to a
//! documented default (empty query, direct referrer, desktop viewport).

use chrono::Utc;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::domain::context::{ContextSnapshot, DeviceClass, ReferrerKind, UtmAttributes, Viewport};

/// Breakpoints in CSS pixels.
const MOBILE_MAX_WIDTH: u32 = 768;
const TABLET_MAX_WIDTH: u32 = 1024;

/// Known referrer domains, checked top to bottom; first substring hit wins.
const REFERRER_TABLE: &[(&[&str], ReferrerKind)] = &[
    (&["google", "bing", "duckduckgo"], ReferrerKind::Search),
    (&["youtube"], ReferrerKind::SocialVideo),
    (&["facebook", "instagram"], ReferrerKind::SocialGeneric),
    (&["linkedin"], ReferrerKind::SocialProfessional),
    (&["twitter", "x.com"], ReferrerKind::SocialGeneric),
];

/// The environment one run is collected from.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageRequest {
    /// Full page URL, or a path plus query string such as `/?q=gaming`.
    pub url: String,
    #[serde(default)]
    pub referrer: Option<String>,
    #[serde(default)]
    pub viewport: Option<Viewport>,
}

impl PageRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            referrer: None,
            viewport: None,
        }
    }

    pub fn with_referrer(mut self, referrer: impl Into<String>) -> Self {
        self.referrer = Some(referrer.into());
        self
    }

    pub fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport = Some(Viewport { width, height });
        self
    }
}

/// Extracts a [`ContextSnapshot`] from a [`PageRequest`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextCollector;

impl ContextCollector {
    pub fn new() -> Self {
        Self
    }

    pub fn collect(&self, request: &PageRequest) -> ContextSnapshot {
        let params = query_pairs(&request.url);
        let param = |name: &str| {
            params
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
                .filter(|v| !v.is_empty())
        };

        let referrer = request
            .referrer
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string);

        let viewport = request.viewport.unwrap_or_default();

        ContextSnapshot {
            url: request.url.clone(),
            query: param("q").unwrap_or_default(),
            intent_override: param("intent"),
            referrer_kind: classify_referrer(referrer.as_deref()),
            referrer,
            device: detect_device(&viewport),
            viewport,
            utm: UtmAttributes {
                source: param("utm_source"),
                campaign: param("utm_campaign"),
                medium: param("utm_medium"),
            },
            collected_at: Utc::now(),
        }
    }
}

/// Classify a referrer by substring match against known domains.
pub fn classify_referrer(referrer: Option<&str>) -> ReferrerKind {
    let Some(referrer) = referrer.filter(|r| !r.trim().is_empty()) else {
        return ReferrerKind::Direct;
    };
    let lowered = referrer.to_lowercase();
    REFERRER_TABLE
        .iter()
        .find(|(needles, _)| needles.iter().any(|n| lowered.contains(n)))
        .map(|(_, kind)| *kind)
        .unwrap_or(ReferrerKind::ReferralOther)
}

/// Device class from viewport width.
pub fn detect_device(viewport: &Viewport) -> DeviceClass {
    if viewport.width < MOBILE_MAX_WIDTH {
        DeviceClass::Mobile
    } else if viewport.width < TABLET_MAX_WIDTH {
        DeviceClass::Tablet
    } else {
        DeviceClass::Desktop
    }
}

/// Decoded query pairs; relative URLs are resolved against a placeholder
/// origin. Unparsable input yields no pairs.
fn query_pairs(raw: &str) -> Vec<(String, String)> {
    let parsed = Url::parse(raw).or_else(|_| {
        Url::parse("http://localhost/").and_then(|base| base.join(raw))
    });
    match parsed {
        Ok(url) => url.query_pairs().into_owned().collect(),
        Err(err) => {
            tracing::debug!(url = %raw, error = %err, "unparsable page url; no query signals");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_signals_missing() {
        let snapshot = ContextCollector::new().collect(&PageRequest::new("/"));
        assert_eq!(snapshot.query, "");
        assert_eq!(snapshot.intent_override, None);
        assert_eq!(snapshot.referrer, None);
        assert_eq!(snapshot.referrer_kind, ReferrerKind::Direct);
        assert_eq!(snapshot.device, DeviceClass::Desktop);
        assert_eq!(snapshot.viewport, Viewport::default());
    }

    #[test]
    fn test_query_override_and_utm_extracted() {
        let request = PageRequest::new(
            "https://shop.example.test/?q=best%20gaming%20monitor&intent=BUDGET&utm_source=newsletter&utm_medium=email",
        );
        let snapshot = ContextCollector::new().collect(&request);
        assert_eq!(snapshot.query, "best gaming monitor");
        assert_eq!(snapshot.intent_override.as_deref(), Some("BUDGET"));
        assert_eq!(snapshot.utm.source.as_deref(), Some("newsletter"));
        assert_eq!(snapshot.utm.medium.as_deref(), Some("email"));
        assert_eq!(snapshot.utm.campaign, None);
    }

    #[test]
    fn test_relative_url_is_accepted() {
        let snapshot = ContextCollector::new().collect(&PageRequest::new("/?q=cheap+deal"));
        assert_eq!(snapshot.query, "cheap deal");
    }

    #[test]
    fn test_empty_intent_param_is_no_override() {
        let snapshot = ContextCollector::new().collect(&PageRequest::new("/?intent="));
        assert_eq!(snapshot.intent_override, None);
    }

    #[test]
    fn test_referrer_priority_order() {
        let cases = [
            ("https://www.google.com/search?q=youtube", ReferrerKind::Search),
            ("https://www.youtube.com/watch?v=1", ReferrerKind::SocialVideo),
            ("https://m.facebook.com/", ReferrerKind::SocialGeneric),
            ("https://www.linkedin.com/feed", ReferrerKind::SocialProfessional),
            ("https://x.com/someone", ReferrerKind::SocialGeneric),
            ("https://blog.example.org/review", ReferrerKind::ReferralOther),
        ];
        for (referrer, expected) in cases {
            assert_eq!(classify_referrer(Some(referrer)), expected, "{referrer}");
        }
        assert_eq!(classify_referrer(None), ReferrerKind::Direct);
        assert_eq!(classify_referrer(Some("  ")), ReferrerKind::Direct);
    }

    #[test]
    fn test_device_breakpoints() {
        let at = |width| detect_device(&Viewport { width, height: 800 });
        assert_eq!(at(390), DeviceClass::Mobile);
        assert_eq!(at(767), DeviceClass::Mobile);
        assert_eq!(at(768), DeviceClass::Tablet);
        assert_eq!(at(1023), DeviceClass::Tablet);
        assert_eq!(at(1024), DeviceClass::Desktop);
    }
}
