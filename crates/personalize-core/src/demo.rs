//! Demo/debug controls: force or clear the intent of the next run.
//!
//! Both are pure transformations of the page URL and are idempotent.

use url::Url;

use crate::domain::error::Result;

/// Placeholder origin for path-only URLs.
const PLACEHOLDER_ORIGIN: &str = "http://localhost/";

/// Set `intent=<INTENT>` (upper-cased), keeping other parameters.
pub fn force_intent(page_url: &str, intent: &str) -> Result<String> {
    let intent = intent.trim().to_uppercase();
    rewrite_query(page_url, |pairs| {
        pairs.retain(|(k, _)| k != "intent");
        pairs.push(("intent".to_string(), intent));
    })
}

/// Remove `intent` and `q`, keeping other parameters.
pub fn clear_forced_intent(page_url: &str) -> Result<String> {
    rewrite_query(page_url, |pairs| {
        pairs.retain(|(k, _)| k != "intent" && k != "q");
    })
}

fn rewrite_query(
    page_url: &str,
    edit: impl FnOnce(&mut Vec<(String, String)>),
) -> Result<String> {
    let (mut url, relative) = match Url::parse(page_url) {
        Ok(url) => (url, false),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            (Url::parse(PLACEHOLDER_ORIGIN)?.join(page_url)?, true)
        }
        Err(err) => return Err(err.into()),
    };

    let mut pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    edit(&mut pairs);

    if pairs.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(&pairs);
    }

    if relative {
        let mut out = url.path().to_string();
        if let Some(query) = url.query() {
            out.push('?');
            out.push_str(query);
        }
        if let Some(fragment) = url.fragment() {
            out.push('#');
            out.push_str(fragment);
        }
        Ok(out)
    } else {
        Ok(url.to_string())
    }
}
