use std::env;

use url::Url;

use crate::{BACKEND_URL_ENV, DEFAULT_BACKEND_CANDIDATES};

/// Ordered backend candidate list for this process, built exactly once at
/// startup. An explicit override collapses the list to that single URL.
pub(crate) fn startup_candidates() -> Vec<String> {
    candidates_from_override(env::var(BACKEND_URL_ENV).ok().as_deref())
}

pub(crate) fn candidates_from_override(override_url: Option<&str>) -> Vec<String> {
    if let Some(raw) = override_url {
        if let Some(normalized) = normalize_candidate_url(raw) {
            return vec![normalized];
        }
        crate::append_startup_log(&format!(
            "ignoring invalid {BACKEND_URL_ENV} override '{}'",
            raw.trim()
        ));
    }

    DEFAULT_BACKEND_CANDIDATES
        .iter()
        .map(|candidate| (*candidate).to_string())
        .collect()
}

pub(crate) fn normalize_candidate_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut parsed = Url::parse(trimmed).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    if parsed.host_str().is_none() {
        return None;
    }
    if parsed.path().is_empty() {
        parsed.set_path("/");
    }
    Some(parsed.to_string())
}
