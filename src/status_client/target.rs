use std::fmt;

use serde::{Deserialize, Serialize};

use super::helpers::{endpoint_url, DEFAULT_PORT, HEALTH_PATH, STATUS_PATH};

/// Address of the monitored host as the user typed it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SyncTarget(String);

impl SyncTarget {
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_string())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Base URL with scheme and port filled in.
    pub fn base_url(&self) -> String {
        normalize(&self.0)
    }

    pub fn status_url(&self) -> String {
        endpoint_url(&self.base_url(), STATUS_PATH)
    }

    pub fn health_url(&self) -> String {
        endpoint_url(&self.base_url(), HEALTH_PATH)
    }
}

impl fmt::Display for SyncTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fill in scheme and port for a bare host.
///
/// An explicit `scheme://` keeps its authority untouched. Bare hosts get
/// `http://` and, when no port is given, [`DEFAULT_PORT`].
pub fn normalize(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return String::new();
    }
    if has_scheme(trimmed) {
        return trimmed.to_string();
    }

    let (authority, rest) = match trimmed.find('/') {
        Some(idx) => trimmed.split_at(idx),
        None => (trimmed, ""),
    };
    if has_port(authority) {
        format!("http://{authority}{rest}")
    } else {
        format!("http://{authority}:{DEFAULT_PORT}{rest}")
    }
}

fn has_scheme(value: &str) -> bool {
    match value.split_once("://") {
        Some((scheme, _)) => {
            !scheme.is_empty()
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

fn has_port(authority: &str) -> bool {
    // Bracketed IPv6 literal: only a `]:port` suffix counts.
    let host_end = if authority.starts_with('[') {
        match authority.find(']') {
            Some(idx) => idx + 1,
            None => return false,
        }
    } else {
        0
    };
    match authority[host_end..].rsplit_once(':') {
        Some((_, port)) => !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()),
        None => false,
    }
}
