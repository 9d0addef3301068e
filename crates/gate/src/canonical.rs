//! Canonical-host redirection for preview deployments.

/// Redirect rule from preview hosts to the canonical host.
#[derive(Debug, Clone)]
pub struct CanonicalHost {
    canonical_host: String,
    preview_suffix: String,
}

impl CanonicalHost {
    /// Both values are compared case-insensitively and stored lowercased.
    #[must_use]
    pub fn new(canonical_host: &str, preview_suffix: &str) -> Self {
        Self {
            canonical_host: canonical_host.to_ascii_lowercase(),
            preview_suffix: preview_suffix.to_ascii_lowercase(),
        }
    }

    #[must_use]
    pub fn canonical_host(&self) -> &str {
        &self.canonical_host
    }

    #[must_use]
    pub fn preview_suffix(&self) -> &str {
        &self.preview_suffix
    }

    /// Whether `host` (a `Host` header value, possibly with a port) is a preview deployment.
    #[must_use]
    pub fn is_preview_host(&self, host: &str) -> bool {
        let name = strip_port(host).trim_end_matches('.');
        if self.preview_suffix.is_empty() || name.is_empty() {
            return false;
        }
        name.to_ascii_lowercase().ends_with(&self.preview_suffix)
    }

    /// `Location` for a request to `host`, or `None` if no redirect applies.
    ///
    /// `path_and_query` is the request target as received (`/report.html?x=1`). Path and query
    /// are carried over byte-for-byte; `?` only appears when the query is non-empty.
    #[must_use]
    pub fn preview_redirect(&self, host: &str, path_and_query: &str) -> Option<String> {
        if !self.is_preview_host(host) {
            return None;
        }
        Some(self.location(path_and_query))
    }

    fn location(&self, path_and_query: &str) -> String {
        let (path, query) = match path_and_query.split_once('?') {
            Some((p, q)) => (p, q),
            None => (path_and_query, ""),
        };
        let path = if path.starts_with('/') { path } else { "/" };
        let host = &self.canonical_host;
        if query.is_empty() {
            format!("https://{host}{path}")
        } else {
            format!("https://{host}{path}?{query}")
        }
    }
}

/// Drop a trailing `:port` from a host value. IPv6 literals keep their brackets.
fn strip_port(host: &str) -> &str {
    if let Some(rest) = host.strip_prefix('[') {
        return match rest.find(']') {
            Some(end) => &host[..end + 2],
            None => host,
        };
    }
    match host.rsplit_once(':') {
        Some((name, port)) if port.chars().all(|c| c.is_ascii_digit()) => name,
        _ => host,
    }
}
