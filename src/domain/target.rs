//! Input normalization and validation for submitted domains
//!
//! Visitors type whatever they like into the analysis box: a bare domain,
//! a full URL, something with stray whitespace. This module turns that raw
//! input into a [`NormalizedTarget`] and decides whether it is worth sending
//! to the analysis service at all.

use nutype::nutype;
use serde::{Deserialize, Serialize};
use url::{Host, Url};

const HTTP_PREFIX: &str = "http://";
const HTTPS_PREFIX: &str = "https://";

/// Bare domain name accepted by the analysis service
///
/// One or more `label.` groups where a label is `[a-z0-9]+(-[a-z0-9]+)*`,
/// followed by an alphabetic top-level label of at least two characters.
/// Matching is case-insensitive and anchored at both ends.
#[nutype(
    validate(regex = r"(?i)^([a-z0-9]+(-[a-z0-9]+)*\.)+[a-z]{2,}$"),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        Hash,
        Serialize,
        Deserialize,
        AsRef,
        Display
    )
)]
pub struct DomainName(String);

impl DomainName {
    /// Returns true when `candidate` matches the domain grammar exactly.
    pub fn matches_grammar(candidate: &str) -> bool {
        Self::try_new(candidate.to_string()).is_ok()
    }
}

/// A submission after normalization: always a URL string with a scheme
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedTarget {
    href: String,
}

impl NormalizedTarget {
    /// The full URL, scheme included.
    pub fn url(&self) -> &str {
        &self.href
    }

    /// The canonical domain for this target: lowercase host, no scheme.
    ///
    /// `None` when the target is a best-effort fallback that never parsed.
    pub fn domain(&self) -> Option<String> {
        let url = Url::parse(&self.href).ok()?;
        url.host_str().map(str::to_lowercase)
    }
}

/// Turn free-text input into a [`NormalizedTarget`].
///
/// Input that already carries an `http://` or `https://` scheme is returned
/// as-is after trimming. Anything else gets `https://` prepended and is run
/// through the URL parser; if parsing fails the prefixed string is kept
/// verbatim and left for validation to reject.
pub fn normalize(raw: &str) -> NormalizedTarget {
    let trimmed = raw.trim();
    if has_web_scheme(trimmed) {
        return NormalizedTarget {
            href: trimmed.to_string(),
        };
    }

    let candidate = format!("{HTTPS_PREFIX}{trimmed}");
    let href = match Url::parse(&candidate) {
        Ok(url) => url.into(),
        Err(_) => candidate,
    };

    NormalizedTarget { href }
}

/// Decide whether raw input names something we can analyze.
///
/// Empty input and input containing whitespace are rejected outright. When
/// the normalized form parses as a URL it must use `http` or `https` and its
/// host must be either an IP literal typed by the visitor or a name that
/// matches the domain grammar. When it does not parse, the trimmed input is
/// checked against the grammar directly.
pub fn is_valid_target(raw: &str) -> bool {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
        return false;
    }

    let target = normalize(trimmed);
    match Url::parse(target.url()) {
        Ok(url) => {
            matches!(url.scheme(), "http" | "https")
                && url
                    .host()
                    .is_some_and(|host| is_acceptable_host(&host, &url, trimmed))
        }
        Err(_) => DomainName::matches_grammar(trimmed),
    }
}

fn has_web_scheme(input: &str) -> bool {
    input.starts_with(HTTP_PREFIX) || input.starts_with(HTTPS_PREFIX)
}

fn is_acceptable_host(host: &Host<&str>, url: &Url, typed: &str) -> bool {
    match host {
        Host::Domain(name) => DomainName::matches_grammar(name),
        // The URL parser reads bare numbers such as "123" as IPv4; only a
        // dotted quad the visitor actually typed counts.
        Host::Ipv4(_) => url
            .host_str()
            .is_some_and(|canonical| typed.contains(canonical)),
        Host::Ipv6(_) => true,
    }
}
