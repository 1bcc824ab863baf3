//! The allow-list of hosts whose certificate errors may be overridden.

use crate::events::TrustDecision;
use once_cell::sync::OnceCell;
use std::net::Ipv6Addr;
use url::{Host, ParseError, Url};

include!(concat!(env!("OUT_DIR"), "/allow_list.rs"));

static COMPILED: OnceCell<TrustPolicy> = OnceCell::new();

/// How a URL is compared against allow-list entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HostMatch {
    /// The entry may appear anywhere in the raw URL text.
    ///
    /// This accepts `https://cliente.solucnet.com.attacker.net/` for the entry
    /// `cliente.solucnet.com`, and is only here to reproduce older web view clients.
    Substring,
    /// The URL's host must equal an entry.
    #[default]
    Exact,
    /// The URL's host must equal an entry or be a subdomain of it.
    ///
    /// IP addresses must still equal an entry.
    DomainSuffix,
}

/// Errors building a [`TrustPolicy`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    /// An entry was empty or only whitespace.
    #[error("allow-list entries cannot be empty")]
    EmptyEntry,
    /// An entry contained a scheme, port, path, or whitespace.
    #[error("allow-list entry {0:?} is not a bare host name")]
    NotAHost(String),
}

/// Decides which certificate failures are overridden.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustPolicy {
    allowed_hosts: Vec<String>,
    matching: HostMatch,
}

impl TrustPolicy {
    /// Creates a policy for `hosts` compared with `matching`.
    pub fn new<I, S>(hosts: I, matching: HostMatch) -> Result<Self, PolicyError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed_hosts = hosts
            .into_iter()
            .map(|host| normalize_entry(host.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            allowed_hosts,
            matching,
        })
    }

    /// Returns a builder for a policy that starts out trusting nothing.
    pub fn builder() -> TrustPolicyBuilder {
        TrustPolicyBuilder::default()
    }

    /// The policy for the hosts compiled into this build, using [`HostMatch::Exact`].
    pub fn compiled() -> &'static TrustPolicy {
        COMPILED.get_or_init(|| {
            let allowed_hosts = COMPILED_ALLOW_LIST
                .iter()
                .filter_map(|host| match normalize_entry(host) {
                    Ok(host) => Some(host),
                    Err(e) => {
                        log::error!("ignoring compiled allow-list entry: {}", e);
                        None
                    }
                })
                .collect();

            TrustPolicy {
                allowed_hosts,
                matching: HostMatch::default(),
            }
        })
    }

    /// The normalized allow-list entries.
    pub fn allowed_hosts(&self) -> &[String] {
        &self.allowed_hosts
    }

    /// How URLs are compared against the allow-list.
    pub fn matching(&self) -> HostMatch {
        self.matching
    }

    /// Decides the fate of a certificate failure for `url`.
    ///
    /// A missing or empty URL is always rejected.
    pub fn decide(&self, url: Option<&str>) -> TrustDecision {
        match url {
            Some(url) if !url.is_empty() && self.is_trusted(url) => TrustDecision::Resume,
            _ => TrustDecision::Reject,
        }
    }

    /// Returns `true` if certificate failures for `url` may be overridden.
    pub fn is_trusted(&self, url: &str) -> bool {
        if self.matching == HostMatch::Substring {
            return self
                .allowed_hosts
                .iter()
                .any(|allowed| url.contains(allowed.as_str()));
        }

        let host = match host_of(url) {
            Some(host) => host,
            None => return false,
        };

        self.allowed_hosts.iter().any(|allowed| match self.matching {
            // IP literals have no parent domains.
            HostMatch::DomainSuffix if host.is_domain => {
                host.name == *allowed
                    || host
                        .name
                        .strip_suffix(allowed.as_str())
                        .map_or(false, |prefix| prefix.ends_with('.'))
            }
            _ => host.name == *allowed,
        })
    }
}

/// Builds a [`TrustPolicy`] one entry at a time.
#[derive(Debug, Default)]
pub struct TrustPolicyBuilder {
    hosts: Vec<String>,
    matching: HostMatch,
}

impl TrustPolicyBuilder {
    /// Adds a host to the allow-list.
    pub fn allow_host(mut self, host: impl Into<String>) -> Self {
        self.hosts.push(host.into());
        self
    }

    /// Sets how URLs are compared against the allow-list.
    pub fn matching(mut self, matching: HostMatch) -> Self {
        self.matching = matching;
        self
    }

    /// Validates the entries and builds the policy.
    pub fn build(self) -> Result<TrustPolicy, PolicyError> {
        TrustPolicy::new(self.hosts, self.matching)
    }
}

fn normalize_entry(entry: &str) -> Result<String, PolicyError> {
    let entry = entry.trim();
    if entry.is_empty() {
        return Err(PolicyError::EmptyEntry);
    }

    if entry.contains("://") || entry.contains('/') || entry.contains(char::is_whitespace) {
        return Err(PolicyError::NotAHost(entry.to_owned()));
    }

    // IPv6 entries are compared in the bracketed form URLs carry them in.
    let unbracketed = entry
        .strip_prefix('[')
        .and_then(|entry| entry.strip_suffix(']'))
        .unwrap_or(entry);
    if let Ok(ip) = unbracketed.parse::<Ipv6Addr>() {
        return Ok(format!("[{ip}]"));
    }

    if entry.contains([':', '[', ']', '@']) {
        return Err(PolicyError::NotAHost(entry.to_owned()));
    }

    let entry = entry.trim_end_matches('.').to_ascii_lowercase();
    if entry.is_empty() {
        return Err(PolicyError::NotAHost(entry));
    }

    Ok(entry)
}

/// The host part of a URL.
struct UrlHost {
    /// Lowercase, without any trailing dot. IPv6 addresses keep their brackets.
    name: String,
    is_domain: bool,
}

/// Extracts the host of `url`.
///
/// Bare authorities such as `cliente.solucnet.com:3000` are read as HTTPS URLs. Any
/// other URL without a host, such as `mailto:` or `data:`, has none.
fn host_of(url: &str) -> Option<UrlHost> {
    let parsed = match Url::parse(url) {
        Ok(parsed) if parsed.host().is_some() => parsed,
        // `cliente.solucnet.com:3000` parses with the host name as its scheme.
        Ok(parsed) if parsed.scheme().contains('.') && is_bare_authority(url) => {
            Url::parse(&format!("https://{url}")).ok()?
        }
        Err(ParseError::RelativeUrlWithoutBase) if is_bare_authority(url) => {
            Url::parse(&format!("https://{url}")).ok()?
        }
        _ => return None,
    };

    let is_domain = matches!(parsed.host(), Some(Host::Domain(_)));
    let name = parsed.host_str()?.trim_end_matches('.').to_ascii_lowercase();
    (!name.is_empty()).then_some(UrlHost { name, is_domain })
}

// Text carrying userinfo is never retried as an authority.
fn is_bare_authority(url: &str) -> bool {
    !url.contains("://") && !url.contains('@')
}
