//! IP reputation checks against DNS blocklists.
//!
//! Two categories are checked: Tor exit nodes and open proxies. Each is a
//! single DNS query against a blocklist zone:
//!
//! - resolves to `127.0.0.2` → [`Verdict::Suspicious`]
//! - NXDOMAIN → [`Verdict::Clean`]
//! - anything else (timeout, resolver fault, other address) → [`Verdict::Unknown`]
//!
//! Nothing here returns an error. A failed lookup is final for that category
//! on that request; there are no retries.
//!
//! [`ReputationChecker`] is process-wide and immutable. [`Reputation`] is
//! created per request by the [`SuspiciousIp`](crate::middleware::SuspiciousIp)
//! middleware and memoizes each category the first time it is asked for.

mod blocklist;
mod resolver;

pub use blocklist::{Blocklist, OPEN_PROXY_BLOCKLIST, TOR_EXIT_BLOCKLIST, reverse_ipv4};
pub use resolver::{DnsResolver, LookupError, Resolve};

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::config::Config;
use crate::request::Request;

/// The answer a blocklist gives for a listed address.
pub const LISTED: Ipv4Addr = Ipv4Addr::new(127, 0, 0, 2);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    TorExit,
    OpenProxy,
}

/// Outcome of one category check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Clean,
    Suspicious,
    /// The lookup could not be completed. Never blocks.
    Unknown,
}

impl Verdict {
    pub fn is_suspicious(self) -> bool {
        self == Self::Suspicious
    }
}

/// The request properties a probe is built from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProbeTarget {
    pub client_ip: IpAddr,
    pub server_name: String,
    pub server_port: u16,
}

impl ProbeTarget {
    pub fn from_request(req: &Request) -> Self {
        Self {
            client_ip: req.client_ip(),
            server_name: req.server_name(),
            server_port: req.server_port(),
        }
    }
}

/// Runs blocklist lookups. Shared by every request.
pub struct ReputationChecker {
    resolver: Arc<dyn Resolve>,
    tor: Blocklist,
    proxy: Blocklist,
    timeout: Duration,
}

impl ReputationChecker {
    pub fn new(resolver: impl Resolve, tor: Blocklist, proxy: Blocklist, timeout: Duration) -> Self {
        Self { resolver: Arc::new(resolver), tor, proxy, timeout }
    }

    /// A checker on the system DNS resolver with the configured blocklists.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            DnsResolver::from_system_conf(config.dnsbl_timeout),
            config.tor_blocklist.clone(),
            config.proxy_blocklist.clone(),
            config.dnsbl_timeout,
        )
    }

    fn blocklist(&self, category: Category) -> &Blocklist {
        match category {
            Category::TorExit => &self.tor,
            Category::OpenProxy => &self.proxy,
        }
    }

    /// Looks `target` up in the blocklist for `category`. Always queries;
    /// memoization is [`Reputation`]'s job.
    pub async fn check(&self, category: Category, target: &ProbeTarget) -> Verdict {
        let IpAddr::V4(client) = target.client_ip else {
            debug!(client = %target.client_ip, ?category, "blocklists are IPv4 only, skipping");
            return Verdict::Unknown;
        };
        let blocklist = self.blocklist(category);

        let server_ip = if blocklist.needs_server_ip() {
            match self.server_ip(&target.server_name).await {
                Some(ip) => Some(ip),
                None => {
                    debug!(server = %target.server_name, ?category, "server name did not resolve, skipping");
                    return Verdict::Unknown;
                }
            }
        } else {
            None
        };

        let Some(mut probe) = blocklist.probe(client, target.server_port, server_ip) else {
            return Verdict::Unknown;
        };
        // Absolute name, so resolv.conf search domains are never appended.
        if !probe.ends_with('.') {
            probe.push('.');
        }

        let verdict = match self.lookup(&probe).await {
            Ok(addrs) if addrs.contains(&LISTED) => Verdict::Suspicious,
            Ok(addrs) => {
                debug!(%probe, ?addrs, "unexpected blocklist answer");
                Verdict::Unknown
            }
            Err(LookupError::NotFound) => Verdict::Clean,
            Err(e) => {
                warn!(%probe, "blocklist lookup failed: {e}");
                Verdict::Unknown
            }
        };
        debug!(client = %client, ?category, ?verdict, "blocklist checked");
        verdict
    }

    async fn server_ip(&self, server_name: &str) -> Option<Ipv4Addr> {
        match server_name.parse::<IpAddr>() {
            Ok(IpAddr::V4(ip)) => return Some(ip),
            Ok(IpAddr::V6(_)) => return None,
            Err(_) => {}
        }
        self.lookup(server_name).await.ok()?.into_iter().next()
    }

    async fn lookup(&self, host: &str) -> Result<Vec<Ipv4Addr>, LookupError> {
        tokio::time::timeout(self.timeout, self.resolver.lookup_ipv4(host))
            .await
            .unwrap_or(Err(LookupError::Timeout))
    }
}

/// Per-request reputation cache.
///
/// Cloning is cheap and clones share the cache. Each category is looked up
/// at most once, on first access; concurrent first accesses wait for the
/// same lookup.
#[derive(Clone)]
pub struct Reputation {
    inner: Arc<Inner>,
}

struct Inner {
    checker: Arc<ReputationChecker>,
    target: ProbeTarget,
    tor: OnceCell<Verdict>,
    proxy: OnceCell<Verdict>,
}

impl Reputation {
    pub fn new(checker: Arc<ReputationChecker>, target: ProbeTarget) -> Self {
        Self {
            inner: Arc::new(Inner {
                checker,
                target,
                tor: OnceCell::new(),
                proxy: OnceCell::new(),
            }),
        }
    }

    fn cell(&self, category: Category) -> &OnceCell<Verdict> {
        match category {
            Category::TorExit => &self.inner.tor,
            Category::OpenProxy => &self.inner.proxy,
        }
    }

    pub fn target(&self) -> &ProbeTarget {
        &self.inner.target
    }

    pub async fn verdict(&self, category: Category) -> Verdict {
        *self
            .cell(category)
            .get_or_init(|| self.inner.checker.check(category, &self.inner.target))
            .await
    }

    /// The memoized verdict, without triggering a lookup.
    pub fn cached(&self, category: Category) -> Option<Verdict> {
        self.cell(category).get().copied()
    }

    pub async fn is_tor_exit_node(&self) -> bool {
        self.verdict(Category::TorExit).await.is_suspicious()
    }

    pub async fn is_open_proxy(&self) -> bool {
        self.verdict(Category::OpenProxy).await.is_suspicious()
    }

    /// Tor first; the proxy list is not queried once Tor matches.
    pub async fn is_suspicious(&self) -> bool {
        self.is_tor_exit_node().await || self.is_open_proxy().await
    }
}
