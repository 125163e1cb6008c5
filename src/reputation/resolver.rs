//! Name resolution seam.
//!
//! [`Resolve`] is the only thing the checker needs from DNS. [`DnsResolver`]
//! is the production implementation on top of hickory; tests script their
//! own.

use std::net::Ipv4Addr;
use std::time::Duration;

use hickory_resolver::TokioResolver;
use hickory_resolver::config::ResolverConfig;
use hickory_resolver::name_server::TokioConnectionProvider;
use thiserror::Error;
use tracing::warn;

use crate::handler::BoxFuture;

/// Why a lookup produced no address.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LookupError {
    /// The name does not exist (NXDOMAIN) or has no A record.
    #[error("name not found")]
    NotFound,

    #[error("lookup timed out")]
    Timeout,

    #[error("lookup failed: {0}")]
    Failed(String),
}

/// IPv4 address lookup.
pub trait Resolve: Send + Sync + 'static {
    fn lookup_ipv4<'a>(&'a self, host: &'a str) -> BoxFuture<'a, Result<Vec<Ipv4Addr>, LookupError>>;
}

/// Async DNS resolver built from the system configuration.
#[derive(Clone)]
pub struct DnsResolver {
    inner: TokioResolver,
}

impl DnsResolver {
    /// Uses `/etc/resolv.conf` when readable, else hickory's default
    /// upstreams. Each query is tried once with `timeout`.
    pub fn from_system_conf(timeout: Duration) -> Self {
        let mut builder = TokioResolver::builder_tokio().unwrap_or_else(|e| {
            warn!("system resolver config unavailable, using defaults: {e}");
            TokioResolver::builder_with_config(
                ResolverConfig::default(),
                TokioConnectionProvider::default(),
            )
        });
        let opts = builder.options_mut();
        opts.timeout = timeout;
        opts.attempts = 1;
        Self { inner: builder.build() }
    }
}

impl Resolve for DnsResolver {
    fn lookup_ipv4<'a>(&'a self, host: &'a str) -> BoxFuture<'a, Result<Vec<Ipv4Addr>, LookupError>> {
        Box::pin(async move {
            match self.inner.ipv4_lookup(host).await {
                Ok(lookup) => Ok(lookup.iter().map(|a| a.0).collect()),
                Err(e) if e.is_nx_domain() || e.is_no_records_found() => Err(LookupError::NotFound),
                Err(e) => Err(LookupError::Failed(e.to_string())),
            }
        })
    }
}
