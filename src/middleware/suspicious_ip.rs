use std::sync::Arc;

use http::StatusCode;
use tracing::warn;

use super::{Middleware, Next};
use crate::handler::BoxFuture;
use crate::reputation::{ProbeTarget, Reputation, ReputationChecker};
use crate::request::Request;
use crate::response::Response;

/// Body of the `400` sent to rejected submissions.
pub const REJECTION_PAGE: &str = r#"<html><body><h1>Access denied</h1>
<p>This request appears to come from an open proxy or the Tor network.
Submissions from these networks are not accepted.</p>
<p>If you think this is wrong, <a href="https://check.torproject.org/">check
your connection</a> and try again without the relay.</p></body></html>"#;

/// Rejects state-changing requests from Tor exit nodes and open proxies.
///
/// Every request gets a [`Reputation`] in its extensions, so handlers can
/// ask `req.reputation()` themselves; lookups only happen when someone asks.
/// Safe methods (`GET`, `HEAD`, …) are never blocked and trigger no lookup
/// here.
#[derive(Clone)]
pub struct SuspiciousIp {
    checker: Arc<ReputationChecker>,
}

impl SuspiciousIp {
    pub fn new(checker: ReputationChecker) -> Self {
        Self { checker: Arc::new(checker) }
    }

    pub fn shared(checker: Arc<ReputationChecker>) -> Self {
        Self { checker }
    }
}

impl Middleware for SuspiciousIp {
    fn handle<'a>(&'a self, mut req: Request, next: Next<'a>) -> BoxFuture<'a, Response> {
        let reputation = Reputation::new(Arc::clone(&self.checker), ProbeTarget::from_request(&req));
        req.extensions_mut().insert(reputation.clone());

        Box::pin(async move {
            if req.method().is_state_changing() && reputation.is_suspicious().await {
                warn!(
                    client = %req.client_ip(),
                    method = %req.method(),
                    path = %req.path(),
                    "rejected submission from suspicious address"
                );
                return Response::builder()
                    .status(StatusCode::BAD_REQUEST)
                    .html(REJECTION_PAGE);
            }
            next.run(req).await
        })
    }
}
