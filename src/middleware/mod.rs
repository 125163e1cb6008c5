//! Middleware layer.
//!
//! Middleware intercepts requests and responses and is the right place for
//! cross-cutting concerns. A middleware receives the request and a [`Next`]
//! handle to the rest of the chain; it may answer on its own or call
//! [`Next::run`] and post-process the result.
//!
//! ```rust,no_run
//! use warden::middleware::{Middleware, Next};
//! use warden::{BoxFuture, Request, Response};
//!
//! struct PoweredBy;
//!
//! impl Middleware for PoweredBy {
//!     fn handle<'a>(&'a self, req: Request, next: Next<'a>) -> BoxFuture<'a, Response> {
//!         Box::pin(async move {
//!             let mut res = next.run(req).await;
//!             res.set_header("x-powered-by", "warden");
//!             res
//!         })
//!     }
//! }
//! ```
//!
//! Built-in middleware:
//! - [`Trace`] — per-request span with method, path, status, latency
//! - [`SuspiciousIp`] — rejects submissions from Tor exits and open proxies

mod suspicious_ip;
mod trace;

pub use suspicious_ip::{REJECTION_PAGE, SuspiciousIp};
pub use trace::Trace;

use std::sync::Arc;

use crate::handler::{BoxFuture, BoxedHandler, ErasedHandler};
use crate::request::Request;
use crate::response::Response;

/// A request interceptor. Register with [`Router::layer`](crate::Router::layer).
pub trait Middleware: Send + Sync + 'static {
    fn handle<'a>(&'a self, req: Request, next: Next<'a>) -> BoxFuture<'a, Response>;
}

/// The remainder of the middleware chain, ending in the route handler.
pub struct Next<'a> {
    layers: &'a [Arc<dyn Middleware>],
    endpoint: &'a BoxedHandler,
}

impl<'a> Next<'a> {
    pub(crate) fn new(layers: &'a [Arc<dyn Middleware>], endpoint: &'a BoxedHandler) -> Self {
        Self { layers, endpoint }
    }

    /// Passes `req` to the next layer, or to the handler after the last one.
    pub fn run(self, req: Request) -> BoxFuture<'a, Response> {
        match self.layers.split_first() {
            Some((layer, rest)) => layer.handle(req, Next { layers: rest, endpoint: self.endpoint }),
            None => self.endpoint.call(req),
        }
    }
}
