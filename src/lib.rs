//! # warden
//!
//! A minimal HTTP framework for sites behind a reverse proxy, with the
//! request-cycle helpers a public site needs on top of routing.
//!
//! ## What's in the box
//!
//! - Radix-tree routing — O(path-length) lookup via [`matchit`]
//! - A middleware chain — [`Router::layer`], [`middleware::Middleware`]
//! - IP reputation — [`middleware::SuspiciousIp`] rejects submissions from
//!   Tor exit nodes and open proxies using DNS blocklists ([`reputation`])
//! - Link building — rewrite the current query string with
//!   [`query::modify_query`], [`query::add_to_query`] and
//!   [`query::remove_from_query`]
//! - Display helpers — [`filters`]
//! - Graceful shutdown — SIGTERM / Ctrl-C, drains in-flight requests
//!
//! Per-request state is never ambient: the [`Request`] is passed explicitly
//! to every layer and handler, and anything computed for it (such as the
//! [`reputation::Reputation`] verdicts) lives in its extensions.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use warden::middleware::{SuspiciousIp, Trace};
//! use warden::query::{QueryRewrite, modify_query};
//! use warden::reputation::ReputationChecker;
//! use warden::{Config, Request, Response, Router, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), warden::Error> {
//!     let config = Config::from_env()?;
//!
//!     let app = Router::new()
//!         .layer(Trace)
//!         .layer(SuspiciousIp::new(ReputationChecker::from_config(&config)))
//!         .get("/articles", list_articles)
//!         .post("/comments", post_comment);
//!
//!     Server::from_config(&config).serve(app).await
//! }
//!
//! async fn list_articles(req: Request) -> Response {
//!     let next = modify_query(&req, &QueryRewrite::new().set("page", 2));
//!     Response::html(format!(r#"<a href="{next}">next</a>"#))
//! }
//!
//! async fn post_comment(_req: Request) -> Response {
//!     Response::text("thanks")
//! }
//! ```

mod error;
mod handler;
mod method;
mod request;
mod response;
mod router;
mod server;

pub mod config;
pub mod filters;
pub mod middleware;
pub mod query;
pub mod reputation;

pub use config::Config;
pub use error::Error;
pub use handler::{BoxFuture, Handler};
pub use method::Method;
pub use request::{Request, RequestBuilder};
pub use response::{ContentType, IntoResponse, Response, ResponseBuilder};
pub use router::Router;
pub use server::Server;
