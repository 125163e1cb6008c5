//! HTTP server and graceful shutdown.
//!
//! On SIGTERM or Ctrl-C the server:
//! 1. Immediately stops `listener.accept()` — no new connections are made.
//! 2. Lets every in-flight connection task run to completion.
//! 3. Returns from [`Server::serve`], which lets `main` exit cleanly.

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::error::Error;
use crate::method::Method;
use crate::query::QueryParams;
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
    server_name: Option<Arc<str>>,
    server_port: Option<u16>,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    pub fn bind(addr: SocketAddr) -> Self {
        Self { addr, server_name: None, server_port: None }
    }

    /// Bind address, server name and server port from `config`.
    pub fn from_config(config: &Config) -> Self {
        let mut server = Self::bind(config.bind);
        if let Some(name) = &config.server_name {
            server = server.server_name(name);
        }
        if let Some(port) = config.server_port {
            server = server.server_port(port);
        }
        server
    }

    /// The name requests report from [`Request::server_name`], instead of
    /// the connection's local address.
    pub fn server_name(mut self, name: &str) -> Self {
        self.server_name = Some(Arc::from(name));
        self
    }

    /// The port requests report from [`Request::server_port`], instead of
    /// the connection's local port. Useful behind port forwarding.
    pub fn server_port(mut self, port: u16) -> Self {
        self.server_port = Some(port);
        self
    }

    /// Starts accepting connections and dispatching them through `router`.
    ///
    /// Returns only after a full graceful shutdown (SIGTERM or Ctrl-C,
    /// followed by all in-flight requests completing).
    pub async fn serve(self, router: Router) -> Result<(), Error> {
        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;

        let router = Arc::new(router);
        let server_name = self.server_name;
        let server_port = self.server_port;

        info!(addr = %local_addr, "warden listening");

        let mut tasks = tokio::task::JoinSet::new();

        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // Check shutdown first so a SIGTERM stops accepting at once,
                // even if more connections are queued.
                biased;

                () = &mut shutdown => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    // The accepted socket knows the concrete address even when
                    // the listener is bound to a wildcard.
                    let local_addr = stream.local_addr().unwrap_or(local_addr);
                    let router = Arc::clone(&router);
                    let server_name = server_name.clone();
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        let conn = Conn { remote_addr, local_addr, server_name, server_port };
                        let svc = service_fn(move |req| {
                            let router = Arc::clone(&router);
                            let conn = conn.clone();
                            async move { Ok::<_, std::convert::Infallible>(dispatch(&router, req, conn).await) }
                        });

                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished connection tasks so the JoinSet stays small.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        while tasks.join_next().await.is_some() {}

        info!("warden stopped");
        Ok(())
    }
}

/// Per-connection facts copied into every request on it.
#[derive(Clone)]
struct Conn {
    remote_addr: SocketAddr,
    local_addr: SocketAddr,
    server_name: Option<Arc<str>>,
    server_port: Option<u16>,
}

/// Routes one request and produces one response. Every failure becomes a
/// status code, so hyper never sees an error.
async fn dispatch(
    router: &Router,
    req: hyper::Request<Incoming>,
    conn: Conn,
) -> http::Response<Full<Bytes>> {
    let Ok(method) = Method::try_from(req.method()) else {
        return Response::status(StatusCode::METHOD_NOT_ALLOWED).into_inner();
    };

    let (parts, body) = req.into_parts();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            debug!(peer = %conn.remote_addr, "failed to read request body: {e}");
            return Response::status(StatusCode::BAD_REQUEST).into_inner();
        }
    };

    let request = Request {
        method,
        path: parts.uri.path().to_owned(),
        query: parts.uri.query().map(QueryParams::parse).unwrap_or_default(),
        headers: parts.headers,
        body,
        params: Default::default(),
        remote_addr: conn.remote_addr,
        local_addr: conn.local_addr,
        server_name: conn.server_name,
        server_port: conn.server_port,
        extensions: parts.extensions,
    };

    router
        .handle(request)
        .await
        .unwrap_or_else(|| Response::status(StatusCode::NOT_FOUND))
        .into_inner()
}

/// Resolves on the first shutdown signal the process receives.
///
/// SIGTERM and SIGINT on Unix; only Ctrl-C elsewhere.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let sigterm = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}
