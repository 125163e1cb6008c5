//! Incoming HTTP request type.
//!
//! A [`Request`] is passed by value through middleware into the handler.
//! Anything scoped to one request (for example the reputation verdicts in
//! [`crate::reputation::Reputation`]) travels with it in
//! [`extensions`](Request::extensions) and is dropped with it.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use bytes::Bytes;
use http::{Extensions, HeaderMap, HeaderName, HeaderValue};

use crate::method::Method;
use crate::query::QueryParams;
use crate::reputation::Reputation;

/// An incoming HTTP request with its body fully read.
pub struct Request {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) query: QueryParams,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Bytes,
    pub(crate) params: HashMap<String, String>,
    pub(crate) remote_addr: SocketAddr,
    pub(crate) local_addr: SocketAddr,
    pub(crate) server_name: Option<Arc<str>>,
    pub(crate) server_port: Option<u16>,
    pub(crate) extensions: Extensions,
}

impl Request {
    /// Builder for requests that did not come off the wire, e.g. in tests.
    pub fn builder(method: Method, uri: &str) -> RequestBuilder {
        let (path, query) = match uri.split_once('?') {
            Some((p, q)) => (p, QueryParams::parse(q)),
            None => (uri, QueryParams::new()),
        };
        RequestBuilder {
            req: Request {
                method,
                path: path.to_owned(),
                query,
                headers: HeaderMap::new(),
                body: Bytes::new(),
                params: HashMap::new(),
                remote_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
                local_addr: SocketAddr::from(([127, 0, 0, 1], 80)),
                server_name: None,
                server_port: None,
                extensions: Extensions::new(),
            },
        }
    }

    pub fn method(&self) -> Method { self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn query(&self) -> &QueryParams { &self.query }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }
    pub fn extensions(&self) -> &Extensions { &self.extensions }
    pub fn extensions_mut(&mut self) -> &mut Extensions { &mut self.extensions }

    /// Case-insensitive header lookup. Non-UTF-8 values read as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/{id}`, `req.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// The peer address of the connection. IPv4-mapped IPv6 peers (as seen
    /// on a dual-stack listener) are reported as plain IPv4.
    pub fn client_ip(&self) -> IpAddr {
        self.remote_addr.ip().to_canonical()
    }

    /// The name this server answers as: the configured server name, else the
    /// local socket address. The client's `Host` header is never consulted.
    pub fn server_name(&self) -> String {
        match &self.server_name {
            Some(name) => name.to_string(),
            None => self.local_addr.ip().to_canonical().to_string(),
        }
    }

    /// The configured server port, else the local socket port.
    pub fn server_port(&self) -> u16 {
        self.server_port.unwrap_or_else(|| self.local_addr.port())
    }

    /// The per-request reputation cache, present once the
    /// [`SuspiciousIp`](crate::middleware::SuspiciousIp) middleware has run.
    pub fn reputation(&self) -> Option<&Reputation> {
        self.extensions.get::<Reputation>()
    }
}

/// Fluent builder for [`Request`]. Obtain via [`Request::builder()`].
pub struct RequestBuilder {
    req: Request,
}

impl RequestBuilder {
    /// Sets the connection's peer address.
    pub fn remote_addr(mut self, addr: SocketAddr) -> Self {
        self.req.remote_addr = addr;
        self
    }

    /// Sets the connection's local address.
    pub fn local_addr(mut self, addr: SocketAddr) -> Self {
        self.req.local_addr = addr;
        self
    }

    /// Overrides the name the server answers as.
    pub fn server_name(mut self, name: &str) -> Self {
        self.req.server_name = Some(Arc::from(name));
        self
    }

    /// Overrides the port the server answers on.
    pub fn server_port(mut self, port: u16) -> Self {
        self.req.server_port = Some(port);
        self
    }

    /// Panics if `name` or `value` is not a valid header.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        let name = HeaderName::try_from(name).unwrap_or_else(|e| panic!("invalid header name `{name}`: {e}"));
        let value = HeaderValue::try_from(value).unwrap_or_else(|e| panic!("invalid header value `{value}`: {e}"));
        self.req.headers.append(name, value);
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.req.body = body.into();
        self
    }

    pub fn build(self) -> Request {
        self.req
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_path_and_query() {
        let req = Request::builder(Method::Get, "/search?q=rust&page=2").build();
        assert_eq!(req.path(), "/search");
        assert_eq!(req.query().get("q"), Some("rust"));
        assert_eq!(req.query().get("page"), Some("2"));
    }

    #[test]
    fn server_address_ignores_host_header() {
        let req = Request::builder(Method::Get, "/")
            .header("Host", "example.org:8443")
            .local_addr("10.0.0.5:3000".parse().unwrap())
            .build();
        assert_eq!(req.server_name(), "10.0.0.5");
        assert_eq!(req.server_port(), 3000);

        let req = Request::builder(Method::Get, "/")
            .header("host", "[::1]:8080")
            .local_addr("[::ffff:10.0.0.5]:3000".parse().unwrap())
            .build();
        assert_eq!(req.server_name(), "10.0.0.5");
        assert_eq!(req.server_port(), 3000);
    }

    #[test]
    fn configured_server_name_and_port_win() {
        let req = Request::builder(Method::Get, "/")
            .header("host", "evil.example:25")
            .local_addr("10.0.0.5:3000".parse().unwrap())
            .server_name("example.org")
            .build();
        assert_eq!(req.server_name(), "example.org");
        assert_eq!(req.server_port(), 3000);

        let req = Request::builder(Method::Get, "/")
            .local_addr("10.0.0.5:3000".parse().unwrap())
            .server_port(443)
            .build();
        assert_eq!(req.server_name(), "10.0.0.5");
        assert_eq!(req.server_port(), 443);
    }

    #[test]
    fn client_ip_unmaps_ipv4_mapped_peers() {
        let req = Request::builder(Method::Get, "/")
            .remote_addr("[::ffff:1.2.3.4]:5000".parse().unwrap())
            .build();
        assert_eq!(req.client_ip(), IpAddr::from([1, 2, 3, 4]));

        let req = Request::builder(Method::Get, "/")
            .remote_addr("[2001:db8::1]:5000".parse().unwrap())
            .build();
        assert!(req.client_ip().is_ipv6());
    }
}
