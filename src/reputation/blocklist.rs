//! DNSBL hostname templates.
//!
//! A blocklist is addressed by a hostname template. Placeholders:
//!
//! | Placeholder | Example for client `1.2.3.4`, server `5.6.7.8:443` |
//! |---|---|
//! | `{client_ip}` | `1.2.3.4` |
//! | `{reversed_client_ip}` | `4.3.2.1` |
//! | `{server_port}` | `443` |
//! | `{reversed_server_ip}` | `8.7.6.5` |

use std::fmt;
use std::net::Ipv4Addr;
use std::sync::Arc;

/// Tor exit-node list, keyed by client, server port and server address.
pub const TOR_EXIT_BLOCKLIST: &str =
    "{reversed_client_ip}.{server_port}.{reversed_server_ip}.ip-port.exitlist.torproject.org";

/// Open-proxy list, keyed by the client address as written.
pub const OPEN_PROXY_BLOCKLIST: &str = "{client_ip}.dnsbl.proxybl.org";

#[derive(Clone, Debug, PartialEq, Eq)]
enum Part {
    Literal(String),
    ClientIp,
    ReversedClientIp,
    ServerPort,
    ReversedServerIp,
}

/// A parsed hostname template.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Blocklist {
    template: Arc<str>,
    parts: Arc<[Part]>,
}

impl Blocklist {
    /// Parses a template known to be valid.
    ///
    /// # Panics
    ///
    /// Panics if the template has an unknown placeholder or an unbalanced brace.
    pub fn new(template: &str) -> Self {
        Self::parse(template).unwrap_or_else(|| panic!("invalid blocklist template `{template}`"))
    }

    /// Returns `None` on an unknown placeholder or an unbalanced brace.
    pub fn parse(template: &str) -> Option<Self> {
        let mut parts = Vec::new();
        let mut rest = template;
        while !rest.is_empty() {
            match rest.find(['{', '}']) {
                None => {
                    parts.push(Part::Literal(rest.to_owned()));
                    break;
                }
                Some(i) if rest[i..].starts_with('}') => return None,
                Some(i) => {
                    if i > 0 {
                        parts.push(Part::Literal(rest[..i].to_owned()));
                    }
                    let end = rest[i..].find('}')? + i;
                    parts.push(match &rest[i + 1..end] {
                        "client_ip" => Part::ClientIp,
                        "reversed_client_ip" => Part::ReversedClientIp,
                        "server_port" => Part::ServerPort,
                        "reversed_server_ip" => Part::ReversedServerIp,
                        _ => return None,
                    });
                    rest = &rest[end + 1..];
                }
            }
        }
        Some(Self { template: Arc::from(template), parts: parts.into() })
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// `true` if probes need the server's own address.
    pub fn needs_server_ip(&self) -> bool {
        self.parts.contains(&Part::ReversedServerIp)
    }

    /// Builds the probe hostname. `None` if the template needs a server
    /// address and none is given.
    pub fn probe(&self, client: Ipv4Addr, server_port: u16, server_ip: Option<Ipv4Addr>) -> Option<String> {
        let mut host = String::with_capacity(self.template.len() + 16);
        for part in self.parts.iter() {
            match part {
                Part::Literal(s) => host.push_str(s),
                Part::ClientIp => host.push_str(&client.to_string()),
                Part::ReversedClientIp => host.push_str(&reverse_ipv4(client)),
                Part::ServerPort => host.push_str(&server_port.to_string()),
                Part::ReversedServerIp => host.push_str(&reverse_ipv4(server_ip?)),
            }
        }
        Some(host)
    }
}

impl fmt::Display for Blocklist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}

/// `1.2.3.4` → `4.3.2.1`
pub fn reverse_ipv4(ip: Ipv4Addr) -> String {
    let [a, b, c, d] = ip.octets();
    format!("{d}.{c}.{b}.{a}")
}
