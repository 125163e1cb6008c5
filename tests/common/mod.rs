#![allow(dead_code)]

use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use warden::reputation::{
    Blocklist, LookupError, OPEN_PROXY_BLOCKLIST, Resolve, ReputationChecker, TOR_EXIT_BLOCKLIST,
};
use warden::{BoxFuture, Method, Request};

pub const CLIENT: &str = "1.2.3.4:51000";
pub const HOST: &str = "5.6.7.8:443";
pub const TOR_PROBE: &str = "4.3.2.1.443.8.7.6.5.ip-port.exitlist.torproject.org.";
pub const PROXY_PROBE: &str = "1.2.3.4.dnsbl.proxybl.org.";

pub enum Answer {
    Addrs(Vec<Ipv4Addr>),
    Fail(LookupError),
    Hang,
}

/// In-memory resolver. Unknown names are NXDOMAIN; every query is recorded.
#[derive(Default)]
pub struct FakeDns {
    answers: HashMap<String, Answer>,
    pub queries: Arc<Mutex<Vec<String>>>,
}

impl FakeDns {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listed(self, host: &str) -> Self {
        self.answer(host, Answer::Addrs(vec![Ipv4Addr::new(127, 0, 0, 2)]))
    }

    pub fn answer(mut self, host: &str, answer: Answer) -> Self {
        self.answers.insert(host.to_owned(), answer);
        self
    }

    pub fn checker(self, timeout: Duration) -> (ReputationChecker, Arc<Mutex<Vec<String>>>) {
        let queries = Arc::clone(&self.queries);
        let checker = ReputationChecker::new(
            self,
            Blocklist::new(TOR_EXIT_BLOCKLIST),
            Blocklist::new(OPEN_PROXY_BLOCKLIST),
            timeout,
        );
        (checker, queries)
    }
}

impl Resolve for FakeDns {
    fn lookup_ipv4<'a>(&'a self, host: &'a str) -> BoxFuture<'a, Result<Vec<Ipv4Addr>, LookupError>> {
        self.queries.lock().unwrap().push(host.to_owned());
        Box::pin(async move {
            match self.answers.get(host) {
                Some(Answer::Addrs(addrs)) => Ok(addrs.clone()),
                Some(Answer::Fail(e)) => Err(e.clone()),
                Some(Answer::Hang) => std::future::pending().await,
                None => Err(LookupError::NotFound),
            }
        })
    }
}

pub fn request(method: Method, uri: &str) -> Request {
    Request::builder(method, uri)
        .remote_addr(CLIENT.parse().unwrap())
        .local_addr(HOST.parse().unwrap())
        .build()
}
