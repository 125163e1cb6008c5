use std::time::Instant;

use tracing::{Instrument, info, info_span};

use super::{Middleware, Next};
use crate::handler::BoxFuture;
use crate::request::Request;
use crate::response::Response;

/// Opens one `request` span per request and logs status and latency when
/// the response is ready.
#[derive(Clone, Copy, Debug, Default)]
pub struct Trace;

impl Middleware for Trace {
    fn handle<'a>(&'a self, req: Request, next: Next<'a>) -> BoxFuture<'a, Response> {
        let span = info_span!(
            "request",
            method = %req.method(),
            path = %req.path(),
            client = %req.client_ip(),
        );
        Box::pin(
            async move {
                let started = Instant::now();
                let res = next.run(req).await;
                info!(
                    status = res.status_code().as_u16(),
                    latency_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX),
                    "finished"
                );
                res
            }
            .instrument(span),
        )
    }
}

#[cfg(test)]
mod tests {
    use http::StatusCode;

    use super::*;
    use crate::{Method, Router};

    #[tokio::test]
    async fn passes_response_through() {
        let router = Router::new()
            .layer(Trace)
            .get("/", |_req: Request| async { StatusCode::IM_A_TEAPOT });

        let res = router.handle(Request::builder(Method::Get, "/").build()).await.unwrap();
        assert_eq!(res.status_code(), StatusCode::IM_A_TEAPOT);
    }
}
