//! Minimal warden site — a paged article list and a comment form behind the
//! reputation check.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl 'http://localhost:3000/articles?tag=rust&page=2'
//!   curl -X POST http://localhost:3000/comments -d 'body=hello'
//!
//! Configuration comes from the environment; see `warden::config`.

use chrono::{NaiveDate, Utc};
use warden::filters::{days_since, humanize_url};
use warden::middleware::{SuspiciousIp, Trace};
use warden::query::{QueryRewrite, add_to_query, modify_query, remove_from_query};
use warden::reputation::ReputationChecker;
use warden::{Config, Request, Response, Router, Server};

#[tokio::main]
async fn main() -> Result<(), warden::Error> {
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;

    let app = Router::new()
        .layer(Trace)
        .layer(SuspiciousIp::new(ReputationChecker::from_config(&config)))
        .get("/articles", list_articles)
        .post("/comments", create_comment);

    Server::from_config(&config).serve(app).await
}

// GET /articles?tag=…&page=…
async fn list_articles(req: Request) -> Response {
    let page: u32 = req.query().get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    let today = Utc::now().date_naive();
    let published = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap_or(today);

    let next = modify_query(&req, &QueryRewrite::new().set("page", page.saturating_add(1)));
    let with_async = add_to_query(&req, &QueryRewrite::new().set("tag", "async").remove("page"));
    let no_tags = remove_from_query(&req, &QueryRewrite::new().remove("tag").remove("page"));

    Response::html(format!(
        r#"<p>Page {page}. Published {}.</p>
<p>Source: {}</p>
<a href="{next}">next</a> · <a href="{with_async}">+async</a> · <a href="{no_tags}">all</a>"#,
        days_since(published, today),
        humanize_url("https://blog.rust-lang.org/2024/01/15/announcement/", 30),
    ))
}

// POST /comments — never reached from a listed Tor exit or open proxy.
async fn create_comment(req: Request) -> Response {
    if req.body().is_empty() {
        return Response::status(http::StatusCode::BAD_REQUEST);
    }
    Response::builder()
        .status(http::StatusCode::CREATED)
        .text("thanks")
}
