mod common;

use warden::query::{QueryRewrite, add_to_query, modify_query, remove_from_query};
use warden::{Method, Request, Router};

use common::request;

async fn pager(req: Request) -> String {
    let page: u32 = req.query().get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    let prev = modify_query(&req, &QueryRewrite::new().set("page", page.saturating_sub(1)));
    let next = modify_query(&req, &QueryRewrite::new().set("page", page.saturating_add(1)));
    format!("{prev} {next}")
}

#[tokio::test]
async fn links_are_built_from_the_current_request() {
    let router = Router::new().get("/search", pager);

    let res = router.handle(request(Method::Get, "/search?q=rust&page=2")).await.unwrap();
    assert_eq!(res.body(), b"/search?q=rust&amp;page=1 /search?q=rust&amp;page=3");

    // page=0 is falsy, so the previous link drops the key entirely.
    let res = router.handle(request(Method::Get, "/search?q=rust&page=1")).await.unwrap();
    assert_eq!(res.body(), b"/search?q=rust /search?q=rust&amp;page=2");

    // The last page number has no successor; the link stays put.
    let res = router.handle(request(Method::Get, "/search?page=4294967295")).await.unwrap();
    assert_eq!(res.body(), b"/search?page=4294967294 /search?page=4294967295");
}

#[test]
fn tag_filter_links() {
    let req = request(Method::Get, "/articles?tag=rust&tag=web&page=3");

    let add = add_to_query(&req, &QueryRewrite::new().set("tag", "async").remove("page"));
    assert_eq!(add, "/articles?tag=rust&amp;tag=web&amp;tag=async");

    let already = add_to_query(&req, &QueryRewrite::new().set("tag", "web"));
    assert_eq!(already, "/articles?tag=rust&amp;tag=web&amp;page=3");

    let drop_one = remove_from_query(&req, &QueryRewrite::new().remove_pair("tag", "rust").remove("page"));
    assert_eq!(drop_one, "/articles?tag=web");

    let drop_all = remove_from_query(&req, &QueryRewrite::new().remove("tag").remove("page"));
    assert_eq!(drop_all, "/articles");
}
