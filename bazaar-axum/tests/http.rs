use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use bazaar_axum::{axum, AxumApp, SESSION_COOKIE};
use bazaar_core::errors::BazaarError;
use bazaar_core::{FailurePolicy, Nav, Renderer, Request as NavRequest, Router};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

struct Plain;

#[async_trait]
impl Renderer<String> for Plain {
    async fn load_partials(&self, partials: &[(&str, &str)]) -> Result<Vec<String>> {
        Ok(partials.iter().map(|(name, _)| name.to_string()).collect())
    }

    fn render(&self, view: &String) -> Result<String> {
        Ok(format!("<p>{view}</p>"))
    }
}

fn routes(policy: FailurePolicy) -> Router<(), String> {
    Router::new(policy)
        .get("/hello", |_, _, nav: Nav| async move { Ok(nav.render("hello".to_string())) })
        .get("/search", |_, req: NavRequest, nav: Nav| async move {
            Ok(nav.render(req.field("q").unwrap_or_default().to_string()))
        })
        .post("/remember", |_, req: NavRequest, nav: Nav| async move {
            let value = req.field("value").unwrap_or_default().to_string();
            req.storage.set("remembered", value);
            Ok(nav.redirect("/recall"))
        })
        .get("/recall", |_, req: NavRequest, nav: Nav| async move {
            Ok(nav.render(req.storage.get("remembered").unwrap_or_default()))
        })
        .get("/quiet", |_, _, nav: Nav| async move { Ok(nav.halt()) })
        .get("/broken", |_, _, _nav: Nav| async move {
            Err::<bazaar_core::Effect<String>, _>(BazaarError::conflict("Taken").into_anyhow())
        })
}

fn app(policy: FailurePolicy) -> AxumApp<(), String> {
    axum(routes(policy), (), Arc::new(Plain)).service("/health", || async { "ok" })
}

async fn body_text(res: axum::response::Response) -> String {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn cookie_of(res: &axum::response::Response) -> String {
    let raw = res.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
    raw.split(';').next().unwrap().to_string()
}

#[tokio::test]
async fn render_is_html_without_a_cookie() {
    let res = app(FailurePolicy::LogOnly).router.oneshot(get("/hello")).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().get(header::SET_COOKIE).is_none());
    assert_eq!(body_text(res).await, "<p>hello</p>");
}

#[tokio::test]
async fn storageless_visits_keep_nothing() {
    let ax = app(FailurePolicy::LogOnly);

    for n in 0..200 {
        let res = ax.router.clone().oneshot(get("/hello")).await.unwrap();
        assert!(res.headers().get(header::SET_COOKIE).is_none());

        let res = ax
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/nope")
                    .header(header::COOKIE, format!("{SESSION_COOKIE}=forged{n}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    assert!(ax.app.storage.is_empty());
}

#[tokio::test]
async fn get_forms_come_from_the_query() {
    let res = app(FailurePolicy::LogOnly).router.oneshot(get("/search?q=bike")).await.unwrap();
    assert_eq!(body_text(res).await, "<p>bike</p>");
}

#[tokio::test]
async fn storage_follows_the_cookie() {
    let ax = app(FailurePolicy::LogOnly);

    let res = ax
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/remember")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("value=blue+bike"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(res.headers().get(header::LOCATION).unwrap(), "/recall");
    let cookie = cookie_of(&res);
    assert!(cookie.starts_with(&format!("{SESSION_COOKIE}=")));

    let res = ax
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/recall")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(res.headers().get(header::SET_COOKIE).is_none());
    assert_eq!(body_text(res).await, "<p>blue bike</p>");

    let res = ax.router.oneshot(get("/recall")).await.unwrap();
    assert_eq!(body_text(res).await, "<p></p>");
    assert_eq!(ax.app.storage.len(), 1);
}

#[tokio::test]
async fn halt_is_no_content() {
    let res = app(FailurePolicy::LogOnly).router.oneshot(get("/quiet")).await.unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn unmatched_is_an_empty_not_found() {
    let res = app(FailurePolicy::LogOnly).router.oneshot(get("/nowhere")).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert!(body_text(res).await.is_empty());
}

#[tokio::test]
async fn unsupported_methods_are_rejected() {
    let res = app(FailurePolicy::LogOnly)
        .router
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/hello")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    let body: Value = serde_json::from_str(&body_text(res).await).unwrap();
    assert_eq!(body["className"], "method-not-allowed");
}

fn unreadable_form() -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/remember")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from("value=blue"))
        .unwrap()
}

#[tokio::test]
async fn unreadable_forms_follow_the_policy() {
    let res = app(FailurePolicy::LogOnly).router.oneshot(unreadable_form()).await.unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = app(FailurePolicy::Surface).router.oneshot(unreadable_form()).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_str(&body_text(res).await).unwrap();
    assert_eq!(body["className"], "bad-request");
}

#[tokio::test]
async fn log_only_swallows_handler_errors() {
    let res = app(FailurePolicy::LogOnly).router.oneshot(get("/broken")).await.unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn surface_reports_handler_errors_as_json() {
    let res = app(FailurePolicy::Surface).router.oneshot(get("/broken")).await.unwrap();

    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: Value = serde_json::from_str(&body_text(res).await).unwrap();
    assert_eq!(body["name"], "Conflict");
    assert_eq!(body["message"], "Taken");
    assert_eq!(body["code"], 409);
}

#[tokio::test]
async fn layered_router_sets_and_keeps_request_ids() {
    let router = app(FailurePolicy::LogOnly).into_router();

    let res = router.clone().oneshot(get("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().get("x-request-id").is_some());
    assert_eq!(body_text(res).await, "ok");

    let res = router
        .oneshot(
            Request::builder()
                .uri("/hello")
                .header("x-request-id", "req-42")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.headers().get("x-request-id").unwrap(), "req-42");
}
