mod common;

use actix_web::{http::StatusCode, test, App};
use serde_json::{json, Value};

use common::TestContext;

#[actix_web::test]
async fn test_comment_lifecycle_keeps_counter() {
    let ctx = TestContext::new();
    let post_id = ctx.seed_post("Commented").await;
    let app = test::init_service(App::new().configure(|cfg| ctx.services.configure(cfg))).await;
    let comments_uri = format!("/api/posts/{}/comments", post_id);

    let mut ids = Vec::new();
    for text in ["first", "second"] {
        let req = test::TestRequest::post()
            .uri(&comments_uri)
            .set_json(json!({"text": text, "postId": post_id}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["postId"], post_id);
        ids.push(body["id"].as_i64().unwrap());
    }
    assert_eq!(ctx.store.post(post_id).unwrap().comments_count, 2);

    let req = test::TestRequest::get().uri(&comments_uri).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let texts: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["text"].as_str().unwrap())
        .collect();
    assert_eq!(texts, vec!["first", "second"]);

    let req = test::TestRequest::put()
        .uri(&format!("{}/{}", comments_uri, ids[0]))
        .set_json(json!({"id": ids[0], "text": "edited"}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["text"], "edited");

    let req = test::TestRequest::get()
        .uri(&format!("{}/{}", comments_uri, ids[0]))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["text"], "edited");

    let req = test::TestRequest::delete()
        .uri(&format!("{}/{}", comments_uri, ids[1]))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(ctx.store.post(post_id).unwrap().comments_count, 1);

    // a second delete finds nothing and leaves the counter alone
    let req = test::TestRequest::delete()
        .uri(&format!("{}/{}", comments_uri, ids[1]))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(ctx.store.post(post_id).unwrap().comments_count, 1);
}

#[actix_web::test]
async fn test_comment_on_missing_post() {
    let ctx = TestContext::new();
    let app = test::init_service(App::new().configure(|cfg| ctx.services.configure(cfg))).await;

    let req = test::TestRequest::post()
        .uri("/api/posts/77/comments")
        .set_json(json!({"text": "hello"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get()
        .uri("/api/posts/77/comments")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(ctx.store.comment_count(), 0);
}

#[actix_web::test]
async fn test_comment_validation() {
    let ctx = TestContext::new();
    let post_id = ctx.seed_post("Strict").await;
    let app = test::init_service(App::new().configure(|cfg| ctx.services.configure(cfg))).await;
    let comments_uri = format!("/api/posts/{}/comments", post_id);

    let req = test::TestRequest::post()
        .uri(&comments_uri)
        .set_json(json!({"text": "   "}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri(&comments_uri)
        .set_json(json!({"text": "hi", "postId": post_id + 1}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(ctx.store.post(post_id).unwrap().comments_count, 0);
}

#[actix_web::test]
async fn test_comment_is_scoped_by_post() {
    let ctx = TestContext::new();
    let first = ctx.seed_post("First").await;
    let second = ctx.seed_post("Second").await;
    let app = test::init_service(App::new().configure(|cfg| ctx.services.configure(cfg))).await;

    let req = test::TestRequest::post()
        .uri(&format!("/api/posts/{}/comments", first))
        .set_json(json!({"text": "mine"}))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let comment_id = created["id"].as_i64().unwrap();

    let other_uri = format!("/api/posts/{}/comments/{}", second, comment_id);

    let req = test::TestRequest::get().uri(&other_uri).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::delete().uri(&other_uri).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(ctx.store.post(first).unwrap().comments_count, 1);
    assert_eq!(ctx.store.post(second).unwrap().comments_count, 0);
}

#[actix_web::test]
async fn test_deleting_post_removes_comments() {
    let ctx = TestContext::new();
    let post_id = ctx.seed_post("Gone").await;
    let app = test::init_service(App::new().configure(|cfg| ctx.services.configure(cfg))).await;

    let req = test::TestRequest::post()
        .uri(&format!("/api/posts/{}/comments", post_id))
        .set_json(json!({"text": "bye"}))
        .to_request();
    test::call_service(&app, req).await;
    assert_eq!(ctx.store.comment_count(), 1);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/posts/{}", post_id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(ctx.store.comment_count(), 0);
}
