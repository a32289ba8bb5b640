//! User directory routes: self-service profile, admin management, and the
//! guard's behavior around missing, expired, and mid-session-deactivated
//! accounts.

mod common;

use actix_web::{http::StatusCode, test};
use serde_json::{json, Value};
use uuid::Uuid;

use common::TestContext;
use status_service::security::TokenPurpose;


#[actix_web::test]
async fn me_returns_and_updates_own_profile() {
    let ctx = TestContext::new();
    let user = ctx.seed_user("a@x.com", "pw1234", "Alice", false);
    let access = ctx.access_token(&user);
    let app = test_app!(ctx);

    let req = test::TestRequest::get()
        .uri("/api/users/me")
        .insert_header(("Authorization", format!("Bearer {access}")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["id"], user.id.to_string());
    assert_eq!(body["email"], "a@x.com");

    let req = test::TestRequest::patch()
        .uri("/api/users/me")
        .insert_header(("Authorization", format!("Bearer {access}")))
        .set_json(json!({"name": "Alice Cooper"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["name"], "Alice Cooper");
}

#[actix_web::test]
async fn guard_rejects_missing_and_non_bearer_headers() {
    let ctx = TestContext::new();
    let app = test_app!(ctx);

    let req = test::TestRequest::get().uri("/api/users/me").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "UNAUTHENTICATED");

    let req = test::TestRequest::get()
        .uri("/api/users/me")
        .insert_header(("Authorization", "Basic dXNlcjpwdw=="))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "UNAUTHENTICATED");
}

#[actix_web::test]
async fn guard_distinguishes_expired_and_malformed_tokens() {
    let ctx = TestContext::new();
    let user = ctx.seed_user("a@x.com", "pw1234", "Alice", false);
    let expired = ctx
        .tokens
        .mint(user.id, false, TokenPurpose::Access, -5)
        .unwrap();
    let app = test_app!(ctx);

    let req = test::TestRequest::get()
        .uri("/api/users/me")
        .insert_header(("Authorization", format!("Bearer {expired}")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "TOKEN_EXPIRED");

    let req = test::TestRequest::get()
        .uri("/api/users/me")
        .insert_header(("Authorization", "Bearer garbage"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "TOKEN_MALFORMED");
}

#[actix_web::test]
async fn guard_rejects_refresh_token_on_api_calls() {
    let ctx = TestContext::new();
    let user = ctx.seed_user("a@x.com", "pw1234", "Alice", false);
    let pair = ctx.tokens.issue_pair(&user).unwrap();
    let app = test_app!(ctx);

    let req = test::TestRequest::get()
        .uri("/api/users/me")
        .insert_header(("Authorization", format!("Bearer {}", pair.refresh_token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "TOKEN_PURPOSE_MISMATCH");
}

#[actix_web::test]
async fn deactivation_invalidates_live_sessions() {
    let ctx = TestContext::new();
    let user = ctx.seed_user("a@x.com", "pw1234", "Alice", false);
    let access = ctx.access_token(&user);
    let app = test_app!(ctx);

    let req = test::TestRequest::get()
        .uri("/api/users/me")
        .insert_header(("Authorization", format!("Bearer {access}")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    // Deactivate mid-session; the unexpired token stops working.
    ctx.users.set_flags(user.id, Some(false), None);

    let req = test::TestRequest::get()
        .uri("/api/users/me")
        .insert_header(("Authorization", format!("Bearer {access}")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "ACCOUNT_INACTIVE");
}

#[actix_web::test]
async fn deleted_subject_is_forbidden() {
    let ctx = TestContext::new();
    let admin = ctx.seed_user("admin@x.com", "pw1234", "Admin", true);
    let user = ctx.seed_user("a@x.com", "pw1234", "Alice", false);
    let admin_access = ctx.access_token(&admin);
    let user_access = ctx.access_token(&user);
    let app = test_app!(ctx);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/users/{}", user.id))
        .insert_header(("Authorization", format!("Bearer {admin_access}")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::get()
        .uri("/api/users/me")
        .insert_header(("Authorization", format!("Bearer {user_access}")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn listing_and_item_access_are_admin_only() {
    let ctx = TestContext::new();
    let admin = ctx.seed_user("admin@x.com", "pw1234", "Admin", true);
    let user = ctx.seed_user("a@x.com", "pw1234", "Alice", false);
    let admin_access = ctx.access_token(&admin);
    let user_access = ctx.access_token(&user);
    let app = test_app!(ctx);

    let req = test::TestRequest::get()
        .uri("/api/users")
        .insert_header(("Authorization", format!("Bearer {user_access}")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::get()
        .uri("/api/users")
        .insert_header(("Authorization", format!("Bearer {admin_access}")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body.as_array().unwrap().len(), 2);

    let req = test::TestRequest::get()
        .uri(&format!("/api/users/{}", admin.id))
        .insert_header(("Authorization", format!("Bearer {user_access}")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::get()
        .uri(&format!("/api/users/{}", user.id))
        .insert_header(("Authorization", format!("Bearer {admin_access}")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["email"], "a@x.com");

    let req = test::TestRequest::get()
        .uri(&format!("/api/users/{}", Uuid::new_v4()))
        .insert_header(("Authorization", format!("Bearer {admin_access}")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn admin_creates_records_and_duplicates_conflict() {
    let ctx = TestContext::new();
    let admin = ctx.seed_user("admin@x.com", "pw1234", "Admin", true);
    let admin_access = ctx.access_token(&admin);
    let app = test_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/users")
        .insert_header(("Authorization", format!("Bearer {admin_access}")))
        .set_json(json!({"email": "new@x.com", "name": "New User"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["email"], "new@x.com");
    assert_eq!(body["is_admin"], false);
    assert_eq!(body["is_active"], true);

    let req = test::TestRequest::post()
        .uri("/api/users")
        .insert_header(("Authorization", format!("Bearer {admin_access}")))
        .set_json(json!({"email": "new@x.com", "name": "Dup"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "CONFLICT");
}

#[actix_web::test]
async fn admin_updates_flags_and_self_service_cannot() {
    let ctx = TestContext::new();
    let admin = ctx.seed_user("admin@x.com", "pw1234", "Admin", true);
    let user = ctx.seed_user("a@x.com", "pw1234", "Alice", false);
    let admin_access = ctx.access_token(&admin);
    let user_access = ctx.access_token(&user);
    let app = test_app!(ctx);

    let req = test::TestRequest::patch()
        .uri(&format!("/api/users/{}", user.id))
        .insert_header(("Authorization", format!("Bearer {admin_access}")))
        .set_json(json!({"is_admin": true, "name": "Alice Promoted"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["is_admin"], true);
    assert_eq!(body["name"], "Alice Promoted");

    // Non-admin cannot reach the by-id route, even for their own record.
    let req = test::TestRequest::patch()
        .uri(&format!("/api/users/{}", user.id))
        .insert_header(("Authorization", format!("Bearer {user_access}")))
        .set_json(json!({"is_admin": false}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn delete_missing_user_is_not_found() {
    let ctx = TestContext::new();
    let admin = ctx.seed_user("admin@x.com", "pw1234", "Admin", true);
    let admin_access = ctx.access_token(&admin);
    let app = test_app!(ctx);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/users/{}", Uuid::new_v4()))
        .insert_header(("Authorization", format!("Bearer {admin_access}")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
