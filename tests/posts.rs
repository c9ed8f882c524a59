//! Scheduled post CRUD tests.
//!
//! Covers submit validation, partial updates, idempotent deletes, listing
//! and the per-platform preview endpoint.

mod common;

use axum::http::StatusCode;
use common::app;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn health_reports_ok() {
    let app = app().await;

    let resp = app.get("/health", None).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()["status"].as_str().unwrap(), "ok");
}

// ===========================================================================
// Post Creation
// ===========================================================================

#[tokio::test]
async fn create_post_valid() {
    let app = app().await;
    let user = app.create_user();

    let resp = app
        .post_json(
            "/v1/posts",
            json!({
                "content": "Launch day!",
                "platforms": ["x", "facebook"],
                "scheduled_date": "2026-09-15",
                "scheduled_time": "14:30"
            }),
            Some(&user.access_token),
        )
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    assert!(body["id"].is_string());
    assert_eq!(body["user_id"].as_str().unwrap(), user.id.to_string());
    assert_eq!(body["content"].as_str().unwrap(), "Launch day!");
    assert_eq!(body["status"].as_str().unwrap(), "scheduled");
    assert_eq!(body["char_count"].as_i64().unwrap(), 11);
    assert_eq!(
        body["platforms"],
        json!(["x", "facebook"]),
        "platform selection should round-trip"
    );
    assert_eq!(
        body["scheduled_at"].as_str().unwrap(),
        "2026-09-15T14:30:00Z"
    );
}

#[tokio::test]
async fn create_post_empty_content() {
    let app = app().await;
    let user = app.create_user();

    let resp = app
        .post_json(
            "/v1/posts",
            json!({
                "content": "",
                "platforms": ["x"],
                "scheduled_date": "2026-09-15",
                "scheduled_time": "14:30"
            }),
            Some(&user.access_token),
        )
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error_message(), "content cannot be empty");
}

#[tokio::test]
async fn create_post_no_platforms() {
    let app = app().await;
    let user = app.create_user();

    let resp = app
        .post_json(
            "/v1/posts",
            json!({
                "content": "hello",
                "platforms": [],
                "scheduled_date": "2026-09-15",
                "scheduled_time": "14:30"
            }),
            Some(&user.access_token),
        )
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error_message(), "select at least one platform");
}

#[tokio::test]
async fn create_post_over_binding_limit() {
    let app = app().await;
    let user = app.create_user();

    // 281 chars: fine for facebook alone, but x caps the pair at 280.
    let resp = app
        .post_json(
            "/v1/posts",
            json!({
                "content": "a".repeat(281),
                "platforms": ["facebook", "x"],
                "scheduled_date": "2026-09-15",
                "scheduled_time": "14:30"
            }),
            Some(&user.access_token),
        )
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        resp.error_message(),
        "content is 281 characters, over the 280-character limit"
    );
}

#[tokio::test]
async fn create_post_at_exact_limit() {
    let app = app().await;
    let user = app.create_user();

    let resp = app
        .post_json(
            "/v1/posts",
            json!({
                "content": "a".repeat(280),
                "platforms": ["x"],
                "scheduled_date": "2026-09-15",
                "scheduled_time": "14:30"
            }),
            Some(&user.access_token),
        )
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()["char_count"].as_i64().unwrap(), 280);
}

#[tokio::test]
async fn create_post_counts_unicode_scalars() {
    let app = app().await;
    let user = app.create_user();

    // 280 two-byte characters are within the limit when counted as chars.
    let resp = app
        .post_json(
            "/v1/posts",
            json!({
                "content": "é".repeat(280),
                "platforms": ["x"],
                "scheduled_date": "2026-09-15",
                "scheduled_time": "14:30"
            }),
            Some(&user.access_token),
        )
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()["char_count"].as_i64().unwrap(), 280);
}

#[tokio::test]
async fn create_post_unknown_platform_rejected() {
    let app = app().await;
    let user = app.create_user();

    let resp = app
        .post_json(
            "/v1/posts",
            json!({
                "content": "hello",
                "platforms": ["myspace"],
                "scheduled_date": "2026-09-15",
                "scheduled_time": "14:30"
            }),
            Some(&user.access_token),
        )
        .await;

    // Serde rejects the unknown variant before the handler runs.
    assert_eq!(resp.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn create_post_bad_schedule_format() {
    let app = app().await;
    let user = app.create_user();

    let resp = app
        .post_json(
            "/v1/posts",
            json!({
                "content": "hello",
                "platforms": ["x"],
                "scheduled_date": "15/09/2026",
                "scheduled_time": "14:30"
            }),
            Some(&user.access_token),
        )
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        resp.error_message(),
        "invalid scheduled_date (expected YYYY-MM-DD)"
    );
}

#[tokio::test]
async fn create_post_requires_auth() {
    let app = app().await;

    let resp = app
        .post_json(
            "/v1/posts",
            json!({
                "content": "hello",
                "platforms": ["x"],
                "scheduled_date": "2026-09-15",
                "scheduled_time": "14:30"
            }),
            None,
        )
        .await;

    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}

// ===========================================================================
// Reading and listing
// ===========================================================================

#[tokio::test]
async fn get_post_scoped_to_owner() {
    let app = app().await;
    let owner = app.create_user();
    let other = app.create_user();

    let created = app
        .post_json(
            "/v1/posts",
            json!({
                "content": "mine",
                "platforms": ["pinterest"],
                "scheduled_date": "2026-10-01",
                "scheduled_time": "08:00"
            }),
            Some(&owner.access_token),
        )
        .await;
    assert_eq!(created.status, StatusCode::OK);
    let id = created.json()["id"].as_str().unwrap().to_string();

    let resp = app
        .get(&format!("/v1/posts/{}", id), Some(&owner.access_token))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()["content"].as_str().unwrap(), "mine");

    // Another user sees not-found, not someone else's draft.
    let resp = app
        .get(&format!("/v1/posts/{}", id), Some(&other.access_token))
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_posts_most_recent_first() {
    let app = app().await;
    let user = app.create_user();

    for (date, content) in [
        ("2026-09-01", "first"),
        ("2026-09-03", "third"),
        ("2026-09-02", "second"),
    ] {
        let resp = app
            .post_json(
                "/v1/posts",
                json!({
                    "content": content,
                    "platforms": ["x"],
                    "scheduled_date": date,
                    "scheduled_time": "09:00"
                }),
                Some(&user.access_token),
            )
            .await;
        assert_eq!(resp.status, StatusCode::OK);
    }

    let resp = app.get("/v1/posts", Some(&user.access_token)).await;
    assert_eq!(resp.status, StatusCode::OK);
    let items = resp.json()["items"].as_array().unwrap().clone();
    assert_eq!(items.len(), 3);
    assert_eq!(items[0]["content"].as_str().unwrap(), "third");
    assert_eq!(items[1]["content"].as_str().unwrap(), "second");
    assert_eq!(items[2]["content"].as_str().unwrap(), "first");
}

// ===========================================================================
// Updates
// ===========================================================================

#[tokio::test]
async fn update_post_partial_fields() {
    let app = app().await;
    let user = app.create_user();

    let created = app
        .post_json(
            "/v1/posts",
            json!({
                "content": "before",
                "platforms": ["x"],
                "scheduled_date": "2026-09-15",
                "scheduled_time": "14:30"
            }),
            Some(&user.access_token),
        )
        .await;
    let id = created.json()["id"].as_str().unwrap().to_string();

    let resp = app
        .patch_json(
            &format!("/v1/posts/{}", id),
            json!({ "content": "after" }),
            Some(&user.access_token),
        )
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    assert_eq!(body["content"].as_str().unwrap(), "after");
    assert_eq!(body["char_count"].as_i64().unwrap(), 5);
    // Untouched fields survive the partial update.
    assert_eq!(body["platforms"], json!(["x"]));
    assert_eq!(
        body["scheduled_at"].as_str().unwrap(),
        "2026-09-15T14:30:00Z"
    );
}

#[tokio::test]
async fn update_post_revalidates_against_stored_platforms() {
    let app = app().await;
    let user = app.create_user();

    let created = app
        .post_json(
            "/v1/posts",
            json!({
                "content": "short",
                "platforms": ["x"],
                "scheduled_date": "2026-09-15",
                "scheduled_time": "14:30"
            }),
            Some(&user.access_token),
        )
        .await;
    let id = created.json()["id"].as_str().unwrap().to_string();

    // New content alone must still respect the stored x limit.
    let resp = app
        .patch_json(
            &format!("/v1/posts/{}", id),
            json!({ "content": "a".repeat(300) }),
            Some(&user.access_token),
        )
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        resp.error_message(),
        "content is 300 characters, over the 280-character limit"
    );
}

#[tokio::test]
async fn update_post_schedule_fields_together() {
    let app = app().await;
    let user = app.create_user();

    let created = app
        .post_json(
            "/v1/posts",
            json!({
                "content": "hello",
                "platforms": ["x"],
                "scheduled_date": "2026-09-15",
                "scheduled_time": "14:30"
            }),
            Some(&user.access_token),
        )
        .await;
    let id = created.json()["id"].as_str().unwrap().to_string();

    let resp = app
        .patch_json(
            &format!("/v1/posts/{}", id),
            json!({ "scheduled_date": "2026-09-16" }),
            Some(&user.access_token),
        )
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        resp.error_message(),
        "scheduled_date and scheduled_time must be updated together"
    );
}

#[tokio::test]
async fn update_missing_post() {
    let app = app().await;
    let user = app.create_user();

    let resp = app
        .patch_json(
            &format!("/v1/posts/{}", Uuid::new_v4()),
            json!({ "content": "anything" }),
            Some(&user.access_token),
        )
        .await;

    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.error_message(), "post not found");
}

// ===========================================================================
// Deletes
// ===========================================================================

#[tokio::test]
async fn delete_post_idempotent() {
    let app = app().await;
    let user = app.create_user();

    let created = app
        .post_json(
            "/v1/posts",
            json!({
                "content": "to delete",
                "platforms": ["x"],
                "scheduled_date": "2026-09-15",
                "scheduled_time": "14:30"
            }),
            Some(&user.access_token),
        )
        .await;
    let id = created.json()["id"].as_str().unwrap().to_string();

    let resp = app
        .delete(&format!("/v1/posts/{}", id), Some(&user.access_token))
        .await;
    assert_eq!(resp.status, StatusCode::NO_CONTENT);

    // Deleting the same id again is still a success.
    let resp = app
        .delete(&format!("/v1/posts/{}", id), Some(&user.access_token))
        .await;
    assert_eq!(resp.status, StatusCode::NO_CONTENT);

    let resp = app
        .get(&format!("/v1/posts/{}", id), Some(&user.access_token))
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_post_scoped_to_owner() {
    let app = app().await;
    let owner = app.create_user();
    let other = app.create_user();

    let created = app
        .post_json(
            "/v1/posts",
            json!({
                "content": "keep out",
                "platforms": ["x"],
                "scheduled_date": "2026-09-15",
                "scheduled_time": "14:30"
            }),
            Some(&owner.access_token),
        )
        .await;
    let id = created.json()["id"].as_str().unwrap().to_string();

    // A stranger's delete is a no-op; the post survives.
    let resp = app
        .delete(&format!("/v1/posts/{}", id), Some(&other.access_token))
        .await;
    assert_eq!(resp.status, StatusCode::NO_CONTENT);

    let resp = app
        .get(&format!("/v1/posts/{}", id), Some(&owner.access_token))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
}

// ===========================================================================
// Platform registry and preview
// ===========================================================================

#[tokio::test]
async fn list_platforms_public() {
    let app = app().await;

    let resp = app.get("/v1/platforms", None).await;
    assert_eq!(resp.status, StatusCode::OK);
    let items = resp.json()["items"].as_array().unwrap().clone();
    assert_eq!(items.len(), 7);

    let x = items
        .iter()
        .find(|p| p["id"].as_str() == Some("x"))
        .expect("x platform listed");
    assert_eq!(x["char_limit"].as_u64().unwrap(), 280);
    assert_eq!(x["display_name"].as_str().unwrap(), "X");

    let shorts = items
        .iter()
        .find(|p| p["id"].as_str() == Some("youtube-shorts"))
        .expect("youtube-shorts platform listed");
    assert_eq!(shorts["char_limit"].as_u64().unwrap(), 5000);
}

#[tokio::test]
async fn preview_reports_binding_platform() {
    let app = app().await;

    let resp = app
        .post_json(
            "/v1/posts/preview",
            json!({
                "content": "a".repeat(300),
                "platforms": ["facebook", "x"]
            }),
            None,
        )
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    assert_eq!(body["effective_char_limit"].as_u64().unwrap(), 280);
    assert_eq!(body["binding_platform"].as_str().unwrap(), "x");

    let previews = body["previews"].as_array().unwrap();
    let x = previews
        .iter()
        .find(|p| p["platform"].as_str() == Some("x"))
        .unwrap();
    assert_eq!(x["remaining"].as_i64().unwrap(), -20);
    // Truncated to the platform limit with an ellipsis marker.
    assert_eq!(x["content"].as_str().unwrap().chars().count(), 283);

    let facebook = previews
        .iter()
        .find(|p| p["platform"].as_str() == Some("facebook"))
        .unwrap();
    assert_eq!(facebook["remaining"].as_i64().unwrap(), 63206 - 300);
    assert_eq!(facebook["content"].as_str().unwrap().chars().count(), 300);
}
