//! Calendar endpoint tests.
//!
//! The month grid itself is covered by unit tests; these exercise the HTTP
//! surface: month selection, cell population and navigation links.

mod common;

use axum::http::StatusCode;
use common::app;
use serde_json::json;

async fn schedule(
    app: &common::TestApp,
    token: &str,
    content: &str,
    date: &str,
    time: &str,
) {
    let resp = app
        .post_json(
            "/v1/posts",
            json!({
                "content": content,
                "platforms": ["x"],
                "scheduled_date": date,
                "scheduled_time": time
            }),
            Some(token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
}

#[tokio::test]
async fn calendar_places_posts_in_their_cells() {
    let app = app().await;
    let user = app.create_user();

    schedule(app, &user.access_token, "mid month", "2026-09-15", "10:00").await;
    schedule(app, &user.access_token, "same day", "2026-09-15", "18:45").await;
    schedule(app, &user.access_token, "other month", "2026-10-02", "09:00").await;

    let resp = app
        .get("/v1/posts/calendar?year=2026&month=9", Some(&user.access_token))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    assert_eq!(body["year"].as_i64().unwrap(), 2026);
    assert_eq!(body["month"].as_i64().unwrap(), 9);

    let cells = body["cells"].as_array().unwrap();
    assert!(cells.len() <= 42);

    // 2026-09-01 is a Tuesday: two leading blanks, then 30 day cells.
    assert_eq!(cells.len(), 2 + 30);
    assert!(cells[0].get("date").is_none());
    assert!(cells[1].get("date").is_none());
    assert_eq!(cells[2]["date"].as_str().unwrap(), "2026-09-01");

    let fifteenth = cells
        .iter()
        .find(|c| c["date"].as_str() == Some("2026-09-15"))
        .expect("cell for the 15th");
    let posts = fifteenth["posts"].as_array().unwrap();
    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0]["scheduled_time"].as_str().unwrap(), "10:00");
    assert_eq!(posts[1]["scheduled_time"].as_str().unwrap(), "18:45");
    assert_eq!(fifteenth["overflow"].as_u64().unwrap(), 0);

    // The October post must not leak into September.
    assert!(cells
        .iter()
        .all(|c| c["posts"]
            .as_array()
            .map_or(true, |p| p.iter().all(|entry| {
                entry["content"].as_str() != Some("other month")
            }))));

    // Navigation links step by exactly one month.
    assert_eq!(body["previous"]["month"].as_i64().unwrap(), 8);
    assert_eq!(body["previous"]["year"].as_i64().unwrap(), 2026);
    assert_eq!(body["next"]["month"].as_i64().unwrap(), 10);
    assert_eq!(body["next"]["year"].as_i64().unwrap(), 2026);
}

#[tokio::test]
async fn calendar_overflow_indicator() {
    let app = app().await;
    let user = app.create_user();

    for i in 0..5 {
        schedule(
            app,
            &user.access_token,
            &format!("busy day {}", i),
            "2026-11-20",
            "12:00",
        )
        .await;
    }

    let resp = app
        .get("/v1/posts/calendar?year=2026&month=11", Some(&user.access_token))
        .await;
    assert_eq!(resp.status, StatusCode::OK);

    let cells = resp.json()["cells"].as_array().unwrap().clone();
    let cell = cells
        .iter()
        .find(|c| c["date"].as_str() == Some("2026-11-20"))
        .expect("cell for the 20th");
    assert_eq!(cell["posts"].as_array().unwrap().len(), 3);
    assert_eq!(cell["overflow"].as_u64().unwrap(), 2);
}

#[tokio::test]
async fn calendar_year_rollover_navigation() {
    let app = app().await;
    let user = app.create_user();

    let resp = app
        .get("/v1/posts/calendar?year=2026&month=12", Some(&user.access_token))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    assert_eq!(body["next"]["year"].as_i64().unwrap(), 2027);
    assert_eq!(body["next"]["month"].as_i64().unwrap(), 1);

    let resp = app
        .get("/v1/posts/calendar?year=2026&month=1", Some(&user.access_token))
        .await;
    let body = resp.json();
    assert_eq!(body["previous"]["year"].as_i64().unwrap(), 2025);
    assert_eq!(body["previous"]["month"].as_i64().unwrap(), 12);
}

#[tokio::test]
async fn calendar_rejects_partial_month_selection() {
    let app = app().await;
    let user = app.create_user();

    let resp = app
        .get("/v1/posts/calendar?year=2026", Some(&user.access_token))
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        resp.error_message(),
        "year and month must be supplied together"
    );

    let resp = app
        .get("/v1/posts/calendar?year=2026&month=13", Some(&user.access_token))
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error_message(), "invalid month (expected 1-12)");
}

#[tokio::test]
async fn calendar_defaults_to_current_month() {
    let app = app().await;
    let user = app.create_user();

    let resp = app.get("/v1/posts/calendar", Some(&user.access_token)).await;
    assert_eq!(resp.status, StatusCode::OK);

    let body = resp.json();
    let now = time::OffsetDateTime::now_utc();
    assert_eq!(body["year"].as_i64().unwrap(), i64::from(now.year()));
    assert_eq!(body["month"].as_i64().unwrap(), now.month() as i64);

    // Exactly one cell carries the today highlight.
    let cells = body["cells"].as_array().unwrap();
    let today_cells: Vec<_> = cells
        .iter()
        .filter(|c| c["is_today"].as_bool() == Some(true))
        .collect();
    assert_eq!(today_cells.len(), 1);
}
