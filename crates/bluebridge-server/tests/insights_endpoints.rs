use axum::http::{Method, StatusCode};
use serde_json::{json, Value};
use sqlx_postgres::Postgres;

mod support;

use support::TestApp;

async fn place_user(app: &TestApp, email: &str, latitude: f64, longitude: f64) -> (String, String) {
    let (user_id, token) = app.register(email, "pw").await;
    let (status, body) = app
        .send_json(
            Method::POST,
            "/api/users/update-location",
            json!({
                "userId": user_id,
                "loginToken": token,
                "latitude": latitude,
                "longitude": longitude,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    (user_id, token)
}

async fn create_well(app: &TestApp, user_id: &str, token: &str, esp_id: &str, location: Value) {
    let (status, body) = app
        .send_json(
            Method::POST,
            "/api/wells",
            json!({
                "userId": user_id,
                "loginToken": token,
                "wellName": format!("Well {esp_id}"),
                "espId": esp_id,
                "wellLocation": location,
                "wellCapacity": "1000",
                "wellWaterLevel": 40,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
}

#[tokio::test]
#[cfg_attr(
    not(feature = "postgres-tests"),
    ignore = "requires TEST_DATABASE_URL"
)]
async fn nearby_users_excludes_caller_and_private_users_closest_first() {
    let app = TestApp::new().await;
    let (caller_id, caller_token) = place_user(&app, "caller@example.com", 10.0, 20.0).await;
    place_user(&app, "far-ish@example.com", 10.05, 20.0).await;
    place_user(&app, "close@example.com", 10.01, 20.0).await;
    place_user(&app, "remote@example.com", 20.0, 20.0).await;
    let (hidden_id, hidden_token) = place_user(&app, "hidden@example.com", 10.001, 20.0).await;

    let (status, _) = app
        .send_json(
            Method::POST,
            "/api/auth/private-location",
            json!({ "userId": hidden_id, "loginToken": hidden_token, "message": "false" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .send_json(
            Method::POST,
            "/api/nearby-users",
            json!({
                "userId": caller_id,
                "loginToken": caller_token,
                "latitude": 10.0,
                "longitude": "20.0",
                "radius": 10,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["message"], "Nearby users retrieved successfully");
    let emails: Vec<&str> = body["data"]
        .as_array()
        .expect("users")
        .iter()
        .filter_map(|user| user["email"].as_str())
        .collect();
    assert_eq!(emails, vec!["close@example.com", "far-ish@example.com"]);
    let distances: Vec<f64> = body["data"]
        .as_array()
        .expect("users")
        .iter()
        .filter_map(|user| user["distance"].as_f64())
        .collect();
    assert!(distances[0] < distances[1], "{distances:?}");

    let (status, body) = app
        .send_json(
            Method::POST,
            "/api/nearby-users",
            json!({ "userId": caller_id, "loginToken": caller_token, "radius": 10 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "Missing required fields: latitude and longitude"
    );
}

#[tokio::test]
#[cfg_attr(
    not(feature = "postgres-tests"),
    ignore = "requires TEST_DATABASE_URL"
)]
async fn well_statistics_is_served_on_every_alias() {
    let app = TestApp::new().await;
    let (user_id, token) = app.register("stats@example.com", "pw").await;
    create_well(&app, &user_id, &token, "esp-s1", json!("1.0,1.0")).await;
    create_well(&app, &user_id, &token, "esp-s2", json!("2.0,2.0")).await;

    for uri in [
        "/api/well-statistics",
        "/api/wellStats",
        "/api/stats",
        "/api/wells/stats",
    ] {
        let (status, body) = app.get_json(uri).await;
        assert_eq!(status, StatusCode::OK, "{uri}: {body}");
        assert_eq!(body["status"], "success");
        let stats = &body["data"];
        assert_eq!(stats["totalWells"], 2, "{uri}");
        assert_eq!(stats["totalCapacity"], 2000.0, "{uri}");
        assert_eq!(stats["totalWaterLevel"], 80.0, "{uri}");
        assert_eq!(stats["percentageAvailable"], 4.0, "{uri}");
        assert_eq!(stats["statusCounts"]["Active"], 2, "{uri}");
    }
}

#[tokio::test]
#[cfg_attr(
    not(feature = "postgres-tests"),
    ignore = "requires TEST_DATABASE_URL"
)]
async fn wells_geo_filter_paginates_after_filtering() {
    let app = TestApp::new().await;
    let (user_id, token) = app.register("geo@example.com", "pw").await;
    create_well(&app, &user_id, &token, "esp-g1", json!("10.0,20.0")).await;
    create_well(&app, &user_id, &token, "esp-g2", json!("10.01,20.0")).await;
    create_well(&app, &user_id, &token, "esp-g3", json!("10.02,20.0")).await;
    create_well(&app, &user_id, &token, "esp-far", json!("40.0,20.0")).await;

    let (status, body) = app
        .get_json("/api/wells?latitude=10.0&longitude=20.0&radius=5&page=1&limit=2")
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["pagination"]["total"], 3);
    assert_eq!(body["pagination"]["pages"], 2);

    let (status, body) = app
        .get_json("/api/wells?latitude=10.0&longitude=20.0&radius=5&page=2&limit=2")
        .await;
    assert_eq!(status, StatusCode::OK);
    let wells = body["data"].as_array().expect("wells");
    assert_eq!(wells.len(), 1);
    assert_ne!(wells[0]["espId"], "esp-far");
}

#[tokio::test]
#[cfg_attr(
    not(feature = "postgres-tests"),
    ignore = "requires TEST_DATABASE_URL"
)]
async fn bug_reports_are_stored() {
    let app = TestApp::new().await;

    let (status, body) = app
        .send_json(
            Method::POST,
            "/api/bugreports",
            json!({
                "name": "Ada",
                "description": "Map does not load",
                "category": "ui",
                "extra": { "platform": "android" },
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["message"], "Bug report submitted");

    let (status, body) = app
        .send_json(
            Method::POST,
            "/api/bugreports",
            json!({ "name": "Ada", "category": "ui" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "Missing required fields: name, description, category"
    );

    let stored: i64 = sqlx_core::query_scalar::query_scalar::<Postgres, i64>(
        "SELECT COUNT(*) FROM bug_reports WHERE category = 'ui'",
    )
    .fetch_one(&app.pool)
    .await
    .expect("count");
    assert_eq!(stored, 1);
}

#[tokio::test]
#[cfg_attr(
    not(feature = "postgres-tests"),
    ignore = "requires TEST_DATABASE_URL"
)]
async fn health_reports_ok_with_a_reachable_database() {
    let app = TestApp::new().await;
    let (status, body) = app.get_json("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}
