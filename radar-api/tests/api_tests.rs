//! Integration tests for the Seismic Radar HTTP API
//!
//! Tests cover:
//! - Warming-up responses before the first publish
//! - Score and quake list shapes after a publish
//! - Health endpoint

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::Value;
use tower::util::ServiceExt; // for `oneshot` method

use radar_api::{build_router, AppState};
use radar_core::{
    ComponentInputs, CompositeScore, CrowdIndicator, Event, EventSource, IonosphereIndicator,
    SeismicIndicator, TimeIndicator,
};
use radar_runtime::{score_cache, CacheEntry, CacheWriter};

fn setup_app() -> (axum::Router, CacheWriter) {
    let (writer, reader) = score_cache();
    (build_router(AppState::new(reader)), writer)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

fn sample_entry(alert: bool) -> CacheEntry {
    let mut score = CompositeScore::compute(ComponentInputs {
        seismic: SeismicIndicator {
            normalized: 50.0,
            events48h: 2,
            baseline: 12.5,
            etas_prob: 50.0,
            max_mag: 4.2,
        },
        ionosphere: IonosphereIndicator {
            normalized: 0.0,
            tec: "--".to_string(),
            tec_anomaly: "--".to_string(),
            pressure: "1012.0 hPa".to_string(),
            pressure_anomaly: "Normal".to_string(),
        },
        time: TimeIndicator {
            normalized: 95.0,
            last_major_date: "11-07-1927".to_string(),
            cycle_percent: 110.3,
        },
        crowd: CrowdIndicator {
            normalized: 20.0,
            felt24h: 20,
            felt1h: 2,
            avg: 12,
        },
    })
    .unwrap();
    if alert {
        score.apply_official_alert();
    }

    let quakes = vec![
        Event::builder(EventSource::Gsi, 1_700_000_100_000)
            .id("gsi-1")
            .magnitude(Some(4.2))
            .depth_km(12.0)
            .coordinates(35.4, 31.2)
            .place("Dead Sea")
            .build(),
        Event::builder(EventSource::Usgs, 1_700_000_000_000)
            .magnitude(None)
            .coordinates(34.9, 32.8)
            .build(),
    ];

    CacheEntry {
        cycle: 1,
        score,
        quakes,
    }
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _writer) = setup_app();

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "seismic-radar");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_score_warming_up() {
    let (app, _writer) = setup_app();

    let response = app.oneshot(get("/api/score")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "warming_up");
    assert!(body["message"].is_string());
    assert!(body.get("totalScore").is_none());
}

#[tokio::test]
async fn test_quakes_warming_up() {
    let (app, _writer) = setup_app();

    let response = app.oneshot(get("/api/quakes")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_score_after_publish() {
    let (app, mut writer) = setup_app();
    writer.publish(sample_entry(false));

    let response = app.oneshot(get("/api/score")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    // 20 + 0 + 19 + 2
    assert_eq!(body["totalScore"], 41);
    assert_eq!(body["isOfficialAlert"], false);
    assert!(body["timestamp"].is_string());

    let seismic = &body["components"]["seismic"];
    assert_eq!(seismic["score"], 20);
    assert_eq!(seismic["normalized"], 50.0);
    assert_eq!(seismic["events48h"], 2);
    assert_eq!(seismic["maxMag"], 4.2);

    let ionosphere = &body["components"]["ionosphere"];
    assert_eq!(ionosphere["pressure"], "1012.0 hPa");
    assert_eq!(ionosphere["tecAnomaly"], "--");

    assert_eq!(body["components"]["time"]["lastMajorDate"], "11-07-1927");
    assert_eq!(body["components"]["crowd"]["felt24h"], 20);
}

#[tokio::test]
async fn test_score_official_alert() {
    let (app, mut writer) = setup_app();
    writer.publish(sample_entry(true));

    let response = app.oneshot(get("/api/score")).await.unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["totalScore"], 100);
    assert_eq!(body["isOfficialAlert"], true);
    assert_eq!(body["components"]["crowd"]["score"], 10);
}

#[tokio::test]
async fn test_quakes_after_publish() {
    let (app, mut writer) = setup_app();
    writer.publish(sample_entry(false));

    let response = app.oneshot(get("/api/quakes")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["count"], 2);

    let first = &body["features"][0];
    assert_eq!(first["id"], "gsi-1");
    assert_eq!(first["properties"]["mag"], 4.2);
    assert_eq!(first["properties"]["place"], "Dead Sea");
    assert_eq!(first["properties"]["source"], "GSI");
    assert_eq!(first["geometry"]["coordinates"][0], 35.4);
    assert_eq!(first["geometry"]["coordinates"][1], 31.2);
    assert_eq!(first["geometry"]["coordinates"][2], 12.0);

    let second = &body["features"][1];
    assert!(second["properties"]["mag"].is_null());
    assert_eq!(second["properties"]["source"], "USGS");
}

#[tokio::test]
async fn test_cors_headers() {
    let (app, _writer) = setup_app();

    let request = Request::builder()
        .method("GET")
        .uri("/health")
        .header("Origin", "http://example.com")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert!(response
        .headers()
        .contains_key("access-control-allow-origin"));
}

#[tokio::test]
async fn test_unknown_route() {
    let (app, _writer) = setup_app();

    let response = app.oneshot(get("/api/nope")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
