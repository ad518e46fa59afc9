use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::Request;
use futures::StreamExt;
use qcsite_collector::LocationStore;
use qcsite_core::LocationRegistry;
use qcsite_scoring::HeuristicRecommender;
use qcsite_scraper::SimulatedProvider;
use tower::ServiceExt;

use super::*;

fn test_state() -> AppState {
    let events = BroadcastSink::new(16);
    let scheduler = CollectionScheduler::new(
        LocationRegistry::default(),
        Arc::new(SimulatedProvider::new(42)),
        Arc::new(HeuristicRecommender),
        LocationStore::new(),
        Arc::new(events.clone()),
        Duration::from_secs(5),
    )
    .with_inter_location_delay(Duration::ZERO);
    AppState {
        scheduler: Arc::new(scheduler),
        events,
    }
}

async fn send(app: Router, method: &str, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let json = serde_json::from_slice(&body).expect("json parse");
    (status, json)
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    send(app, "GET", uri).await
}

#[test]
fn normalize_limit_applies_defaults_and_bounds() {
    assert_eq!(normalize_limit(None), 20);
    assert_eq!(normalize_limit(Some(0)), 1);
    assert_eq!(normalize_limit(Some(-5)), 1);
    assert_eq!(normalize_limit(Some(1_000)), 100);
    assert_eq!(normalize_limit(Some(7)), 7);
}

#[test]
fn api_error_codes_map_to_statuses() {
    let not_found = ApiError::new("req-1", "not_found", "missing").into_response();
    assert_eq!(not_found.status(), StatusCode::NOT_FOUND);
    let internal = ApiError::new("req-1", "internal_error", "boom").into_response();
    assert_eq!(internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let stopped =
        map_collector_error("req-1".to_string(), &CollectorError::Stopped).into_response();
    assert_eq!(stopped.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn health_reports_scheduler_state() {
    let (status, json) = get_json(build_app(test_state()), "/api/v1/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "ok");
    assert_eq!(json["data"]["scheduler"], "stopped");
    assert!(json["meta"]["request_id"].is_string());
}

#[tokio::test]
async fn locations_before_first_cycle_are_pending() {
    let (status, json) = get_json(build_app(test_state()), "/api/v1/locations").await;
    assert_eq!(status, StatusCode::OK);

    let data = json["data"].as_array().expect("data array");
    assert_eq!(data.len(), 9);
    assert_eq!(data[0]["name"], "Nellore");
    for item in data {
        assert_eq!(item["warehouse_score"], 0);
        assert!(item["recommendation_tier"].is_null());
        assert_eq!(item["recommendation"], "Data collection in progress");
    }
}

#[tokio::test]
async fn locations_after_cycle_carry_scores() {
    let state = test_state();
    state.scheduler.run_cycle().await;
    let expected = state.scheduler.get_by_name("Mumbai").unwrap();

    let (_, json) = get_json(build_app(state), "/api/v1/locations").await;
    let mumbai = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|i| i["name"] == "Mumbai")
        .expect("Mumbai row");
    assert_eq!(
        mumbai["warehouse_score"].as_u64(),
        Some(u64::from(expected.result.warehouse_score))
    );
    assert_eq!(mumbai["recommendation"], expected.summary.as_str());
    assert_eq!(
        mumbai["recommendation_tier"],
        expected.result.recommendation_tier.as_str()
    );
}

#[tokio::test]
async fn location_detail_collects_on_demand() {
    let state = test_state();
    assert!(state.scheduler.get_by_name("Guntur").is_none());

    let (status, json) = get_json(build_app(state.clone()), "/api/v1/locations/guntur").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["location"]["name"], "Guntur");
    assert_eq!(json["data"]["own"]["service"], "blinkit");
    assert!(json["data"]["result"]["warehouse_score"].is_u64());
    assert!(state.scheduler.get_by_name("Guntur").is_some());
}

#[tokio::test]
async fn unknown_location_is_404() {
    let (status, json) = get_json(build_app(test_state()), "/api/v1/locations/atlantis").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "not_found");
}

#[tokio::test]
async fn refresh_returns_committed_record() {
    let state = test_state();
    let (status, json) = send(
        build_app(state.clone()),
        "POST",
        "/api/v1/locations/Delhi/refresh",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["record"]["location"]["name"], "Delhi");
    assert_eq!(state.scheduler.store().len(), 1);

    let (status, _) = send(build_app(state), "POST", "/api/v1/locations/nowhere/refresh").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn competitors_require_collected_data() {
    let state = test_state();
    let (status, _) = get_json(
        build_app(state.clone()),
        "/api/v1/locations/Chennai/competitors",
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let record = state.scheduler.refresh_one("Chennai").await.unwrap();
    let (status, json) = get_json(build_app(state), "/api/v1/locations/Chennai/competitors").await;
    assert_eq!(status, StatusCode::OK);

    let data = &json["data"];
    let expected_position = if record.result.market_share_percent > 50.0 {
        "leader"
    } else {
        "challenger"
    };
    assert_eq!(data["market_position"], expected_position);
    assert_eq!(
        data["operator_advantage"],
        record.result.warehouse_score > 60
    );
    assert_eq!(
        data["competitive_gap"].as_u64(),
        Some(100 - u64::from(record.result.warehouse_score))
    );
    assert_eq!(data["competitors"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn recommendations_are_filtered_and_sorted() {
    let state = test_state();
    state.scheduler.run_cycle().await;

    let (status, json) = get_json(
        build_app(state.clone()),
        "/api/v1/recommendations?min_score=0&limit=100",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let data = json["data"].as_array().unwrap();
    assert_eq!(data.len(), 9);
    let scores: Vec<u64> = data
        .iter()
        .map(|i| i["warehouse_score"].as_u64().unwrap())
        .collect();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]), "not sorted: {scores:?}");

    let (_, json) = get_json(build_app(state.clone()), "/api/v1/recommendations?min_score=0&limit=0").await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);

    let (_, json) = get_json(build_app(state.clone()), "/api/v1/recommendations").await;
    for item in json["data"].as_array().unwrap() {
        assert!(item["warehouse_score"].as_u64().unwrap() >= 60);
        let record = state
            .scheduler
            .get_by_name(item["location"].as_str().unwrap())
            .unwrap();
        let revenue = item["estimated_revenue"].as_f64().unwrap();
        assert!((revenue - record.estimated_revenue()).abs() < 1e-6);
    }
}

#[tokio::test]
async fn stats_are_zero_before_collection() {
    let (status, json) = get_json(build_app(test_state()), "/api/v1/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["tracked_locations"], 0);
    assert_eq!(json["data"]["total_orders"], 0);
    assert_eq!(json["data"]["average_market_share_percent"], 0.0);
    assert!(json["data"]["last_updated"].is_null());
}

#[tokio::test]
async fn stats_sum_operator_orders() {
    let state = test_state();
    state.scheduler.run_cycle().await;
    let expected: u64 = state
        .scheduler
        .get_all()
        .iter()
        .map(|r| r.own.estimated_orders())
        .sum();

    let (_, json) = get_json(build_app(state), "/api/v1/stats").await;
    assert_eq!(json["data"]["tracked_locations"], 9);
    assert_eq!(json["data"]["total_orders"].as_u64(), Some(expected));
}

#[tokio::test]
async fn status_reports_registry_and_cycles() {
    let state = test_state();
    state.scheduler.run_cycle().await;
    let (status, json) = get_json(build_app(state), "/api/v1/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["registered_locations"], 9);
    assert_eq!(json["data"]["tracked_locations"], 9);
    assert_eq!(json["data"]["cycles_completed"], 1);
    assert_eq!(json["data"]["running"], false);
}

#[tokio::test]
async fn events_stream_filters_by_location() {
    let state = test_state();
    let response = build_app(state.clone())
        .oneshot(
            Request::builder()
                .uri("/api/v1/events?location=guntur")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/event-stream"
    );

    state.scheduler.refresh_one("Nellore").await.unwrap();
    state.scheduler.refresh_one("Guntur").await.unwrap();

    let mut body = response.into_body().into_data_stream();
    let frame = tokio::time::timeout(Duration::from_secs(5), body.next())
        .await
        .expect("event within timeout")
        .expect("stream open")
        .expect("frame bytes");
    let text = String::from_utf8_lossy(&frame);
    assert!(text.contains("event: location-data-updated"), "frame: {text}");
    assert!(text.contains("\"Guntur\""), "frame: {text}");
    assert!(!text.contains("\"Nellore\""), "frame: {text}");
}

#[tokio::test]
async fn heatmap_starts_at_the_location_and_follows_service_areas() {
    let state = test_state();
    let (status, _) = get_json(
        build_app(state.clone()),
        "/api/v1/locations/Hyderabad/heatmap",
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let record = state.scheduler.refresh_one("Hyderabad").await.unwrap();
    let (status, json) =
        get_json(build_app(state), "/api/v1/locations/hyderabad/heatmap").await;
    assert_eq!(status, StatusCode::OK);

    let points = json["data"].as_array().expect("points");
    assert_eq!(points.len(), record.own.service_areas().len() + 1);
    assert_eq!(points[0]["area"]["name"], "Hyderabad");
    assert_eq!(points[0]["lat"].as_f64(), Some(record.location.coordinates.lat));
    assert_eq!(
        points[0]["intensity"].as_u64(),
        Some(u64::from(record.result.warehouse_score))
    );
    for (point, area) in points[1..].iter().zip(record.own.service_areas()) {
        assert_eq!(point["area"]["name"], area.name.as_str());
        assert!(point["intensity"].as_u64().unwrap() <= 100);
    }
}
