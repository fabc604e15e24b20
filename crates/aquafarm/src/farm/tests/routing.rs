use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, HeaderValue, Method, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;
use crate::config::FarmConfig;
use crate::farm::access::Actor;
use crate::farm::router::{dashboard_handler, status_for, ReportQuery, USER_HEADER};
use crate::farm::service::{FarmError, FarmService};

fn request(
    method: Method,
    uri: &str,
    actor: Option<&Actor>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(actor) = actor {
        builder = builder.header(USER_HEADER, actor.id().as_str());
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).expect("json body")))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

#[tokio::test]
async fn requests_without_user_header_are_unauthorized() {
    let fixture = FarmFixture::new();
    let response = fixture
        .router()
        .oneshot(request(Method::GET, "/api/v1/dashboard", None, None))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = read_json_body(response).await;
    assert!(body["error"].as_str().expect("error text").contains("credentials"));
}

#[tokio::test]
async fn company_registration_is_open() {
    let fixture = FarmFixture::new();
    let response = fixture
        .router()
        .oneshot(request(
            Method::POST,
            "/api/v1/companies",
            None,
            Some(json!({
                "company_name": "Coral Reef Farms",
                "contact_email": "hello@coralreef.test",
                "manager_name": "Lee Ong",
                "manager_email": "lee@coralreef.test"
            })),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json_body(response).await;
    assert_eq!(body["company"]["status"], "pending");
    assert_eq!(body["manager"]["active"], false);
}

#[tokio::test]
async fn viewers_are_forbidden_from_writes() {
    let fixture = FarmFixture::new();
    let response = fixture
        .router()
        .oneshot(request(
            Method::POST,
            "/api/v1/cages",
            Some(&fixture.viewer),
            Some(json!({ "name": "Cage V1" })),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_cage_is_not_found() {
    let fixture = FarmFixture::new();
    let response = fixture
        .router()
        .oneshot(request(
            Method::GET,
            "/api/v1/cages/cage-missing",
            Some(&fixture.viewer),
            None,
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn stocking_to_dashboard_over_http() {
    let fixture = FarmFixture::new();

    let response = fixture
        .router()
        .oneshot(request(
            Method::POST,
            "/api/v1/cages",
            Some(&fixture.manager),
            Some(json!({ "name": "Cage H1", "volume_m3": 250.0, "capacity": 10000 })),
        ))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::CREATED);
    let cage = read_json_body(response).await;
    let cage_id = cage["id"].as_str().expect("cage id").to_string();

    let response = fixture
        .router()
        .oneshot(request(
            Method::POST,
            &format!("/api/v1/cages/{cage_id}/stockings"),
            Some(&fixture.operator),
            Some(json!({
                "fish_count": 4000,
                "average_weight_g": 25.0,
                "stocking_date": "2025-04-01",
                "species": "Tilapia"
            })),
        ))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let stocking = read_json_body(response).await;
    assert_eq!(stocking["status"], "pending_approval");
    let stocking_id = stocking["id"].as_str().expect("stocking id").to_string();

    let response = fixture
        .router()
        .oneshot(request(
            Method::GET,
            "/api/v1/approvals",
            Some(&fixture.manager),
            None,
        ))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::OK);
    let pending = read_json_body(response).await;
    assert_eq!(pending.as_array().map(Vec::len), Some(1));

    let response = fixture
        .router()
        .oneshot(request(
            Method::POST,
            &format!("/api/v1/approvals/{stocking_id}/approve"),
            Some(&fixture.manager),
            None,
        ))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::OK);

    let response = fixture
        .router()
        .oneshot(request(
            Method::POST,
            &format!("/api/v1/cages/{cage_id}/daily-records"),
            Some(&fixture.operator),
            Some(json!({ "date": "2025-04-02", "feed_kg": 12.5, "mortality": 40 })),
        ))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = fixture
        .router()
        .oneshot(request(
            Method::POST,
            &format!("/api/v1/cages/{cage_id}/daily-records"),
            Some(&fixture.operator),
            Some(json!({ "date": "2025-04-02", "feed_kg": 11.0 })),
        ))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = fixture
        .router()
        .oneshot(request(
            Method::GET,
            "/api/v1/dashboard?today=2025-04-03",
            Some(&fixture.viewer),
            None,
        ))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::OK);
    let dashboard = read_json_body(response).await;
    assert_eq!(dashboard["today"], "2025-04-03");
    assert_eq!(dashboard["active_cages"], 1);
    assert_eq!(dashboard["total_fish"], 3960);
    assert_eq!(dashboard["recent_mortality"], 40);
    assert_eq!(dashboard["cages"][0]["name"], "Cage H1");
    assert_eq!(dashboard["cages"][0]["days_of_culture"], 2);
}

#[tokio::test]
async fn reports_accept_the_earliest_calendar_date() {
    let fixture = FarmFixture::new();
    let cage = fixture.stocked_cage("Cage A1", 1_000, 10.0);

    for uri in [
        "/api/v1/dashboard?today=-262143-01-01".to_string(),
        format!("/api/v1/cages/{}/overview?today=-262143-01-01", cage.id),
    ] {
        let response = fixture
            .router()
            .oneshot(request(Method::GET, &uri, Some(&fixture.manager), None))
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
    }
}

#[tokio::test]
async fn invalid_payloads_are_unprocessable() {
    let fixture = FarmFixture::new();
    let cage = fixture.stocked_cage("Cage A1", 1_000, 10.0);

    let response = fixture
        .router()
        .oneshot(request(
            Method::POST,
            &format!("/api/v1/cages/{}/samples", cage.id),
            Some(&fixture.operator),
            Some(json!({ "date": "2025-04-15", "sample_count": 0, "sample_weight_kg": 1.0 })),
        ))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn feed_log_export_and_import_over_http() {
    let fixture = FarmFixture::new();
    let cage = fixture.stocked_cage("Cage A1", 1_000, 10.0);

    let upload = "date,feed_kg,mortality\n2025-04-02,6.0,1\n2025-04-03,6.5,0\n";
    let response = fixture
        .router()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri(format!("/api/v1/cages/{}/daily-records/import", cage.id))
                .header(USER_HEADER, fixture.operator.id().as_str())
                .header(header::CONTENT_TYPE, "text/csv")
                .body(Body::from(upload))
                .expect("request"),
        )
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::OK);
    let outcome = read_json_body(response).await;
    assert_eq!(outcome["imported"].as_array().map(Vec::len), Some(2));
    assert_eq!(outcome["rejected"].as_array().map(Vec::len), Some(0));

    let response = fixture
        .router()
        .oneshot(request(
            Method::GET,
            &format!("/api/v1/cages/{}/daily-records/export", cage.id),
            Some(&fixture.viewer),
            None,
        ))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE),
        Some(&HeaderValue::from_static("text/csv; charset=utf-8"))
    );
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    let csv = String::from_utf8(body.to_vec()).expect("utf8");
    assert_eq!(csv.lines().count(), 3);
    assert!(csv.starts_with("date,feed_kg,"));
}

#[tokio::test]
async fn repository_outage_maps_to_internal_error() {
    let service = Arc::new(FarmService::new(
        Arc::new(UnavailableStore),
        &FarmConfig::default(),
    ));
    let mut headers = HeaderMap::new();
    headers.insert(USER_HEADER, HeaderValue::from_static("usr-000001"));

    let response = dashboard_handler::<UnavailableStore>(
        State(service),
        headers,
        Query(ReportQuery::default()),
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn error_statuses_follow_the_failure_kind() {
    assert_eq!(
        status_for(&FarmError::Validation("bad".to_string())),
        StatusCode::UNPROCESSABLE_ENTITY
    );
    assert_eq!(
        status_for(&FarmError::InvalidTransition {
            from: crate::farm::domain::CageStatus::Empty,
            to: crate::farm::domain::CageStatus::Active,
        }),
        StatusCode::CONFLICT
    );
    assert_eq!(
        status_for(&FarmError::not_found("cage", "cage-1")),
        StatusCode::NOT_FOUND
    );
}
