use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use super::access::{AccessError, Actor};
use super::domain::{CageId, CompanyId, CompanyStatus, StockingId, UserId};
use super::repository::FarmRepository;
use super::requests::{
    ActiveChange, CageQuery, CageStatusChange, CageUpdate, CompanyRegistration,
    DailyRecordInput, HarvestInput, NewCage, NewUser, Rejection, RoleChange, SampleInput,
    StockingRequest,
};
use super::service::{FarmError, FarmService};

/// Header carrying the caller's user id.
pub const USER_HEADER: &str = "x-user-id";

type SharedService<R> = State<Arc<FarmService<R>>>;

/// Router builder exposing the farm API.
pub fn farm_router<R>(service: Arc<FarmService<R>>) -> Router
where
    R: FarmRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/companies",
            post(register_company_handler::<R>).get(list_companies_handler::<R>),
        )
        .route(
            "/api/v1/companies/:company_id/approve",
            post(approve_company_handler::<R>),
        )
        .route(
            "/api/v1/companies/:company_id/reject",
            post(reject_company_handler::<R>),
        )
        .route(
            "/api/v1/users",
            get(list_users_handler::<R>).post(create_user_handler::<R>),
        )
        .route("/api/v1/users/:user_id/role", post(update_role_handler::<R>))
        .route(
            "/api/v1/users/:user_id/active",
            post(set_active_handler::<R>),
        )
        .route(
            "/api/v1/cages",
            get(list_cages_handler::<R>).post(create_cage_handler::<R>),
        )
        .route(
            "/api/v1/cages/:cage_id",
            get(get_cage_handler::<R>)
                .patch(update_cage_handler::<R>)
                .delete(remove_cage_handler::<R>),
        )
        .route(
            "/api/v1/cages/:cage_id/status",
            post(change_status_handler::<R>),
        )
        .route(
            "/api/v1/cages/:cage_id/overview",
            get(cage_overview_handler::<R>),
        )
        .route(
            "/api/v1/cages/:cage_id/stockings",
            get(stocking_history_handler::<R>).post(request_stocking_handler::<R>),
        )
        .route(
            "/api/v1/cages/:cage_id/top-ups",
            post(request_top_up_handler::<R>),
        )
        .route("/api/v1/approvals", get(pending_approvals_handler::<R>))
        .route(
            "/api/v1/approvals/:stocking_id/approve",
            post(approve_stocking_handler::<R>),
        )
        .route(
            "/api/v1/approvals/:stocking_id/reject",
            post(reject_stocking_handler::<R>),
        )
        .route(
            "/api/v1/cages/:cage_id/daily-records",
            get(daily_records_handler::<R>).post(record_daily_handler::<R>),
        )
        .route(
            "/api/v1/cages/:cage_id/daily-records/export",
            get(export_daily_handler::<R>),
        )
        .route(
            "/api/v1/cages/:cage_id/daily-records/import",
            post(import_daily_handler::<R>),
        )
        .route(
            "/api/v1/cages/:cage_id/samples",
            get(samples_handler::<R>).post(record_sample_handler::<R>),
        )
        .route(
            "/api/v1/cages/:cage_id/harvests",
            get(harvests_handler::<R>).post(record_harvest_handler::<R>),
        )
        .route("/api/v1/dashboard", get(dashboard_handler::<R>))
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ReportQuery {
    #[serde(default)]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CompanyFilter {
    #[serde(default)]
    pub(crate) status: Option<CompanyStatus>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct UserFilter {
    #[serde(default)]
    pub(crate) company_id: Option<CompanyId>,
}

fn authenticate<R>(service: &FarmService<R>, headers: &HeaderMap) -> Result<Actor, FarmError>
where
    R: FarmRepository + 'static,
{
    let user_id = headers
        .get(USER_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(AccessError::Unauthenticated)?;
    service.authenticate(&UserId::from(user_id))
}

pub(crate) fn status_for(error: &FarmError) -> StatusCode {
    match error {
        FarmError::Access(AccessError::Unauthenticated) => StatusCode::UNAUTHORIZED,
        FarmError::Access(_) => StatusCode::FORBIDDEN,
        FarmError::NotFound { .. } => StatusCode::NOT_FOUND,
        FarmError::Conflict(_) | FarmError::InvalidTransition { .. } => StatusCode::CONFLICT,
        FarmError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        FarmError::FeedLog(_) => StatusCode::BAD_REQUEST,
        FarmError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(error: FarmError) -> Response {
    let status = status_for(&error);
    if status.is_server_error() {
        warn!(%error, "farm request failed");
    }
    let payload = json!({ "error": error.to_string() });
    (status, Json(payload)).into_response()
}

fn respond<T: Serialize>(status: StatusCode, result: Result<T, FarmError>) -> Response {
    match result {
        Ok(body) => (status, Json(body)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn register_company_handler<R>(
    State(service): SharedService<R>,
    Json(registration): Json<CompanyRegistration>,
) -> Response
where
    R: FarmRepository + 'static,
{
    respond(StatusCode::CREATED, service.register_company(registration))
}

pub(crate) async fn list_companies_handler<R>(
    State(service): SharedService<R>,
    headers: HeaderMap,
    Query(filter): Query<CompanyFilter>,
) -> Response
where
    R: FarmRepository + 'static,
{
    let result = authenticate(&service, &headers)
        .and_then(|actor| service.list_companies(&actor, filter.status));
    respond(StatusCode::OK, result)
}

pub(crate) async fn approve_company_handler<R>(
    State(service): SharedService<R>,
    headers: HeaderMap,
    Path(company_id): Path<String>,
) -> Response
where
    R: FarmRepository + 'static,
{
    let result = authenticate(&service, &headers)
        .and_then(|actor| service.approve_company(&actor, &CompanyId(company_id)));
    respond(StatusCode::OK, result)
}

pub(crate) async fn reject_company_handler<R>(
    State(service): SharedService<R>,
    headers: HeaderMap,
    Path(company_id): Path<String>,
    Json(rejection): Json<Rejection>,
) -> Response
where
    R: FarmRepository + 'static,
{
    let result = authenticate(&service, &headers).and_then(|actor| {
        service.reject_company(&actor, &CompanyId(company_id), &rejection.reason)
    });
    respond(StatusCode::OK, result)
}

pub(crate) async fn list_users_handler<R>(
    State(service): SharedService<R>,
    headers: HeaderMap,
    Query(filter): Query<UserFilter>,
) -> Response
where
    R: FarmRepository + 'static,
{
    let result = authenticate(&service, &headers)
        .and_then(|actor| service.list_users(&actor, filter.company_id.as_ref()));
    respond(StatusCode::OK, result)
}

pub(crate) async fn create_user_handler<R>(
    State(service): SharedService<R>,
    headers: HeaderMap,
    Json(request): Json<NewUser>,
) -> Response
where
    R: FarmRepository + 'static,
{
    let result =
        authenticate(&service, &headers).and_then(|actor| service.create_user(&actor, request));
    respond(StatusCode::CREATED, result)
}

pub(crate) async fn update_role_handler<R>(
    State(service): SharedService<R>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
    Json(change): Json<RoleChange>,
) -> Response
where
    R: FarmRepository + 'static,
{
    let result = authenticate(&service, &headers)
        .and_then(|actor| service.update_role(&actor, &UserId(user_id), change.role));
    respond(StatusCode::OK, result)
}

pub(crate) async fn set_active_handler<R>(
    State(service): SharedService<R>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
    Json(change): Json<ActiveChange>,
) -> Response
where
    R: FarmRepository + 'static,
{
    let result = authenticate(&service, &headers)
        .and_then(|actor| service.set_active(&actor, &UserId(user_id), change.active));
    respond(StatusCode::OK, result)
}

pub(crate) async fn list_cages_handler<R>(
    State(service): SharedService<R>,
    headers: HeaderMap,
    Query(query): Query<CageQuery>,
) -> Response
where
    R: FarmRepository + 'static,
{
    let result =
        authenticate(&service, &headers).and_then(|actor| service.list_cages(&actor, &query));
    respond(StatusCode::OK, result)
}

pub(crate) async fn create_cage_handler<R>(
    State(service): SharedService<R>,
    headers: HeaderMap,
    Json(request): Json<NewCage>,
) -> Response
where
    R: FarmRepository + 'static,
{
    let result =
        authenticate(&service, &headers).and_then(|actor| service.create_cage(&actor, request));
    respond(StatusCode::CREATED, result)
}

pub(crate) async fn get_cage_handler<R>(
    State(service): SharedService<R>,
    headers: HeaderMap,
    Path(cage_id): Path<String>,
) -> Response
where
    R: FarmRepository + 'static,
{
    let result = authenticate(&service, &headers)
        .and_then(|actor| service.get_cage(&actor, &CageId(cage_id)));
    respond(StatusCode::OK, result)
}

pub(crate) async fn update_cage_handler<R>(
    State(service): SharedService<R>,
    headers: HeaderMap,
    Path(cage_id): Path<String>,
    Json(update): Json<CageUpdate>,
) -> Response
where
    R: FarmRepository + 'static,
{
    let result = authenticate(&service, &headers)
        .and_then(|actor| service.update_cage(&actor, &CageId(cage_id), update));
    respond(StatusCode::OK, result)
}

pub(crate) async fn remove_cage_handler<R>(
    State(service): SharedService<R>,
    headers: HeaderMap,
    Path(cage_id): Path<String>,
) -> Response
where
    R: FarmRepository + 'static,
{
    let result = authenticate(&service, &headers)
        .and_then(|actor| service.remove_cage(&actor, &CageId(cage_id)));
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn change_status_handler<R>(
    State(service): SharedService<R>,
    headers: HeaderMap,
    Path(cage_id): Path<String>,
    Json(change): Json<CageStatusChange>,
) -> Response
where
    R: FarmRepository + 'static,
{
    let result = authenticate(&service, &headers)
        .and_then(|actor| service.change_cage_status(&actor, &CageId(cage_id), change.status));
    respond(StatusCode::OK, result)
}

pub(crate) async fn cage_overview_handler<R>(
    State(service): SharedService<R>,
    headers: HeaderMap,
    Path(cage_id): Path<String>,
    Query(query): Query<ReportQuery>,
) -> Response
where
    R: FarmRepository + 'static,
{
    let result = authenticate(&service, &headers)
        .and_then(|actor| service.cage_overview(&actor, &CageId(cage_id), query.today));
    respond(StatusCode::OK, result)
}

pub(crate) async fn stocking_history_handler<R>(
    State(service): SharedService<R>,
    headers: HeaderMap,
    Path(cage_id): Path<String>,
) -> Response
where
    R: FarmRepository + 'static,
{
    let result = authenticate(&service, &headers)
        .and_then(|actor| service.stocking_history(&actor, &CageId(cage_id)));
    respond(StatusCode::OK, result)
}

pub(crate) async fn request_stocking_handler<R>(
    State(service): SharedService<R>,
    headers: HeaderMap,
    Path(cage_id): Path<String>,
    Json(request): Json<StockingRequest>,
) -> Response
where
    R: FarmRepository + 'static,
{
    let result = authenticate(&service, &headers)
        .and_then(|actor| service.request_stocking(&actor, &CageId(cage_id), request));
    respond(StatusCode::ACCEPTED, result)
}

pub(crate) async fn request_top_up_handler<R>(
    State(service): SharedService<R>,
    headers: HeaderMap,
    Path(cage_id): Path<String>,
    Json(request): Json<StockingRequest>,
) -> Response
where
    R: FarmRepository + 'static,
{
    let result = authenticate(&service, &headers)
        .and_then(|actor| service.request_top_up(&actor, &CageId(cage_id), request));
    respond(StatusCode::ACCEPTED, result)
}

pub(crate) async fn pending_approvals_handler<R>(
    State(service): SharedService<R>,
    headers: HeaderMap,
) -> Response
where
    R: FarmRepository + 'static,
{
    let result =
        authenticate(&service, &headers).and_then(|actor| service.pending_approvals(&actor));
    respond(StatusCode::OK, result)
}

pub(crate) async fn approve_stocking_handler<R>(
    State(service): SharedService<R>,
    headers: HeaderMap,
    Path(stocking_id): Path<String>,
) -> Response
where
    R: FarmRepository + 'static,
{
    let result = authenticate(&service, &headers)
        .and_then(|actor| service.approve_stocking(&actor, &StockingId(stocking_id)));
    respond(StatusCode::OK, result)
}

pub(crate) async fn reject_stocking_handler<R>(
    State(service): SharedService<R>,
    headers: HeaderMap,
    Path(stocking_id): Path<String>,
    Json(rejection): Json<Rejection>,
) -> Response
where
    R: FarmRepository + 'static,
{
    let result = authenticate(&service, &headers).and_then(|actor| {
        service.reject_stocking(&actor, &StockingId(stocking_id), &rejection.reason)
    });
    respond(StatusCode::OK, result)
}

pub(crate) async fn daily_records_handler<R>(
    State(service): SharedService<R>,
    headers: HeaderMap,
    Path(cage_id): Path<String>,
) -> Response
where
    R: FarmRepository + 'static,
{
    let result = authenticate(&service, &headers)
        .and_then(|actor| service.daily_records(&actor, &CageId(cage_id)));
    respond(StatusCode::OK, result)
}

pub(crate) async fn record_daily_handler<R>(
    State(service): SharedService<R>,
    headers: HeaderMap,
    Path(cage_id): Path<String>,
    Json(input): Json<DailyRecordInput>,
) -> Response
where
    R: FarmRepository + 'static,
{
    let result = authenticate(&service, &headers)
        .and_then(|actor| service.record_daily(&actor, &CageId(cage_id), input));
    respond(StatusCode::CREATED, result)
}

pub(crate) async fn export_daily_handler<R>(
    State(service): SharedService<R>,
    headers: HeaderMap,
    Path(cage_id): Path<String>,
) -> Response
where
    R: FarmRepository + 'static,
{
    let result = authenticate(&service, &headers)
        .and_then(|actor| service.export_daily_csv(&actor, &CageId(cage_id)));
    match result {
        Ok(csv) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
            csv,
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn import_daily_handler<R>(
    State(service): SharedService<R>,
    headers: HeaderMap,
    Path(cage_id): Path<String>,
    body: String,
) -> Response
where
    R: FarmRepository + 'static,
{
    let result = authenticate(&service, &headers).and_then(|actor| {
        service.import_daily_csv(&actor, &CageId(cage_id), body.as_bytes())
    });
    respond(StatusCode::OK, result)
}

pub(crate) async fn samples_handler<R>(
    State(service): SharedService<R>,
    headers: HeaderMap,
    Path(cage_id): Path<String>,
) -> Response
where
    R: FarmRepository + 'static,
{
    let result = authenticate(&service, &headers)
        .and_then(|actor| service.growth_samples(&actor, &CageId(cage_id)));
    respond(StatusCode::OK, result)
}

pub(crate) async fn record_sample_handler<R>(
    State(service): SharedService<R>,
    headers: HeaderMap,
    Path(cage_id): Path<String>,
    Json(input): Json<SampleInput>,
) -> Response
where
    R: FarmRepository + 'static,
{
    let result = authenticate(&service, &headers)
        .and_then(|actor| service.record_sample(&actor, &CageId(cage_id), input));
    respond(StatusCode::CREATED, result)
}

pub(crate) async fn harvests_handler<R>(
    State(service): SharedService<R>,
    headers: HeaderMap,
    Path(cage_id): Path<String>,
) -> Response
where
    R: FarmRepository + 'static,
{
    let result = authenticate(&service, &headers)
        .and_then(|actor| service.harvests(&actor, &CageId(cage_id)));
    respond(StatusCode::OK, result)
}

pub(crate) async fn record_harvest_handler<R>(
    State(service): SharedService<R>,
    headers: HeaderMap,
    Path(cage_id): Path<String>,
    Json(input): Json<HarvestInput>,
) -> Response
where
    R: FarmRepository + 'static,
{
    let result = authenticate(&service, &headers)
        .and_then(|actor| service.record_harvest(&actor, &CageId(cage_id), input));
    respond(StatusCode::CREATED, result)
}

pub(crate) async fn dashboard_handler<R>(
    State(service): SharedService<R>,
    headers: HeaderMap,
    Query(query): Query<ReportQuery>,
) -> Response
where
    R: FarmRepository + 'static,
{
    let result = authenticate(&service, &headers)
        .and_then(|actor| service.dashboard(&actor, query.today));
    respond(StatusCode::OK, result)
}
