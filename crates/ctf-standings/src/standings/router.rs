use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::command::StandingsService;
use super::coordinator::StandingsError;
use super::domain::{EventId, GroupId, Score};
use super::reporting::ExportError;
use super::store::{StandingsStore, StoreError};

#[derive(Debug, Deserialize)]
pub(crate) struct NewGroupRequest {
    pub(crate) description: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ScoreRequest {
    pub(crate) score: Score,
}

/// Router builder exposing the standings workflows and views over HTTP.
pub fn standings_router<S>(service: Arc<StandingsService<S>>) -> Router
where
    S: StandingsStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/groups",
            post(add_group_handler::<S>).get(leaderboard_handler::<S>),
        )
        .route(
            "/api/v1/groups/:group_id",
            get(group_handler::<S>).delete(remove_group_handler::<S>),
        )
        .route(
            "/api/v1/events/:event_id/groups/:group_id",
            put(report_score_handler::<S>).delete(withdraw_handler::<S>),
        )
        .route("/api/v1/events/:event_id", get(event_handler::<S>))
        .route("/api/v1/export.csv", get(export_handler::<S>))
        .with_state(service)
}

pub(crate) async fn add_group_handler<S>(
    State(service): State<Arc<StandingsService<S>>>,
    Json(request): Json<NewGroupRequest>,
) -> Response
where
    S: StandingsStore + 'static,
{
    let description = request.description.trim();
    if description.is_empty() {
        let payload = json!({ "error": "description must not be empty" });
        return (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response();
    }

    match service.coordinator().add_group(description) {
        Ok(group) => (StatusCode::CREATED, Json(group)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn leaderboard_handler<S>(
    State(service): State<Arc<StandingsService<S>>>,
) -> Response
where
    S: StandingsStore + 'static,
{
    match service.reporting().leaderboard() {
        Ok(board) => (StatusCode::OK, Json(board)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn group_handler<S>(
    State(service): State<Arc<StandingsService<S>>>,
    Path(group_id): Path<u32>,
) -> Response
where
    S: StandingsStore + 'static,
{
    match service.reporting().group_report(GroupId(group_id)) {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn remove_group_handler<S>(
    State(service): State<Arc<StandingsService<S>>>,
    Path(group_id): Path<u32>,
) -> Response
where
    S: StandingsStore + 'static,
{
    match service.coordinator().remove_group(GroupId(group_id)) {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn report_score_handler<S>(
    State(service): State<Arc<StandingsService<S>>>,
    Path((event_id, group_id)): Path<(u32, u32)>,
    Json(request): Json<ScoreRequest>,
) -> Response
where
    S: StandingsStore + 'static,
{
    match service
        .coordinator()
        .report_score(EventId(event_id), GroupId(group_id), request.score)
    {
        Ok(receipt) => (StatusCode::OK, Json(receipt)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn withdraw_handler<S>(
    State(service): State<Arc<StandingsService<S>>>,
    Path((event_id, group_id)): Path<(u32, u32)>,
) -> Response
where
    S: StandingsStore + 'static,
{
    match service
        .coordinator()
        .withdraw_participation(EventId(event_id), GroupId(group_id))
    {
        Ok(rankings) => (StatusCode::OK, Json(rankings)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn event_handler<S>(
    State(service): State<Arc<StandingsService<S>>>,
    Path(event_id): Path<u32>,
) -> Response
where
    S: StandingsStore + 'static,
{
    match service.reporting().event_standings(EventId(event_id)) {
        Ok(standings) => (StatusCode::OK, Json(standings)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn export_handler<S>(State(service): State<Arc<StandingsService<S>>>) -> Response
where
    S: StandingsStore + 'static,
{
    let mut buffer = Vec::new();
    match service.reporting().export_csv(&mut buffer) {
        Ok(()) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
            buffer,
        )
            .into_response(),
        Err(ExportError::Standings(err)) => error_response(err),
        Err(other) => {
            let payload = json!({ "error": other.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}

fn error_response(err: StandingsError) -> Response {
    let status = match &err {
        err if err.is_not_found() => StatusCode::NOT_FOUND,
        StandingsError::Store(StoreError::Conflict(_)) => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let payload = json!({ "error": err.to_string() });
    (status, Json(payload)).into_response()
}
