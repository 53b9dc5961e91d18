use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::Serialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::jobdtos::{ApiResponse, CreateJobDto, JobSearchQuery, SubmitBidDto},
    error::HttpError,
    middleware::{role_check, JWTAuthMiddeware},
    models::{
        jobmodel::{Bid, Job},
        usermodel::UserRole,
    },
    service::job_service::JobFilter,
    AppState,
};

pub fn jobs_handler() -> Router {
    Router::new()
        .route("/", get(list_jobs))
        .route(
            "/",
            post(create_job).layer(middleware::from_fn(|state, req, next| {
                role_check(state, req, next, vec![UserRole::Customer])
            })),
        )
        .route("/:id", get(get_job))
        .route(
            "/:id/complete",
            put(complete_job).layer(middleware::from_fn(|state, req, next| {
                role_check(state, req, next, vec![UserRole::Customer])
            })),
        )
        .route(
            "/:id/cancel",
            put(cancel_job).layer(middleware::from_fn(|state, req, next| {
                role_check(state, req, next, vec![UserRole::Customer])
            })),
        )
        .route("/:id/bids", get(list_bids))
        .route(
            "/:id/bids",
            post(submit_bid).layer(middleware::from_fn(|state, req, next| {
                role_check(state, req, next, vec![UserRole::Contractor])
            })),
        )
        .route(
            "/:id/bids/:bid_id/accept",
            put(accept_bid).layer(middleware::from_fn(|state, req, next| {
                role_check(state, req, next, vec![UserRole::Customer])
            })),
        )
}

pub fn bids_handler() -> Router {
    Router::new().route(
        "/:bid_id/reject",
        put(reject_bid).layer(middleware::from_fn(|state, req, next| {
            role_check(state, req, next, vec![UserRole::Customer])
        })),
    )
}

#[derive(Debug, Serialize)]
pub struct BidAcceptance {
    pub job: Job,
    pub bid: Bid,
}

pub async fn list_jobs(
    Query(query_params): Query<JobSearchQuery>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let filter = JobFilter::from_query(&query_params)?;
    let jobs = app_state.job_service.list_jobs(&filter).await?;

    Ok(Json(ApiResponse::success("Jobs retrieved", jobs)))
}

pub async fn create_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreateJobDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let job = app_state.job_service.create_job(user.user.id, body).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Job posted", job)),
    ))
}

pub async fn get_job(
    Path(job_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let details = app_state
        .job_service
        .get_job_details(job_id, &user.user)
        .await?;

    Ok(Json(ApiResponse::success("Job retrieved", details)))
}

pub async fn complete_job(
    Path(job_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let job = app_state.job_service.complete_job(job_id, user.user.id).await?;

    Ok(Json(ApiResponse::success("Job marked as completed", job)))
}

pub async fn cancel_job(
    Path(job_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let job = app_state.job_service.cancel_job(job_id, user.user.id).await?;

    Ok(Json(ApiResponse::success("Job cancelled", job)))
}

pub async fn list_bids(
    Path(job_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let bids = app_state.job_service.list_bids(job_id, &user.user).await?;

    Ok(Json(ApiResponse::success("Bids retrieved", bids)))
}

pub async fn submit_bid(
    Path(job_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<SubmitBidDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let bid = app_state
        .job_service
        .submit_bid(job_id, user.user.id, body)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Bid submitted", bid)),
    ))
}

pub async fn accept_bid(
    Path((job_id, bid_id)): Path<(Uuid, Uuid)>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let (job, bid) = app_state
        .job_service
        .accept_bid(job_id, bid_id, user.user.id)
        .await?;

    Ok(Json(ApiResponse::success(
        "Bid accepted",
        BidAcceptance { job, bid },
    )))
}

pub async fn reject_bid(
    Path(bid_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let bid = app_state.job_service.reject_bid(bid_id, user.user.id).await?;

    Ok(Json(ApiResponse::success("Bid rejected", bid)))
}
