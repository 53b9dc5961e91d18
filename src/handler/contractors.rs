use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::{
        contractordtos::{ContractorSearchQuery, CreateReviewDto},
        jobdtos::ApiResponse,
    },
    error::HttpError,
    middleware::{auth, role_check, JWTAuthMiddeware},
    models::usermodel::UserRole,
    service::directory_service::ContractorFilter,
    AppState,
};

/// Browsing is public; only leaving a review needs a signed-in customer.
pub fn contractors_handler() -> Router {
    Router::new()
        .route("/", get(search_contractors))
        .route("/:id/reviews", get(get_contractor_reviews))
        .route(
            "/:id/reviews",
            post(create_review)
                .layer(middleware::from_fn(|state, req, next| {
                    role_check(state, req, next, vec![UserRole::Customer])
                }))
                .layer(middleware::from_fn(auth)),
        )
}

pub fn services_handler() -> Router {
    Router::new().route("/", get(list_services))
}

pub async fn search_contractors(
    Query(query_params): Query<ContractorSearchQuery>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let filter = ContractorFilter::from_query(&query_params)?;
    let contractors = app_state.directory_service.search(&filter).await?;

    Ok(Json(ApiResponse::success("Contractors retrieved", contractors)))
}

pub async fn get_contractor_reviews(
    Path(contractor_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let reviews = app_state
        .directory_service
        .contractor_reviews(contractor_id)
        .await?;

    Ok(Json(ApiResponse::success("Reviews retrieved", reviews)))
}

pub async fn create_review(
    Path(contractor_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreateReviewDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let review = app_state
        .directory_service
        .create_review(user.user.id, contractor_id, body)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Review submitted", review)),
    ))
}

pub async fn list_services(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let services = app_state.directory_service.list_services().await?;

    Ok(Json(ApiResponse::success("Services retrieved", services)))
}
