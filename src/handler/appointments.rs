use std::sync::Arc;

use axum::{
    extract::Path,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::{
        appointmentdtos::{CreateAppointmentDto, UpdateAppointmentStatusDto},
        jobdtos::ApiResponse,
    },
    error::HttpError,
    middleware::{role_check, JWTAuthMiddeware},
    models::usermodel::UserRole,
    AppState,
};

pub fn appointments_handler() -> Router {
    Router::new()
        .route("/", get(list_appointments))
        .route(
            "/",
            post(create_appointment).layer(middleware::from_fn(|state, req, next| {
                role_check(state, req, next, vec![UserRole::Customer])
            })),
        )
        .route("/:id/status", put(update_appointment_status))
}

pub async fn list_appointments(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let appointments = app_state.appointment_service.list_for(user.user.id).await?;

    Ok(Json(ApiResponse::success("Appointments retrieved", appointments)))
}

pub async fn create_appointment(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreateAppointmentDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let appointment = app_state
        .appointment_service
        .schedule(user.user.id, body)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Appointment scheduled", appointment)),
    ))
}

/// Either party may complete or cancel.
pub async fn update_appointment_status(
    Path(appointment_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<UpdateAppointmentStatusDto>,
) -> Result<impl IntoResponse, HttpError> {
    let appointment = app_state
        .appointment_service
        .update_status(appointment_id, user.user.id, body.status)
        .await?;

    Ok(Json(ApiResponse::success("Appointment updated", appointment)))
}
