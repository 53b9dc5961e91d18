use std::sync::Arc;

use axum::{
    middleware,
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use serde::Serialize;
use validator::Validate;

use crate::{
    db::userdb::UserExt,
    dtos::{
        contractordtos::UpdateContractorProfileDto,
        jobdtos::ApiResponse,
        userdtos::{FilterUserDto, UpdateProfileDto, UserData, UserResponseDto},
    },
    error::{ErrorMessage, HttpError},
    middleware::{role_check, JWTAuthMiddeware},
    models::{
        appointmentmodel::AppointmentDetails,
        jobmodel::{BidListing, JobListing},
        usermodel::UserRole,
    },
    AppState,
};

const CONTRACTOR_DASHBOARD_LIMIT: i64 = 5;

pub fn users_handler() -> Router {
    Router::new()
        .route("/me", get(get_me).put(update_me))
        .route(
            "/me/contractor",
            get(get_contractor_profile)
                .put(update_contractor_profile)
                .layer(middleware::from_fn(|state, req, next| {
                    role_check(state, req, next, vec![UserRole::Contractor])
                })),
        )
        .route("/dashboard", get(get_dashboard))
}

#[derive(Debug, Serialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Dashboard {
    Customer {
        jobs: Vec<JobListing>,
        upcoming_appointments: Vec<AppointmentDetails>,
    },
    Contractor {
        active_jobs: Vec<JobListing>,
        recent_bids: Vec<BidListing>,
        upcoming_appointments: Vec<AppointmentDetails>,
    },
}

pub async fn get_me(
    Extension(_app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let filtered_user = FilterUserDto::filter_user(&user.user);

    Ok(Json(UserResponseDto {
        status: "success".to_string(),
        data: UserData { user: filtered_user },
    }))
}

pub async fn update_me(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<UpdateProfileDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let email = body.email.trim().to_lowercase();

    if email != user.user.email {
        let taken = app_state
            .db_client
            .get_user(None, Some(&email), None)
            .await
            .map_err(|e| HttpError::server_error(e.to_string()))?;

        if taken.is_some() {
            return Err(HttpError::unique_constraint_violation(
                ErrorMessage::EmailExist.to_string(),
            ));
        }
    }

    let full_name = body
        .full_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty());
    let avatar_url = body
        .avatar_url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty());

    let updated = app_state
        .db_client
        .update_profile(user.user.id, full_name, avatar_url, &email)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    tracing::info!("User {} updated their profile", updated.id);

    Ok(Json(UserResponseDto {
        status: "success".to_string(),
        data: UserData {
            user: FilterUserDto::filter_user(&updated),
        },
    }))
}

pub async fn get_contractor_profile(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let view = app_state
        .directory_service
        .get_contractor_profile(user.user.id)
        .await?;

    Ok(Json(ApiResponse::success("Contractor profile retrieved", view)))
}

pub async fn update_contractor_profile(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<UpdateContractorProfileDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let view = app_state
        .directory_service
        .update_contractor_profile(user.user.id, body)
        .await?;

    Ok(Json(ApiResponse::success("Contractor profile updated", view)))
}

pub async fn get_dashboard(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let user_id = user.user.id;

    let dashboard = match user.user.role {
        UserRole::Customer => Dashboard::Customer {
            jobs: app_state.job_service.customer_jobs(user_id).await?,
            upcoming_appointments: app_state.appointment_service.upcoming(user_id, None).await?,
        },
        UserRole::Contractor => Dashboard::Contractor {
            active_jobs: app_state.job_service.contractor_active_jobs(user_id).await?,
            recent_bids: app_state
                .job_service
                .contractor_recent_bids(user_id, CONTRACTOR_DASHBOARD_LIMIT)
                .await?,
            upcoming_appointments: app_state
                .appointment_service
                .upcoming(user_id, Some(CONTRACTOR_DASHBOARD_LIMIT))
                .await?,
        },
    };

    Ok(Json(ApiResponse::success("Dashboard retrieved", dashboard)))
}
