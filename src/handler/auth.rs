use std::sync::Arc;

use axum::{
    extract::Query,
    http::{header, HeaderValue},
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::Cookie;
use chrono::{Duration, Utc};
use validator::Validate;

use crate::{
    db::{cache::TokenBlacklist, userdb::UserExt},
    dtos::userdtos::{
        FilterUserDto, LoginUserDto, RegisterUserDto, Response, UserData, UserLoginResponseDto,
        UserResponseDto, VerifyEmailQueryDto,
    },
    error::{ErrorMessage, HttpError},
    mail::mails::{send_verification_email, send_welcome_email},
    middleware::{auth, JWTAuthMiddeware},
    utils::{password, token, token_generator::generate_verification_token},
    AppState,
};

pub fn auth_handler() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/verify", get(verify_email))
        .route("/logout", post(logout).layer(middleware::from_fn(auth)))
}

fn token_cookie(value: String, max_age: time::Duration) -> Result<HeaderValue, HttpError> {
    let cookie = Cookie::build(("token", value))
        .path("/")
        .max_age(max_age)
        .http_only(true)
        .build();

    cookie
        .to_string()
        .parse()
        .map_err(|_| HttpError::server_error(ErrorMessage::ServerError.to_string()))
}

pub async fn register(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<RegisterUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let email = body.email.trim().to_lowercase();

    let existing_user = app_state
        .db_client
        .get_user(None, Some(&email), None)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    if existing_user.is_some() {
        return Err(HttpError::unique_constraint_violation(
            ErrorMessage::EmailExist.to_string(),
        ));
    }

    let hashed_password =
        password::hash(&body.password).map_err(|e| HttpError::bad_request(e.to_string()))?;

    let verification_token = generate_verification_token();
    let token_expires_at = Utc::now() + Duration::hours(24);
    let full_name = body
        .full_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty());

    let user = app_state
        .db_client
        .save_user(
            full_name,
            &email,
            &hashed_password,
            body.role,
            &verification_token,
            token_expires_at,
        )
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    // Registration stands even if the mail provider is down.
    if let Err(e) =
        send_verification_email(&app_state.env, &user.email, &user.display_name(), &verification_token)
            .await
    {
        tracing::warn!("Failed to send verification email to {}: {}", user.email, e);
    }

    tracing::info!("Registered {} account {}", user.role.to_str(), user.id);

    Ok((
        axum::http::StatusCode::CREATED,
        Json(UserResponseDto {
            status: "success".to_string(),
            data: UserData {
                user: FilterUserDto::filter_user(&user),
            },
        }),
    ))
}

pub async fn login(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<LoginUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let user = app_state
        .db_client
        .get_user(None, Some(body.email.trim()), None)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::unauthorized(ErrorMessage::WrongCredentials.to_string()))?;

    let password_matched = password::compare(&body.password, &user.password)
        .map_err(|_| HttpError::unauthorized(ErrorMessage::WrongCredentials.to_string()))?;

    if !password_matched {
        return Err(HttpError::unauthorized(ErrorMessage::WrongCredentials.to_string()));
    }

    if !user.verified {
        return Err(HttpError::forbidden(ErrorMessage::EmailNotVerified.to_string()));
    }

    let token = token::create_token(
        &user.id.to_string(),
        app_state.env.jwt_secret.as_bytes(),
        app_state.env.jwt_maxage,
    )
    .map_err(|e| HttpError::server_error(e.to_string()))?;

    let cookie = token_cookie(token.clone(), time::Duration::minutes(app_state.env.jwt_maxage))?;

    let mut response = Json(UserLoginResponseDto {
        status: "success".to_string(),
        token,
    })
    .into_response();
    response.headers_mut().append(header::SET_COOKIE, cookie);

    Ok(response)
}

pub async fn verify_email(
    Query(query_params): Query<VerifyEmailQueryDto>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    query_params
        .validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let user = app_state
        .db_client
        .get_user(None, None, Some(&query_params.token))
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::unauthorized(ErrorMessage::InvalidToken.to_string()))?;

    match user.token_expires_at {
        Some(expires_at) if Utc::now() > expires_at => {
            return Err(HttpError::bad_request("Verification token has expired"));
        }
        Some(_) => {}
        None => return Err(HttpError::bad_request("Invalid verification token")),
    }

    app_state
        .db_client
        .verify_email_token(&query_params.token)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    if let Err(e) = send_welcome_email(&app_state.env, &user.email, &user.display_name()).await {
        tracing::warn!("Failed to send welcome email to {}: {}", user.email, e);
    }

    Ok(Json(Response {
        status: "success",
        message: "Email verified successfully. You can now sign in.".to_string(),
    }))
}

pub async fn logout(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(session): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    if let Some(redis_client) = &app_state.db_client.redis_client {
        if let Err(e) = TokenBlacklist::revoke(
            redis_client,
            &session.token,
            session.claims.remaining_seconds(),
        )
        .await
        {
            tracing::warn!("Failed to revoke token for user {}: {}", session.user.id, e);
        }
    }

    let cookie = token_cookie(String::new(), time::Duration::ZERO)?;

    let mut response = Json(Response {
        status: "success",
        message: "Logged out".to_string(),
    })
    .into_response();
    response.headers_mut().append(header::SET_COOKIE, cookie);

    Ok(response)
}
