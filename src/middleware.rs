use std::sync::Arc;

use axum::{
    extract::Request,
    http::{header, HeaderMap},
    middleware::Next,
    response::IntoResponse,
    Extension,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};

use crate::{
    db::{cache::TokenBlacklist, userdb::UserExt},
    error::{ErrorMessage, HttpError},
    models::usermodel::{User, UserRole},
    utils::token::{self, TokenClaims},
    AppState,
};

/// Authenticated principal for the current request.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JWTAuthMiddeware {
    pub user: User,
    #[serde(skip_serializing)]
    pub token: String,
    pub claims: TokenClaims,
}

/// The `token` cookie wins over an `Authorization: Bearer` header.
pub fn extract_token(cookie_jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    cookie_jar
        .get("token")
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
        .or_else(|| {
            headers
                .get(header::AUTHORIZATION)
                .and_then(|auth_header| auth_header.to_str().ok())
                .and_then(|auth_value| auth_value.strip_prefix("Bearer "))
                .map(|token| token.trim().to_owned())
                .filter(|token| !token.is_empty())
        })
}

/// A missing user means the token outlived its account; a failed lookup is ours.
fn resolve_user(lookup: Result<Option<User>, sqlx::Error>) -> Result<User, HttpError> {
    match lookup {
        Ok(Some(user)) => Ok(user),
        Ok(None) => Err(HttpError::unauthorized(
            ErrorMessage::UserNoLongerExist.to_string(),
        )),
        Err(e) => {
            tracing::error!("Failed to load authenticated user: {}", e);
            Err(HttpError::server_error(ErrorMessage::ServerError.to_string()))
        }
    }
}

pub async fn auth(
    cookie_jar: CookieJar,
    Extension(app_state): Extension<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, HttpError> {
    let token = extract_token(&cookie_jar, req.headers())
        .ok_or_else(|| HttpError::unauthorized(ErrorMessage::TokenNotProvided.to_string()))?;

    let claims = token::decode_token(token.clone(), app_state.env.jwt_secret.as_bytes())
        .map_err(|_| HttpError::unauthorized(ErrorMessage::InvalidToken.to_string()))?;

    if let Some(redis_client) = &app_state.db_client.redis_client {
        match TokenBlacklist::is_revoked(redis_client, &token).await {
            Ok(true) => {
                return Err(HttpError::unauthorized(ErrorMessage::TokenRevoked.to_string()));
            }
            Ok(false) => {}
            Err(e) => {
                tracing::warn!("Token blacklist lookup failed: {}", e);
            }
        }
    }

    let user_id = uuid::Uuid::parse_str(&claims.sub)
        .map_err(|_| HttpError::unauthorized(ErrorMessage::InvalidToken.to_string()))?;

    let user = resolve_user(app_state.db_client.get_user(Some(user_id), None, None).await)?;

    req.extensions_mut().insert(JWTAuthMiddeware { user, token, claims });

    Ok(next.run(req).await)
}

pub async fn role_check(
    Extension(_app_state): Extension<Arc<AppState>>,
    req: Request,
    next: Next,
    required_roles: Vec<UserRole>,
) -> Result<impl IntoResponse, HttpError> {
    let user = req
        .extensions()
        .get::<JWTAuthMiddeware>()
        .ok_or_else(|| HttpError::unauthorized(ErrorMessage::UserNotAuthenticated.to_string()))?;

    if !required_roles.contains(&user.user.role) {
        return Err(HttpError::forbidden(ErrorMessage::PermissionDenied.to_string()));
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use axum_extra::extract::cookie::Cookie;

    #[test]
    fn test_bearer_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(extract_token(&CookieJar::new(), &headers).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_cookie_wins_over_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        let jar = CookieJar::new().add(Cookie::new("token", "from-cookie"));
        assert_eq!(extract_token(&jar, &headers).as_deref(), Some("from-cookie"));
    }

    #[test]
    fn test_user_lookup_failure_is_server_error() {
        let err = resolve_user(Err(sqlx::Error::PoolTimedOut)).unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, ErrorMessage::ServerError.to_string());

        let err = resolve_user(Ok(None)).unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::UNAUTHORIZED);
        assert_eq!(err.message, ErrorMessage::UserNoLongerExist.to_string());
    }

    #[test]
    fn test_missing_or_malformed() {
        let mut headers = HeaderMap::new();
        assert!(extract_token(&CookieJar::new(), &headers).is_none());
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert!(extract_token(&CookieJar::new(), &headers).is_none());
    }
}
