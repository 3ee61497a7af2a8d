use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use crate::{
    error::AppError,
    models::user::{TokenType, User},
    AppState,
};

/// Identity resolved from a Bearer access token. Handlers that take this as an
/// argument are only reached by authenticated callers.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub is_staff: bool,
}

impl From<User> for AuthUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            is_staff: user.is_staff,
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;

        let claims = state
            .tokens
            .decode(token, TokenType::Access)
            .map_err(|e| {
                tracing::debug!("rejected access token: {}", e);
                AppError::Auth("Given token not valid for any token type".into())
            })?;

        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(claims.user_id)
            .fetch_optional(&state.db)
            .await?
            .ok_or_else(|| AppError::Auth("User not found".into()))?;

        if !user.is_active {
            return Err(AppError::Auth("User is inactive".into()));
        }

        Ok(user.into())
    }
}

fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let not_provided = || AppError::Auth("Authentication credentials were not provided.".into());

    let value = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(not_provided)?;

    let mut words = value.split_whitespace();
    match (words.next(), words.next(), words.next()) {
        (Some("Bearer"), Some(token), None) => Ok(token),
        (Some("Bearer"), None, _) => Err(AppError::Auth(
            "Invalid Authorization header. No credentials provided.".into(),
        )),
        (Some("Bearer"), Some(_), Some(_)) => Err(AppError::Auth(
            "Invalid Authorization header. Credentials string should not contain spaces.".into(),
        )),
        _ => Err(not_provided()),
    }
}
