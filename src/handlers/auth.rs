use axum::{extract::State, http::StatusCode, Json};

use crate::{
    auth::{hash_password, tokens::TokenError, verify_password},
    error::AppError,
    middleware::AuthUser,
    models::user::{
        non_empty, AccessResponse, AuthResponse, CreateUser, LoginPayload, MessageResponse,
        ProfileResponse, RefreshPayload, User,
    },
    AppState,
};

/// A missing, non-JSON or mistyped body counts as one with every field absent,
/// so the presence checks below decide the response.
fn body_or_default<T: Default>(payload: Option<Json<T>>) -> T {
    payload.map(|Json(p)| p).unwrap_or_default()
}

pub async fn register(
    State(state): State<AppState>,
    payload: Option<Json<CreateUser>>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    let payload = body_or_default(payload);
    // Presence checks run before the existence check; the order decides which
    // message a malformed request gets.
    let username = non_empty(payload.username)
        .ok_or_else(|| AppError::Validation("Username is required.".into()))?;
    let password = non_empty(payload.password)
        .ok_or_else(|| AppError::Validation("Password is required.".into()))?;

    let existing = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE username = ?")
        .bind(&username)
        .fetch_one(&state.db)
        .await?;
    if existing > 0 {
        return Err(AppError::Validation("Username already exists".into()));
    }

    let password_hash = hash_password(&password).map_err(creation_failed)?;

    sqlx::query("INSERT INTO users (username, email, password_hash) VALUES (?, ?, ?)")
        .bind(&username)
        .bind(payload.email.unwrap_or_default())
        .bind(&password_hash)
        .execute(&state.db)
        .await
        .map_err(creation_failed)?;

    tracing::info!(username = %username, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "User created successfully".to_string(),
        }),
    ))
}

fn creation_failed(e: impl std::fmt::Display) -> AppError {
    AppError::Internal(format!(
        "An unexpected error occurred during user creation: {}",
        e
    ))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Option<Json<LoginPayload>>,
) -> Result<Json<AuthResponse>, AppError> {
    let payload = body_or_default(payload);
    let (username, password) = match (non_empty(payload.username), non_empty(payload.password)) {
        (Some(username), Some(password)) => (username, password),
        _ => {
            return Err(AppError::Validation(
                "Username and password are required.".into(),
            ))
        }
    };

    let invalid = || AppError::Auth("Invalid credentials".into());

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
        .bind(&username)
        .fetch_optional(&state.db)
        .await?
        .filter(|user| user.is_active)
        .ok_or_else(invalid)?;

    if !verify_password(&password, &user.password_hash)? {
        tracing::debug!(username = %username, "password mismatch");
        return Err(invalid());
    }

    let pair = state.tokens.issue_pair(&state.db, user.id).await?;

    Ok(Json(AuthResponse {
        access: pair.access,
        refresh: pair.refresh,
    }))
}

/// Blacklists the submitted refresh token. Every failure after authentication
/// is reported as a bare 400.
pub async fn logout(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Option<Json<RefreshPayload>>,
) -> Result<StatusCode, AppError> {
    let refresh = payload
        .and_then(|Json(p)| p.refresh)
        .ok_or(AppError::BadRequest)?;

    // TODO: surface TokenError::Storage as a 500 instead of folding it into the 400.
    state
        .tokens
        .blacklist(&state.db, &refresh)
        .await
        .map_err(|e| {
            tracing::warn!(user_id = user.id, "logout failed: {}", e);
            AppError::BadRequest
        })?;

    tracing::info!(username = %user.username, "user logged out");
    Ok(StatusCode::RESET_CONTENT)
}

pub async fn refresh(
    State(state): State<AppState>,
    payload: Option<Json<RefreshPayload>>,
) -> Result<Json<AccessResponse>, AppError> {
    let payload = body_or_default(payload);
    let token = non_empty(payload.refresh)
        .ok_or_else(|| AppError::Validation("Refresh token is required.".into()))?;

    match state.tokens.refresh_access(&state.db, &token).await {
        Ok(access) => Ok(Json(AccessResponse { access })),
        Err(TokenError::Blacklisted) => Err(AppError::Auth("Token is blacklisted".into())),
        Err(TokenError::Storage(e)) => Err(AppError::Sqlx(e)),
        Err(_) => Err(AppError::Auth("Token is invalid or expired".into())),
    }
}

pub async fn dashboard(user: AuthUser) -> Json<MessageResponse> {
    Json(MessageResponse {
        message: format!("Welcome {}!", user.username),
    })
}

pub async fn profile(user: AuthUser) -> Json<ProfileResponse> {
    Json(ProfileResponse {
        username: user.username,
        email: user.email,
        is_staff: user.is_staff,
    })
}
