//! Signed access/refresh tokens and the refresh-token blacklist.
//!
//! A login produces a refresh token, recorded in `outstanding_tokens`, and an
//! access token derived from it. Access tokens are never revoked and simply
//! expire. Refresh tokens can be blacklisted, after which they no longer
//! authenticate a refresh.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sqlx::SqlitePool;

use crate::models::user::{Claims, TokenType};

#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

#[derive(Debug)]
pub enum TokenError {
    /// Bad signature, malformed, or expired.
    Invalid(jsonwebtoken::errors::Error),
    WrongType,
    Blacklisted,
    Storage(sqlx::Error),
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenError::Invalid(e) => write!(f, "invalid token: {}", e),
            TokenError::WrongType => f.write_str("wrong token type"),
            TokenError::Blacklisted => f.write_str("token is blacklisted"),
            TokenError::Storage(e) => write!(f, "token storage error: {}", e),
        }
    }
}

impl std::error::Error for TokenError {}

impl From<sqlx::Error> for TokenError {
    fn from(inner: sqlx::Error) -> Self {
        TokenError::Storage(inner)
    }
}

#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

impl TokenService {
    pub fn new(secret: &str, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl,
            refresh_ttl,
        }
    }

    fn claims(&self, token_type: TokenType, user_id: i64) -> Claims {
        let now = Utc::now();
        let ttl = match token_type {
            TokenType::Access => self.access_ttl,
            TokenType::Refresh => self.refresh_ttl,
        };
        Claims {
            token_type,
            user_id,
            jti: uuid::Uuid::new_v4().simple().to_string(),
            iat: now.timestamp() as usize,
            exp: (now + ttl).timestamp() as usize,
        }
    }

    fn sign(&self, claims: &Claims) -> Result<String, jsonwebtoken::errors::Error> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
    }

    /// Decodes and validates a token of the given type. Does not consult the blacklist.
    pub fn decode(&self, token: &str, expected: TokenType) -> Result<Claims, TokenError> {
        let validation = Validation::new(Algorithm::HS256);
        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(TokenError::Invalid)?
            .claims;
        if claims.token_type != expected {
            return Err(TokenError::WrongType);
        }
        Ok(claims)
    }

    /// Issues a refresh token for `user_id`, records it as outstanding, and
    /// derives an access token from it.
    pub async fn issue_pair(&self, db: &SqlitePool, user_id: i64) -> Result<TokenPair, crate::error::AppError> {
        let refresh_claims = self.claims(TokenType::Refresh, user_id);
        let refresh = self.sign(&refresh_claims)?;

        sqlx::query(
            "INSERT INTO outstanding_tokens (jti, user_id, token, created_at, expires_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&refresh_claims.jti)
        .bind(user_id)
        .bind(&refresh)
        .bind(timestamp(refresh_claims.iat))
        .bind(timestamp(refresh_claims.exp))
        .execute(db)
        .await?;

        let access = self.sign(&self.claims(TokenType::Access, refresh_claims.user_id))?;
        Ok(TokenPair { access, refresh })
    }

    /// Decodes a refresh token and rejects it if it has been blacklisted.
    pub async fn verify_refresh(&self, db: &SqlitePool, token: &str) -> Result<Claims, TokenError> {
        let claims = self.decode(token, TokenType::Refresh)?;

        let blacklisted =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM blacklisted_tokens WHERE jti = ?")
                .bind(&claims.jti)
                .fetch_one(db)
                .await?;
        if blacklisted > 0 {
            return Err(TokenError::Blacklisted);
        }
        Ok(claims)
    }

    /// Exchanges a live refresh token for a new access token.
    pub async fn refresh_access(&self, db: &SqlitePool, token: &str) -> Result<String, TokenError> {
        let claims = self.verify_refresh(db, token).await?;
        self.sign(&self.claims(TokenType::Access, claims.user_id))
            .map_err(TokenError::Invalid)
    }

    pub async fn blacklist(&self, db: &SqlitePool, token: &str) -> Result<(), TokenError> {
        let claims = self.verify_refresh(db, token).await?;

        let mut tx = db.begin().await?;
        // Tokens signed with our key but never recorded still get an outstanding row.
        sqlx::query(
            "INSERT OR IGNORE INTO outstanding_tokens (jti, user_id, token, created_at, expires_at) \
             SELECT ?, id, ?, ?, ? FROM users WHERE id = ?",
        )
        .bind(&claims.jti)
        .bind(token)
        .bind(timestamp(claims.iat))
        .bind(timestamp(claims.exp))
        .bind(claims.user_id)
        .execute(&mut *tx)
        .await?;

        let inserted = sqlx::query("INSERT INTO blacklisted_tokens (jti) VALUES (?)")
            .bind(&claims.jti)
            .execute(&mut *tx)
            .await;
        match inserted {
            Ok(_) => {}
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                return Err(TokenError::Blacklisted)
            }
            Err(e) => return Err(e.into()),
        }

        tx.commit().await?;
        tracing::debug!(jti = %claims.jti, user_id = claims.user_id, "refresh token blacklisted");
        Ok(())
    }
}

fn timestamp(secs: usize) -> DateTime<Utc> {
    DateTime::from_timestamp(secs as i64, 0).unwrap_or_default()
}
