use base64::Engine;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

use cognita_types::UserId;

/// Claims of an access token issued by the hosted identity provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: String,         // Subject (user ID)
    pub aud: Option<String>, // Audience
    pub exp: u64,            // Expiry
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatedUser {
    pub id: UserId,
    pub email: Option<String>,
}

pub struct AuthService {
    decoding_key: DecodingKey,
    audience: String,
    dev_mode: bool,
}

impl AuthService {
    pub fn new(secret: &str, audience: impl Into<String>) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            audience: audience.into(),
            dev_mode: false,
        }
    }

    /// Accepts any well-formed token without checking its signature
    pub fn new_dev_mode() -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(b"dev"),
            audience: "dev".to_string(),
            dev_mode: true,
        }
    }

    /// Validate an `Authorization` header value, with or without the
    /// `Bearer ` prefix
    pub fn validate_header(&self, header: &str) -> Result<AuthenticatedUser, AuthError> {
        let token = header.strip_prefix("Bearer ").unwrap_or(header).trim();
        self.validate_token(token)
    }

    pub fn validate_token(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }
        if self.dev_mode {
            return self.validate_dev_token(token);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[&self.audience]);

        let token_data = decode::<AccessClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| {
                tracing::warn!("JWT validation failed: {:?}", e.kind());
                match e.kind() {
                    ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                    ErrorKind::InvalidAudience => AuthError::AudienceMismatch,
                    _ => AuthError::InvalidToken,
                }
            })?;

        Self::user_from_claims(token_data.claims)
    }

    fn validate_dev_token(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() != 3 {
            // Bare user id
            let id = UserId::parse_str(token).map_err(|_| AuthError::InvalidToken)?;
            return Ok(AuthenticatedUser { id, email: None });
        }

        let payload = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(parts[1].trim_end_matches('='))
            .map_err(|e| {
                tracing::warn!("Failed to decode JWT payload in dev mode: {:?}", e);
                AuthError::InvalidToken
            })?;

        let claims: AccessClaims = serde_json::from_slice(&payload).map_err(|e| {
            tracing::warn!("Failed to parse JWT claims in dev mode: {:?}", e);
            AuthError::InvalidToken
        })?;

        Self::user_from_claims(claims)
    }

    fn user_from_claims(claims: AccessClaims) -> Result<AuthenticatedUser, AuthError> {
        let id = UserId::parse_str(&claims.sub).map_err(|_| {
            tracing::warn!("Token subject is not a user id: {}", claims.sub);
            AuthError::InvalidSubject
        })?;
        Ok(AuthenticatedUser {
            id,
            email: claims.email,
        })
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum AuthError {
    #[error("Missing token")]
    MissingToken,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Audience mismatch")]
    AudienceMismatch,
    #[error("Token subject is not a valid user id")]
    InvalidSubject,
}
