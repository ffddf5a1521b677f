use chrono::Utc;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use uuid::Uuid;

use super::Claims;
use crate::{
    config::AppConfig,
    error::{ApiError, ApiResult},
    models::Role,
};

/// TokenService
///
/// Signs and verifies identity tokens with the process-wide secret. Built once from
/// `AppConfig` at startup and shared read-only through `AppState`.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_secs: i64,
}

impl TokenService {
    pub fn new(secret: &str, ttl_secs: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.jwt_secret, config.token_ttl_secs)
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    /// Issues a token for `subject` valid for the configured lifetime.
    pub fn issue(&self, subject: Uuid, role: Role) -> ApiResult<String> {
        let iat = Utc::now().timestamp();
        let exp = iat
            .checked_add(self.ttl_secs)
            .ok_or_else(|| ApiError::Internal("Token lifetime is out of range".into()))?;
        let claims = Claims {
            sub: subject.hyphenated().to_string(),
            role,
            iat,
            exp,
        };
        self.sign(&claims)
    }

    pub fn sign(&self, claims: &Claims) -> ApiResult<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| ApiError::Internal(format!("Failed to sign token: {e}")))
    }

    /// Checks signature and expiry. Every failure collapses into `InvalidCredential`.
    pub fn verify(&self, token: &str) -> ApiResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        match decode::<Claims>(token, &self.decoding_key, &validation) {
            Ok(data) => Ok(data.claims),
            Err(e) => {
                match e.kind() {
                    ErrorKind::ExpiredSignature => tracing::debug!("expired token presented"),
                    other => tracing::debug!("token rejected: {:?}", other),
                }
                Err(ApiError::InvalidCredential)
            }
        }
    }
}
