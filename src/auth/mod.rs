use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, models::Role};

pub mod password;
pub mod token;

pub use token::TokenService;

/// Claims
///
/// Payload of an identity token. Signed with the process-wide secret and checked on every
/// authenticated request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the canonical id string of the student or company.
    pub sub: String,
    pub role: Role,
    /// Issued At (iat), seconds since the epoch.
    pub iat: i64,
    /// Expiration Time (exp): the token is refused from this instant on.
    pub exp: i64,
}

/// AuthUser
///
/// The identity claim produced by the authentication guard. Downstream checks compare
/// `id` against the owning id of the targeted resource.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: String,
    pub role: Role,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        AuthUser {
            id: claims.sub,
            role: claims.role,
        }
    }
}

/// AuthUser Extractor Implementation
///
/// 1. Reuse an identity already resolved by the route-level auth middleware.
/// 2. Extract the `Authorization: Bearer <token>` header (`MissingCredential` if absent).
/// 3. Verify signature and expiry (`InvalidCredential` on any failure).
///
/// The guard never touches the store; the only shared state is the decoding key.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    TokenService: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        let token = bearer_token(parts)?;
        let tokens = TokenService::from_ref(state);
        let user = AuthUser::from(tokens.verify(token)?);

        parts.extensions.insert(user.clone());
        Ok(user)
    }
}

fn bearer_token(parts: &Parts) -> Result<&str, ApiError> {
    let auth_header = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(ApiError::MissingCredential)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .ok_or(ApiError::MissingCredential)?;

    if token.is_empty() {
        return Err(ApiError::MissingCredential);
    }
    Ok(token)
}
