use axum::{
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{error::ApiError, validation};

/// JsonBody
///
/// Typed request body that also remembers whether the submitted object had any keys at
/// all, so validators can report "provide details" before checking individual fields.
///
/// An absent body is treated as `{}`. A body that is not a JSON object, or whose fields
/// have the wrong types, is rejected as a validation error instead of axum's plain-text
/// rejection.
#[derive(Debug)]
pub struct JsonBody<T> {
    pub value: T,
    empty: bool,
}

impl<T> JsonBody<T> {
    pub fn new(value: T, empty: bool) -> Self {
        Self { value, empty }
    }

    pub fn is_empty(&self) -> bool {
        self.empty
    }
}

impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::validation("body", rejection.body_text()))?;

        let raw = if bytes.iter().all(u8::is_ascii_whitespace) {
            Value::Object(Default::default())
        } else {
            serde_json::from_slice::<Value>(&bytes)
                .map_err(|e| ApiError::validation("body", format!("Malformed JSON body: {e}")))?
        };

        let Value::Object(object) = raw else {
            return Err(ApiError::validation(
                "body",
                "Request body must be a JSON object",
            ));
        };

        let empty = validation::is_empty_object(&object);
        let value = serde_json::from_value::<T>(Value::Object(object))
            .map_err(|e| ApiError::validation("body", format!("Invalid request body: {e}")))?;

        Ok(JsonBody { value, empty })
    }
}

/// QueryParams
///
/// `Query` with rejections rendered through the error envelope.
#[derive(Debug)]
pub struct QueryParams<T>(pub T);

impl<S, T> FromRequestParts<S> for QueryParams<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::validation("query", rejection.body_text()))?;
        Ok(QueryParams(value))
    }
}
