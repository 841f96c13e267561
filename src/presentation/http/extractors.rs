//! Custom Extractors
//!
//! Axum extractors for caller identity and request parsing.
//!
//! This service runs behind the platform's auth proxy, which terminates
//! authentication and forwards the verified user id in the `x-user-id`
//! header. Requests that reach us without it are rejected.

use axum::{extract::FromRequestParts, http::request::Parts, RequestPartsExt};
use axum_extra::{
    headers::{self, Header, HeaderName, HeaderValue},
    TypedHeader,
};

use crate::shared::error::AppError;

static X_USER_ID: HeaderName = HeaderName::from_static("x-user-id");

/// Typed `x-user-id` header carrying the proxy-verified user id.
#[derive(Debug, Clone, Copy)]
pub struct XUserId(pub i64);

impl Header for XUserId {
    fn name() -> &'static HeaderName {
        &X_USER_ID
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, headers::Error>
    where
        I: Iterator<Item = &'i HeaderValue>,
    {
        let value = values.next().ok_or_else(headers::Error::invalid)?;
        value
            .to_str()
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .map(XUserId)
            .ok_or_else(headers::Error::invalid)
    }

    fn encode<E: Extend<HeaderValue>>(&self, values: &mut E) {
        if let Ok(value) = HeaderValue::from_str(&self.0.to_string()) {
            values.extend(std::iter::once(value));
        }
    }
}

/// The caller's identity for all viewing-session operations.
#[derive(Debug, Clone, Copy)]
pub struct Identity {
    pub user_id: i64,
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(XUserId(user_id)) = parts
            .extract::<TypedHeader<XUserId>>()
            .await
            .map_err(|_| AppError::Unauthorized("Missing x-user-id header".into()))?;

        Ok(Identity { user_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn x_user_id_decodes_numeric_header() {
        let value = HeaderValue::from_static("42");
        let mut values = std::iter::once(&value);
        let XUserId(id) = XUserId::decode(&mut values).unwrap();
        assert_eq!(id, 42);
    }

    #[test]
    fn x_user_id_rejects_garbage() {
        let value = HeaderValue::from_static("not-a-number");
        let mut values = std::iter::once(&value);
        assert!(XUserId::decode(&mut values).is_err());
    }
}
