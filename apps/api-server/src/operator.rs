//! # Operator Identity Extraction
//!
//! Every mutating endpoint requires the acting operator, taken from the
//! `x-operator-id` header the auth gateway injects after token
//! verification (authentication itself is outside this service). The
//! identity is threaded explicitly into the service layer; no handler
//! reads an ambient "current user".

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::ApiError;
use atlas_db::Operator;

/// Header carrying the authenticated operator id.
pub const OPERATOR_HEADER: &str = "x-operator-id";

/// Extractor wrapping the operator identity for handlers.
#[derive(Debug, Clone)]
pub struct CurrentOperator(pub Operator);

impl<S> FromRequestParts<S> for CurrentOperator
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(OPERATOR_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| ApiError::validation("x-operator-id header is required"))?;

        Ok(CurrentOperator(Operator::new(user_id)))
    }
}
