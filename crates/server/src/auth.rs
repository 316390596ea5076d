//! Bearer-token check shared by every protected route.
//!
//! The security model is one shared secret passed as
//! `Authorization: Bearer <token>`; the comparison is constant-time so the
//! token cannot be probed byte by byte.

use axum::{
    http::{header, HeaderMap, StatusCode},
    Json,
};
use shared::error::{ApiError, ErrorCode};
use subtle::ConstantTimeEq;

pub fn require_bearer(
    headers: &HeaderMap,
    expected_token: &str,
) -> Result<(), (StatusCode, Json<ApiError>)> {
    let provided = bearer_token(headers).ok_or_else(unauthorized)?;
    if !tokens_match(provided, expected_token) {
        return Err(unauthorized());
    }
    Ok(())
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

fn tokens_match(provided: &str, expected: &str) -> bool {
    provided.as_bytes().ct_eq(expected.as_bytes()).into()
}

fn unauthorized() -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(ApiError::new(ErrorCode::Unauthorized, "unauthorized")),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const TOKEN: &str = "0123456789abcdef";

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(value).expect("header"),
        );
        headers
    }

    #[test]
    fn accepts_the_expected_token() {
        let headers = headers_with(&format!("Bearer {TOKEN}"));
        require_bearer(&headers, TOKEN).expect("authorized");
    }

    #[test]
    fn scheme_is_case_insensitive() {
        let headers = headers_with(&format!("bearer {TOKEN}"));
        require_bearer(&headers, TOKEN).expect("authorized");
    }

    #[test]
    fn rejects_a_missing_header() {
        let err = require_bearer(&HeaderMap::new(), TOKEN).expect_err("must fail");
        assert_eq!(err.0, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn rejects_a_wrong_token() {
        let headers = headers_with("Bearer not-the-token-at-all");
        assert!(require_bearer(&headers, TOKEN).is_err());
    }

    #[test]
    fn rejects_a_non_bearer_scheme() {
        let headers = headers_with(&format!("Basic {TOKEN}"));
        assert!(require_bearer(&headers, TOKEN).is_err());
    }
}
