//! Bearer-token authentication for protected routes.
//!
//! A missing credential and a bad credential are distinct: no token at all is
//! 401, a token that fails verification is 403.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::{error::AppError, repositories::users, state::AppState, utils::jwt};

pub async fn auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_bearer_token)
        .ok_or(AppError::MissingToken)?;

    let claims = jwt::verify_access_token(token, &state.config.jwt_secret)
        .map_err(|_| AppError::InvalidToken)?;

    let user = users::find_by_id(&state.pool, &claims.sub)
        .await?
        .ok_or(AppError::InvalidToken)?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

fn parse_bearer_token(header: &str) -> Option<&str> {
    let (scheme, rest) = header.split_once(' ')?;
    if scheme.eq_ignore_ascii_case("bearer") {
        let token = rest.trim_start();
        if !token.is_empty() {
            return Some(token);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_standard_bearer_header() {
        assert_eq!(parse_bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
    }

    #[test]
    fn scheme_is_case_insensitive() {
        assert_eq!(parse_bearer_token("bearer token"), Some("token"));
        assert_eq!(parse_bearer_token("BEARER token"), Some("token"));
    }

    #[test]
    fn rejects_other_schemes_and_empty_tokens() {
        assert_eq!(parse_bearer_token("Basic dXNlcjpwYXNz"), None);
        assert_eq!(parse_bearer_token("Bearer "), None);
        assert_eq!(parse_bearer_token("Bearer"), None);
    }
}
