//! Authentication middleware for Axum
//!
//! Tokens are issued by the identity service. This layer only verifies them
//! and turns the claims into a [`Principal`] request extension.

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use tracing::debug;

use crate::application::Principal;
use crate::infrastructure::crypto::jwt::{verify_token, JwtConfig};
use crate::interfaces::http::common::ApiResponse;

#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    InvalidToken,
    ExpiredToken,
    UnknownRole,
}

#[derive(Clone)]
pub struct AuthState {
    pub jwt_config: JwtConfig,
}

fn extract_token(auth_header: &str) -> Option<&str> {
    auth_header.strip_prefix("Bearer ").map(str::trim)
}

/// Bearer JWT authentication
pub async fn auth_middleware(
    State(auth_state): State<AuthState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let Some(auth_header) = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
    else {
        return auth_error_response(AuthError::MissingToken);
    };

    let Some(token) = extract_token(auth_header) else {
        return auth_error_response(AuthError::InvalidToken);
    };

    let claims = match verify_token(token, &auth_state.jwt_config) {
        Ok(claims) => claims,
        Err(e) => {
            debug!(error = %e, "Token rejected");
            let error = match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
                _ => AuthError::InvalidToken,
            };
            return auth_error_response(error);
        }
    };

    let Some(principal) = claims.principal() else {
        return auth_error_response(AuthError::UnknownRole);
    };

    request.extensions_mut().insert::<Principal>(principal);
    next.run(request).await
}

fn auth_error_response(error: AuthError) -> Response {
    let message = match error {
        AuthError::MissingToken => "Missing authentication token",
        AuthError::InvalidToken => "Invalid authentication token",
        AuthError::ExpiredToken => "Token has expired",
        AuthError::UnknownRole => "Token carries an unknown role",
    };

    (
        StatusCode::UNAUTHORIZED,
        Json(ApiResponse::<()>::error(message)),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;
    use axum::{Extension, Router};

    use crate::application::Role;
    use crate::infrastructure::crypto::jwt::create_token;

    async fn whoami(Extension(principal): Extension<Principal>) -> String {
        format!("{}:{}", principal.role.as_str(), principal.id)
    }

    fn app(config: JwtConfig) -> Router {
        Router::new()
            .route("/me", get(whoami))
            .layer(axum::middleware::from_fn_with_state(
                AuthState { jwt_config: config },
                auth_middleware,
            ))
    }

    async fn call(config: JwtConfig, auth: Option<String>) -> Response {
        use tower::Service;
        let mut builder = Request::builder().uri("/me");
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        let mut svc = app(config).into_service();
        svc.call(builder.body(Body::empty()).unwrap()).await.unwrap()
    }

    #[tokio::test]
    async fn valid_token_yields_principal() {
        let config = JwtConfig::default();
        let token = create_token("th-1", Role::Therapist, &config).unwrap();
        let resp = call(config, Some(format!("Bearer {}", token))).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"THERAPIST:th-1");
    }

    #[tokio::test]
    async fn missing_or_foreign_token_is_unauthorized() {
        let resp = call(JwtConfig::default(), None).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let foreign = JwtConfig {
            secret: "another-secret".into(),
            ..JwtConfig::default()
        };
        let token = create_token("parent-1", Role::Parent, &foreign).unwrap();
        let resp = call(JwtConfig::default(), Some(format!("Bearer {}", token))).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let resp = call(JwtConfig::default(), Some("Basic abc".into())).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
