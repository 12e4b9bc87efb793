//! Request correlation id
//!
//! Every request carries an `x-request-id`: the caller's, or a fresh UUID v4.
//! The id is stored as a [`RequestId`] extension, attached to a tracing span
//! wrapping the request, and echoed on the response.

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use tracing::Instrument;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Extract in handlers with `Extension(RequestId(id))`
#[derive(Clone, Debug)]
pub struct RequestId(pub String);

pub async fn request_id_middleware(mut request: Request<Body>, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty() && v.len() <= 128)
        .map(String::from)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    request.extensions_mut().insert(RequestId(request_id.clone()));

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %request.method(),
        path = %request.uri().path(),
    );
    let mut response = next.run(request).instrument(span).await;

    if let Ok(value) = request_id.parse() {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;
    use axum::{Extension, Router};
    use tower::Service;

    async fn echo(Extension(RequestId(id)): Extension<RequestId>) -> String {
        id
    }

    async fn call(header: Option<&str>) -> Response {
        let mut svc = Router::new()
            .route("/", get(echo))
            .layer(axum::middleware::from_fn(request_id_middleware))
            .into_service();
        let mut builder = Request::builder().uri("/");
        if let Some(h) = header {
            builder = builder.header(REQUEST_ID_HEADER, h);
        }
        svc.call(builder.body(Body::empty()).unwrap()).await.unwrap()
    }

    #[tokio::test]
    async fn caller_id_is_propagated() {
        let resp = call(Some("req-42")).await;
        assert_eq!(resp.headers()[REQUEST_ID_HEADER], "req-42");
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"req-42");
    }

    #[tokio::test]
    async fn missing_id_is_generated() {
        let resp = call(None).await;
        let id = resp.headers()[REQUEST_ID_HEADER].to_str().unwrap().to_string();
        assert!(Uuid::parse_str(&id).is_ok());
    }
}
