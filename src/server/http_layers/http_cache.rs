//! HTTP caching middleware

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Method, Request},
    middleware::Next,
    response::Response,
};

async fn with_cache_control(request: Request<Body>, next: Next, value: HeaderValue) -> Response {
    let cacheable = request.method() == Method::GET;
    let mut response = next.run(request).await;

    if cacheable && response.status().is_success() {
        response.headers_mut().insert(header::CACHE_CONTROL, value);
    }
    response
}

/// Adds `Cache-Control: max-age` to successful GET responses. Mutations and
/// errors are left uncached.
pub async fn http_cache(
    State(max_age_sec): State<usize>,
    request: Request<Body>,
    next: Next,
) -> Response {
    match HeaderValue::from_str(&format!("max-age={}", max_age_sec)) {
        Ok(value) => with_cache_control(request, next, value).await,
        Err(_) => next.run(request).await,
    }
}

/// Marks successful GET responses `no-cache`, for reads that change with
/// every like and approval.
pub async fn no_cache(request: Request<Body>, next: Next) -> Response {
    with_cache_control(request, next, HeaderValue::from_static("no-cache")).await
}
