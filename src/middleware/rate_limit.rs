use axum::{body::Body, response::IntoResponse};
use http::{HeaderMap, HeaderValue, Response, StatusCode};
use tower_governor::GovernorError;

use crate::error::AppError;

/// Render a limiter rejection. Throttled requests get the `RATE_LIMITED`
/// error body plus a `Retry-After` header.
pub fn governor_error_response(error: GovernorError) -> Response<Body> {
    match error {
        GovernorError::TooManyRequests { wait_time, headers } => {
            let mut resp = AppError::RateLimited
                .with_details(serde_json::json!({ "retry_after_seconds": wait_time }))
                .into_response();
            copy_headers(&mut resp, headers);
            resp.headers_mut()
                .insert(http::header::RETRY_AFTER, HeaderValue::from(wait_time));
            resp
        }
        GovernorError::UnableToExtractKey => AppError::BadRequest(
            "Unable to determine client IP for rate limiting".to_string(),
        )
        .into_response(),
        GovernorError::Other { code, msg, headers } => {
            let body = msg.unwrap_or_else(|| "Rate limiting error".to_string());
            let mut resp = Response::new(Body::from(body));
            *resp.status_mut() =
                StatusCode::from_u16(code.as_u16()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            copy_headers(&mut resp, headers);
            resp
        }
    }
}

fn copy_headers(resp: &mut Response<Body>, headers: Option<HeaderMap>) {
    if let Some(hmap) = headers {
        for (name, value) in hmap.iter() {
            resp.headers_mut().append(name.clone(), value.clone());
        }
    }
}
