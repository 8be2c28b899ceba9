use axum::{
    extract::Request,
    http::Method,
    middleware::Next,
    response::Response,
};
use tracing::debug;

pub const METHOD_OVERRIDE_HEADER: &str = "x-http-method-override";

/// Lets clients that can only send `POST` reach `PUT` and `DELETE` routes.
/// Must wrap the router, since routing has already happened inside it.
pub async fn override_method(mut request: Request, next: Next) -> Response {
    if *request.method() == Method::POST {
        if let Some(method) = requested_method(&request) {
            debug!(method = %method, "applying method override");
            *request.method_mut() = method;
        }
    }

    next.run(request).await
}

fn requested_method(request: &Request) -> Option<Method> {
    let value = request.headers().get(METHOD_OVERRIDE_HEADER)?.to_str().ok()?;
    let value = value.trim().to_ascii_uppercase();
    if value.is_empty() {
        return None;
    }

    Method::from_bytes(value.as_bytes()).ok()
}
