use axum::{extract::Request, http::Method, middleware::Next, response::Response};

/// Query parameter naming the intended method
pub const METHOD_PARAM: &str = "_method";

/// Rewrite `POST ...?_method=PUT|PATCH|DELETE` into that method.
///
/// HTML forms can only send GET and POST. This must wrap the router, not
/// sit inside it, because routing has already picked a handler by the time
/// inner layers run.
pub async fn method_override(mut request: Request, next: Next) -> Response {
    if request.method() == Method::POST {
        if let Some(method) = request.uri().query().and_then(overridden_method) {
            tracing::trace!(%method, "Method override");
            *request.method_mut() = method;
        }
    }
    next.run(request).await
}

fn overridden_method(query: &str) -> Option<Method> {
    let value = query
        .split('&')
        .find_map(|pair| pair.strip_prefix(METHOD_PARAM)?.strip_prefix('='))?;

    match value.to_ascii_uppercase().as_str() {
        "PUT" => Some(Method::PUT),
        "PATCH" => Some(Method::PATCH),
        "DELETE" => Some(Method::DELETE),
        _ => None,
    }
}
