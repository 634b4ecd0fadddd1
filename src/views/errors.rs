use super::{escape, layout};
use crate::session::PageContext;
use axum::{http::StatusCode, response::Html};

/// Generic error page.
///
/// Rendered from `AppError::into_response`, where the session isn't
/// available, so the navigation is always the anonymous one.
pub fn error_page(status: StatusCode, message: &str) -> Html<String> {
    let body = format!(
        "<section class=\"error\">\n<h1>{}</h1>\n<p>{}</p>\n\
         <a href=\"/campgrounds\">Back to campgrounds</a>\n</section>",
        status.as_u16(),
        escape(message)
    );
    layout(&PageContext::default(), "Error", &body)
}
