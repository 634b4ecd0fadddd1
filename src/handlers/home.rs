use crate::error::AppError;
use crate::session::PageContext;
use crate::views;
use axum::response::Html;

pub async fn home(page: PageContext) -> Html<String> {
    views::home(&page)
}

/// Fallback for every unmatched path.
pub async fn not_found() -> AppError {
    AppError::NotFound("Page Not Found".to_string())
}
