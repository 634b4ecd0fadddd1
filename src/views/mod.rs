//! # Views
//!
//! Server-rendered HTML. Pages are plain functions from data to
//! `Html<String>`; every piece of user-supplied text goes through
//! [`escape`] on the way out.
//!
//! ## Submodules
//! - `listings`: index, detail, new/edit forms
//! - `users`: register and login forms
//! - `errors`: the generic error page

pub mod errors;
pub mod listings;
pub mod users;

use crate::session::{FlashKind, PageContext};
use crate::validation::ValidationErrors;
use axum::response::Html;
use std::fmt::Write;

/// HTML-escape text for element content and quoted attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Wrap `body` in the site layout: navigation and flash messages.
pub fn layout(page: &PageContext, title: &str, body: &str) -> Html<String> {
    let mut html = String::new();

    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{} | YelpCamp</title>\n<link rel=\"stylesheet\" href=\"/static/app.css\">\n</head>\n<body>\n",
        escape(title)
    );

    html.push_str("<nav>\n<a href=\"/\">YelpCamp</a>\n<a href=\"/campgrounds\">Campgrounds</a>\n");
    match &page.user {
        Some(user) => {
            html.push_str("<a href=\"/campgrounds/new\">New Campground</a>\n");
            let _ = write!(
                html,
                "<span class=\"user\">{}</span>\n<a href=\"/logout\">Logout</a>\n",
                escape(&user.username)
            );
        }
        None => html.push_str("<a href=\"/login\">Login</a>\n<a href=\"/register\">Register</a>\n"),
    }
    html.push_str("</nav>\n<main>\n");

    for flash in &page.flashes {
        let class = match flash.kind {
            FlashKind::Success => "flash-success",
            FlashKind::Error => "flash-error",
        };
        let _ = writeln!(html, "<div class=\"{class}\" role=\"alert\">{}</div>", escape(&flash.message));
    }

    html.push_str(body);
    html.push_str("\n</main>\n</body>\n</html>\n");

    Html(html)
}

/// Landing page
pub fn home(page: &PageContext) -> Html<String> {
    layout(
        page,
        "Home",
        "<section class=\"hero\">\n<h1>YelpCamp</h1>\n\
         <p>Welcome to YelpCamp! Jump right in and explore our many campgrounds.\n\
         Feel free to share some of your own and comment on others!</p>\n\
         <a href=\"/campgrounds\">View Campgrounds</a>\n</section>",
    )
}

/// Form-level list of every validation message
pub(crate) fn error_summary(errors: Option<&ValidationErrors>) -> String {
    let Some(errors) = errors.filter(|e| !e.is_empty()) else {
        return String::new();
    };
    let mut html = String::from("<ul class=\"field-error\">\n");
    for error in errors.iter() {
        let _ = writeln!(html, "<li data-field=\"{}\">{}</li>", error.field, escape(&error.message));
    }
    html.push_str("</ul>\n");
    html
}

/// A labelled `<input>` with its current value and any field error
pub(crate) fn input(
    label: &str,
    name: &str,
    kind: &str,
    value: &str,
    errors: Option<&ValidationErrors>,
) -> String {
    let mut html = format!(
        "<div class=\"field\">\n<label for=\"{name}\">{label}</label>\n\
         <input type=\"{kind}\" id=\"{name}\" name=\"{name}\" value=\"{}\">\n",
        escape(value)
    );
    if let Some(message) = errors.and_then(|e| e.for_field(name)) {
        let _ = writeln!(html, "<p class=\"field-error\">{}</p>", escape(message));
    }
    html.push_str("</div>\n");
    html
}

pub(crate) fn textarea(label: &str, name: &str, value: &str, errors: Option<&ValidationErrors>) -> String {
    let mut html = format!(
        "<div class=\"field\">\n<label for=\"{name}\">{label}</label>\n\
         <textarea id=\"{name}\" name=\"{name}\">{}</textarea>\n",
        escape(value)
    );
    if let Some(message) = errors.and_then(|e| e.for_field(name)) {
        let _ = writeln!(html, "<p class=\"field-error\">{}</p>", escape(message));
    }
    html.push_str("</div>\n");
    html
}
