use super::{error_summary, input, layout};
use crate::forms::{LoginForm, RegisterForm};
use crate::session::PageContext;
use crate::validation::ValidationErrors;
use axum::response::Html;

/// Registration form, refilled with `form` after a rejected attempt.
///
/// The password is never echoed back.
pub fn register_form(
    page: &PageContext,
    form: &RegisterForm,
    errors: Option<&ValidationErrors>,
) -> Html<String> {
    let body = format!(
        "<h1>Register</h1>\n{}<form action=\"/register\" method=\"POST\" class=\"validated-form\">\n\
         {}{}{}<button>Register</button>\n</form>",
        error_summary(errors),
        input("Username", "username", "text", &form.username, errors),
        input("Email", "email", "email", &form.email, errors),
        input("Password", "password", "password", "", errors),
    );
    layout(page, "Register", &body)
}

pub fn login_form(page: &PageContext, form: &LoginForm) -> Html<String> {
    let body = format!(
        "<h1>Login</h1>\n<form action=\"/login\" method=\"POST\" class=\"validated-form\">\n\
         {}{}<button>Login</button>\n</form>",
        input("Username", "username", "text", &form.username, None),
        input("Password", "password", "password", "", None),
    );
    layout(page, "Login", &body)
}
