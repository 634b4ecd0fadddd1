//! # Input Validation
//!
//! Schema checks for every create/update path. Each validator either
//! returns the typed fields or the complete list of field errors, and runs
//! before anything touches a store or the blob store.

use crate::blob::Upload;
use crate::db::models::{ListingFields, ReviewFields};
use crate::forms::{ListingForm, RegisterForm, ReviewForm};
use serde::Serialize;
use thiserror::Error;

pub const TITLE_MAX: usize = 100;
pub const LOCATION_MAX: usize = 200;
pub const DESCRIPTION_MAX: usize = 5000;
pub const REVIEW_BODY_MAX: usize = 2000;
pub const RATING_MIN: i64 = 1;
pub const RATING_MAX: i64 = 5;
pub const USERNAME_MIN: usize = 3;
pub const USERNAME_MAX: usize = 30;
pub const PASSWORD_MIN: usize = 8;

/// One problem with one form field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// All problems found in a submission
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{} invalid field(s)", .0.len())]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// First message for `field`, if any
    pub fn for_field(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, Self> {
        if self.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }
}

fn required_text(
    errors: &mut ValidationErrors,
    field: &'static str,
    label: &str,
    value: &str,
    max: usize,
) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.push(field, format!("{label} is required"));
    } else if trimmed.chars().count() > max {
        errors.push(field, format!("{label} must be at most {max} characters"));
    }
    trimmed.to_string()
}

/// Blank means "not given" and yields 0.
fn coordinate(errors: &mut ValidationErrors, field: &'static str, value: &str, limit: f64) -> f64 {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() && (-limit..=limit).contains(&v) => v,
        _ => {
            errors.push(field, format!("{field} must be a number between -{limit} and {limit}"));
            0.0
        }
    }
}

pub fn validate_listing(form: &ListingForm) -> Result<ListingFields, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let title = required_text(&mut errors, "title", "Title", &form.title, TITLE_MAX);
    let location = required_text(&mut errors, "location", "Location", &form.location, LOCATION_MAX);
    let description = required_text(
        &mut errors,
        "description",
        "Description",
        &form.description,
        DESCRIPTION_MAX,
    );

    let price = match form.price.trim() {
        "" => {
            errors.push("price", "Price is required");
            0.0
        }
        raw => match raw.parse::<f64>() {
            Ok(p) if !p.is_finite() => {
                errors.push("price", "Price must be a number");
                0.0
            }
            Ok(p) if p < 0.0 => {
                errors.push("price", "Price must be zero or more");
                0.0
            }
            Ok(p) => p,
            Err(_) => {
                errors.push("price", "Price must be a number");
                0.0
            }
        },
    };

    let longitude = coordinate(&mut errors, "longitude", &form.longitude, 180.0);
    let latitude = coordinate(&mut errors, "latitude", &form.latitude, 90.0);

    errors.into_result(|| ListingFields {
        title,
        description,
        price,
        location,
        longitude,
        latitude,
    })
}

/// Raster formats a browser renders inertly. SVG is excluded: it can carry
/// script and would be served from the site's own origin.
pub const IMAGE_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png", "image/gif", "image/webp"];

/// Every uploaded file must claim to be one of [`IMAGE_CONTENT_TYPES`].
pub fn validate_uploads(uploads: &[Upload]) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    let is_allowed = |u: &Upload| IMAGE_CONTENT_TYPES.contains(&u.content_type.to_ascii_lowercase().as_str());
    if let Some(bad) = uploads.iter().find(|&u| !is_allowed(u)) {
        errors.push(
            "image",
            format!("'{}' is not an image", bad.file_name),
        );
    }
    errors.into_result(|| ())
}

/// Listing fields and uploads together, so the form shows every error at once.
pub fn validate_listing_submission(
    form: &ListingForm,
    uploads: &[Upload],
) -> Result<ListingFields, ValidationErrors> {
    match (validate_listing(form), validate_uploads(uploads)) {
        (Ok(fields), Ok(())) => Ok(fields),
        (Ok(_), Err(errors)) | (Err(errors), Ok(())) => Err(errors),
        (Err(mut errors), Err(upload_errors)) => {
            errors.0.extend(upload_errors.0);
            Err(errors)
        }
    }
}

pub fn validate_review(form: &ReviewForm) -> Result<ReviewFields, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let body = required_text(&mut errors, "body", "Review", &form.body, REVIEW_BODY_MAX);

    let rating = match form.rating.trim().parse::<i64>() {
        Ok(r) if (RATING_MIN..=RATING_MAX).contains(&r) => r,
        _ => {
            errors.push(
                "rating",
                format!("Rating must be a whole number from {RATING_MIN} to {RATING_MAX}"),
            );
            0
        }
    };

    errors.into_result(|| ReviewFields { body, rating })
}

pub fn validate_registration(form: &RegisterForm) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let username = form.username.trim();
    let length = username.chars().count();
    if !(USERNAME_MIN..=USERNAME_MAX).contains(&length) {
        errors.push(
            "username",
            format!("Username must be {USERNAME_MIN} to {USERNAME_MAX} characters"),
        );
    } else if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        errors.push("username", "Username may only contain letters, digits, '_', '.' and '-'");
    }

    let email = form.email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {}
        _ => errors.push("email", "Email must be a valid address"),
    }

    if form.password.chars().count() < PASSWORD_MIN {
        errors.push("password", format!("Password must be at least {PASSWORD_MIN} characters"));
    }

    errors.into_result(|| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use rstest::rstest;

    fn listing_form(price: &str) -> ListingForm {
        ListingForm {
            title: "Ridge View".into(),
            location: "Denver, CO".into(),
            price: price.into(),
            description: "Pines and a creek".into(),
            longitude: "-104.99".into(),
            latitude: "39.74".into(),
        }
    }

    #[test]
    fn valid_listing_is_trimmed_and_typed() {
        let mut form = listing_form(" 25 ");
        form.title = "  Ridge View ".into();

        let fields = validate_listing(&form).unwrap();

        assert_eq!(fields.title, "Ridge View");
        assert_eq!(fields.price, 25.0);
        assert_eq!(fields.longitude, -104.99);
        assert_eq!(fields.latitude, 39.74);
    }

    #[rstest]
    #[case("-1", "Price must be zero or more")]
    #[case("", "Price is required")]
    #[case("cheap", "Price must be a number")]
    #[case("inf", "Price must be a number")]
    #[case("NaN", "Price must be a number")]
    fn bad_price_is_reported(#[case] price: &str, #[case] message: &str) {
        let errors = validate_listing(&listing_form(price)).unwrap_err();
        assert_eq!(errors.for_field("price"), Some(message));
    }

    #[test]
    fn zero_price_is_allowed() {
        assert_eq!(validate_listing(&listing_form("0")).unwrap().price, 0.0);
    }

    #[test]
    fn missing_fields_are_all_reported() {
        let errors = validate_listing(&ListingForm::default()).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["title", "location", "description", "price"]);
    }

    #[test]
    fn overlong_title_is_rejected() {
        let mut form = listing_form("10");
        form.title = "x".repeat(TITLE_MAX + 1);
        let errors = validate_listing(&form).unwrap_err();
        assert!(errors.for_field("title").unwrap().contains("at most"));
    }

    #[rstest]
    #[case("181", "0")]
    #[case("0", "-91")]
    #[case("east", "0")]
    fn out_of_range_coordinates_are_rejected(#[case] longitude: &str, #[case] latitude: &str) {
        let mut form = listing_form("10");
        form.longitude = longitude.into();
        form.latitude = latitude.into();
        assert!(validate_listing(&form).is_err());
    }

    #[test]
    fn blank_coordinates_default_to_zero() {
        let mut form = listing_form("10");
        form.longitude = String::new();
        form.latitude = " ".into();
        let fields = validate_listing(&form).unwrap();
        assert_eq!((fields.longitude, fields.latitude), (0.0, 0.0));
    }

    #[test]
    fn non_image_upload_is_rejected_alongside_field_errors() {
        let uploads = vec![Upload {
            file_name: "notes.txt".into(),
            content_type: "text/plain".into(),
            bytes: Bytes::from_static(b"hello"),
        }];

        let errors = validate_listing_submission(&listing_form("-5"), &uploads).unwrap_err();

        assert!(errors.for_field("price").is_some());
        assert_eq!(errors.for_field("image"), Some("'notes.txt' is not an image"));
    }

    #[rstest]
    #[case("image/jpeg", true)]
    #[case("image/png", true)]
    #[case("image/gif", true)]
    #[case("image/webp", true)]
    #[case("image/svg+xml", false)]
    #[case("image/x-icon", false)]
    #[case("text/html", false)]
    fn only_raster_images_are_accepted(#[case] content_type: &str, #[case] ok: bool) {
        let uploads = vec![Upload {
            file_name: "upload".into(),
            content_type: content_type.into(),
            bytes: Bytes::from_static(b"x"),
        }];
        assert_eq!(validate_uploads(&uploads).is_ok(), ok);
    }

    #[rstest]
    #[case("0", false)]
    #[case("1", true)]
    #[case("5", true)]
    #[case("6", false)]
    #[case("4.5", false)]
    #[case("", false)]
    fn rating_must_be_in_bounds(#[case] rating: &str, #[case] ok: bool) {
        let form = ReviewForm {
            body: "Lovely".into(),
            rating: rating.into(),
        };
        assert_eq!(validate_review(&form).is_ok(), ok);
    }

    #[test]
    fn empty_review_body_is_rejected() {
        let form = ReviewForm {
            body: "   ".into(),
            rating: "3".into(),
        };
        let errors = validate_review(&form).unwrap_err();
        assert_eq!(errors.for_field("body"), Some("Review is required"));
    }

    #[rstest]
    #[case("alice", "alice@example.com", "correct horse", true)]
    #[case("al", "alice@example.com", "correct horse", false)]
    #[case("alice smith", "alice@example.com", "correct horse", false)]
    #[case("alice", "not-an-email", "correct horse", false)]
    #[case("alice", "alice@example.com", "short", false)]
    fn registration_rules(
        #[case] username: &str,
        #[case] email: &str,
        #[case] password: &str,
        #[case] ok: bool,
    ) {
        let form = RegisterForm {
            username: username.into(),
            email: email.into(),
            password: password.into(),
        };
        assert_eq!(validate_registration(&form).is_ok(), ok);
    }
}
