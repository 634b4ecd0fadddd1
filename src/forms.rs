//! # Form Types
//!
//! Raw form submissions, exactly as typed by the user. Every field is a
//! string so a rejected form can be re-rendered with exactly what was typed;
//! `crate::validation` turns them into typed fields.

use crate::blob::Upload;
use crate::db::models::Listing;
use crate::error::{AppError, AppResult};
use axum::extract::Multipart;
use serde::{Deserialize, Serialize};

/// Field name used by the listing forms for file inputs
pub const IMAGE_FIELD: &str = "image";

/// Field name of the "delete this image" checkboxes on the edit form
pub const DELETE_IMAGES_FIELD: &str = "deleteImages[]";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListingForm {
    pub title: String,
    pub location: String,
    pub price: String,
    pub description: String,
    pub longitude: String,
    pub latitude: String,
}

impl From<&Listing> for ListingForm {
    /// Pre-fill the edit form with the stored values.
    fn from(listing: &Listing) -> Self {
        Self {
            title: listing.title.clone(),
            location: listing.location.clone(),
            price: listing.price.to_string(),
            description: listing.description.clone(),
            longitude: listing.longitude.to_string(),
            latitude: listing.latitude.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewForm {
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub rating: String,
}

/// A multipart listing submission: the text fields, any new files, and on
/// edit the keys of images to remove.
#[derive(Debug, Default)]
pub struct ListingSubmission {
    pub form: ListingForm,
    pub uploads: Vec<Upload>,
    pub delete_images: Vec<String>,
}

impl ListingSubmission {
    /// Drain a `multipart/form-data` body.
    ///
    /// Unknown fields are ignored. A file input left empty still sends a
    /// part with no file name and no bytes; those are skipped.
    pub async fn from_multipart(mut multipart: Multipart) -> AppResult<Self> {
        let mut submission = Self::default();

        while let Some(field) = multipart.next_field().await.map_err(invalid_form)? {
            let name = field.name().unwrap_or_default().to_string();

            if name == IMAGE_FIELD {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(invalid_form)?;
                if file_name.is_empty() && bytes.is_empty() {
                    continue;
                }
                submission.uploads.push(Upload {
                    file_name,
                    content_type,
                    bytes,
                });
                continue;
            }

            let value = field.text().await.map_err(invalid_form)?;
            let form = &mut submission.form;
            match name.as_str() {
                "title" => form.title = value,
                "location" => form.location = value,
                "price" => form.price = value,
                "description" => form.description = value,
                "longitude" => form.longitude = value,
                "latitude" => form.latitude = value,
                DELETE_IMAGES_FIELD | "deleteImages" => submission.delete_images.push(value),
                _ => {}
            }
        }

        Ok(submission)
    }
}

fn invalid_form(e: axum::extract::multipart::MultipartError) -> AppError {
    AppError::BadRequest(format!("Invalid form submission: {}", e.body_text()))
}
