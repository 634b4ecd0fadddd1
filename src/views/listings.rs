//! Listing pages: index, detail, and the new/edit forms.

use super::{error_summary, escape, input, layout, textarea};
use crate::db::models::{Listing, Review};
use crate::forms::{ListingForm, ReviewForm, DELETE_IMAGES_FIELD, IMAGE_FIELD};
use crate::session::PageContext;
use crate::validation::{ValidationErrors, RATING_MAX, RATING_MIN};
use axum::response::Html;
use std::fmt::Write;

pub fn index(page: &PageContext, listings: &[Listing]) -> Html<String> {
    let mut body = String::from("<h1>All Campgrounds</h1>\n");
    if listings.is_empty() {
        body.push_str("<p>No campgrounds yet.</p>\n");
    }
    for listing in listings {
        let image = listing
            .images
            .first()
            .map(|img| format!("<img src=\"{}\" alt=\"\">", escape(&img.url)))
            .unwrap_or_default();
        let _ = write!(
            body,
            "<article class=\"card\">\n{image}\n<h2>{}</h2>\n<p>{}</p>\n\
             <p class=\"location\">{}</p>\n<a href=\"/campgrounds/{}\">View {}</a>\n</article>\n",
            escape(&listing.title),
            escape(&listing.description),
            escape(&listing.location),
            escape(&listing.id),
            escape(&listing.title),
        );
    }
    layout(page, "Campgrounds", &body)
}

pub fn new_form(page: &PageContext, form: &ListingForm, errors: Option<&ValidationErrors>) -> Html<String> {
    let body = format!(
        "<h1>New Campground</h1>\n{}<form action=\"/campgrounds\" method=\"POST\" \
         enctype=\"multipart/form-data\" class=\"validated-form\">\n{}{}\
         <button>Add Campground</button>\n</form>\n<a href=\"/campgrounds\">All Campgrounds</a>",
        error_summary(errors),
        listing_fields(form, errors),
        image_input(errors),
    );
    layout(page, "New Campground", &body)
}

/// Edit form. Existing images are listed with a checkbox to remove them.
pub fn edit_form(
    page: &PageContext,
    listing: &Listing,
    form: &ListingForm,
    errors: Option<&ValidationErrors>,
) -> Html<String> {
    let mut images = String::new();
    for (i, image) in listing.images.iter().enumerate() {
        let _ = write!(
            images,
            "<div class=\"image-choice\">\n<img class=\"thumb\" src=\"{}\" alt=\"\">\n\
             <input type=\"checkbox\" id=\"image-{i}\" name=\"{DELETE_IMAGES_FIELD}\" value=\"{}\">\n\
             <label for=\"image-{i}\">Delete?</label>\n</div>\n",
            escape(&image.thumbnail()),
            escape(&image.key),
        );
    }

    let id = escape(&listing.id);
    let body = format!(
        "<h1>Edit Campground</h1>\n{}<form action=\"/campgrounds/{id}?_method=PUT\" method=\"POST\" \
         enctype=\"multipart/form-data\" class=\"validated-form\">\n{}{}{images}\
         <button>Update Campground</button>\n</form>\n<a href=\"/campgrounds/{id}\">Back to Campground</a>",
        error_summary(errors),
        listing_fields(form, errors),
        image_input(errors),
    );
    layout(page, "Edit Campground", &body)
}

/// Detail page.
///
/// The owner sees edit/delete controls, review authors see a delete button
/// on their own reviews, and any signed-in user gets the review form.
pub fn show(
    page: &PageContext,
    listing: &Listing,
    reviews: &[Review],
    review_form: &ReviewForm,
    review_errors: Option<&ValidationErrors>,
) -> Html<String> {
    let id = escape(&listing.id);
    let mut body = String::new();

    body.push_str("<section class=\"listing\">\n<div class=\"gallery\">\n");
    for image in &listing.images {
        let _ = writeln!(body, "<img src=\"{}\" alt=\"\">", escape(&image.url));
    }
    body.push_str("</div>\n");

    // Read by the map widget: `[longitude, latitude]` as JSON.
    let coordinates = serde_json::to_string(&listing.coordinates()).unwrap_or_default();
    let _ = write!(
        body,
        "<h1>{}</h1>\n<p>{}</p>\n<p class=\"location\">{}</p>\n\
         <p class=\"author\">Submitted by {}</p>\n<p class=\"price\">${}/night</p>\n\
         <div id=\"map\" data-title=\"{}\" data-coordinates=\"{}\"></div>\n",
        escape(&listing.title),
        escape(&listing.description),
        escape(&listing.location),
        escape(&listing.author_username),
        listing.price,
        escape(&listing.title),
        escape(&coordinates),
    );

    if page.is_author(&listing.author_id) {
        let _ = write!(
            body,
            "<div class=\"owner-controls\">\n<a href=\"/campgrounds/{id}/edit\">Edit</a>\n\
             <form action=\"/campgrounds/{id}?_method=DELETE\" method=\"POST\">\
             <button>Delete</button></form>\n</div>\n"
        );
    }
    body.push_str("</section>\n<section class=\"reviews\">\n");

    if page.user.is_some() {
        let mut options = String::new();
        for rating in RATING_MIN..=RATING_MAX {
            let selected = if review_form.rating.trim() == rating.to_string() {
                " selected"
            } else {
                ""
            };
            let _ = write!(options, "<option value=\"{rating}\"{selected}>{rating}</option>");
        }
        let _ = write!(
            body,
            "<h2>Leave a Review</h2>\n{}<form action=\"/campgrounds/{id}/reviews\" method=\"POST\" \
             class=\"validated-form\">\n<label for=\"rating\">Rating</label>\n\
             <select id=\"rating\" name=\"rating\">{options}</select>\n{}<button>Submit</button>\n</form>\n",
            error_summary(review_errors),
            textarea("Review", "body", &review_form.body, review_errors),
        );
    }

    for review in reviews {
        let _ = write!(
            body,
            "<article class=\"review\">\n<p class=\"rating\" data-rating=\"{rating}\">Rated: {rating} stars</p>\n\
             <p class=\"byline\">By {}</p>\n<p>{}</p>\n",
            escape(&review.author_username),
            escape(&review.body),
            rating = review.rating,
        );
        if page.is_author(&review.author_id) {
            let _ = write!(
                body,
                "<form action=\"/campgrounds/{id}/reviews/{}?_method=DELETE\" method=\"POST\">\
                 <button>Delete</button></form>\n",
                escape(&review.id)
            );
        }
        body.push_str("</article>\n");
    }
    body.push_str("</section>\n<a href=\"/campgrounds\">All Campgrounds</a>");

    layout(page, &listing.title, &body)
}

fn listing_fields(form: &ListingForm, errors: Option<&ValidationErrors>) -> String {
    [
        input("Title", "title", "text", &form.title, errors),
        input("Location", "location", "text", &form.location, errors),
        input("Price", "price", "text", &form.price, errors),
        input("Longitude", "longitude", "text", &form.longitude, errors),
        input("Latitude", "latitude", "text", &form.latitude, errors),
        textarea("Description", "description", &form.description, errors),
    ]
    .concat()
}

fn image_input(errors: Option<&ValidationErrors>) -> String {
    let mut html = format!(
        "<div class=\"field\">\n<label for=\"{IMAGE_FIELD}\">Add Images</label>\n\
         <input type=\"file\" id=\"{IMAGE_FIELD}\" name=\"{IMAGE_FIELD}\" accept=\"image/jpeg,image/png,image/gif,image/webp\" multiple>\n"
    );
    if let Some(message) = errors.and_then(|e| e.for_field(IMAGE_FIELD)) {
        let _ = writeln!(html, "<p class=\"field-error\">{}</p>", escape(message));
    }
    html.push_str("</div>\n");
    html
}
