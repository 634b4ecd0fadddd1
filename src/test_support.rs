//! Test fixtures: an in-memory database, an in-memory blob store with
//! failure injection, and a cookie-keeping client that drives the router
//! without a socket.

use crate::blob::{BlobError, BlobStore, Upload};
use crate::db::models::{ImageRef, ListingFields};
use crate::routes::{self, ServeSettings};
use crate::session::SessionSettings;
use crate::state::{AppState, MIGRATOR};
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use tower_sessions::cookie::Key;
use tower_sessions::MemoryStore;

/// A fresh, migrated in-memory database.
///
/// One connection only: every new connection to `:memory:` would be a
/// different, empty database.
pub async fn memory_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("valid sqlite url")
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .expect("in-memory database");
    MIGRATOR.run(&pool).await.expect("migrations");
    pool
}

pub fn listing_fields(title: &str, price: f64) -> ListingFields {
    ListingFields {
        title: title.to_string(),
        description: "A quiet spot by the water".to_string(),
        price,
        location: "Denver, CO".to_string(),
        longitude: -104.99,
        latitude: 39.74,
    }
}

/// Blob store that keeps everything in a map.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, Upload>>,
    /// Successful stores left before every further store fails
    fail_after: Mutex<Option<usize>>,
}

impl MemoryBlobStore {
    /// Let `successes` more stores through, then fail.
    pub fn fail_after(&self, successes: usize) {
        *self.fail_after.lock().unwrap() = Some(successes);
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.blobs.lock().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn contains(&self, key: &str) -> bool {
        self.blobs.lock().unwrap().contains_key(key)
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn store(&self, upload: Upload) -> Result<ImageRef, BlobError> {
        {
            let mut fail_after = self.fail_after.lock().unwrap();
            match fail_after.as_mut() {
                Some(0) => return Err(BlobError::Unavailable("injected failure".to_string())),
                Some(n) => *n -= 1,
                None => {}
            }
        }

        let key = format!("{}.img", uuid::Uuid::new_v4());
        let image = ImageRef {
            url: format!("https://blobs.example.com/upload/{key}"),
            key: key.clone(),
        };
        self.blobs.lock().unwrap().insert(key, upload);
        Ok(image)
    }

    async fn delete(&self, key: &str) -> Result<(), BlobError> {
        self.blobs.lock().unwrap().remove(key);
        Ok(())
    }
}

/// The full router over an in-memory database, blob store and session store.
#[derive(Clone)]
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub blobs: Arc<MemoryBlobStore>,
}

impl TestApp {
    pub async fn new() -> Self {
        let blobs = Arc::new(MemoryBlobStore::default());
        let state = AppState::from_parts(memory_pool().await, blobs.clone());
        let settings = ServeSettings {
            session: SessionSettings {
                key: Key::generate(),
                ttl: time::Duration::hours(1),
                secure: false,
            },
            static_dir: PathBuf::from("static"),
            uploads: None,
        };
        let router = routes::app(state.clone(), MemoryStore::default(), settings);

        Self { router, state, blobs }
    }

    /// A client with an empty cookie jar.
    pub fn client(&self) -> TestClient {
        TestClient {
            router: self.router.clone(),
            cookie: None,
        }
    }

    /// Register `username` (password `password123`) and return its signed-in client.
    pub async fn signed_up(&self, username: &str) -> TestClient {
        let mut client = self.client();
        let response = client
            .post_form(
                "/register",
                &[
                    ("username", username),
                    ("email", &format!("{username}@example.com")),
                    ("password", "password123"),
                ],
            )
            .await;
        assert_eq!(response.status, StatusCode::SEE_OTHER, "sign up failed: {}", response.body);
        client
    }
}

/// What a test looks at in a response
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    /// Last path segment of the redirect target, e.g. a new listing's id.
    pub fn location_id(&self) -> String {
        let location = self.location.as_deref().expect("redirect");
        location.rsplit('/').next().unwrap_or_default().to_string()
    }
}

/// Drives the router in-process, carrying the session cookie between calls.
pub struct TestClient {
    router: Router,
    cookie: Option<String>,
}

impl TestClient {
    pub async fn get(&mut self, path: &str) -> TestResponse {
        let request = self.request("GET", path).body(Body::empty()).unwrap();
        self.send(request).await
    }

    pub async fn post_form(&mut self, path: &str, fields: &[(&str, &str)]) -> TestResponse {
        let body = serde_urlencoded::to_string(fields).unwrap();
        let request = self
            .request("POST", path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    pub async fn post_multipart(&mut self, path: &str, form: MultipartForm) -> TestResponse {
        let (content_type, body) = form.finish();
        let request = self
            .request("POST", path)
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    /// `DELETE` the way a browser form sends it: `POST ...?_method=DELETE`.
    pub async fn delete(&mut self, path: &str) -> TestResponse {
        let request = self
            .request("POST", &format!("{path}?_method=DELETE"))
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    fn request(&self, method: &str, path: &str) -> axum::http::request::Builder {
        let builder = Request::builder().method(method).uri(path);
        match &self.cookie {
            Some(cookie) => builder.header(header::COOKIE, cookie),
            None => builder,
        }
    }

    async fn send(&mut self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();

        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let set_cookie = set_cookie.to_str().unwrap();
            let pair = set_cookie.split(';').next().unwrap_or_default().trim();
            if set_cookie.contains("Max-Age=0") || pair.ends_with('=') {
                self.cookie = None;
            } else {
                self.cookie = Some(pair.to_string());
            }
        }

        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .map(|l| l.to_str().unwrap().to_string());
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();

        TestResponse {
            status,
            location,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }
}

/// Minimal `multipart/form-data` encoder
pub struct MultipartForm {
    boundary: String,
    body: Vec<u8>,
}

impl Default for MultipartForm {
    fn default() -> Self {
        Self::new()
    }
}

impl MultipartForm {
    pub fn new() -> Self {
        Self {
            boundary: format!("test-boundary-{}", uuid::Uuid::new_v4().simple()),
            body: Vec::new(),
        }
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n",
                self.boundary
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                 Content-Type: {content_type}\r\n\r\n",
                self.boundary
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(bytes);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    /// A complete, valid listing form.
    pub fn listing(title: &str, price: &str) -> Self {
        Self::new()
            .text("title", title)
            .text("location", "Denver, CO")
            .text("price", price)
            .text("description", "A quiet spot by the water")
            .text("longitude", "-104.99")
            .text("latitude", "39.74")
    }

    fn finish(mut self) -> (String, Vec<u8>) {
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        (
            format!("multipart/form-data; boundary={}", self.boundary),
            self.body,
        )
    }
}
