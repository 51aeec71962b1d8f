//! PocketBase REST API client.
//!
//! # Architecture
//!
//! - Plain `reqwest` calls against the PocketBase record API and the shop's
//!   custom routes (`/api/products/search`, `/api/orders`, `/api/user/orders`)
//! - The backend is the source of truth - NO local sync, direct API calls
//! - In-memory caching via `moka` for catalog reads (TTL from config)
//!
//! # Endpoints
//!
//! ## Records
//! - `GET /api/collections/{products}/records` - paged product listing
//! - `GET /api/collections/{products}/records/{id}` - single product
//! - `GET /api/files/{collection}/{record}/{filename}` - product images
//!
//! ## Auth
//! - `POST /api/collections/{users}/auth-with-password`
//! - `POST /api/collections/{users}/records` - sign-up
//!
//! ## Shop routes
//! - `GET /api/products/search` - filtered, paginated search
//! - `POST /api/orders` - place an order (auth required)
//! - `GET /api/user/orders` - order history (auth required)
//!
//! # Example
//!
//! ```rust,ignore
//! use pocket_shop_storefront::pocketbase::PocketBaseClient;
//!
//! let client = PocketBaseClient::new(&config)?;
//! let products = client.list_products().await?;
//! let product = client.get_product(&products[0].id).await?;
//! ```

mod cache;
mod client;
mod conversions;
pub mod files;
pub mod types;

pub use client::{PocketBaseClient, SearchResults};
pub use files::file_url;
pub use types::*;

use std::collections::BTreeMap;

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with an error status.
    #[error("API error: {0}")]
    Api(ApiError),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing or rejected auth token.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// A record could not be converted into a domain type.
    #[error("Invalid record {id}: {reason}")]
    InvalidRecord {
        /// Record id.
        id: String,
        /// What was wrong with it.
        reason: String,
    },
}

/// An error response from the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// HTTP status code.
    pub status: u16,
    /// Top-level message.
    pub message: String,
    /// Per-field validation failures, sorted by field name.
    pub fields: Vec<FieldError>,
}

/// A validation failure on one request field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Field name (e.g., "email").
    pub field: String,
    /// Machine-readable code (e.g., "validation_not_unique").
    pub code: String,
    /// Human-readable message.
    pub message: String,
}

/// Raw error body.
///
/// Record API errors use `{status, message, data}`; the shop's custom
/// routes answer `{error}`.
#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    data: BTreeMap<String, serde_json::Value>,
}

impl ApiError {
    /// Build from a status code and response body.
    ///
    /// Bodies that are not JSON are kept, truncated, as the message.
    #[must_use]
    pub fn from_body(status: u16, body: &str) -> Self {
        let Ok(parsed) = serde_json::from_str::<ApiErrorBody>(body) else {
            return Self {
                status,
                message: body.chars().take(200).collect(),
                fields: Vec::new(),
            };
        };

        let fields = parsed
            .data
            .into_iter()
            .map(|(field, detail)| FieldError {
                code: detail
                    .get("code")
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                message: detail
                    .get("message")
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                field,
            })
            .collect();

        Self {
            status,
            message: parsed.message.or(parsed.error).unwrap_or_default(),
            fields,
        }
    }

    /// The validation failure for `field`, if any.
    #[must_use]
    pub fn field(&self, field: &str) -> Option<&FieldError> {
        self.fields.iter().find(|f| f.field == field)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "HTTP {}", self.status)?;
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if !self.fields.is_empty() {
            let details = self
                .fields
                .iter()
                .map(|e| {
                    if e.message.is_empty() {
                        format!("{} ({})", e.field, e.code)
                    } else {
                        format!("{}: {}", e.field, e.message)
                    }
                })
                .collect::<Vec<_>>()
                .join("; ");
            write!(f, " [{details}]")?;
        }
        Ok(())
    }
}
