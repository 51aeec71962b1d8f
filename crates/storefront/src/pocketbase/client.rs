//! PocketBase client implementation.
//!
//! Uses `reqwest` for HTTP. Caches products and the full catalog using
//! `moka` (TTL from [`CacheConfig`](crate::config::CacheConfig)).

use std::sync::Arc;

use moka::future::Cache;
use pocket_shop_core::{Product, ProductId};
use reqwest::{RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::config::StorefrontConfig;

use super::cache::{CacheKey, CacheValue};
use super::conversions::{ConversionContext, convert_product, convert_products};
use super::types::{
    AuthResponse, CreateOrderRequest, CreateOrderResponse, CreateUserRequest, ListResult,
    OrderRecord, PasswordAuthRequest, ProductRecord, SearchParams, SearchProductsResponse,
    UserRecord,
};
use super::{ApiError, BackendError};

/// Page size used when walking the full product listing.
const FULL_LIST_PAGE_SIZE: u32 = 500;

/// Header carrying the per-request correlation id.
const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// One page of search results, converted.
#[derive(Debug, Clone)]
pub struct SearchResults {
    pub items: Vec<Product>,
    pub total_items: i64,
    pub total_pages: u32,
    pub current_page: u32,
}

// =============================================================================
// PocketBaseClient
// =============================================================================

/// Client for the PocketBase backend.
///
/// Cheap to clone; all clones share one connection pool and cache.
#[derive(Clone)]
pub struct PocketBaseClient {
    inner: Arc<PocketBaseClientInner>,
}

struct PocketBaseClientInner {
    client: reqwest::Client,
    api_base: String,
    product_collection: String,
    user_collection: String,
    conversion: ConversionContext,
    cache: Cache<CacheKey, CacheValue>,
}

impl std::fmt::Debug for PocketBaseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PocketBaseClient")
            .field("api_base", &self.inner.api_base)
            .field("product_collection", &self.inner.product_collection)
            .finish_non_exhaustive()
    }
}

impl PocketBaseClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Http` if the HTTP client cannot be built.
    pub fn new(config: &StorefrontConfig) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("pocket-shop/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let cache = Cache::builder()
            .max_capacity(config.cache.max_capacity)
            .time_to_live(config.cache.ttl)
            .build();

        let api_base = config.api_base().to_string();

        Ok(Self {
            inner: Arc::new(PocketBaseClientInner {
                client,
                conversion: ConversionContext {
                    api_base: api_base.clone(),
                    product_collection: config.product_collection.clone(),
                    currency: config.currency,
                },
                api_base,
                product_collection: config.product_collection.clone(),
                user_collection: config.user_collection.clone(),
                cache,
            }),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.api_base)
    }

    fn records_url(&self, collection: &str) -> String {
        self.url(&format!("/api/collections/{collection}/records"))
    }

    /// Send a request and decode a JSON body.
    ///
    /// `resource` names what was asked for, for `NotFound` messages.
    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        resource: &str,
    ) -> Result<T, BackendError> {
        let request_id = uuid::Uuid::new_v4().to_string();
        let response = request
            .header(REQUEST_ID_HEADER, &request_id)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();

        // Check for rate limiting
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(BackendError::RateLimited(retry_after));
        }

        // Get response body as text first for better error diagnostics
        let body = response.text().await?;

        if status == StatusCode::NOT_FOUND {
            debug!(%request_id, resource, "Backend returned 404");
            return Err(BackendError::NotFound(resource.to_string()));
        }

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let api = ApiError::from_body(status.as_u16(), &body);
            return Err(BackendError::Unauthorized(api.message));
        }

        if !status.is_success() {
            tracing::warn!(
                %request_id,
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Backend returned non-success status"
            );
            return Err(BackendError::Api(ApiError::from_body(status.as_u16(), &body)));
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                %request_id,
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse backend response"
            );
            BackendError::Parse(e)
        })
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// Fetch one page of product records.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn products_page(
        &self,
        page: u32,
        per_page: u32,
    ) -> Result<ListResult<ProductRecord>, BackendError> {
        let request = self
            .inner
            .client
            .get(self.records_url(&self.inner.product_collection))
            .query(&[("page", page), ("perPage", per_page)]);

        self.send(request, "product listing").await
    }

    /// Get every product, walking all pages.
    ///
    /// # Errors
    ///
    /// Returns an error if any page request fails or a record is invalid.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<Product>, BackendError> {
        if let Some(CacheValue::Catalog(products)) =
            self.inner.cache.get(&CacheKey::Catalog).await
        {
            debug!("Cache hit for catalog");
            return Ok(products.to_vec());
        }

        let mut records = Vec::new();
        let mut page = 1;
        loop {
            let result = self.products_page(page, FULL_LIST_PAGE_SIZE).await?;
            let fetched = result.items.len();
            records.extend(result.items);
            if fetched == 0 || page >= result.total_pages {
                break;
            }
            page += 1;
        }

        let products = convert_products(records, &self.inner.conversion)?;
        debug!(count = products.len(), "Fetched catalog");

        self.inner
            .cache
            .insert(CacheKey::Catalog, CacheValue::Catalog(products.clone().into()))
            .await;

        Ok(products)
    }

    /// Get a product by id.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` if no such record exists, or another
    /// error if the API request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Product, BackendError> {
        if id.is_blank() {
            return Err(BackendError::NotFound("product with blank id".to_string()));
        }

        let cache_key = CacheKey::Product(id.clone());
        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok((*product).clone());
        }

        let url = format!(
            "{}/{}",
            self.records_url(&self.inner.product_collection),
            urlencode(id.as_str())
        );
        let record: ProductRecord = self
            .send(self.inner.client.get(url), &format!("product {id}"))
            .await?;
        let product = convert_product(record, &self.inner.conversion)?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Arc::new(product.clone())))
            .await;

        Ok(product)
    }

    /// Search products by text and category.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn search_products(
        &self,
        params: &SearchParams,
    ) -> Result<SearchResults, BackendError> {
        let request = self
            .inner
            .client
            .get(self.url("/api/products/search"))
            .query(params);

        let response: SearchProductsResponse = self.send(request, "product search").await?;

        Ok(SearchResults {
            items: convert_products(response.items, &self.inner.conversion)?,
            total_items: response.total_items,
            total_pages: response.total_pages,
            current_page: response.current_page,
        })
    }

    /// Drop every cached catalog entry.
    pub fn invalidate_cache(&self) {
        self.inner.cache.invalidate_all();
    }

    // =========================================================================
    // Auth Methods
    // =========================================================================

    /// Authenticate with email (or username) and password.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Api` with status 400 on bad credentials.
    #[instrument(skip(self, password))]
    pub async fn auth_with_password(
        &self,
        identity: &str,
        password: &SecretString,
    ) -> Result<AuthResponse, BackendError> {
        let url = self.url(&format!(
            "/api/collections/{}/auth-with-password",
            self.inner.user_collection
        ));
        let body = PasswordAuthRequest {
            identity,
            password: password.expose_secret(),
        };

        self.send(self.inner.client.post(url).json(&body), "auth collection")
            .await
    }

    /// Create a user record.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Api` with field errors if validation fails
    /// (e.g., the email is taken).
    #[instrument(skip(self, password))]
    pub async fn create_user(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<UserRecord, BackendError> {
        let body = CreateUserRequest {
            email,
            password: password.expose_secret(),
            password_confirm: password.expose_secret(),
        };

        self.send(
            self.inner
                .client
                .post(self.records_url(&self.inner.user_collection))
                .json(&body),
            "auth collection",
        )
        .await
    }

    // =========================================================================
    // Order Methods
    // =========================================================================

    /// Place an order.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Unauthorized` for a bad token and
    /// `BackendError::Api` when the backend rejects the order (empty cart,
    /// insufficient stock).
    #[instrument(skip(self, token, order), fields(lines = order.cart_items.len()))]
    pub async fn create_order(
        &self,
        token: &SecretString,
        order: &CreateOrderRequest,
    ) -> Result<CreateOrderResponse, BackendError> {
        let request = self
            .inner
            .client
            .post(self.url("/api/orders"))
            .header("Authorization", token.expose_secret())
            .json(order);

        self.send(request, "orders").await
    }

    /// List the signed-in user's orders.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Unauthorized` for a bad token.
    #[instrument(skip(self, token))]
    pub async fn list_orders(
        &self,
        token: &SecretString,
    ) -> Result<Vec<OrderRecord>, BackendError> {
        let request = self
            .inner
            .client
            .get(self.url("/api/user/orders"))
            .header("Authorization", token.expose_secret());

        self.send(request, "orders").await
    }
}

/// Percent-encode a path segment.
fn urlencode(segment: &str) -> String {
    url::form_urlencoded::byte_serialize(segment.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}
