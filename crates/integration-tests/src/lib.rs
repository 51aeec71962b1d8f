//! Integration test support for Pocket Shop.
//!
//! [`StubBackend`] is an in-process stand-in for the PocketBase backend:
//! an `axum` router bound to an ephemeral port on 127.0.0.1 that serves the
//! product, auth and order endpoints the storefront talks to. Tests drive
//! the real `PocketBaseClient` against it.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p pocket-shop-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::Router;
use axum::extract::{Json, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde::Deserialize;
use serde_json::{Value, json};

use pocket_shop_storefront::config::StorefrontConfig;
use pocket_shop_storefront::pocketbase::PocketBaseClient;

/// Page size the stub uses for record listings, whatever the client asks.
pub const STUB_PAGE_SIZE: usize = 2;

/// Collection id reported on product records.
pub const PRODUCTS_COLLECTION_ID: &str = "pbc_products";

/// A product served by the stub.
#[derive(Debug, Clone)]
pub struct StubProduct {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub stock: u32,
    pub image: Option<String>,
    pub category: String,
}

impl StubProduct {
    #[must_use]
    pub fn new(id: &str, name: &str, price: f64, stock: u32) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: format!("The {name}"),
            price,
            stock,
            image: Some(format!("{id}.png")),
            category: String::new(),
        }
    }

    #[must_use]
    pub fn in_category(mut self, category: &str) -> Self {
        self.category = category.to_string();
        self
    }

    fn to_record(&self) -> Value {
        json!({
            "id": self.id,
            "collectionId": PRODUCTS_COLLECTION_ID,
            "collectionName": "products",
            "name": self.name,
            "description": self.description,
            "price": self.price,
            "stock": self.stock,
            "image": self.image.clone().unwrap_or_default(),
            "category": self.category,
            "created": "2024-01-01 00:00:00.000Z",
            "updated": "2024-01-01 00:00:00.000Z",
        })
    }
}

/// An order the stub accepted.
#[derive(Debug, Clone)]
pub struct PlacedOrder {
    pub id: String,
    pub user_id: String,
    pub lines: Vec<(String, u32)>,
    pub shipping_address: String,
    pub total_amount: f64,
}

#[derive(Debug)]
struct StubUser {
    id: String,
    email: String,
    password: String,
    token: String,
}

#[derive(Debug, Default)]
struct StubData {
    products: Vec<StubProduct>,
    users: Vec<StubUser>,
    orders: Vec<PlacedOrder>,
    requests: usize,
}

type Shared = Arc<Mutex<StubData>>;

/// A running stub backend.
pub struct StubBackend {
    addr: SocketAddr,
    data: Shared,
}

impl StubBackend {
    /// Start serving the given products on an ephemeral port.
    pub async fn start(products: Vec<StubProduct>) -> Self {
        let data: Shared = Arc::new(Mutex::new(StubData {
            products,
            ..StubData::default()
        }));

        let app = Router::new()
            .route("/api/collections/products/records", get(list_products))
            .route("/api/collections/products/records/{id}", get(get_product))
            .route("/api/products/search", get(search_products))
            .route(
                "/api/collections/users/auth-with-password",
                post(auth_with_password),
            )
            .route("/api/collections/users/records", post(create_user))
            .route("/api/orders", post(create_order))
            .route("/api/user/orders", get(list_orders))
            .with_state(Arc::clone(&data));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind stub backend");
        let addr = listener.local_addr().expect("Stub backend has no address");

        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Stub backend stopped");
        });

        Self { addr, data }
    }

    /// Base URL of the stub, without a trailing slash.
    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Storefront configuration pointing at the stub.
    #[must_use]
    pub fn config(&self) -> StorefrontConfig {
        StorefrontConfig::for_api_url(&self.url()).expect("Stub URL is valid")
    }

    /// A fresh client (with its own empty cache) for the stub.
    #[must_use]
    pub fn client(&self) -> PocketBaseClient {
        PocketBaseClient::new(&self.config()).expect("Failed to build client")
    }

    /// Register a user directly; returns its id.
    pub fn add_user(&self, email: &str, password: &str) -> String {
        let mut data = self.data();
        let id = format!("user{}", data.users.len() + 1);
        data.users.push(StubUser {
            id: id.clone(),
            email: email.to_string(),
            password: password.to_string(),
            token: format!("token-{id}"),
        });
        id
    }

    /// Orders accepted so far.
    #[must_use]
    pub fn orders(&self) -> Vec<PlacedOrder> {
        self.data().orders.clone()
    }

    /// Current stock of a product.
    #[must_use]
    pub fn stock(&self, id: &str) -> Option<u32> {
        self.data()
            .products
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.stock)
    }

    /// Number of requests served.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.data().requests
    }

    fn data(&self) -> MutexGuard<'_, StubData> {
        self.data.lock().expect("Stub state poisoned")
    }
}

/// Lock the shared state and count the request.
fn serve(data: &Shared) -> MutexGuard<'_, StubData> {
    let mut guard = data.lock().expect("Stub state poisoned");
    guard.requests += 1;
    guard
}

fn error(status: StatusCode, body: Value) -> Response {
    (status, Json(body)).into_response()
}

fn not_found() -> Response {
    error(
        StatusCode::NOT_FOUND,
        json!({"code": 404, "message": "The requested resource wasn't found.", "data": {}}),
    )
}

fn user_for_token<'a>(data: &'a StubData, headers: &HeaderMap) -> Option<&'a StubUser> {
    let token = headers.get("Authorization")?.to_str().ok()?;
    data.users.iter().find(|u| u.token == token)
}

fn user_record(user: &StubUser) -> Value {
    json!({"id": user.id, "email": user.email, "verified": true, "name": ""})
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageQuery {
    page: Option<usize>,
    #[allow(dead_code)]
    per_page: Option<usize>,
}

async fn list_products(State(data): State<Shared>, Query(query): Query<PageQuery>) -> Response {
    let data = serve(&data);
    let page = query.page.unwrap_or(1).max(1);
    let total = data.products.len();
    let total_pages = total.div_ceil(STUB_PAGE_SIZE).max(1);
    let items: Vec<Value> = data
        .products
        .iter()
        .skip((page - 1) * STUB_PAGE_SIZE)
        .take(STUB_PAGE_SIZE)
        .map(StubProduct::to_record)
        .collect();

    Json(json!({
        "page": page,
        "perPage": STUB_PAGE_SIZE,
        "totalItems": total,
        "totalPages": total_pages,
        "items": items,
    }))
    .into_response()
}

async fn get_product(State(data): State<Shared>, Path(id): Path<String>) -> Response {
    let data = serve(&data);
    data.products
        .iter()
        .find(|p| p.id == id)
        .map_or_else(not_found, |p| Json(p.to_record()).into_response())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchQuery {
    query: Option<String>,
    category: Option<String>,
    page: Option<usize>,
    per_page: Option<usize>,
}

async fn search_products(State(data): State<Shared>, Query(query): Query<SearchQuery>) -> Response {
    let data = serve(&data);
    let needle = query.query.unwrap_or_default().to_lowercase();
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).max(1);

    let matches: Vec<&StubProduct> = data
        .products
        .iter()
        .filter(|p| {
            needle.is_empty()
                || p.name.to_lowercase().contains(&needle)
                || p.description.to_lowercase().contains(&needle)
        })
        .filter(|p| query.category.as_ref().is_none_or(|c| &p.category == c))
        .collect();

    let items: Vec<Value> = matches
        .iter()
        .skip((page - 1) * per_page)
        .take(per_page)
        .map(|p| p.to_record())
        .collect();

    Json(json!({
        "items": items,
        "totalItems": matches.len(),
        "totalPages": matches.len().div_ceil(per_page),
        "currentPage": page,
    }))
    .into_response()
}

#[derive(Debug, Deserialize)]
struct PasswordAuth {
    identity: String,
    password: String,
}

async fn auth_with_password(
    State(data): State<Shared>,
    Json(body): Json<PasswordAuth>,
) -> Response {
    let data = serve(&data);
    match data
        .users
        .iter()
        .find(|u| u.email == body.identity && u.password == body.password)
    {
        Some(user) => {
            Json(json!({"token": user.token, "record": user_record(user)})).into_response()
        }
        None => error(
            StatusCode::BAD_REQUEST,
            json!({"code": 400, "message": "Failed to authenticate.", "data": {}}),
        ),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewUser {
    email: String,
    password: String,
    password_confirm: String,
}

async fn create_user(State(data): State<Shared>, Json(body): Json<NewUser>) -> Response {
    let mut data = serve(&data);
    if data.users.iter().any(|u| u.email == body.email) {
        return error(
            StatusCode::BAD_REQUEST,
            json!({
                "code": 400,
                "message": "Failed to create record.",
                "data": {
                    "email": {"code": "validation_not_unique", "message": "Value must be unique."},
                },
            }),
        );
    }
    if body.password != body.password_confirm {
        return error(
            StatusCode::BAD_REQUEST,
            json!({
                "code": 400,
                "message": "Failed to create record.",
                "data": {
                    "passwordConfirm": {
                        "code": "validation_values_mismatch",
                        "message": "Values don't match.",
                    },
                },
            }),
        );
    }

    let id = format!("user{}", data.users.len() + 1);
    let user = StubUser {
        id: id.clone(),
        email: body.email,
        password: body.password,
        token: format!("token-{id}"),
    };
    let record = user_record(&user);
    data.users.push(user);
    Json(record).into_response()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderLine {
    product_id: String,
    quantity: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewOrder {
    cart_items: Vec<OrderLine>,
    shipping_address: String,
}

async fn create_order(
    State(data): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<NewOrder>,
) -> Response {
    let mut data = serve(&data);
    let Some(user_id) = user_for_token(&data, &headers).map(|u| u.id.clone()) else {
        return error(
            StatusCode::UNAUTHORIZED,
            json!({"error": "Authentication required"}),
        );
    };
    if body.cart_items.is_empty() {
        return error(StatusCode::BAD_REQUEST, json!({"error": "Cart is empty"}));
    }

    let mut total_amount = 0.0;
    for line in &body.cart_items {
        let Some(product) = data.products.iter().find(|p| p.id == line.product_id) else {
            let message = format!("Product not found: {}", line.product_id);
            return error(StatusCode::INTERNAL_SERVER_ERROR, json!({"error": message}));
        };
        if product.stock < line.quantity {
            let message = format!("Insufficient stock for product: {}", product.name);
            return error(StatusCode::INTERNAL_SERVER_ERROR, json!({"error": message}));
        }
        total_amount += product.price * f64::from(line.quantity);
    }

    for line in &body.cart_items {
        if let Some(product) = data.products.iter_mut().find(|p| p.id == line.product_id) {
            product.stock -= line.quantity;
        }
    }

    let id = format!("order{}", data.orders.len() + 1);
    data.orders.push(PlacedOrder {
        id,
        user_id,
        lines: body
            .cart_items
            .into_iter()
            .map(|line| (line.product_id, line.quantity))
            .collect(),
        shipping_address: body.shipping_address,
        total_amount,
    });

    Json(json!({"message": "Order created successfully"})).into_response()
}

async fn list_orders(State(data): State<Shared>, headers: HeaderMap) -> Response {
    let data = serve(&data);
    let Some(user) = user_for_token(&data, &headers) else {
        return error(
            StatusCode::UNAUTHORIZED,
            json!({"error": "Authentication required"}),
        );
    };

    let orders: Vec<Value> = data
        .orders
        .iter()
        .filter(|o| o.user_id == user.id)
        .map(|o| {
            json!({
                "id": o.id,
                "user": o.user_id,
                "status": "pending",
                "total_amount": o.total_amount,
                "shipping_address": o.shipping_address,
                "payment_status": "pending",
                "created": "2024-01-01 00:00:00.000Z",
            })
        })
        .collect();

    Json(orders).into_response()
}
