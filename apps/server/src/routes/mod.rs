//! # Routes
//!
//! One module per resource group. Handlers are thin: parse the request,
//! call a repository or a parlour-core function, map the result.

use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use parlour_core::Customer;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::auth;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub mod calendar;
pub mod customers;
pub mod engineers;
pub mod inventory;
pub mod invoices;
pub mod jobs;
pub mod payments;
pub mod pipeline;
pub mod quotes;
pub mod reports;
pub mod settings;
pub mod statements;

/// Builds the full application router.
pub fn router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/auth/me", get(auth::me))
        .merge(customers::routes())
        .merge(inventory::routes())
        .merge(engineers::routes())
        .merge(jobs::routes())
        .merge(invoices::routes())
        .merge(payments::routes())
        .merge(quotes::routes())
        .merge(statements::routes())
        .merge(settings::routes())
        .merge(pipeline::routes())
        .merge(calendar::routes())
        .merge(reports::routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    let api = Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/register", post(auth::register))
        .merge(protected);

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .layer(cors_layer(&state.config.server.cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(parsed)
}

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    database: bool,
    version: &'static str,
}

async fn health(
    axum::extract::State(state): axum::extract::State<Arc<AppState>>,
) -> Json<Health> {
    let database = state.db.health_check().await;
    Json(Health {
        status: if database { "ok" } else { "degraded" },
        database,
        version: env!("CARGO_PKG_VERSION"),
    })
}

// =============================================================================
// Shared Helpers
// =============================================================================

/// `?search=` on list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub search: Option<String>,
}

/// Body of the next-number preview endpoints.
#[derive(Debug, Serialize)]
pub struct NextNumber {
    pub number: String,
}

/// Unwraps a lookup or answers 404.
pub(crate) fn found<T>(value: Option<T>, entity: &str, id: &str) -> ApiResult<T> {
    value.ok_or_else(|| ApiError::not_found(entity, id))
}

/// Loads the customer a document belongs to.
pub(crate) async fn customer_of(state: &AppState, customer_id: &str) -> ApiResult<Customer> {
    let customer = state.db.customers().get_by_id(customer_id).await?;
    found(customer, "Customer", customer_id)
}

/// Serves PDF bytes for display in the browser.
pub(crate) fn pdf_response(file_name: &str, bytes: Vec<u8>) -> Response {
    let disposition = format!("inline; filename=\"{}\"", file_name.replace('"', ""));
    (
        [
            (header::CONTENT_TYPE, parlour_docs::PDF_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response()
}

// =============================================================================
// Router Tests
// =============================================================================

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use parlour_db::{Database, DbConfig};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::ServerConfig;

    pub struct TestApp {
        pub app: Router,
        pub state: Arc<AppState>,
        pub token: String,
    }

    /// An app over an in-memory database with a logged-in admin.
    pub async fn app() -> TestApp {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let state = Arc::new(AppState::with_database(ServerConfig::default(), db).unwrap());
        let app = router(state.clone());

        let mut test = TestApp {
            app,
            state,
            token: String::new(),
        };
        let (status, _) = test
            .call_anon(
                "POST",
                "/api/auth/register",
                Some(json!({
                    "email": "admin@example.com",
                    "displayName": "Admin",
                    "password": "milking-time"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        test.token = test.login("admin@example.com", "milking-time").await;
        test
    }

    impl TestApp {
        pub async fn login(&self, email: &str, password: &str) -> String {
            let (status, body) = self
                .call_anon(
                    "POST",
                    "/api/auth/login",
                    Some(json!({ "email": email, "password": password })),
                )
                .await;
            assert_eq!(status, StatusCode::OK);
            body["token"].as_str().unwrap().to_string()
        }

        pub async fn raw(&self, request: Request<Body>) -> axum::response::Response {
            self.app.clone().oneshot(request).await.unwrap()
        }

        async fn send(
            &self,
            method: &str,
            uri: &str,
            body: Option<Value>,
            token: Option<&str>,
        ) -> (StatusCode, Value) {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(token) = token {
                builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
            }
            let request = match body {
                Some(body) => builder
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };

            let response = self.raw(request).await;
            let status = response.status();
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let value = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap_or(Value::Null)
            };
            (status, value)
        }

        pub async fn call(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
            self.send(method, uri, body, Some(&self.token)).await
        }

        pub async fn call_as(
            &self,
            token: &str,
            method: &str,
            uri: &str,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            self.send(method, uri, body, Some(token)).await
        }

        pub async fn call_anon(
            &self,
            method: &str,
            uri: &str,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            self.send(method, uri, body, None).await
        }

        /// Creates a customer and returns its id.
        pub async fn customer(&self, name: &str) -> String {
            let (status, body) = self
                .call("POST", "/api/customers", Some(json!({ "name": name })))
                .await;
            assert_eq!(status, StatusCode::CREATED);
            body["id"].as_str().unwrap().to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn test_health_is_public() {
        let app = test_support::app().await;
        let response = app
            .raw(Request::get("/health").body(Body::empty()).unwrap())
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_api_requires_token() {
        let app = test_support::app().await;

        let (status, body) = app.call_anon("GET", "/api/customers", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "UNAUTHORIZED");

        let (status, _) = app.call_as("not-a-jwt", "GET", "/api/customers", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = app.call("GET", "/api/auth/me", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["email"], "admin@example.com");
        assert_eq!(body["role"], "admin");
        assert!(body.get("passwordHash").is_none());
    }

    #[tokio::test]
    async fn test_registration_after_bootstrap_needs_admin() {
        let app = test_support::app().await;
        let staff = json!({
            "email": "staff@example.com",
            "displayName": "Staff",
            "password": "parlour-staff",
            "role": "staff"
        });

        let (status, _) = app.call_anon("POST", "/api/auth/register", Some(staff.clone())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = app.call("POST", "/api/auth/register", Some(staff)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["role"], "staff");

        let staff_token = app.login("staff@example.com", "parlour-staff").await;
        let (status, body) = app
            .call_as(
                &staff_token,
                "POST",
                "/api/auth/register",
                Some(json!({
                    "email": "another@example.com",
                    "displayName": "Another",
                    "password": "parlour-another"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "FORBIDDEN");
    }

    #[tokio::test]
    async fn test_wrong_password_is_unauthorized() {
        let app = test_support::app().await;
        let (status, _) = app
            .call_anon(
                "POST",
                "/api/auth/login",
                Some(json!({ "email": "admin@example.com", "password": "nope-nope" })),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
