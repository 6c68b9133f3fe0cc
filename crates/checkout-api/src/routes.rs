//! # Routes
//!
//! Axum router configuration for the checkout API.

use crate::handlers;
use crate::state::AppState;
use axum::{
    http::{header, HeaderName, HeaderValue},
    routing::{get, post},
    Router,
};
use checkout_core::blink::{
    ACTION_ALLOWED_HEADERS, ACTION_ALLOWED_METHODS, ACTION_EXPOSED_HEADERS, ACTION_VERSION,
    ACTION_VERSION_HEADER, BLOCKCHAIN_IDS_HEADER,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes:
/// - Blinks (open CORS, action headers on every response):
///   - GET /actions.json - URL mapping rules
///   - GET/POST /api/actions/checkout/{id} - metadata / purchase transaction
///   - OPTIONS on both - CORS preflight answered with `{}`
///
/// - Checkout pages:
///   - POST /api/checkout-pages - Create a page
///   - GET  /api/checkout-pages/{id} - Page record
///   - POST /api/upload - Image upload
///
/// - Wallet proxy:
///   - POST /api/authenticate
///   - POST /api/logout
///   - GET  /api/portfolio
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/checkout-pages", post(handlers::create_page))
        .route("/checkout-pages/{id}", get(handlers::get_page))
        .route("/upload", post(handlers::upload))
        .route("/authenticate", post(handlers::authenticate))
        .route("/logout", post(handlers::logout))
        .route("/portfolio", get(handlers::portfolio))
        .layer(cors);

    Router::new()
        // Health check at root
        .route("/health", get(handlers::health))
        .route("/", get(handlers::health))
        .merge(action_routes(state.config.blockchain_id()))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Blink endpoints with the CORS policy and headers blink clients expect
fn action_routes(blockchain_id: &'static str) -> Router<AppState> {
    Router::new()
        .route(
            "/actions.json",
            get(handlers::actions_json).options(handlers::action_preflight),
        )
        .route(
            "/api/actions/checkout/{id}",
            get(handlers::get_action)
                .post(handlers::post_action)
                .options(handlers::action_preflight),
        )
        .layer(
            ServiceBuilder::new()
                .layer(header_layer(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"))
                .layer(header_layer(
                    header::ACCESS_CONTROL_ALLOW_METHODS,
                    ACTION_ALLOWED_METHODS,
                ))
                .layer(header_layer(
                    header::ACCESS_CONTROL_ALLOW_HEADERS,
                    ACTION_ALLOWED_HEADERS,
                ))
                .layer(header_layer(
                    header::ACCESS_CONTROL_EXPOSE_HEADERS,
                    ACTION_EXPOSED_HEADERS,
                ))
                .layer(header_layer(
                    HeaderName::from_static(ACTION_VERSION_HEADER),
                    ACTION_VERSION,
                ))
                .layer(header_layer(
                    HeaderName::from_static(BLOCKCHAIN_IDS_HEADER),
                    blockchain_id,
                )),
        )
}

fn header_layer(name: HeaderName, value: &'static str) -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::overriding(name, HeaderValue::from_static(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::okto::{OktoClient, OktoConfig};
    use crate::state::AppConfig;
    use async_trait::async_trait;
    use axum::http::{Method, StatusCode};
    use axum_test::multipart::{MultipartForm, Part};
    use axum_test::TestServer;
    use checkout_core::{
        Asset, AssetUploader, CheckoutError, CheckoutPage, CheckoutPageStore, CheckoutResult,
        InMemoryCheckoutPageStore, NewCheckoutPage, PaymentRail, PurchaseTransaction,
        UploadedAsset,
    };
    use serde_json::{json, Value};
    use std::sync::Arc;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const WALLET: &str = "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin";

    /// Rail that echoes the page into a fixed transaction
    struct EchoRail;

    #[async_trait]
    impl PaymentRail for EchoRail {
        async fn build_purchase(
            &self,
            page: &CheckoutPage,
            buyer: &str,
        ) -> CheckoutResult<PurchaseTransaction> {
            if buyer.is_empty() {
                return Err(CheckoutError::InvalidAddress {
                    address: buyer.to_string(),
                });
            }
            Ok(PurchaseTransaction {
                transaction: "AQID".to_string(),
                message: checkout_core::purchase_message(page),
                amount: page.price()?.base_units(),
                recipient: page.wallet_address.clone(),
                created_accounts: Vec::new(),
            })
        }

        fn network(&self) -> &'static str {
            "test"
        }
    }

    struct StaticUploader;

    #[async_trait]
    impl AssetUploader for StaticUploader {
        async fn upload(&self, asset: &Asset) -> CheckoutResult<UploadedAsset> {
            Ok(UploadedAsset {
                secure_url: format!("https://cdn.example.com/{}", asset.file_name),
                public_id: format!("checkout-pages/{}", asset.file_name),
                url: None,
                format: None,
                bytes: Some(asset.len() as u64),
                width: None,
                height: None,
            })
        }
    }

    fn new_page() -> NewCheckoutPage {
        NewCheckoutPage {
            store_name: "Rust Goods".to_string(),
            store_logo: Some("https://cdn.example.com/logo.png".to_string()),
            product_name: "Ferris Plush".to_string(),
            product_details: "A very soft crab".to_string(),
            product_image: None,
            product_price: "12.50".to_string(),
            wallet_address: WALLET.to_string(),
            email: "shop@example.com".to_string(),
            address: None,
        }
    }

    fn state_with(
        pages: Arc<InMemoryCheckoutPageStore>,
        okto_url: &str,
        okto_key: Option<&str>,
    ) -> AppState {
        AppState {
            pages,
            rail: Arc::new(EchoRail),
            uploader: Some(Arc::new(StaticUploader)),
            okto: OktoClient::new(OktoConfig::new(okto_url, okto_key)).unwrap(),
            config: AppConfig::default(),
        }
    }

    async fn server_with_page() -> (TestServer, i32) {
        let pages = Arc::new(InMemoryCheckoutPageStore::new());
        let id = pages.create(new_page()).await.unwrap();
        let server =
            TestServer::new(create_router(state_with(pages, "http://127.0.0.1:9", None))).unwrap();
        (server, id)
    }

    #[tokio::test]
    async fn test_health() {
        let (server, _) = server_with_page().await;
        let response = server.get("/health").await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["status"], "healthy");
    }

    #[tokio::test]
    async fn test_actions_json_rules_and_headers() {
        let (server, _) = server_with_page().await;
        let response = server.get("/actions.json").await;
        response.assert_status_ok();
        assert_eq!(response.header(ACTION_VERSION_HEADER), ACTION_VERSION);
        assert_eq!(
            response.header(BLOCKCHAIN_IDS_HEADER),
            "solana:EtWTRABZaYq6iMfeYKouRu166VU2xqa1"
        );

        let body = response.json::<Value>();
        assert_eq!(body["rules"][0]["pathPattern"], "/checkout/:id");
        assert_eq!(body["rules"][0]["apiPath"], "/api/actions/checkout/:id");
    }

    #[tokio::test]
    async fn test_get_action_metadata() {
        let (server, id) = server_with_page().await;
        let response = server.get(&format!("/api/actions/checkout/{}", id)).await;
        response.assert_status_ok();

        let body = response.json::<Value>();
        assert_eq!(body["title"], "Ferris Plush");
        assert_eq!(body["label"], "Buy for $12.50 USDC");
        assert_eq!(body["icon"], "https://cdn.example.com/logo.png");
        assert_eq!(body["description"], "A very soft crab...");
    }

    #[tokio::test]
    async fn test_unknown_page_is_404_on_get_and_post() {
        let (server, _) = server_with_page().await;

        let response = server.get("/api/actions/checkout/999").await;
        response.assert_status(StatusCode::NOT_FOUND);
        assert_eq!(response.json::<Value>()["error"], "Checkout page not found");

        let response = server
            .post("/api/actions/checkout/999")
            .json(&json!({ "account": WALLET }))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
        assert_eq!(response.json::<Value>()["error"], "Checkout page not found");
        assert_eq!(response.header(ACTION_VERSION_HEADER), ACTION_VERSION);

        server
            .get("/api/actions/checkout/not-a-number")
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_post_action_returns_transaction() {
        let (server, id) = server_with_page().await;
        let response = server
            .post(&format!("/api/actions/checkout/{}", id))
            .json(&json!({ "account": WALLET }))
            .await;
        response.assert_status_ok();

        let body = response.json::<Value>();
        assert_eq!(body["type"], "transaction");
        assert_eq!(body["transaction"], "AQID");
        assert_eq!(body["message"], "Purchase of Ferris Plush for $12.50 USDC");
    }

    #[tokio::test]
    async fn test_post_action_failure_reports_details() {
        let (server, id) = server_with_page().await;
        let response = server
            .post(&format!("/api/actions/checkout/{}", id))
            .json(&json!({ "account": "" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let body = response.json::<Value>();
        assert_eq!(body["error"], "Failed to create transaction");
        assert!(body["details"].as_str().is_some_and(|d| d.contains("Invalid address")));
    }

    #[tokio::test]
    async fn test_action_preflight() {
        let (server, id) = server_with_page().await;
        for path in [format!("/api/actions/checkout/{}", id), "/actions.json".to_string()] {
            let response = server
                .method(Method::OPTIONS, &path)
                .add_header(header::ORIGIN, HeaderValue::from_static("https://dial.to"))
                .add_header(
                    header::ACCESS_CONTROL_REQUEST_METHOD,
                    HeaderValue::from_static("POST"),
                )
                .await;
            response.assert_status_ok();
            assert_eq!(response.json::<Value>(), json!({}));
            assert_eq!(response.header(header::ACCESS_CONTROL_ALLOW_ORIGIN), "*");
            assert_eq!(
                response.header(header::ACCESS_CONTROL_ALLOW_METHODS),
                "GET, POST, PUT, OPTIONS"
            );
            assert_eq!(response.header(ACTION_VERSION_HEADER), ACTION_VERSION);
            assert!(response
                .header(header::ACCESS_CONTROL_ALLOW_HEADERS)
                .to_str()
                .unwrap()
                .contains(ACTION_VERSION_HEADER));
        }
    }

    #[tokio::test]
    async fn test_post_action_without_account_is_json_400() {
        let (server, id) = server_with_page().await;
        let response = server
            .post(&format!("/api/actions/checkout/{}", id))
            .json(&json!({ "wallet": WALLET }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.header(header::CONTENT_TYPE), "application/json");
        assert_eq!(response.header(header::ACCESS_CONTROL_ALLOW_ORIGIN), "*");

        let body = response.json::<Value>();
        assert_eq!(body["error"], "Invalid request body");
        assert_eq!(body["code"], 400);
        assert!(body["details"].as_str().is_some_and(|d| d.contains("account")));

        let response = server
            .post("/api/checkout-pages")
            .bytes(axum::body::Bytes::from_static(b"{ not json"))
            .content_type("application/json")
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["error"], "Invalid request body");
    }

    #[tokio::test]
    async fn test_create_and_fetch_page() {
        let pages = Arc::new(InMemoryCheckoutPageStore::new());
        let server = TestServer::new(create_router(state_with(
            pages.clone(),
            "http://127.0.0.1:9",
            None,
        )))
        .unwrap();

        let response = server.post("/api/checkout-pages").json(&new_page()).await;
        response.assert_status(StatusCode::CREATED);
        let body = response.json::<Value>();
        assert_eq!(body["id"], 1);
        assert_eq!(body["checkoutPath"], "/checkout/1");
        assert_eq!(body["checkoutUrl"], "http://localhost:8080/checkout/1");
        assert_eq!(
            body["blinkUrl"],
            "http://localhost:8080/api/actions/checkout/1"
        );
        assert_eq!(pages.len().await, 1);

        let page = server.get("/api/checkout-pages/1").await.json::<CheckoutPage>();
        assert_eq!(page.product_name, "Ferris Plush");
        assert_eq!(page.wallet_address, WALLET);
    }

    #[tokio::test]
    async fn test_create_page_validation_errors() {
        let pages = Arc::new(InMemoryCheckoutPageStore::new());
        let server = TestServer::new(create_router(state_with(
            pages.clone(),
            "http://127.0.0.1:9",
            None,
        )))
        .unwrap();

        let mut page = new_page();
        page.store_name = String::new();
        page.wallet_address = "nope".to_string();
        page.product_price = "1".repeat(21);

        let response = server.post("/api/checkout-pages").json(&page).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body = response.json::<Value>();
        assert_eq!(body["fields"]["storeName"], "Store name is required");
        assert_eq!(
            body["fields"]["productPrice"],
            "Product price must be at most 20 characters"
        );
        assert!(body["fields"]["walletAddress"].is_string());
        assert!(pages.is_empty().await);
    }

    #[tokio::test]
    async fn test_upload_requires_file() {
        let (server, _) = server_with_page().await;
        let response = server
            .post("/api/upload")
            .multipart(MultipartForm::new().add_text("note", "no file here"))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["error"], "No file uploaded");
    }

    #[tokio::test]
    async fn test_upload_forwards_file() {
        let (server, _) = server_with_page().await;
        let file = Part::bytes(vec![1u8, 2, 3])
            .file_name("logo.png")
            .mime_type("image/png");
        let response = server
            .post("/api/upload")
            .multipart(MultipartForm::new().add_part("file", file))
            .await;
        response.assert_status_ok();
        assert_eq!(
            response.json::<Value>()["secure_url"],
            "https://cdn.example.com/logo.png"
        );
    }

    #[tokio::test]
    async fn test_wallet_routes_require_authorization() {
        let (server, _) = server_with_page().await;

        let response = server.post("/api/logout").await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.json::<Value>()["error"],
            "Unauthorized: No token provided"
        );

        server
            .get("/api/portfolio")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_authenticate_checks_key_then_token() {
        let (server, _) = server_with_page().await;
        let response = server
            .post("/api/authenticate")
            .json(&json!({ "id_token": "t" }))
            .await;
        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.json::<Value>()["error"], "Missing API key");

        let server = TestServer::new(create_router(state_with(
            Arc::new(InMemoryCheckoutPageStore::new()),
            "http://127.0.0.1:9",
            Some("key"),
        )))
        .unwrap();
        let response = server.post("/api/authenticate").json(&json!({})).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["error"], "Missing id_token");
    }

    #[tokio::test]
    async fn test_portfolio_proxies_okto() {
        let okto = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/portfolio"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "success",
                "data": { "total": 1 }
            })))
            .expect(1)
            .mount(&okto)
            .await;

        let server = TestServer::new(create_router(state_with(
            Arc::new(InMemoryCheckoutPageStore::new()),
            &okto.uri(),
            None,
        )))
        .unwrap();

        let response = server
            .get("/api/portfolio")
            .add_header(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["data"]["total"], 1);
    }

    #[tokio::test]
    async fn test_logout_message() {
        let okto = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/logout"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "success" })))
            .mount(&okto)
            .await;

        let server = TestServer::new(create_router(state_with(
            Arc::new(InMemoryCheckoutPageStore::new()),
            &okto.uri(),
            None,
        )))
        .unwrap();

        let response = server
            .post("/api/logout")
            .add_header(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["message"], "Logout successful");
    }
}
