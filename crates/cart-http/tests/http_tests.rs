//! Transport tests against an ephemeral warp server

use cart_core::{
    CartConfig, CheckoutRequest, CustomerData, ProductId, ReservationError,
    ReservationRequest, StockReservationClient, StorefrontApi, TransportError,
};
use cart_http::HttpStorefront;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use warp::http::StatusCode;
use warp::Filter;

macro_rules! spawn {
    ($routes:expr) => {{
        let (addr, server) = warp::serve($routes).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);
        addr
    }};
}

fn storefront(addr: SocketAddr) -> HttpStorefront {
    let config = CartConfig {
        reservation_path: "/update-stock".into(),
        checkout_path: "/checkout".into(),
        ..CartConfig::new()
            .with_base_url(format!("http://{addr}"))
            .with_csrf_token("token-123")
            .with_timeout_ms(2_000)
    };
    HttpStorefront::new(&config).unwrap()
}

fn reservation(quantity: u32) -> ReservationRequest {
    ReservationRequest {
        product_id: ProductId::new("42"),
        quantity,
    }
}

#[tokio::test]
async fn reserve_posts_json_with_csrf_header() {
    let routes = warp::post()
        .and(warp::path!("update-stock"))
        .and(warp::header::<String>("x-csrftoken"))
        .and(warp::body::json())
        .map(|token: String, body: Value| {
            assert_eq!(token, "token-123");
            assert_eq!(body, json!({"product_id": "42", "quantity": 2}));
            warp::reply::json(&json!({"success": true, "new_stock": 8, "is_low_stock": true}))
        });
    let http = storefront(spawn!(routes));

    let response = http.reserve_stock(reservation(2)).await.unwrap();
    assert!(response.success);
    assert_eq!(response.new_stock, Some(8));
    assert_eq!(response.is_low_stock, Some(true));
}

#[tokio::test]
async fn application_rejection_reaches_client() {
    let routes = warp::post().and(warp::path!("update-stock")).map(|| {
        warp::reply::json(&json!({"success": false, "error": "Not enough stock available"}))
    });
    let client = StockReservationClient::new(Arc::new(storefront(spawn!(routes))));

    let err = client.reserve(&ProductId::new("42"), 50).await.unwrap_err();
    assert_eq!(
        err,
        ReservationError::Rejected {
            reason: "Not enough stock available".into()
        }
    );
}

#[tokio::test]
async fn error_status_with_failure_body_is_passed_through() {
    let routes = warp::post().and(warp::path!("checkout")).map(|| {
        warp::reply::with_status(
            warp::reply::json(&json!({
                "success": false,
                "error": "Your cart is empty. Please add items before checking out.",
                "error_type": "validation"
            })),
            StatusCode::BAD_REQUEST,
        )
    });
    let http = storefront(spawn!(routes));

    let request = CheckoutRequest {
        customer_data: CustomerData::default(),
        cart_items: Default::default(),
    };
    let response = http.submit_checkout(request).await.unwrap();
    assert!(!response.success);
    assert_eq!(response.error_type.as_deref(), Some("validation"));
}

#[tokio::test]
async fn error_status_without_body_is_status_failure() {
    let routes = warp::post()
        .and(warp::path!("update-stock"))
        .map(|| warp::reply::with_status("boom", StatusCode::INTERNAL_SERVER_ERROR));
    let http = storefront(spawn!(routes));

    let err = http.reserve_stock(reservation(1)).await.unwrap_err();
    assert_eq!(err, TransportError::Status(500));
}

#[tokio::test]
async fn garbage_body_is_decode_failure() {
    let routes = warp::post()
        .and(warp::path!("update-stock"))
        .map(|| "<html>login</html>");
    let http = storefront(spawn!(routes));

    let err = http.reserve_stock(reservation(1)).await.unwrap_err();
    assert!(matches!(err, TransportError::Decode(_)));
}

#[tokio::test]
async fn unreachable_server_is_network_failure() {
    // bind then drop to get a port nobody listens on
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let http = storefront(SocketAddr::from(([127, 0, 0, 1], port)));

    let err = http.reserve_stock(reservation(1)).await.unwrap_err();
    assert!(matches!(err, TransportError::Network(_)));
}
