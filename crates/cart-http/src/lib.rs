//! HTTP transport for the storefront endpoints
//!
//! Implements [`StorefrontApi`] over `reqwest`. One POST per call, JSON in
//! and out, no retry. Error statuses that still carry a JSON failure body
//! (`{"success": false, "error": ...}`) are passed through so the server's
//! reason reaches the user.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

use async_trait::async_trait;
use cart_core::{
    CartConfig, CheckoutRequest, CheckoutResponse, ReservationRequest, ReservationResponse,
    StorefrontApi, TransportError,
};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Header carrying the CSRF token
pub const CSRF_HEADER: &str = "x-csrftoken";

/// Transport construction errors
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// CSRF token is not a valid header value
    #[error("invalid csrf token: {0}")]
    InvalidCsrfToken(#[from] reqwest::header::InvalidHeaderValue),

    /// Client could not be built
    #[error("cannot build http client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Bodies that say whether the server declined the request
trait Verdict {
    fn is_failure(&self) -> bool;
}

impl Verdict for ReservationResponse {
    fn is_failure(&self) -> bool {
        !self.success
    }
}

impl Verdict for CheckoutResponse {
    fn is_failure(&self) -> bool {
        !self.success
    }
}

/// `reqwest`-backed storefront client
#[derive(Debug, Clone)]
pub struct HttpStorefront {
    client: reqwest::Client,
    reservation_url: String,
    checkout_url: String,
    timeout_ms: u64,
}

impl HttpStorefront {
    /// Build a client for the endpoints named in `config`
    ///
    /// # Errors
    /// - `HttpError::InvalidCsrfToken` if the token is not header-safe
    /// - `HttpError::Client` if the TLS backend fails to initialize
    pub fn new(config: &CartConfig) -> Result<Self, HttpError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert("x-requested-with", HeaderValue::from_static("XMLHttpRequest"));
        if let Some(token) = &config.csrf_token {
            headers.insert(CSRF_HEADER, HeaderValue::from_str(token)?);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self {
            client,
            reservation_url: config.reservation_url(),
            checkout_url: config.checkout_url(),
            timeout_ms: config.request_timeout_ms,
        })
    }

    async fn post<B, R>(&self, url: &str, body: &B) -> Result<R, TransportError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned + Verdict,
    {
        tracing::debug!(url, "POST");
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.classify(&e))?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| self.classify(&e))?;
        let decoded = serde_json::from_slice::<R>(&bytes);

        if status.is_success() {
            return decoded.map_err(|e| TransportError::Decode(e.to_string()));
        }
        match decoded {
            Ok(body) if body.is_failure() => {
                tracing::debug!(url, status = status.as_u16(), "error status with failure body");
                Ok(body)
            }
            _ => Err(TransportError::Status(status.as_u16())),
        }
    }

    fn classify(&self, error: &reqwest::Error) -> TransportError {
        if error.is_timeout() {
            TransportError::Timeout {
                timeout_ms: self.timeout_ms,
            }
        } else if error.is_decode() {
            TransportError::Decode(error.to_string())
        } else {
            TransportError::Network(error.to_string())
        }
    }
}

#[async_trait]
impl StorefrontApi for HttpStorefront {
    async fn reserve_stock(
        &self,
        request: ReservationRequest,
    ) -> Result<ReservationResponse, TransportError> {
        self.post(&self.reservation_url, &request).await
    }

    async fn submit_checkout(
        &self,
        request: CheckoutRequest,
    ) -> Result<CheckoutResponse, TransportError> {
        self.post(&self.checkout_url, &request).await
    }
}
