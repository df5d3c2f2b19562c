//! API client for the tour-booking REST backend.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{header, Client};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::auth::SessionStore;
use crate::models::{DetailTourRequest, Order, OrderSummary, Tour, Transporter};

use super::{ApiError, Envelope};

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

const TOURS_PATH: &str = "/tour/getall_tours";
const TRANSPORTERS_PATH: &str = "/trans/getall_trans";
const ORDERS_PATH: &str = "/order/all-orders";
const CREATE_DETAIL_TOUR_PATH: &str = "/tour/create-detailTour";

/// API client for the booking backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    pub fn clear_token(&mut self) {
        self.token = None;
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: Some(token),
        }
    }

    /// A client carrying the session's current token, if logged in.
    pub fn for_session(&self, session: &SessionStore) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: session.token(),
        }
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn auth_headers(&self) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
        if let Some(ref token) = self.token {
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&format!("Bearer {}", token))?,
            );
        }
        Ok(headers)
    }

    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit
    /// (should retry), or Err for other errors.
    async fn check_response_for_retry(response: reqwest::Response) -> Result<Option<reqwest::Response>> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status().as_u16() == 429 {
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    async fn send_with_retry<T: DeserializeOwned>(
        &self,
        request: impl Fn() -> Result<reqwest::RequestBuilder>,
        url: &str,
    ) -> Result<Envelope<T>> {
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let response = request()?
                .send()
                .await
                .map_err(ApiError::from)
                .with_context(|| format!("Failed to send request to {}", url))?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => {
                    return response
                        .json()
                        .await
                        .with_context(|| format!("Failed to parse JSON response from {}", url));
                }
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited.into());
                    }
                    warn!(url = url, retry = retries, backoff_ms = backoff_ms, "Rate limited, backing off");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2;
                }
            }
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Envelope<T>> {
        let url = self.url(path);
        self.send_with_retry(|| Ok(self.client.get(&url).headers(self.auth_headers()?)), &url)
            .await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<Envelope<T>> {
        let url = self.url(path);
        self.send_with_retry(
            || Ok(self.client.post(&url).headers(self.auth_headers()?).json(body)),
            &url,
        )
        .await
    }

    // ===== Data Fetching Methods =====

    pub async fn fetch_tours(&self) -> Result<Vec<Tour>> {
        let tours: Vec<Tour> = self.get(TOURS_PATH).await?.into_data()?;
        debug!(count = tours.len(), "Tours fetched");
        Ok(tours)
    }

    pub async fn fetch_transporters(&self) -> Result<Vec<Transporter>> {
        let transporters: Vec<Transporter> = self.get(TRANSPORTERS_PATH).await?.into_data()?;
        debug!(count = transporters.len(), "Transporters fetched");
        Ok(transporters)
    }

    /// Order history of the logged-in user.
    pub async fn fetch_orders(&self) -> Result<Vec<Order>> {
        let orders: Vec<Order> = self.get(ORDERS_PATH).await?.into_data()?;
        debug!(count = orders.len(), "Orders fetched");
        Ok(orders)
    }

    pub async fn fetch_order_summary(&self) -> Result<OrderSummary> {
        Ok(OrderSummary::from_orders(&self.fetch_orders().await?))
    }

    /// Tours and transporters for the detail tour form, fetched together.
    pub async fn fetch_create_tour_options(&self) -> Result<(Vec<Tour>, Vec<Transporter>)> {
        futures::try_join!(self.fetch_tours(), self.fetch_transporters())
    }

    /// Schedule a departure. The request is validated before it is sent.
    pub async fn create_detail_tour(&self, request: &DetailTourRequest) -> Result<Option<String>> {
        request.validate().map_err(ApiError::from)?;
        let message = self
            .post::<serde_json::Value, _>(CREATE_DETAIL_TOUR_PATH, request)
            .await?
            .into_ack()?;
        debug!(tour_id = request.tour_id, "Detail tour created");
        Ok(message)
    }
}
