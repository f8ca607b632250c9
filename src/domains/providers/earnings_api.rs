//! reqwest client for the financial-data REST API.

use async_trait::async_trait;
use reqwest::Url;
use reqwest::header::{ACCEPT, COOKIE};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use super::error::ApiError;
use super::models::{DashboardData, Portfolio, PortfolioScore, StockDetails};
use super::DataProvider;
use crate::core::config::{CredentialsConfig, UpstreamAuth, UpstreamConfig};
use crate::core::{Error, Result};

const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";
const ERROR_BODY_PREVIEW: usize = 200;

#[derive(Debug, Clone)]
enum Auth {
    SharedSecret(String),
    Cookie(String),
}

/// Client for `/api/portfolios`, `/api/dashboard-data`,
/// `/api/stock-details/{symbol}` and `/api/scoring/{id}`.
#[derive(Debug, Clone)]
pub struct EarningsApiClient {
    client: reqwest::Client,
    base_url: Url,
    auth: Option<Auth>,
}

impl EarningsApiClient {
    /// Build the client. The request timeout covers connect, send and body.
    pub fn new(upstream: &UpstreamConfig, credentials: &CredentialsConfig) -> Result<Self> {
        let base_url = Url::parse(&upstream.base_url).map_err(|e| {
            Error::config(format!("invalid upstream URL '{}': {}", upstream.base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(Error::config(format!(
                "upstream URL '{}' cannot carry a path",
                upstream.base_url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(upstream.timeout())
            .user_agent(upstream.user_agent.clone())
            .build()
            .map_err(|e| Error::internal(format!("failed to create HTTP client: {e}")))?;

        let auth = credentials.upstream_auth().map(|auth| match auth {
            UpstreamAuth::SharedSecret(secret) => Auth::SharedSecret(secret.to_string()),
            UpstreamAuth::Cookie(cookie) => Auth::Cookie(cookie.to_string()),
        });

        Ok(Self {
            client,
            base_url,
            auth,
        })
    }

    /// Append path segments to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    #[instrument(skip_all, fields(url = %url))]
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> std::result::Result<T, ApiError> {
        let mut request = self.client.get(url.clone()).header(ACCEPT, "application/json");
        request = match &self.auth {
            Some(Auth::SharedSecret(secret)) => request.header(AUTH_TOKEN_HEADER, secret),
            Some(Auth::Cookie(cookie)) => request.header(COOKIE, cookie),
            None => request,
        };

        let response = request.send().await.map_err(|e| {
            warn!("Upstream request failed: {}", e);
            ApiError::from_reqwest(&e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let preview: String = body.chars().take(ERROR_BODY_PREVIEW).collect();
            warn!("Upstream returned {}: {}", status, preview);
            return Err(ApiError::from_status(status.as_u16()));
        }

        let bytes = response.bytes().await.map_err(|e| ApiError::from_reqwest(&e))?;
        debug!("Upstream response received: {} bytes", bytes.len());

        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl DataProvider for EarningsApiClient {
    async fn fetch_portfolios(&self) -> std::result::Result<Vec<Portfolio>, ApiError> {
        self.get_json(self.endpoint(&["api", "portfolios"])).await
    }

    async fn fetch_dashboard_data(
        &self,
        group_id: u64,
    ) -> std::result::Result<DashboardData, ApiError> {
        let mut url = self.endpoint(&["api", "dashboard-data"]);
        url.query_pairs_mut()
            .append_pair("groupId", &group_id.to_string());
        self.get_json(url).await
    }

    async fn fetch_stock_details(&self, symbol: &str) -> std::result::Result<StockDetails, ApiError> {
        let symbol = symbol.to_uppercase();
        self.get_json(self.endpoint(&["api", "stock-details", &symbol]))
            .await
    }

    async fn fetch_portfolio_score(
        &self,
        group_id: u64,
    ) -> std::result::Result<PortfolioScore, ApiError> {
        let id = group_id.to_string();
        self.get_json(self.endpoint(&["api", "scoring", &id])).await
    }
}
