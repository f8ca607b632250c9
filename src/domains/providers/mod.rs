//! Upstream providers consumed by the tools.
//!
//! - `earnings_api`: reqwest client for the financial-data REST API
//! - `workers_ai`: reqwest client for the text-completion provider
//! - `models`: lenient typed views of the upstream payloads
//!
//! Tools only see the [`DataProvider`] and [`InferenceProvider`] traits, so
//! tests can swap in in-memory fakes.

mod earnings_api;
mod error;
#[cfg(test)]
pub mod fake;
pub mod models;
mod workers_ai;

use async_trait::async_trait;

pub use earnings_api::EarningsApiClient;
pub use error::{ApiError, InferenceError};
pub use models::{DashboardData, Portfolio, PortfolioScore, StockDetails};
pub use workers_ai::WorkersAiClient;

/// Read-only access to the financial-data provider.
#[async_trait]
pub trait DataProvider: Send + Sync {
    /// `GET /api/portfolios`
    async fn fetch_portfolios(&self) -> Result<Vec<Portfolio>, ApiError>;

    /// `GET /api/dashboard-data?groupId=<id>`
    async fn fetch_dashboard_data(&self, group_id: u64) -> Result<DashboardData, ApiError>;

    /// `GET /api/stock-details/<SYMBOL>`
    async fn fetch_stock_details(&self, symbol: &str) -> Result<StockDetails, ApiError>;

    /// `GET /api/scoring/<id>`
    async fn fetch_portfolio_score(&self, group_id: u64) -> Result<PortfolioScore, ApiError>;
}

/// A text-completion provider taking a system and a user message.
#[async_trait]
pub trait InferenceProvider: Send + Sync {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, InferenceError>;
}
