//! In-memory providers for tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;

use super::error::{ApiError, InferenceError};
use super::models::{DashboardData, Portfolio, PortfolioScore, StockDetails};
use super::{DataProvider, InferenceProvider};

/// Canned upstream data. Unknown ids answer 404; unknown symbols answer with
/// an empty payload (no quote), as the real provider does.
#[derive(Default)]
pub struct FakeData {
    portfolios: Vec<Portfolio>,
    dashboards: HashMap<u64, DashboardData>,
    stocks: HashMap<String, StockDetails>,
    scores: HashMap<u64, PortfolioScore>,
    failure: Option<ApiError>,
    calls: AtomicUsize,
}

impl FakeData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_portfolios(mut self, portfolios: Value) -> Self {
        self.portfolios = serde_json::from_value(portfolios).unwrap();
        self
    }

    pub fn with_dashboard(mut self, group_id: u64, data: Value) -> Self {
        self.dashboards
            .insert(group_id, serde_json::from_value(data).unwrap());
        self
    }

    pub fn with_stock(mut self, symbol: &str, details: Value) -> Self {
        self.stocks
            .insert(symbol.to_string(), serde_json::from_value(details).unwrap());
        self
    }

    pub fn with_score(mut self, group_id: u64, score: Value) -> Self {
        self.scores
            .insert(group_id, serde_json::from_value(score).unwrap());
        self
    }

    /// Fail every request with `error`.
    pub fn failing(error: ApiError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    /// Number of upstream requests served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn begin(&self) -> Result<(), ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.failure {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl DataProvider for FakeData {
    async fn fetch_portfolios(&self) -> Result<Vec<Portfolio>, ApiError> {
        self.begin()?;
        Ok(self.portfolios.clone())
    }

    async fn fetch_dashboard_data(&self, group_id: u64) -> Result<DashboardData, ApiError> {
        self.begin()?;
        self.dashboards
            .get(&group_id)
            .cloned()
            .ok_or(ApiError::NotFound)
    }

    async fn fetch_stock_details(&self, symbol: &str) -> Result<StockDetails, ApiError> {
        self.begin()?;
        Ok(self.stocks.get(symbol).cloned().unwrap_or_default())
    }

    async fn fetch_portfolio_score(&self, group_id: u64) -> Result<PortfolioScore, ApiError> {
        self.begin()?;
        self.scores.get(&group_id).cloned().ok_or(ApiError::NotFound)
    }
}

/// Replies with a fixed completion and records every prompt.
pub struct FakeInference {
    reply: Result<String, InferenceError>,
    prompts: Mutex<Vec<String>>,
}

impl FakeInference {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: InferenceError) -> Self {
        Self {
            reply: Err(error),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl InferenceProvider for FakeInference {
    async fn complete(&self, _system: &str, prompt: &str) -> Result<String, InferenceError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply.clone()
    }
}
