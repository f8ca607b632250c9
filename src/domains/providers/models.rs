//! Typed views of the upstream payloads.
//!
//! The data provider is not versioned and omits or nulls metrics freely, so
//! every field is optional and unknown fields are ignored.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One entry of `GET /api/portfolios`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Portfolio {
    pub id: i64,
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub member_count: Option<u32>,
    pub cagr: Option<f64>,
    pub std_dev: Option<f64>,
    pub max_drawdown: Option<f64>,
    pub sharpe: Option<f64>,
    pub sortino: Option<f64>,
    pub correlation_spy: Option<f64>,
    pub change_1d: Option<f64>,
    pub last_score: Option<f64>,
    pub stats_updated_at: Option<String>,
}

impl Portfolio {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Unnamed portfolio")
    }
}

/// `GET /api/dashboard-data?groupId=<id>`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardData {
    #[serde(rename = "lastUpdated")]
    pub last_updated: Option<String>,
    pub data: Option<Vec<Holding>>,
}

impl DashboardData {
    pub fn holdings(&self) -> &[Holding] {
        self.data.as_deref().unwrap_or_default()
    }
}

/// A position inside a portfolio.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Holding {
    pub symbol: Option<String>,
    pub name: Option<String>,
    pub allocation: Option<f64>,
    pub price: Option<f64>,
    pub forward_peg: Option<f64>,
    pub change_1d: Option<f64>,
    pub change_ytd: Option<f64>,
}

/// `GET /api/stock-details/<SYMBOL>`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StockDetails {
    pub quote: Option<StockQuote>,
    pub history: Option<Vec<PricePoint>>,
    pub earnings: Option<Vec<EarningsEstimate>>,
    pub holdings: Option<Vec<PortfolioPosition>>,
}

impl StockDetails {
    pub fn history(&self) -> &[PricePoint] {
        self.history.as_deref().unwrap_or_default()
    }

    pub fn earnings(&self) -> &[EarningsEstimate] {
        self.earnings.as_deref().unwrap_or_default()
    }

    pub fn holdings(&self) -> &[PortfolioPosition] {
        self.holdings.as_deref().unwrap_or_default()
    }
}

/// Quote, valuation, statistics and technicals merged by the provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StockQuote {
    pub symbol: Option<String>,
    pub name: Option<String>,
    pub price: Option<f64>,
    pub market_cap: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub forward_pe: Option<f64>,
    pub ps_ratio: Option<f64>,
    pub peg_ratio: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub fifty_two_week_high: Option<f64>,
    pub fifty_two_week_high_change_percent: Option<f64>,
    pub delta_52w_high: Option<f64>,
    pub change_percent: Option<f64>,
    pub change_ytd: Option<f64>,
    pub change_1y: Option<f64>,
    pub volume: Option<f64>,
    pub volatility: Option<f64>,
    pub sharpe_ratio_1y: Option<f64>,
    pub return_1y: Option<f64>,
    pub return_ytd: Option<f64>,
    pub max_drawdown: Option<f64>,
    pub sma_20: Option<f64>,
    pub sma_50: Option<f64>,
    pub sma_200: Option<f64>,
    pub eps_current_year: Option<f64>,
    pub eps_next_year: Option<f64>,
    /// Rendered markup (or a bare number) carrying the relative-strength rank.
    pub rs_rank_1m: Option<Value>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PricePoint {
    pub date: Option<String>,
    pub close: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EarningsEstimate {
    pub fiscal_date_ending: Option<String>,
    pub eps_estimate: Option<f64>,
    pub eps_actual: Option<f64>,
    pub revenue_estimate: Option<f64>,
    pub revenue_actual: Option<f64>,
}

/// A portfolio holding the requested stock.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PortfolioPosition {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub allocation: Option<f64>,
}

/// `GET /api/scoring/<id>`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PortfolioScore {
    pub group_id: Option<i64>,
    pub total_score: Option<f64>,
    pub holdings_score: Option<f64>,
    pub performance_score: Option<f64>,
    pub components: Option<ScoreComponents>,
    pub stock_details: Option<Vec<StockScore>>,
}

impl PortfolioScore {
    pub fn stocks(&self) -> &[StockScore] {
        self.stock_details.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreComponents {
    pub quality: Option<f64>,
    pub valuation: Option<f64>,
    pub momentum: Option<f64>,
    pub diversification: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StockScore {
    pub symbol: Option<String>,
    pub weight: Option<f64>,
    pub score: Option<f64>,
}
