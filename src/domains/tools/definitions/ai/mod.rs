//! AI-assisted tools.
//!
//! Each tool assembles a bounded text context from upstream data, asks the
//! inference provider for an analysis and renders the answer. All of them
//! fail with a configuration error when no inference provider is set.

mod analyze_portfolio;
mod analyze_stock;
mod common;
mod compare_portfolios;
mod comprehensive_stock;
mod market_sentiment;

pub use analyze_portfolio::AnalyzePortfolioTool;
pub use analyze_stock::AnalyzeStockTool;
pub use compare_portfolios::ComparePortfoliosTool;
pub use comprehensive_stock::ComprehensiveStockTool;
pub use market_sentiment::MarketSentimentTool;
