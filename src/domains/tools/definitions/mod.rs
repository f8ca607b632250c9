//! Tool definitions.
//!
//! Each tool lives in its own file and implements [`ToolHandler`]; [`all`]
//! lists them in catalog order.

pub mod ai;
pub mod common;
pub mod portfolio;
pub mod stock;

pub use ai::{
    AnalyzePortfolioTool, AnalyzeStockTool, ComparePortfoliosTool, ComprehensiveStockTool,
    MarketSentimentTool,
};
pub use portfolio::{ListPortfoliosTool, PortfolioHoldingsTool, PortfolioScoreTool};
pub use stock::{StockDetailsTool, StockQuoteTool, StockStatsTool};

use super::ToolHandler;

/// Every tool served, in the order `tools/list` reports them.
pub fn all() -> Vec<Box<dyn ToolHandler>> {
    vec![
        Box::new(ListPortfoliosTool),
        Box::new(PortfolioHoldingsTool),
        Box::new(PortfolioScoreTool),
        Box::new(StockQuoteTool),
        Box::new(StockDetailsTool),
        Box::new(StockStatsTool),
        Box::new(AnalyzePortfolioTool),
        Box::new(AnalyzeStockTool),
        Box::new(ComparePortfoliosTool),
        Box::new(MarketSentimentTool),
        Box::new(ComprehensiveStockTool),
    ]
}
