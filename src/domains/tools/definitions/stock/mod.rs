//! Stock tools: quote, full details and statistics.

mod details;
mod quote;
mod stats;

pub use details::StockDetailsTool;
pub use quote::StockQuoteTool;
pub use stats::StockStatsTool;

use crate::domains::providers::StockDetails;
use crate::domains::providers::models::StockQuote;
use crate::domains::tools::ToolError;

/// The quote of `details`, or a "not found" error naming `symbol`.
pub(crate) fn require_quote<'a>(
    details: &'a StockDetails,
    symbol: &str,
) -> Result<&'a StockQuote, ToolError> {
    details
        .quote
        .as_ref()
        .ok_or_else(|| ToolError::not_found(format!("Stock {symbol} not found.")))
}

/// Upstream symbol, falling back to the normalized request symbol.
pub(crate) fn display_symbol(quote: &StockQuote, requested: &str) -> String {
    quote
        .symbol
        .as_deref()
        .filter(|s| !s.is_empty())
        .unwrap_or(requested)
        .to_uppercase()
}
