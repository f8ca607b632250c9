//! Full stock details tool.

use async_trait::async_trait;
use rmcp::model::{CallToolResult, JsonObject};
use serde::{Deserialize, Serialize};

use super::super::common::{parse_args, render, response_format_field, symbol_field};
use super::{display_symbol, require_quote};
use crate::domains::providers::StockDetails;
use crate::domains::providers::models::{EarningsEstimate, PortfolioPosition, StockQuote};
use crate::domains::tools::format::{
    ResponseFormat, billions, fixed, money, percent, percent_signed,
};
use crate::domains::tools::schema::{FieldSpec, InputSchema};
use crate::domains::tools::{ToolContext, ToolError, ToolHandler};

const RECENT_EARNINGS: usize = 4;

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StockDetailsParams {
    pub symbol: String,
    #[serde(default = "default_true")]
    pub include_history: bool,
    #[serde(default = "default_true")]
    pub include_earnings: bool,
    #[serde(default)]
    pub response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
pub struct QuoteSection {
    pub price: Option<f64>,
    pub change_percent: Option<f64>,
    pub market_cap: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub forward_pe: Option<f64>,
    pub ps_ratio: Option<f64>,
    pub dividend_yield: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct StatsSection {
    pub volatility: Option<f64>,
    pub sharpe_ratio_1y: Option<f64>,
    pub return_1y: Option<f64>,
    pub max_drawdown: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct HistoryRange<'a> {
    pub from: Option<&'a str>,
    pub to: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub struct DetailsOutput<'a> {
    pub symbol: String,
    pub name: Option<&'a str>,
    pub quote: QuoteSection,
    pub stats: StatsSection,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_range: Option<HistoryRange<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub earnings: Option<&'a [EarningsEstimate]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub holdings: Option<&'a [PortfolioPosition]>,
}

impl<'a> DetailsOutput<'a> {
    fn new(
        symbol: String,
        q: &'a StockQuote,
        details: &'a StockDetails,
        params: &StockDetailsParams,
    ) -> Self {
        let history = details.history();
        let with_history = params.include_history && details.history.is_some();
        Self {
            symbol,
            name: q.name.as_deref(),
            quote: QuoteSection {
                price: q.price,
                change_percent: q.change_percent,
                market_cap: q.market_cap,
                pe_ratio: q.pe_ratio,
                forward_pe: q.forward_pe,
                ps_ratio: q.ps_ratio,
                dividend_yield: q.dividend_yield,
            },
            stats: StatsSection {
                volatility: q.volatility,
                sharpe_ratio_1y: q.sharpe_ratio_1y,
                return_1y: q.return_1y,
                max_drawdown: q.max_drawdown,
            },
            history_count: with_history.then_some(history.len()),
            history_range: (with_history && !history.is_empty()).then(|| HistoryRange {
                from: history.first().and_then(|p| p.date.as_deref()),
                to: history.last().and_then(|p| p.date.as_deref()),
            }),
            earnings: details
                .earnings
                .as_deref()
                .filter(|_| params.include_earnings),
            holdings: details.holdings.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StockDetailsTool;

impl StockDetailsTool {
    pub const NAME: &'static str = "earnings_get_stock_details";

    pub const DESCRIPTION: &'static str = "Get comprehensive stock details: quote and valuation metrics, risk statistics, optional 1-year price history and earnings estimates, and the portfolios holding the stock.";

    fn markdown(output: &DetailsOutput<'_>) -> String {
        let (quote, stats) = (&output.quote, &output.stats);
        let mut lines = vec![
            format!(
                "# {} - {}",
                output.symbol,
                output.name.unwrap_or("Unknown")
            ),
            String::new(),
            format!("**Price**: {}", money(quote.price)),
        ];
        if quote.change_percent.is_some() {
            lines.push(format!("**Today**: {}", percent_signed(quote.change_percent)));
        }

        lines.push(String::new());
        lines.push("## Valuation".to_string());
        if quote.market_cap.is_some() {
            lines.push(format!("- Market Cap: {}", billions(quote.market_cap)));
        }
        if quote.pe_ratio.is_some() {
            lines.push(format!("- P/E: {}", fixed(quote.pe_ratio, 2)));
        }
        if quote.forward_pe.is_some() {
            lines.push(format!("- Forward P/E: {}", fixed(quote.forward_pe, 2)));
        }
        if quote.ps_ratio.is_some() {
            lines.push(format!("- P/S: {}", fixed(quote.ps_ratio, 2)));
        }

        lines.push(String::new());
        lines.push("## Statistics".to_string());
        if stats.volatility.is_some() {
            lines.push(format!("- Volatility: {}", percent(stats.volatility)));
        }
        if stats.sharpe_ratio_1y.is_some() {
            lines.push(format!("- Sharpe (1Y): {}", fixed(stats.sharpe_ratio_1y, 2)));
        }
        if stats.return_1y.is_some() {
            lines.push(format!("- Return (1Y): {}", percent(stats.return_1y)));
        }
        if stats.max_drawdown.is_some() {
            lines.push(format!("- Max Drawdown: {}", percent(stats.max_drawdown)));
        }

        if let (Some(count), Some(range)) = (output.history_count, &output.history_range) {
            lines.push(String::new());
            lines.push(format!("## Price History ({count} days)"));
            lines.push(format!(
                "From {} to {}",
                range.from.unwrap_or("?"),
                range.to.unwrap_or("?")
            ));
        }

        if let Some(earnings) = output.earnings.filter(|e| !e.is_empty()) {
            lines.push(String::new());
            lines.push("## Recent Earnings".to_string());
            for e in earnings.iter().take(RECENT_EARNINGS) {
                let mut parts = vec![format!("- {}:", e.fiscal_date_ending.as_deref().unwrap_or("?"))];
                if e.eps_estimate.is_some() {
                    parts.push(format!("Est: {}", money(e.eps_estimate)));
                }
                if e.eps_actual.is_some() {
                    parts.push(format!("Actual: {}", money(e.eps_actual)));
                }
                lines.push(parts.join(" "));
            }
        }

        if let Some(holdings) = output.holdings.filter(|h| !h.is_empty()) {
            lines.push(String::new());
            lines.push("## Held By Portfolios".to_string());
            for h in holdings {
                lines.push(format!(
                    "- {}: {}",
                    h.name.as_deref().unwrap_or("Unnamed portfolio"),
                    percent(h.allocation)
                ));
            }
        }
        lines.join("\n")
    }
}

#[async_trait]
impl ToolHandler for StockDetailsTool {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        Self::DESCRIPTION
    }

    fn input_schema(&self) -> InputSchema {
        InputSchema::new(vec![
            symbol_field("Stock ticker symbol (e.g., AAPL, MSFT, GOOGL)"),
            FieldSpec::boolean("include_history", "Include 1-year price history")
                .with_default(true),
            FieldSpec::boolean("include_earnings", "Include earnings estimates")
                .with_default(true),
            response_format_field(),
        ])
    }

    async fn execute(
        &self,
        args: JsonObject,
        ctx: &ToolContext,
    ) -> Result<CallToolResult, ToolError> {
        let params: StockDetailsParams = parse_args(args)?;
        let details = ctx.data().fetch_stock_details(&params.symbol).await?;
        let q = require_quote(&details, &params.symbol)?;

        let output = DetailsOutput::new(display_symbol(q, &params.symbol), q, &details, &params);
        render(params.response_format, &output, || Self::markdown(&output))
    }
}
