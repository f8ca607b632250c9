//! Stock quote tool.

use async_trait::async_trait;
use rmcp::model::{CallToolResult, JsonObject};
use serde::{Deserialize, Serialize};

use super::super::common::{parse_args, render, response_format_field, symbol_field};
use super::{display_symbol, require_quote};
use crate::domains::providers::models::StockQuote;
use crate::domains::tools::format::{
    ResponseFormat, billions, fixed, money, percent, percent_signed,
};
use crate::domains::tools::schema::InputSchema;
use crate::domains::tools::{ToolContext, ToolError, ToolHandler};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StockQuoteParams {
    pub symbol: String,
    #[serde(default)]
    pub response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
pub struct QuoteOutput<'a> {
    pub symbol: String,
    pub name: Option<&'a str>,
    pub price: Option<f64>,
    pub change_percent: Option<f64>,
    pub market_cap: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub forward_pe: Option<f64>,
    pub ps_ratio: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub fifty_two_week_high: Option<f64>,
    pub fifty_two_week_high_change_percent: Option<f64>,
    pub volume: Option<f64>,
    pub updated_at: Option<&'a str>,
}

#[derive(Debug, Clone, Default)]
pub struct StockQuoteTool;

impl StockQuoteTool {
    pub const NAME: &'static str = "earnings_get_stock_quote";

    pub const DESCRIPTION: &'static str = "Get the current quote of a stock: price and daily change, market cap, trailing and forward P/E, P/S ratio, dividend yield, 52-week high and distance from it, and volume.";

    fn markdown(symbol: &str, q: &StockQuote) -> String {
        let mut lines = vec![
            format!("# {} - {}", symbol, q.name.as_deref().unwrap_or("Unknown")),
            String::new(),
            format!("**Price**: {}", money(q.price)),
        ];
        if q.change_percent.is_some() {
            lines.push(format!("**Today**: {}", percent_signed(q.change_percent)));
        }

        lines.push(String::new());
        lines.push("## Valuation".to_string());
        if q.market_cap.is_some() {
            lines.push(format!("- **Market Cap**: {}", billions(q.market_cap)));
        }
        if q.pe_ratio.is_some() {
            lines.push(format!("- **P/E Ratio**: {}", fixed(q.pe_ratio, 2)));
        }
        if q.forward_pe.is_some() {
            lines.push(format!("- **Forward P/E**: {}", fixed(q.forward_pe, 2)));
        }
        if q.ps_ratio.is_some() {
            lines.push(format!("- **P/S Ratio**: {}", fixed(q.ps_ratio, 2)));
        }
        if q.dividend_yield.is_some() {
            lines.push(format!("- **Dividend Yield**: {}", percent(q.dividend_yield)));
        }

        lines.push(String::new());
        lines.push("## 52-Week".to_string());
        if q.fifty_two_week_high.is_some() {
            lines.push(format!("- **52W High**: {}", money(q.fifty_two_week_high)));
        }
        if q.fifty_two_week_high_change_percent.is_some() {
            lines.push(format!(
                "- **From High**: {}",
                percent(q.fifty_two_week_high_change_percent)
            ));
        }
        if let Some(volume) = q.volume {
            lines.push(format!("- **Volume**: {volume:.0}"));
        }
        lines.join("\n")
    }
}

#[async_trait]
impl ToolHandler for StockQuoteTool {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        Self::DESCRIPTION
    }

    fn input_schema(&self) -> InputSchema {
        InputSchema::new(vec![
            symbol_field("Stock ticker symbol (e.g., AAPL, MSFT, GOOGL)"),
            response_format_field(),
        ])
    }

    async fn execute(
        &self,
        args: JsonObject,
        ctx: &ToolContext,
    ) -> Result<CallToolResult, ToolError> {
        let params: StockQuoteParams = parse_args(args)?;
        let details = ctx.data().fetch_stock_details(&params.symbol).await?;
        let q = require_quote(&details, &params.symbol)?;
        let symbol = display_symbol(q, &params.symbol);

        let output = QuoteOutput {
            symbol: symbol.clone(),
            name: q.name.as_deref(),
            price: q.price,
            change_percent: q.change_percent,
            market_cap: q.market_cap,
            pe_ratio: q.pe_ratio,
            forward_pe: q.forward_pe,
            ps_ratio: q.ps_ratio,
            dividend_yield: q.dividend_yield,
            fifty_two_week_high: q.fifty_two_week_high,
            fifty_two_week_high_change_percent: q.fifty_two_week_high_change_percent,
            volume: q.volume,
            updated_at: q.updated_at.as_deref(),
        };
        render(params.response_format, &output, || Self::markdown(&symbol, q))
    }
}

#[cfg(test)]
mod tests {
    use super::super::super::common::testing::*;
    use super::super::fixtures;
    use super::*;
    use crate::domains::providers::fake::FakeData;
    use serde_json::json;
    use std::sync::Arc;

    fn ctx(data: FakeData) -> ToolContext {
        ToolContext::new(Arc::new(data), None)
    }

    fn args(value: serde_json::Value) -> JsonObject {
        StockQuoteTool.input_schema().validate(Some(&value)).unwrap()
    }

    #[tokio::test]
    async fn test_markdown_quote() {
        let data = FakeData::new().with_stock("AAPL", fixtures::aapl());
        let result = StockQuoteTool
            .execute(args(json!({"symbol": "aapl"})), &ctx(data))
            .await
            .unwrap();

        let text = text(&result);
        assert!(text.starts_with("# AAPL - Apple Inc."));
        assert!(text.contains("**Price**: $189.50"));
        assert!(text.contains("**Today**: +1.23%"));
        assert!(text.contains("- **Market Cap**: $2950.00B"));
        assert!(text.contains("- **P/E Ratio**: 29.41"));
        assert!(text.contains("- **From High**: -5.1%"));
    }

    #[tokio::test]
    async fn test_symbol_falls_back_to_request() {
        let data = FakeData::new().with_stock("TSLA", json!({"quote": {"price": null}}));
        let result = StockQuoteTool
            .execute(
                args(json!({"symbol": "tsla", "response_format": "json"})),
                &ctx(data),
            )
            .await
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&text(&result)).unwrap();
        assert_eq!(parsed["symbol"], "TSLA");
        assert!(parsed["price"].is_null());
    }

    #[tokio::test]
    async fn test_unknown_symbol_is_not_found() {
        let err = StockQuoteTool
            .execute(args(json!({"symbol": "zzzz"})), &ctx(FakeData::new()))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Stock ZZZZ not found.");
    }

    #[test]
    fn test_params_match_schema() {
        crate::domains::tools::definitions::common::testing::assert_params_decode::<StockQuoteParams>(
            &StockQuoteTool,
        );
    }
}
