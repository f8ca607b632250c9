//! Stock statistics tool.

use async_trait::async_trait;
use rmcp::model::{CallToolResult, JsonObject};
use serde::{Deserialize, Serialize};

use super::super::common::{parse_args, render, response_format_field, symbol_field};
use super::{display_symbol, require_quote};
use crate::domains::tools::format::{ResponseFormat, fixed, percent};
use crate::domains::tools::schema::InputSchema;
use crate::domains::tools::{ToolContext, ToolError, ToolHandler};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StockStatsParams {
    pub symbol: String,
    #[serde(default)]
    pub response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
pub struct StatsOutput<'a> {
    pub symbol: String,
    pub name: Option<&'a str>,
    pub volatility: Option<f64>,
    pub sharpe_ratio_1y: Option<f64>,
    pub return_1y: Option<f64>,
    pub return_ytd: Option<f64>,
    pub max_drawdown: Option<f64>,
    pub updated_at: Option<&'a str>,
}

#[derive(Debug, Clone, Default)]
pub struct StockStatsTool;

impl StockStatsTool {
    pub const NAME: &'static str = "earnings_get_stock_stats";

    pub const DESCRIPTION: &'static str = "Get risk and return statistics of a stock: annualized volatility, 1-year Sharpe ratio, 1-year and YTD returns, and max drawdown.";

    fn markdown(output: &StatsOutput<'_>) -> String {
        let mut lines = vec![format!("# {} Statistics", output.symbol), String::new()];

        lines.push("## Risk Metrics".to_string());
        if output.volatility.is_some() {
            lines.push(format!("- **Volatility**: {}", percent(output.volatility)));
        }
        if output.max_drawdown.is_some() {
            lines.push(format!("- **Max Drawdown**: {}", percent(output.max_drawdown)));
        }

        lines.push(String::new());
        lines.push("## Risk-Adjusted Returns".to_string());
        if output.sharpe_ratio_1y.is_some() {
            lines.push(format!(
                "- **Sharpe Ratio (1Y)**: {}",
                fixed(output.sharpe_ratio_1y, 2)
            ));
        }

        lines.push(String::new());
        lines.push("## Returns".to_string());
        if output.return_1y.is_some() {
            lines.push(format!("- **1 Year**: {}", percent(output.return_1y)));
        }
        if output.return_ytd.is_some() {
            lines.push(format!("- **YTD**: {}", percent(output.return_ytd)));
        }
        lines.join("\n")
    }
}

#[async_trait]
impl ToolHandler for StockStatsTool {
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
        let params: StockStatsParams = parse_args(args)?;
        let details = ctx.data().fetch_stock_details(&params.symbol).await?;
        let q = require_quote(&details, &params.symbol)?;

        let output = StatsOutput {
            symbol: display_symbol(q, &params.symbol),
            name: q.name.as_deref(),
            volatility: q.volatility,
            sharpe_ratio_1y: q.sharpe_ratio_1y,
            return_1y: q.return_1y,
            return_ytd: q.return_ytd,
            max_drawdown: q.max_drawdown,
            updated_at: q.updated_at.as_deref(),
        };
        render(params.response_format, &output, || Self::markdown(&output))
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

    #[tokio::test]
    async fn test_stats() {
        let ctx = ToolContext::new(
            Arc::new(FakeData::new().with_stock("AAPL", fixtures::aapl())),
            None,
        );
        let args = StockStatsTool
            .input_schema()
            .validate(Some(&json!({"symbol": "aapl"})))
            .unwrap();
        let result = StockStatsTool.execute(args, &ctx).await.unwrap();

        let text = text(&result);
        assert!(text.starts_with("# AAPL Statistics"));
        assert!(text.contains("- **Volatility**: 22.4%"));
        assert!(text.contains("- **Max Drawdown**: -16.3%"));
        assert!(text.contains("- **Sharpe Ratio (1Y)**: 1.12"));
        assert!(text.contains("- **YTD**: 5.1%"));
        assert_eq!(structured(&result)["return_1y"], 0.182);
    }

    #[test]
    fn test_params_match_schema() {
        crate::domains::tools::definitions::common::testing::assert_params_decode::<StockStatsParams>(
            &StockStatsTool,
        );
    }
}
