//! Portfolio holdings tool.

use async_trait::async_trait;
use rmcp::model::{CallToolResult, JsonObject};
use serde::{Deserialize, Serialize};

use super::super::common::{group_id_field, parse_args, render, response_format_field, text_result};
use crate::domains::providers::models::Holding;
use crate::domains::tools::format::{ResponseFormat, money, percent, percent_signed};
use crate::domains::tools::schema::InputSchema;
use crate::domains::tools::{ToolContext, ToolError, ToolHandler};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PortfolioHoldingsParams {
    pub group_id: u64,
    #[serde(default)]
    pub response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
pub struct PortfolioHoldings<'a> {
    pub group_id: u64,
    pub last_updated: Option<&'a str>,
    pub count: usize,
    pub holdings: &'a [Holding],
}

#[derive(Debug, Clone, Default)]
pub struct PortfolioHoldingsTool;

impl PortfolioHoldingsTool {
    pub const NAME: &'static str = "earnings_get_portfolio_holdings";

    pub const DESCRIPTION: &'static str = "Get the holdings of a portfolio: symbol, name, allocation, current price, daily and YTD change, and forward PEG ratio.";

    fn markdown(output: &PortfolioHoldings<'_>) -> String {
        let mut lines = vec![
            format!(
                "# Portfolio {} Holdings ({} stocks)",
                output.group_id, output.count
            ),
            String::new(),
        ];
        if let Some(updated) = output.last_updated {
            lines.push(format!("*Last updated: {updated}*"));
            lines.push(String::new());
        }
        lines.push("| Symbol | Name | Allocation | Price | 1D Change | YTD |".to_string());
        lines.push("|--------|------|------------|-------|-----------|-----|".to_string());
        for h in output.holdings {
            lines.push(format!(
                "| {} | {} | {} | {} | {} | {} |",
                h.symbol.as_deref().unwrap_or("?"),
                h.name.as_deref().unwrap_or(""),
                percent(h.allocation),
                money(h.price),
                percent_signed(h.change_1d),
                percent_signed(h.change_ytd),
            ));
        }
        lines.join("\n")
    }
}

#[async_trait]
impl ToolHandler for PortfolioHoldingsTool {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        Self::DESCRIPTION
    }

    fn input_schema(&self) -> InputSchema {
        InputSchema::new(vec![group_id_field(), response_format_field()])
    }

    async fn execute(
        &self,
        args: JsonObject,
        ctx: &ToolContext,
    ) -> Result<CallToolResult, ToolError> {
        let params: PortfolioHoldingsParams = parse_args(args)?;
        let data = ctx.data().fetch_dashboard_data(params.group_id).await?;
        let holdings = data.holdings();

        if holdings.is_empty() {
            return Ok(text_result(format!(
                "No holdings found for portfolio {}.",
                params.group_id
            )));
        }

        let output = PortfolioHoldings {
            group_id: params.group_id,
            last_updated: data.last_updated.as_deref(),
            count: holdings.len(),
            holdings,
        };
        render(params.response_format, &output, || Self::markdown(&output))
    }
}
