//! List portfolios tool.

use async_trait::async_trait;
use rmcp::model::{CallToolResult, JsonObject};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::super::common::{parse_args, render, response_format_field, text_result};
use crate::domains::providers::Portfolio;
use crate::domains::tools::format::{ResponseFormat, fixed, percent};
use crate::domains::tools::schema::InputSchema;
use crate::domains::tools::{ToolContext, ToolError, ToolHandler};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListPortfoliosParams {
    #[serde(default)]
    pub response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
pub struct PortfolioList {
    pub count: usize,
    pub portfolios: Vec<PortfolioSummary>,
}

#[derive(Debug, Serialize)]
pub struct PortfolioSummary {
    pub id: i64,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub member_count: Option<u32>,
    pub cagr: Option<f64>,
    pub sharpe: Option<f64>,
    pub sortino: Option<f64>,
    pub max_drawdown: Option<f64>,
    pub score: Option<f64>,
    pub updated_at: Option<String>,
}

impl From<&Portfolio> for PortfolioSummary {
    fn from(p: &Portfolio) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            kind: p.kind.clone(),
            member_count: p.member_count,
            cagr: p.cagr,
            sharpe: p.sharpe,
            sortino: p.sortino,
            max_drawdown: p.max_drawdown,
            score: p.last_score,
            updated_at: p.stats_updated_at.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ListPortfoliosTool;

impl ListPortfoliosTool {
    pub const NAME: &'static str = "earnings_list_portfolios";

    pub const DESCRIPTION: &'static str = "List all portfolios with their stats: ID, name, type, number of holdings, CAGR, Sharpe and Sortino ratios, max drawdown and overall score. Use the portfolio IDs with the other portfolio tools.";

    fn markdown(portfolios: &[Portfolio]) -> String {
        let mut lines = vec![format!("# Portfolios ({})", portfolios.len()), String::new()];
        for p in portfolios {
            lines.push(format!("## {} (ID: {})", p.display_name(), p.id));
            if let Some(count) = p.member_count {
                lines.push(format!("- **Holdings**: {count} stocks"));
            }
            if let Some(kind) = &p.kind {
                lines.push(format!("- **Type**: {kind}"));
            }
            if p.cagr.is_some() {
                lines.push(format!("- **CAGR**: {}", percent(p.cagr)));
            }
            if p.sharpe.is_some() {
                lines.push(format!("- **Sharpe**: {}", fixed(p.sharpe, 2)));
            }
            if p.sortino.is_some() {
                lines.push(format!("- **Sortino**: {}", fixed(p.sortino, 2)));
            }
            if p.max_drawdown.is_some() {
                lines.push(format!("- **Max Drawdown**: {}", percent(p.max_drawdown)));
            }
            if p.last_score.is_some() {
                lines.push(format!("- **Score**: {}", fixed(p.last_score, 1)));
            }
            lines.push(String::new());
        }
        lines.join("\n")
    }
}

#[async_trait]
impl ToolHandler for ListPortfoliosTool {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        Self::DESCRIPTION
    }

    fn input_schema(&self) -> InputSchema {
        InputSchema::new(vec![response_format_field()])
    }

    async fn execute(
        &self,
        args: JsonObject,
        ctx: &ToolContext,
    ) -> Result<CallToolResult, ToolError> {
        let params: ListPortfoliosParams = parse_args(args)?;
        let portfolios = ctx.data().fetch_portfolios().await?;
        info!("Fetched {} portfolios", portfolios.len());

        if portfolios.is_empty() {
            return Ok(text_result("No portfolios found."));
        }

        let output = PortfolioList {
            count: portfolios.len(),
            portfolios: portfolios.iter().map(PortfolioSummary::from).collect(),
        };
        render(params.response_format, &output, || Self::markdown(&portfolios))
    }
}

#[cfg(test)]
mod tests {
    use super::super::super::common::testing::*;
    use super::*;
    use crate::domains::providers::ApiError;
    use crate::domains::providers::fake::FakeData;
    use serde_json::json;
    use std::sync::Arc;

    fn ctx(data: FakeData) -> ToolContext {
        ToolContext::new(Arc::new(data), None)
    }

    fn args(value: serde_json::Value) -> JsonObject {
        ListPortfoliosTool
            .input_schema()
            .validate(Some(&value))
            .unwrap()
    }

    #[tokio::test]
    async fn test_markdown_listing() {
        let data = FakeData::new().with_portfolios(json!([
            {"id": 1, "name": "Buffett", "member_count": 12, "cagr": 0.154, "sharpe": 1.234, "last_score": 81.26},
            {"id": 2, "name": "Growth", "cagr": 22.5}
        ]));
        let result = ListPortfoliosTool
            .execute(args(json!({})), &ctx(data))
            .await
            .unwrap();

        let text = text(&result);
        assert!(text.starts_with("# Portfolios (2)"));
        assert!(text.contains("## Buffett (ID: 1)"));
        assert!(text.contains("- **CAGR**: 15.4%"));
        assert!(text.contains("- **CAGR**: 22.5%"));
        assert!(text.contains("- **Sharpe**: 1.23"));
        assert!(text.contains("- **Score**: 81.3"));
        assert_eq!(structured(&result)["count"], 2);
    }

    #[tokio::test]
    async fn test_json_output_fields() {
        let data = FakeData::new().with_portfolios(json!([
            {"id": 7, "name": "Income", "type": "model", "last_score": 70.0, "stats_updated_at": "2025-01-01"}
        ]));
        let result = ListPortfoliosTool
            .execute(args(json!({"response_format": "json"})), &ctx(data))
            .await
            .unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&text(&result)).unwrap();
        let first = &parsed["portfolios"][0];
        assert_eq!(first["id"], 7);
        assert_eq!(first["type"], "model");
        assert_eq!(first["score"], 70.0);
        assert_eq!(first["updated_at"], "2025-01-01");
        assert!(first["cagr"].is_null());
    }

    #[tokio::test]
    async fn test_empty_and_upstream_failure() {
        let result = ListPortfoliosTool
            .execute(args(json!({})), &ctx(FakeData::new()))
            .await
            .unwrap();
        assert_eq!(text(&result), "No portfolios found.");
        assert!(!is_error(&result));

        let err = ListPortfoliosTool
            .execute(args(json!({})), &ctx(FakeData::failing(ApiError::Timeout)))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }

    #[test]
    fn test_params_match_schema() {
        crate::domains::tools::definitions::common::testing::assert_params_decode::<ListPortfoliosParams>(
            &ListPortfoliosTool,
        );
    }
}
