//! Portfolio score tool.

use async_trait::async_trait;
use rmcp::model::{CallToolResult, JsonObject};
use serde::{Deserialize, Serialize};

use super::super::common::{group_id_field, parse_args, render, response_format_field};
use crate::domains::providers::PortfolioScore;
use crate::domains::providers::models::{ScoreComponents, StockScore};
use crate::domains::tools::format::{ResponseFormat, fixed, percent};
use crate::domains::tools::schema::InputSchema;
use crate::domains::tools::{ToolContext, ToolError, ToolHandler};

const TOP_STOCKS: usize = 5;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PortfolioScoreParams {
    pub group_id: u64,
    #[serde(default)]
    pub response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
pub struct ScoreBreakdown<'a> {
    pub group_id: u64,
    pub total_score: Option<f64>,
    pub holdings_score: Option<f64>,
    pub performance_score: Option<f64>,
    pub components: Option<&'a ScoreComponents>,
    pub stock_count: usize,
    pub top_stocks: Vec<&'a StockScore>,
}

impl<'a> ScoreBreakdown<'a> {
    fn new(group_id: u64, score: &'a PortfolioScore) -> Self {
        let mut ranked: Vec<&StockScore> = score.stocks().iter().collect();
        ranked.sort_by(|a, b| {
            b.score
                .unwrap_or(f64::MIN)
                .total_cmp(&a.score.unwrap_or(f64::MIN))
        });
        ranked.truncate(TOP_STOCKS);

        Self {
            group_id,
            total_score: score.total_score,
            holdings_score: score.holdings_score,
            performance_score: score.performance_score,
            components: score.components.as_ref(),
            stock_count: score.stocks().len(),
            top_stocks: ranked,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PortfolioScoreTool;

impl PortfolioScoreTool {
    pub const NAME: &'static str = "earnings_get_portfolio_score";

    pub const DESCRIPTION: &'static str = "Get the scoring breakdown of a portfolio: total score (0-100), holdings quality and performance scores, quality/valuation/momentum/diversification components, and the top scored stocks.";

    fn markdown(output: &ScoreBreakdown<'_>) -> String {
        let mut lines = vec![
            format!("# Portfolio {} Score", output.group_id),
            String::new(),
            format!("**Total Score**: {} / 100", fixed(output.total_score, 1)),
            String::new(),
            "## Score Components".to_string(),
            format!("- **Holdings Quality**: {}", fixed(output.holdings_score, 1)),
            format!("- **Performance**: {}", fixed(output.performance_score, 1)),
            String::new(),
        ];

        if let Some(c) = output.components {
            lines.push("## Breakdown".to_string());
            lines.push(format!("- Quality: {}", fixed(c.quality, 1)));
            lines.push(format!("- Valuation: {}", fixed(c.valuation, 1)));
            lines.push(format!("- Momentum: {}", fixed(c.momentum, 1)));
            lines.push(format!("- Diversification: {}", fixed(c.diversification, 1)));
            lines.push(String::new());
        }

        if !output.top_stocks.is_empty() {
            lines.push(format!("## Top {} Stocks by Score", output.top_stocks.len()));
            for s in &output.top_stocks {
                lines.push(format!(
                    "- **{}**: Score {}, Weight {}",
                    s.symbol.as_deref().unwrap_or("?"),
                    fixed(s.score, 1),
                    percent(s.weight)
                ));
            }
        }
        lines.join("\n")
    }
}

#[async_trait]
impl ToolHandler for PortfolioScoreTool {
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
        let params: PortfolioScoreParams = parse_args(args)?;
        let score = ctx.data().fetch_portfolio_score(params.group_id).await?;
        let output = ScoreBreakdown::new(params.group_id, &score);
        render(params.response_format, &output, || Self::markdown(&output))
    }
}
