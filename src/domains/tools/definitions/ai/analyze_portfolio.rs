//! AI portfolio analysis tool.

use async_trait::async_trait;
use rmcp::model::{CallToolResult, JsonObject};
use serde::{Deserialize, Serialize};

use super::super::common::{
    group_id_field, parse_args, question_field, render, response_format_field,
};
use super::common::{GENERAL_ANALYSIS, analysis_markdown, run_analysis};
use crate::domains::providers::Portfolio;
use crate::domains::providers::models::Holding;
use crate::domains::tools::format::{ResponseFormat, fixed, percent, percent_signed};
use crate::domains::tools::schema::InputSchema;
use crate::domains::tools::{ToolContext, ToolError, ToolHandler};

const CONTEXT_HOLDINGS: usize = 10;

const INSTRUCTIONS: &str = "Provide:\n1. Overall assessment (1-2 sentences)\n2. Strengths (2-3 bullet points)\n3. Areas for improvement (2-3 bullet points)\n4. One actionable recommendation";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalyzePortfolioParams {
    pub group_id: u64,
    pub question: Option<String>,
    #[serde(default)]
    pub response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
pub struct PortfolioContextSummary {
    pub holdings_count: usize,
    pub cagr: Option<f64>,
    pub sharpe: Option<f64>,
    pub score: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct PortfolioAnalysis<'a> {
    pub group_id: u64,
    pub portfolio_name: &'a str,
    pub question: &'a str,
    pub analysis: String,
    pub context_summary: PortfolioContextSummary,
}

/// Summary of a portfolio and its largest holdings.
pub fn portfolio_context(portfolio: &Portfolio, holdings: &[Holding]) -> String {
    let count = portfolio
        .member_count
        .map(|c| c as usize)
        .unwrap_or(holdings.len());
    let mut lines = vec![
        format!("Portfolio: {}", portfolio.display_name()),
        format!("Holdings: {count} stocks"),
        String::new(),
    ];
    if portfolio.cagr.is_some() {
        lines.push(format!("CAGR: {}", percent(portfolio.cagr)));
    }
    if portfolio.sharpe.is_some() {
        lines.push(format!("Sharpe Ratio: {}", fixed(portfolio.sharpe, 2)));
    }
    if portfolio.sortino.is_some() {
        lines.push(format!("Sortino Ratio: {}", fixed(portfolio.sortino, 2)));
    }
    if portfolio.max_drawdown.is_some() {
        lines.push(format!("Max Drawdown: {}", percent(portfolio.max_drawdown)));
    }
    if portfolio.last_score.is_some() {
        lines.push(format!("Score: {}", fixed(portfolio.last_score, 1)));
    }

    lines.push(String::new());
    lines.push("Top Holdings:".to_string());
    for h in holdings.iter().take(CONTEXT_HOLDINGS) {
        let mut line = format!(
            "- {}: {}",
            h.symbol.as_deref().unwrap_or("?"),
            percent(h.allocation)
        );
        if h.change_1d.is_some() {
            line.push(' ');
            line.push_str(&percent_signed(h.change_1d));
        }
        lines.push(line);
    }
    lines.join("\n")
}

#[derive(Debug, Clone, Default)]
pub struct AnalyzePortfolioTool;

impl AnalyzePortfolioTool {
    pub const NAME: &'static str = "earnings_ai_analyze_portfolio";

    pub const DESCRIPTION: &'static str = "Use AI to analyze a portfolio: holdings composition, performance (CAGR, Sharpe, Sortino), risk (max drawdown) and overall score. Optionally answer a specific question. Requires CLOUDFLARE_ACCOUNT_ID and CLOUDFLARE_API_TOKEN.";
}

#[async_trait]
impl ToolHandler for AnalyzePortfolioTool {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        Self::DESCRIPTION
    }

    fn input_schema(&self) -> InputSchema {
        InputSchema::new(vec![
            group_id_field(),
            question_field(),
            response_format_field(),
        ])
    }

    async fn execute(
        &self,
        args: JsonObject,
        ctx: &ToolContext,
    ) -> Result<CallToolResult, ToolError> {
        let params: AnalyzePortfolioParams = parse_args(args)?;
        let inference = ctx.inference()?;

        let portfolios = ctx.data().fetch_portfolios().await?;
        let portfolio = portfolios
            .iter()
            .find(|p| p.id == params.group_id as i64)
            .ok_or_else(|| ToolError::not_found(format!("Portfolio {} not found.", params.group_id)))?;

        let dashboard = ctx.data().fetch_dashboard_data(params.group_id).await?;
        let holdings = dashboard.holdings();

        let question = params.question.as_deref();
        let analysis = run_analysis(
            inference,
            portfolio_context(portfolio, holdings),
            question,
            &format!("Analyze this portfolio and provide key insights.\n\n{INSTRUCTIONS}"),
        )
        .await?;

        let output = PortfolioAnalysis {
            group_id: params.group_id,
            portfolio_name: portfolio.display_name(),
            question: question.unwrap_or(GENERAL_ANALYSIS),
            analysis,
            context_summary: PortfolioContextSummary {
                holdings_count: holdings.len(),
                cagr: portfolio.cagr,
                sharpe: portfolio.sharpe,
                score: portfolio.last_score,
            },
        };
        render(params.response_format, &output, || {
            analysis_markdown(
                &format!("AI Analysis: {}", output.portfolio_name),
                question,
                &output.analysis,
                &format!(
                    "Based on {} holdings | CAGR: {} | Sharpe: {}",
                    holdings.len(),
                    percent(portfolio.cagr),
                    fixed(portfolio.sharpe, 2)
                ),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::super::common::testing::*;
    use super::*;
    use crate::domains::providers::fake::{FakeData, FakeInference};
    use serde_json::json;
    use std::sync::Arc;

    fn data() -> FakeData {
        FakeData::new()
            .with_portfolios(json!([
                {"id": 2, "name": "WSB", "member_count": 3, "cagr": 0.31, "sharpe": 0.9, "last_score": 55.0}
            ]))
            .with_dashboard(
                2,
                json!({"data": [
                    {"symbol": "GME", "allocation": 0.5, "change_1d": 0.08},
                    {"symbol": "AMC", "allocation": 0.3}
                ]}),
            )
    }

    fn args(value: serde_json::Value) -> JsonObject {
        AnalyzePortfolioTool
            .input_schema()
            .validate(Some(&value))
            .unwrap()
    }

    #[tokio::test]
    async fn test_unconfigured_ai_fails_before_fetching() {
        let data = Arc::new(data());
        let ctx = ToolContext::new(data.clone(), None);
        let err = AnalyzePortfolioTool
            .execute(args(json!({"group_id": 2})), &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::NotConfigured));
        assert_eq!(data.calls(), 0);
    }

    #[tokio::test]
    async fn test_analysis_with_question() {
        let inference = Arc::new(FakeInference::replying("Too concentrated."));
        let ctx = ToolContext::new(Arc::new(data()), Some(inference.clone()));
        let result = AnalyzePortfolioTool
            .execute(
                args(json!({"group_id": 2, "question": "Is this too concentrated?"})),
                &ctx,
            )
            .await
            .unwrap();

        let prompt = &inference.prompts()[0];
        assert!(prompt.contains("Portfolio: WSB"));
        assert!(prompt.contains("- GME: 50.0% +8.00%"));
        assert!(prompt.contains("Question: Is this too concentrated?"));

        let structured = structured(&result);
        assert_eq!(structured["portfolio_name"], "WSB");
        assert_eq!(structured["analysis"], "Too concentrated.");
        assert_eq!(structured["context_summary"]["holdings_count"], 2);

        let text = text(&result);
        assert!(text.starts_with("# AI Analysis: WSB"));
        assert!(text.contains("**Question**: Is this too concentrated?"));
        assert!(text.contains("*Based on 2 holdings | CAGR: 31.0% | Sharpe: 0.90*"));
    }

    #[tokio::test]
    async fn test_unknown_portfolio() {
        let ctx = ToolContext::new(
            Arc::new(data()),
            Some(Arc::new(FakeInference::replying("unused"))),
        );
        let err = AnalyzePortfolioTool
            .execute(args(json!({"group_id": 99})), &ctx)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Portfolio 99 not found.");
    }

    #[test]
    fn test_question_length_is_bounded() {
        let schema = AnalyzePortfolioTool.input_schema();
        assert!(schema.validate(Some(&json!({"group_id": 1, "question": "why"}))).is_err());
        assert!(
            schema
                .validate(Some(&json!({"group_id": 1, "question": "x".repeat(501)})))
                .is_err()
        );
    }

    #[test]
    fn test_params_match_schema() {
        crate::domains::tools::definitions::common::testing::assert_params_decode::<AnalyzePortfolioParams>(
            &AnalyzePortfolioTool,
        );
    }
}
