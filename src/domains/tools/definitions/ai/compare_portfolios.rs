//! AI side-by-side portfolio comparison tool.

use async_trait::async_trait;
use rmcp::model::{CallToolResult, JsonObject};
use serde::{Deserialize, Serialize};

use super::super::common::{parse_args, question_field, render, response_format_field};
use super::common::{GENERAL_ANALYSIS, analysis_markdown, run_analysis};
use crate::domains::providers::Portfolio;
use crate::domains::tools::format::{ResponseFormat, fixed, percent};
use crate::domains::tools::schema::{FieldSpec, InputSchema};
use crate::domains::tools::{ToolContext, ToolError, ToolHandler};

const INSTRUCTIONS: &str = "Compare these two portfolios. Which one offers better risk-adjusted returns? What are the trade-offs?";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComparePortfoliosParams {
    pub portfolio_id_a: i64,
    pub portfolio_id_b: i64,
    pub question: Option<String>,
    #[serde(default)]
    pub response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
pub struct ComparedPortfolio<'a> {
    pub id: i64,
    pub name: &'a str,
    pub cagr: Option<f64>,
    pub sharpe: Option<f64>,
    pub member_count: Option<u32>,
    pub score: Option<f64>,
}

impl<'a> From<&'a Portfolio> for ComparedPortfolio<'a> {
    fn from(p: &'a Portfolio) -> Self {
        Self {
            id: p.id,
            name: p.display_name(),
            cagr: p.cagr,
            sharpe: p.sharpe,
            member_count: p.member_count,
            score: p.last_score,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ComparisonContextSummary<'a> {
    pub portfolio_a: ComparedPortfolio<'a>,
    pub portfolio_b: ComparedPortfolio<'a>,
}

#[derive(Debug, Serialize)]
pub struct PortfolioComparison<'a> {
    pub portfolio_id_a: i64,
    pub portfolio_id_b: i64,
    pub question: &'a str,
    pub analysis: String,
    pub context_summary: ComparisonContextSummary<'a>,
}

fn describe(label: &str, p: &Portfolio) -> String {
    format!(
        "Portfolio {label}: {} (ID: {})\n- CAGR: {}\n- Sharpe: {}\n- Holdings: {}\n- Score: {}",
        p.display_name(),
        p.id,
        percent(p.cagr),
        fixed(p.sharpe, 2),
        p.member_count
            .map(|c| c.to_string())
            .unwrap_or_else(|| "N/A".to_string()),
        fixed(p.last_score, 1),
    )
}

/// Both portfolios' headline metrics, labelled A and B.
pub fn comparison_context(a: &Portfolio, b: &Portfolio) -> String {
    format!("{}\n\n{}", describe("A", a), describe("B", b))
}

#[derive(Debug, Clone, Default)]
pub struct ComparePortfoliosTool;

impl ComparePortfoliosTool {
    pub const NAME: &'static str = "earnings_ai_compare_portfolios";

    pub const DESCRIPTION: &'static str = "Use AI to compare two portfolios side-by-side on CAGR, Sharpe ratio, number of holdings and score. Portfolio IDs may be given as numbers or numeric strings. Requires CLOUDFLARE_ACCOUNT_ID and CLOUDFLARE_API_TOKEN.";
}

#[async_trait]
impl ToolHandler for ComparePortfoliosTool {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        Self::DESCRIPTION
    }

    fn input_schema(&self) -> InputSchema {
        InputSchema::new(vec![
            FieldSpec::integer("portfolio_id_a", "First portfolio ID")
                .min(1)
                .accept_numeric_string()
                .required(),
            FieldSpec::integer("portfolio_id_b", "Second portfolio ID")
                .min(1)
                .accept_numeric_string()
                .required(),
            question_field(),
            response_format_field(),
        ])
    }

    async fn execute(
        &self,
        args: JsonObject,
        ctx: &ToolContext,
    ) -> Result<CallToolResult, ToolError> {
        let params: ComparePortfoliosParams = parse_args(args)?;
        let inference = ctx.inference()?;
        let (id_a, id_b) = (params.portfolio_id_a, params.portfolio_id_b);

        let portfolios = ctx.data().fetch_portfolios().await?;
        let find = |id: i64| portfolios.iter().find(|p| p.id == id);
        let (Some(a), Some(b)) = (find(id_a), find(id_b)) else {
            return Err(ToolError::not_found(format!(
                "Error: Could not find one or both portfolios (IDs: {id_a}, {id_b})"
            )));
        };

        let question = params.question.as_deref();
        let analysis =
            run_analysis(inference, comparison_context(a, b), question, INSTRUCTIONS).await?;

        let output = PortfolioComparison {
            portfolio_id_a: id_a,
            portfolio_id_b: id_b,
            question: question.unwrap_or(GENERAL_ANALYSIS),
            analysis,
            context_summary: ComparisonContextSummary {
                portfolio_a: a.into(),
                portfolio_b: b.into(),
            },
        };
        render(params.response_format, &output, || {
            analysis_markdown(
                &format!(
                    "AI Comparison: {} vs {}",
                    a.display_name(),
                    b.display_name()
                ),
                question,
                &output.analysis,
                &format!(
                    "CAGR: {} vs {} | Sharpe: {} vs {}",
                    percent(a.cagr),
                    percent(b.cagr),
                    fixed(a.sharpe, 2),
                    fixed(b.sharpe, 2)
                ),
            )
        })
    }
}
