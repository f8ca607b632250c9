//! AI market sentiment over the highest-scored portfolios.

use std::cmp::Ordering;

use async_trait::async_trait;
use rmcp::model::{CallToolResult, JsonObject};
use serde::{Deserialize, Serialize};

use super::super::common::{parse_args, question_field, render, response_format_field};
use super::common::{GENERAL_ANALYSIS, analysis_markdown, run_analysis};
use crate::domains::providers::Portfolio;
use crate::domains::tools::format::{ResponseFormat, fixed, percent};
use crate::domains::tools::schema::{FieldSpec, InputSchema};
use crate::domains::tools::{ToolContext, ToolError, ToolHandler};

const DEFAULT_TOP_N: i64 = 5;
const MIN_TOP_N: i64 = 3;
const MAX_TOP_N: i64 = 10;

const INSTRUCTIONS: &str = "Based on these winning portfolios, what market trends or strategies seem to be favoring right now? Synthesize a market sentiment summary.";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MarketSentimentParams {
    #[serde(default = "default_top_n")]
    pub top_n: f64,
    pub question: Option<String>,
    #[serde(default)]
    pub response_format: ResponseFormat,
}

fn default_top_n() -> f64 {
    DEFAULT_TOP_N as f64
}

#[derive(Debug, Serialize)]
pub struct RatedPortfolio<'a> {
    pub id: i64,
    pub name: &'a str,
    pub score: Option<f64>,
    pub cagr: Option<f64>,
    pub sharpe: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct SentimentContextSummary<'a> {
    pub portfolios: Vec<RatedPortfolio<'a>>,
}

#[derive(Debug, Serialize)]
pub struct MarketSentiment<'a> {
    pub top_n: usize,
    pub question: &'a str,
    pub analysis: String,
    pub context_summary: SentimentContextSummary<'a>,
}

/// Floor a requested portfolio count and clamp it into the supported window.
pub fn clamp_top_n(requested: f64) -> usize {
    requested.floor().clamp(MIN_TOP_N as f64, MAX_TOP_N as f64) as usize
}

fn descending(a: Option<f64>, b: Option<f64>) -> Ordering {
    let (a, b) = (a.unwrap_or(f64::NEG_INFINITY), b.unwrap_or(f64::NEG_INFINITY));
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

/// Scored portfolios, best score first and higher CAGR breaking ties.
pub fn top_rated(portfolios: &[Portfolio], n: usize) -> Vec<&Portfolio> {
    let mut rated: Vec<&Portfolio> = portfolios
        .iter()
        .filter(|p| p.last_score.is_some())
        .collect();
    rated.sort_by(|a, b| {
        descending(a.last_score, b.last_score).then_with(|| descending(a.cagr, b.cagr))
    });
    rated.truncate(n);
    rated
}

pub fn sentiment_context(top: &[&Portfolio]) -> String {
    let mut lines = vec![format!("Top {} Performing Portfolios:", top.len())];
    for p in top {
        lines.push(format!(
            "- {}: Score {}, Return {}, Sharpe {}",
            p.display_name(),
            fixed(p.last_score, 1),
            percent(p.cagr),
            fixed(p.sharpe, 2)
        ));
    }
    lines.join("\n")
}

#[derive(Debug, Clone, Default)]
pub struct MarketSentimentTool;

impl MarketSentimentTool {
    pub const NAME: &'static str = "earnings_ai_market_sentiment";

    pub const DESCRIPTION: &'static str = "Use AI to synthesize a market sentiment summary from the top-N highest-scored portfolios (top_n between 3 and 10, default 5). Requires CLOUDFLARE_ACCOUNT_ID and CLOUDFLARE_API_TOKEN.";
}

#[async_trait]
impl ToolHandler for MarketSentimentTool {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        Self::DESCRIPTION
    }

    fn input_schema(&self) -> InputSchema {
        InputSchema::new(vec![
            FieldSpec::number(
                "top_n",
                "Number of top portfolios to analyze (clamped to 3-10)",
            )
            .with_default(DEFAULT_TOP_N),
            question_field(),
            response_format_field(),
        ])
    }

    async fn execute(
        &self,
        args: JsonObject,
        ctx: &ToolContext,
    ) -> Result<CallToolResult, ToolError> {
        let params: MarketSentimentParams = parse_args(args)?;
        let inference = ctx.inference()?;
        let top_n = clamp_top_n(params.top_n);

        let portfolios = ctx.data().fetch_portfolios().await?;
        let top = top_rated(&portfolios, top_n);
        if top.is_empty() {
            return Err(ToolError::not_found("No rated portfolios found to analyze."));
        }

        let question = params.question.as_deref();
        let analysis = run_analysis(inference, sentiment_context(&top), question, INSTRUCTIONS).await?;

        let output = MarketSentiment {
            top_n,
            question: question.unwrap_or(GENERAL_ANALYSIS),
            analysis,
            context_summary: SentimentContextSummary {
                portfolios: top
                    .iter()
                    .map(|p| RatedPortfolio {
                        id: p.id,
                        name: p.display_name(),
                        score: p.last_score,
                        cagr: p.cagr,
                        sharpe: p.sharpe,
                    })
                    .collect(),
            },
        };
        render(params.response_format, &output, || {
            analysis_markdown(
                "AI Analysis: Market Sentiment",
                question,
                &output.analysis,
                &format!("Based on the top {} rated portfolios", top.len()),
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

    fn portfolios() -> serde_json::Value {
        json!([
            {"id": 1, "name": "Low", "last_score": 40.0, "cagr": 0.1},
            {"id": 2, "name": "Unrated", "cagr": 0.9},
            {"id": 3, "name": "TieSlow", "last_score": 80.0, "cagr": 0.12},
            {"id": 4, "name": "TieFast", "last_score": 80.0, "cagr": 0.35, "sharpe": 1.5},
            {"id": 5, "name": "Mid", "last_score": 60.0},
            {"id": 6, "name": "Mid2", "last_score": 55.0}
        ])
    }

    fn args(value: serde_json::Value) -> JsonObject {
        MarketSentimentTool.input_schema().validate(Some(&value)).unwrap()
    }

    #[test]
    fn test_clamp_top_n() {
        assert_eq!(clamp_top_n(50.0), 10);
        assert_eq!(clamp_top_n(0.0), 3);
        assert_eq!(clamp_top_n(-4.0), 3);
        assert_eq!(clamp_top_n(7.0), 7);
        assert_eq!(clamp_top_n(4.5), 4);
        assert_eq!(clamp_top_n(10.9), 10);
    }

    #[test]
    fn test_ordering_by_score_then_cagr() {
        let list: Vec<Portfolio> = serde_json::from_value(portfolios()).unwrap();
        let names: Vec<&str> = top_rated(&list, 10)
            .iter()
            .map(|p| p.display_name())
            .collect();
        assert_eq!(names, vec!["TieFast", "TieSlow", "Mid", "Mid2", "Low"]);
    }

    #[tokio::test]
    async fn test_large_top_n_is_clamped() {
        let inference = Arc::new(FakeInference::replying("Growth is in favor."));
        let ctx = ToolContext::new(
            Arc::new(FakeData::new().with_portfolios(portfolios())),
            Some(inference.clone()),
        );
        let result = MarketSentimentTool
            .execute(args(json!({"top_n": 50})), &ctx)
            .await
            .unwrap();

        let structured = structured(&result);
        assert_eq!(structured["top_n"], 10);
        assert_eq!(
            structured["context_summary"]["portfolios"].as_array().unwrap().len(),
            5
        );

        let prompt = &inference.prompts()[0];
        assert!(prompt.starts_with("Top 5 Performing Portfolios:\n- TieFast: Score 80.0, Return 35.0%, Sharpe 1.50"));
        assert!(prompt.contains("market sentiment summary"));
        assert!(text(&result).starts_with("# AI Analysis: Market Sentiment"));
    }

    #[tokio::test]
    async fn test_default_top_n() {
        let inference = Arc::new(FakeInference::replying("ok"));
        let ctx = ToolContext::new(
            Arc::new(FakeData::new().with_portfolios(portfolios())),
            Some(inference.clone()),
        );
        let result = MarketSentimentTool
            .execute(args(json!({})), &ctx)
            .await
            .unwrap();
        assert_eq!(structured(&result)["top_n"], 5);
    }

    #[tokio::test]
    async fn test_fractional_top_n_is_floored() {
        let inference = Arc::new(FakeInference::replying("ok"));
        let ctx = ToolContext::new(
            Arc::new(FakeData::new().with_portfolios(portfolios())),
            Some(inference.clone()),
        );
        let result = MarketSentimentTool
            .execute(args(json!({"top_n": 4.5})), &ctx)
            .await
            .unwrap();
        assert_eq!(structured(&result)["top_n"], 4);
        assert!(inference.prompts()[0].starts_with("Top 4 Performing Portfolios:"));
    }

    #[tokio::test]
    async fn test_no_rated_portfolios() {
        let ctx = ToolContext::new(
            Arc::new(FakeData::new().with_portfolios(json!([{"id": 1, "name": "A"}]))),
            Some(Arc::new(FakeInference::replying("unused"))),
        );
        let err = MarketSentimentTool
            .execute(args(json!({})), &ctx)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "No rated portfolios found to analyze.");
    }

    #[test]
    fn test_params_match_schema() {
        crate::domains::tools::definitions::common::testing::assert_params_decode::<MarketSentimentParams>(
            &MarketSentimentTool,
        );
    }
}
