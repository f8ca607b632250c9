//! AI comprehensive stock analysis: valuation, technicals and returns.

use async_trait::async_trait;
use rmcp::model::{CallToolResult, JsonObject};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::super::common::{
    parse_args, question_field, render, response_format_field, symbol_field,
};
use super::super::stock::{display_symbol, require_quote};
use super::common::{GENERAL_ANALYSIS, analysis_markdown, run_analysis};
use crate::domains::providers::models::StockQuote;
use crate::domains::tools::format::{ResponseFormat, billions, fixed, money, percent};
use crate::domains::tools::schema::InputSchema;
use crate::domains::tools::{ToolContext, ToolError, ToolHandler};

const INSTRUCTIONS: &str = "Provide a comprehensive analysis covering:\n1. Valuation: is the stock cheap or expensive relative to its growth (P/E, forward P/E, PEG)?\n2. Technical trend: where does the price sit against its 20, 50 and 200 day moving averages?\n3. Momentum: what do the relative strength rank and recent returns say?\n4. Verdict: a one-line overall view (bullish, neutral or bearish) with the main reason";

const SCORE_ATTRIBUTE: &str = "data-score=\"";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComprehensiveStockParams {
    pub symbol: String,
    pub question: Option<String>,
    #[serde(default)]
    pub response_format: ResponseFormat,
}

/// Price position against the moving averages; `None` when unknown.
#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct SmaPosition {
    pub above_sma_20: Option<bool>,
    pub above_sma_50: Option<bool>,
    pub above_sma_200: Option<bool>,
}

impl SmaPosition {
    pub fn of(q: &StockQuote) -> Self {
        let above = |sma: Option<f64>| match (q.price, sma) {
            (Some(price), Some(sma)) => Some(price > sma),
            _ => None,
        };
        Self {
            above_sma_20: above(q.sma_20),
            above_sma_50: above(q.sma_50),
            above_sma_200: above(q.sma_200),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ComprehensiveContextSummary {
    pub price: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub forward_pe: Option<f64>,
    pub peg_ratio: Option<f64>,
    pub rs_rank: Option<u32>,
    #[serde(flatten)]
    pub sma: SmaPosition,
}

#[derive(Debug, Serialize)]
pub struct ComprehensiveAnalysis<'a> {
    pub symbol: String,
    pub name: Option<&'a str>,
    pub question: &'a str,
    pub analysis: String,
    pub context_summary: ComprehensiveContextSummary,
}

/// Relative-strength rank from the upstream `rs_rank_1m` value.
///
/// Accepts the rendered badge markup (`<span data-score="87">..</span>`),
/// a bare number, or a numeric string.
pub fn parse_rs_rank(value: Option<&Value>) -> Option<u32> {
    match value? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64))
            .and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(rank) = s.parse::<u32>() {
                return Some(rank);
            }
            let start = s.find(SCORE_ATTRIBUTE)? + SCORE_ATTRIBUTE.len();
            let rest = &s[start..];
            let end = rest.find('"')?;
            rest[..end].trim().parse().ok()
        }
        _ => None,
    }
}

/// Upstream PEG, or forward P/E over positive EPS growth in percent.
pub fn peg_ratio(q: &StockQuote) -> Option<f64> {
    if let Some(peg) = q.peg_ratio.filter(|p| p.is_finite()) {
        return Some(peg);
    }
    let (forward_pe, current, next) = (q.forward_pe?, q.eps_current_year?, q.eps_next_year?);
    if current == 0.0 {
        return None;
    }
    let growth = (next - current) / current.abs() * 100.0;
    (growth > 0.0).then(|| forward_pe / growth)
}

fn trend(above: Option<bool>) -> &'static str {
    match above {
        Some(true) => "above",
        Some(false) => "below",
        None => "N/A",
    }
}

pub fn comprehensive_context(symbol: &str, q: &StockQuote) -> String {
    let sma = SmaPosition::of(q);
    let rs_rank = parse_rs_rank(q.rs_rank_1m.as_ref());
    let distance = q
        .delta_52w_high
        .filter(|d| d.is_finite())
        .map(|d| format!("{d:.1}%"))
        .unwrap_or_else(|| "N/A".to_string());

    [
        format!("Stock: {} - {}", symbol, q.name.as_deref().unwrap_or("Unknown")),
        format!("Price: {}", money(q.price)),
        format!("Market Cap: {}", billions(q.market_cap)),
        String::new(),
        "Valuation:".to_string(),
        format!("- P/E: {}", fixed(q.pe_ratio, 2)),
        format!("- Forward P/E: {}", fixed(q.forward_pe, 2)),
        format!("- P/S: {}", fixed(q.ps_ratio, 2)),
        format!("- PEG: {}", fixed(peg_ratio(q), 2)),
        String::new(),
        "Technicals:".to_string(),
        format!("- SMA 20: {} ({})", money(q.sma_20), trend(sma.above_sma_20)),
        format!("- SMA 50: {} ({})", money(q.sma_50), trend(sma.above_sma_50)),
        format!("- SMA 200: {} ({})", money(q.sma_200), trend(sma.above_sma_200)),
        format!(
            "- RS Rank (1M): {}",
            rs_rank
                .map(|r| r.to_string())
                .unwrap_or_else(|| "N/A".to_string())
        ),
        String::new(),
        "Returns:".to_string(),
        format!("- Daily: {}", percent(q.change_percent)),
        format!("- YTD: {}", percent(q.change_ytd)),
        format!("- 1Y: {}", percent(q.change_1y)),
        format!("- From 52W High: {distance}"),
    ]
    .join("\n")
}

#[derive(Debug, Clone, Default)]
pub struct ComprehensiveStockTool;

impl ComprehensiveStockTool {
    pub const NAME: &'static str = "earnings_ai_comprehensive_stock_analysis";

    pub const DESCRIPTION: &'static str = "Use AI for a comprehensive stock analysis combining valuation (P/E, forward P/E, P/S, PEG), technicals (20/50/200 day moving averages, relative strength rank) and returns (daily, YTD, 1Y, distance from 52-week high). Requires CLOUDFLARE_ACCOUNT_ID and CLOUDFLARE_API_TOKEN.";
}

#[async_trait]
impl ToolHandler for ComprehensiveStockTool {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        Self::DESCRIPTION
    }

    fn input_schema(&self) -> InputSchema {
        InputSchema::new(vec![
            symbol_field("Stock ticker symbol to analyze"),
            question_field(),
            response_format_field(),
        ])
    }

    async fn execute(
        &self,
        args: JsonObject,
        ctx: &ToolContext,
    ) -> Result<CallToolResult, ToolError> {
        let params: ComprehensiveStockParams = parse_args(args)?;
        let inference = ctx.inference()?;

        let details = ctx.data().fetch_stock_details(&params.symbol).await?;
        let q = require_quote(&details, &params.symbol)?;
        let symbol = display_symbol(q, &params.symbol);

        let question = params.question.as_deref();
        let analysis = run_analysis(
            inference,
            comprehensive_context(&symbol, q),
            question,
            INSTRUCTIONS,
        )
        .await?;

        let output = ComprehensiveAnalysis {
            symbol,
            name: q.name.as_deref(),
            question: question.unwrap_or(GENERAL_ANALYSIS),
            analysis,
            context_summary: ComprehensiveContextSummary {
                price: q.price,
                pe_ratio: q.pe_ratio,
                forward_pe: q.forward_pe,
                peg_ratio: peg_ratio(q),
                rs_rank: parse_rs_rank(q.rs_rank_1m.as_ref()),
                sma: SmaPosition::of(q),
            },
        };
        render(params.response_format, &output, || {
            let summary = &output.context_summary;
            analysis_markdown(
                &format!(
                    "AI Analysis: {} - {}",
                    output.symbol,
                    output.name.unwrap_or("Unknown")
                ),
                question,
                &output.analysis,
                &format!(
                    "Price: {} | PEG: {} | RS Rank: {} | 200 SMA: {}",
                    money(summary.price),
                    fixed(summary.peg_ratio, 2),
                    summary
                        .rs_rank
                        .map(|r| r.to_string())
                        .unwrap_or_else(|| "N/A".to_string()),
                    trend(summary.sma.above_sma_200)
                ),
            )
        })
    }
}
