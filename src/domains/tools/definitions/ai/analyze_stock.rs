//! AI stock analysis tool.

use async_trait::async_trait;
use rmcp::model::{CallToolResult, JsonObject};
use serde::{Deserialize, Serialize};

use super::super::common::{
    parse_args, question_field, render, response_format_field, symbol_field,
};
use super::super::stock::{display_symbol, require_quote};
use super::common::{GENERAL_ANALYSIS, analysis_markdown, run_analysis};
use crate::domains::providers::StockDetails;
use crate::domains::providers::models::StockQuote;
use crate::domains::tools::format::{
    ResponseFormat, billions, fixed, money, percent, percent_signed,
};
use crate::domains::tools::schema::InputSchema;
use crate::domains::tools::{ToolContext, ToolError, ToolHandler};

const CONTEXT_PORTFOLIOS: usize = 5;

const INSTRUCTIONS: &str = "Analyze this stock and provide key insights.\n\nProvide:\n1. Valuation assessment (1-2 sentences)\n2. Key strengths (2-3 bullet points)\n3. Key risks (2-3 bullet points)\n4. One-liner summary";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalyzeStockParams {
    pub symbol: String,
    pub question: Option<String>,
    #[serde(default)]
    pub response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
pub struct StockContextSummary {
    pub price: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub market_cap: Option<f64>,
    pub held_by_portfolios: usize,
}

#[derive(Debug, Serialize)]
pub struct StockAnalysis<'a> {
    pub symbol: String,
    pub name: Option<&'a str>,
    pub question: &'a str,
    pub analysis: String,
    pub context_summary: StockContextSummary,
}

/// Price, valuation, risk and the top holding portfolios of a stock.
pub fn stock_context(symbol: &str, q: &StockQuote, details: &StockDetails) -> String {
    let mut lines = vec![
        format!("Stock: {} - {}", symbol, q.name.as_deref().unwrap_or("Unknown")),
        format!("Price: {}", money(q.price)),
        String::new(),
    ];
    if q.market_cap.is_some() {
        lines.push(format!("Market Cap: {}", billions(q.market_cap)));
    }
    if q.pe_ratio.is_some() {
        lines.push(format!("P/E Ratio: {}", fixed(q.pe_ratio, 2)));
    }
    if q.forward_pe.is_some() {
        lines.push(format!("Forward P/E: {}", fixed(q.forward_pe, 2)));
    }
    if q.ps_ratio.is_some() {
        lines.push(format!("P/S Ratio: {}", fixed(q.ps_ratio, 2)));
    }
    if q.dividend_yield.is_some() {
        lines.push(format!("Dividend Yield: {}", percent(q.dividend_yield)));
    }
    if q.change_percent.is_some() {
        lines.push(format!("Today: {}", percent_signed(q.change_percent)));
    }
    if q.volatility.is_some() {
        lines.push(format!("Volatility: {}", percent(q.volatility)));
    }
    if q.sharpe_ratio_1y.is_some() {
        lines.push(format!("Sharpe (1Y): {}", fixed(q.sharpe_ratio_1y, 2)));
    }
    if q.return_1y.is_some() {
        lines.push(format!("Return (1Y): {}", percent(q.return_1y)));
    }

    let holders = details.holdings();
    if !holders.is_empty() {
        lines.push(String::new());
        lines.push("Held by portfolios:".to_string());
        for h in holders.iter().take(CONTEXT_PORTFOLIOS) {
            lines.push(format!(
                "- {}: {}",
                h.name.as_deref().unwrap_or("Unnamed portfolio"),
                percent(h.allocation)
            ));
        }
    }
    lines.join("\n")
}

#[derive(Debug, Clone, Default)]
pub struct AnalyzeStockTool;

impl AnalyzeStockTool {
    pub const NAME: &'static str = "earnings_ai_analyze_stock";

    pub const DESCRIPTION: &'static str = "Use AI to analyze a stock: valuation (P/E, P/S, market cap), performance (returns, volatility, Sharpe) and which portfolios hold it. Optionally answer a specific question. Requires CLOUDFLARE_ACCOUNT_ID and CLOUDFLARE_API_TOKEN.";
}

#[async_trait]
impl ToolHandler for AnalyzeStockTool {
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
        let params: AnalyzeStockParams = parse_args(args)?;
        let inference = ctx.inference()?;

        let details = ctx.data().fetch_stock_details(&params.symbol).await?;
        let q = require_quote(&details, &params.symbol)?;
        let symbol = display_symbol(q, &params.symbol);

        let question = params.question.as_deref();
        let analysis = run_analysis(
            inference,
            stock_context(&symbol, q, &details),
            question,
            INSTRUCTIONS,
        )
        .await?;

        let held_by = details.holdings().len();
        let output = StockAnalysis {
            symbol,
            name: q.name.as_deref(),
            question: question.unwrap_or(GENERAL_ANALYSIS),
            analysis,
            context_summary: StockContextSummary {
                price: q.price,
                pe_ratio: q.pe_ratio,
                market_cap: q.market_cap,
                held_by_portfolios: held_by,
            },
        };
        render(params.response_format, &output, || {
            analysis_markdown(
                &format!(
                    "AI Analysis: {} - {}",
                    output.symbol,
                    output.name.unwrap_or("Unknown")
                ),
                question,
                &output.analysis,
                &format!(
                    "Price: {} | P/E: {} | Held by {} portfolios",
                    money(q.price),
                    fixed(q.pe_ratio, 1),
                    held_by
                ),
            )
        })
    }
}
