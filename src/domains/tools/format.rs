//! Number and text formatting shared by the tool renderers.
//!
//! All helpers take raw upstream values (`Option<f64>`) and are applied once
//! at render time; structured output always carries the raw numbers.

use serde::{Deserialize, Serialize};

/// Tool text output is clipped to this many characters.
pub const CHARACTER_LIMIT: usize = 25_000;

/// Context handed to the inference provider is clipped to this many characters.
pub const CONTEXT_LIMIT: usize = 4_000;

/// Magnitudes above this are taken to be percentages already.
pub const PERCENT_THRESHOLD: f64 = 1.5;

/// Rendering selected by the `response_format` argument.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    #[default]
    Markdown,
    Json,
}

impl ResponseFormat {
    pub const VALUES: &'static [&'static str] = &["markdown", "json"];
}

/// Scale a value that may be a proportion (0.12) or a percentage (12.0).
///
/// Heuristic: `|v| > 1.5` is returned unchanged, anything else is multiplied
/// by 100. Proportions above 1.5 (returns over 150%) are misread as
/// percentages; upstream carries no unit annotation to do better.
pub fn normalize_percent(value: f64) -> f64 {
    if value.abs() > PERCENT_THRESHOLD {
        value
    } else {
        value * 100.0
    }
}

/// `12.3%`, or `N/A`.
pub fn percent(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.1}%", normalize_percent(v)),
        _ => "N/A".to_string(),
    }
}

/// `+1.25%` / `-0.40%`, or `N/A`. Used for daily and period changes.
pub fn percent_signed(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => {
            let scaled = normalize_percent(v);
            let sign = if scaled >= 0.0 { "+" } else { "" };
            format!("{sign}{scaled:.2}%")
        }
        _ => "N/A".to_string(),
    }
}

/// `$123.45`, or `N/A`.
pub fn money(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("${v:.2}"),
        _ => "N/A".to_string(),
    }
}

/// Fixed-point rendering, or `N/A`.
pub fn fixed(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:.decimals$}"),
        _ => "N/A".to_string(),
    }
}

/// Market cap as `$2.95B`, or `N/A`.
pub fn billions(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("${:.2}B", v / 1e9),
        _ => "N/A".to_string(),
    }
}

/// Keep at most `max` characters.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// Collapse any run of whitespace (newlines included) into one space.
pub fn one_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Clip tool text output to [`CHARACTER_LIMIT`].
pub fn clip_output(text: String) -> String {
    if text.chars().count() <= CHARACTER_LIMIT {
        return text;
    }
    format!(
        "{}\n\n[Response truncated at {CHARACTER_LIMIT} characters. \
         Use response_format='json' or a narrower request for the full data.]",
        truncate_chars(&text, CHARACTER_LIMIT)
    )
}

/// Clip an inference context to [`CONTEXT_LIMIT`].
pub fn clip_context(context: String) -> String {
    if context.chars().count() <= CONTEXT_LIMIT {
        context
    } else {
        truncate_chars(&context, CONTEXT_LIMIT)
    }
}
