//! Helpers shared by the tool definitions: common fields, argument decoding
//! and result construction.

use rmcp::model::{CallToolResult, Content, JsonObject};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::domains::tools::ToolError;
use crate::domains::tools::format::{ResponseFormat, clip_output};
use crate::domains::tools::schema::FieldSpec;

/// `symbol`: ticker, 1-10 characters, uppercased.
pub fn symbol_field(description: &'static str) -> FieldSpec {
    FieldSpec::string("symbol", description)
        .length(1, 10)
        .uppercase()
        .required()
}

/// `group_id`: positive portfolio id.
pub fn group_id_field() -> FieldSpec {
    FieldSpec::integer(
        "group_id",
        "Portfolio/group ID (get it from earnings_list_portfolios)",
    )
    .min(1)
    .required()
}

/// Optional free-text `question` for the AI tools.
pub fn question_field() -> FieldSpec {
    FieldSpec::string("question", "Optional specific question to ask").length(5, 500)
}

pub fn response_format_field() -> FieldSpec {
    FieldSpec::enumeration(
        "response_format",
        "Output format: 'markdown' for human-readable or 'json' for structured data",
        ResponseFormat::VALUES,
    )
    .with_default("markdown")
}

/// Deserialize validated arguments into a typed parameter struct.
pub fn parse_args<T: DeserializeOwned>(args: JsonObject) -> Result<T, ToolError> {
    serde_json::from_value(Value::Object(args))
        .map_err(|e| ToolError::internal(format!("argument decoding failed: {e}")))
}

/// Build a successful result from one structured payload.
///
/// The text channel is the markdown rendering or the pretty-printed payload,
/// depending on `format`; the structured channel always carries the payload.
pub fn render<T: Serialize>(
    format: ResponseFormat,
    output: &T,
    markdown: impl FnOnce() -> String,
) -> Result<CallToolResult, ToolError> {
    let structured = serde_json::to_value(output)
        .map_err(|e| ToolError::internal(format!("failed to serialize output: {e}")))?;
    let text = match format {
        ResponseFormat::Markdown => markdown(),
        ResponseFormat::Json => serde_json::to_string_pretty(&structured)
            .map_err(|e| ToolError::internal(format!("failed to serialize output: {e}")))?,
    };
    Ok(CallToolResult {
        content: vec![Content::text(clip_output(text))],
        structured_content: Some(structured),
        is_error: Some(false),
        meta: None,
    })
}

/// A successful text-only result (empty listings).
pub fn text_result(text: impl Into<String>) -> CallToolResult {
    CallToolResult::success(vec![Content::text(text.into())])
}

#[cfg(test)]
pub mod testing {
    //! Assertions shared by the definition tests.

    use rmcp::model::{CallToolResult, JsonObject, RawContent};
    use serde::de::DeserializeOwned;
    use serde_json::Value;

    use super::parse_args;
    use crate::domains::tools::ToolHandler;
    use crate::domains::tools::schema::FieldKind;

    fn sample(kind: &FieldKind) -> Value {
        match kind {
            FieldKind::String { min_len, .. } => Value::from("A".repeat(min_len.unwrap_or(1).max(1))),
            FieldKind::Integer { min, .. } => Value::from(min.unwrap_or(1).max(1)),
            FieldKind::Number => Value::from(5),
            FieldKind::Boolean => Value::Bool(true),
            FieldKind::Enum { values } => Value::from(values[0]),
        }
    }

    /// Validated arguments, minimal and complete, decode into `P`.
    pub fn assert_params_decode<P: DeserializeOwned>(tool: &dyn ToolHandler) {
        let schema = tool.input_schema();
        let full: JsonObject = schema
            .fields()
            .iter()
            .map(|f| (f.name.to_string(), sample(&f.kind)))
            .collect();
        let minimal: JsonObject = schema
            .fields()
            .iter()
            .filter(|f| f.required)
            .map(|f| (f.name.to_string(), sample(&f.kind)))
            .collect();

        for raw in [full, minimal] {
            let args = schema.validate(Some(&Value::Object(raw))).unwrap();
            if let Err(e) = parse_args::<P>(args) {
                panic!("{}: {}", tool.name(), e);
            }
        }
    }

    pub fn text(result: &CallToolResult) -> String {
        match &result.content[0].raw {
            RawContent::Text(t) => t.text.clone(),
            other => panic!("expected text content, got {other:?}"),
        }
    }

    pub fn structured(result: &CallToolResult) -> Value {
        result.structured_content.clone().unwrap()
    }

    pub fn is_error(result: &CallToolResult) -> bool {
        result.is_error == Some(true)
    }
}
