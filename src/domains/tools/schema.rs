//! Declarative argument schemas.
//!
//! Each tool declares its arguments as a list of [`FieldSpec`]s. The registry
//! compiles them once into an [`InputSchema`], which both renders the JSON
//! Schema advertised by `tools/list` and validates incoming arguments. The
//! handler only ever sees the coerced object returned by
//! [`InputSchema::validate`].

use rmcp::model::JsonObject;
use serde_json::{Value, json};
use thiserror::Error;

/// Case normalization applied to string fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Case {
    Preserve,
    /// Trim and uppercase (ticker symbols).
    Upper,
}

/// Type and constraints of a single field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    String {
        min_len: Option<usize>,
        max_len: Option<usize>,
        case: Case,
    },
    Integer {
        min: Option<i64>,
        max: Option<i64>,
        /// Also accept a string holding a decimal integer.
        from_string: bool,
    },
    /// Any finite JSON number, integral or not.
    Number,
    Boolean,
    Enum {
        values: &'static [&'static str],
    },
}

/// One named argument.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub default: Option<Value>,
}

impl FieldSpec {
    fn new(name: &'static str, description: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            description,
            kind,
            required: false,
            default: None,
        }
    }

    pub fn string(name: &'static str, description: &'static str) -> Self {
        Self::new(
            name,
            description,
            FieldKind::String {
                min_len: None,
                max_len: None,
                case: Case::Preserve,
            },
        )
    }

    pub fn integer(name: &'static str, description: &'static str) -> Self {
        Self::new(
            name,
            description,
            FieldKind::Integer {
                min: None,
                max: None,
                from_string: false,
            },
        )
    }

    pub fn number(name: &'static str, description: &'static str) -> Self {
        Self::new(name, description, FieldKind::Number)
    }

    pub fn boolean(name: &'static str, description: &'static str) -> Self {
        Self::new(name, description, FieldKind::Boolean)
    }

    pub fn enumeration(
        name: &'static str,
        description: &'static str,
        values: &'static [&'static str],
    ) -> Self {
        Self::new(name, description, FieldKind::Enum { values })
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Character-count bounds, inclusive. No-op on non-string fields.
    pub fn length(mut self, min: usize, max: usize) -> Self {
        if let FieldKind::String {
            min_len, max_len, ..
        } = &mut self.kind
        {
            *min_len = Some(min);
            *max_len = Some(max);
        }
        self
    }

    pub fn uppercase(mut self) -> Self {
        if let FieldKind::String { case, .. } = &mut self.kind {
            *case = Case::Upper;
        }
        self
    }

    /// Lower bound, inclusive. No-op on non-integer fields.
    pub fn min(mut self, bound: i64) -> Self {
        if let FieldKind::Integer { min, .. } = &mut self.kind {
            *min = Some(bound);
        }
        self
    }

    /// Upper bound, inclusive. No-op on non-integer fields.
    pub fn max(mut self, bound: i64) -> Self {
        if let FieldKind::Integer { max, .. } = &mut self.kind {
            *max = Some(bound);
        }
        self
    }

    pub fn accept_numeric_string(mut self) -> Self {
        if let FieldKind::Integer { from_string, .. } = &mut self.kind {
            *from_string = true;
        }
        self
    }

    fn coerce(&self, value: &Value) -> Result<Value, ValidationError> {
        let field = self.name;
        match &self.kind {
            FieldKind::String {
                min_len,
                max_len,
                case,
            } => {
                let raw = value.as_str().ok_or(ValidationError::WrongType {
                    field,
                    expected: "string",
                })?;
                let text = match case {
                    Case::Preserve => raw.to_string(),
                    Case::Upper => raw.trim().to_uppercase(),
                };
                let len = text.chars().count();
                if let Some(min) = min_len.filter(|min| len < *min) {
                    return Err(ValidationError::TooShort { field, min });
                }
                if let Some(max) = max_len.filter(|max| len > *max) {
                    return Err(ValidationError::TooLong { field, max });
                }
                Ok(Value::String(text))
            }
            FieldKind::Integer {
                min,
                max,
                from_string,
            } => {
                let number = match value {
                    Value::Number(n) => n
                        .as_i64()
                        .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
                    Value::String(s) if *from_string => s.trim().parse::<i64>().ok(),
                    _ => None,
                }
                .ok_or(ValidationError::WrongType {
                    field,
                    expected: if *from_string {
                        "integer or numeric string"
                    } else {
                        "integer"
                    },
                })?;
                if min.is_some_and(|min| number < min) || max.is_some_and(|max| number > max) {
                    return Err(ValidationError::OutOfRange {
                        field,
                        bounds: describe_bounds(*min, *max),
                    });
                }
                Ok(Value::from(number))
            }
            FieldKind::Number => match value {
                Value::Number(_) => Ok(value.clone()),
                _ => Err(ValidationError::WrongType {
                    field,
                    expected: "number",
                }),
            },
            FieldKind::Boolean => value
                .as_bool()
                .map(Value::Bool)
                .ok_or(ValidationError::WrongType {
                    field,
                    expected: "boolean",
                }),
            FieldKind::Enum { values } => {
                let raw = value.as_str().ok_or(ValidationError::WrongType {
                    field,
                    expected: "string",
                })?;
                if values.iter().any(|allowed| *allowed == raw) {
                    Ok(Value::String(raw.to_string()))
                } else {
                    Err(ValidationError::NotAllowed {
                        field,
                        allowed: values.join(", "),
                    })
                }
            }
        }
    }

    fn to_json_schema(&self) -> Value {
        let mut property = match &self.kind {
            FieldKind::String {
                min_len, max_len, ..
            } => {
                let mut p = json!({"type": "string"});
                if let Some(min) = min_len {
                    p["minLength"] = json!(min);
                }
                if let Some(max) = max_len {
                    p["maxLength"] = json!(max);
                }
                p
            }
            FieldKind::Integer {
                min,
                max,
                from_string,
            } => {
                let mut p = if *from_string {
                    json!({"type": ["integer", "string"]})
                } else {
                    json!({"type": "integer"})
                };
                if let Some(min) = min {
                    p["minimum"] = json!(min);
                }
                if let Some(max) = max {
                    p["maximum"] = json!(max);
                }
                p
            }
            FieldKind::Number => json!({"type": "number"}),
            FieldKind::Boolean => json!({"type": "boolean"}),
            FieldKind::Enum { values } => json!({"type": "string", "enum": values}),
        };
        property["description"] = json!(self.description);
        if let Some(default) = &self.default {
            property["default"] = default.clone();
        }
        property
    }
}

fn describe_bounds(min: Option<i64>, max: Option<i64>) -> String {
    match (min, max) {
        (Some(min), Some(max)) => format!("between {min} and {max}"),
        (Some(min), None) => format!("at least {min}"),
        (None, Some(max)) => format!("at most {max}"),
        (None, None) => "an integer".to_string(),
    }
}

/// Why an argument object was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("arguments must be a JSON object")]
    NotAnObject,

    #[error("missing required field '{0}'")]
    Missing(&'static str),

    #[error("unknown field '{0}'")]
    UnknownField(String),

    #[error("field '{field}' must be a {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("field '{field}' must be at least {min} characters")]
    TooShort { field: &'static str, min: usize },

    #[error("field '{field}' must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("field '{field}' must be {bounds}")]
    OutOfRange { field: &'static str, bounds: String },

    #[error("field '{field}' must be one of: {allowed}")]
    NotAllowed { field: &'static str, allowed: String },
}

/// A compiled, strict argument schema.
#[derive(Debug, Clone, PartialEq)]
pub struct InputSchema {
    fields: Vec<FieldSpec>,
}

impl InputSchema {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Validate and coerce raw arguments.
    ///
    /// Absent or `null` arguments count as an empty object, and a `null`
    /// field counts as omitted. Omitted fields take their default when one is
    /// declared. Fields that are not declared are rejected.
    pub fn validate(&self, raw: Option<&Value>) -> Result<JsonObject, ValidationError> {
        let empty = JsonObject::new();
        let args = match raw {
            None | Some(Value::Null) => &empty,
            Some(Value::Object(map)) => map,
            Some(_) => return Err(ValidationError::NotAnObject),
        };

        if let Some(unknown) = args
            .keys()
            .find(|key| !self.fields.iter().any(|f| f.name == key.as_str()))
        {
            return Err(ValidationError::UnknownField(unknown.clone()));
        }

        let mut coerced = JsonObject::new();
        for field in &self.fields {
            match args.get(field.name).filter(|v| !v.is_null()) {
                Some(value) => {
                    coerced.insert(field.name.to_string(), field.coerce(value)?);
                }
                None => {
                    if let Some(default) = &field.default {
                        coerced.insert(field.name.to_string(), default.clone());
                    } else if field.required {
                        return Err(ValidationError::Missing(field.name));
                    }
                }
            }
        }
        Ok(coerced)
    }

    /// JSON Schema advertised in the tool descriptor.
    pub fn to_json_schema(&self) -> JsonObject {
        let properties: JsonObject = self
            .fields
            .iter()
            .map(|f| (f.name.to_string(), f.to_json_schema()))
            .collect();
        let required: Vec<&str> = self
            .fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name)
            .collect();

        let mut schema = JsonObject::new();
        schema.insert("type".to_string(), json!("object"));
        schema.insert("properties".to_string(), Value::Object(properties));
        if !required.is_empty() {
            schema.insert("required".to_string(), json!(required));
        }
        schema.insert("additionalProperties".to_string(), json!(false));
        schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote_schema() -> InputSchema {
        InputSchema::new(vec![
            FieldSpec::string("symbol", "Ticker")
                .length(1, 10)
                .uppercase()
                .required(),
            FieldSpec::enumeration("response_format", "Output format", &["markdown", "json"])
                .with_default("markdown"),
        ])
    }

    #[test]
    fn test_symbol_is_trimmed_and_uppercased() {
        let args = quote_schema()
            .validate(Some(&json!({"symbol": " aapl "})))
            .unwrap();
        assert_eq!(args["symbol"], "AAPL");
        assert_eq!(args["response_format"], "markdown");
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let err = quote_schema()
            .validate(Some(&json!({"symbol": "MSFT", "format": "json"})))
            .unwrap_err();
        assert_eq!(err, ValidationError::UnknownField("format".to_string()));
    }

    #[test]
    fn test_missing_and_wrong_type() {
        assert_eq!(
            quote_schema().validate(None).unwrap_err(),
            ValidationError::Missing("symbol")
        );
        assert_eq!(
            quote_schema()
                .validate(Some(&json!({"symbol": 42})))
                .unwrap_err(),
            ValidationError::WrongType {
                field: "symbol",
                expected: "string"
            }
        );
        assert_eq!(
            quote_schema().validate(Some(&json!(["AAPL"]))).unwrap_err(),
            ValidationError::NotAnObject
        );
    }

    #[test]
    fn test_length_and_enum_constraints() {
        let schema = quote_schema();
        assert!(matches!(
            schema.validate(Some(&json!({"symbol": "   "}))),
            Err(ValidationError::TooShort { min: 1, .. })
        ));
        assert!(matches!(
            schema.validate(Some(&json!({"symbol": "ABCDEFGHIJK"}))),
            Err(ValidationError::TooLong { max: 10, .. })
        ));
        let err = schema
            .validate(Some(&json!({"symbol": "A", "response_format": "xml"})))
            .unwrap_err();
        assert_eq!(err.to_string(), "field 'response_format' must be one of: markdown, json");
    }

    #[test]
    fn test_integer_coercion() {
        let schema = InputSchema::new(vec![
            FieldSpec::integer("id", "Portfolio id")
                .min(1)
                .accept_numeric_string()
                .required(),
            FieldSpec::integer("top_n", "Count").with_default(5),
        ]);

        let args = schema.validate(Some(&json!({"id": "12"}))).unwrap();
        assert_eq!(args["id"], 12);
        assert_eq!(args["top_n"], 5);

        let args = schema.validate(Some(&json!({"id": 3.0, "top_n": 50}))).unwrap();
        assert_eq!(args["id"], 3);
        assert_eq!(args["top_n"], 50);

        assert!(matches!(
            schema.validate(Some(&json!({"id": 0}))),
            Err(ValidationError::OutOfRange { .. })
        ));
        assert!(matches!(
            schema.validate(Some(&json!({"id": 1, "top_n": "5"}))),
            Err(ValidationError::WrongType { field: "top_n", .. })
        ));
        assert!(matches!(
            schema.validate(Some(&json!({"id": 1.5}))),
            Err(ValidationError::WrongType { field: "id", .. })
        ));
    }

    #[test]
    fn test_number_accepts_fractions() {
        let schema = InputSchema::new(vec![FieldSpec::number("top_n", "Count").with_default(5)]);

        assert_eq!(schema.validate(Some(&json!({"top_n": 4.5}))).unwrap()["top_n"], 4.5);
        assert_eq!(schema.validate(Some(&json!({}))).unwrap()["top_n"], 5);
        assert_eq!(
            schema.validate(Some(&json!({"top_n": "4"}))).unwrap_err(),
            ValidationError::WrongType {
                field: "top_n",
                expected: "number"
            }
        );
        assert_eq!(schema.to_json_schema()["properties"]["top_n"]["type"], "number");
    }

    #[test]
    fn test_null_field_counts_as_omitted() {
        let args = quote_schema()
            .validate(Some(&json!({"symbol": "nvda", "response_format": null})))
            .unwrap();
        assert_eq!(args["response_format"], "markdown");
    }

    #[test]
    fn test_json_schema_rendering() {
        let schema = quote_schema().to_json_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["additionalProperties"], false);
        assert_eq!(schema["required"], json!(["symbol"]));
        assert_eq!(schema["properties"]["symbol"]["maxLength"], 10);
        assert_eq!(
            schema["properties"]["response_format"]["enum"],
            json!(["markdown", "json"])
        );
        assert_eq!(schema["properties"]["response_format"]["default"], "markdown");
    }
}
