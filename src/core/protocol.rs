//! JSON-RPC 2.0 envelope types.
//!
//! Both transports decode into [`JsonRpcRequest`] and encode
//! [`JsonRpcResponse`], so the wire format is defined in one place.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The only protocol marker accepted in `jsonrpc`.
pub const JSONRPC_VERSION: &str = "2.0";

/// Reserved JSON-RPC error codes.
pub mod codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
}

/// A decoded JSON-RPC request.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    /// Decode an envelope, rejecting anything that is not a JSON-RPC 2.0
    /// request object. The rejection already carries the echoed id.
    pub fn from_value(envelope: Value) -> Result<Self, JsonRpcResponse> {
        let Value::Object(mut object) = envelope else {
            return Err(JsonRpcResponse::invalid_request(
                Value::Null,
                "Request must be a JSON object",
            ));
        };

        let id = object.remove("id").filter(|id| !id.is_null());
        let echo = id.clone().unwrap_or(Value::Null);

        match object.get("jsonrpc").and_then(Value::as_str) {
            Some(JSONRPC_VERSION) => {}
            Some(other) => {
                return Err(JsonRpcResponse::invalid_request(
                    echo,
                    format!("Unsupported jsonrpc version '{other}', expected '{JSONRPC_VERSION}'"),
                ));
            }
            None => {
                return Err(JsonRpcResponse::invalid_request(
                    echo,
                    "Missing 'jsonrpc' field",
                ));
            }
        }

        let method = match object.remove("method") {
            Some(Value::String(method)) => method,
            _ => {
                return Err(JsonRpcResponse::invalid_request(
                    echo,
                    "Missing or non-string 'method' field",
                ));
            }
        };

        Ok(Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            method,
            params: object.remove("params").filter(|p| !p.is_null()),
        })
    }

    /// Notifications carry no id and expect no response.
    pub fn is_notification(&self) -> bool {
        self.id.is_none() && self.method.starts_with("notifications/")
    }

    /// The id to echo in the response (`null` when absent).
    pub fn response_id(&self) -> Value {
        self.id.clone().unwrap_or(Value::Null)
    }
}

/// A JSON-RPC response. Exactly one of `result` / `error` is serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(flatten)]
    pub payload: ResponsePayload,
}

/// Outcome half of a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponsePayload {
    Result(Value),
    Error(JsonRpcError),
}

/// JSON-RPC error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcResponse {
    /// Create a success response.
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            payload: ResponsePayload::Result(result),
        }
    }

    /// Create an error response.
    pub fn error(id: Value, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            payload: ResponsePayload::Error(JsonRpcError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }

    /// Parse error: the payload was not JSON at all.
    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::error(Value::Null, codes::PARSE_ERROR, message)
    }

    /// Invalid request error.
    pub fn invalid_request(id: Value, message: impl Into<String>) -> Self {
        Self::error(id, codes::INVALID_REQUEST, message)
    }

    /// Method not found error.
    pub fn method_not_found(id: Value, method: &str) -> Self {
        Self::error(
            id,
            codes::METHOD_NOT_FOUND,
            format!("Method not found: {method}"),
        )
    }

    /// Invalid params error.
    pub fn invalid_params(id: Value, message: impl Into<String>) -> Self {
        Self::error(id, codes::INVALID_PARAMS, message)
    }

    /// Internal error.
    pub fn internal_error(id: Value, message: impl Into<String>) -> Self {
        Self::error(id, codes::INTERNAL_ERROR, message)
    }

    pub fn result(&self) -> Option<&Value> {
        match &self.payload {
            ResponsePayload::Result(value) => Some(value),
            ResponsePayload::Error(_) => None,
        }
    }

    pub fn error_object(&self) -> Option<&JsonRpcError> {
        match &self.payload {
            ResponsePayload::Error(error) => Some(error),
            ResponsePayload::Result(_) => None,
        }
    }
}
