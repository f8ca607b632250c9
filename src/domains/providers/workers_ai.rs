//! reqwest client for Cloudflare Workers AI text generation.

use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::InferenceProvider;
use super::error::InferenceError;
use crate::core::config::AiConfig;
use crate::core::{Error, Result};

const ERROR_BODY_PREVIEW: usize = 200;

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct RunRequest<'a> {
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RunResponse {
    success: bool,
    result: Option<RunResult>,
    errors: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RunResult {
    response: Option<String>,
}

/// Runs a single chat completion against `/accounts/{id}/ai/run/{model}`.
#[derive(Debug, Clone)]
pub struct WorkersAiClient {
    client: reqwest::Client,
    url: Url,
    token: String,
}

impl WorkersAiClient {
    pub fn new(ai: &AiConfig, account_id: &str, api_token: &str) -> Result<Self> {
        let mut url = Url::parse(&ai.api_base)
            .map_err(|e| Error::config(format!("invalid AI API base '{}': {}", ai.api_base, e)))?;
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                Error::config(format!("AI API base '{}' cannot carry a path", ai.api_base))
            })?;
            path.pop_if_empty()
                .extend(["accounts", account_id, "ai", "run"]);
            // Model ids look like `@cf/meta/llama-3.1-8b-instruct`; the slashes
            // are path separators on the provider side.
            path.extend(ai.model.split('/'));
        }

        let client = reqwest::Client::builder()
            .timeout(ai.timeout())
            .build()
            .map_err(|e| Error::internal(format!("failed to create AI HTTP client: {e}")))?;

        Ok(Self {
            client,
            url,
            token: api_token.to_string(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl InferenceProvider for WorkersAiClient {
    #[instrument(skip_all, fields(prompt_len = prompt.len()))]
    async fn complete(&self, system: &str, prompt: &str) -> std::result::Result<String, InferenceError> {
        let body = RunRequest {
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        };

        let response = self
            .client
            .post(self.url.clone())
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!("AI request failed: {}", e);
                InferenceError::from_reqwest(&e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let detail: String = text.chars().take(ERROR_BODY_PREVIEW).collect();
            warn!("AI provider returned {}: {}", status, detail);
            return Err(InferenceError::Http {
                status: status.as_u16(),
                detail: detail.replace('\n', " "),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| InferenceError::from_reqwest(&e))?;
        let parsed: RunResponse =
            serde_json::from_slice(&bytes).map_err(|e| InferenceError::Decode(e.to_string()))?;

        if !parsed.success {
            let errors = serde_json::to_string(&parsed.errors).unwrap_or_default();
            return Err(InferenceError::Provider(errors));
        }

        let text = parsed
            .result
            .and_then(|r| r.response)
            .ok_or_else(|| InferenceError::Decode("missing result.response".to_string()))?;
        debug!("AI response received: {} chars", text.len());
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ai_config(api_base: &str) -> AiConfig {
        AiConfig {
            model: "@cf/meta/llama-3.1-8b-instruct".to_string(),
            api_base: api_base.to_string(),
            timeout_secs: 2,
        }
    }

    #[test]
    fn test_endpoint_layout() {
        let client =
            WorkersAiClient::new(&ai_config("https://api.cloudflare.com/client/v4"), "acct", "t")
                .unwrap();
        assert_eq!(
            client.endpoint().as_str(),
            "https://api.cloudflare.com/client/v4/accounts/acct/ai/run/@cf/meta/llama-3.1-8b-instruct"
        );
    }

    #[test]
    fn test_invalid_base_is_config_error() {
        let err = WorkersAiClient::new(&ai_config("not a url"), "acct", "t").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[cfg(feature = "http")]
    mod remote {
        use super::*;
        use axum::{Json, Router, http::HeaderMap, http::StatusCode, routing::post};
        use serde_json::json;

        async fn spawn_provider(router: Router) -> String {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            tokio::spawn(async move {
                axum::serve(listener, router).await.unwrap();
            });
            format!("http://{addr}/client/v4")
        }

        const RUN_PATH: &str = "/client/v4/accounts/acct/ai/run/@cf/meta/llama-3.1-8b-instruct";

        #[tokio::test]
        async fn test_complete_sends_both_messages() {
            let router = Router::new().route(
                RUN_PATH,
                post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                    let authed = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        == Some("Bearer tok");
                    let roles: Vec<_> = body["messages"]
                        .as_array()
                        .map(|m| m.iter().map(|m| m["role"].clone()).collect())
                        .unwrap_or_default();
                    if authed && roles == vec![json!("system"), json!("user")] {
                        Json(json!({"success": true, "result": {"response": "Looks fine."}}))
                    } else {
                        Json(json!({"success": false, "errors": [{"message": "bad request"}]}))
                    }
                }),
            );
            let base = spawn_provider(router).await;
            let client = WorkersAiClient::new(&ai_config(&base), "acct", "tok").unwrap();

            let text = client.complete("system", "user prompt").await.unwrap();
            assert_eq!(text, "Looks fine.");
        }

        #[tokio::test]
        async fn test_provider_failure_and_http_error() {
            let router = Router::new().route(
                RUN_PATH,
                post(|Json(body): Json<Value>| async move {
                    if body["messages"][1]["content"] == "fail" {
                        (
                            StatusCode::OK,
                            Json(json!({"success": false, "errors": [{"code": 5007}]})),
                        )
                    } else {
                        (StatusCode::UNAUTHORIZED, Json(json!({"error": "bad token"})))
                    }
                }),
            );
            let base = spawn_provider(router).await;
            let client = WorkersAiClient::new(&ai_config(&base), "acct", "tok").unwrap();

            match client.complete("s", "fail").await.unwrap_err() {
                InferenceError::Provider(errors) => assert!(errors.contains("5007")),
                other => panic!("unexpected error: {other:?}"),
            }
            match client.complete("s", "other").await.unwrap_err() {
                InferenceError::Http { status, .. } => assert_eq!(status, 401),
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }
}
