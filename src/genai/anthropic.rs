use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use super::prompts;
use super::{
    ArchetypeInput, ArchetypeLabel, CommentaryInput, FitReport, FitReportInput, GenAiError,
    GenAiResult, TextGenerator,
};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 2048;
const MAX_RETRIES: u32 = 3;

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    usage: Usage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

impl MessagesResponse {
    fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Anthropic-backed [`TextGenerator`]. All generative calls in the service go
/// through this client; it retries 429/5xx with exponential backoff and
/// parses schema-validated JSON out of the response text.
#[derive(Clone)]
pub struct AnthropicGenerator {
    client: Client,
    api_key: String,
    model: String,
}

impl AnthropicGenerator {
    pub fn new(api_key: String, model: String) -> GenAiResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()?;
        Ok(Self {
            client,
            api_key,
            model,
        })
    }

    async fn call(&self, prompt: &str, system: &str) -> GenAiResult<MessagesResponse> {
        let request_body = MessagesRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            system,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        let mut last_error: Option<GenAiError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "generator call failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(ANTHROPIC_API_URL)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .header("content-type", "application/json")
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(GenAiError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!(status = status.as_u16(), body = %body, "generator API transient failure");
                last_error = Some(GenAiError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<ApiError>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(GenAiError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let parsed: MessagesResponse = response.json().await?;

            debug!(
                input_tokens = parsed.usage.input_tokens,
                output_tokens = parsed.usage.output_tokens,
                "generator call succeeded"
            );

            return Ok(parsed);
        }

        Err(last_error.unwrap_or(GenAiError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }

    async fn call_json<T: DeserializeOwned>(&self, prompt: &str, system: &str) -> GenAiResult<T> {
        let response = self.call(prompt, system).await?;
        let text = response.text().ok_or(GenAiError::EmptyContent)?;
        let text = strip_json_fences(text);
        serde_json::from_str(text).map_err(GenAiError::Parse)
    }
}

#[async_trait]
impl TextGenerator for AnthropicGenerator {
    async fn answer_commentary(&self, input: &CommentaryInput) -> GenAiResult<String> {
        let prompt = prompts::commentary_prompt(input);
        let response = self.call(&prompt, prompts::COMMENTARY_SYSTEM).await?;
        let text = response.text().ok_or(GenAiError::EmptyContent)?;
        Ok(text.trim().to_string())
    }

    async fn fit_report(&self, input: &FitReportInput) -> GenAiResult<FitReport> {
        let prompt = prompts::fit_report_prompt(input)?;
        self.call_json(&prompt, prompts::JSON_ONLY_SYSTEM).await
    }

    async fn archetype(&self, input: &ArchetypeInput) -> GenAiResult<ArchetypeLabel> {
        let prompt = prompts::archetype_prompt(input)?;
        self.call_json(&prompt, prompts::JSON_ONLY_SYSTEM).await
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences the model sometimes
/// wraps around JSON output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let text = if let Some(stripped) = text.strip_prefix("```json") {
        stripped.trim_start()
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped.trim_start()
    } else {
        text
    };
    text.strip_suffix("```").map(str::trim_end).unwrap_or(text)
}
