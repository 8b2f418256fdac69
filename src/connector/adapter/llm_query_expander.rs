use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::application::QueryExpander;
use crate::domain::StorageError;

const MESSAGES_PATH: &str = "/v1/messages";
const ANTHROPIC_API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 256;

const SYSTEM_PROMPT: &str = "\
You help an agent recall previously solved tasks. Rewrite the user's task \
description into alternative phrasings that would match how a similar task \
was described before.

Rules:
1. Return ONLY a JSON array of strings, with no prose and no code fences.
2. Generate exactly 2 alternative phrasings (do not include the original).
3. Each alternative must be concise (at most 12 words).
4. Prefer concrete nouns: tools, file types, commands, libraries, error names.

Example input:  \"make the CI fail when formatting is wrong\"
Example output: [\"enforce rustfmt check in GitHub Actions\", \"lint formatting step fails pipeline\"]";

#[derive(Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<ApiMessage<'a>>,
}

#[derive(Serialize)]
struct ApiMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ApiResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

/// A [`QueryExpander`] backed by the Anthropic Messages API.
///
/// Never fails: when the API is unreachable or answers with something
/// unparseable the original query is returned as the only variant.
pub struct LlmQueryExpander {
    client: reqwest::Client,
    api_key: String,
    model: String,
    url: String,
}

impl LlmQueryExpander {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, StorageError> {
        let base: String = base_url.into();
        let url = format!("{}{}", base.trim_end_matches('/'), MESSAGES_PATH);
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(2))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| StorageError::unavailable(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            url,
        })
    }

    /// Pull the first JSON array of strings out of the model's reply.
    fn parse_variants(text: &str) -> Vec<String> {
        let start = text.find('[');
        let end = text.rfind(']');

        if let (Some(s), Some(e)) = (start, end) {
            if s < e {
                if let Ok(variants) = serde_json::from_str::<Vec<String>>(&text[s..=e]) {
                    return variants
                        .into_iter()
                        .map(|v| v.trim().to_string())
                        .filter(|v| !v.is_empty())
                        .collect();
                }
            }
        }

        warn!("LlmQueryExpander: could not parse model response as JSON array: {text}");
        vec![]
    }
}

#[async_trait]
impl QueryExpander for LlmQueryExpander {
    async fn expand(&self, query: &str) -> Result<Vec<String>, StorageError> {
        let mut variants = vec![query.to_string()];

        let request = ApiRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            system: SYSTEM_PROMPT,
            messages: vec![ApiMessage {
                role: "user",
                content: query,
            }],
        };

        let response = match self
            .client
            .post(&self.url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_API_VERSION)
            .json(&request)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!("LlmQueryExpander: API request failed: {e}. Falling back to original query.");
                return Ok(variants);
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            warn!("LlmQueryExpander: API returned {status}. Falling back to original query.");
            return Ok(variants);
        }

        let api_response: ApiResponse = match response.json().await {
            Ok(r) => r,
            Err(e) => {
                warn!("LlmQueryExpander: failed to deserialize API response: {e}.");
                return Ok(variants);
            }
        };

        if let Some(block) = api_response.content.first() {
            debug!("LlmQueryExpander raw response: {}", block.text);
            variants.extend(Self::parse_variants(&block.text));
        }

        Ok(variants)
    }
}
