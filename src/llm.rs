use crate::config::Config;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// One opaque structured-output call per turn: an instruction plus a
/// declared output shape, returning JSON text conforming to it.
#[async_trait]
pub trait GenerationClient: Send + Sync + Debug {
    async fn generate(
        &self,
        prompt: &str,
        schema_name: &str,
        schema: &serde_json::Value,
    ) -> Result<String>;
}

pub fn create_generation_client(config: &Config) -> Result<Box<dyn GenerationClient>> {
    Ok(Box::new(OpenAIGenerationClient::new(
        &config.openai.api_key,
        &config.openai.llm_model,
        config.openai.base_url.as_deref(),
    )))
}

// --- OpenAI Responses API ---

#[derive(Debug)]
pub struct OpenAIGenerationClient {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAIGenerationClient {
    pub fn new(api_key: &str, model: &str, base_url: Option<&str>) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: base_url
                .unwrap_or("https://api.openai.com/v1")
                .trim_end_matches('/')
                .to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    input: &'a str,
    text: TextFormatWrapper<'a>,
}

#[derive(Serialize)]
struct TextFormatWrapper<'a> {
    format: TextFormat<'a>,
}

#[derive(Serialize)]
struct TextFormat<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    name: &'a str,
    schema: &'a serde_json::Value,
}

#[derive(Deserialize)]
struct ResponsesResponse {
    #[serde(default)]
    output: Vec<ResponsesOutputItem>,
    error: Option<ResponsesError>,
}

#[derive(Deserialize)]
struct ResponsesOutputItem {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    content: Vec<ResponsesContentPart>,
}

#[derive(Deserialize)]
struct ResponsesContentPart {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ResponsesError {
    message: String,
}

#[async_trait]
impl GenerationClient for OpenAIGenerationClient {
    async fn generate(
        &self,
        prompt: &str,
        schema_name: &str,
        schema: &serde_json::Value,
    ) -> Result<String> {
        let url = format!("{}/responses", self.base_url);

        let request_body = ResponsesRequest {
            model: &self.model,
            input: prompt,
            text: TextFormatWrapper {
                format: TextFormat {
                    kind: "json_schema",
                    name: schema_name,
                    schema,
                },
            },
        };

        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request_body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let error_text = resp.text().await?;
            return Err(anyhow!("OpenAI responses API error: {}", error_text));
        }

        let response_text = resp.text().await?;
        let result: ResponsesResponse = serde_json::from_str(&response_text)
            .map_err(|e| anyhow!("Failed to parse responses API body: {}. Body: {}", e, response_text))?;

        if let Some(err) = result.error {
            return Err(anyhow!("OpenAI responses API returned error: {}", err.message));
        }

        for item in &result.output {
            if item.kind != "message" {
                continue;
            }
            for part in &item.content {
                if part.kind == "output_text" {
                    if let Some(text) = &part.text {
                        return Ok(text.clone());
                    }
                }
            }
        }

        Err(anyhow!("Responses API output empty or missing text. Body: {}", response_text))
    }
}
