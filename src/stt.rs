use crate::config::Config;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::Deserialize;

#[async_trait]
pub trait SttClient: Send + Sync {
    /// Transcribes a recorded utterance. `format` is the container the
    /// caller recorded in ("webm", "wav", ...).
    async fn transcribe(&self, audio: &[u8], format: &str) -> Result<String>;
}

pub fn create_stt_client(config: &Config) -> Result<Box<dyn SttClient>> {
    Ok(Box::new(WhisperClient::new(
        &config.openai.api_key,
        &config.openai.stt_model,
        config.openai.base_url.as_deref(),
    )))
}

// --- OpenAI audio/transcriptions ---

pub struct WhisperClient {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl WhisperClient {
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

#[derive(Deserialize)]
struct TranscriptionResponse {
    text: String,
}

#[async_trait]
impl SttClient for WhisperClient {
    async fn transcribe(&self, audio: &[u8], format: &str) -> Result<String> {
        let url = format!("{}/audio/transcriptions", self.base_url);

        let part = reqwest::multipart::Part::bytes(audio.to_vec())
            .file_name(format!("audio.{}", format));
        let form = reqwest::multipart::Form::new()
            .text("model", self.model.clone())
            .part("file", part);

        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .multipart(form)
            .send()
            .await?;

        if !resp.status().is_success() {
            let error_text = resp.text().await?;
            return Err(anyhow!("Transcription API error: {}", error_text));
        }

        let result: TranscriptionResponse = resp.json().await?;
        Ok(result.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcription_response_parsing() {
        let json = r#"{ "text": "tell me about black holes" }"#;
        let parsed: TranscriptionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.text, "tell me about black holes");
    }
}
