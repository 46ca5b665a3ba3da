use crate::config::Config;
use crate::state::ContentType;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use url::Url;

/// What an image backend hands back: inline data, or a reference the
/// assembler must fetch and inline itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageOutput {
    Inline(String),
    Remote(String),
}

#[async_trait]
pub trait ImageClient: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<ImageOutput>;

    /// The extra hop for `ImageOutput::Remote`: download and base64-encode.
    async fn fetch(&self, url: &str) -> Result<String>;
}

pub fn create_image_client(config: &Config) -> Result<Box<dyn ImageClient>> {
    Ok(Box::new(OpenAIImageClient::new(
        &config.openai.api_key,
        &config.openai.image_model,
        &config.openai.image_quality,
        config.openai.base_url.as_deref(),
    )))
}

/// Renders the one-shot illustration prompt. Wording differs between the
/// two content types; the visual description comes from the generator.
pub fn build_image_prompt(
    description: &str,
    content_type: ContentType,
    title: &str,
    chapter: &str,
) -> String {
    let (kind, label, style, composition, lighting, quality, mood) = match content_type {
        ContentType::Learning => (
            "educational",
            "Topic",
            "Educational illustration, clear diagram, engaging visual metaphor, detailed digital art",
            "Clear, informative visual showing the concept",
            "Clear, bright, easy to understand",
            "educational clarity",
            "clear, informative",
        ),
        ContentType::Book => (
            "cinematic",
            "Book",
            "Cinematic book illustration, detailed digital art, atmospheric lighting, wide establishing shot",
            "Wide shot showing full scene",
            "Dramatic, atmospheric, mood-appropriate",
            "immersive storytelling",
            "authentic to source material, immersive",
        ),
    };

    format!(
        "Professional {kind} illustration.\n\n\
Scene: {description}\n\n\
Visual Style:\n\
- Art: {style}\n\
- Composition: {composition}\n\
- Lighting: {lighting}\n\
- Quality: Rich colors, {quality}\n\n\
{label}: \"{title}\"\n\
Section: {chapter}\n\
Mood: Engaging, {mood}."
    )
}

// --- OpenAI Images API ---

pub struct OpenAIImageClient {
    api_key: String,
    model: String,
    quality: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAIImageClient {
    pub fn new(api_key: &str, model: &str, quality: &str, base_url: Option<&str>) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            quality: quality.to_string(),
            base_url: base_url
                .unwrap_or("https://api.openai.com/v1")
                .trim_end_matches('/')
                .to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Serialize)]
struct ImageRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u32,
    size: &'a str,
    quality: &'a str,
}

#[derive(Deserialize)]
struct ImageResponse {
    data: Vec<ImageDatum>,
}

#[derive(Deserialize)]
struct ImageDatum {
    b64_json: Option<String>,
    url: Option<String>,
}

#[async_trait]
impl ImageClient for OpenAIImageClient {
    async fn generate(&self, prompt: &str) -> Result<ImageOutput> {
        let url = format!("{}/images/generations", self.base_url);

        let request_body = ImageRequest {
            model: &self.model,
            prompt,
            n: 1,
            size: "1024x1024",
            quality: &self.quality,
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
            return Err(anyhow!("Image API error: {}", error_text));
        }

        let result: ImageResponse = resp.json().await?;
        let datum = result
            .data
            .first()
            .ok_or_else(|| anyhow!("Image API returned no data"))?;

        if let Some(b64) = &datum.b64_json {
            return Ok(ImageOutput::Inline(b64.clone()));
        }
        if let Some(url) = &datum.url {
            return Ok(ImageOutput::Remote(url.clone()));
        }
        Err(anyhow!("Image API returned neither inline data nor a URL"))
    }

    async fn fetch(&self, url: &str) -> Result<String> {
        let parsed = Url::parse(url).context("Invalid image URL")?;
        let resp = self.client.get(parsed).send().await?;
        if !resp.status().is_success() {
            return Err(anyhow!("Image fetch failed: {}", resp.status()));
        }
        let bytes = resp.bytes().await?;
        Ok(STANDARD.encode(&bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_learning_prompt_uses_educational_style() {
        let prompt = build_image_prompt(
            "a black hole bending light",
            ContentType::Learning,
            "Learning: Black Holes",
            "Introduction",
        );
        assert!(prompt.contains("educational illustration"));
        assert!(prompt.contains("clear diagram"));
        assert!(prompt.contains("Topic: \"Learning: Black Holes\""));
        assert!(!prompt.contains("Cinematic book illustration"));
    }

    #[test]
    fn test_book_prompt_uses_cinematic_style() {
        let prompt = build_image_prompt(
            "a castle at dusk",
            ContentType::Book,
            "The Hobbit",
            "An Unexpected Party",
        );
        assert!(prompt.contains("cinematic illustration"));
        assert!(prompt.contains("atmospheric lighting"));
        assert!(prompt.contains("Book: \"The Hobbit\""));
        assert!(prompt.contains("Section: An Unexpected Party"));
    }

    #[test]
    fn test_image_response_prefers_inline_data() {
        let json = r#"{ "data": [ { "b64_json": "aW1n", "url": "https://img.example/x.png" } ] }"#;
        let parsed: ImageResponse = serde_json::from_str(json).unwrap();
        let datum = parsed.data.first().unwrap();
        assert_eq!(datum.b64_json.as_deref(), Some("aW1n"));
    }

    #[test]
    fn test_image_response_url_only() {
        let json = r#"{ "data": [ { "url": "https://img.example/x.png" } ] }"#;
        let parsed: ImageResponse = serde_json::from_str(json).unwrap();
        let datum = parsed.data.first().unwrap();
        assert!(datum.b64_json.is_none());
        assert_eq!(datum.url.as_deref(), Some("https://img.example/x.png"));
    }
}
