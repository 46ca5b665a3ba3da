use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Folder holding the narrator reference assets (ref-audio/*).
    #[serde(default = "default_assets")]
    pub assets_folder: String,

    /// Folder the CLI writes returned audio/image artifacts into.
    #[serde(default = "default_output")]
    pub output_folder: String,

    /// Include backend error detail in user-facing failure messages.
    #[serde(default)]
    pub dev_mode: bool,

    pub openai: OpenAIConfig,

    pub voice: VoiceConfig,
}

/// One account covers content generation, transcription and images.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OpenAIConfig {
    pub api_key: String,
    pub base_url: Option<String>,

    #[serde(default = "default_llm_model")]
    pub llm_model: String,

    #[serde(default = "default_stt_model")]
    pub stt_model: String,

    #[serde(default = "default_image_model")]
    pub image_model: String,

    #[serde(default = "default_image_quality")]
    pub image_quality: String,
}

/// The cloned-voice synthesis backend (OpenAI-compatible chat endpoint
/// with audio modality).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct VoiceConfig {
    pub api_key: String,

    #[serde(default = "default_voice_base_url")]
    pub base_url: String,

    #[serde(default = "default_voice_model")]
    pub model: String,
}

fn default_assets() -> String {
    "assets".to_string()
}
fn default_output() -> String {
    "output".to_string()
}
fn default_llm_model() -> String {
    "gpt-4o".to_string()
}
fn default_stt_model() -> String {
    "whisper-1".to_string()
}
fn default_image_model() -> String {
    "dall-e-3".to_string()
}
fn default_image_quality() -> String {
    "low".to_string()
}
fn default_voice_base_url() -> String {
    "https://hackathon.boson.ai/v1".to_string()
}
fn default_voice_model() -> String {
    "higgs-audio-generation-Hackathon".to_string()
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from("config.yml")
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            anyhow::bail!("{} not found. Please create one.", path.display());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = serde_yaml_ng::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    pub fn ensure_directories(&self) -> Result<()> {
        fs::create_dir_all(&self.output_folder)?;
        Ok(())
    }
}
