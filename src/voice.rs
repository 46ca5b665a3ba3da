use crate::assets::ReferenceBundle;
use crate::config::Config;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One turn of the synthesis conversation. Content is either plain text or
/// an audio part carrying a reference sample.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct VoiceMessage {
    pub role: String,
    pub content: MessageContent,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<AudioPart>),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AudioPart {
    #[serde(rename = "type")]
    pub kind: String,
    pub input_audio: InputAudio,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct InputAudio {
    pub data: String,
    pub format: String,
}

impl VoiceMessage {
    fn text(role: &str, content: impl Into<String>) -> Self {
        Self { role: role.to_string(), content: MessageContent::Text(content.into()) }
    }

    fn reference_audio(audio_base64: &str) -> Self {
        Self {
            role: "assistant".to_string(),
            content: MessageContent::Parts(vec![AudioPart {
                kind: "input_audio".to_string(),
                input_audio: InputAudio {
                    data: audio_base64.to_string(),
                    format: "mp3".to_string(),
                },
            }]),
        }
    }
}

/// Builds the multi-speaker synthesis conversation: a system turn stating
/// the composition contract, then one transcript/audio pair per reference
/// bundle in speaker order, then the tagged narration as the turn to render.
/// The backend matches [SPEAKERn] line tags to the n-th reference voice.
pub fn build_voice_messages(bundles: &[ReferenceBundle], narration: &str) -> Vec<VoiceMessage> {
    let cast = bundles
        .iter()
        .enumerate()
        .map(|(i, b)| format!("[SPEAKER{}] is voiced by {}.", i, b.narrator))
        .collect::<Vec<_>>()
        .join(" ");

    let system = format!(
        "You are a multi-voice narration engine. {} reference voice(s) follow, \
each as a transcript and its spoken audio, in speaker order. {} Render the \
final user message as speech, selecting for every line the reference voice \
matching its [SPEAKERn] tag.",
        bundles.len(),
        cast
    );

    let mut messages = vec![VoiceMessage::text("system", system)];
    for bundle in bundles {
        messages.push(VoiceMessage::text("user", &bundle.transcript));
        messages.push(VoiceMessage::reference_audio(&bundle.audio_base64));
    }
    messages.push(VoiceMessage::text("user", narration));
    messages
}

#[async_trait]
pub trait VoiceClient: Send + Sync {
    /// Returns the rendered narration as base64-encoded audio.
    async fn synthesize(&self, messages: &[VoiceMessage]) -> Result<String>;
}

pub fn create_voice_client(config: &Config) -> Result<Box<dyn VoiceClient>> {
    Ok(Box::new(HiggsVoiceClient::new(
        &config.voice.api_key,
        &config.voice.model,
        &config.voice.base_url,
    )))
}

// --- Higgs-style chat completions with audio modality ---

pub struct HiggsVoiceClient {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl HiggsVoiceClient {
    pub fn new(api_key: &str, model: &str, base_url: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Serialize)]
struct SynthesisRequest<'a> {
    model: &'a str,
    messages: &'a [VoiceMessage],
    modalities: [&'a str; 2],
    max_completion_tokens: u32,
    temperature: f64,
    top_p: f64,
    top_k: u32,
    stop: [&'a str; 3],
}

#[derive(Deserialize)]
struct SynthesisResponse {
    choices: Vec<SynthesisChoice>,
}

#[derive(Deserialize)]
struct SynthesisChoice {
    message: SynthesisMessage,
}

#[derive(Deserialize)]
struct SynthesisMessage {
    audio: Option<SynthesisAudio>,
}

#[derive(Deserialize)]
struct SynthesisAudio {
    data: String,
}

#[async_trait]
impl VoiceClient for HiggsVoiceClient {
    async fn synthesize(&self, messages: &[VoiceMessage]) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);

        let request_body = SynthesisRequest {
            model: &self.model,
            messages,
            modalities: ["text", "audio"],
            max_completion_tokens: 4096,
            temperature: 1.0,
            top_p: 0.95,
            top_k: 50,
            stop: ["<|eot_id|>", "<|end_of_text|>", "<|audio_eos|>"],
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
            return Err(anyhow!("Voice API error: {}", error_text));
        }

        let result: SynthesisResponse = resp.json().await?;
        let audio = result
            .choices
            .first()
            .and_then(|c| c.message.audio.as_ref())
            .ok_or_else(|| anyhow!("Voice API response missing audio payload"))?;

        if audio.data.is_empty() {
            return Err(anyhow!("Voice API returned empty audio payload"));
        }
        Ok(audio.data.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle(narrator: &str, audio: &str, transcript: &str) -> ReferenceBundle {
        ReferenceBundle {
            narrator: narrator.to_string(),
            audio_base64: audio.to_string(),
            transcript: transcript.to_string(),
        }
    }

    #[test]
    fn test_message_order_for_two_speakers() {
        let bundles = vec![
            bundle("Albert Einstein", "QUFB", "time is relative"),
            bundle("Cher", "QkJC", "do you believe"),
        ];
        let messages =
            build_voice_messages(&bundles, "[SPEAKER0] Hello.\n[SPEAKER1] Hi there.");

        assert_eq!(messages.len(), 6);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1], VoiceMessage::text("user", "time is relative"));
        assert_eq!(messages[2].role, "assistant");
        assert_eq!(messages[3], VoiceMessage::text("user", "do you believe"));
        assert_eq!(messages[4].role, "assistant");
        assert_eq!(
            messages[5],
            VoiceMessage::text("user", "[SPEAKER0] Hello.\n[SPEAKER1] Hi there.")
        );

        match &messages[0].content {
            MessageContent::Text(system) => {
                assert!(system.contains("[SPEAKER0] is voiced by Albert Einstein."));
                assert!(system.contains("[SPEAKER1] is voiced by Cher."));
            }
            other => panic!("system turn should be text, got {:?}", other),
        }
    }

    #[test]
    fn test_single_speaker_is_degenerate_case() {
        let bundles = vec![bundle("Po", "QUFB", "skadoosh")];
        let messages = build_voice_messages(&bundles, "[SPEAKER0] Inner peace.");
        assert_eq!(messages.len(), 4);
    }

    #[test]
    fn test_reference_audio_serialization() {
        let message = VoiceMessage::reference_audio("QUJD");
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["content"][0]["type"], "input_audio");
        assert_eq!(json["content"][0]["input_audio"]["data"], "QUJD");
        assert_eq!(json["content"][0]["input_audio"]["format"], "mp3");
    }

    #[test]
    fn test_text_message_serializes_as_plain_string() {
        let message = VoiceMessage::text("user", "hello");
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["content"], "hello");
    }

    #[test]
    fn test_synthesis_response_parsing() {
        let json = r#"{ "choices": [ { "message": { "audio": { "data": "c291bmQ=" } } } ] }"#;
        let parsed: SynthesisResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.choices[0].message.audio.as_ref().unwrap().data, "c291bmQ=");
    }

    #[test]
    fn test_synthesis_response_missing_audio() {
        let json = r#"{ "choices": [ { "message": { "content": "no audio here" } } ] }"#;
        let parsed: SynthesisResponse = serde_json::from_str(json).unwrap();
        assert!(parsed.choices[0].message.audio.is_none());
    }
}
