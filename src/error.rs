use thiserror::Error;

/// Fatal turn outcomes. Every variant maps to a stable machine-readable
/// kind so a caller can decide what to retry; branch-level media failures
/// are not represented here, only the empty-slot conditions they cause.
#[derive(Debug, Error)]
pub enum TurnError {
    #[error("no audio or text input provided")]
    NoInput,

    #[error("could not transcribe audio")]
    EmptyTranscription,

    #[error("reference audio/transcript not found for {narrator}")]
    MissingReference { narrator: String },

    #[error("content generation failed: {0}")]
    Generation(anyhow::Error),

    #[error("audio generation failed")]
    AudioFailed,

    #[error("image generation failed")]
    ImageFailed,

    #[error("internal error: {0}")]
    Internal(anyhow::Error),
}

impl From<anyhow::Error> for TurnError {
    fn from(source: anyhow::Error) -> Self {
        TurnError::Internal(source)
    }
}

impl TurnError {
    pub fn kind(&self) -> &'static str {
        match self {
            TurnError::NoInput => "no-input",
            TurnError::EmptyTranscription => "transcription-empty",
            TurnError::MissingReference { .. } => "missing-reference",
            TurnError::Generation(_) => "generation-failed",
            TurnError::AudioFailed => "audio-failed",
            TurnError::ImageFailed => "image-failed",
            TurnError::Internal(_) => "internal-error",
        }
    }

    /// The message shown outside the engine. Internal detail is withheld
    /// unless `dev_mode` is set.
    pub fn public_message(&self, dev_mode: bool) -> String {
        match self {
            TurnError::Generation(source) if dev_mode => {
                format!("Content generation failed: {}", source)
            }
            TurnError::Internal(source) if dev_mode => {
                format!("Internal error: {:#}", source)
            }
            TurnError::NoInput => "No audio or text input provided.".to_string(),
            TurnError::EmptyTranscription => {
                "Could not transcribe audio. Please try again.".to_string()
            }
            TurnError::MissingReference { narrator } => {
                format!("Reference audio/transcript not found for {}", narrator)
            }
            TurnError::Generation(_) => "Content generation failed. Please try again.".to_string(),
            TurnError::AudioFailed => "Audio generation failed. Please try again.".to_string(),
            TurnError::ImageFailed => "Image generation failed. Please try again.".to_string(),
            TurnError::Internal(_) => "Something went wrong. Please try again.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_kinds_are_distinct() {
        let errors = [
            TurnError::NoInput,
            TurnError::EmptyTranscription,
            TurnError::MissingReference { narrator: "Cher".to_string() },
            TurnError::Generation(anyhow!("boom")),
            TurnError::AudioFailed,
            TurnError::ImageFailed,
            TurnError::Internal(anyhow!("boom")),
        ];
        let mut kinds: Vec<&str> = errors.iter().map(|e| e.kind()).collect();
        kinds.sort();
        kinds.dedup();
        assert_eq!(kinds.len(), errors.len());
    }

    #[test]
    fn test_missing_reference_names_narrator() {
        let err = TurnError::MissingReference { narrator: "Po".to_string() };
        assert!(err.public_message(false).contains("Po"));
    }

    #[test]
    fn test_internal_detail_gated_by_dev_mode() {
        let err = TurnError::Internal(anyhow!("secret backend detail"));
        assert!(!err.public_message(false).contains("secret"));
        assert!(err.public_message(true).contains("secret backend detail"));
    }
}
