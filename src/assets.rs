use crate::error::TurnError;
use crate::narrators::NarratorProfile;
use anyhow::Result;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use futures_util::future::try_join_all;
use log::debug;
use std::path::PathBuf;

/// Byte access to the fixed reference assets. Static content, no cache
/// invalidation.
#[async_trait]
pub trait AssetStore: Send + Sync {
    async fn read(&self, path: &str) -> Result<Vec<u8>>;
    async fn exists(&self, path: &str) -> Result<bool>;
}

pub struct FsAssetStore {
    base: PathBuf,
}

impl FsAssetStore {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.base.join(path)
    }
}

#[async_trait]
impl AssetStore for FsAssetStore {
    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        Ok(tokio::fs::read(self.resolve(path)).await?)
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        Ok(tokio::fs::try_exists(self.resolve(path)).await?)
    }
}

/// A narrator's voice sample and matching transcript, decoded for transport.
/// Loaded fresh each turn; position in the returned list is the speaker
/// channel index.
#[derive(Debug, Clone)]
pub struct ReferenceBundle {
    pub narrator: String,
    pub audio_base64: String,
    pub transcript: String,
}

/// Loads one bundle per narrator, concurrently, in speaker order.
/// All-or-nothing: any missing asset fails the whole turn, identifying the
/// narrator, before any paid generation call happens.
pub async fn load_reference_bundles(
    store: &dyn AssetStore,
    narrators: &[&NarratorProfile],
) -> Result<Vec<ReferenceBundle>, TurnError> {
    let loads = narrators.iter().map(|profile| async move {
        let audio_ok = store
            .exists(profile.ref_audio)
            .await
            .map_err(TurnError::Internal)?;
        let transcript_ok = store
            .exists(profile.ref_transcript)
            .await
            .map_err(TurnError::Internal)?;
        if !audio_ok || !transcript_ok {
            return Err(TurnError::MissingReference { narrator: profile.name.to_string() });
        }

        let audio_bytes = store
            .read(profile.ref_audio)
            .await
            .map_err(TurnError::Internal)?;
        let transcript_bytes = store
            .read(profile.ref_transcript)
            .await
            .map_err(TurnError::Internal)?;
        let transcript = String::from_utf8_lossy(&transcript_bytes).trim().to_string();

        debug!(
            "Loaded reference bundle for {} ({} audio bytes)",
            profile.name,
            audio_bytes.len()
        );

        Ok(ReferenceBundle {
            narrator: profile.name.to_string(),
            audio_base64: STANDARD.encode(&audio_bytes),
            transcript,
        })
    });

    try_join_all(loads).await
}
