use crate::image::{ImageClient, ImageOutput};
use crate::voice::{VoiceClient, VoiceMessage};
use anyhow::Result;
use log::{info, warn};
use std::time::{Duration, Instant};

/// One media branch's outcome. Errors are carried, not thrown: the join
/// must always see both branches finish.
pub struct BranchOutcome<T> {
    pub result: Result<T>,
    pub elapsed: Duration,
}

pub struct MediaOutcome {
    pub image: BranchOutcome<ImageOutput>,
    pub audio: BranchOutcome<String>,
    pub total: Duration,
}

/// Runs the image and audio branches concurrently and waits for both,
/// regardless of either outcome. A cheap failure on one side must not
/// orphan the other side's in-flight paid call.
pub async fn run_media_fanout(
    image_client: &dyn ImageClient,
    voice_client: &dyn VoiceClient,
    image_prompt: &str,
    voice_messages: &[VoiceMessage],
) -> MediaOutcome {
    let started = Instant::now();

    let image_branch = async {
        let branch_started = Instant::now();
        let result = image_client.generate(image_prompt).await;
        let elapsed = branch_started.elapsed();
        match &result {
            Ok(_) => info!("Image branch finished in {:.2}s", elapsed.as_secs_f64()),
            Err(e) => warn!("Image branch failed after {:.2}s: {:#}", elapsed.as_secs_f64(), e),
        }
        BranchOutcome { result, elapsed }
    };

    let audio_branch = async {
        let branch_started = Instant::now();
        let result = voice_client.synthesize(voice_messages).await;
        let elapsed = branch_started.elapsed();
        match &result {
            Ok(_) => info!("Audio branch finished in {:.2}s", elapsed.as_secs_f64()),
            Err(e) => warn!("Audio branch failed after {:.2}s: {:#}", elapsed.as_secs_f64(), e),
        }
        BranchOutcome { result, elapsed }
    };

    let (image, audio) = tokio::join!(image_branch, audio_branch);

    MediaOutcome { image, audio, total: started.elapsed() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockImage {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl ImageClient for MockImage {
        async fn generate(&self, _prompt: &str) -> Result<ImageOutput> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(anyhow!("moderation rejected"))
            } else {
                Ok(ImageOutput::Inline("aW1n".to_string()))
            }
        }

        async fn fetch(&self, _url: &str) -> Result<String> {
            Ok("aW1n".to_string())
        }
    }

    struct MockVoice {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl VoiceClient for MockVoice {
        async fn synthesize(&self, _messages: &[VoiceMessage]) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(anyhow!("synthesis backend down"))
            } else {
                Ok("c291bmQ=".to_string())
            }
        }
    }

    #[tokio::test]
    async fn test_both_branches_succeed() {
        let image = MockImage { calls: AtomicUsize::new(0), fail: false };
        let voice = MockVoice { calls: AtomicUsize::new(0), fail: false };

        let outcome = run_media_fanout(&image, &voice, "prompt", &[]).await;
        assert!(outcome.image.result.is_ok());
        assert_eq!(outcome.audio.result.as_deref().unwrap(), "c291bmQ=");
    }

    #[tokio::test]
    async fn test_image_failure_does_not_skip_audio() {
        let image = MockImage { calls: AtomicUsize::new(0), fail: true };
        let voice = MockVoice { calls: AtomicUsize::new(0), fail: false };

        let outcome = run_media_fanout(&image, &voice, "prompt", &[]).await;
        assert!(outcome.image.result.is_err());
        assert!(outcome.audio.result.is_ok());
        assert_eq!(image.calls.load(Ordering::SeqCst), 1);
        assert_eq!(voice.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_audio_failure_does_not_skip_image() {
        let image = MockImage { calls: AtomicUsize::new(0), fail: false };
        let voice = MockVoice { calls: AtomicUsize::new(0), fail: true };

        let outcome = run_media_fanout(&image, &voice, "prompt", &[]).await;
        assert!(outcome.image.result.is_ok());
        assert!(outcome.audio.result.is_err());
        assert_eq!(image.calls.load(Ordering::SeqCst), 1);
        assert_eq!(voice.calls.load(Ordering::SeqCst), 1);
    }
}
