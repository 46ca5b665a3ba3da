use crate::assets::{load_reference_bundles, AssetStore, FsAssetStore};
use crate::config::Config;
use crate::error::TurnError;
use crate::image::{build_image_prompt, create_image_client, ImageClient, ImageOutput};
use crate::llm::{create_generation_client, GenerationClient};
use crate::media::run_media_fanout;
use crate::narrators::NarratorRegistry;
use crate::scene::{flatten_transcript, parse_scene, SceneLine};
use crate::script::{
    build_continuation_prompt, build_first_turn_prompt, continuation_schema, first_turn_schema,
    parse_continuation, parse_first_turn, SceneImageSpec,
};
use crate::state::{is_first_turn, ContentType, ConversationTurn, StoryState};
use crate::stt::{create_stt_client, SttClient};
use crate::voice::{build_voice_messages, create_voice_client, VoiceClient};
use anyhow::Context;
use log::{error, info};
use std::time::{Duration, Instant};

pub struct AudioInput {
    pub data: Vec<u8>,
    pub format: String,
}

/// One turn's input: an utterance (recorded or text) plus the caller-held
/// state returned by the previous turn, if any.
pub struct TurnRequest {
    pub audio: Option<AudioInput>,
    pub text: Option<String>,
    pub conversation_history: Vec<ConversationTurn>,
    pub story_state: Option<StoryState>,
}

#[derive(Debug, Clone)]
pub struct SceneImage {
    pub image_base64: String,
    pub duration: f64,
}

/// Per-step wall-clock breakdown. `media_total` tracks the joined fan-out,
/// so it approaches max(image, audio) rather than their sum.
#[derive(Debug, Clone, Default)]
pub struct TurnTimings {
    pub speech_to_text: Duration,
    pub script_generation: Duration,
    pub reference_loading: Duration,
    pub image_branch: Duration,
    pub audio_branch: Duration,
    pub media_total: Duration,
    pub total: Duration,
}

#[derive(Debug)]
pub struct TurnResponse {
    /// Primary voice: index 0 of the speaker list.
    pub narrator_name: String,
    pub narrator_names: Vec<String>,
    pub book_title: String,
    pub current_chapter: String,
    pub scene_text: String,
    pub scene_lines: Vec<SceneLine>,
    pub transcript: String,
    pub choices: Vec<String>,
    pub audio_base64: String,
    pub scene_image: SceneImage,
    pub conversation_history: Vec<ConversationTurn>,
    pub story_state: StoryState,
    pub timings: TurnTimings,
}

/// What this turn will narrate, normalized across the first-turn and
/// continuation shapes.
struct TurnPlan {
    content_type: ContentType,
    book_title: String,
    plot_summary: String,
    current_chapter: String,
    scene_text: String,
    choices: Vec<String>,
    scene_image: SceneImageSpec,
    requested_narrators: Vec<String>,
}

pub struct TurnEngine {
    registry: NarratorRegistry,
    llm: Box<dyn GenerationClient>,
    stt: Box<dyn SttClient>,
    image: Box<dyn ImageClient>,
    voice: Box<dyn VoiceClient>,
    store: Box<dyn AssetStore>,
}

impl TurnEngine {
    pub fn new(
        registry: NarratorRegistry,
        llm: Box<dyn GenerationClient>,
        stt: Box<dyn SttClient>,
        image: Box<dyn ImageClient>,
        voice: Box<dyn VoiceClient>,
        store: Box<dyn AssetStore>,
    ) -> Self {
        Self { registry, llm, stt, image, voice, store }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self::new(
            NarratorRegistry::builtin(),
            create_generation_client(config)?,
            create_stt_client(config)?,
            create_image_client(config)?,
            create_voice_client(config)?,
            Box::new(FsAssetStore::new(&config.assets_folder)),
        ))
    }

    pub fn registry(&self) -> &NarratorRegistry {
        &self.registry
    }

    /// Runs one full turn. The engine holds no state across calls; the
    /// returned history and story state are the caller's to round-trip.
    pub async fn run_turn(&self, request: TurnRequest) -> Result<TurnResponse, TurnError> {
        let started = Instant::now();
        let result = self.run_turn_inner(request, started).await;
        if let Err(e) = &result {
            error!(
                "Turn failed after {:.2}s: {} ({})",
                started.elapsed().as_secs_f64(),
                e,
                e.kind()
            );
        }
        result
    }

    async fn run_turn_inner(
        &self,
        request: TurnRequest,
        started: Instant,
    ) -> Result<TurnResponse, TurnError> {
        let mut timings = TurnTimings::default();

        // Step 1: obtain the user's utterance.
        let step = Instant::now();
        let user_input = match (&request.text, &request.audio) {
            (Some(text), _) if !text.trim().is_empty() => text.trim().to_string(),
            (_, Some(audio)) => {
                let transcribed = self
                    .stt
                    .transcribe(&audio.data, &audio.format)
                    .await
                    .context("speech-to-text call failed")?;
                if transcribed.trim().is_empty() {
                    return Err(TurnError::EmptyTranscription);
                }
                transcribed.trim().to_string()
            }
            _ => return Err(TurnError::NoInput),
        };
        timings.speech_to_text = step.elapsed();
        info!("User input: \"{}\"", user_input);

        // Step 2: generate this turn's script.
        let step = Instant::now();
        let first = is_first_turn(request.story_state.as_ref());
        let plan = if first {
            let prompt = build_first_turn_prompt(&user_input, &self.registry);
            let raw = self
                .llm
                .generate(&prompt, "first_turn_script", &first_turn_schema())
                .await
                .map_err(TurnError::Generation)?;
            let script = parse_first_turn(&raw).map_err(TurnError::Generation)?;
            TurnPlan {
                content_type: script.content_type,
                book_title: script.book_title,
                plot_summary: script.plot_summary,
                current_chapter: script.current_chapter,
                scene_text: script.scene_text,
                choices: script.choices,
                scene_image: script.scene_image,
                requested_narrators: script.narrator_names,
            }
        } else {
            // Classification guarantees the state is present and titled.
            let story = request.story_state.as_ref().unwrap();
            let prompt =
                build_continuation_prompt(&user_input, story, &request.conversation_history);
            let raw = self
                .llm
                .generate(&prompt, "continuation_script", &continuation_schema())
                .await
                .map_err(TurnError::Generation)?;
            let script = parse_continuation(&raw).map_err(TurnError::Generation)?;
            TurnPlan {
                content_type: story.content_type,
                book_title: story.book_title.clone(),
                plot_summary: story.plot_summary.clone(),
                current_chapter: script.current_chapter,
                scene_text: script.scene_text,
                choices: script.choices,
                scene_image: script.scene_image,
                requested_narrators: story.narrators.clone(),
            }
        };
        timings.script_generation = step.elapsed();

        let profiles = self.registry.resolve_all(&plan.requested_narrators);
        if profiles.is_empty() {
            return Err(TurnError::Internal(anyhow::anyhow!("turn has no narrators")));
        }
        let narrator_names: Vec<String> = profiles.iter().map(|p| p.name.to_string()).collect();

        info!(
            "{} \"{}\" / {} / narrated by {}",
            plan.content_type.as_str(),
            plan.book_title,
            plan.current_chapter,
            narrator_names.join(", ")
        );

        // Step 3: reference bundles, all-or-nothing, before any media spend.
        let step = Instant::now();
        let bundles = load_reference_bundles(self.store.as_ref(), &profiles).await?;
        timings.reference_loading = step.elapsed();

        // Step 4: image and audio branches in parallel.
        let image_prompt = build_image_prompt(
            &plan.scene_image.description,
            plan.content_type,
            &plan.book_title,
            &plan.current_chapter,
        );
        let voice_messages = build_voice_messages(&bundles, &plan.scene_text);
        let media = run_media_fanout(
            self.image.as_ref(),
            self.voice.as_ref(),
            &image_prompt,
            &voice_messages,
        )
        .await;
        timings.image_branch = media.image.elapsed;
        timings.audio_branch = media.audio.elapsed;
        timings.media_total = media.total;

        // Step 5: assemble, audio slot first.
        let audio_base64 = match media.audio.result {
            Ok(data) if !data.is_empty() => data,
            _ => return Err(TurnError::AudioFailed),
        };

        let image_base64 = match media.image.result {
            Ok(ImageOutput::Inline(data)) if !data.is_empty() => data,
            Ok(ImageOutput::Remote(url)) => {
                info!("Fetching generated image from URL");
                match self.image.fetch(&url).await {
                    Ok(data) if !data.is_empty() => data,
                    _ => return Err(TurnError::ImageFailed),
                }
            }
            _ => return Err(TurnError::ImageFailed),
        };

        let scene_lines = parse_scene(&plan.scene_text, &narrator_names);
        let transcript = flatten_transcript(&scene_lines);

        let mut conversation_history = request.conversation_history;
        conversation_history.push(ConversationTurn::user(user_input.clone()));
        conversation_history.push(ConversationTurn::narrator(transcript.clone()));

        let story_state = StoryState {
            content_type: plan.content_type,
            book_title: plan.book_title.clone(),
            plot_summary: plan.plot_summary,
            current_chapter: plan.current_chapter.clone(),
            narrators: narrator_names.clone(),
        };

        timings.total = started.elapsed();
        info!(
            "Turn done in {:.2}s (llm {:.2}s, refs {:.2}s, media {:.2}s = max(image {:.2}s, audio {:.2}s))",
            timings.total.as_secs_f64(),
            timings.script_generation.as_secs_f64(),
            timings.reference_loading.as_secs_f64(),
            timings.media_total.as_secs_f64(),
            timings.image_branch.as_secs_f64(),
            timings.audio_branch.as_secs_f64(),
        );

        Ok(TurnResponse {
            narrator_name: narrator_names[0].clone(),
            narrator_names,
            book_title: plan.book_title,
            current_chapter: plan.current_chapter,
            scene_text: plan.scene_text,
            scene_lines,
            transcript,
            choices: plan.choices,
            audio_base64,
            scene_image: SceneImage {
                image_base64,
                duration: plan.scene_image.display_duration(),
            },
            conversation_history,
            story_state,
            timings,
        })
    }
}
