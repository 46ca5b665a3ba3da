use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use indicatif::{ProgressBar, ProgressStyle};
use livetale::config::Config;
use livetale::engine::{TurnEngine, TurnRequest, TurnResponse};
use livetale::state::{ConversationTurn, StoryState};
use std::fs;
use std::path::Path;
use std::time::Duration;

const FREE_INPUT: &str = "(say something else)";
const RESTART: &str = "(start a new story or topic)";
const QUIT: &str = "(quit)";

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let config = match Config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            eprintln!("Please ensure 'config.yml' exists with valid API settings.");
            return Err(e);
        }
    };
    config.ensure_directories()?;

    let engine = TurnEngine::from_config(&config)?;

    // The engine is stateless; this loop is the caller that round-trips
    // history and story state between turns.
    let mut history: Vec<ConversationTurn> = Vec::new();
    let mut story_state: Option<StoryState> = None;
    let mut turn_counter = 0usize;

    let mut next_input =
        inquire::Text::new("What book or topic should we bring to life?").prompt()?;

    loop {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(ProgressStyle::default_spinner());
        spinner.set_message("Generating scene, audio and image...");
        spinner.enable_steady_tick(Duration::from_millis(120));

        let result = engine
            .run_turn(TurnRequest {
                audio: None,
                text: Some(next_input.clone()),
                conversation_history: history.clone(),
                story_state: story_state.clone(),
            })
            .await;
        spinner.finish_and_clear();

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                eprintln!("{}", e.public_message(config.dev_mode));
                let retry = inquire::Confirm::new("Try again with the same input?")
                    .with_default(true)
                    .prompt()?;
                if retry {
                    continue;
                }
                break;
            }
        };

        turn_counter += 1;
        history = response.conversation_history.clone();
        story_state = Some(response.story_state.clone());

        print_scene(&response);
        write_artifacts(&config.output_folder, turn_counter, &response)?;

        let mut options = response.choices.clone();
        options.push(FREE_INPUT.to_string());
        options.push(RESTART.to_string());
        options.push(QUIT.to_string());

        let picked = inquire::Select::new("What next?", options).prompt()?;
        next_input = match picked.as_str() {
            QUIT => break,
            RESTART => {
                history.clear();
                story_state = None;
                inquire::Text::new("What book or topic should we bring to life?").prompt()?
            }
            FREE_INPUT => inquire::Text::new("Your words:").prompt()?,
            choice => choice.to_string(),
        };
    }

    Ok(())
}

fn print_scene(response: &TurnResponse) {
    println!();
    println!(
        "== {} / {} (narrated by {})",
        response.book_title,
        response.current_chapter,
        response.narrator_names.join(", ")
    );
    println!("{}", response.transcript);
    println!();
}

fn write_artifacts(output_folder: &str, turn: usize, response: &TurnResponse) -> Result<()> {
    let audio = STANDARD
        .decode(&response.audio_base64)
        .context("Audio payload is not valid base64")?;
    let image = STANDARD
        .decode(&response.scene_image.image_base64)
        .context("Image payload is not valid base64")?;

    let audio_path = Path::new(output_folder).join(format!("turn_{:03}.mp3", turn));
    let image_path = Path::new(output_folder).join(format!("turn_{:03}.png", turn));
    fs::write(&audio_path, audio)?;
    fs::write(&image_path, image)?;

    println!(
        "Saved {} and {} (show image for {:.0}s)",
        audio_path.display(),
        image_path.display(),
        response.scene_image.duration
    );
    Ok(())
}
