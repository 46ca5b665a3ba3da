/// Hue step between adjacent speaker indices, in degrees. 137 sits near the
/// golden angle, so small consecutive indices land far apart on the hue wheel.
const HUE_STEP: u32 = 137;

const NEUTRAL_COLOR: &str = "hsl(0, 0%, 62%)";

/// Line grammar: `tag? text`, where tag is "[SPEAKER" digits "]".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineToken {
    Tagged { index: usize, text: String },
    Untagged { text: String },
}

/// One parsed unit of narration, ready for display. `speaker` is None for
/// lines that carried no recognizable tag.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneLine {
    pub speaker: Option<usize>,
    pub name: String,
    pub text: String,
    pub color: String,
}

pub fn speaker_color(index: usize) -> String {
    let hue = (index as u32 * HUE_STEP) % 360;
    format!("hsl({}, 70%, 55%)", hue)
}

/// Recognizes the leading speaker tag of one line. Anything that is not
/// exactly "[SPEAKER" followed by digits and "]" leaves the line untagged.
pub fn recognize_line(line: &str) -> LineToken {
    let trimmed = line.trim();

    let rest = match trimmed.strip_prefix("[SPEAKER") {
        Some(rest) => rest,
        None => return LineToken::Untagged { text: trimmed.to_string() },
    };

    let close = match rest.find(']') {
        Some(pos) => pos,
        None => return LineToken::Untagged { text: trimmed.to_string() },
    };

    let digits = &rest[..close];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return LineToken::Untagged { text: trimmed.to_string() };
    }

    match digits.parse::<usize>() {
        Ok(index) => LineToken::Tagged {
            index,
            text: rest[close + 1..].trim_start().to_string(),
        },
        // Digit run too long for usize; keep the line verbatim.
        Err(_) => LineToken::Untagged { text: trimmed.to_string() },
    }
}

/// Splits tagged narration into ordered scene lines. `narrator_names` is the
/// turn's active speaker list; a tag index beyond it gets a synthetic
/// "Speaker N" name rather than failing the turn.
pub fn parse_scene(text: &str, narrator_names: &[String]) -> Vec<SceneLine> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| match recognize_line(line) {
            LineToken::Tagged { index, text } => {
                let name = narrator_names
                    .get(index)
                    .cloned()
                    .unwrap_or_else(|| format!("Speaker {}", index));
                SceneLine {
                    speaker: Some(index),
                    name,
                    text,
                    color: speaker_color(index),
                }
            }
            LineToken::Untagged { text } => SceneLine {
                speaker: None,
                name: String::new(),
                text,
                color: NEUTRAL_COLOR.to_string(),
            },
        })
        .collect()
}

/// Flattens parsed lines into a "Name: text" display transcript; lines with
/// no speaker keep their bare text.
pub fn flatten_transcript(lines: &[SceneLine]) -> String {
    lines
        .iter()
        .map(|line| {
            if line.name.is_empty() {
                line.text.clone()
            } else {
                format!("{}: {}", line.name, line.text)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_recognize_tagged_line() {
        assert_eq!(
            recognize_line("[SPEAKER0] Once upon a time."),
            LineToken::Tagged { index: 0, text: "Once upon a time.".to_string() }
        );
        assert_eq!(
            recognize_line("[SPEAKER12]twelve"),
            LineToken::Tagged { index: 12, text: "twelve".to_string() }
        );
    }

    #[test]
    fn test_recognize_rejects_malformed_tags() {
        for line in ["[SPEAKER] hi", "[SPEAKERx] hi", "[SPEAKER1 hi", "SPEAKER0 hi", "(SPEAKER0) hi"] {
            match recognize_line(line) {
                LineToken::Untagged { .. } => {}
                other => panic!("expected untagged for {:?}, got {:?}", line, other),
            }
        }
    }

    #[test]
    fn test_parse_two_speakers() {
        let narrators = names(&["Albert Einstein", "Cher"]);
        let lines = parse_scene(
            "[SPEAKER0] Let's explore.\n[SPEAKER1] Oh, I love this topic.",
            &narrators,
        );
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].speaker, Some(0));
        assert_eq!(lines[0].name, "Albert Einstein");
        assert_eq!(lines[1].speaker, Some(1));
        assert_eq!(lines[1].name, "Cher");
        assert_ne!(lines[0].color, lines[1].color);
    }

    #[test]
    fn test_speaker_indices_map_into_narrator_list() {
        let narrators = names(&["A", "B", "C"]);
        let lines = parse_scene("[SPEAKER2] c\n[SPEAKER0] a\n[SPEAKER1] b", &narrators);
        for line in &lines {
            let index = line.speaker.unwrap();
            assert!(index < narrators.len());
            assert_eq!(line.name, narrators[index]);
        }
        // Encounter order preserved, not index order.
        assert_eq!(lines[0].speaker, Some(2));
    }

    #[test]
    fn test_untagged_line_keeps_text_and_neutral_color() {
        let lines = parse_scene("The wind howled outside.", &names(&["A"]));
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].speaker, None);
        assert_eq!(lines[0].name, "");
        assert_eq!(lines[0].text, "The wind howled outside.");
        assert_eq!(lines[0].color, NEUTRAL_COLOR);
    }

    #[test]
    fn test_out_of_range_index_gets_synthetic_name() {
        let lines = parse_scene("[SPEAKER2] who is this", &names(&["A", "B"]));
        assert_eq!(lines[0].speaker, Some(2));
        assert_eq!(lines[0].name, "Speaker 2");
    }

    #[test]
    fn test_color_is_deterministic_per_index() {
        assert_eq!(speaker_color(1), speaker_color(1));
        assert_eq!(speaker_color(0), "hsl(0, 70%, 55%)");
        assert_eq!(speaker_color(1), "hsl(137, 70%, 55%)");
        assert_eq!(speaker_color(2), "hsl(274, 70%, 55%)");
    }

    #[test]
    fn test_small_indices_get_separated_hues() {
        let hue = |i: usize| (i as u32 * 137) % 360;
        let distance = |a: u32, b: u32| {
            let d = a.abs_diff(b);
            d.min(360 - d)
        };
        assert!(distance(hue(0), hue(1)) >= 90);
        assert!(distance(hue(1), hue(2)) >= 90);
        assert!(distance(hue(0), hue(2)) >= 80);
    }

    #[test]
    fn test_blank_lines_are_dropped() {
        let lines = parse_scene("[SPEAKER0] a\n\n   \n[SPEAKER0] b", &names(&["A"]));
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_flatten_transcript() {
        let narrators = names(&["Po"]);
        let lines = parse_scene("[SPEAKER0] Skadoosh.\njust ambience", &narrators);
        assert_eq!(flatten_transcript(&lines), "Po: Skadoosh.\njust ambience");
    }
}
