use log::{info, warn};

/// A voice persona: display name, reference assets and selection metadata.
/// Profiles are defined once at startup and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct NarratorProfile {
    pub name: &'static str,
    pub description: &'static str,
    pub personality: &'static str,
    pub expertise: &'static [&'static str],
    pub ref_audio: &'static str,
    pub ref_transcript: &'static str,
}

pub struct NarratorRegistry {
    profiles: Vec<NarratorProfile>,
}

const DEFAULT_NARRATOR: &str = "David Attenborough";

impl NarratorRegistry {
    pub fn builtin() -> Self {
        Self {
            profiles: vec![
                NarratorProfile {
                    name: "Albert Einstein",
                    description: "Theoretical physicist known for the theory of relativity.",
                    personality: "Playful genius who uses thought experiments and loves making complex ideas click with \"aha!\" moments",
                    expertise: &["Physics", "Mathematics", "Philosophy", "Science"],
                    ref_audio: "ref-audio/einstein.mp3",
                    ref_transcript: "ref-audio/einstein.txt",
                },
                NarratorProfile {
                    name: "Dipper Pines",
                    description: "Curious and adventurous character from Gravity Falls.",
                    personality: "Enthusiastic nerd energy, references mysteries and makes everything an adventure",
                    expertise: &["Mystery", "Adventure", "Puzzles", "Cryptography"],
                    ref_audio: "ref-audio/dipper.mp3",
                    ref_transcript: "ref-audio/dipper.txt",
                },
                NarratorProfile {
                    name: "David Attenborough",
                    description: "Renowned natural historian and broadcaster famous for his nature documentaries.",
                    personality: "Calm, wise, and deeply reverent toward nature; narrates with wonder, empathy, and quiet enthusiasm for the natural world",
                    expertise: &["Nature", "Biology", "Ecology", "Animals", "Environment"],
                    ref_audio: "ref-audio/attenborough.mp3",
                    ref_transcript: "ref-audio/attenborough.txt",
                },
                NarratorProfile {
                    name: "Stephen Hawking",
                    description: "Theoretical physicist known for his work on black holes and cosmology.",
                    personality: "Dry humor and cosmic curiosity, explains the mysteries of the universe with clarity, patience, and a touch of wit",
                    expertise: &["Cosmology", "Black Holes", "Space", "Quantum Physics", "Universe"],
                    ref_audio: "ref-audio/hawking.mp3",
                    ref_transcript: "ref-audio/hawking.txt",
                },
                NarratorProfile {
                    name: "Po",
                    description: "Po, the enthusiastic and food-loving panda who becomes the Dragon Warrior. Martial arts expert",
                    personality: "Goofy but determined, blends humor, humility, and bursts of kung fu wisdom; always believes anyone can be a hero",
                    expertise: &["Martial Arts", "Self-belief", "Perseverance", "Eastern Philosophy"],
                    ref_audio: "ref-audio/kungfupanda.mp3",
                    ref_transcript: "ref-audio/kungfupanda.txt",
                },
                NarratorProfile {
                    name: "Martin Luther",
                    description: "German theologian who initiated the Protestant Reformation. Activist.",
                    personality: "Passionate reformer with conviction and moral fire, speaks boldly about truth, faith, and challenging authority",
                    expertise: &["Theology", "History", "Social Justice", "Reform", "Ethics"],
                    ref_audio: "ref-audio/martinluther.mp3",
                    ref_transcript: "ref-audio/martinluther.txt",
                },
                NarratorProfile {
                    name: "Oppenheimer",
                    description: "Theoretical physicist often called the \"father of the atomic bomb.\"",
                    personality: "Intense and introspective visionary, balances scientific brilliance with moral reflection and haunting eloquence",
                    expertise: &["Nuclear Physics", "Ethics", "History", "Science", "Philosophy"],
                    ref_audio: "ref-audio/oppenheimer.mp3",
                    ref_transcript: "ref-audio/oppenheimer.txt",
                },
                NarratorProfile {
                    name: "SpongeBob SquarePants",
                    description: "Optimistic and energetic sea sponge who lives in a pineapple under the sea.",
                    personality: "Boundless enthusiasm and childlike wonder; turns every task into a fun adventure with positivity and laughter",
                    expertise: &["Fun Learning", "Creativity", "Friendship", "Ocean Life", "Comedy"],
                    ref_audio: "ref-audio/spongebob.mp3",
                    ref_transcript: "ref-audio/spongebob.txt",
                },
                NarratorProfile {
                    name: "Cher",
                    description: "Legendary American singer, actress, and cultural icon celebrated for her powerful contralto voice, fearless style, and lasting influence on pop music and fashion.",
                    personality: "Mature, confident, and self-assured; speaks with poise and a touch of dry humor, carrying the presence of someone who's seen it all and owns every moment.",
                    expertise: &["Music", "Fashion", "Pop Culture", "Entertainment", "Style"],
                    ref_audio: "ref-audio/cher.mp3",
                    ref_transcript: "ref-audio/cher.txt",
                },
            ],
        }
    }

    pub fn profiles(&self) -> &[NarratorProfile] {
        &self.profiles
    }

    pub fn default_profile(&self) -> &NarratorProfile {
        self.profiles
            .iter()
            .find(|p| p.name == DEFAULT_NARRATOR)
            .unwrap_or(&self.profiles[0])
    }

    /// Resolves a model-suggested name to a profile. Total: a profile is
    /// always returned. Match order is exact (case-insensitive), then
    /// registry-name-contains-requested, then requested-contains-registry-name,
    /// then the fixed default persona.
    pub fn resolve(&self, requested: &str) -> &NarratorProfile {
        let wanted = requested.trim().to_lowercase();

        let matched = self
            .profiles
            .iter()
            .find(|p| p.name.to_lowercase() == wanted)
            .or_else(|| {
                self.profiles
                    .iter()
                    .find(|p| !wanted.is_empty() && p.name.to_lowercase().contains(&wanted))
            })
            .or_else(|| {
                self.profiles
                    .iter()
                    .find(|p| wanted.contains(&p.name.to_lowercase()))
            });

        match matched {
            Some(p) => {
                info!("Narrator \"{}\" resolved to \"{}\"", requested, p.name);
                p
            }
            None => {
                let fallback = self.default_profile();
                warn!(
                    "Narrator \"{}\" not found, falling back to {}",
                    requested, fallback.name
                );
                fallback
            }
        }
    }

    /// Resolves each name in a speaker list independently. Output order
    /// mirrors input order: position is the speaker channel index.
    pub fn resolve_all(&self, requested: &[String]) -> Vec<&NarratorProfile> {
        requested.iter().map(|name| self.resolve(name)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match_is_stable() {
        let registry = NarratorRegistry::builtin();
        for profile in registry.profiles() {
            assert_eq!(registry.resolve(profile.name).name, profile.name);
        }
    }

    #[test]
    fn test_exact_match_ignores_case() {
        let registry = NarratorRegistry::builtin();
        assert_eq!(registry.resolve("stephen hawking").name, "Stephen Hawking");
        assert_eq!(registry.resolve("SPONGEBOB SQUAREPANTS").name, "SpongeBob SquarePants");
    }

    #[test]
    fn test_partial_name_matches_before_fallback() {
        let registry = NarratorRegistry::builtin();
        assert_eq!(registry.resolve("einstein").name, "Albert Einstein");
        assert_eq!(registry.resolve("Attenborough").name, "David Attenborough");
    }

    #[test]
    fn test_requested_containing_registry_name_matches() {
        let registry = NarratorRegistry::builtin();
        assert_eq!(registry.resolve("Professor Stephen Hawking").name, "Stephen Hawking");
    }

    #[test]
    fn test_unknown_name_falls_back_to_default() {
        let registry = NarratorRegistry::builtin();
        assert_eq!(registry.resolve("Xavier Nonexistent").name, "David Attenborough");
    }

    #[test]
    fn test_resolution_is_total() {
        let registry = NarratorRegistry::builtin();
        for input in ["", "   ", "42", "\u{1F600}", "a]["] {
            // Must never panic and always yield some profile.
            let _ = registry.resolve(input);
        }
    }

    #[test]
    fn test_exact_wins_over_substring() {
        let registry = NarratorRegistry::builtin();
        // "Po" is both an exact name and a substring of other inputs; the
        // exact pass must claim it first.
        assert_eq!(registry.resolve("po").name, "Po");
    }

    #[test]
    fn test_list_resolution_preserves_order() {
        let registry = NarratorRegistry::builtin();
        let resolved = registry.resolve_all(&[
            "Cher".to_string(),
            "einstein".to_string(),
            "nobody at all".to_string(),
        ]);
        let names: Vec<&str> = resolved.iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["Cher", "Albert Einstein", "David Attenborough"]);
    }
}
