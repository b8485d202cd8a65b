//! Duration-targeted episode segmentation.
//!
//! Episodes are cut only at narrative break markers (scene dividers, chapter
//! headings, triple line breaks), never mid-section, so an episode can run
//! past its target when a single section is long.

use std::fmt;

use serde::Serialize;

use crate::core::tts::VoiceConfig;
use crate::core::tts::provider::BASE_WORDS_PER_MINUTE;

/// Markers that separate narrative sections. Removed from episode text.
pub const BREAK_MARKERS: &[&str] = &["---", "***", "Chapter ", "CHAPTER ", "\n\n\n"];

/// Separator placed between sections joined into one episode.
const SECTION_SEPARATOR: &str = "\n\n";

/// Why an episode ended where it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BreakType {
    /// Closed because the next section would overrun the target
    Natural,
    /// Last episode of the text, whatever its length
    Final,
}

impl BreakType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Natural => "natural",
            Self::Final => "final",
        }
    }
}

impl fmt::Display for BreakType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpisodeSegment {
    pub text: String,
    pub estimated_duration_minutes: f64,
    pub break_type: BreakType,
    /// 1-based position
    pub sequence_number: usize,
    pub word_count: usize,
}

/// Splits narration into episodes of roughly a target spoken duration.
#[derive(Debug, Clone, Copy)]
pub struct EpisodeSegmenter {
    words_per_minute: f64,
}

impl Default for EpisodeSegmenter {
    fn default() -> Self {
        Self {
            words_per_minute: BASE_WORDS_PER_MINUTE,
        }
    }
}

impl EpisodeSegmenter {
    /// `words_per_minute` is the pace at speed 1.0; zero falls back to the default pace.
    pub fn new(words_per_minute: u32) -> Self {
        if words_per_minute == 0 {
            return Self::default();
        }
        Self {
            words_per_minute: words_per_minute as f64,
        }
    }

    pub fn words_per_minute(&self) -> f64 {
        self.words_per_minute
    }

    pub fn split_into_episodes(
        &self,
        text: &str,
        target_duration_minutes: f64,
        voice_config: &VoiceConfig,
    ) -> Vec<EpisodeSegment> {
        let speed = if voice_config.speed > 0.0 {
            voice_config.speed as f64
        } else {
            1.0
        };
        let wpm = self.words_per_minute * speed;
        let target_words = (target_duration_minutes.max(0.0) * wpm).floor() as usize;

        let mut episodes = Vec::new();
        let mut current = String::new();
        let mut current_words = 0usize;

        for section in split_sections(text) {
            let section_words = section.split_whitespace().count();

            if !current.is_empty() && current_words + section_words > target_words {
                episodes.push(EpisodeSegment {
                    text: std::mem::take(&mut current),
                    estimated_duration_minutes: current_words as f64 / wpm,
                    break_type: BreakType::Natural,
                    sequence_number: episodes.len() + 1,
                    word_count: current_words,
                });
                current_words = 0;
            }

            if !current.is_empty() {
                current.push_str(SECTION_SEPARATOR);
            }
            current.push_str(section);
            current_words += section_words;
        }

        if !current.is_empty() {
            episodes.push(EpisodeSegment {
                text: current,
                estimated_duration_minutes: current_words as f64 / wpm,
                break_type: BreakType::Final,
                sequence_number: episodes.len() + 1,
                word_count: current_words,
            });
        }

        episodes
    }
}

/// Non-empty trimmed sections between break markers, in order.
fn split_sections(text: &str) -> Vec<&str> {
    let mut sections = vec![text];
    for marker in BREAK_MARKERS {
        sections = sections
            .into_iter()
            .flat_map(|s| s.split(marker))
            .collect();
    }
    sections
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tts::ProviderKind;

    fn voice() -> VoiceConfig {
        VoiceConfig::new(ProviderKind::Google, "en-US-Neural2-J")
    }

    fn section(word: &str, n: usize) -> String {
        vec![word; n].join(" ")
    }

    #[test]
    fn test_split_sections() {
        let text = "Intro.\n---\nScene two.\n***\nChapter 3 begins.\n\n\n\nEnd.";
        assert_eq!(
            split_sections(text),
            vec!["Intro.", "Scene two.", "3 begins.", "End."]
        );
    }

    #[test]
    fn test_three_sections_of_600_words() {
        let text = format!(
            "{}\n\n---\n\n{}\n\n---\n\n{}",
            section("alpha", 600),
            section("beta", 600),
            section("gamma", 600)
        );
        let episodes = EpisodeSegmenter::default().split_into_episodes(&text, 5.0, &voice());

        assert_eq!(episodes.len(), 3);
        assert_eq!(
            episodes.iter().map(|e| e.break_type).collect::<Vec<_>>(),
            vec![BreakType::Natural, BreakType::Natural, BreakType::Final]
        );
        assert_eq!(
            episodes.iter().map(|e| e.sequence_number).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert!(episodes.iter().all(|e| e.word_count == 600));
        assert!((episodes[0].estimated_duration_minutes - 4.0).abs() < 1e-9);
        assert!(episodes[1].text.starts_with("beta"));
    }

    #[test]
    fn test_sections_accumulate_until_target() {
        // 4 x 300 words at 750 words per episode: 600 fits, 900 does not
        let text = (0..4)
            .map(|_| section("word", 300))
            .collect::<Vec<_>>()
            .join("\n***\n");
        let episodes = EpisodeSegmenter::default().split_into_episodes(&text, 5.0, &voice());

        assert_eq!(episodes.len(), 2);
        assert_eq!(episodes[0].word_count, 600);
        assert_eq!(episodes[0].break_type, BreakType::Natural);
        assert_eq!(episodes[1].word_count, 600);
        assert_eq!(episodes[1].break_type, BreakType::Final);
    }

    #[test]
    fn test_exact_target_is_not_exceeded() {
        let text = format!("{}\n---\n{}", section("a", 375), section("b", 375));
        let episodes = EpisodeSegmenter::default().split_into_episodes(&text, 5.0, &voice());
        assert_eq!(episodes.len(), 1);
        assert_eq!(episodes[0].word_count, 750);
    }

    #[test]
    fn test_short_text_is_single_final_episode() {
        let episodes =
            EpisodeSegmenter::default().split_into_episodes("Once upon a time.", 10.0, &voice());
        assert_eq!(episodes.len(), 1);
        assert_eq!(episodes[0].break_type, BreakType::Final);
        assert_eq!(episodes[0].text, "Once upon a time.");
    }

    #[test]
    fn test_empty_text() {
        assert!(
            EpisodeSegmenter::default()
                .split_into_episodes("  \n---\n ", 5.0, &voice())
                .is_empty()
        );
    }

    #[test]
    fn test_speed_scales_pace() {
        let text = format!("{}\n---\n{}", section("a", 600), section("b", 600));
        let mut fast = voice();
        fast.speed = 2.0;

        // 300 wpm: target is 1500 words, both sections fit
        let episodes = EpisodeSegmenter::default().split_into_episodes(&text, 5.0, &fast);
        assert_eq!(episodes.len(), 1);
        assert!((episodes[0].estimated_duration_minutes - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_text_preserved_modulo_markers() {
        let text = "First part.\n\n---\n\nSecond part.";
        let episodes = EpisodeSegmenter::new(150).split_into_episodes(text, 0.0, &voice());
        let joined: Vec<&str> = episodes.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(joined, vec!["First part.", "Second part."]);
    }
}
