//! The Analyzer's instruction prompt template.

use serde::{Deserialize, Serialize};

/// The fixed instruction sent to the LLM, with one placeholder, `{transcript}`.
///
/// Mirrors the rendering idiom of the teacher's prompt templates (`{{var}}` string
/// substitution) but uses a single bare `{transcript}` placeholder since the Analyzer
/// prompt itself is not user-customisable the way chunking/RAG prompts were.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerPrompt {
    pub template: String,
}

impl Default for AnalyzerPrompt {
    fn default() -> Self {
        Self {
            template: DEFAULT_TEMPLATE.to_string(),
        }
    }
}

impl AnalyzerPrompt {
    /// Render the template against a formatted transcript line-sequence.
    pub fn render(&self, transcript: &str) -> String {
        self.template.replace("{transcript}", transcript)
    }
}

const DEFAULT_TEMPLATE: &str = r#"You are analyzing a video transcript to find the most engaging, motivational segments suitable for short vertical clips.

Transcript (each line is "[MM:SS - MM:SS] text"):
{transcript}

Select the 3 to 5 most "viral" or motivational segments. Each segment must:
- Be between 30 and 60 seconds long
- Contain a complete, self-contained thought
- Be genuinely compelling on its own, out of context

Respond with ONLY a JSON object, no commentary, matching this exact shape:
{
  "most_relevant_segments": [
    {
      "start_time": "MM:SS",
      "end_time": "MM:SS",
      "duration_seconds": <int>,
      "text": "...",
      "relevance_score": <float between 0.7 and 1.0>,
      "reasoning": "..."
    }
  ],
  "summary": "...",
  "key_topics": ["..."]
}

If nothing in the transcript qualifies, respond with:
{"most_relevant_segments": [], "error": "no qualifying segments"}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_substitutes_transcript() {
        let prompt = AnalyzerPrompt::default();
        let rendered = prompt.render("[00:00 - 00:05] hello world");
        assert!(rendered.contains("[00:00 - 00:05] hello world"));
        assert!(!rendered.contains("{transcript}"));
    }
}
