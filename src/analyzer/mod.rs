//! Asks the local LLM for viral segments and recovers a validated JSON record.

mod json_recovery;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::AnalyzerPrompt;
use crate::error::{PipelineError, Result};
use crate::segments::CandidateSegment;

/// Preflight "list models" timeout, independent of (and always ≤) the configured
/// test timeout.
const PREFLIGHT_TIMEOUT: Duration = Duration::from_secs(60);
const SLOW_BACKEND_THRESHOLD: Duration = Duration::from_secs(60);

/// Top-level keys recognised on recovery, tried in this order.
const SEGMENT_KEYS: [&str; 5] = [
    "most_relevant_segments",
    "segments",
    "clips",
    "relevant_segments",
    "top_segments",
];

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f64,
    top_p: f64,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[allow(dead_code)]
    models: Vec<Value>,
}

/// Raw, JSON-recovered analysis output before segment validation.
pub struct AnalyzerOutput {
    pub candidates: Vec<CandidateSegment>,
    pub summary: String,
    pub key_topics: Vec<String>,
}

/// Talks to a local Ollama-shaped LLM endpoint (`GET /api/tags`, `POST /api/generate`).
pub struct Analyzer {
    client: reqwest::Client,
    base_url: String,
    model: String,
    prompt: AnalyzerPrompt,
    test_timeout: Duration,
    analysis_timeout: Duration,
    max_retries: u32,
    retry_delay: Duration,
}

impl Analyzer {
    pub fn new(base_url: String, model: String) -> Self {
        Self::with_config(base_url, model, AnalyzerPrompt::default(), 300, 7200, 3, 300)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn with_config(
        base_url: String,
        model: String,
        prompt: AnalyzerPrompt,
        test_timeout_secs: u64,
        analysis_timeout_secs: u64,
        max_retries: u32,
        retry_delay_secs: u64,
    ) -> Self {
        Self {
            // No default timeout on the client itself: each request wraps its own
            // future in `tokio::time::timeout` so every retry gets a fresh timer.
            client: reqwest::Client::builder().build().unwrap_or_default(),
            base_url,
            model,
            prompt,
            test_timeout: Duration::from_secs(test_timeout_secs),
            analysis_timeout: Duration::from_secs(analysis_timeout_secs),
            max_retries,
            retry_delay: Duration::from_secs(retry_delay_secs),
        }
    }

    /// Verifies the endpoint is reachable, then issues a minimal generation request.
    /// Returns `LLMUnreachable` only if the endpoint cannot be contacted at all; a
    /// slow (but successful) test request just logs a warning.
    pub async fn preflight(&self) -> Result<()> {
        let tags_timeout = PREFLIGHT_TIMEOUT.min(self.test_timeout);
        let tags_url = format!("{}/api/tags", self.base_url);

        let tags = tokio::time::timeout(tags_timeout, self.client.get(&tags_url).send())
            .await
            .map_err(|_| PipelineError::LLMUnreachable(format!("{tags_url} timed out")))?
            .map_err(|e| PipelineError::LLMUnreachable(format!("{tags_url}: {e}")))?;

        if !tags.status().is_success() {
            return Err(PipelineError::LLMUnreachable(format!(
                "{tags_url} returned {}",
                tags.status()
            )));
        }
        let _: TagsResponse = tags
            .json()
            .await
            .map_err(|e| PipelineError::LLMUnreachable(format!("malformed /api/tags body: {e}")))?;

        let start = std::time::Instant::now();
        let request = GenerateRequest {
            model: &self.model,
            prompt: "Say 'Hi' and nothing else.".to_string(),
            stream: false,
            options: GenerateOptions { temperature: 0.1, top_p: 1.0, max_tokens: 5 },
        };

        let generate_url = format!("{}/api/generate", self.base_url);
        let response = tokio::time::timeout(
            self.test_timeout,
            self.client.post(&generate_url).json(&request).send(),
        )
        .await
        .map_err(|_| PipelineError::LLMUnreachable(format!("{generate_url} test request timed out")))?
        .map_err(|e| PipelineError::LLMUnreachable(format!("{generate_url}: {e}")))?;

        if !response.status().is_success() {
            return Err(PipelineError::LLMUnreachable(format!(
                "test generation returned {}",
                response.status()
            )));
        }

        if start.elapsed() > SLOW_BACKEND_THRESHOLD {
            warn!("LLM backend is slow: test request took {:?}", start.elapsed());
        }

        Ok(())
    }

    /// Sends the instruction prompt plus the transcript, retrying transient
    /// failures, then recovers and parses the JSON payload.
    pub async fn analyze(&self, transcript_lines: &str) -> Result<AnalyzerOutput> {
        let prompt = self.prompt.render(transcript_lines);
        let body = self.generate_with_retries(&prompt).await?;
        parse_response(&body)
    }

    async fn generate_with_retries(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            model: &self.model,
            prompt: prompt.to_string(),
            stream: false,
            options: GenerateOptions { temperature: 0.1, top_p: 0.9, max_tokens: 2048 },
        };
        let generate_url = format!("{}/api/generate", self.base_url);

        let mut attempt = 0;
        loop {
            attempt += 1;
            debug!("analysis attempt {attempt}/{}", self.max_retries + 1);

            match self.try_generate(&generate_url, &request).await {
                Ok(body) => return Ok(body),
                Err(retryable_err @ PipelineError::LLMTimeout(_)) if attempt <= self.max_retries => {
                    warn!("analysis attempt {attempt} failed, retrying in {:?}: {retryable_err}", self.retry_delay);
                    tokio::time::sleep(self.retry_delay).await;
                }
                // Non-retryable per SPEC_FULL.md §4.2: any 4xx other than 408/429 fails fast
                // as `LLMBadResponse` instead of burning through the retry budget.
                Err(err) => return Err(err),
            }
        }
    }

    async fn try_generate(&self, url: &str, request: &GenerateRequest<'_>) -> Result<String> {
        let send = self.client.post(url).json(request).send();
        let response = tokio::time::timeout(self.analysis_timeout, send)
            .await
            .map_err(|_| PipelineError::LLMTimeout(format!("{url} timed out after {:?}", self.analysis_timeout)))?
            .map_err(|e| PipelineError::LLMTimeout(format!("{url}: {e}")))?;

        let status = response.status();
        if status.as_u16() == 408 || status.as_u16() == 429 || status.is_server_error() {
            return Err(PipelineError::LLMTimeout(format!("{url} returned retryable status {status}")));
        }
        if !status.is_success() {
            return Err(PipelineError::LLMBadResponse(format!("{url} returned {status}")));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::LLMBadResponse(format!("malformed generate response: {e}")))?;

        if parsed.response.trim().is_empty() {
            return Err(PipelineError::LLMTimeout(format!("{url} returned an empty response body")));
        }

        Ok(parsed.response)
    }
}

fn parse_response(body: &str) -> Result<AnalyzerOutput> {
    let value = json_recovery::extract_json(body).ok_or_else(|| {
        warn!("could not recover JSON from LLM response, raw body follows:\n{body}");
        PipelineError::LLMBadResponse("no JSON object recoverable from response".to_string())
    })?;

    if let Some(error) = value.get("error").and_then(Value::as_str) {
        info!("LLM reported no qualifying segments: {error}");
    }

    let segments_value = SEGMENT_KEYS
        .iter()
        .find_map(|key| value.get(*key))
        .cloned()
        .unwrap_or_else(|| Value::Array(vec![]));

    let candidates: Vec<CandidateSegment> = serde_json::from_value(segments_value)
        .map_err(|e| PipelineError::LLMBadResponse(format!("malformed segment list: {e}")))?;

    let summary = value.get("summary").and_then(Value::as_str).unwrap_or("").to_string();
    let key_topics = value
        .get("key_topics")
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(|v| v.as_str().map(String::from)).collect())
        .unwrap_or_default();

    Ok(AnalyzerOutput { candidates, summary, key_topics })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_response_primary_key() {
        let body = r#"{
            "most_relevant_segments": [
                {"start_time": "00:00", "end_time": "00:45", "text": "hello world there", "relevance_score": 0.9, "reasoning": "r"}
            ],
            "summary": "a summary",
            "key_topics": ["a", "b"]
        }"#;
        let out = parse_response(body).unwrap();
        assert_eq!(out.candidates.len(), 1);
        assert_eq!(out.summary, "a summary");
        assert_eq!(out.key_topics, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_parse_response_alternate_key() {
        let body = r#"{"segments": [{"start_time": "00:00", "end_time": "00:30", "text": "one two three", "relevance_score": 0.8}]}"#;
        let out = parse_response(body).unwrap();
        assert_eq!(out.candidates.len(), 1);
    }

    #[test]
    fn test_parse_response_error_form_yields_empty_candidates() {
        let body = r#"{"most_relevant_segments": [], "error": "nothing found"}"#;
        let out = parse_response(body).unwrap();
        assert!(out.candidates.is_empty());
    }

    #[test]
    fn test_parse_response_unrecoverable_is_bad_response() {
        let body = "Sure, here you go:\n```\nnot-json\n```";
        assert!(matches!(parse_response(body), Err(PipelineError::LLMBadResponse(_))));
    }
}
