use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::Deserialize;
use serde_json::json;

use crate::error::{AppError, AppResult};

/// Most titles included in one prompt
const MAX_PROMPT_TITLES: usize = 20;

/// Source of free-text viewing recommendations
#[async_trait]
pub trait Recommender: Send + Sync {
    /// Suggests what to watch next given titles the user already picked
    async fn recommend(&self, titles: &[String], mood: Option<&str>) -> AppResult<String>;

    fn name(&self) -> &'static str;
}

/// Builds the recommendation prompt sent to the model
pub fn build_prompt(titles: &[String], mood: Option<&str>) -> String {
    let listed: Vec<&str> = titles
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .take(MAX_PROMPT_TITLES)
        .collect();

    let mut prompt = format!(
        "I have these movies and TV shows on my watchlist: {}.\n",
        listed.join(", ")
    );

    if let Some(mood) = mood.map(str::trim).filter(|m| !m.is_empty()) {
        prompt.push_str(&format!("Right now I am in the mood for: {}.\n", mood));
    }

    prompt.push_str(
        "Recommend 5 other movies or TV shows I would enjoy. \
         For each, give the title, the release year and one sentence on why it fits. \
         Do not repeat titles from my watchlist.",
    );
    prompt
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Text of the first candidate, parts concatenated
    fn into_text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

/// Gemini `generateContent` client
#[derive(Clone)]
pub struct GeminiClient {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(http_client: HttpClient, api_key: String, api_url: String, model: String) -> Self {
        Self {
            http_client,
            api_key,
            api_url,
            model,
        }
    }
}

#[async_trait]
impl Recommender for GeminiClient {
    async fn recommend(&self, titles: &[String], mood: Option<&str>) -> AppResult<String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_url.trim_end_matches('/'),
            self.model
        );
        let body = json!({
            "contents": [{ "parts": [{ "text": build_prompt(titles, mood) }] }]
        });

        let response = self
            .http_client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Gemini API returned status {}: {}",
                status, body
            )));
        }

        let generated: GenerateContentResponse = response.json().await?;
        generated
            .into_text()
            .ok_or_else(|| AppError::ExternalApi("Gemini returned no text candidates".to_string()))
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titles(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_prompt_lists_titles() {
        let prompt = build_prompt(&titles(&["Fight Club", "The Matrix"]), None);
        assert!(prompt.contains("Fight Club, The Matrix"));
        assert!(!prompt.contains("mood"));
    }

    #[test]
    fn test_prompt_includes_mood() {
        let prompt = build_prompt(&titles(&["Fight Club"]), Some(" something light "));
        assert!(prompt.contains("in the mood for: something light."));
    }

    #[test]
    fn test_prompt_skips_blank_titles_and_caps_length() {
        let mut many: Vec<String> = (0..30).map(|i| format!("Title {}", i)).collect();
        many.insert(0, "   ".to_string());

        let prompt = build_prompt(&many, Some(""));
        assert!(prompt.contains("Title 19"));
        assert!(!prompt.contains("Title 20"));
        assert!(!prompt.contains(":  ,"));
    }

    #[test]
    fn test_response_text_concatenates_parts() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "1. Se7en" }, { "text": "\n2. Zodiac" }] }
            }]
        }))
        .unwrap();

        assert_eq!(response.into_text().as_deref(), Some("1. Se7en\n2. Zodiac"));
    }

    #[test]
    fn test_response_without_candidates_has_no_text() {
        let response: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(response.into_text(), None);
    }

    #[tokio::test]
    async fn test_unreachable_upstream_error_omits_api_key() {
        let client = GeminiClient::new(
            HttpClient::new(),
            "SECRET123".to_string(),
            "http://127.0.0.1:1".to_string(),
            "gemini-1.5-flash".to_string(),
        );

        let err = client
            .recommend(&titles(&["Fight Club"]), None)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::HttpClient(_)));
        assert!(!err.to_string().contains("SECRET123"));
    }
}
