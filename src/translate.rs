use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

use crate::config::Config;

static HTTP_CLIENT: OnceLock<reqwest::Client> = OnceLock::new();

fn get_client() -> &'static reqwest::Client {
    HTTP_CLIENT.get_or_init(|| {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(2)
            .build()
            .expect("Failed to create HTTP client")
    })
}

#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("blocked by safety filter: {0}")]
    Blocked(String),

    #[error("empty response from model")]
    Empty,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
    safety_settings: Vec<SafetySetting>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    top_p: f64,
    max_output_tokens: u32,
}

#[derive(Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

fn generation_config() -> GenerationConfig {
    GenerationConfig {
        temperature: 0.5,
        top_p: 0.8,
        max_output_tokens: 1024,
    }
}

fn safety_settings() -> Vec<SafetySetting> {
    vec![
        SafetySetting {
            category: "HARM_CATEGORY_HATE_SPEECH",
            threshold: "BLOCK_LOW_AND_ABOVE",
        },
        SafetySetting {
            category: "HARM_CATEGORY_DANGEROUS_CONTENT",
            threshold: "BLOCK_LOW_AND_ABOVE",
        },
    ]
}

fn build_request(text: &str) -> GenerateContentRequest<'_> {
    GenerateContentRequest {
        contents: vec![Content {
            role: "user",
            parts: vec![Part { text }],
        }],
        generation_config: generation_config(),
        safety_settings: safety_settings(),
    }
}

// A bare endpoint id is expanded to its full resource path.
fn endpoint_url(config: &Config) -> String {
    let endpoint = if config.model_endpoint.contains('/') {
        config.model_endpoint.clone()
    } else {
        format!(
            "projects/{}/locations/{}/endpoints/{}",
            config.project_id, config.location, config.model_endpoint
        )
    };
    format!(
        "https://{}-aiplatform.googleapis.com/v1/{}:generateContent",
        config.location, endpoint
    )
}

/// Send one text to the fine-tuned model and wait for the full translation.
pub async fn translate_text(config: &Config, text: &str) -> Result<String, TranslateError> {
    let request = build_request(text);

    let response = get_client()
        .post(endpoint_url(config))
        .header("Authorization", format!("Bearer {}", config.access_token))
        .json(&request)
        .send()
        .await?;

    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(TranslateError::Api { status, body });
    }

    let parsed: GenerateContentResponse = serde_json::from_str(&body)?;
    extract_text(parsed)
}

fn extract_text(response: GenerateContentResponse) -> Result<String, TranslateError> {
    if let Some(feedback) = response.prompt_feedback {
        if let Some(reason) = feedback.block_reason {
            return Err(TranslateError::Blocked(reason));
        }
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or(TranslateError::Empty)?;

    let text: String = candidate
        .content
        .map(|c| c.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|p| p.text)
        .collect();

    if text.is_empty() {
        if let Some(reason) = candidate.finish_reason {
            if reason != "STOP" {
                return Err(TranslateError::Blocked(reason));
            }
        }
        return Err(TranslateError::Empty);
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            project_id: "demo-project".to_string(),
            location: "us-central1".to_string(),
            model_endpoint: "1234567890".to_string(),
            access_token: "token".to_string(),
        }
    }

    #[test]
    fn generation_config_is_fixed() {
        let value = serde_json::to_value(build_request("hello")).unwrap();

        assert_eq!(value["generationConfig"]["temperature"], 0.5);
        assert_eq!(value["generationConfig"]["topP"], 0.8);
        assert_eq!(value["generationConfig"]["maxOutputTokens"], 1024);
    }

    #[test]
    fn safety_settings_block_low_and_above() {
        let value = serde_json::to_value(build_request("hello")).unwrap();
        let settings = value["safetySettings"].as_array().unwrap();

        assert_eq!(settings.len(), 2);
        assert_eq!(settings[0]["category"], "HARM_CATEGORY_HATE_SPEECH");
        assert_eq!(settings[0]["threshold"], "BLOCK_LOW_AND_ABOVE");
        assert_eq!(settings[1]["category"], "HARM_CATEGORY_DANGEROUS_CONTENT");
        assert_eq!(settings[1]["threshold"], "BLOCK_LOW_AND_ABOVE");
    }

    #[test]
    fn request_wraps_text_as_single_user_turn() {
        let value = serde_json::to_value(build_request("bonjour")).unwrap();
        let contents = value["contents"].as_array().unwrap();

        assert_eq!(contents.len(), 1);
        assert_eq!(contents[0]["role"], "user");
        assert_eq!(contents[0]["parts"].as_array().unwrap().len(), 1);
        assert_eq!(contents[0]["parts"][0]["text"], "bonjour");
    }

    #[test]
    fn bare_endpoint_id_is_qualified() {
        assert_eq!(
            endpoint_url(&test_config()),
            "https://us-central1-aiplatform.googleapis.com/v1/projects/demo-project/locations/us-central1/endpoints/1234567890:generateContent"
        );
    }

    #[test]
    fn qualified_endpoint_is_used_as_is() {
        let mut config = test_config();
        config.model_endpoint = "projects/other/locations/us-central1/endpoints/42".to_string();

        assert_eq!(
            endpoint_url(&config),
            "https://us-central1-aiplatform.googleapis.com/v1/projects/other/locations/us-central1/endpoints/42:generateContent"
        );
    }

    #[test]
    fn extracts_candidate_text() {
        let body = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Bonjour"}]},"finishReason":"STOP"}]}"#;
        let parsed: GenerateContentResponse = serde_json::from_str(body).unwrap();

        assert_eq!(extract_text(parsed).unwrap(), "Bonjour");
    }

    #[test]
    fn joins_multiple_parts() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"Bon"},{"text":"jour"}]}}]}"#;
        let parsed: GenerateContentResponse = serde_json::from_str(body).unwrap();

        assert_eq!(extract_text(parsed).unwrap(), "Bonjour");
    }

    #[test]
    fn blocked_prompt_is_an_error() {
        let body = r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#;
        let parsed: GenerateContentResponse = serde_json::from_str(body).unwrap();

        match extract_text(parsed) {
            Err(TranslateError::Blocked(reason)) => assert_eq!(reason, "SAFETY"),
            other => panic!("expected safety block, got {:?}", other),
        }
    }

    #[test]
    fn safety_stopped_candidate_is_an_error() {
        let body = r#"{"candidates":[{"finishReason":"SAFETY"}]}"#;
        let parsed: GenerateContentResponse = serde_json::from_str(body).unwrap();

        assert!(matches!(
            extract_text(parsed),
            Err(TranslateError::Blocked(_))
        ));
    }

    #[test]
    fn empty_body_is_an_error() {
        let parsed: GenerateContentResponse = serde_json::from_str("{}").unwrap();

        assert!(matches!(extract_text(parsed), Err(TranslateError::Empty)));
    }
}
