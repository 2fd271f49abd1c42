use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use serde_json::Value;

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Blocking client for the Gemini generateContent endpoint.
pub struct GeminiClient {
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// One synchronous prompt → reply-text round trip.
    pub fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{BASE_URL}/{}:generateContent", self.model);
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
        };

        let response = ureq::post(&url)
            .query("key", &self.api_key)
            .send_json(&request);

        let payload: Value = match response {
            Ok(resp) => resp
                .into_json()
                .context("Gemini returned a non-JSON response body")?,
            Err(ureq::Error::Status(401 | 403, _)) => {
                return Err(anyhow!(
                    "Gemini authentication failed. Check GOOGLE_API_KEY"
                ));
            }
            Err(ureq::Error::Status(code, resp)) => {
                let body = resp.into_string().unwrap_or_default();
                return Err(anyhow!("Gemini API returned {code}: {body}"));
            }
            Err(err) => {
                return Err(anyhow!("could not reach the Gemini API: {err}"));
            }
        };

        extract_reply_text(&payload)
            .ok_or_else(|| anyhow!("Gemini response contained no text candidates: {payload}"))
    }
}

/// Pull the reply text out of a generateContent payload.
///
/// Concatenates every text part of the first candidate, which is how the
/// SDKs expose `response.text`. Returns `None` when the payload has no
/// usable candidate (safety block, empty response, error body).
pub fn extract_reply_text(payload: &Value) -> Option<String> {
    let parts = payload
        .get("candidates")?
        .as_array()?
        .first()?
        .get("content")?
        .get("parts")?
        .as_array()?;

    let mut text = String::new();
    for part in parts {
        if let Some(t) = part.get("text").and_then(Value::as_str) {
            text.push_str(t);
        }
    }
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
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
