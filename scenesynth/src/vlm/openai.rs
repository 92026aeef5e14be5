//! OpenAI-compatible provider (works with OpenAI-style endpoints and
//! Gemini's OpenAI compatibility layer).

use crate::error::{ClassifierError, SynthError};
use crate::pddl;
use crate::vlm::prompts;
use crate::vlm::{ForegroundReading, ProblemContext, VlmProvider};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};

/// Gemini's OpenAI-compatibility endpoint, the default backend.
pub const GEMINI_OPENAI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";

/// Configuration for the OpenAI-compatible provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VlmProviderConfig {
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    /// Temperature for cell and object classification calls.
    pub classify_temperature: f64,
    /// Temperature for domain/objects/config generation calls.
    pub synthesis_temperature: f64,
    pub max_tokens: Option<u32>,
    pub timeout_seconds: Option<u64>,
}

impl Default for VlmProviderConfig {
    fn default() -> Self {
        VlmProviderConfig {
            model: "gemini-2.0-flash".to_string(),
            api_key: None,
            base_url: Some(GEMINI_OPENAI_BASE_URL.to_string()),
            classify_temperature: 0.2,
            synthesis_temperature: 1.0,
            max_tokens: None,
            timeout_seconds: Some(120),
        }
    }
}

/// Provider speaking the chat-completions protocol with image_url content
/// parts for cell samples.
pub struct OpenAIVlmProvider {
    config: VlmProviderConfig,
    client: reqwest::Client,
}

impl OpenAIVlmProvider {
    pub fn new(config: VlmProviderConfig) -> Result<Self, SynthError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(
                config.timeout_seconds.unwrap_or(120),
            ))
            .build()
            .map_err(|e| SynthError::Invalid(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    async fn make_request(
        &self,
        content: Vec<ContentPart>,
        temperature: f64,
        json_reply: bool,
    ) -> Result<String, ClassifierError> {
        let api_key = self.config.api_key.as_ref().ok_or_else(|| {
            ClassifierError::Malformed("API key required for OpenAI-compatible provider".to_string())
        })?;

        let base_url = self
            .config
            .base_url
            .as_deref()
            .unwrap_or("https://api.openai.com/v1");
        let url = format!("{}/chat/completions", base_url);

        let request_body = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content,
            }],
            max_tokens: self.config.max_tokens,
            temperature,
            response_format: json_reply.then(|| ResponseFormat {
                format_type: "json_object".to_string(),
            }),
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(|e| ClassifierError::Transient(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            ClassifierError::Transient(format!("Failed to read response body: {}", e))
        })?;

        // Server-side trouble and rate limiting are worth retrying; every
        // other non-success status means the request itself is wrong.
        if status.is_server_error() || status.as_u16() == 429 {
            return Err(ClassifierError::Transient(format!(
                "HTTP {}: {}",
                status.as_u16(),
                preview(&body)
            )));
        }
        if !status.is_success() {
            return Err(ClassifierError::Malformed(format!(
                "HTTP {}: {}",
                status.as_u16(),
                preview(&body)
            )));
        }

        let parsed: ChatResponse = serde_json::from_str(&body).map_err(|e| {
            ClassifierError::Malformed(format!(
                "Unexpected response shape: {} (body: {})",
                e,
                preview(&body)
            ))
        })?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ClassifierError::Malformed("Response carried no choices".to_string()))?;
        Ok(choice.message.content)
    }

    fn image_part(jpeg: &[u8]) -> ContentPart {
        let encoded = general_purpose::STANDARD.encode(jpeg);
        ContentPart::ImageUrl {
            image_url: ImageUrl {
                url: format!("data:image/jpeg;base64,{}", encoded),
            },
        }
    }
}

fn preview(body: &str) -> String {
    if body.chars().count() > 200 {
        let cut: String = body.chars().take(200).collect();
        format!("{}... [truncated, {} chars]", cut, body.chars().count())
    } else {
        body.to_string()
    }
}

#[async_trait]
impl VlmProvider for OpenAIVlmProvider {
    async fn classify_background(
        &self,
        jpeg: &[u8],
        ctx: &ProblemContext,
    ) -> Result<String, ClassifierError> {
        let content = vec![
            ContentPart::Text {
                text: prompts::cell_prompt(ctx),
            },
            Self::image_part(jpeg),
        ];
        let reply = self
            .make_request(content, self.config.classify_temperature, true)
            .await?;
        let parsed: CellTypeReading = serde_json::from_str(pddl::extract_json(&reply))
            .map_err(|e| {
                ClassifierError::Malformed(format!(
                    "Cell classification is not the expected json: {} (reply: {})",
                    e,
                    preview(&reply)
                ))
            })?;
        Ok(parsed.cell_type.trim().to_string())
    }

    async fn classify_foreground(
        &self,
        jpeg: &[u8],
        ctx: &ProblemContext,
    ) -> Result<ForegroundReading, ClassifierError> {
        let content = vec![
            ContentPart::Text {
                text: prompts::object_prompt(ctx),
            },
            Self::image_part(jpeg),
        ];
        let reply = self
            .make_request(content, self.config.classify_temperature, true)
            .await?;
        serde_json::from_str(pddl::extract_json(&reply)).map_err(|e| {
            ClassifierError::Malformed(format!(
                "Object classification is not the expected json: {} (reply: {})",
                e,
                preview(&reply)
            ))
        })
    }

    async fn generate_text(&self, prompt: &str) -> Result<String, ClassifierError> {
        let content = vec![ContentPart::Text {
            text: prompt.to_string(),
        }];
        self.make_request(content, self.config.synthesis_temperature, false)
            .await
    }

    async fn generate_json(&self, prompt: &str) -> Result<String, ClassifierError> {
        let content = vec![ContentPart::Text {
            text: prompt.to_string(),
        }];
        self.make_request(content, self.config.synthesis_temperature, true)
            .await
    }
}

// Chat-completions wire types
#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: Vec<ContentPart>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    content: String,
}

#[derive(Deserialize)]
struct CellTypeReading {
    cell_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization_with_image() {
        let request = ChatRequest {
            model: "m".to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: vec![
                    ContentPart::Text {
                        text: "hi".to_string(),
                    },
                    OpenAIVlmProvider::image_part(&[0xFF, 0xD8]),
                ],
            }],
            max_tokens: None,
            temperature: 0.2,
            response_format: Some(ResponseFormat {
                format_type: "json_object".to_string(),
            }),
        };
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["messages"][0]["content"][0]["type"], "text");
        assert_eq!(json["messages"][0]["content"][1]["type"], "image_url");
        let url = json["messages"][0]["content"][1]["image_url"]["url"]
            .as_str()
            .unwrap();
        assert!(url.starts_with("data:image/jpeg;base64,"));
        assert_eq!(json["response_format"]["type"], "json_object");
        // Absent options stay off the wire.
        assert!(json.get("max_tokens").is_none());
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{"choices": [{"message": {"role": "assistant", "content": "{\"cell_type\": \"grass\"}"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.choices[0].message.content, "{\"cell_type\": \"grass\"}");
    }

    #[test]
    fn test_foreground_reading_wire_names() {
        let reply = r#"{"object_name": ["box"], "object_pddl_str": "(= (xloc box) $i)"}"#;
        let reading: ForegroundReading = serde_json::from_str(reply).unwrap();
        assert_eq!(reading.object_names, vec!["box"]);
        assert_eq!(reading.fact_fragment, "(= (xloc box) $i)");
    }

    #[test]
    fn test_default_config_targets_gemini() {
        let config = VlmProviderConfig::default();
        assert_eq!(config.base_url.as_deref(), Some(GEMINI_OPENAI_BASE_URL));
        assert_eq!(config.classify_temperature, 0.2);
        assert_eq!(config.synthesis_temperature, 1.0);
    }
}
