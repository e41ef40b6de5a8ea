use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD, Engine};
use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};

use crate::config::{FRAME_INSTRUCTION, GEMINI_ENDPOINT, SYSTEM_PROMPT};
use crate::errors::{Result, UpscaleError};
use crate::traits::{FrameTransformer, TransformOutcome};

/// Client for the Gemini `generateContent` image API.
///
/// Holds the immutable per-run configuration (model, temperature, system
/// instruction). One invocation of [`FrameTransformer::transform`] performs
/// exactly one remote call; all batch behaviour lives in the orchestrator.
pub struct GeminiClient {
    http: reqwest::blocking::Client,
    api_key: String,
    model: String,
    temperature: f32,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, temperature: f32) -> Self {
        Self {
            http: reqwest::blocking::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            temperature,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    fn request_body(&self, image_base64: String) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part {
                        text: None,
                        inline_data: Some(InlineData {
                            mime_type: "image/png".to_string(),
                            data: image_base64,
                        }),
                    },
                    Part {
                        text: Some(FRAME_INSTRUCTION.to_string()),
                        inline_data: None,
                    },
                ],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
                response_modalities: vec!["IMAGE".to_string()],
            },
            system_instruction: Content {
                parts: vec![Part {
                    text: Some(SYSTEM_PROMPT.to_string()),
                    inline_data: None,
                }],
            },
        }
    }
}

impl FrameTransformer for GeminiClient {
    fn transform(&self, image: &DynamicImage) -> Result<TransformOutcome> {
        let mut encoded = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut encoded), ImageFormat::Png)
            .map_err(|e| UpscaleError::ImageProcessing {
                path: "in-memory frame".to_string(),
                operation: "PNG encoding".to_string(),
                source: Box::new(e),
            })?;

        let url = format!("{GEMINI_ENDPOINT}/{}:generateContent", self.model);
        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&self.request_body(STANDARD.encode(&encoded)))
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().unwrap_or_else(|_| status.to_string());
            return Err(UpscaleError::Api {
                message,
                status: Some(status.as_u16()),
            });
        }

        let parsed: GenerateContentResponse = response.json()?;
        match first_inline_payload(&parsed) {
            Some(data) => {
                let bytes = STANDARD.decode(data).map_err(|e| UpscaleError::Api {
                    message: format!("inline payload is not valid base64: {e}"),
                    status: None,
                })?;
                let upscaled =
                    image::load_from_memory(&bytes).map_err(|e| UpscaleError::ImageProcessing {
                        path: "inline payload".to_string(),
                        operation: "response image decoding".to_string(),
                        source: Box::new(e),
                    })?;
                Ok(TransformOutcome::Produced(upscaled))
            }
            None => Ok(TransformOutcome::Empty),
        }
    }
}

/// The first inline image payload of the response, in candidate and part
/// order. Later payloads are discarded.
fn first_inline_payload(response: &GenerateContentResponse) -> Option<&str> {
    response
        .candidates
        .iter()
        .filter_map(|candidate| candidate.content.as_ref())
        .flat_map(|content| content.parts.iter())
        .find_map(|part| part.inline_data.as_ref())
        .map(|inline| inline.data.as_str())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
    system_instruction: Content,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    response_modalities: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}
