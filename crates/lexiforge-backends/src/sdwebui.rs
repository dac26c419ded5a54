//! Stable Diffusion WebUI image generation client.
//!
//! `POST {base_url}/sdapi/v1/txt2img` with the prompt and the configured
//! batch size, dimensions, and step count. The response's `images` field is
//! a list of base64-encoded PNGs, decoded here into raw byte buffers in the
//! order the backend produced them. A response with the wrong image count
//! fails the call; the stage never silently under-delivers artifacts.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use lexiforge_core::{GenerationConfig, ImageGenerator, PipelineError, PipelineResult};

#[derive(Debug, Deserialize)]
struct Txt2ImgResponse {
    images: Vec<String>,
}

/// WebUI `txt2img` client implementing [`ImageGenerator`].
pub struct SdWebUiClient {
    client: Client,
    config: GenerationConfig,
}

impl SdWebUiClient {
    /// Build a client with the configured per-call timeout.
    pub fn new(config: &GenerationConfig) -> PipelineResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PipelineError::generation("sdwebui", e.to_string()))?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/sdapi/v1/txt2img",
            self.config.base_url.trim_end_matches('/')
        )
    }

    fn request_body(&self, prompt: &str) -> serde_json::Value {
        json!({
            "prompt": prompt,
            "batch_size": self.config.n_images,
            "width": self.config.width,
            "height": self.config.height,
            "steps": self.config.steps,
        })
    }

    /// Decode the base64 image list, enforcing the configured count.
    fn decode_images(&self, response: Txt2ImgResponse) -> PipelineResult<Vec<Vec<u8>>> {
        if response.images.len() != self.config.n_images {
            return Err(PipelineError::generation(
                "sdwebui",
                format!(
                    "expected {} images, backend returned {}",
                    self.config.n_images,
                    response.images.len()
                ),
            ));
        }
        let mut buffers = Vec::with_capacity(response.images.len());
        for (index, encoded) in response.images.iter().enumerate() {
            let bytes = BASE64.decode(encoded.as_bytes()).map_err(|e| {
                PipelineError::generation("sdwebui", format!("image {index}: {e}"))
            })?;
            buffers.push(bytes);
        }
        Ok(buffers)
    }
}

#[async_trait]
impl ImageGenerator for SdWebUiClient {
    async fn generate(&self, prompt: &str) -> PipelineResult<Vec<Vec<u8>>> {
        let response = self
            .client
            .post(self.endpoint())
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|e| PipelineError::generation("sdwebui", e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(PipelineError::generation(
                "sdwebui",
                format!("HTTP {status}: {detail}"),
            ));
        }

        let parsed: Txt2ImgResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::generation("sdwebui", e.to_string()))?;
        self.decode_images(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_with(n_images: usize) -> SdWebUiClient {
        SdWebUiClient::new(&GenerationConfig {
            n_images,
            ..GenerationConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_endpoint_shape() {
        let client = client_with(1);
        assert_eq!(client.endpoint(), "http://127.0.0.1:7860/sdapi/v1/txt2img");
    }

    #[test]
    fn test_request_body_carries_configured_shape() {
        let client = SdWebUiClient::new(&GenerationConfig {
            n_images: 2,
            width: 640,
            height: 480,
            steps: 25,
            ..GenerationConfig::default()
        })
        .unwrap();
        let body = client.request_body("a cat");
        assert_eq!(body["prompt"], "a cat");
        assert_eq!(body["batch_size"], 2);
        assert_eq!(body["width"], 640);
        assert_eq!(body["height"], 480);
        assert_eq!(body["steps"], 25);
    }

    #[test]
    fn test_decode_preserves_order() {
        let client = client_with(2);
        let response = Txt2ImgResponse {
            images: vec![BASE64.encode([1u8, 2]), BASE64.encode([3u8, 4])],
        };
        let buffers = client.decode_images(response).unwrap();
        assert_eq!(buffers, vec![vec![1, 2], vec![3, 4]]);
    }

    #[test]
    fn test_decode_rejects_wrong_count() {
        let client = client_with(4);
        let response = Txt2ImgResponse {
            images: vec![BASE64.encode([1u8])],
        };
        let err = client.decode_images(response).unwrap_err();
        assert!(err.to_string().contains("expected 4"));
    }

    #[test]
    fn test_decode_rejects_invalid_base64() {
        let client = client_with(1);
        let response = Txt2ImgResponse {
            images: vec!["not base64!!!".to_string()],
        };
        assert!(client.decode_images(response).is_err());
    }

    #[test]
    fn test_response_parsing_ignores_extra_fields() {
        let raw = r#"{"images": ["aGk="], "parameters": {}, "info": "{}"}"#;
        let parsed: Txt2ImgResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.images.len(), 1);
    }
}
