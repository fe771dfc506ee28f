use crate::{
    backend::GenerationBackend,
    config::KarloConfig,
    error::{KarloError, Result},
    imaging,
    models::{KarloErrorBody, KarloRequest, KarloResponse, StatusCode},
};
use async_trait::async_trait;
use reqwest::Client;
use std::path::{Path, PathBuf};

/// Used when the caller passes 0.
pub const DEFAULT_BATCH_SIZE: u32 = 1;
pub const MAX_BATCH_SIZE: u32 = 8;

/// Talks to the Karlo inference API directly.
#[derive(Clone)]
pub struct KarloBackend {
    client: Client,
    base_url: String,
}

impl KarloBackend {
    pub fn new(config: &KarloConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        let base_url = config.base_url.trim_end_matches('/').to_string();
        log::debug!("Karlo backend configured for {}", base_url);

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Maps 0 to the default and rejects counts the API does not accept.
    pub fn effective_batch_size(batch_size: u32) -> Result<u32> {
        match batch_size {
            0 => Ok(DEFAULT_BATCH_SIZE),
            n if n <= MAX_BATCH_SIZE => Ok(n),
            n => Err(KarloError::InvalidRequest(format!(
                "batch size must be between 1 and {}, got {}",
                MAX_BATCH_SIZE, n
            ))),
        }
    }

    pub async fn text_to_image(
        &self,
        prompt: &str,
        batch_size: u32,
        api_key: &str,
    ) -> Result<KarloResponse> {
        let body = KarloRequest::text(prompt, Self::effective_batch_size(batch_size)?);
        log::info!("Generating image based on text...");
        self.infer("t2i", &body, api_key).await
    }

    pub async fn variations(
        &self,
        image_base64: &str,
        batch_size: u32,
        api_key: &str,
    ) -> Result<KarloResponse> {
        let body = KarloRequest::image(image_base64, Self::effective_batch_size(batch_size)?);
        log::info!("Generating variations...");
        self.infer("variations", &body, api_key).await
    }

    /// Generates from a prompt and writes `{output_prefix}_{n}.png`.
    pub async fn generate_image_files(
        &self,
        prompt: &str,
        output_prefix: &str,
        api_key: &str,
        batch_size: u32,
    ) -> Result<Vec<PathBuf>> {
        let response = self.text_to_image(prompt, batch_size, api_key).await?;
        save_images(&response, output_prefix)
    }

    /// Generates variations of the image at `input_path` and writes
    /// `{output_prefix}_{n}.png`.
    pub async fn generate_variation_files(
        &self,
        input_path: &str,
        output_prefix: &str,
        api_key: &str,
        batch_size: u32,
    ) -> Result<Vec<PathBuf>> {
        let image_base64 = imaging::load_png_base64(Path::new(input_path))?;
        let response = self.variations(&image_base64, batch_size, api_key).await?;
        save_images(&response, output_prefix)
    }

    async fn infer(
        &self,
        endpoint: &str,
        body: &KarloRequest,
        api_key: &str,
    ) -> Result<KarloResponse> {
        let url = format!("{}/{}", self.base_url, endpoint);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("KakaoAK {}", api_key))
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    KarloError::ExternalInvocation(format!("{} unreachable: {}", url, e))
                } else {
                    KarloError::Network(e)
                }
            })?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<KarloErrorBody>(&text)
                .ok()
                .and_then(|body| body.msg)
                .unwrap_or(text);
            return Err(match status.as_u16() {
                401 | 403 => KarloError::Auth(message),
                code => KarloError::Api {
                    status: code,
                    message,
                },
            });
        }

        let parsed: KarloResponse = serde_json::from_str(&text)?;
        if parsed.images.is_empty() {
            return Err(KarloError::Decode("response contained no images".into()));
        }
        log::debug!(
            "Karlo {} returned {} image(s), model version {}",
            endpoint,
            parsed.images.len(),
            parsed.model_version.as_deref().unwrap_or("unknown")
        );
        Ok(parsed)
    }
}

fn save_images(response: &KarloResponse, output_prefix: &str) -> Result<Vec<PathBuf>> {
    let mut saved = Vec::with_capacity(response.images.len());
    for (index, image) in response.images.iter().enumerate() {
        if image.nsfw_content_detected == Some(true) {
            log::warn!("Image {} was flagged as NSFW by the backend", index + 1);
        }
        let decoded = imaging::decode_base64_image(&image.image)?;
        let path = imaging::output_path(output_prefix, index + 1);
        imaging::save_png(&decoded, &path)?;
        log::info!("Generated image saved to {}", path.display());
        saved.push(path);
    }
    Ok(saved)
}

#[async_trait]
impl GenerationBackend for KarloBackend {
    async fn generate_image(
        &self,
        prompt: &str,
        output_prefix: &str,
        credential: &str,
        batch_size: u32,
    ) -> Result<StatusCode> {
        self.generate_image_files(prompt, output_prefix, credential, batch_size)
            .await
            .map(|_| StatusCode::SUCCESS)
    }

    async fn generate_variations(
        &self,
        source_image_path: &str,
        output_prefix: &str,
        credential: &str,
        batch_size: u32,
    ) -> Result<StatusCode> {
        self.generate_variation_files(source_image_path, output_prefix, credential, batch_size)
            .await
            .map(|_| StatusCode::SUCCESS)
    }

    fn name(&self) -> &'static str {
        "karlo-http"
    }
}
