use serde::{Deserialize, Serialize};

/// Body of a Karlo `t2i` or `variations` call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KarloRequest {
    pub prompt: KarloPrompt,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KarloPrompt {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Base64-encoded PNG.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub batch_size: u32,
}

impl KarloRequest {
    pub fn text(text: impl Into<String>, batch_size: u32) -> Self {
        Self {
            prompt: KarloPrompt {
                text: Some(text.into()),
                image: None,
                batch_size,
            },
        }
    }

    pub fn image(image_base64: impl Into<String>, batch_size: u32) -> Self {
        Self {
            prompt: KarloPrompt {
                text: None,
                image: Some(image_base64.into()),
                batch_size,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KarloResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub model_version: Option<String>,
    #[serde(default)]
    pub images: Vec<KarloImage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KarloImage {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub seed: Option<u64>,
    pub image: String,
    #[serde(default)]
    pub nsfw_content_detected: Option<bool>,
    #[serde(default)]
    pub nsfw_score: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KarloErrorBody {
    #[serde(default)]
    pub msg: Option<String>,
}
