use crate::error::{KarloError, Result};
use crate::models::status::Operation;

/// What a generation call starts from. Exactly one of the two exists per
/// request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationInput {
    Prompt(String),
    SourceImage(String),
}

impl GenerationInput {
    pub fn as_str(&self) -> &str {
        match self {
            GenerationInput::Prompt(text) => text,
            GenerationInput::SourceImage(path) => path,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub input: GenerationInput,
    pub output_prefix: String,
    pub credential: String,
    /// 0 leaves the count to the backend.
    pub batch_size: u32,
}

impl GenerationRequest {
    pub fn image(
        prompt: impl Into<String>,
        output_prefix: impl Into<String>,
        credential: impl Into<String>,
        batch_size: u32,
    ) -> Self {
        Self {
            input: GenerationInput::Prompt(prompt.into()),
            output_prefix: output_prefix.into(),
            credential: credential.into(),
            batch_size,
        }
    }

    pub fn variations(
        source_image_path: impl Into<String>,
        output_prefix: impl Into<String>,
        credential: impl Into<String>,
        batch_size: u32,
    ) -> Self {
        Self {
            input: GenerationInput::SourceImage(source_image_path.into()),
            output_prefix: output_prefix.into(),
            credential: credential.into(),
            batch_size,
        }
    }

    pub fn operation(&self) -> Operation {
        match self.input {
            GenerationInput::Prompt(_) => Operation::ImageGeneration,
            GenerationInput::SourceImage(_) => Operation::VariationsGeneration,
        }
    }

    /// Rejects blank fields. Nothing is trimmed or rewritten.
    pub fn validate(&self) -> Result<()> {
        let input_name = match self.input {
            GenerationInput::Prompt(_) => "prompt",
            GenerationInput::SourceImage(_) => "source image path",
        };
        if self.input.as_str().trim().is_empty() {
            return Err(KarloError::InvalidRequest(format!(
                "{} must not be empty",
                input_name
            )));
        }
        if self.output_prefix.trim().is_empty() {
            return Err(KarloError::InvalidRequest(
                "output prefix must not be empty".into(),
            ));
        }
        if self.credential.trim().is_empty() {
            return Err(KarloError::InvalidRequest(
                "credential must not be empty".into(),
            ));
        }
        Ok(())
    }
}
