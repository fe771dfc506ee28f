use crate::error::{KarloError, Result};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.kakaobrain.com/v1/inference/karlo";
pub const DEFAULT_LIBRARY_PATH: &str = "libkarlo_php.so";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_OUTPUT_PREFIX: &str = "output";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Http,
    Native,
}

impl FromStr for BackendKind {
    type Err = KarloError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(BackendKind::Http),
            "native" => Ok(BackendKind::Native),
            other => Err(KarloError::Config(format!(
                "unknown backend '{}', expected 'http' or 'native'",
                other
            ))),
        }
    }
}

/// Where and how the external capability is reached.
#[derive(Debug, Clone)]
pub struct KarloConfig {
    pub backend: BackendKind,
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout_secs: u64,
    pub library_path: PathBuf,
}

impl Default for KarloConfig {
    fn default() -> Self {
        KarloConfig {
            backend: BackendKind::Http,
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            library_path: PathBuf::from(DEFAULT_LIBRARY_PATH),
        }
    }
}

impl KarloConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let backend = match env::var("KARLO_BACKEND") {
            Ok(value) => value.parse()?,
            Err(_) => defaults.backend,
        };
        let api_key = env::var("KARLO_API_KEY")
            .or_else(|_| env::var("API_KEY"))
            .ok()
            .filter(|key| !key.trim().is_empty());
        let base_url = env::var("KARLO_BASE_URL").unwrap_or(defaults.base_url);
        let timeout_secs = match env::var("KARLO_TIMEOUT_SECS") {
            Ok(value) => value.parse().map_err(|_| {
                KarloError::Config(format!("KARLO_TIMEOUT_SECS is not a number: {}", value))
            })?,
            Err(_) => defaults.timeout_secs,
        };
        let library_path = env::var("KARLO_LIBRARY_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.library_path);

        Ok(KarloConfig {
            backend,
            api_key,
            base_url,
            timeout_secs,
            library_path,
        })
    }

    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.library_path = path.into();
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or_else(|| {
            KarloError::Config("KARLO_API_KEY (or API_KEY) is not set".into())
        })
    }
}

/// Parameters of one image-then-variations run.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub prompt: String,
    pub output_prefix: String,
    pub source_image_path: String,
    pub variation_output_prefix: String,
    pub batch_size: u32,
}

impl SessionConfig {
    /// Source image and variation prefix are derived from `output_prefix`:
    /// the first generated image is fed back into the variations call.
    pub fn new(prompt: impl Into<String>, output_prefix: impl Into<String>) -> Self {
        let output_prefix = output_prefix.into();
        SessionConfig {
            prompt: prompt.into(),
            source_image_path: format!("{}_1.png", output_prefix),
            variation_output_prefix: format!("{}_variation", output_prefix),
            output_prefix,
            batch_size: 0,
        }
    }

    pub fn from_env() -> Result<Self> {
        let prompt = env::var("KARLO_PROMPT")
            .ok()
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| KarloError::Config("KARLO_PROMPT is not set".into()))?;
        let output_prefix =
            env::var("KARLO_OUTPUT_PREFIX").unwrap_or_else(|_| DEFAULT_OUTPUT_PREFIX.to_string());

        let mut config = SessionConfig::new(prompt, output_prefix);

        if let Ok(path) = env::var("KARLO_SOURCE_IMAGE") {
            config.source_image_path = path;
        }
        if let Ok(prefix) = env::var("KARLO_VARIATION_OUTPUT_PREFIX") {
            config.variation_output_prefix = prefix;
        }
        if let Ok(value) = env::var("KARLO_BATCH_SIZE") {
            config.batch_size = value.parse().map_err(|_| {
                KarloError::Config(format!(
                    "KARLO_BATCH_SIZE must be a non-negative integer, got {}",
                    value
                ))
            })?;
        }

        Ok(config)
    }

    pub fn with_source_image(mut self, path: impl Into<String>) -> Self {
        self.source_image_path = path.into();
        self
    }

    pub fn with_variation_output_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.variation_output_prefix = prefix.into();
        self
    }

    pub fn with_batch_size(mut self, batch_size: u32) -> Self {
        self.batch_size = batch_size;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_karlo_config_defaults() {
        let config = KarloConfig::new();
        assert_eq!(config.backend, BackendKind::Http);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout(), Duration::from_secs(120));
        assert!(config.require_api_key().is_err());

        let config = config
            .with_backend(BackendKind::Native)
            .with_api_key("secret")
            .with_library_path("/opt/karlo/libkarlo_php.so");
        assert_eq!(config.require_api_key().unwrap(), "secret");
        assert_eq!(
            config.library_path,
            PathBuf::from("/opt/karlo/libkarlo_php.so")
        );
    }

    #[test]
    fn test_backend_kind_parsing() {
        assert_eq!("http".parse::<BackendKind>().unwrap(), BackendKind::Http);
        assert_eq!(" Native ".parse::<BackendKind>().unwrap(), BackendKind::Native);
        assert!("grpc".parse::<BackendKind>().is_err());
    }

    #[test]
    fn test_session_config_derives_paths() {
        let session = SessionConfig::new("A sunset in the universe", "imgs/output");
        assert_eq!(session.source_image_path, "imgs/output_1.png");
        assert_eq!(session.variation_output_prefix, "imgs/output_variation");
        assert_eq!(session.batch_size, 0);

        let session = session
            .with_source_image("imgs/input.png")
            .with_variation_output_prefix("imgs/var")
            .with_batch_size(2);
        assert_eq!(session.source_image_path, "imgs/input.png");
        assert_eq!(session.variation_output_prefix, "imgs/var");
        assert_eq!(session.batch_size, 2);
    }
}
