pub mod karlo;
pub mod native;

use crate::{
    config::{BackendKind, KarloConfig},
    error::Result,
    models::StatusCode,
};
use async_trait::async_trait;
use std::sync::Arc;

pub use karlo::KarloBackend;
pub use native::NativeBackend;

/// The external image-generation capability.
///
/// Arguments are forwarded as given. A returned status of 0 means success;
/// `Err` means the capability could not be invoked at all.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn generate_image(
        &self,
        prompt: &str,
        output_prefix: &str,
        credential: &str,
        batch_size: u32,
    ) -> Result<StatusCode>;

    async fn generate_variations(
        &self,
        source_image_path: &str,
        output_prefix: &str,
        credential: &str,
        batch_size: u32,
    ) -> Result<StatusCode>;

    fn name(&self) -> &'static str;
}

pub fn from_config(config: &KarloConfig) -> Result<Arc<dyn GenerationBackend>> {
    let backend: Arc<dyn GenerationBackend> = match config.backend {
        BackendKind::Http => Arc::new(KarloBackend::new(config)?),
        BackendKind::Native => {
            // SAFETY: the configured library is expected to export the
            // `*_ffi` pair with the C signatures declared in `native`.
            Arc::new(unsafe { NativeBackend::load(&config.library_path)? })
        }
    };
    log::info!("Using {} backend", backend.name());
    Ok(backend)
}
