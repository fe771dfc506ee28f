//! Client for the Karlo image generation capability.
//!
//! The capability sits behind [`GenerationBackend`]: either a shared library
//! exporting `generate_image_ffi` / `generate_variations_ffi`
//! ([`NativeBackend`]) or the Karlo HTTP API ([`KarloBackend`]).
//! [`GenerationClient`] drives it and reports one line per operation.
//!
//! ```no_run
//! use karlo_rs::{backend, GenerationClient, KarloConfig, SessionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = KarloConfig::from_env()?;
//!     let credential = config.require_api_key()?.to_string();
//!     let client = GenerationClient::new(backend::from_config(&config)?);
//!
//!     let session = SessionConfig::new("A sunset in the universe", "imgs/output")
//!         .with_batch_size(2);
//!     client
//!         .run_session(&session, &credential, &mut std::io::stdout())
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod client;
pub mod config;
pub mod error;
pub mod ffi;
pub mod imaging;
pub mod logger;
pub mod models;

pub use backend::{GenerationBackend, KarloBackend, NativeBackend};
pub use client::{GenerationClient, SessionReport};
pub use config::{BackendKind, KarloConfig, SessionConfig};
pub use error::{KarloError, Result};
pub use models::{GenerationInput, GenerationRequest, Operation, Outcome, StatusCode};
