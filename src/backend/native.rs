use crate::{
    backend::GenerationBackend,
    error::{KarloError, Result},
    models::StatusCode,
};
use async_trait::async_trait;
use libloading::{Library, Symbol};
use std::ffi::CString;
use std::os::raw::{c_char, c_int};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Signature shared by both exported generation functions:
/// `(input, output_prefix, api_key, batch_size) -> status`.
pub type GenerateFn =
    unsafe extern "C" fn(*const c_char, *const c_char, *const c_char, c_int) -> c_int;

pub const GENERATE_IMAGE_SYMBOL: &[u8] = b"generate_image_ffi\0";
pub const GENERATE_VARIATIONS_SYMBOL: &[u8] = b"generate_variations_ffi\0";

/// Generation backend living in a shared library loaded at runtime.
pub struct NativeBackend {
    library: Arc<Library>,
    path: PathBuf,
}

impl NativeBackend {
    /// Loads the library and checks that both generation symbols resolve.
    ///
    /// # Safety
    /// The library at `path` must export `generate_image_ffi` and
    /// `generate_variations_ffi` with the [`GenerateFn`] signature, and its
    /// initialisers must be sound to run in this process.
    pub unsafe fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let library = Library::new(&path).map_err(|e| {
            KarloError::ExternalInvocation(format!("failed to load {}: {}", path.display(), e))
        })?;

        for symbol in [GENERATE_IMAGE_SYMBOL, GENERATE_VARIATIONS_SYMBOL] {
            library.get::<GenerateFn>(symbol).map_err(|e| {
                KarloError::ExternalInvocation(format!(
                    "{} does not export {}: {}",
                    path.display(),
                    symbol_name(symbol),
                    e
                ))
            })?;
        }

        log::debug!("Loaded native generation library {}", path.display());
        Ok(Self {
            library: Arc::new(library),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn invoke(
        &self,
        symbol: &'static [u8],
        input: &str,
        output_prefix: &str,
        credential: &str,
        batch_size: u32,
    ) -> Result<StatusCode> {
        let args = NativeArgs::new(input, output_prefix, credential, batch_size)?;
        let library = Arc::clone(&self.library);

        // The foreign call blocks until the images are written.
        let code = tokio::task::spawn_blocking(move || -> Result<c_int> {
            // SAFETY: symbol and signature were checked in `load`; the
            // CStrings outlive the call.
            unsafe {
                let func: Symbol<GenerateFn> = library.get(symbol)?;
                Ok(func(
                    args.input.as_ptr(),
                    args.output_prefix.as_ptr(),
                    args.credential.as_ptr(),
                    args.batch_size,
                ))
            }
        })
        .await
        .map_err(|e| {
            KarloError::ExternalInvocation(format!(
                "{} did not complete: {}",
                symbol_name(symbol),
                e
            ))
        })??;

        Ok(StatusCode::from(code))
    }
}

#[async_trait]
impl GenerationBackend for NativeBackend {
    async fn generate_image(
        &self,
        prompt: &str,
        output_prefix: &str,
        credential: &str,
        batch_size: u32,
    ) -> Result<StatusCode> {
        self.invoke(
            GENERATE_IMAGE_SYMBOL,
            prompt,
            output_prefix,
            credential,
            batch_size,
        )
        .await
    }

    async fn generate_variations(
        &self,
        source_image_path: &str,
        output_prefix: &str,
        credential: &str,
        batch_size: u32,
    ) -> Result<StatusCode> {
        self.invoke(
            GENERATE_VARIATIONS_SYMBOL,
            source_image_path,
            output_prefix,
            credential,
            batch_size,
        )
        .await
    }

    fn name(&self) -> &'static str {
        "native"
    }
}

/// Owned C copies of one call's arguments.
#[derive(Debug)]
struct NativeArgs {
    input: CString,
    output_prefix: CString,
    credential: CString,
    batch_size: c_int,
}

impl NativeArgs {
    fn new(input: &str, output_prefix: &str, credential: &str, batch_size: u32) -> Result<Self> {
        Ok(Self {
            input: to_c_string("input", input)?,
            output_prefix: to_c_string("output prefix", output_prefix)?,
            credential: to_c_string("credential", credential)?,
            batch_size: c_int::try_from(batch_size).map_err(|_| {
                KarloError::InvalidRequest(format!("batch size {} does not fit a C int", batch_size))
            })?,
        })
    }
}

fn to_c_string(field: &str, value: &str) -> Result<CString> {
    CString::new(value)
        .map_err(|_| KarloError::InvalidRequest(format!("{} contains a NUL byte", field)))
}

fn symbol_name(symbol: &[u8]) -> &str {
    std::str::from_utf8(symbol)
        .unwrap_or("<symbol>")
        .trim_end_matches('\0')
}
