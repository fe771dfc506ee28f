//! C ABI exports. Built as a `cdylib`, this crate is a drop-in
//! `generate_image_ffi` / `generate_variations_ffi` library for FFI hosts
//! (PHP `FFI::cdef`, Python `ctypes`, or [`crate::backend::NativeBackend`]).
//!
//! Both functions return 0 on success and 1 on any failure. A `batch_size`
//! of 0 or less selects the backend default.

use crate::{
    backend::KarloBackend,
    config::KarloConfig,
    error::{KarloError, Result},
    logger::{self, LogLevel, LoggerConfig},
};
use std::any::Any;
use std::ffi::CStr;
use std::future::Future;
use std::os::raw::{c_char, c_int};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

pub const FFI_SUCCESS: c_int = 0;
pub const FFI_FAILURE: c_int = 1;

static LOGGING: Once = Once::new();

/// Generates images from `prompt` into `{output_prefix}_{n}.png`.
///
/// # Safety
/// Every pointer must be null or point to a NUL-terminated string that stays
/// valid for the duration of the call.
#[no_mangle]
pub unsafe extern "C" fn generate_image_ffi(
    prompt: *const c_char,
    output_prefix: *const c_char,
    api_key: *const c_char,
    batch_size: c_int,
) -> c_int {
    guarded("generate_image_ffi", || {
        let prompt = read_str("prompt", prompt)?;
        let output_prefix = read_str("output_prefix", output_prefix)?;
        let api_key = read_str("api_key", api_key)?;
        let backend = KarloBackend::new(&KarloConfig::from_env()?)?;

        block_on(backend.generate_image_files(
            prompt,
            output_prefix,
            api_key,
            batch_size_from_c(batch_size),
        ))?
        .map(|_| ())
    })
}

/// Generates variations of the image at `input_path` into
/// `{output_prefix}_{n}.png`.
///
/// # Safety
/// Same contract as [`generate_image_ffi`].
#[no_mangle]
pub unsafe extern "C" fn generate_variations_ffi(
    input_path: *const c_char,
    output_prefix: *const c_char,
    api_key: *const c_char,
    batch_size: c_int,
) -> c_int {
    guarded("generate_variations_ffi", || {
        let input_path = read_str("input_path", input_path)?;
        let output_prefix = read_str("output_prefix", output_prefix)?;
        let api_key = read_str("api_key", api_key)?;
        let backend = KarloBackend::new(&KarloConfig::from_env()?)?;

        block_on(backend.generate_variation_files(
            input_path,
            output_prefix,
            api_key,
            batch_size_from_c(batch_size),
        ))?
        .map(|_| ())
    })
}

/// Non-positive sizes mean "backend default", which is 0 on the Rust side.
pub fn batch_size_from_c(batch_size: c_int) -> u32 {
    u32::try_from(batch_size).unwrap_or(0)
}

/// Runs `body`, turning errors and panics into [`FFI_FAILURE`]. Unwinding
/// must not cross the C boundary.
fn guarded<F>(name: &str, body: F) -> c_int
where
    F: FnOnce() -> Result<()>,
{
    init_logging();

    match panic::catch_unwind(AssertUnwindSafe(body)) {
        Ok(Ok(())) => FFI_SUCCESS,
        Ok(Err(e)) => {
            log::error!("{} failed: {}", name, e);
            FFI_FAILURE
        }
        Err(payload) => {
            log::error!("{} panicked: {}", name, panic_message(payload.as_ref()));
            FFI_FAILURE
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

unsafe fn read_str<'a>(field: &str, ptr: *const c_char) -> Result<&'a str> {
    if ptr.is_null() {
        return Err(KarloError::InvalidRequest(format!("{} is null", field)));
    }
    CStr::from_ptr(ptr)
        .to_str()
        .map_err(|_| KarloError::InvalidRequest(format!("{} is not valid UTF-8", field)))
}

fn block_on<F: Future>(future: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    Ok(runtime.block_on(future))
}

/// Host processes have no logger of their own; `KARLO_LOG` picks the level.
fn init_logging() {
    LOGGING.call_once(|| {
        let level = std::env::var("KARLO_LOG")
            .ok()
            .and_then(|name| LogLevel::parse(&name))
            .unwrap_or(LogLevel::Warn);
        // Fails when the host already installed a `log` backend; records
        // then go to that backend instead.
        if let Err(e) =
            logger::init_with_config(LoggerConfig::new().with_level(level).with_colors(false))
        {
            log::debug!("Keeping the host's logger: {}", e);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;
    use std::ptr;

    #[test]
    fn test_batch_size_from_c() {
        assert_eq!(batch_size_from_c(2), 2);
        assert_eq!(batch_size_from_c(0), 0);
        assert_eq!(batch_size_from_c(-5), 0);
    }

    #[test]
    fn test_null_arguments_fail() {
        let prefix = CString::new("imgs/output").unwrap();
        let key = CString::new("key").unwrap();

        let status =
            unsafe { generate_image_ffi(ptr::null(), prefix.as_ptr(), key.as_ptr(), 2) };
        assert_eq!(status, FFI_FAILURE);

        let input = CString::new("imgs/output_1.png").unwrap();
        let status =
            unsafe { generate_variations_ffi(input.as_ptr(), prefix.as_ptr(), ptr::null(), 2) };
        assert_eq!(status, FFI_FAILURE);
    }

    #[test]
    fn test_invalid_utf8_fails() {
        let prompt = CString::new(vec![0xff, 0xfe, 0x41]).unwrap();
        let prefix = CString::new("imgs/output").unwrap();
        let key = CString::new("key").unwrap();

        let status =
            unsafe { generate_image_ffi(prompt.as_ptr(), prefix.as_ptr(), key.as_ptr(), 0) };
        assert_eq!(status, FFI_FAILURE);
    }

    #[test]
    fn test_missing_source_image_fails() {
        let input = CString::new("/nonexistent/imgs/output_1.png").unwrap();
        let prefix = CString::new("imgs/output_variation").unwrap();
        let key = CString::new("key").unwrap();

        let status =
            unsafe { generate_variations_ffi(input.as_ptr(), prefix.as_ptr(), key.as_ptr(), 2) };
        assert_eq!(status, FFI_FAILURE);
    }

    #[test]
    fn test_guarded_contains_panics() {
        assert_eq!(guarded("ok", || Ok(())), FFI_SUCCESS);
        assert_eq!(
            guarded("err", || Err(KarloError::Decode("bad".into()))),
            FFI_FAILURE
        );
        assert_eq!(guarded("panic", || panic!("boom")), FFI_FAILURE);
    }

    #[test]
    fn test_panic_message_keeps_payload_text() {
        let payload = panic::catch_unwind(|| panic!("static message")).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "static message");

        let payload = panic::catch_unwind(|| panic!("formatted {}", 42)).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "formatted 42");

        let payload = panic::catch_unwind(|| std::panic::panic_any(7_u8)).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "unknown panic payload");
    }

    #[test]
    fn test_init_logging_is_safe_to_repeat() {
        init_logging();
        init_logging();
        assert_eq!(guarded("after-init", || Ok(())), FFI_SUCCESS);
    }
}
