use crate::error::{KarloError, Result};
use base64::{engine::general_purpose, Engine as _};
use image::{DynamicImage, ImageFormat};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// `{prefix}_{index}.png`, index starting at 1.
pub fn output_path(prefix: &str, index: usize) -> PathBuf {
    PathBuf::from(format!("{}_{}.png", prefix, index))
}

pub fn encode_png_base64(img: &DynamicImage) -> Result<String> {
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)?;
    Ok(general_purpose::STANDARD.encode(buffer))
}

pub fn decode_base64_image(data: &str) -> Result<DynamicImage> {
    let bytes = general_purpose::STANDARD
        .decode(data.trim())
        .map_err(|e| KarloError::Decode(e.to_string()))?;
    Ok(image::load_from_memory(&bytes)?)
}

pub fn load_png_base64(path: &Path) -> Result<String> {
    let img = image::open(path)?;
    encode_png_base64(&img)
}

/// Saves as PNG, creating missing parent directories.
pub fn save_png(img: &DynamicImage, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    img.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}
