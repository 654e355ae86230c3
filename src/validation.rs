use crate::constants::network::SPATIAL_DIVISOR;
use crate::error::{ReflectionError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Validates that a file exists and is readable
pub fn validate_input_file(path: &str) -> Result<PathBuf> {
    let path = Path::new(path);

    if !path.exists() {
        return Err(ReflectionError::FileNotFound(path.to_path_buf()));
    }

    if !path.is_file() {
        return Err(ReflectionError::InvalidInput(format!(
            "{} is not a file",
            path.display()
        )));
    }

    fs::metadata(path)?;

    Ok(path.to_path_buf())
}

/// Validates that a directory exists and is readable
pub fn validate_directory(path: &str) -> Result<PathBuf> {
    let path = Path::new(path);

    if !path.exists() {
        return Err(ReflectionError::FileNotFound(path.to_path_buf()));
    }

    if !path.is_dir() {
        return Err(ReflectionError::InvalidInput(format!(
            "{} is not a directory",
            path.display()
        )));
    }

    Ok(path.to_path_buf())
}

/// Creates the output directory if needed and checks nothing else occupies its path
pub fn prepare_output_directory(path: &str) -> Result<PathBuf> {
    let path = Path::new(path);

    if path.exists() && !path.is_dir() {
        return Err(ReflectionError::InvalidInput(format!(
            "{} exists but is not a directory",
            path.display()
        )));
    }

    fs::create_dir_all(path)?;
    Ok(path.to_path_buf())
}

/// Validates that an image file has a supported extension
pub fn validate_image_extension(path: &Path) -> Result<()> {
    let valid_extensions = ["png", "jpg", "jpeg", "gif", "bmp", "tiff", "webp"];

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match extension {
        Some(ext) if valid_extensions.contains(&ext.as_str()) => Ok(()),
        Some(ext) => Err(ReflectionError::InvalidInput(format!(
            "Unsupported image format: .{}. Supported formats: {}",
            ext,
            valid_extensions.join(", ")
        ))),
        None => Err(ReflectionError::InvalidInput(
            "File has no extension. Please specify an image file with a valid extension".to_string()
        )),
    }
}

/// Validates a positive integer parameter
pub fn validate_positive_int(value: &str, param_name: &str) -> Result<usize> {
    let parsed = value
        .parse::<usize>()
        .map_err(|_| ReflectionError::Parse(format!("{} must be a positive integer", param_name)))?;

    if parsed == 0 {
        return Err(ReflectionError::InvalidParameter(format!(
            "{} must be greater than 0",
            param_name
        )));
    }

    Ok(parsed)
}

/// Validates a positive float parameter
pub fn validate_positive_float(value: &str, param_name: &str) -> Result<f32> {
    let parsed = value
        .parse::<f32>()
        .map_err(|_| ReflectionError::Parse(format!("{} must be a valid number", param_name)))?;

    if parsed <= 0.0 {
        return Err(ReflectionError::InvalidParameter(format!(
            "{} must be greater than 0",
            param_name
        )));
    }

    if !parsed.is_finite() {
        return Err(ReflectionError::InvalidParameter(format!(
            "{} must be a finite number",
            param_name
        )));
    }

    Ok(parsed)
}

/// Validates the square size images are resized to
pub fn validate_image_size(size: usize) -> Result<u32> {
    match size {
        4..=4096 if size % SPATIAL_DIVISOR == 0 => Ok(size as u32),
        _ => Err(ReflectionError::InvalidParameter(format!(
            "Image size {} is out of range. Must be a multiple of {} between 4 and 4096",
            size, SPATIAL_DIVISOR
        ))),
    }
}

/// Validates batch size
pub fn validate_batch_size(size: usize) -> Result<()> {
    match size {
        1..=256 => Ok(()),
        _ => Err(ReflectionError::InvalidParameter(format!(
            "Batch size {} is out of range. Must be between 1 and 256",
            size
        ))),
    }
}
