use std::io;
use std::num::{ParseFloatError, ParseIntError};
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReflectionError {
	#[error("IO error: {0}")]
	Io(#[from] io::Error),

	#[error("Tensor error: {0}")]
	Tensor(#[from] candle::Error),

	#[error("Image processing error: {0}")]
	Image(#[from] image::ImageError),

	#[error("Configuration error: {0}")]
	Configuration(String),

	#[error("Could not decode {}: {source}", path.display())]
	Decode {
		path: PathBuf,
		#[source]
		source: image::ImageError,
	},

	#[error("Index {index} out of range for dataset of length {length}")]
	IndexOutOfRange { index: usize, length: usize },

	#[error("Shape error: {0}")]
	Shape(String),

	#[error("Device error: {0}")]
	Device(String),

	#[error("Gradient error: {0}")]
	Gradient(String),

	#[error("Parse error: {0}")]
	Parse(String),

	#[error("Serialization error: {0}")]
	Serialization(String),

	#[error("Invalid parameter: {0}")]
	InvalidParameter(String),

	#[error("Invalid input: {0}")]
	InvalidInput(String),

	#[error("File not found: {}", .0.display())]
	FileNotFound(PathBuf),
}

impl From<ndarray::ShapeError> for ReflectionError {
	fn from(err: ndarray::ShapeError) -> Self {
		ReflectionError::Shape(err.to_string())
	}
}

impl From<ParseIntError> for ReflectionError {
	fn from(err: ParseIntError) -> Self {
		ReflectionError::Parse(format!("Failed to parse integer: {}", err))
	}
}

impl From<ParseFloatError> for ReflectionError {
	fn from(err: ParseFloatError) -> Self {
		ReflectionError::Parse(format!("Failed to parse float: {}", err))
	}
}

pub type Result<T> = std::result::Result<T, ReflectionError>;
