use crate::error::{ReflectionError, Result};
use crate::image_io::{ImageIo, PngImageIo};
use crate::transform::ImageTransform;
use log::info;
use ndarray::Array3;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One training example: the photo with reflections and its clear counterpart.
#[derive(Debug, Clone)]
pub struct PairedSample {
	pub reflected: Array3<f32>,
	pub clear: Array3<f32>,
}

/// Lists the regular, non-hidden files of `dir`, sorted by file name.
pub fn list_images(dir: &Path) -> Result<Vec<PathBuf>> {
	if !dir.exists() {
		return Err(ReflectionError::FileNotFound(dir.to_path_buf()));
	}
	if !dir.is_dir() {
		return Err(ReflectionError::InvalidInput(format!("{} is not a directory", dir.display())));
	}

	let mut files = Vec::new();
	for entry in fs::read_dir(dir)? {
		let entry = entry?;
		let hidden = entry.file_name().to_string_lossy().starts_with('.');
		let path = entry.path();
		if !hidden && fs::metadata(&path)?.is_file() {
			files.push(path);
		}
	}
	files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
	Ok(files)
}

/// Pairs two directories by the ordinal position of their sorted listings.
///
/// Holds no mutable state, so concurrent `get` calls are fine.
pub struct PairedImageFolder {
	reflected: Vec<PathBuf>,
	clear: Vec<PathBuf>,
	transform: ImageTransform,
	io: Arc<dyn ImageIo>,
}

impl PairedImageFolder {
	pub fn new(
		reflected_dir: impl AsRef<Path>,
		clear_dir: impl AsRef<Path>,
		transform: ImageTransform,
		io: Arc<dyn ImageIo>,
	) -> Result<Self> {
		let reflected = list_images(reflected_dir.as_ref())?;
		let clear = list_images(clear_dir.as_ref())?;

		if reflected.len() != clear.len() {
			return Err(ReflectionError::Configuration(format!(
				"{} contains {} images but {} contains {}",
				reflected_dir.as_ref().display(),
				reflected.len(),
				clear_dir.as_ref().display(),
				clear.len()
			)));
		}

		info!(
			"Found {} image pairs in {} and {}",
			reflected.len(),
			reflected_dir.as_ref().display(),
			clear_dir.as_ref().display()
		);

		Ok(PairedImageFolder {
			reflected,
			clear,
			transform,
			io,
		})
	}

	/// Opens both directories with the PNG codec and default transform.
	pub fn open(reflected_dir: impl AsRef<Path>, clear_dir: impl AsRef<Path>) -> Result<Self> {
		Self::new(reflected_dir, clear_dir, ImageTransform::default(), Arc::new(PngImageIo))
	}

	pub fn length(&self) -> usize {
		self.reflected.len()
	}

	pub fn is_empty(&self) -> bool {
		self.reflected.is_empty()
	}

	pub fn transform(&self) -> &ImageTransform {
		&self.transform
	}

	pub fn paths(&self, index: usize) -> Result<(&Path, &Path)> {
		if index >= self.length() {
			return Err(ReflectionError::IndexOutOfRange {
				index,
				length: self.length(),
			});
		}
		Ok((&self.reflected[index], &self.clear[index]))
	}

	/// Decodes and transforms pair `index`.
	pub fn get(&self, index: usize) -> Result<PairedSample> {
		let (reflected_path, clear_path) = self.paths(index)?;
		let reflected = self.transform.apply(&self.io.decode(reflected_path)?)?;
		let clear = self.transform.apply(&self.io.decode(clear_path)?)?;
		Ok(PairedSample { reflected, clear })
	}
}
