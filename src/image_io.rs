//! Image decoding/encoding and conversions between rasters and `[C, H, W]` tensors.

use crate::constants::network::CHANNELS;
use crate::error::{ReflectionError, Result};
use alumina::data::image_folder::{data_to_image, image_to_data};
use image::{DynamicImage, ImageFormat};
use ndarray::{stack, Array3, ArrayView3, Axis, Ix3};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Reads and writes rasters. Implementations must be shareable across batch workers.
pub trait ImageIo: Send + Sync {
	fn decode(&self, path: &Path) -> Result<DynamicImage>;

	fn encode(&self, image: &DynamicImage, path: &Path) -> Result<()>;
}

/// Decodes any format `image` understands and always writes PNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct PngImageIo;

impl ImageIo for PngImageIo {
	fn decode(&self, path: &Path) -> Result<DynamicImage> {
		image::open(path).map_err(|source| ReflectionError::Decode {
			path: path.to_path_buf(),
			source,
		})
	}

	fn encode(&self, image: &DynamicImage, path: &Path) -> Result<()> {
		let mut writer = BufWriter::new(File::create(path)?);
		image.write_to(&mut writer, ImageFormat::PNG)?;
		Ok(())
	}
}

/// Converts a raster into a `[3, H, W]` tensor with values in `[0, 1]`.
pub fn image_to_tensor(image: &DynamicImage) -> Result<Array3<f32>> {
	let data = image_to_data(image).into_dimensionality::<Ix3>()?;
	let (height, width, channels) = data.dim();
	if channels < CHANNELS {
		return Err(ReflectionError::Shape(format!(
			"Expected at least {} colour channels, got {}",
			CHANNELS, channels
		)));
	}
	Ok(Array3::from_shape_fn((CHANNELS, height, width), |(c, y, x)| data[(y, x, c)]))
}

/// Converts a `[3, H, W]` tensor with values in `[0, 1]` into an RGB raster.
pub fn tensor_to_image(tensor: &Array3<f32>) -> Result<DynamicImage> {
	let (channels, height, width) = tensor.dim();
	if channels != CHANNELS {
		return Err(ReflectionError::Shape(format!(
			"Expected {} channels, got {}",
			CHANNELS, channels
		)));
	}
	let hwc = Array3::from_shape_fn((height, width, channels), |(y, x, c)| tensor[(c, y, x)]);
	Ok(data_to_image(hwc.into_dyn().view()))
}

/// Writes several `[3, H, W]` tensors into one image file.
pub trait ComparisonRenderer {
	fn render(&self, panels: &[&Array3<f32>], path: &Path) -> Result<()>;
}

/// Lays panels out left to right, separated by a white gap.
#[derive(Debug, Clone)]
pub struct SideBySideRenderer {
	gap: usize,
}

impl Default for SideBySideRenderer {
	fn default() -> Self {
		SideBySideRenderer { gap: 4 }
	}
}

impl SideBySideRenderer {
	pub fn new(gap: usize) -> Self {
		SideBySideRenderer { gap }
	}

	pub fn compose(&self, panels: &[&Array3<f32>]) -> Result<Array3<f32>> {
		let first = panels
			.first()
			.ok_or_else(|| ReflectionError::InvalidInput("Nothing to render".into()))?;
		let (channels, height, _) = first.dim();
		if panels.iter().any(|p| p.dim().0 != channels || p.dim().1 != height) {
			return Err(ReflectionError::Shape(
				"Side-by-side panels must share channel count and height".into(),
			));
		}

		let spacer = Array3::from_elem((channels, height, self.gap), 1.0f32);
		let mut views: Vec<ArrayView3<f32>> = Vec::with_capacity(panels.len() * 2);
		for (i, panel) in panels.iter().enumerate() {
			if i > 0 && self.gap > 0 {
				views.push(spacer.view());
			}
			views.push(panel.view());
		}
		Ok(stack(Axis(2), &views)?)
	}
}

impl ComparisonRenderer for SideBySideRenderer {
	fn render(&self, panels: &[&Array3<f32>], path: &Path) -> Result<()> {
		let composed = self.compose(panels)?;
		PngImageIo.encode(&tensor_to_image(&composed)?, path)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use image::{GenericImage, Rgb, RgbImage};

	#[test]
	fn test_tensor_layout_is_channel_first() {
		let mut raster = RgbImage::from_pixel(3, 2, Rgb([0, 0, 0]));
		raster.put_pixel(2, 1, Rgb([255, 0, 0]));
		let tensor = image_to_tensor(&DynamicImage::ImageRgb8(raster)).unwrap();

		assert_eq!(tensor.dim(), (3, 2, 3));
		assert_eq!(tensor[(0, 1, 2)], 1.0);
		assert_eq!(tensor[(1, 1, 2)], 0.0);
		assert_eq!(tensor[(0, 0, 0)], 0.0);
	}

	#[test]
	fn test_tensor_to_image_dimensions() {
		let tensor = Array3::from_elem((3, 4, 6), 0.5f32);
		let image = tensor_to_image(&tensor).unwrap();
		assert_eq!(image.dimensions(), (6, 4));
	}

	#[test]
	fn test_side_by_side_width() {
		let a = Array3::zeros((3, 4, 5));
		let b = Array3::zeros((3, 4, 5));
		let c = Array3::zeros((3, 4, 5));
		let composed = SideBySideRenderer::new(2).compose(&[&a, &b, &c]).unwrap();
		assert_eq!(composed.dim(), (3, 4, 19));
		assert_eq!(composed[(0, 0, 5)], 1.0);
	}

	#[test]
	fn test_side_by_side_rejects_mismatched_heights() {
		let a = Array3::zeros((3, 4, 5));
		let b = Array3::zeros((3, 5, 5));
		assert!(SideBySideRenderer::default().compose(&[&a, &b]).is_err());
	}

	#[test]
	fn test_decode_missing_file() {
		match PngImageIo.decode(Path::new("/nonexistent/image.png")) {
			Err(ReflectionError::Decode { path, .. }) => assert_eq!(path, Path::new("/nonexistent/image.png")),
			other => panic!("expected decode error, got {:?}", other.map(|_| ())),
		}
	}
}
