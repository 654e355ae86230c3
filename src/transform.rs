use crate::config::TransformConfig;
use crate::error::Result;
use crate::image_io::{image_to_tensor, tensor_to_image};
use image::{imageops::FilterType, DynamicImage};
use ndarray::Array3;

/// Resize plus normalization applied to every image entering a network.
///
/// Output tensors are `[3, size, size]` with values `(x - mean) / std`, which
/// maps `[0, 1]` onto `[-1, 1]` for the default mean and std of 0.5.
#[derive(Debug, Clone)]
pub struct ImageTransform {
	config: TransformConfig,
}

impl Default for ImageTransform {
	fn default() -> Self {
		ImageTransform {
			config: TransformConfig::default(),
		}
	}
}

impl ImageTransform {
	pub fn new(config: TransformConfig) -> Result<Self> {
		config.validate()?;
		Ok(ImageTransform { config })
	}

	pub fn size(&self) -> u32 {
		self.config.image_size
	}

	pub fn config(&self) -> &TransformConfig {
		&self.config
	}

	pub fn apply(&self, image: &DynamicImage) -> Result<Array3<f32>> {
		let size = self.config.image_size;
		let resized = image.resize_exact(size, size, FilterType::Triangle);
		Ok(self.normalize(image_to_tensor(&resized)?))
	}

	pub fn normalize(&self, mut tensor: Array3<f32>) -> Array3<f32> {
		let (mean, std) = (self.config.mean, self.config.std);
		tensor.mapv_inplace(|x| (x - mean) / std);
		tensor
	}

	/// Maps network outputs back to displayable `[0, 1]` values.
	pub fn denormalize(&self, tensor: &Array3<f32>) -> Array3<f32> {
		let (mean, std) = (self.config.mean, self.config.std);
		tensor.mapv(|x| (x * std + mean).max(0.0).min(1.0))
	}

	pub fn to_image(&self, tensor: &Array3<f32>) -> Result<DynamicImage> {
		tensor_to_image(&self.denormalize(tensor))
	}
}
