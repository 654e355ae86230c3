use crate::constants::{io, network, training, transform};
use crate::error::{ReflectionError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct NetworkConfig {
	/// Channels after the first encoder stage; the bottleneck has twice as many.
	pub base_width: usize,
	pub batch_norm: bool,
	pub seed: u64,
}

impl Default for NetworkConfig {
	fn default() -> Self {
		Self::coarse()
	}
}

impl NetworkConfig {
	/// Topology of the first stage: batch normalization after the second encoder conv.
	pub fn coarse() -> Self {
		Self {
			base_width: network::DEFAULT_BASE_WIDTH,
			batch_norm: true,
			seed: network::DEFAULT_SEED,
		}
	}

	/// Topology of the second stage: same shape, no normalization layer.
	pub fn refinement() -> Self {
		Self {
			batch_norm: false,
			..Self::coarse()
		}
	}

	pub fn builder() -> NetworkConfigBuilder {
		NetworkConfigBuilder::default()
	}

	pub fn validate(&self) -> Result<()> {
		if self.base_width == 0 {
			return Err(ReflectionError::InvalidParameter(
				"Base width must be greater than 0".into(),
			));
		}
		Ok(())
	}
}

#[derive(Default)]
pub struct NetworkConfigBuilder {
	base_width: Option<usize>,
	batch_norm: Option<bool>,
	seed: Option<u64>,
}

impl NetworkConfigBuilder {
	pub fn base_width(mut self, width: usize) -> Self {
		self.base_width = Some(width);
		self
	}

	pub fn batch_norm(mut self, batch_norm: bool) -> Self {
		self.batch_norm = Some(batch_norm);
		self
	}

	pub fn seed(mut self, seed: u64) -> Self {
		self.seed = Some(seed);
		self
	}

	pub fn build(self) -> NetworkConfig {
		NetworkConfig {
			base_width: self.base_width.unwrap_or(network::DEFAULT_BASE_WIDTH),
			batch_norm: self.batch_norm.unwrap_or(true),
			seed: self.seed.unwrap_or(network::DEFAULT_SEED),
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingConfig {
	pub learning_rate: f32,
	pub beta1: f32,
	pub beta2: f32,
	pub batch_size: usize,
	pub epochs: usize,
	pub log_interval: usize,
	/// Seeds the per-epoch shuffle.
	pub seed: u64,
	/// Batches decoded ahead of the training loop.
	pub prefetch: usize,
	pub quantise: bool,
}

impl Default for TrainingConfig {
	fn default() -> Self {
		Self {
			learning_rate: training::DEFAULT_LEARNING_RATE,
			beta1: training::ADAM_BETA1,
			beta2: training::ADAM_BETA2,
			batch_size: training::DEFAULT_BATCH_SIZE,
			epochs: training::DEFAULT_EPOCHS,
			log_interval: training::DEFAULT_LOG_INTERVAL,
			seed: network::DEFAULT_SEED,
			prefetch: io::PREFETCH_BATCHES,
			quantise: false,
		}
	}
}

impl TrainingConfig {
	pub fn builder() -> TrainingConfigBuilder {
		TrainingConfigBuilder::default()
	}

	pub fn validate(&self) -> Result<()> {
		if !(self.learning_rate > 0.0) {
			return Err(ReflectionError::InvalidParameter(format!(
				"Learning rate ({}) must be greater than 0",
				self.learning_rate
			)));
		}
		for (name, beta) in &[("beta1", self.beta1), ("beta2", self.beta2)] {
			if !(*beta >= 0.0 && *beta < 1.0) {
				return Err(ReflectionError::InvalidParameter(format!(
					"Adam {} ({}) must be in [0, 1)",
					name, beta
				)));
			}
		}
		if self.batch_size == 0 {
			return Err(ReflectionError::InvalidParameter(format!(
				"Batch size ({}) must be greater than 0",
				self.batch_size
			)));
		}
		if self.log_interval == 0 {
			return Err(ReflectionError::InvalidParameter(format!(
				"Log interval ({}) must be greater than 0",
				self.log_interval
			)));
		}
		if self.prefetch == 0 {
			return Err(ReflectionError::InvalidParameter(
				"Prefetch depth must be greater than 0".into(),
			));
		}
		Ok(())
	}
}

#[derive(Default)]
pub struct TrainingConfigBuilder {
	learning_rate: Option<f32>,
	beta1: Option<f32>,
	beta2: Option<f32>,
	batch_size: Option<usize>,
	epochs: Option<usize>,
	log_interval: Option<usize>,
	seed: Option<u64>,
	prefetch: Option<usize>,
	quantise: Option<bool>,
}

impl TrainingConfigBuilder {
	pub fn learning_rate(mut self, rate: f32) -> Self {
		self.learning_rate = Some(rate);
		self
	}

	pub fn beta1(mut self, beta1: f32) -> Self {
		self.beta1 = Some(beta1);
		self
	}

	pub fn beta2(mut self, beta2: f32) -> Self {
		self.beta2 = Some(beta2);
		self
	}

	pub fn batch_size(mut self, size: usize) -> Self {
		self.batch_size = Some(size);
		self
	}

	pub fn epochs(mut self, epochs: usize) -> Self {
		self.epochs = Some(epochs);
		self
	}

	pub fn log_interval(mut self, interval: usize) -> Self {
		self.log_interval = Some(interval);
		self
	}

	pub fn seed(mut self, seed: u64) -> Self {
		self.seed = Some(seed);
		self
	}

	pub fn prefetch(mut self, batches: usize) -> Self {
		self.prefetch = Some(batches);
		self
	}

	pub fn quantise(mut self, quantise: bool) -> Self {
		self.quantise = Some(quantise);
		self
	}

	pub fn build(self) -> TrainingConfig {
		let defaults = TrainingConfig::default();
		TrainingConfig {
			learning_rate: self.learning_rate.unwrap_or(defaults.learning_rate),
			beta1: self.beta1.unwrap_or(defaults.beta1),
			beta2: self.beta2.unwrap_or(defaults.beta2),
			batch_size: self.batch_size.unwrap_or(defaults.batch_size),
			epochs: self.epochs.unwrap_or(defaults.epochs),
			log_interval: self.log_interval.unwrap_or(defaults.log_interval),
			seed: self.seed.unwrap_or(defaults.seed),
			prefetch: self.prefetch.unwrap_or(defaults.prefetch),
			quantise: self.quantise.unwrap_or(defaults.quantise),
		}
	}
}

/// Resize target and normalization shared by training and inference.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformConfig {
	pub image_size: u32,
	pub mean: f32,
	pub std: f32,
}

impl Default for TransformConfig {
	fn default() -> Self {
		Self {
			image_size: transform::DEFAULT_IMAGE_SIZE,
			mean: transform::NORMALIZE_MEAN,
			std: transform::NORMALIZE_STD,
		}
	}
}

impl TransformConfig {
	pub fn with_size(image_size: u32) -> Self {
		Self {
			image_size,
			..Self::default()
		}
	}

	pub fn validate(&self) -> Result<()> {
		if self.image_size == 0 || self.image_size as usize % network::SPATIAL_DIVISOR != 0 {
			return Err(ReflectionError::InvalidParameter(format!(
				"Image size ({}) must be a positive multiple of {}",
				self.image_size,
				network::SPATIAL_DIVISOR
			)));
		}
		if !(self.std > 0.0) {
			return Err(ReflectionError::InvalidParameter(format!(
				"Normalization std ({}) must be greater than 0",
				self.std
			)));
		}
		Ok(())
	}
}
