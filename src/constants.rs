pub mod network {
	pub const CHANNELS: usize = 3;
	pub const DEFAULT_BASE_WIDTH: usize = 64;
	pub const KERNEL_SIZE: usize = 4;
	pub const STRIDE: usize = 2;
	pub const PADDING: usize = 1;
	/// Both encoder stages halve the spatial resolution.
	pub const SPATIAL_DIVISOR: usize = 4;
	pub const LEAKY_RELU_SLOPE: f32 = 0.2;
	pub const BATCH_NORM_EPSILON: f32 = 1e-5;
	pub const BATCH_NORM_MOMENTUM: f32 = 0.1;
	pub const DEFAULT_SEED: u64 = 0x5eed;
}

pub mod training {
	pub const DEFAULT_LEARNING_RATE: f32 = 2e-4;
	pub const DEFAULT_BATCH_SIZE: usize = 16;
	pub const DEFAULT_EPOCHS: usize = 200;
	pub const DEFAULT_LOG_INTERVAL: usize = 10;
	pub const ADAM_BETA1: f32 = 0.5;
	pub const ADAM_BETA2: f32 = 0.999;
	pub const ADAM_EPSILON: f32 = 1e-8;
}

pub mod transform {
	pub const DEFAULT_IMAGE_SIZE: u32 = 256;
	pub const NORMALIZE_MEAN: f32 = 0.5;
	pub const NORMALIZE_STD: f32 = 0.5;
}

pub mod io {
	pub const PREFETCH_BATCHES: usize = 2;
}

pub mod quantization {
	pub const QUANTIZE_MASK_HIGH: u8 = 0xF0;
	pub const QUANTIZE_MASK_LOW: u8 = 0x00;
}

pub mod psnr {
	pub const LOG10_MULTIPLIER: f32 = -10.0;
}

pub mod file {
	pub const CHECKPOINT_EXTENSION: &str = "ckpt";
	pub const COARSE_CHECKPOINT: &str = "coarse";
	pub const REFINE_CHECKPOINT: &str = "refine";
	pub const REPORT_FILE: &str = "training_report.json";
	pub const INPUT_IMAGE: &str = "input.png";
	pub const COARSE_IMAGE: &str = "coarse.png";
	pub const REFINED_IMAGE: &str = "refined.png";
	pub const COMPARISON_IMAGE: &str = "comparison.png";
}
