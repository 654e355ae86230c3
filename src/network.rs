//! The encoder/decoder used for both stages of the cascade.
//!
//! Two strided convolutions halve the resolution twice, two transposed
//! convolutions restore it, and a `tanh` keeps every output in `[-1, 1]`.
//! The coarse stage normalizes the bottleneck with batch norm; the refinement
//! stage has no normalization layer.

use crate::config::NetworkConfig;
use crate::constants::network::{
	BATCH_NORM_EPSILON, BATCH_NORM_MOMENTUM, CHANNELS, KERNEL_SIZE, LEAKY_RELU_SLOPE, PADDING, SPATIAL_DIVISOR,
	STRIDE,
};
use crate::device::ComputeContext;
use crate::error::{ReflectionError, Result};
use crate::tensor::{from_array_dyn, to_array4, to_array_dyn};
use crate::NetworkDescription;
use candle::{DType, Module, ModuleT, Tensor, Var};
use candle_nn::{
	BatchNorm, BatchNormConfig, Conv2d, Conv2dConfig, ConvTranspose2d, ConvTranspose2dConfig, VarBuilder, VarMap,
};
use log::debug;
use ndarray::{Array4, ArrayD};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
static NEXT_NETWORK_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
	Coarse,
	Refinement,
}

impl Stage {
	fn seed_offset(self) -> u64 {
		match self {
			Stage::Coarse => 0,
			Stage::Refinement => 1,
		}
	}
}

impl fmt::Display for Stage {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Stage::Coarse => write!(f, "coarse"),
			Stage::Refinement => write!(f, "refinement"),
		}
	}
}

/// Whether batch norm uses batch statistics (and updates its running
/// estimates) or the running estimates alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
	Train,
	Eval,
}

const CONV_LAYERS: [&str; 4] = ["down1", "down2", "up1", "up2"];
const NORM_PARAMETERS: [&str; 2] = ["norm.weight", "norm.bias"];
const NORM_BUFFERS: [&str; 2] = ["norm.running_mean", "norm.running_var"];

/// Variable names in checkpoint order.
fn parameter_names(batch_norm: bool) -> Vec<String> {
	let mut names = Vec::new();
	for (i, layer) in CONV_LAYERS.iter().enumerate() {
		if batch_norm && i == 2 {
			names.extend(NORM_PARAMETERS.iter().map(|n| n.to_string()));
		}
		names.push(format!("{}.weight", layer));
		names.push(format!("{}.bias", layer));
	}
	names
}

fn buffer_names(batch_norm: bool) -> Vec<String> {
	if batch_norm {
		NORM_BUFFERS.iter().map(|n| n.to_string()).collect()
	} else {
		Vec::new()
	}
}

pub struct EncoderDecoder {
	id: u64,
	stage: Stage,
	config: NetworkConfig,
	context: ComputeContext,
	mode: Mode,
	down1: Conv2d,
	down2: Conv2d,
	norm: Option<BatchNorm>,
	up1: ConvTranspose2d,
	up2: ConvTranspose2d,
	parameters: Vec<Var>,
	buffers: Vec<Var>,
}

impl EncoderDecoder {
	pub fn new(stage: Stage, context: &ComputeContext, config: NetworkConfig) -> Result<Self> {
		config.validate()?;
		let width = config.base_width;
		let varmap = VarMap::new();
		let vb = VarBuilder::from_varmap(&varmap, DType::F32, context.device());

		let down = Conv2dConfig {
			padding: PADDING,
			stride: STRIDE,
			..Default::default()
		};
		let up = ConvTranspose2dConfig {
			padding: PADDING,
			stride: STRIDE,
			..Default::default()
		};
		let down1 = candle_nn::conv2d(CHANNELS, width, KERNEL_SIZE, down, vb.pp("down1"))?;
		let down2 = candle_nn::conv2d(width, width * 2, KERNEL_SIZE, down, vb.pp("down2"))?;
		let norm = if config.batch_norm {
			let bn = BatchNormConfig {
				eps: BATCH_NORM_EPSILON as f64,
				momentum: BATCH_NORM_MOMENTUM as f64,
				..Default::default()
			};
			Some(candle_nn::batch_norm(width * 2, bn, vb.pp("norm"))?)
		} else {
			None
		};
		let up1 = candle_nn::conv_transpose2d(width * 2, width, KERNEL_SIZE, up, vb.pp("up1"))?;
		let up2 = candle_nn::conv_transpose2d(width, CHANNELS, KERNEL_SIZE, up, vb.pp("up2"))?;

		let (parameters, buffers) = {
			let vars = varmap
				.data()
				.lock()
				.map_err(|_| ReflectionError::Device("Variable map lock poisoned".into()))?;
			let lookup = |names: Vec<String>| -> Result<Vec<Var>> {
				names
					.iter()
					.map(|name| {
						vars.get(name)
							.cloned()
							.ok_or_else(|| ReflectionError::Shape(format!("Network has no variable {}", name)))
					})
					.collect()
			};
			(lookup(parameter_names(config.batch_norm))?, lookup(buffer_names(config.batch_norm))?)
		};

		let network = EncoderDecoder {
			id: NEXT_NETWORK_ID.fetch_add(1, Ordering::Relaxed),
			stage,
			config,
			context: context.clone(),
			mode: Mode::Train,
			down1,
			down2,
			norm,
			up1,
			up2,
			parameters,
			buffers,
		};
		network.seed_parameters()?;
		debug!(
			"Built {} network {} with {} parameters",
			stage,
			network.id,
			network.parameter_count()
		);
		Ok(network)
	}

	/// Redraws every convolution weight and bias from the stage's seed,
	/// uniformly in `±1/sqrt(fan_in)`. Normalization keeps weight 1, bias 0.
	fn seed_parameters(&self) -> Result<()> {
		let mut rng = StdRng::seed_from_u64(self.config.seed.wrapping_add(self.stage.seed_offset()));
		let device = self.context.device();
		let mut bound = 0.0f32;
		for (name, var) in parameter_names(self.config.batch_norm).iter().zip(&self.parameters) {
			if name.starts_with("norm.") {
				continue;
			}
			// a layer's bias follows its weight
			if name.ends_with(".weight") {
				let fan_in: usize = var.dims()[1..].iter().product();
				bound = 1.0 / (fan_in as f32).sqrt();
			}
			let values: Vec<f32> = (0..var.elem_count()).map(|_| rng.gen_range(-bound..bound)).collect();
			var.set(&Tensor::from_vec(values, var.dims(), device)?)?;
		}
		Ok(())
	}

	pub fn coarse(context: &ComputeContext, config: NetworkConfig) -> Result<Self> {
		Self::new(Stage::Coarse, context, config)
	}

	pub fn refinement(context: &ComputeContext, config: NetworkConfig) -> Result<Self> {
		Self::new(Stage::Refinement, context, config)
	}

	pub fn id(&self) -> u64 {
		self.id
	}

	pub fn stage(&self) -> Stage {
		self.stage
	}

	pub fn config(&self) -> &NetworkConfig {
		&self.config
	}

	pub fn context(&self) -> &ComputeContext {
		&self.context
	}

	pub fn mode(&self) -> Mode {
		self.mode
	}

	pub fn set_mode(&mut self, mode: Mode) {
		self.mode = mode;
	}

	pub fn train(&mut self) {
		self.set_mode(Mode::Train);
	}

	pub fn eval(&mut self) {
		self.set_mode(Mode::Eval);
	}

	/// Trainable variables, the only ones an optimizer may update.
	pub fn parameters(&self) -> &[Var] {
		&self.parameters
	}

	pub fn parameter_count(&self) -> usize {
		self.parameters.iter().map(|v| v.elem_count()).sum()
	}

	pub fn parameter_values(&self) -> Result<Vec<ArrayD<f32>>> {
		self.parameters.iter().map(|v| to_array_dyn(v.as_tensor())).collect()
	}

	/// Running mean and variance of the normalization layer, if any.
	pub fn buffers(&self) -> Result<Vec<ArrayD<f32>>> {
		match &self.norm {
			Some(bn) => Ok(vec![to_array_dyn(bn.running_mean())?, to_array_dyn(bn.running_var())?]),
			None => Ok(Vec::new()),
		}
	}

	fn check_input(&self, input: &Tensor) -> Result<()> {
		self.context.ensure_on_device(input)?;
		let (n, c, h, w) = input
			.dims4()
			.map_err(|_| ReflectionError::Shape(format!("Expected a [N, C, H, W] batch, got {:?}", input.dims())))?;
		if n == 0 {
			return Err(ReflectionError::Shape("Empty batch".into()));
		}
		if c != CHANNELS {
			return Err(ReflectionError::Shape(format!(
				"{} network expects {} channels, got {}",
				self.stage, CHANNELS, c
			)));
		}
		if h == 0 || w == 0 || h % SPATIAL_DIVISOR != 0 || w % SPATIAL_DIVISOR != 0 {
			return Err(ReflectionError::Shape(format!(
				"Spatial size {}x{} must be a positive multiple of {}",
				h, w, SPATIAL_DIVISOR
			)));
		}
		Ok(())
	}

	fn forward_t(&self, input: &Tensor, train: bool) -> Result<Tensor> {
		self.check_input(input)?;
		self.context.install(|| -> Result<Tensor> {
			let slope = LEAKY_RELU_SLOPE as f64;
			let xs = candle_nn::ops::leaky_relu(&self.down1.forward(input)?, slope)?;
			let mut xs = self.down2.forward(&xs)?;
			if let Some(bn) = &self.norm {
				xs = bn.forward_t(&xs, train)?;
			}
			let xs = candle_nn::ops::leaky_relu(&xs, slope)?;
			let xs = self.up1.forward(&xs)?.relu()?;
			Ok(self.up2.forward(&xs)?.tanh()?)
		})
	}

	/// Runs the network with gradient tracking in the current mode.
	///
	/// In `Mode::Train` the normalization layer uses batch statistics and
	/// updates its running estimates.
	pub fn forward(&self, input: &Tensor) -> Result<Tensor> {
		self.forward_t(input, self.mode == Mode::Train)
	}

	/// Evaluation-mode forward pass: running statistics, no state change, and
	/// an output detached from the graph.
	pub fn infer(&self, input: &Tensor) -> Result<Tensor> {
		Ok(self.forward_t(input, false)?.detach())
	}

	pub fn predict(&self, input: &Array4<f32>) -> Result<Array4<f32>> {
		to_array4(&self.infer(&self.context.tensor(input)?)?)
	}

	pub fn to_description(&self) -> Result<NetworkDescription> {
		Ok(NetworkDescription {
			stage: self.stage,
			base_width: self.config.base_width as u32,
			batch_norm: self.config.batch_norm,
			parameters: self.parameter_values()?,
			buffers: self.buffers()?,
		})
	}

	/// Rebuilds a network from a description, checking every tensor against the topology.
	pub fn from_description(desc: NetworkDescription, context: &ComputeContext) -> Result<Self> {
		let config = NetworkConfig::builder()
			.base_width(desc.base_width as usize)
			.batch_norm(desc.batch_norm)
			.build();
		let network = Self::new(desc.stage, context, config)?;
		restore(&network.parameters, &desc.parameters, "parameter", context)?;
		restore(&network.buffers, &desc.buffers, "normalization buffer", context)?;
		Ok(network)
	}
}

fn restore(vars: &[Var], values: &[ArrayD<f32>], what: &str, context: &ComputeContext) -> Result<()> {
	if vars.len() != values.len() {
		return Err(ReflectionError::Shape(format!(
			"Checkpoint holds {} {} tensors, expected {}",
			values.len(),
			what,
			vars.len()
		)));
	}
	for (var, value) in vars.iter().zip(values) {
		if var.dims() != value.shape() {
			return Err(ReflectionError::Shape(format!(
				"Checkpoint {} has shape {:?}, expected {:?}",
				what,
				value.shape(),
				var.dims()
			)));
		}
		var.set(&from_array_dyn(value, context.device())?)?;
	}
	Ok(())
}

impl fmt::Debug for EncoderDecoder {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.debug_struct("EncoderDecoder")
			.field("id", &self.id)
			.field("stage", &self.stage)
			.field("config", &self.config)
			.field("mode", &self.mode)
			.field("parameters", &self.parameter_count())
			.finish()
	}
}

impl fmt::Display for EncoderDecoder {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(
			f,
			"{} network (width {}, {}batch norm)",
			self.stage,
			self.config.base_width,
			if self.config.batch_norm { "" } else { "no " }
		)
	}
}
