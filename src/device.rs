use crate::error::{ReflectionError, Result};
use crate::tensor::from_array4;
use candle::{Device, Tensor};
use log::{info, warn};
use ndarray::Array4;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComputeBackend {
	Cpu,
	Cuda,
	Metal,
}

impl fmt::Display for ComputeBackend {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			ComputeBackend::Cpu => write!(f, "CPU"),
			ComputeBackend::Cuda => write!(f, "CUDA"),
			ComputeBackend::Metal => write!(f, "Metal"),
		}
	}
}

impl ComputeBackend {
	pub fn from_str(s: &str) -> Result<Self> {
		match s.to_lowercase().as_str() {
			"cpu" => Ok(ComputeBackend::Cpu),
			"cuda" | "gpu" => Ok(ComputeBackend::Cuda),
			"metal" | "mps" => Ok(ComputeBackend::Metal),
			_ => Err(ReflectionError::InvalidParameter(format!(
				"Unknown compute backend: {}. Valid options: cpu, cuda, metal",
				s
			))),
		}
	}

	/// Accelerators are only available when candle was built with their feature.
	pub fn is_available(&self) -> bool {
		match self {
			ComputeBackend::Cpu => true,
			ComputeBackend::Cuda => candle::utils::cuda_is_available(),
			ComputeBackend::Metal => candle::utils::metal_is_available(),
		}
	}

	fn device(&self) -> Result<Device> {
		let device = match self {
			ComputeBackend::Cpu => Device::Cpu,
			ComputeBackend::Cuda => Device::new_cuda(0)?,
			ComputeBackend::Metal => Device::new_metal(0)?,
		};
		Ok(device)
	}
}

/// The compute unit every tensor of a forward/backward pass lives on.
///
/// Resolved once at startup and handed to both networks, the trainer and the
/// inference pipeline. Clones share the same worker pool and compare equal.
#[derive(Clone)]
pub struct ComputeContext {
	id: u64,
	backend: ComputeBackend,
	device: Device,
	pool: Arc<rayon::ThreadPool>,
}

impl ComputeContext {
	/// Performs the single availability check for `preferred`.
	///
	/// An unavailable accelerator resolves to the CPU.
	pub fn detect(preferred: ComputeBackend, threads: Option<usize>) -> Result<Self> {
		let opened = if preferred.is_available() {
			preferred.device().map_err(|e| warn!("Could not open {} ({}), using the CPU", preferred, e)).ok()
		} else {
			warn!("{} is not available, using the CPU", preferred);
			None
		};
		let (backend, device) = match opened {
			Some(device) => (preferred, device),
			None => (ComputeBackend::Cpu, Device::Cpu),
		};

		let mut builder = rayon::ThreadPoolBuilder::new();
		if let Some(threads) = threads {
			if threads == 0 {
				return Err(ReflectionError::InvalidParameter(
					"Thread count must be greater than 0".into(),
				));
			}
			builder = builder.num_threads(threads);
		}
		let pool = builder
			.build()
			.map_err(|e| ReflectionError::Device(format!("Could not build worker pool: {}", e)))?;

		info!("Compute context: {} with {} worker threads", backend, pool.current_num_threads());

		Ok(ComputeContext {
			id: NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed),
			backend,
			device,
			pool: Arc::new(pool),
		})
	}

	pub fn cpu() -> Result<Self> {
		Self::detect(ComputeBackend::Cpu, None)
	}

	pub fn backend(&self) -> ComputeBackend {
		self.backend
	}

	pub fn device(&self) -> &Device {
		&self.device
	}

	/// Copies a `[N, C, H, W]` batch onto this context's device.
	pub fn tensor(&self, array: &Array4<f32>) -> Result<Tensor> {
		from_array4(array, &self.device)
	}

	/// Fails when `tensor` lives on another device than this context.
	pub fn ensure_on_device(&self, tensor: &Tensor) -> Result<()> {
		if !tensor.device().same_device(&self.device) {
			return Err(ReflectionError::Device(format!(
				"Tensor on {:?} used with {} context {}",
				tensor.device(),
				self.backend,
				self.id
			)));
		}
		Ok(())
	}

	pub fn threads(&self) -> usize {
		self.pool.current_num_threads()
	}

	pub fn id(&self) -> u64 {
		self.id
	}

	/// Runs `op` inside this context's worker pool.
	pub fn install<OP, R>(&self, op: OP) -> R
	where
		OP: FnOnce() -> R + Send,
		R: Send,
	{
		self.pool.install(op)
	}

	pub fn ensure_same(&self, other: &ComputeContext, what: &str) -> Result<()> {
		if self.id != other.id {
			return Err(ReflectionError::Device(format!(
				"{} was built on compute context {} but is used with context {}",
				what, other.id, self.id
			)));
		}
		Ok(())
	}
}

impl PartialEq for ComputeContext {
	fn eq(&self, other: &Self) -> bool {
		self.id == other.id
	}
}

impl fmt::Debug for ComputeContext {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.debug_struct("ComputeContext")
			.field("id", &self.id)
			.field("backend", &self.backend)
			.field("threads", &self.threads())
			.finish()
	}
}
