use super::dataset::{PairedImageFolder, PairedSample};
use crate::device::ComputeContext;
use crate::error::{ReflectionError, Result};
use log::{debug, trace};
use ndarray::Array4;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use std::sync::mpsc::{sync_channel, Receiver};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Reflected and clear tensors of one step, stacked as `[N, 3, H, W]`.
#[derive(Debug, Clone)]
pub struct Batch {
	pub reflected: Array4<f32>,
	pub clear: Array4<f32>,
	/// Dataset indices of the pairs, in batch order.
	pub indices: Vec<usize>,
}

impl Batch {
	pub fn from_samples(samples: Vec<PairedSample>, indices: Vec<usize>) -> Result<Self> {
		let first = samples
			.first()
			.ok_or_else(|| ReflectionError::InvalidInput("Cannot build an empty batch".into()))?;
		let (c, h, w) = first.reflected.dim();
		let n = samples.len();

		let mut reflected = Vec::with_capacity(n * c * h * w);
		let mut clear = Vec::with_capacity(n * c * h * w);
		for sample in &samples {
			if sample.reflected.dim() != (c, h, w) || sample.clear.dim() != (c, h, w) {
				return Err(ReflectionError::Shape(format!(
					"Batch samples differ in shape: {:?} and {:?} vs {:?}",
					sample.reflected.shape(),
					sample.clear.shape(),
					[c, h, w]
				)));
			}
			reflected.extend(sample.reflected.iter().cloned());
			clear.extend(sample.clear.iter().cloned());
		}

		Ok(Batch {
			reflected: Array4::from_shape_vec((n, c, h, w), reflected)?,
			clear: Array4::from_shape_vec((n, c, h, w), clear)?,
			indices,
		})
	}

	pub fn len(&self) -> usize {
		self.indices.len()
	}

	pub fn is_empty(&self) -> bool {
		self.indices.is_empty()
	}
}

/// Groups a dataset into shuffled batches, decoding ahead on a producer thread.
pub struct BatchLoader {
	dataset: Arc<PairedImageFolder>,
	context: ComputeContext,
	batch_size: usize,
	prefetch: usize,
	seed: u64,
}

impl BatchLoader {
	pub fn new(
		dataset: Arc<PairedImageFolder>,
		context: ComputeContext,
		batch_size: usize,
		prefetch: usize,
		seed: u64,
	) -> Result<Self> {
		if batch_size == 0 {
			return Err(ReflectionError::InvalidParameter(
				"Batch size must be greater than 0".into(),
			));
		}
		Ok(BatchLoader {
			dataset,
			context,
			batch_size,
			prefetch: prefetch.max(1),
			seed,
		})
	}

	pub fn dataset(&self) -> &PairedImageFolder {
		&self.dataset
	}

	pub fn batch_size(&self) -> usize {
		self.batch_size
	}

	/// Batches per epoch; the last one may be smaller than `batch_size`.
	pub fn batches_per_epoch(&self) -> usize {
		(self.dataset.length() + self.batch_size - 1) / self.batch_size
	}

	/// Visiting order of `epoch`, reshuffled for every epoch from the seed.
	pub fn order(&self, epoch: usize) -> Vec<usize> {
		let mut order: Vec<usize> = (0..self.dataset.length()).collect();
		let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(epoch as u64));
		order.shuffle(&mut rng);
		order
	}

	/// Starts producing the batches of `epoch`.
	pub fn epoch(&self, epoch: usize) -> EpochBatches {
		let order = self.order(epoch);
		let dataset = Arc::clone(&self.dataset);
		let context = self.context.clone();
		let batch_size = self.batch_size;
		let (sender, receiver) = sync_channel(self.prefetch);

		let handle = thread::spawn(move || {
			for chunk in order.chunks(batch_size) {
				let batch = context.install(|| load_batch(&dataset, chunk));
				let failed = batch.is_err();
				if sender.send(batch).is_err() {
					trace!("Batch consumer went away, stopping producer");
					return;
				}
				if failed {
					return;
				}
			}
			debug!("Producer finished epoch {}", epoch);
		});

		EpochBatches {
			receiver: Some(receiver),
			handle: Some(handle),
			remaining: self.batches_per_epoch(),
		}
	}
}

fn load_batch(dataset: &PairedImageFolder, indices: &[usize]) -> Result<Batch> {
	let samples = indices
		.par_iter()
		.map(|&index| dataset.get(index))
		.collect::<Result<Vec<_>>>()?;
	Batch::from_samples(samples, indices.to_vec())
}

/// The batches of one epoch, in order. Dropping it stops the producer.
pub struct EpochBatches {
	receiver: Option<Receiver<Result<Batch>>>,
	handle: Option<JoinHandle<()>>,
	remaining: usize,
}

impl Iterator for EpochBatches {
	type Item = Result<Batch>;

	fn next(&mut self) -> Option<Self::Item> {
		let item = self.receiver.as_ref()?.recv().ok();
		match &item {
			Some(Ok(_)) => self.remaining = self.remaining.saturating_sub(1),
			// decode failures end the epoch
			Some(Err(_)) | None => {
				self.remaining = 0;
				self.receiver = None;
			}
		}
		item
	}

	fn size_hint(&self) -> (usize, Option<usize>) {
		(0, Some(self.remaining))
	}
}

impl Drop for EpochBatches {
	fn drop(&mut self) {
		// closing the channel unblocks a producer waiting on a full buffer
		self.receiver.take();
		if let Some(handle) = self.handle.take() {
			if handle.join().is_err() {
				debug!("Batch producer panicked");
			}
		}
	}
}
