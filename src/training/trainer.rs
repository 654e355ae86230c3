use super::data_loader::{Batch, BatchLoader};
use crate::config::TrainingConfig;
use crate::constants::training::ADAM_EPSILON;
use crate::device::ComputeContext;
use crate::error::{ReflectionError, Result};
use crate::logging::create_progress_bar;
use crate::network::{EncoderDecoder, Stage};
use crate::tensor::scalar;
use candle::Tensor;
use candle_nn::{loss, AdamW, Optimizer, ParamsAdamW};
use chrono::Utc;
use log::{debug, info};
use std::fs;
use std::path::Path;

/// Losses of both stages at one logged step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
	pub epoch: usize,
	/// Index of the batch within its epoch.
	pub step: usize,
	pub global_step: usize,
	pub coarse_loss: f32,
	pub refine_loss: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochSummary {
	pub epoch: usize,
	pub steps: usize,
	pub mean_coarse_loss: f32,
	pub mean_refine_loss: f32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainingReport {
	pub started_at: String,
	pub finished_at: String,
	pub total_steps: usize,
	pub records: Vec<ProgressRecord>,
	pub epochs: Vec<EpochSummary>,
}

impl TrainingReport {
	pub fn write_json(&self, path: &Path) -> Result<()> {
		let contents = serde_json::to_string_pretty(self)
			.map_err(|e| ReflectionError::Serialization(format!("Failed to serialize training report: {}", e)))?;
		fs::write(path, contents)?;
		Ok(())
	}
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepLosses {
	pub coarse: f32,
	pub refine: f32,
}

/// Trains the coarse and refinement networks together, one batch at a time.
///
/// Each stage has its own `AdamW` (no weight decay, so plain Adam) bound to
/// its own variables; the refinement stage only ever sees a detached copy of
/// the coarse output.
pub struct CascadeTrainer {
	coarse: EncoderDecoder,
	refine: EncoderDecoder,
	coarse_opt: AdamW,
	refine_opt: AdamW,
	context: ComputeContext,
	config: TrainingConfig,
	global_step: usize,
	show_progress: bool,
}

impl CascadeTrainer {
	pub fn new(
		coarse: EncoderDecoder,
		refine: EncoderDecoder,
		context: &ComputeContext,
		config: TrainingConfig,
	) -> Result<Self> {
		config.validate()?;
		context.ensure_same(coarse.context(), "Coarse network")?;
		context.ensure_same(refine.context(), "Refinement network")?;
		if coarse.stage() != Stage::Coarse || refine.stage() != Stage::Refinement {
			return Err(ReflectionError::Configuration(format!(
				"Expected a coarse and a refinement network, got {} and {}",
				coarse.stage(),
				refine.stage()
			)));
		}

		let coarse_opt = AdamW::new(coarse.parameters().to_vec(), adam_params(&config))?;
		let refine_opt = AdamW::new(refine.parameters().to_vec(), adam_params(&config))?;

		Ok(CascadeTrainer {
			coarse,
			refine,
			coarse_opt,
			refine_opt,
			context: context.clone(),
			config,
			global_step: 0,
			show_progress: true,
		})
	}

	pub fn with_progress(mut self, show: bool) -> Self {
		self.show_progress = show;
		self
	}

	pub fn coarse(&self) -> &EncoderDecoder {
		&self.coarse
	}

	pub fn refine(&self) -> &EncoderDecoder {
		&self.refine
	}

	pub fn config(&self) -> &TrainingConfig {
		&self.config
	}

	pub fn global_step(&self) -> usize {
		self.global_step
	}

	pub fn into_networks(self) -> (EncoderDecoder, EncoderDecoder) {
		(self.coarse, self.refine)
	}

	/// One update of the coarse network. Returns its loss and its output, still
	/// attached to the coarse graph.
	pub fn coarse_step(&mut self, reflected: &Tensor, clear: &Tensor) -> Result<(f32, Tensor)> {
		self.coarse.train();
		let fake = self.coarse.forward(reflected)?;
		let loss = loss::mse(&fake, clear)?;
		update(&mut self.coarse_opt, &self.coarse, &loss)?;
		Ok((scalar(&loss)?, fake))
	}

	/// Refinement loss on a detached copy of `fake`.
	pub(crate) fn refine_loss(&mut self, fake: &Tensor, clear: &Tensor) -> Result<Tensor> {
		self.refine.train();
		let refined = self.refine.forward(&fake.detach())?;
		Ok(loss::mse(&refined, clear)?)
	}

	/// One update of the refinement network. Gradients stop at `fake`.
	pub fn refine_step(&mut self, fake: &Tensor, clear: &Tensor) -> Result<f32> {
		let loss = self.refine_loss(fake, clear)?;
		update(&mut self.refine_opt, &self.refine, &loss)?;
		scalar(&loss)
	}

	pub fn train_step(&mut self, batch: &Batch) -> Result<StepLosses> {
		let reflected = self.context.tensor(&batch.reflected)?;
		let clear = self.context.tensor(&batch.clear)?;
		let (coarse, fake) = self.coarse_step(&reflected, &clear)?;
		let refine = self.refine_step(&fake, &clear)?;
		self.global_step += 1;
		Ok(StepLosses { coarse, refine })
	}

	/// Runs every configured epoch over `loader`; any batch error aborts the run.
	pub fn fit(&mut self, loader: &BatchLoader) -> Result<TrainingReport> {
		if loader.dataset().is_empty() {
			return Err(ReflectionError::Configuration("Training dataset is empty".into()));
		}

		let mut report = TrainingReport {
			started_at: Utc::now().to_rfc3339(),
			..TrainingReport::default()
		};
		info!(
			"Training {} + {} parameters for {} epochs of {} batches on {:?}",
			self.coarse.parameter_count(),
			self.refine.parameter_count(),
			self.config.epochs,
			loader.batches_per_epoch(),
			self.context
		);

		for epoch in 0..self.config.epochs {
			let span = tracing::info_span!("epoch", epoch);
			let _entered = span.enter();

			let bar = create_progress_bar(loader.batches_per_epoch() as u64, &format!("epoch {}", epoch));
			if !self.show_progress {
				bar.set_draw_target(indicatif::ProgressDrawTarget::hidden());
			}

			let (mut coarse_total, mut refine_total, mut steps) = (0.0f64, 0.0f64, 0usize);
			for (step, batch) in loader.epoch(epoch).enumerate() {
				let batch = batch?;
				let losses = self.train_step(&batch)?;
				coarse_total += losses.coarse as f64;
				refine_total += losses.refine as f64;
				steps += 1;
				bar.inc(1);

				if step % self.config.log_interval == 0 {
					let record = ProgressRecord {
						epoch,
						step,
						global_step: self.global_step - 1,
						coarse_loss: losses.coarse,
						refine_loss: losses.refine,
					};
					info!(
						"epoch {}\tstep {}\tcoarse loss: {:.6}\trefine loss: {:.6}",
						epoch, step, record.coarse_loss, record.refine_loss
					);
					report.records.push(record);
				}
			}
			bar.finish_and_clear();

			let summary = EpochSummary {
				epoch,
				steps,
				mean_coarse_loss: (coarse_total / steps.max(1) as f64) as f32,
				mean_refine_loss: (refine_total / steps.max(1) as f64) as f32,
			};
			debug!("{:?}", summary);
			report.epochs.push(summary);
		}

		report.total_steps = self.global_step;
		report.finished_at = Utc::now().to_rfc3339();
		info!("Training finished after {} steps", self.global_step);
		Ok(report)
	}
}

fn adam_params(config: &TrainingConfig) -> ParamsAdamW {
	ParamsAdamW {
		lr: config.learning_rate as f64,
		beta1: config.beta1 as f64,
		beta2: config.beta2 as f64,
		eps: ADAM_EPSILON as f64,
		weight_decay: 0.0,
	}
}

/// Backpropagates `loss` and steps `optimizer`, which must belong to `network`.
fn update(optimizer: &mut AdamW, network: &EncoderDecoder, loss: &Tensor) -> Result<()> {
	let grads = loss.backward()?;
	if network.parameters().iter().all(|var| grads.get(var).is_none()) {
		return Err(ReflectionError::Gradient(format!(
			"Loss does not depend on any parameter of {} network {}",
			network.stage(),
			network.id()
		)));
	}
	optimizer.step(&grads)?;
	Ok(())
}
