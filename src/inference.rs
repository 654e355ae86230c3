use crate::constants::file::{COARSE_IMAGE, INPUT_IMAGE, REFINED_IMAGE};
use crate::device::ComputeContext;
use crate::error::{ReflectionError, Result};
use crate::image_io::{ComparisonRenderer, ImageIo};
use crate::network::{EncoderDecoder, Stage};
use crate::psnr::mse_and_psnr;
use crate::tensor::to_array4;
use crate::transform::ImageTransform;
use log::info;
use ndarray::{Array3, Array4, Axis};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Input, coarse and refined images of one run, denormalized to `[0, 1]`.
#[derive(Debug, Clone)]
pub struct CascadeOutput {
	pub input: Array3<f32>,
	pub coarse: Array3<f32>,
	pub refined: Array3<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageQuality {
	pub mse: f32,
	pub psnr: f32,
}

/// How close each image of a run is to a known clear image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
	pub input: ImageQuality,
	pub coarse: ImageQuality,
	pub refined: ImageQuality,
}

/// Runs a trained cascade on single images in evaluation mode.
pub struct CascadePipeline {
	coarse: EncoderDecoder,
	refine: EncoderDecoder,
	transform: ImageTransform,
	io: Arc<dyn ImageIo>,
}

impl CascadePipeline {
	pub fn new(
		mut coarse: EncoderDecoder,
		mut refine: EncoderDecoder,
		transform: ImageTransform,
		io: Arc<dyn ImageIo>,
		context: &ComputeContext,
	) -> Result<Self> {
		context.ensure_same(coarse.context(), "Coarse network")?;
		context.ensure_same(refine.context(), "Refinement network")?;
		if coarse.stage() != Stage::Coarse || refine.stage() != Stage::Refinement {
			return Err(ReflectionError::Configuration(format!(
				"Expected a coarse and a refinement network, got {} and {}",
				coarse.stage(),
				refine.stage()
			)));
		}
		coarse.eval();
		refine.eval();
		Ok(CascadePipeline {
			coarse,
			refine,
			transform,
			io,
		})
	}

	pub fn transform(&self) -> &ImageTransform {
		&self.transform
	}

	/// Removes reflections from a normalized `[3, H, W]` tensor.
	pub fn run_tensor(&self, input: &Array3<f32>) -> Result<CascadeOutput> {
		let (c, h, w) = input.dim();
		let batch = Array4::from_shape_vec((1, c, h, w), input.iter().cloned().collect())?;
		let batch = self.coarse.context().tensor(&batch)?;
		let fake = self.coarse.infer(&batch)?;
		let refined = self.refine.infer(&fake)?;

		Ok(CascadeOutput {
			input: self.transform.denormalize(input),
			coarse: self.transform.denormalize(&first(to_array4(&fake)?)),
			refined: self.transform.denormalize(&first(to_array4(&refined)?)),
		})
	}

	pub fn run(&self, path: &Path) -> Result<CascadeOutput> {
		let image = self.io.decode(path)?;
		let output = self.run_tensor(&self.transform.apply(&image)?)?;
		info!("Processed {}", path.display());
		Ok(output)
	}

	/// Writes `input.png`, `coarse.png` and `refined.png` into `dir`.
	pub fn persist(&self, output: &CascadeOutput, dir: &Path) -> Result<Vec<PathBuf>> {
		std::fs::create_dir_all(dir)?;
		let mut written = Vec::with_capacity(3);
		for (name, tensor) in &[
			(INPUT_IMAGE, &output.input),
			(COARSE_IMAGE, &output.coarse),
			(REFINED_IMAGE, &output.refined),
		] {
			let path = dir.join(name);
			self.io.encode(&crate::image_io::tensor_to_image(tensor)?, &path)?;
			written.push(path);
		}
		Ok(written)
	}

	/// Renders input, coarse and refined left to right into one image.
	pub fn render_comparison(
		&self,
		output: &CascadeOutput,
		renderer: &dyn ComparisonRenderer,
		path: &Path,
	) -> Result<()> {
		renderer.render(&[&output.input, &output.coarse, &output.refined], path)
	}

	/// Compares every image of `output` against the clear image at `reference`.
	pub fn quality(&self, output: &CascadeOutput, reference: &Path) -> Result<QualityReport> {
		let reference = self
			.transform
			.denormalize(&self.transform.apply(&self.io.decode(reference)?)?);
		let measure = |image: &Array3<f32>| {
			let (mse, psnr) = mse_and_psnr(image.view(), reference.view());
			ImageQuality { mse, psnr }
		};
		Ok(QualityReport {
			input: measure(&output.input),
			coarse: measure(&output.coarse),
			refined: measure(&output.refined),
		})
	}
}

fn first(batch: Array4<f32>) -> Array3<f32> {
	batch.subview(Axis(0), 0).to_owned()
}
