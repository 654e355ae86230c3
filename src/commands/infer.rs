use super::parse_context;
use crate::config::TransformConfig;
use crate::config_file::DeviceConfigSection;
use crate::constants::file::COMPARISON_IMAGE;
use crate::error::{ReflectionError, Result};
use crate::image_io::{PngImageIo, SideBySideRenderer};
use crate::inference::CascadePipeline;
use crate::logging::create_spinner;
use crate::training::CheckpointManager;
use crate::transform::ImageTransform;
use crate::validation;
use clap::ArgMatches;
use log::info;
use std::path::Path;
use std::sync::Arc;

pub fn infer(app_m: &ArgMatches) -> Result<()> {
	let input_file = app_m
		.value_of("INPUT_FILE")
		.ok_or_else(|| ReflectionError::InvalidParameter("No input file given".into()))?;
	let checkpoint_folder = app_m
		.value_of("CHECKPOINT_FOLDER")
		.ok_or_else(|| ReflectionError::InvalidParameter("No checkpoint folder given".into()))?;
	let output_folder = app_m
		.value_of("OUTPUT_FOLDER")
		.ok_or_else(|| ReflectionError::InvalidParameter("No output folder given".into()))?;

	let input_file = validation::validate_input_file(input_file)?;
	validation::validate_image_extension(&input_file)?;
	let checkpoint_folder = validation::validate_directory(checkpoint_folder)?;
	let output_folder = validation::prepare_output_directory(output_folder)?;

	let mut transform_config = TransformConfig::default();
	if let Some(size) = crate::parse_param!(app_m, "IMAGE_SIZE", usize, "a positive integer") {
		transform_config.image_size = validation::validate_image_size(size)?;
	}
	let transform = ImageTransform::new(transform_config)?;

	let context = parse_context(app_m, &DeviceConfigSection::default())?;
	let (coarse, refine) = CheckpointManager::new(&checkpoint_folder, false).load_cascade(&context)?;
	let pipeline = CascadePipeline::new(coarse, refine, transform, Arc::new(PngImageIo), &context)?;

	let spinner = create_spinner("Removing reflections");
	let output = pipeline.run(&input_file);
	spinner.finish_and_clear();
	let output = output?;
	for path in pipeline.persist(&output, &output_folder)? {
		info!("Wrote {}", path.display());
	}

	if app_m.is_present("COMPARE") {
		let path = output_folder.join(COMPARISON_IMAGE);
		pipeline.render_comparison(&output, &SideBySideRenderer::default(), &path)?;
		info!("Wrote {}", path.display());
	}

	if let Some(reference) = app_m.value_of("REFERENCE") {
		let report = pipeline.quality(&output, Path::new(reference))?;
		println!("image\tMSE\tPSNR (dB)");
		println!("input\t{:.6}\t{:.3}", report.input.mse, report.input.psnr);
		println!("coarse\t{:.6}\t{:.3}", report.coarse.mse, report.coarse.psnr);
		println!("refined\t{:.6}\t{:.3}", report.refined.mse, report.refined.psnr);
	}

	Ok(())
}
