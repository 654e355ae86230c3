use super::parse_context;
use crate::config::{NetworkConfig, TrainingConfig};
use crate::config_file::TrainingConfigFile;
use crate::constants::file::REPORT_FILE;
use crate::error::{ReflectionError, Result};
use crate::image_io::PngImageIo;
use crate::network::EncoderDecoder;
use crate::training::{BatchLoader, CascadeTrainer, CheckpointManager, PairedImageFolder};
use crate::transform::ImageTransform;
use crate::utils::error_helpers::InvalidParameterMapper;
use crate::validation;
use clap::ArgMatches;
use log::info;
use std::sync::Arc;

pub fn train(app_m: &ArgMatches) -> Result<()> {
	let config_file = load_config_file(app_m)?;

	let network_config = config_file.to_network_config();
	let training_config = config_file.to_training_config()?;
	let transform = ImageTransform::new(config_file.to_transform_config()?)?;
	network_config.validate()?;

	let reflected_folder = app_m
		.value_of("REFLECTED_FOLDER")
		.ok_or_else(|| ReflectionError::InvalidParameter("No reflected folder specified".into()))?;
	let clear_folder = app_m
		.value_of("CLEAR_FOLDER")
		.ok_or_else(|| ReflectionError::InvalidParameter("No clear folder specified".into()))?;
	let output_folder = app_m
		.value_of("OUTPUT_FOLDER")
		.ok_or_else(|| ReflectionError::InvalidParameter("No output folder specified".into()))?;

	let reflected_folder = validation::validate_directory(reflected_folder)?;
	let clear_folder = validation::validate_directory(clear_folder)?;
	let output_folder = validation::prepare_output_directory(output_folder)?;

	print_training_info(&network_config, &training_config, &transform);

	let context = parse_context(app_m, &config_file.device)?;
	let coarse = EncoderDecoder::coarse(&context, network_config.clone())?;
	let refine = EncoderDecoder::refinement(
		&context,
		NetworkConfig {
			batch_norm: false,
			..network_config
		},
	)?;

	let dataset = PairedImageFolder::new(&reflected_folder, &clear_folder, transform, Arc::new(PngImageIo))?;
	let loader = BatchLoader::new(
		Arc::new(dataset),
		context.clone(),
		training_config.batch_size,
		training_config.prefetch,
		training_config.seed,
	)?;

	let quantise = training_config.quantise;
	let mut trainer = CascadeTrainer::new(coarse, refine, &context, training_config)?;
	let report = trainer.fit(&loader)?;

	let (coarse, refine) = trainer.into_networks();
	CheckpointManager::new(&output_folder, quantise).save_cascade(&coarse, &refine)?;

	let report_path = output_folder.join(REPORT_FILE);
	report.write_json(&report_path)?;
	info!("Wrote training report to {}", report_path.display());

	Ok(())
}

/// Reads `--config` when given, then applies every explicit flag on top.
fn load_config_file(app_m: &ArgMatches) -> Result<TrainingConfigFile> {
	let mut config = match app_m.value_of("CONFIG_FILE") {
		Some(path) => {
			info!("Loading configuration from {}", path);
			TrainingConfigFile::from_file(path)?
		}
		None => TrainingConfigFile::default(),
	};

	if let Some(epochs) = crate::parse_param!(app_m, "EPOCHS", usize, "a positive integer") {
		config.training.epochs = epochs;
	}
	if let Some(batch_size) = crate::parse_param!(app_m, "BATCH_SIZE", usize, "a positive integer") {
		validation::validate_batch_size(batch_size)?;
		config.training.batch_size = batch_size;
	}
	if let Some(rate) = app_m.value_of("LEARNING_RATE") {
		config.training.learning_rate = validation::validate_positive_float(rate, "Learning rate")?;
	}
	if let Some(interval) = app_m.value_of("LOG_INTERVAL") {
		config.training.log_interval = validation::validate_positive_int(interval, "Log interval")?;
	}
	if let Some(size) = crate::parse_param!(app_m, "IMAGE_SIZE", usize, "a positive integer") {
		config.data.image_size = validation::validate_image_size(size)?;
	}
	if let Some(width) = app_m.value_of("WIDTH") {
		config.network.base_width = validation::validate_positive_int(width, "Width")?;
	}
	if let Some(seed) = app_m.value_of("SEED") {
		let seed = seed.parse::<u64>().map_invalid_param("Seed", "an unsigned integer")?;
		config.network.seed = seed;
		config.training.seed = seed;
	}
	if app_m.is_present("QUANTISE") {
		config.training.quantise = true;
	}

	Ok(config)
}

fn print_training_info(network: &NetworkConfig, training: &TrainingConfig, transform: &ImageTransform) {
	info!("Training with:");
	info!("  Base width: {}", network.base_width);
	info!("  Image size: {}x{}", transform.size(), transform.size());
	info!("  Learning rate: {}", training.learning_rate);
	info!("  Betas: ({}, {})", training.beta1, training.beta2);
	info!("  Batch size: {}", training.batch_size);
	info!("  Epochs: {}", training.epochs);
	info!("  Log interval: {}", training.log_interval);
	info!("  Seed: {}", training.seed);
	if training.quantise {
		info!("  Quantising checkpoints");
	}
}
