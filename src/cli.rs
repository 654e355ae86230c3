use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};

pub fn build_cli() -> ArgMatches<'static> {
	build_app().get_matches()
}

pub fn build_app() -> App<'static, 'static> {
	App::new("dereflect")
		.version(env!("CARGO_PKG_VERSION"))
		.author("ktheindifferent")
		.about("A two-stage convolutional network trained to remove reflections from photos")
		.settings(&[
			AppSettings::SubcommandRequiredElseHelp,
			AppSettings::VersionlessSubcommands,
		])
		.arg(build_log_format_arg())
		.arg(build_log_dir_arg())
		.subcommand(build_train_subcommand())
		.subcommand(build_infer_subcommand())
		.subcommand(build_psnr_subcommand())
		.subcommand(build_generate_config_subcommand())
}

fn build_log_format_arg() -> Arg<'static, 'static> {
	Arg::with_name("LOG_FORMAT")
		.long("log_format")
		.value_name("FORMAT")
		.help("Use structured tracing output instead of plain logs")
		.possible_values(&["compact", "pretty", "json"])
		.global(true)
		.empty_values(false)
}

fn build_log_dir_arg() -> Arg<'static, 'static> {
	Arg::with_name("LOG_DIR")
		.long("log_dir")
		.value_name("DIRECTORY")
		.help("Also write JSON logs to a daily rolling file in this directory")
		.global(true)
		.empty_values(false)
}

fn build_train_subcommand() -> App<'static, 'static> {
	SubCommand::with_name("train")
		.about("Train the coarse and refinement networks on paired images")
		.arg(
			Arg::with_name("REFLECTED_FOLDER")
				.required(true)
				.index(1)
				.help("Folder of photos with reflections"),
		)
		.arg(
			Arg::with_name("CLEAR_FOLDER")
				.required(true)
				.index(2)
				.help("Folder of the matching clear photos, paired by sorted file name order"),
		)
		.arg(
			Arg::with_name("OUTPUT_FOLDER")
				.required(true)
				.index(3)
				.help("Checkpoints and the training report are (over)written here"),
		)
		.arg(build_config_file_arg())
		.arg(build_epochs_arg())
		.arg(build_batch_size_arg())
		.arg(build_learning_rate_arg())
		.arg(build_log_interval_arg())
		.arg(build_image_size_arg())
		.arg(build_width_arg())
		.arg(build_seed_arg())
		.arg(build_device_arg())
		.arg(build_threads_arg())
		.arg(build_quantise_arg())
}

fn build_infer_subcommand() -> App<'static, 'static> {
	SubCommand::with_name("infer")
		.about("Remove reflections from one image with trained checkpoints")
		.arg(
			Arg::with_name("INPUT_FILE")
				.required(true)
				.index(1)
				.help("Image to process"),
		)
		.arg(
			Arg::with_name("CHECKPOINT_FOLDER")
				.required(true)
				.index(2)
				.help("Folder holding the coarse and refine checkpoints"),
		)
		.arg(
			Arg::with_name("OUTPUT_FOLDER")
				.required(true)
				.index(3)
				.help("input.png, coarse.png and refined.png are (over)written here"),
		)
		.arg(
			Arg::with_name("COMPARE")
				.long("compare")
				.help("Also write comparison.png with the three images side by side"),
		)
		.arg(
			Arg::with_name("REFERENCE")
				.long("reference")
				.value_name("CLEAR_FILE")
				.help("Report MSE and PSNR of every stage against this clear image")
				.empty_values(false),
		)
		.arg(build_image_size_arg())
		.arg(build_device_arg())
		.arg(build_threads_arg())
}

fn build_psnr_subcommand() -> App<'static, 'static> {
	SubCommand::with_name("psnr")
		.about("Prints the PSNR of an image against a reference image")
		.arg(
			Arg::with_name("IMAGE1")
				.required(true)
				.index(1)
				.help("PSNR is calculated using the difference between this image and IMAGE2"),
		)
		.arg(
			Arg::with_name("IMAGE2")
				.required(true)
				.index(2)
				.help("PSNR is calculated using the difference between this image and IMAGE1"),
		)
}

fn build_generate_config_subcommand() -> App<'static, 'static> {
	SubCommand::with_name("generate-config")
		.about("Write a training configuration file with default values")
		.arg(
			Arg::with_name("OUTPUT_FILE")
				.index(1)
				.help("Configuration file to write. Default: training_config.toml"),
		)
		.arg(
			Arg::with_name("FORMAT")
				.long("format")
				.value_name("FORMAT")
				.possible_values(&["toml", "json"])
				.help("File format. Default: toml"),
		)
		.arg(
			Arg::with_name("EXAMPLE")
				.long("example")
				.help("Write a commented example (TOML only)"),
		)
		.arg(
			Arg::with_name("FORCE")
				.long("force")
				.help("Overwrite an existing file"),
		)
}

fn build_config_file_arg() -> Arg<'static, 'static> {
	Arg::with_name("CONFIG_FILE")
		.long("config")
		.value_name("FILE")
		.help("TOML or JSON configuration file; explicit flags override its values")
		.empty_values(false)
}

fn build_epochs_arg() -> Arg<'static, 'static> {
	Arg::with_name("EPOCHS")
		.long("epochs")
		.value_name("N")
		.help("Passes over the dataset. Default: 200")
		.empty_values(false)
}

fn build_batch_size_arg() -> Arg<'static, 'static> {
	Arg::with_name("BATCH_SIZE")
		.long("batch_size")
		.value_name("N")
		.help("Image pairs per batch. Default: 16")
		.empty_values(false)
}

fn build_learning_rate_arg() -> Arg<'static, 'static> {
	Arg::with_name("LEARNING_RATE")
		.short("r")
		.long("rate")
		.value_name("LR")
		.help("Learning rate used by both Adam optimizers. Default: 0.0002")
		.empty_values(false)
}

fn build_log_interval_arg() -> Arg<'static, 'static> {
	Arg::with_name("LOG_INTERVAL")
		.long("log_interval")
		.value_name("K")
		.help("Log losses every K batches. Default: 10")
		.empty_values(false)
}

fn build_image_size_arg() -> Arg<'static, 'static> {
	Arg::with_name("IMAGE_SIZE")
		.long("size")
		.value_name("PX")
		.help("Images are resized to PX x PX, a multiple of 4. Default: 256")
		.empty_values(false)
}

fn build_width_arg() -> Arg<'static, 'static> {
	Arg::with_name("WIDTH")
		.short("w")
		.long("width")
		.value_name("CHANNELS")
		.help("Channels after the first encoder stage. Default: 64")
		.empty_values(false)
}

fn build_seed_arg() -> Arg<'static, 'static> {
	Arg::with_name("SEED")
		.long("seed")
		.value_name("S")
		.help("Seed for initialisation and shuffling")
		.empty_values(false)
}

fn build_device_arg() -> Arg<'static, 'static> {
	Arg::with_name("DEVICE")
		.long("device")
		.value_name("DEVICE")
		.possible_values(&["cpu", "cuda", "metal"])
		.help("Preferred compute backend; unavailable accelerators fall back to the CPU. Default: cpu")
}

fn build_threads_arg() -> Arg<'static, 'static> {
	Arg::with_name("THREADS")
		.long("threads")
		.value_name("N")
		.help("Worker threads. Default: one per core")
		.empty_values(false)
}

fn build_quantise_arg() -> Arg<'static, 'static> {
	Arg::with_name("QUANTISE")
		.short("q")
		.long("quantise")
		.help("Zero the 12 least significant bits of each parameter to shrink checkpoints")
}
