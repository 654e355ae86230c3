extern crate dereflect_rust;
#[macro_use]
extern crate log;

use dereflect_rust::logging::{self, LogConfig, LogFormat};
use dereflect_rust::{cli, commands};
use std::path::PathBuf;

fn main() {
	let app_m = cli::build_cli();

	// Structured output only when asked for; plain env_logger lines otherwise.
	let _guard = if app_m.is_present("LOG_FORMAT") || app_m.is_present("LOG_DIR") {
		let config = LogConfig {
			format: app_m
				.value_of("LOG_FORMAT")
				.and_then(LogFormat::from_str)
				.unwrap_or(LogFormat::Compact),
			log_directory: app_m.value_of("LOG_DIR").map(PathBuf::from),
			..LogConfig::default()
		};
		match logging::init_logging(config) {
			Ok(guard) => guard,
			Err(err) => {
				eprintln!("Could not initialise logging: {}", err);
				std::process::exit(1);
			}
		}
	} else {
		logging::init_simple_logger();
		None
	};

	let result = match app_m.subcommand() {
		("train", Some(sub_m)) => commands::train(sub_m),
		("infer", Some(sub_m)) => commands::infer(sub_m),
		("psnr", Some(sub_m)) => commands::psnr(sub_m),
		("generate-config", Some(sub_m)) => commands::generate_config(sub_m),
		_ => Ok(()),
	};

	if let Err(err) = result {
		error!("Error: {}", err);
		std::process::exit(1);
	}
}
