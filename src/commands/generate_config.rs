use crate::config_file::TrainingConfigFile;
use crate::error::{ReflectionError, Result};
use crate::utils::file_io::write_file_bytes;
use clap::ArgMatches;
use log::info;
use std::path::Path;

pub fn generate_config(app_m: &ArgMatches) -> Result<()> {
    let output_path = app_m
        .value_of("OUTPUT_FILE")
        .unwrap_or("training_config.toml");

    let format = app_m.value_of("FORMAT").unwrap_or("toml");
    let example = app_m.is_present("EXAMPLE");

    if Path::new(output_path).exists() && !app_m.is_present("FORCE") {
        return Err(ReflectionError::InvalidInput(format!(
            "File {} already exists. Use --force to overwrite",
            output_path
        )));
    }

    if example {
        if format != "toml" {
            return Err(ReflectionError::InvalidParameter(
                "Example configuration with comments is only available in TOML format".to_string()
            ));
        }

        write_file_bytes(output_path, TrainingConfigFile::create_example_toml().as_bytes())?;
        info!("Generated example configuration file with comments: {}", output_path);
    } else {
        let config = TrainingConfigFile::generate_default();

        match format {
            "toml" => {
                config.to_toml_file(output_path)?;
                info!("Generated TOML configuration file: {}", output_path);
            }
            "json" => {
                config.to_json_file(output_path)?;
                info!("Generated JSON configuration file: {}", output_path);
            }
            _ => {
                return Err(ReflectionError::InvalidParameter(format!(
                    "Unknown format: {}. Use 'toml' or 'json'",
                    format
                )));
            }
        }
    }

    info!("You can now edit the configuration file and use it with:");
    info!("  dereflect train --config {} REFLECTED_FOLDER CLEAR_FOLDER OUTPUT_FOLDER", output_path);

    Ok(())
}
