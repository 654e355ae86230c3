pub mod generate_config;
pub mod infer;
pub mod psnr;
pub mod train;

pub use self::generate_config::generate_config;
pub use self::infer::infer;
pub use self::psnr::psnr;
pub use self::train::train;

use crate::config_file::DeviceConfigSection;
use crate::device::{ComputeBackend, ComputeContext};
use crate::error::Result;
use clap::ArgMatches;

/// Resolves the compute context once, letting `--device` and `--threads` override `defaults`.
fn parse_context(app_m: &ArgMatches, defaults: &DeviceConfigSection) -> Result<ComputeContext> {
	let backend = app_m.value_of("DEVICE").unwrap_or(defaults.backend.as_str());
	let threads = crate::parse_param!(app_m, "THREADS", usize, "a positive integer").or(defaults.threads);

	ComputeContext::detect(ComputeBackend::from_str(backend)?, threads)
}
