use crate::constants::file::{CHECKPOINT_EXTENSION, COARSE_CHECKPOINT, REFINE_CHECKPOINT};
use crate::device::ComputeContext;
use crate::error::{ReflectionError, Result};
use crate::network::{EncoderDecoder, Stage};
use log::info;
use crate::utils::file_io::{create_dir_all, read_network, write_file_bytes};
use std::path::{Path, PathBuf};

/// Writes one network to `path` in the compressed checkpoint format.
pub fn save(network: &EncoderDecoder, path: &Path, quantise: bool) -> Result<()> {
	let bytes = crate::network_to_bytes(network.to_description()?, quantise)?;
	write_file_bytes(path, &bytes)
}

/// Reads one network from `path` onto `context`.
pub fn load(path: &Path, context: &ComputeContext) -> Result<EncoderDecoder> {
	EncoderDecoder::from_description(read_network(path)?, context)
}

/// Names and places the checkpoint files of both stages in one directory.
pub struct CheckpointManager {
	directory: PathBuf,
	quantise: bool,
}

impl CheckpointManager {
	pub fn new(directory: impl AsRef<Path>, quantise: bool) -> Self {
		Self {
			directory: directory.as_ref().to_path_buf(),
			quantise,
		}
	}

	pub fn directory(&self) -> &Path {
		&self.directory
	}

	pub fn path_for(&self, stage: Stage) -> PathBuf {
		let name = match stage {
			Stage::Coarse => COARSE_CHECKPOINT,
			Stage::Refinement => REFINE_CHECKPOINT,
		};
		self.directory.join(name).with_extension(CHECKPOINT_EXTENSION)
	}

	pub fn save(&self, network: &EncoderDecoder) -> Result<PathBuf> {
		create_dir_all(&self.directory)?;
		let path = self.path_for(network.stage());
		save(network, &path, self.quantise)?;
		info!("Saved {} network to {}", network.stage(), path.display());
		Ok(path)
	}

	pub fn save_cascade(&self, coarse: &EncoderDecoder, refine: &EncoderDecoder) -> Result<()> {
		self.save(coarse)?;
		self.save(refine)?;
		Ok(())
	}

	/// Loads the network of `stage`, rejecting a file that holds the other stage.
	pub fn load(&self, stage: Stage, context: &ComputeContext) -> Result<EncoderDecoder> {
		let path = self.path_for(stage);
		let network = load(&path, context)?;
		if network.stage() != stage {
			return Err(ReflectionError::Configuration(format!(
				"{} holds a {} network, expected {}",
				path.display(),
				network.stage(),
				stage
			)));
		}
		Ok(network)
	}

	pub fn load_cascade(&self, context: &ComputeContext) -> Result<(EncoderDecoder, EncoderDecoder)> {
		Ok((self.load(Stage::Coarse, context)?, self.load(Stage::Refinement, context)?))
	}
}
