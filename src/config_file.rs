use crate::config::{NetworkConfig, TrainingConfig, TransformConfig};
use crate::constants::{io, network, training, transform};
use crate::error::{ReflectionError, Result};
use crate::utils::error_helpers::ParseErrorMapper;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Configuration structure for training parameters that can be loaded from a file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfigFile {
    /// Network architecture configuration
    #[serde(default)]
    pub network: NetworkConfigSection,

    /// Optimizer and schedule
    #[serde(default)]
    pub training: TrainingConfigSection,

    /// Input preprocessing
    #[serde(default)]
    pub data: DataConfigSection,

    /// Compute configuration
    #[serde(default)]
    pub device: DeviceConfigSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfigSection {
    /// Channels after the first encoder stage (default: 64)
    pub base_width: usize,

    /// Seed for parameter initialisation
    pub seed: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfigSection {
    /// Learning rate for both Adam optimizers (default: 0.0002)
    pub learning_rate: f32,

    /// Adam first moment decay (default: 0.5)
    pub beta1: f32,

    /// Adam second moment decay (default: 0.999)
    pub beta2: f32,

    /// Training batch size (default: 16)
    pub batch_size: usize,

    /// Number of passes over the dataset (default: 200)
    pub epochs: usize,

    /// Log losses every N batches (default: 10)
    pub log_interval: usize,

    /// Seed for the per-epoch shuffle
    pub seed: u64,

    /// Quantise weights to reduce file size (default: false)
    pub quantise: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfigSection {
    /// Images are resized to this square size (default: 256)
    pub image_size: u32,

    /// Normalization mean (default: 0.5)
    pub mean: f32,

    /// Normalization standard deviation (default: 0.5)
    pub std: f32,

    /// Batches decoded ahead of training (default: 2)
    pub prefetch: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfigSection {
    /// "cpu", "cuda" or "metal"; unavailable accelerators fall back to the CPU
    pub backend: String,

    /// Worker threads (optional, defaults to one per core)
    pub threads: Option<usize>,
}

impl Default for NetworkConfigSection {
    fn default() -> Self {
        Self {
            base_width: network::DEFAULT_BASE_WIDTH,
            seed: network::DEFAULT_SEED,
        }
    }
}

impl Default for TrainingConfigSection {
    fn default() -> Self {
        Self {
            learning_rate: training::DEFAULT_LEARNING_RATE,
            beta1: training::ADAM_BETA1,
            beta2: training::ADAM_BETA2,
            batch_size: training::DEFAULT_BATCH_SIZE,
            epochs: training::DEFAULT_EPOCHS,
            log_interval: training::DEFAULT_LOG_INTERVAL,
            seed: network::DEFAULT_SEED,
            quantise: false,
        }
    }
}

impl Default for DataConfigSection {
    fn default() -> Self {
        Self {
            image_size: transform::DEFAULT_IMAGE_SIZE,
            mean: transform::NORMALIZE_MEAN,
            std: transform::NORMALIZE_STD,
            prefetch: io::PREFETCH_BATCHES,
        }
    }
}

impl Default for DeviceConfigSection {
    fn default() -> Self {
        Self {
            backend: "cpu".to_string(),
            threads: None,
        }
    }
}

impl TrainingConfigFile {
    /// Load configuration from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;

        toml::from_str::<Self>(&contents).map_parse_err("Failed to parse TOML config")
    }

    /// Load configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;

        serde_json::from_str::<Self>(&contents).map_parse_err("Failed to parse JSON config")
    }

    /// Load a configuration file, picking the format from the extension
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ReflectionError::FileNotFound(path.to_path_buf()));
        }
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_file(path),
            _ => Self::from_toml_file(path),
        }
    }

    /// Save configuration to a TOML file
    pub fn to_toml_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| ReflectionError::Serialization(format!("Failed to serialize to TOML: {}", e)))?;

        fs::write(path, contents)?;
        Ok(())
    }

    /// Save configuration to a JSON file
    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| ReflectionError::Serialization(format!("Failed to serialize to JSON: {}", e)))?;

        fs::write(path, contents)?;
        Ok(())
    }

    /// Topology of the coarse network; the refinement network shares it without batch norm
    pub fn to_network_config(&self) -> NetworkConfig {
        NetworkConfig::builder()
            .base_width(self.network.base_width)
            .seed(self.network.seed)
            .build()
    }

    pub fn to_training_config(&self) -> Result<TrainingConfig> {
        let config = TrainingConfig::builder()
            .learning_rate(self.training.learning_rate)
            .beta1(self.training.beta1)
            .beta2(self.training.beta2)
            .batch_size(self.training.batch_size)
            .epochs(self.training.epochs)
            .log_interval(self.training.log_interval)
            .seed(self.training.seed)
            .prefetch(self.data.prefetch)
            .quantise(self.training.quantise)
            .build();
        config.validate()?;
        Ok(config)
    }

    pub fn to_transform_config(&self) -> Result<TransformConfig> {
        let config = TransformConfig {
            image_size: self.data.image_size,
            mean: self.data.mean,
            std: self.data.std,
        };
        config.validate()?;
        Ok(config)
    }

    /// Generate a default configuration file
    pub fn generate_default() -> Self {
        Self::default()
    }

    /// Create an example configuration file with comments
    pub fn create_example_toml() -> String {
        r#"# Reflection removal training configuration

[network]
# Channels after the first encoder stage; the bottleneck has twice as many
base_width = 64

# Seed for parameter initialisation
seed = 24301

[training]
# Learning rate for both Adam optimizers
learning_rate = 0.0002

# Adam moment decay rates
beta1 = 0.5
beta2 = 0.999

# Number of image pairs per batch
batch_size = 16

# Passes over the dataset
epochs = 200

# Log losses every N batches
log_interval = 10

# Seed for the per-epoch shuffle
seed = 24301

# Quantise weights to reduce checkpoint size
quantise = false

[data]
# Images are resized to a square of this size (multiple of 4)
image_size = 256

# Normalization applied after scaling pixels to [0, 1]
mean = 0.5
std = 0.5

# Batches decoded ahead of the training loop
prefetch = 2

[device]
# cpu, cuda or metal; accelerators fall back to the CPU when unavailable
backend = "cpu"

# Worker threads (optional)
# threads = 8
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = TrainingConfigFile::generate_default();
        assert_eq!(config.network.base_width, 64);
        assert_eq!(config.training.learning_rate, 0.0002);
        assert_eq!(config.data.image_size, 256);
        assert_eq!(config.device.backend, "cpu");
    }

    #[test]
    fn test_example_matches_defaults() {
        let parsed: TrainingConfigFile = toml::from_str(&TrainingConfigFile::create_example_toml()).unwrap();
        assert_eq!(parsed, TrainingConfigFile::generate_default());
    }

    #[test]
    fn test_to_training_config() {
        let config_file = TrainingConfigFile::generate_default();
        let training_config = config_file.to_training_config().unwrap();
        assert_eq!(training_config, TrainingConfig::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config_file = TrainingConfigFile::generate_default();
        config_file.training.batch_size = 0;
        assert!(config_file.to_training_config().is_err());

        config_file.data.image_size = 30;
        assert!(config_file.to_transform_config().is_err());
    }

    #[test]
    fn test_save_load_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = TrainingConfigFile::generate_default();
        config.device.threads = Some(3);
        config.to_toml_file(&path).unwrap();

        let loaded = TrainingConfigFile::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_save_load_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");

        let config = TrainingConfigFile::generate_default();
        config.to_json_file(&path).unwrap();

        let loaded = TrainingConfigFile::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let parsed: TrainingConfigFile = toml::from_str("[training]\nepochs = 3\n").unwrap();
        assert_eq!(parsed.training.epochs, 3);
        assert_eq!(parsed.training.batch_size, 16);
        assert_eq!(parsed.network, NetworkConfigSection::default());
    }
}
