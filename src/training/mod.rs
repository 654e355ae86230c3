pub mod checkpoint;
pub mod data_loader;
pub mod dataset;
pub mod trainer;

pub use self::checkpoint::CheckpointManager;
pub use self::data_loader::{Batch, BatchLoader, EpochBatches};
pub use self::dataset::{list_images, PairedImageFolder, PairedSample};
pub use self::trainer::{CascadeTrainer, EpochSummary, ProgressRecord, StepLosses, TrainingReport};
