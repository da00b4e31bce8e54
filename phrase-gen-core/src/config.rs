use serde::{Deserialize, Serialize};

/// Capacity of the bounded queue feeding raw lines to the workers.
pub const DEFAULT_INPUT_CAPACITY: usize = 100;

/// Capacity of the bounded queue carrying ingestion errors back to the caller.
pub const DEFAULT_ERROR_CAPACITY: usize = 20;

/// Maximum number of tokens the generator appends before giving up on
/// reaching an end cell.
pub const DEFAULT_MAX_WORDS: usize = 45;

/// Runtime configuration shared by the pipeline and the generator.
///
/// Built once by the caller and handed to each component at construction,
/// there is no process-wide configuration.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ChainConfig {
	/// Number of ingestion workers. `0` means one per available core.
	pub workers: usize,

	/// Bounded capacity of the line queue (producer blocks when full).
	pub input_capacity: usize,

	/// Bounded capacity of the error queue (workers block when full).
	pub error_capacity: usize,

	/// Safety bound on generated sentence length.
	pub max_words: usize,
}

impl Default for ChainConfig {
	fn default() -> Self {
		Self {
			workers: 0,
			input_capacity: DEFAULT_INPUT_CAPACITY,
			error_capacity: DEFAULT_ERROR_CAPACITY,
			max_words: DEFAULT_MAX_WORDS,
		}
	}
}

impl ChainConfig {
	/// Returns the effective worker count, resolving `0` to the number of
	/// logical CPUs.
	pub fn resolved_workers(&self) -> usize {
		if self.workers == 0 {
			num_cpus::get().max(1)
		} else {
			self.workers
		}
	}
}
