use thiserror::Error;

/// Errors produced by the chain, the ingestion pipeline and the generator.
///
/// Every variant is recoverable at the level of "this one line" or
/// "this one sentence": none of them should stop the process.
#[derive(Debug, Error)]
pub enum ChainError {
	/// The predecessor was never observed during ingestion.
	#[error("no cells recorded for predecessor {predecessor:?}")]
	NotFound { predecessor: String },

	/// The weighted draw did not land on any cell.
	///
	/// Happens when the probability pass was never run, or when rounding
	/// leaves the weights a hair under 100.
	#[error("weighted draw exhausted the cells of {predecessor:?}")]
	Exhausted { predecessor: String },

	/// A blank line was handed to the pipeline.
	#[error("empty input")]
	EmptyInput,

	/// `run_async` was called before `set_async`.
	#[error("async mode is not enabled")]
	AsyncDisabled,

	#[error("io error: {0}")]
	Io(#[from] std::io::Error),

	#[error("snapshot encoding error: {0}")]
	Snapshot(#[from] postcard::Error),

	#[error("json error: {0}")]
	Json(#[from] serde_json::Error),
}

/// Errors produced while reading a corpus file.
#[derive(Debug, Error)]
pub enum CorpusError {
	#[error("failed to read corpus: {0}")]
	Io(#[from] std::io::Error),

	#[error("failed to decode quote archive: {0}")]
	Decode(#[from] serde_json::Error),
}
