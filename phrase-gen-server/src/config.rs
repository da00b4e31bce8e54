use std::path::PathBuf;

use clap::Parser;
use phrase_gen_core::ChainConfig;
use phrase_gen_core::config::{DEFAULT_ERROR_CAPACITY, DEFAULT_INPUT_CAPACITY, DEFAULT_MAX_WORDS};

/// Command-line and environment configuration of the server.
#[derive(Parser, Debug)]
#[command(name = "phrase-gen-server", version, about = "Serve sentences generated from a quote corpus")]
pub struct ServerArgs {
	/// Corpus file: a JSON quote archive or plain text, one quote per line
	#[arg(short, long, env = "PHRASE_GEN_FILE")]
	pub file: PathBuf,

	/// Snapshot file (defaults to the corpus path with a `.bin` extension)
	#[arg(short, long, env = "PHRASE_GEN_SNAPSHOT")]
	pub snapshot: Option<PathBuf>,

	/// Address to bind
	#[arg(long, env = "PHRASE_GEN_HOST", default_value = "127.0.0.1")]
	pub host: String,

	/// Port to bind
	#[arg(short, long, env = "PHRASE_GEN_PORT", default_value_t = 5000)]
	pub port: u16,

	/// Ingestion workers, 0 for one per core
	#[arg(short, long, default_value_t = 0)]
	pub workers: usize,

	/// Maximum number of words in a generated sentence
	#[arg(long, default_value_t = DEFAULT_MAX_WORDS)]
	pub max_words: usize,

	/// Log filter used when RUST_LOG is not set
	#[arg(long, env = "PHRASE_GEN_LOG", default_value = "info")]
	pub log_level: String,
}

impl ServerArgs {
	pub fn chain_config(&self) -> ChainConfig {
		ChainConfig {
			workers: self.workers,
			input_capacity: DEFAULT_INPUT_CAPACITY,
			error_capacity: DEFAULT_ERROR_CAPACITY,
			max_words: self.max_words,
		}
	}
}
