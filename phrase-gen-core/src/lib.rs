//! Word-level Markov chain sentence generation.
//!
//! This crate provides:
//! - A thread-safe first-order transition table keyed by the preceding word
//! - Concurrent ingestion of raw text lines through a bounded worker pool
//! - A probability pass turning observation counts into percentage weights
//! - A weighted random walk generating new sentences
//! - Snapshot export/import and a quote-archive corpus reader

/// Chain engine: cells, table, pipeline and generator.
pub mod model;

/// Corpus readers producing plain-text lines.
pub mod corpus;

/// Runtime configuration passed to the pipeline and the generator.
pub mod config;

/// Error types.
pub mod error;

/// File and path helpers.
///
/// Not exposed
pub(crate) mod io;

pub use config::ChainConfig;
pub use error::{ChainError, CorpusError};
pub use model::cell::{Cell, CellRole, END_TOKEN, START_TOKEN};
pub use model::chain::Chain;
pub use model::generator::Generator;
pub use model::pipeline::{IngestChannels, IngestReport, Pipeline};
