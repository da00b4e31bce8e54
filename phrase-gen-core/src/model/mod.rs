//! The chain engine.
//!
//! - Cells and their roles (`Cell`, `CellRole`)
//! - The shared transition table and its probability pass (`Chain`)
//! - Line tokenization and ingestion, optionally on a worker pool (`Pipeline`)
//! - The weighted random walk producing sentences (`Generator`)

/// A single observed transition outcome and the sentinel tokens.
pub mod cell;

/// Transition table guarded by a single reader/writer lock.
///
/// Owns insertion, the probability pass, weighted draws, reset and
/// snapshot export/import.
pub mod chain;

/// Weighted walk from the start sentinel to an end cell.
pub mod generator;

/// Line ingestion, synchronous or through a bounded worker pool.
pub mod pipeline;

/// Pattern-based splitting of lines into word and punctuation tokens.
pub mod tokenizer;
