use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::{debug, info, trace, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::cell::Cell;
use crate::error::ChainError;

/// Serializable content of a chain: the transition table and its record count.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
struct Table {
	/// Predecessor token to its observed cells, in insertion order.
	cells: HashMap<String, Vec<Cell>>,
	/// Cumulative number of accepted `add_cell` events.
	total_records: u64,
}

/// A first-order word chain.
///
/// The `Chain` maps each predecessor token to the list of cells observed
/// right after it. It is populated by the ingestion pipeline, finalized by
/// [`Chain::calculate_cells`] and then walked by the generator.
///
/// # Concurrency
/// The whole table sits behind a single `RwLock`: draws and lookups share
/// it, while insertion, the probability pass and reset take it exclusively.
/// All methods take `&self`, so a chain is meant to be shared through an
/// `Arc`.
///
/// # Invariants
/// - Every stored cell satisfies [`Cell::is_valid`]
/// - Within one predecessor, words are unique
/// - Cell order is insertion order and decides ties during a draw
#[derive(Debug, Default)]
pub struct Chain {
	table: RwLock<Table>,
	discarded: AtomicU64,
}

impl Chain {
	/// Creates an empty chain.
	pub fn new() -> Self {
		Self::default()
	}

	// Every critical section leaves the table consistent, so a poisoned
	// lock is still safe to use.
	fn read(&self) -> RwLockReadGuard<'_, Table> {
		self.table.read().unwrap_or_else(PoisonError::into_inner)
	}

	fn write(&self) -> RwLockWriteGuard<'_, Table> {
		self.table.write().unwrap_or_else(PoisonError::into_inner)
	}

	/// Records that `cell` followed `predecessor`.
	///
	/// - If a cell with the same word already exists for this predecessor,
	///   its count is increased by one.
	/// - Otherwise the cell is appended.
	///
	/// # Notes
	/// Invalid cells are dropped without error. They are counted in
	/// [`Chain::discarded`] so the loss stays observable.
	pub fn add_cell(&self, predecessor: &str, cell: Cell) {
		if !cell.is_valid() {
			self.discarded.fetch_add(1, Ordering::Relaxed);
			trace!("discarding invalid cell under {predecessor:?}: {cell}");
			return;
		}

		let mut table = self.write();
		table.total_records += 1;

		let cells = table.cells.entry(predecessor.to_owned()).or_default();
		match cells.iter_mut().find(|existing| existing.word() == cell.word()) {
			Some(existing) => existing.increment(),
			None => cells.push(cell),
		}
	}

	/// Returns a copy of the cells recorded for `predecessor`.
	///
	/// # Errors
	/// Returns [`ChainError::NotFound`] if the predecessor was never observed.
	pub fn get_cells(&self, predecessor: &str) -> Result<Vec<Cell>, ChainError> {
		self.read()
			.cells
			.get(predecessor)
			.cloned()
			.ok_or_else(|| ChainError::NotFound { predecessor: predecessor.to_owned() })
	}

	/// Probability pass: turns every cell count into a percentage weight.
	///
	/// For each predecessor the counts of its cells are summed and each cell
	/// gets `count / sum * 100`. Weights are recomputed from counts, so
	/// running the pass twice yields the same result.
	///
	/// Must run after ingestion and before any generation.
	pub fn calculate_cells(&self) {
		let mut table = self.write();
		for cells in table.cells.values_mut() {
			let total: u64 = cells.iter().map(Cell::count).sum();
			for cell in cells.iter_mut() {
				cell.apply_weight(total);
			}
		}
		debug!("probability pass done over {} predecessors", table.cells.len());
	}

	/// Draws the next cell after `predecessor` using the thread-local generator.
	///
	/// # Errors
	/// See [`Chain::get_next_word_with`].
	pub fn get_next_word(&self, predecessor: &str) -> Result<Cell, ChainError> {
		self.get_next_word_with(predecessor, &mut rand::rng())
	}

	/// Draws the next cell after `predecessor` from the given random source.
	///
	/// A value `r` is drawn uniformly in `[0, 100)`, then the cells are
	/// walked in insertion order while accumulating their weights. The first
	/// cell whose running total exceeds `r` is returned.
	///
	/// # Errors
	/// - [`ChainError::NotFound`] if the predecessor is unknown.
	/// - [`ChainError::Exhausted`] if no cell covers `r` (weights not
	///   computed, or summing to slightly less than 100).
	pub fn get_next_word_with<R: Rng>(&self, predecessor: &str, rng: &mut R) -> Result<Cell, ChainError> {
		let table = self.read();
		let cells = table
			.cells
			.get(predecessor)
			.ok_or_else(|| ChainError::NotFound { predecessor: predecessor.to_owned() })?;

		let pick: f64 = rng.random_range(0.0..100.0);
		let mut cumulative = 0.0;
		for cell in cells {
			cumulative += cell.weight();
			if pick < cumulative {
				trace!("drew {:?} after {predecessor:?} (pick {pick:.3})", cell.word());
				return Ok(cell.clone());
			}
		}

		Err(ChainError::Exhausted { predecessor: predecessor.to_owned() })
	}

	/// Total number of accepted `add_cell` calls since creation or last reset.
	pub fn total_records(&self) -> u64 {
		self.read().total_records
	}

	/// Number of invalid cells dropped by `add_cell`.
	pub fn discarded(&self) -> u64 {
		self.discarded.load(Ordering::Relaxed)
	}

	/// Number of distinct predecessors.
	pub fn len(&self) -> usize {
		self.read().cells.len()
	}

	pub fn is_empty(&self) -> bool {
		self.read().cells.is_empty()
	}

	/// Clears the table and the record counter.
	pub fn reset(&self) {
		let mut table = self.write();
		let capacity = table.cells.len();
		*table = Table {
			cells: HashMap::with_capacity(capacity),
			total_records: 0,
		};
	}

	/// Encodes the table with `postcard`.
	///
	/// # Errors
	/// Returns [`ChainError::Snapshot`] if encoding fails.
	pub fn to_bytes(&self) -> Result<Vec<u8>, ChainError> {
		Ok(postcard::to_stdvec(&*self.read())?)
	}

	/// Replaces the table with one decoded from `bytes`.
	///
	/// The table is left untouched when decoding fails.
	///
	/// # Errors
	/// Returns [`ChainError::Snapshot`] if `bytes` is not a valid snapshot.
	pub fn load_bytes(&self, bytes: &[u8]) -> Result<(), ChainError> {
		let table: Table = postcard::from_bytes(bytes)?;
		*self.write() = table;
		Ok(())
	}

	/// Writes a snapshot of the table to `path`.
	///
	/// # Errors
	/// Returns an error if encoding or writing fails.
	pub fn export<P: AsRef<Path>>(&self, path: P) -> Result<(), ChainError> {
		let bytes = self.to_bytes()?;
		std::fs::write(&path, bytes)?;
		info!("chain exported to {}", path.as_ref().display());
		Ok(())
	}

	/// Tries to restore a snapshot written by [`Chain::export`].
	///
	/// Returns `false` if the file is missing or cannot be decoded, so the
	/// caller can fall back to rebuilding from the corpus.
	pub fn try_import<P: AsRef<Path>>(&self, path: P) -> bool {
		let path = path.as_ref();
		let bytes = match std::fs::read(path) {
			Ok(bytes) => bytes,
			Err(e) => {
				warn!("no snapshot at {}: {e}", path.display());
				return false;
			}
		};

		match self.load_bytes(&bytes) {
			Ok(()) => {
				info!("chain imported from {} ({} predecessors)", path.display(), self.len());
				true
			}
			Err(e) => {
				warn!("snapshot {} is unreadable: {e}", path.display());
				false
			}
		}
	}

	/// Renders the transition table as JSON, for inspection.
	///
	/// # Errors
	/// Returns [`ChainError::Json`] if serialization fails.
	pub fn to_json(&self, pretty: bool) -> Result<String, ChainError> {
		let table = self.read();
		let json = if pretty {
			serde_json::to_string_pretty(&table.cells)?
		} else {
			serde_json::to_string(&table.cells)?
		};
		Ok(json)
	}
}
