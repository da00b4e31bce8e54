use std::fmt;

use serde::{Deserialize, Serialize};

/// Synthetic predecessor marking the beginning of a sentence.
pub const START_TOKEN: &str = "*START*";

/// Synthetic successor marking the end of a sentence.
pub const END_TOKEN: &str = "*END*";

/// Role a token plays inside a sentence.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CellRole {
	Start,
	Word,
	End,
}

impl fmt::Display for CellRole {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			CellRole::Start => "start",
			CellRole::Word => "word",
			CellRole::End => "end",
		};
		f.write_str(name)
	}
}

/// One observed outcome for a given predecessor.
///
/// A `Cell` records which token followed the predecessor, how many times
/// that was observed, and, once the probability pass has run, the
/// percentage chance of drawing it.
///
/// ## Invariants (for cells stored in a chain)
/// - `role == Start` only for `*START*`, `role == End` only for `*END*`
/// - `role == Word` implies a non-empty word
/// - `count >= 1`
/// - `weight` is `0.0` until the probability pass, then in `[0, 100]`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Cell {
	word: String,
	count: u64,
	role: CellRole,
	weight: f64,
}

impl Cell {
	/// Builds a cell. No validation happens here, see [`Cell::is_valid`].
	pub fn new(word: &str, count: u64, role: CellRole) -> Self {
		Self {
			word: word.to_owned(),
			count,
			role,
			weight: 0.0,
		}
	}

	/// Shorthand for a single observation of an ordinary word.
	pub fn word_of(word: &str) -> Self {
		Self::new(word, 1, CellRole::Word)
	}

	/// Shorthand for a single observation of the end marker.
	pub fn end() -> Self {
		Self::new(END_TOKEN, 1, CellRole::End)
	}

	pub fn word(&self) -> &str {
		&self.word
	}

	pub fn count(&self) -> u64 {
		self.count
	}

	pub fn role(&self) -> CellRole {
		self.role
	}

	/// Percentage chance of this cell being drawn given its predecessor.
	pub fn weight(&self) -> f64 {
		self.weight
	}

	/// Checks the cell against the table invariants.
	///
	/// This is the only gate before insertion: the chain drops cells that
	/// fail it instead of reporting an error.
	pub fn is_valid(&self) -> bool {
		if self.word.is_empty() && self.role == CellRole::Word {
			return false;
		}
		if self.word == END_TOKEN && self.role != CellRole::End {
			return false;
		}
		if self.word == START_TOKEN && self.role != CellRole::Start {
			return false;
		}
		self.count >= 1
	}

	pub(crate) fn increment(&mut self) {
		self.count += 1;
	}

	/// Derives the weight from the summed count of the sibling cells.
	///
	/// Leaves the weight untouched if `total` is smaller than this cell's
	/// own count, which would mean `total` was not computed over the siblings.
	pub(crate) fn apply_weight(&mut self, total: u64) {
		if total < self.count {
			return;
		}
		self.weight = (self.count as f64 / total as f64) * 100.0;
	}
}

impl fmt::Display for Cell {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{} cell {:?} found {} time(s) with chance {:.2}%",
			self.role, self.word, self.count, self.weight
		)
	}
}
