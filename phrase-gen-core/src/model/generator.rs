use log::{debug, trace};
use rand::Rng;

use super::cell::{CellRole, END_TOKEN, START_TOKEN};
use super::chain::Chain;
use crate::config::ChainConfig;
use crate::error::ChainError;

/// Position of the walk.
#[derive(Debug, Clone, PartialEq, Eq)]
enum WalkState {
	/// Waiting to draw the word that follows this predecessor.
	Walking(String),
	Done,
}

/// Produces sentences by walking a chain.
///
/// The walk starts from `*START*` and draws one cell at a time until an
/// end cell comes up, or until `max_words` words have been drawn so a
/// cyclic table cannot keep it running forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generator {
	max_words: usize,
}

impl Default for Generator {
	fn default() -> Self {
		Self::new(&ChainConfig::default())
	}
}

impl Generator {
	pub fn new(config: &ChainConfig) -> Self {
		Self::with_max_words(config.max_words)
	}

	/// A generator with an explicit safety bound. A bound of `0` is raised to `1`.
	pub fn with_max_words(max_words: usize) -> Self {
		Self { max_words: max_words.max(1) }
	}

	pub fn max_words(&self) -> usize {
		self.max_words
	}

	/// Generates a sentence using the thread-local random generator.
	///
	/// # Errors
	/// See [`Generator::generate_with`].
	pub fn generate(&self, chain: &Chain) -> Result<String, ChainError> {
		self.generate_with(chain, &mut rand::rng())
	}

	/// Generates a sentence drawing from `rng`.
	///
	/// The words are joined with single spaces and closed with a period.
	///
	/// # Errors
	/// Any draw failure aborts the sentence and is returned as is; a partial
	/// sentence is never returned.
	pub fn generate_with<R: Rng>(&self, chain: &Chain, rng: &mut R) -> Result<String, ChainError> {
		let mut words: Vec<String> = Vec::with_capacity(self.max_words);
		let mut state = WalkState::Walking(START_TOKEN.to_owned());

		while let WalkState::Walking(predecessor) = state {
			let cell = chain.get_next_word_with(&predecessor, rng)?;
			trace!("walk {predecessor:?} -> {:?}", cell.word());

			state = if cell.role() == CellRole::End {
				WalkState::Done
			} else {
				words.push(cell.word().to_owned());
				if words.len() >= self.max_words {
					debug!("safety bound of {} words reached", self.max_words);
					WalkState::Done
				} else {
					WalkState::Walking(cell.word().to_owned())
				}
			};
		}

		let mut sentence = words.join(" ").replace(END_TOKEN, ".");
		sentence.push('.');
		debug!("generated sentence of {} word(s)", words.len());
		Ok(sentence)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::cell::Cell;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	fn linear_chain() -> Chain {
		let chain = Chain::new();
		chain.add_cell(START_TOKEN, Cell::word_of("the"));
		chain.add_cell("the", Cell::word_of("cat"));
		chain.add_cell("cat", Cell::word_of("sat"));
		chain.add_cell("sat", Cell::end());
		chain.calculate_cells();
		chain
	}

	#[test]
	fn single_path_is_walked_deterministically() {
		let chain = linear_chain();
		let generator = Generator::default();
		for _ in 0..10 {
			assert_eq!(generator.generate(&chain).unwrap(), "the cat sat.");
		}
	}

	#[test]
	fn cyclic_table_stops_at_the_bound() {
		let chain = Chain::new();
		chain.add_cell(START_TOKEN, Cell::word_of("again"));
		chain.add_cell("again", Cell::word_of("again"));
		chain.calculate_cells();

		let sentence = Generator::with_max_words(10).generate(&chain).unwrap();
		assert_eq!(sentence.split(' ').count(), 10);
		assert!(sentence.ends_with("again."));
	}

	#[test]
	fn dead_end_is_reported() {
		let chain = Chain::new();
		chain.add_cell(START_TOKEN, Cell::word_of("lonely"));
		chain.calculate_cells();

		let result = Generator::default().generate(&chain);
		assert!(matches!(result, Err(ChainError::NotFound { predecessor }) if predecessor == "lonely"));
	}

	#[test]
	fn unweighted_table_is_an_error_not_an_empty_sentence() {
		let chain = Chain::new();
		chain.add_cell(START_TOKEN, Cell::word_of("the"));
		chain.add_cell("the", Cell::end());

		assert!(matches!(Generator::default().generate(&chain), Err(ChainError::Exhausted { .. })));
	}

	#[test]
	fn empty_chain_is_an_error() {
		assert!(Generator::default().generate(&Chain::new()).is_err());
	}

	#[test]
	fn seeded_generation_is_reproducible() {
		let chain = Chain::new();
		for (a, b) in [("x", "y"), ("x", "z"), ("y", "x"), ("z", "y")] {
			chain.add_cell(a, Cell::word_of(b));
		}
		chain.add_cell(START_TOKEN, Cell::word_of("x"));
		chain.add_cell("y", Cell::end());
		chain.add_cell("z", Cell::end());
		chain.calculate_cells();

		let generator = Generator::with_max_words(20);
		let first: Vec<String> = {
			let mut rng = StdRng::seed_from_u64(3);
			(0..5).map(|_| generator.generate_with(&chain, &mut rng).unwrap()).collect()
		};
		let second: Vec<String> = {
			let mut rng = StdRng::seed_from_u64(3);
			(0..5).map(|_| generator.generate_with(&chain, &mut rng).unwrap()).collect()
		};
		assert_eq!(first, second);
	}
}
