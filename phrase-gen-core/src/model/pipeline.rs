use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, bounded, select};
use log::{debug, info, warn};

use super::cell::{Cell, START_TOKEN};
use super::chain::Chain;
use super::tokenizer::{self, Token};
use crate::config::ChainConfig;
use crate::error::ChainError;

/// Channels handed back by [`Pipeline::run_async`].
///
/// - `lines`: raw lines to ingest. Bounded, so `send` blocks when workers
///   fall behind.
/// - `done`: send `()` (or drop it) once every line has been sent. Workers
///   then drain what is still queued and exit.
/// - `errors`: per-line failures. Closed once every worker has exited, so
///   iterating it to the end waits for ingestion to complete. It is bounded
///   too: keep draining it while sending lines.
pub struct IngestChannels {
	pub lines: Sender<String>,
	pub done: Sender<()>,
	pub errors: Receiver<ChainError>,
}

/// Outcome of [`Pipeline::ingest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IngestReport {
	/// Lines handed to the pipeline.
	pub lines: usize,
	/// Lines that failed.
	pub errors: usize,
}

/// Turns raw lines of text into chain cells.
///
/// Lines can be fed one at a time with [`Pipeline::parse_text`], or through
/// a pool of worker threads once [`Pipeline::set_async`] has been called.
#[derive(Clone, Debug)]
pub struct Pipeline {
	chain: Arc<Chain>,
	config: ChainConfig,
	async_mode: bool,
}

impl Pipeline {
	pub fn new(chain: Arc<Chain>, config: ChainConfig) -> Self {
		Self {
			chain,
			config,
			async_mode: false,
		}
	}

	/// The chain this pipeline feeds.
	pub fn chain(&self) -> &Arc<Chain> {
		&self.chain
	}

	/// Enables the worker pool.
	///
	/// `workers == 0` keeps the configured worker count, which itself
	/// resolves to the number of logical CPUs when unset.
	pub fn set_async(&mut self, workers: usize) {
		if workers > 0 {
			self.config.workers = workers;
		}
		self.async_mode = true;
	}

	pub fn is_async(&self) -> bool {
		self.async_mode
	}

	/// Feeds one line to the chain.
	///
	/// The line is trimmed and terminated, split into tokens, and each
	/// transition is recorded:
	/// - a terminator closes the current sentence (ignored right after a
	///   sentence start, so ellipses do not create empty sentences)
	/// - a word glued to a terminator is recorded, then closes the sentence
	/// - bare punctuation is skipped
	/// - any other word is lowercased, recorded and becomes the predecessor
	///
	/// # Errors
	/// Returns [`ChainError::EmptyInput`] for a blank line.
	pub fn parse_text(&self, line: &str) -> Result<(), ChainError> {
		let line = tokenizer::normalize(line).ok_or(ChainError::EmptyInput)?;

		let mut previous = START_TOKEN.to_owned();
		for raw in tokenizer::tokenize(&line) {
			match Token::classify(raw) {
				Token::Terminator => {
					if previous == START_TOKEN {
						continue;
					}
					self.chain.add_cell(&previous, Cell::end());
					previous = START_TOKEN.to_owned();
				}
				Token::TerminatedWord(stem) => {
					let word = stem.to_lowercase();
					self.chain.add_cell(&previous, Cell::word_of(&word));
					self.chain.add_cell(&word, Cell::end());
					previous = START_TOKEN.to_owned();
				}
				Token::Punctuation => {}
				Token::Word(word) => {
					let word = word.to_lowercase();
					self.chain.add_cell(&previous, Cell::word_of(&word));
					previous = word;
				}
			}
		}

		Ok(())
	}

	/// Starts the worker pool and returns its channels.
	///
	/// Each worker pulls lines and calls [`Pipeline::parse_text`]; a failing
	/// line is reported on `errors` and the worker moves on.
	///
	/// # Notes
	/// - Without a prior [`Pipeline::set_async`], no worker is started:
	///   `errors` yields a single [`ChainError::AsyncDisabled`] and is closed,
	///   and `lines`/`done` are already disconnected.
	/// - The chain can be read while workers run, but weights are only
	///   meaningful once ingestion is over and `calculate_cells` has run.
	pub fn run_async(&self) -> IngestChannels {
		if !self.async_mode {
			let (lines, _) = bounded(0);
			let (done, _) = bounded(0);
			let (error_tx, errors) = bounded(1);
			// The receiver is alive and the queue empty, this cannot fail.
			let _ = error_tx.send(ChainError::AsyncDisabled);
			return IngestChannels { lines, done, errors };
		}

		let workers = self.config.resolved_workers();
		let (line_tx, line_rx) = bounded::<String>(self.config.input_capacity);
		let (done_tx, done_rx) = bounded::<()>(1);
		let (error_tx, error_rx) = bounded::<ChainError>(self.config.error_capacity);
		// Never sent on: dropping the sender tells every worker at once.
		let (stop_tx, stop_rx) = bounded::<()>(0);

		let handles: Vec<JoinHandle<()>> = (0..workers)
			.map(|id| {
				let pipeline = self.clone();
				let lines = line_rx.clone();
				let stop = stop_rx.clone();
				let errors = error_tx.clone();
				thread::spawn(move || pipeline.run_worker(id, lines, stop, errors))
			})
			.collect();
		drop(error_tx);
		info!("started {workers} ingestion worker(s)");

		thread::spawn(move || {
			// Either an explicit signal or the caller dropping `done`.
			let _ = done_rx.recv();
			drop(stop_tx);
			for handle in handles {
				if handle.join().is_err() {
					warn!("an ingestion worker panicked");
				}
			}
			debug!("ingestion workers finished");
		});

		IngestChannels {
			lines: line_tx,
			done: done_tx,
			errors: error_rx,
		}
	}

	fn run_worker(&self, id: usize, lines: Receiver<String>, stop: Receiver<()>, errors: Sender<ChainError>) {
		let mut processed = 0usize;
		loop {
			select! {
				recv(lines) -> line => match line {
					Ok(line) => {
						self.report(&line, &errors);
						processed += 1;
					}
					Err(_) => break,
				},
				recv(stop) -> _ => {
					for line in lines.try_iter() {
						self.report(&line, &errors);
						processed += 1;
					}
					break;
				}
			}
		}
		debug!("ingestion worker {id} exiting after {processed} line(s)");
	}

	fn report(&self, line: &str, errors: &Sender<ChainError>) {
		if let Err(e) = self.parse_text(line) {
			// Blocks while the error queue is full.
			if errors.send(e).is_err() {
				debug!("error receiver is gone, dropping ingestion error");
			}
		}
	}

	/// Feeds every line to the chain and waits for completion.
	///
	/// Uses the worker pool when async mode is enabled, the calling thread
	/// otherwise. Failing lines are logged and counted, never fatal.
	pub fn ingest<I>(&self, lines: I) -> IngestReport
	where
		I: IntoIterator,
		I::Item: Into<String>,
	{
		let mut report = IngestReport::default();

		if !self.async_mode {
			for line in lines {
				report.lines += 1;
				let line: String = line.into();
				if let Err(e) = self.parse_text(&line) {
					warn!("skipping line: {e}");
					report.errors += 1;
				}
			}
			return report;
		}

		let IngestChannels { lines: line_tx, done, errors } = self.run_async();
		let drain = thread::spawn(move || {
			let mut count = 0usize;
			for e in errors.iter() {
				warn!("skipping line: {e}");
				count += 1;
			}
			count
		});

		for line in lines {
			if line_tx.send(line.into()).is_err() {
				break;
			}
			report.lines += 1;
		}
		drop(line_tx);
		let _ = done.send(());

		report.errors = drain.join().unwrap_or_else(|_| {
			warn!("error drain thread panicked");
			0
		});
		info!("ingested {} line(s), {} failed", report.lines, report.errors);
		report
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::cell::{CellRole, END_TOKEN};

	fn pipeline() -> Pipeline {
		Pipeline::new(Arc::new(Chain::new()), ChainConfig::default())
	}

	fn words_after(chain: &Chain, predecessor: &str) -> Vec<(String, u64)> {
		chain
			.get_cells(predecessor)
			.unwrap()
			.iter()
			.map(|c| (c.word().to_owned(), c.count()))
			.collect()
	}

	#[test]
	fn simple_sentence_builds_a_single_path() {
		let pipeline = pipeline();
		pipeline.parse_text("The cat sat.").unwrap();
		let chain = pipeline.chain();

		assert_eq!(words_after(chain, START_TOKEN), [("the".to_owned(), 1)]);
		assert_eq!(words_after(chain, "the"), [("cat".to_owned(), 1)]);
		assert_eq!(words_after(chain, "cat"), [("sat".to_owned(), 1)]);
		assert_eq!(words_after(chain, "sat"), [(END_TOKEN.to_owned(), 1)]);
		assert_eq!(chain.get_cells("sat").unwrap()[0].role(), CellRole::End);
	}

	#[test]
	fn identical_sentences_accumulate() {
		let pipeline = pipeline();
		pipeline.parse_text("A.").unwrap();
		pipeline.parse_text("A.").unwrap();
		let chain = pipeline.chain();

		assert_eq!(words_after(chain, START_TOKEN), [("a".to_owned(), 2)]);
		assert_eq!(words_after(chain, "a"), [(END_TOKEN.to_owned(), 2)]);
	}

	#[test]
	fn missing_terminator_is_added() {
		let pipeline = pipeline();
		pipeline.parse_text("  hello there ").unwrap();
		assert_eq!(words_after(pipeline.chain(), "there"), [(END_TOKEN.to_owned(), 1)]);
	}

	#[test]
	fn blank_line_is_rejected() {
		let pipeline = pipeline();
		assert!(matches!(pipeline.parse_text("   "), Err(ChainError::EmptyInput)));
		assert!(matches!(pipeline.parse_text(""), Err(ChainError::EmptyInput)));
		assert!(pipeline.chain().is_empty());
	}

	#[test]
	fn punctuation_does_not_become_a_predecessor() {
		let pipeline = pipeline();
		pipeline.parse_text("Well, \"fine\" then!").unwrap();
		let chain = pipeline.chain();

		assert_eq!(words_after(chain, "well"), [("fine".to_owned(), 1)]);
		assert_eq!(words_after(chain, "fine"), [("then".to_owned(), 1)]);
		assert_eq!(words_after(chain, "then"), [(END_TOKEN.to_owned(), 1)]);
		assert!(chain.get_cells(",").is_err());
	}

	#[test]
	fn leading_ellipsis_is_ignored() {
		let pipeline = pipeline();
		pipeline.parse_text("... and then. Done").unwrap();
		let chain = pipeline.chain();

		assert_eq!(words_after(chain, START_TOKEN), [("and".to_owned(), 1), ("done".to_owned(), 1)]);
		assert_eq!(words_after(chain, "then"), [(END_TOKEN.to_owned(), 1)]);
	}

	#[test]
	fn several_sentences_on_one_line() {
		let pipeline = pipeline();
		pipeline.parse_text("Go home. Go now.").unwrap();
		let chain = pipeline.chain();

		assert_eq!(words_after(chain, START_TOKEN), [("go".to_owned(), 2)]);
		assert_eq!(words_after(chain, "go"), [("home".to_owned(), 1), ("now".to_owned(), 1)]);
	}

	#[test]
	fn run_async_without_enabling_reports_once() {
		let pipeline = pipeline();
		let channels = pipeline.run_async();

		let errors: Vec<ChainError> = channels.errors.iter().collect();
		assert_eq!(errors.len(), 1);
		assert!(matches!(errors[0], ChainError::AsyncDisabled));
		assert!(channels.lines.send("lost".to_owned()).is_err());
	}

	#[test]
	fn workers_report_errors_and_keep_going() {
		let mut pipeline = pipeline();
		pipeline.set_async(2);
		let channels = pipeline.run_async();

		channels.lines.send("One.".to_owned()).unwrap();
		channels.lines.send("   ".to_owned()).unwrap();
		channels.lines.send("Two.".to_owned()).unwrap();
		channels.done.send(()).unwrap();

		let errors: Vec<ChainError> = channels.errors.iter().collect();
		assert_eq!(errors.len(), 1);
		assert!(matches!(errors[0], ChainError::EmptyInput));

		let mut starts = words_after(pipeline.chain(), START_TOKEN);
		starts.sort();
		assert_eq!(starts, [("one".to_owned(), 1), ("two".to_owned(), 1)]);
	}

	#[test]
	fn ingest_falls_back_to_sync_mode() {
		let pipeline = pipeline();
		let report = pipeline.ingest(["A b.", "", "B a."]);
		assert_eq!(report, IngestReport { lines: 3, errors: 1 });
		assert_eq!(pipeline.chain().total_records(), 6);
	}
}
