//! Corpus readers.
//!
//! Two formats are understood:
//! - a quote archive: a JSON array of records carrying a `text` field
//!   (other fields are ignored), where each text may be a dialog whose lines
//!   start with a `speaker:` prefix
//! - anything else: plain text, one quote per line

use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use log::{info, warn};
use regex::Regex;
use serde::Deserialize;

use crate::config::ChainConfig;
use crate::error::CorpusError;
use crate::io::{build_output_path, read_file};
use crate::model::chain::Chain;
use crate::model::pipeline::Pipeline;

static DIALOG_PREFIX: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?m)^[\w\d]+:[ \t]*(.+)$").expect("dialog pattern is a valid regex"));

#[derive(Deserialize)]
struct Quote {
	text: String,
}

/// Removes `speaker:` prefixes from every line of a dialog.
pub fn strip_dialog(text: &str) -> Cow<'_, str> {
	DIALOG_PREFIX.replace_all(text, "$1")
}

/// Decodes a quote archive and returns the non-blank texts, dialog
/// prefixes removed.
///
/// # Errors
/// Returns [`CorpusError::Decode`] if `json` is not an array of quotes.
pub fn parse_quotes(json: &str) -> Result<Vec<String>, CorpusError> {
	let quotes: Vec<Quote> = serde_json::from_str(json)?;
	Ok(quotes
		.iter()
		.map(|quote| strip_dialog(&quote.text).into_owned())
		.filter(|text| !text.trim().is_empty())
		.collect())
}

/// Loads a corpus file as a list of lines.
///
/// `.json` files are read as quote archives, any other file as plain text.
///
/// # Errors
/// Returns an error if the file cannot be read or decoded.
pub fn load_lines<P: AsRef<Path>>(path: P) -> Result<Vec<String>, CorpusError> {
	let path = path.as_ref();
	let lines = if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json")) {
		parse_quotes(&std::fs::read_to_string(path)?)?
	} else {
		read_file(path)?
			.into_iter()
			.filter(|line| !line.trim().is_empty())
			.collect()
	};
	info!("read {} quote(s) from {}", lines.len(), path.display());
	Ok(lines)
}

/// Default snapshot location for a corpus: same directory and stem, `.bin`
/// extension.
///
/// # Errors
/// Returns an error if `corpus` has no file name.
pub fn snapshot_path_for<P: AsRef<Path>>(corpus: P) -> Result<PathBuf, CorpusError> {
	Ok(build_output_path(corpus, "bin")?)
}

/// Loads a chain from its snapshot if one exists, otherwise builds it from
/// the corpus and writes the snapshot for next time.
///
/// - `snapshot` defaults to [`snapshot_path_for`] the corpus.
/// - Building runs the worker pool with `config`, then the probability pass.
/// - A snapshot that cannot be written is logged, not fatal.
///
/// # Errors
/// Returns an error if the snapshot is unusable and the corpus cannot be
/// read either.
pub fn load_or_build_chain<P: AsRef<Path>>(
	corpus: P,
	snapshot: Option<PathBuf>,
	config: &ChainConfig,
) -> Result<Arc<Chain>, Box<dyn std::error::Error>> {
	let snapshot = match snapshot {
		Some(path) => path,
		None => snapshot_path_for(&corpus)?,
	};

	let chain = Arc::new(Chain::new());
	if chain.try_import(&snapshot) {
		chain.calculate_cells();
		return Ok(chain);
	}

	let lines = load_lines(&corpus)?;
	let mut pipeline = Pipeline::new(Arc::clone(&chain), config.clone());
	pipeline.set_async(config.workers);
	pipeline.ingest(lines);

	info!("recalculating chances");
	chain.calculate_cells();

	if let Err(e) = chain.export(&snapshot) {
		warn!("could not write snapshot {}: {e}", snapshot.display());
	}
	Ok(chain)
}
