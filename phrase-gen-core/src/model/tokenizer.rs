use std::sync::LazyLock;

use regex::Regex;

/// Sentence terminator appended to lines that lack one.
pub const TERMINATOR: char = '.';

/// Words are runs of letters, digits, underscores and hyphens; punctuation
/// runs are kept apart as their own tokens. Anything else separates tokens.
static TOKEN_PATTERN: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"[\w-]+|[.,:;?!]+").expect("token pattern is a valid regex"));

/// What a raw token means to the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
	/// A bare terminator, or a punctuation run ending with one (`...`, `?.`).
	Terminator,
	/// A word glued to its terminator, holding the word without it.
	TerminatedWord(&'a str),
	/// Punctuation or control characters only, without terminator.
	Punctuation,
	/// An ordinary word, as written.
	Word(&'a str),
}

fn is_symbol(c: char) -> bool {
	c.is_ascii_punctuation() || c.is_control()
}

impl<'a> Token<'a> {
	/// Classifies a raw token produced by [`tokenize`].
	pub fn classify(raw: &'a str) -> Self {
		if raw.chars().all(is_symbol) {
			if raw.ends_with(TERMINATOR) {
				return Token::Terminator;
			}
			return Token::Punctuation;
		}
		match raw.strip_suffix(TERMINATOR) {
			Some(stem) => Token::TerminatedWord(stem),
			None => Token::Word(raw),
		}
	}
}

/// Trims the line and makes sure it ends with the terminator.
///
/// Returns `None` for blank lines.
pub fn normalize(line: &str) -> Option<String> {
	let trimmed = line.trim();
	if trimmed.is_empty() {
		return None;
	}

	let mut normalized = trimmed.to_owned();
	if !normalized.ends_with(TERMINATOR) {
		normalized.push(TERMINATOR);
	}
	Some(normalized)
}

/// Splits a line into word and punctuation tokens.
pub fn tokenize(line: &str) -> impl Iterator<Item = &str> {
	TOKEN_PATTERN.find_iter(line).map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn punctuation_is_split_from_words() {
		let tokens: Vec<&str> = tokenize("Hello, world! \"Quoted\" well-known...").collect();
		assert_eq!(tokens, ["Hello", ",", "world", "!", "Quoted", "well-known", "..."]);
	}

	#[test]
	fn non_ascii_words_are_kept_whole() {
		let tokens: Vec<&str> = tokenize("Привет, мир.").collect();
		assert_eq!(tokens, ["Привет", ",", "мир", "."]);
	}

	#[test]
	fn normalize_appends_terminator() {
		assert_eq!(normalize("  The cat sat  ").as_deref(), Some("The cat sat."));
		assert_eq!(normalize("The cat sat.").as_deref(), Some("The cat sat."));
		assert_eq!(normalize("Really?").as_deref(), Some("Really?."));
		assert_eq!(normalize(" \t\n"), None);
	}

	#[test]
	fn classification() {
		assert_eq!(Token::classify("."), Token::Terminator);
		assert_eq!(Token::classify("..."), Token::Terminator);
		assert_eq!(Token::classify("?."), Token::Terminator);
		assert_eq!(Token::classify(","), Token::Punctuation);
		assert_eq!(Token::classify("?!"), Token::Punctuation);
		assert_eq!(Token::classify("-"), Token::Punctuation);
		assert_eq!(Token::classify("sat."), Token::TerminatedWord("sat"));
		assert_eq!(Token::classify("Cat"), Token::Word("Cat"));
	}
}
