use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::Parser;
use log::{info, warn};

use phrase_gen_core::corpus::load_or_build_chain;
use phrase_gen_core::config::{DEFAULT_ERROR_CAPACITY, DEFAULT_INPUT_CAPACITY, DEFAULT_MAX_WORDS};
use phrase_gen_core::{ChainConfig, Generator};

/// Interactive sentence generator: every line typed on stdin prints a new
/// sentence, `end` quits.
#[derive(Parser, Debug)]
#[command(name = "phrase-gen", version, about)]
struct Args {
    /// Corpus file: a JSON quote archive or plain text, one quote per line
    #[arg(short, long, env = "PHRASE_GEN_FILE")]
    file: PathBuf,

    /// Snapshot file (defaults to the corpus path with a `.bin` extension)
    #[arg(short, long, env = "PHRASE_GEN_SNAPSHOT")]
    snapshot: Option<PathBuf>,

    /// Ingestion workers, 0 for one per core
    #[arg(short, long, default_value_t = 0)]
    workers: usize,

    /// Maximum number of words in a generated sentence
    #[arg(long, default_value_t = DEFAULT_MAX_WORDS)]
    max_words: usize,

    /// Print the transition table as JSON and exit
    #[arg(long)]
    dump: bool,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, env = "PHRASE_GEN_LOG", default_value = "info")]
    log_level: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&args.log_level))
        .format_timestamp_millis()
        .init();

    let config = ChainConfig {
        workers: args.workers,
        input_capacity: DEFAULT_INPUT_CAPACITY,
        error_capacity: DEFAULT_ERROR_CAPACITY,
        max_words: args.max_words,
    };

    // Loads the .bin snapshot next to the corpus if there is one,
    // otherwise builds the chain and writes it
    let chain = load_or_build_chain(&args.file, args.snapshot.clone(), &config)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if args.dump {
        writeln!(out, "{}", chain.to_json(true)?)?;
        return Ok(());
    }

    let generator = Generator::new(&config);
    info!("ready to accept messages, type 'end' to quit");

    for line in io::stdin().lock().lines() {
        let line = line?;
        if line.trim() == "end" {
            break;
        }
        match generator.generate(&chain) {
            Ok(sentence) => writeln!(out, "{sentence}")?,
            Err(e) => warn!("could not generate a sentence: {e}"),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal_args() {
        let args = Args::parse_from(["phrase-gen", "--file", "quotes.json"]);
        assert_eq!(args.file, PathBuf::from("quotes.json"));
        assert_eq!(args.max_words, DEFAULT_MAX_WORDS);
        assert!(!args.dump);
        assert!(args.snapshot.is_none());
    }

    #[test]
    fn parse_dump_and_snapshot() {
        let args = Args::parse_from(["phrase-gen", "-f", "q.txt", "-s", "q.bin", "--dump", "-w", "2"]);
        assert!(args.dump);
        assert_eq!(args.snapshot, Some(PathBuf::from("q.bin")));
        assert_eq!(args.workers, 2);
    }
}
