#![forbid(unsafe_code)]
//! # chapter_report CLI
//!
//! Command-line front end of the `chapter_report` crate: analyses the parts
//! of a text and writes an HTML report with word clouds and topics.
//!
//! ## Example
//! ```bash
//! cargo run --release -- -i chapters/ch1.txt chapters/ch2.txt -o out -b book -s stopwords.txt
//! ```
//!
//! See `--help` for all available options.

use chapter_report::{LdaConfig, ReportOptions, run_report};
use clap::Parser;
use log::{LevelFilter, error};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(author, version, about = "Create word clouds, topics and an HTML report from the parts of a text.")]
struct Cli {
    /// Input text files (or directories of them), one per part
    #[arg(short, long = "input", value_name = "FILE", num_args = 1.., required = true)]
    input: Vec<PathBuf>,

    /// Output directory, created if missing
    #[arg(short, long = "output_dir", value_name = "DIR")]
    output_dir: PathBuf,

    /// Base of the output file name and report title
    #[arg(short, long)]
    base: String,

    /// File with stopwords, separated by whitespace or newlines
    #[arg(short, long, value_name = "FILE")]
    stopwords: Option<PathBuf>,

    /// Turn debug logging on
    #[arg(short, long, default_value_t = false)]
    debug: bool,

    /// Number of topics for the topic model
    #[arg(long, default_value_t = 10)]
    topics: usize,

    /// Training passes over the corpus
    #[arg(long, default_value_t = 10)]
    passes: usize,

    /// Maximum inference iterations per document
    #[arg(long, default_value_t = 100)]
    iterations: usize,

    /// Random seed of the topic model
    #[arg(long, default_value_t = 100)]
    seed: u64,
}

fn init_logging(debug: bool) {
    let mut builder = env_logger::Builder::new();
    if debug {
        builder.filter_level(LevelFilter::Debug);
        for noisy in ["png", "image", "pdf_extract", "lopdf"] {
            builder.filter_module(noisy, LevelFilter::Error);
        }
    } else {
        builder.filter_level(LevelFilter::Warn);
    }
    builder.parse_default_env().init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let options = ReportOptions {
        inputs: cli.input,
        output_dir: cli.output_dir,
        base: cli.base,
        stopwords: cli.stopwords,
        lda: LdaConfig {
            num_topics: cli.topics,
            passes: cli.passes,
            iterations: cli.iterations,
            seed: cli.seed,
            ..LdaConfig::default()
        },
    };

    match run_report(&options) {
        Ok(outcome) => println!("{}", outcome.html.display()),
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    }
}
