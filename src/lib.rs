//! # chapter_report
//!
//! Reads the parts of a text (for example the chapters of a book), computes
//! lexical statistics for every part and for the whole text, draws word
//! clouds, fits a topic model and writes everything into a static HTML
//! report.
//!
//! The pipeline runs strictly in order; every stage returns its own record
//! and only borrows the records of earlier stages:
//!
//! 1. [`input`]: stopwords and the [`Corpus`] (aggregate `all` first, then the parts)
//! 2. [`lexical`]: sentence and token counts plus cleaned token streams
//! 3. [`cloud`]: one `<label>.png` word cloud per entry
//! 4. [`topics`]: vocabulary, bag-of-words corpus and the LDA model
//! 5. [`summary`]: dominant topic per entry and `topic_cloud.png`
//! 6. [`report`]: `<base>.html`

#![forbid(unsafe_code)]

use std::path::PathBuf;

use chrono::Local;
use log::info;

pub mod cloud;
pub mod error;
pub mod font;
pub mod input;
pub mod lexical;
pub mod office;
pub mod report;
pub mod summary;
pub mod topics;

pub use cloud::{WordCloud, WordCloudArtifact, WordClouds};
pub use error::{Error, Result};
pub use input::{AGGREGATE_LABEL, Corpus, CorpusEntry, Stopwords, collect_files, part_label};
pub use lexical::{LexicalAnalysis, PartStats, clean_tokens};
pub use office::{extract_text_from_docx, extract_text_from_odt, extract_text_from_pdf};
pub use summary::{DominantTopic, TOPIC_CLOUD_FILE, TopicSummary};
pub use topics::{LdaConfig, TopicModel};

/// Everything a report run needs.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Files or directories, in the order the parts should appear.
    pub inputs: Vec<PathBuf>,
    pub output_dir: PathBuf,
    /// Names the HTML file and appears in the report title.
    pub base: String,
    pub stopwords: Option<PathBuf>,
    pub lda: LdaConfig,
}

/// Paths of the files a run wrote.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportOutcome {
    pub html: PathBuf,
    pub word_clouds: Vec<PathBuf>,
    pub topic_cloud: PathBuf,
    /// Corpus entries including the aggregate.
    pub entries: usize,
}

/// Runs the whole pipeline. The first failure aborts the run; files written
/// before it stay in place.
pub fn run_report(options: &ReportOptions) -> Result<ReportOutcome> {
    options.lda.validate()?;
    let stopwords_path = options.stopwords.as_deref().ok_or(Error::MissingStopwords)?;
    let stopwords = Stopwords::load(stopwords_path)?;
    input::prepare_output_dir(&options.output_dir)?;
    let corpus = input::load_corpus(&options.inputs)?;

    let analysis = lexical::analyze(&corpus, &stopwords);
    let clouds = cloud::render_word_clouds(&corpus, &analysis, &options.output_dir)?;
    let model = topics::fit(&analysis, &options.lda)?;
    let summary = summary::summarize(&model, &options.output_dir)?;

    let doc = report::build_report(
        &options.base,
        &corpus,
        &analysis,
        &clouds,
        &summary,
        Local::now(),
    )?;
    let html = report::write_report(&doc, &options.output_dir, &options.base)?;
    info!("Report written to {}", html.display());

    Ok(ReportOutcome {
        html,
        word_clouds: clouds
            .artifacts
            .iter()
            .map(|a| options.output_dir.join(&a.file_name))
            .collect(),
        topic_cloud: options.output_dir.join(&summary.topic_cloud),
        entries: corpus.len(),
    })
}
