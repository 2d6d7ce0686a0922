//! Input loading: stopwords, the parts of the text and the aggregate entry.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::office::{extract_text_from_docx, extract_text_from_odt, extract_text_from_pdf};
use crate::summary::TOPIC_CLOUD_LABEL;

/// Label of the aggregate entry at index 0.
pub const AGGREGATE_LABEL: &str = "all";

/// Labels taken by the artifacts every report writes.
pub const RESERVED_LABELS: &[&str] = &[AGGREGATE_LABEL, TOPIC_CLOUD_LABEL];

/// File extensions picked up when an input argument is a directory.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "md", "pdf", "docx", "odt"];

/// Tokens excluded from cleaned token streams. Matching is case-sensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stopwords(HashSet<String>);

impl Stopwords {
    /// Splits `content` on any whitespace; every piece is one stopword.
    pub fn parse(content: &str) -> Self {
        Stopwords(content.split_whitespace().map(String::from).collect())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| Error::Stopwords {
            path: path.to_path_buf(),
            source,
        })?;
        let stopwords = Self::parse(&content);
        debug!("Loaded {} stopwords from {}", stopwords.len(), path.display());
        Ok(stopwords)
    }

    pub fn contains(&self, word: &str) -> bool {
        self.0.contains(word)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for Stopwords {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Stopwords(iter.into_iter().map(Into::into).collect())
    }
}

/// One analysable text: the aggregate or a single part.
#[derive(Debug, Clone, PartialEq)]
pub struct CorpusEntry {
    pub label: String,
    /// File the text was read from; `None` for the aggregate.
    pub source: Option<PathBuf>,
    pub text: String,
}

/// The aggregate at index 0 followed by every part in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct Corpus {
    entries: Vec<CorpusEntry>,
}

impl Corpus {
    /// Builds the corpus from the parts, prepending the aggregate: the plain
    /// concatenation of every part's text in input order.
    pub fn from_parts(parts: Vec<CorpusEntry>) -> Self {
        let text = parts.iter().map(|p| p.text.as_str()).collect::<String>();
        let mut entries = Vec::with_capacity(parts.len() + 1);
        entries.push(CorpusEntry {
            label: AGGREGATE_LABEL.to_string(),
            source: None,
            text,
        });
        entries.extend(parts);
        Corpus { entries }
    }

    pub fn entries(&self) -> &[CorpusEntry] {
        &self.entries
    }

    pub fn aggregate(&self) -> &CorpusEntry {
        &self.entries[0]
    }

    pub fn parts(&self) -> &[CorpusEntry] {
        &self.entries[1..]
    }

    /// Number of entries including the aggregate.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false: the aggregate is present even without parts.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The label of a part: the file name without directory and extension.
///
/// # Example
/// ```
/// use chapter_report::part_label;
/// use std::path::Path;
/// assert_eq!(part_label(Path::new("chapters/ch1.txt")), "ch1");
/// ```
pub fn part_label(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Expands a directory into its supported documents (sorted by path). Any
/// other path is returned unchanged so that reading it reports the problem.
pub fn collect_files(path: &Path) -> Vec<PathBuf> {
    if !path.is_dir() {
        return vec![path.to_path_buf()];
    }
    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| has_supported_extension(p))
        .collect();
    files.sort();
    files
}

fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SUPPORTED_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Reads one part. Office and PDF documents are converted to plain text,
/// everything else is read as UTF-8.
pub fn read_document(path: &Path) -> Result<String> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    let text = match extension.as_deref() {
        Some("docx") => extract_text_from_docx(path),
        Some("odt") => extract_text_from_odt(path),
        Some("pdf") => extract_text_from_pdf(path),
        _ => fs::read_to_string(path).map_err(|e| e.to_string()),
    };
    text.map_err(|reason| Error::Input {
        path: path.to_path_buf(),
        reason,
    })
}

/// Rejects parts whose label (and so whose `<label>.png`) would clash with
/// another part or with a file the report always writes. Labels are compared
/// case-insensitively.
pub fn check_labels(paths: &[PathBuf]) -> Result<()> {
    let mut seen: HashMap<String, &Path> = HashMap::new();
    for path in paths {
        let label = part_label(path);
        if RESERVED_LABELS
            .iter()
            .any(|r| r.eq_ignore_ascii_case(&label))
        {
            return Err(Error::ReservedLabel {
                label,
                path: path.clone(),
            });
        }
        if let Some(first) = seen.insert(label.to_lowercase(), path.as_path()) {
            return Err(Error::DuplicateLabel {
                label,
                first: first.to_path_buf(),
                second: path.clone(),
            });
        }
    }
    Ok(())
}

/// Reads every input (directories expanded) into a corpus. Label clashes and
/// the first unreadable input abort the load.
pub fn load_corpus(inputs: &[PathBuf]) -> Result<Corpus> {
    info!("Reading in texts");
    let paths: Vec<PathBuf> = inputs.iter().flat_map(|p| collect_files(p)).collect();
    check_labels(&paths)?;
    let mut parts = Vec::with_capacity(paths.len());
    for path in paths {
        let text = read_document(&path)?;
        debug!("Read {} ({} bytes)", path.display(), text.len());
        parts.push(CorpusEntry {
            label: part_label(&path),
            source: Some(path),
            text,
        });
    }
    Ok(Corpus::from_parts(parts))
}

/// Creates the output directory (and parents) unless it already exists.
pub fn prepare_output_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|source| Error::OutputDir {
        path: dir.to_path_buf(),
        source,
    })
}
