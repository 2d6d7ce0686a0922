//! Sentence and token counts plus the cleaned token stream of each entry.

use std::collections::HashMap;

use log::{debug, info};
use unicode_segmentation::UnicodeSegmentation;

use crate::input::{Corpus, Stopwords};

/// Lexical statistics of one corpus entry.
#[derive(Debug, Clone, PartialEq)]
pub struct PartStats {
    pub sentences: usize,
    /// Words and punctuation marks.
    pub tokens: usize,
    /// `None` when the entry has no sentences.
    pub tokens_per_sentence: Option<f64>,
    /// Lowercased, alphabetic-only tokens with stopwords removed.
    pub cleaned: Vec<String>,
}

impl PartStats {
    /// The cleaned tokens joined by single spaces.
    pub fn cleaned_text(&self) -> String {
        self.cleaned.join(" ")
    }
}

/// Per-entry statistics, index-aligned with the corpus.
#[derive(Debug, Clone, PartialEq)]
pub struct LexicalAnalysis {
    pub parts: Vec<PartStats>,
}

pub fn analyze(corpus: &Corpus, stopwords: &Stopwords) -> LexicalAnalysis {
    info!("Computing text properties");
    let parts = corpus
        .entries()
        .iter()
        .map(|entry| {
            let stats = analyze_text(&entry.text, stopwords);
            debug!(
                "{}: {} sentences, {} tokens, {} cleaned tokens",
                entry.label,
                stats.sentences,
                stats.tokens,
                stats.cleaned.len()
            );
            stats
        })
        .collect();
    LexicalAnalysis { parts }
}

pub fn analyze_text(text: &str, stopwords: &Stopwords) -> PartStats {
    let sentences = count_sentences(text);
    let tokens = word_tokens(text).count();
    PartStats {
        sentences,
        tokens,
        tokens_per_sentence: tokens_per_sentence(tokens, sentences),
        cleaned: clean_tokens(text, stopwords),
    }
}

/// Counts UAX #29 sentences that contain at least one alphanumeric character.
pub fn count_sentences(text: &str) -> usize {
    text.unicode_sentences().count()
}

/// Word and punctuation tokens: UAX #29 word-boundary segments that are not
/// whitespace, with clitics split off (`Alice's` -> `Alice` `'s`).
pub fn word_tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split_word_bounds()
        .filter(|segment| !segment.chars().all(char::is_whitespace))
        .flat_map(|segment| {
            let (stem, clitic) = split_clitic(segment);
            std::iter::once(stem).chain(clitic)
        })
}

const APOSTROPHES: [char; 2] = ['\'', '\u{2019}'];
const NEGATIONS: [&str; 4] = ["n't", "n\u{2019}t", "N'T", "N\u{2019}T"];

/// Splits a word segment at its clitic: a trailing `n't` (`didn't` -> `did`
/// `n't`), otherwise the first apostrophe after the first character
/// (`I'm` -> `I` `'m`).
pub fn split_clitic(segment: &str) -> (&str, Option<&str>) {
    for negation in NEGATIONS {
        if let Some(stem) = segment.strip_suffix(negation) {
            if !stem.is_empty() {
                return (stem, Some(&segment[stem.len()..]));
            }
        }
    }
    match segment
        .char_indices()
        .find(|&(i, c)| i > 0 && APOSTROPHES.contains(&c))
    {
        Some((i, _)) => (&segment[..i], Some(&segment[i..])),
        None => (segment, None),
    }
}

/// Ratio of tokens to sentences, undefined for zero sentences.
pub fn tokens_per_sentence(tokens: usize, sentences: usize) -> Option<f64> {
    if sentences == 0 {
        None
    } else {
        Some(tokens as f64 / sentences as f64)
    }
}

/// Keeps tokens made only of letters, lowercases them and drops stopwords.
///
/// # Example
/// ```
/// use chapter_report::{Stopwords, clean_tokens};
/// let stop = Stopwords::parse("the");
/// assert_eq!(clean_tokens("The The cat.", &stop), vec!["cat".to_string()]);
/// ```
pub fn clean_tokens(text: &str, stopwords: &Stopwords) -> Vec<String> {
    word_tokens(text)
        .filter(|token| token.chars().all(char::is_alphabetic))
        .map(str::to_lowercase)
        .filter(|token| !stopwords.contains(token))
        .collect()
}

/// Takes `&[String]` and counts the quantity of each word.
pub fn count_words(words: &[String]) -> HashMap<String, u32> {
    let mut frequency: HashMap<String, u32> = HashMap::new();
    for word in words {
        *frequency.entry(word.to_owned()).or_insert(0) += 1;
    }
    frequency
}

/// Sorts a frequency map by count, descending. Equal counts are ordered
/// alphabetically so the result does not depend on hash order.
pub fn sort_map_to_vec(frequency: HashMap<String, u32>) -> Vec<(String, u32)> {
    let mut vec_sorted: Vec<(String, u32)> = frequency.into_iter().collect();
    vec_sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    vec_sorted
}
