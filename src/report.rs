//! The static HTML report.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use log::info;

use crate::cloud::WordClouds;
use crate::error::{Error, Result};
use crate::input::Corpus;
use crate::lexical::{LexicalAnalysis, PartStats};
use crate::summary::{DominantTopic, TopicSummary};

pub const STYLE_SHEET: &str = "
        body {background-color: powderblue;}
        h1   {color: blue;}
        p    {color: red;}
    ";

/// Elements without content or closing tag.
const VOID_ELEMENTS: &[&str] = &["img", "br", "meta", "link"];

/// A node of the report's document tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element {
        tag: &'static str,
        attrs: Vec<(&'static str, String)>,
        children: Vec<Node>,
    },
    Text(String),
}

impl Node {
    pub fn element(tag: &'static str) -> Self {
        Node::Element {
            tag,
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(text.into())
    }

    pub fn attr(mut self, name: &'static str, value: impl Into<String>) -> Self {
        if let Node::Element { attrs, .. } = &mut self {
            attrs.push((name, value.into()));
        }
        self
    }

    pub fn child(mut self, node: Node) -> Self {
        if let Node::Element { children, .. } = &mut self {
            children.push(node);
        }
        self
    }

    pub fn children(self, nodes: impl IntoIterator<Item = Node>) -> Self {
        nodes.into_iter().fold(self, Node::child)
    }

    /// Shorthand for an element holding a single text node.
    pub fn with_text(tag: &'static str, text: impl Into<String>) -> Self {
        Node::element(tag).child(Node::text(text))
    }

    fn write_to(&self, out: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        match self {
            Node::Text(text) => {
                let _ = writeln!(out, "{indent}{}", escape_text(text));
            }
            Node::Element {
                tag,
                attrs,
                children,
            } => {
                let mut open = format!("<{tag}");
                for (name, value) in attrs {
                    let _ = write!(open, " {name}=\"{}\"", escape_attr(value));
                }
                open.push('>');
                if VOID_ELEMENTS.contains(tag) {
                    let _ = writeln!(out, "{indent}{open}");
                } else if let [Node::Text(text)] = children.as_slice() {
                    let _ = writeln!(out, "{indent}{open}{}</{tag}>", escape_text(text));
                } else {
                    let _ = writeln!(out, "{indent}{open}");
                    for child in children {
                        child.write_to(out, depth + 1);
                    }
                    let _ = writeln!(out, "{indent}</{tag}>");
                }
            }
        }
    }
}

pub fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub fn escape_attr(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}

/// A complete HTML document: title, inline style sheet and body nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct HtmlDocument {
    pub title: String,
    pub style: String,
    pub body: Vec<Node>,
}

impl HtmlDocument {
    pub fn new(title: impl Into<String>) -> Self {
        HtmlDocument {
            title: title.into(),
            style: STYLE_SHEET.to_string(),
            body: Vec::new(),
        }
    }

    pub fn push(&mut self, node: Node) {
        self.body.push(node);
    }

    pub fn render(&self) -> String {
        let head = Node::element("head")
            .child(Node::with_text("title", self.title.clone()))
            .child(Node::with_text("style", self.style.clone()));
        let body = Node::element("body").children(self.body.iter().cloned());
        let html = Node::element("html").child(head).child(body);
        let mut out = String::from("<!DOCTYPE html>\n");
        html.write_to(&mut out, 0);
        out
    }
}

/// Columns of the dominant-topic table: header and the value shown for a
/// `DominantTopic`, one cell per column.
const TOPIC_COLUMNS: [(&str, fn(&DominantTopic) -> String); 3] = [
    ("topic", topic_cell),
    ("percentage", percentage_cell),
    ("words", words_cell),
];

fn topic_cell(d: &DominantTopic) -> String {
    d.topic.to_string()
}

fn percentage_cell(d: &DominantTopic) -> String {
    format_decimal(d.probability)
}

fn words_cell(d: &DominantTopic) -> String {
    d.keywords.clone()
}

/// Shortest exact representation, always with a decimal point (`4.0`,
/// `4.333333333333333`).
pub fn format_decimal(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

pub fn format_ratio(ratio: Option<f64>) -> String {
    match ratio {
        Some(r) => format_decimal(r),
        None => "undefined".to_string(),
    }
}

pub fn stat_lines(stats: &PartStats) -> [String; 3] {
    [
        format!("number of sentences: {}", stats.sentences),
        format!("number of tokens: {}", stats.tokens),
        format!(
            "tokens per sentence: {}",
            format_ratio(stats.tokens_per_sentence)
        ),
    ]
}

/// Heading, statistics, word cloud and dominant-topic table of one entry.
pub fn part_section(
    label: &str,
    stats: &PartStats,
    word_cloud: &str,
    dominant: &DominantTopic,
) -> Vec<Node> {
    let numbers = Node::element("ul")
        .attr("class", "numbers")
        .children(stat_lines(stats).into_iter().map(|l| Node::with_text("li", l)));
    let cloud = Node::element("div")
        .attr("class", "wordcloud")
        .child(Node::element("img").attr("src", word_cloud));
    let header = Node::element("tr").children(
        TOPIC_COLUMNS
            .iter()
            .map(|(name, _)| Node::with_text("th", *name)),
    );
    let row = Node::element("tr").children(
        TOPIC_COLUMNS
            .iter()
            .map(|(_, value)| Node::with_text("td", value(dominant))),
    );
    let table = Node::element("div")
        .attr("class", "topic_doc")
        .child(Node::element("table").child(header).child(row));
    vec![Node::with_text("h1", label), numbers, cloud, table]
}

pub fn summary_section(topic_cloud: &str) -> Node {
    Node::element("div")
        .attr("class", "topic_cloud")
        .child(Node::element("img").attr("src", topic_cloud))
}

/// Assembles the report. All per-entry inputs must be index-aligned with
/// the corpus.
pub fn build_report(
    base: &str,
    corpus: &Corpus,
    analysis: &LexicalAnalysis,
    clouds: &WordClouds,
    summary: &TopicSummary,
    generated: DateTime<Local>,
) -> Result<HtmlDocument> {
    info!("Generating HTML");
    check_aligned("lexical analysis", corpus.len(), analysis.parts.len())?;
    check_aligned("word clouds", corpus.len(), clouds.artifacts.len())?;
    check_aligned("topic summary", corpus.len(), summary.dominant.len())?;

    let mut doc = HtmlDocument::new(format!("Analysis of document: {base}"));
    for (counter, entry) in corpus.entries().iter().enumerate() {
        info!("Generating part {counter}");
        for node in part_section(
            &entry.label,
            &analysis.parts[counter],
            &clouds.artifacts[counter].file_name,
            &summary.dominant[counter],
        ) {
            doc.push(node);
        }
    }
    doc.push(summary_section(&summary.topic_cloud));
    doc.push(
        Node::with_text(
            "p",
            format!("Generated on {}", generated.format("%Y-%m-%d %H:%M:%S")),
        )
        .attr("class", "generated"),
    );
    Ok(doc)
}

fn check_aligned(stage: &'static str, expected: usize, found: usize) -> Result<()> {
    if expected == found {
        Ok(())
    } else {
        Err(Error::Misaligned {
            stage,
            expected,
            found,
        })
    }
}

/// Writes `<output_dir>/<base>.html`, replacing an existing file.
pub fn write_report(doc: &HtmlDocument, output_dir: &Path, base: &str) -> Result<PathBuf> {
    let path = output_dir.join(format!("{base}.html"));
    fs::write(&path, doc.render()).map_err(|source| Error::Write {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(sentences: usize, tokens: usize) -> PartStats {
        PartStats {
            sentences,
            tokens,
            tokens_per_sentence: crate::lexical::tokens_per_sentence(tokens, sentences),
            cleaned: vec![],
        }
    }

    fn dominant() -> DominantTopic {
        DominantTopic {
            topic: 7,
            probability: 0.9741,
            keywords: "cat, dog".to_string(),
        }
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(escape_text("a < b & c > d"), "a &lt; b &amp; c &gt; d");
        assert_eq!(escape_attr("say \"hi\""), "say &quot;hi&quot;");
    }

    #[test]
    fn renders_nested_elements() {
        let node = Node::element("div")
            .attr("class", "x")
            .child(Node::with_text("h1", "Title"))
            .child(Node::element("img").attr("src", "a.png"));
        let mut out = String::new();
        node.write_to(&mut out, 0);
        assert_eq!(
            out,
            "<div class=\"x\">\n  <h1>Title</h1>\n  <img src=\"a.png\">\n</div>\n"
        );
    }

    #[test]
    fn stat_lines_show_ratio_or_undefined() {
        assert_eq!(
            stat_lines(&stats(2, 9)),
            [
                "number of sentences: 2".to_string(),
                "number of tokens: 9".to_string(),
                "tokens per sentence: 4.5".to_string(),
            ]
        );
        assert_eq!(stat_lines(&stats(1, 4))[2], "tokens per sentence: 4.0");
        assert_eq!(
            stat_lines(&stats(3, 13))[2],
            "tokens per sentence: 4.333333333333333"
        );
        assert_eq!(stat_lines(&stats(0, 0))[2], "tokens per sentence: undefined");
    }

    #[test]
    fn certain_topic_keeps_its_decimal_point() {
        let certain = DominantTopic {
            probability: 1.0,
            ..dominant()
        };
        assert_eq!(percentage_cell(&certain), "1.0");
        assert_eq!(percentage_cell(&dominant()), "0.9741");
    }

    #[test]
    fn topic_row_has_one_cell_per_column() {
        let nodes = part_section("ch1", &stats(1, 4), "ch1.png", &dominant());
        assert_eq!(nodes.len(), 4);
        let mut html = String::new();
        for n in &nodes {
            n.write_to(&mut html, 0);
        }
        assert!(html.contains("<h1>ch1</h1>"));
        assert!(html.contains("<img src=\"ch1.png\">"));
        assert!(html.contains("<th>topic</th>"));
        assert!(html.contains("<th>percentage</th>"));
        assert!(html.contains("<th>words</th>"));
        assert!(html.contains("<td>7</td>"));
        assert!(html.contains("<td>0.9741</td>"));
        assert!(html.contains("<td>cat, dog</td>"));
        assert_eq!(html.matches("<td>").count(), TOPIC_COLUMNS.len());
    }

    #[test]
    fn document_has_title_and_style() {
        let mut doc = HtmlDocument::new("Analysis of document: book");
        doc.push(summary_section("topic_cloud.png"));
        let html = doc.render();
        assert!(html.starts_with("<!DOCTYPE html>\n<html>"));
        assert!(html.contains("<title>Analysis of document: book</title>"));
        assert!(html.contains("body {background-color: powderblue;}"));
        assert!(html.contains("<div class=\"topic_cloud\">"));
        assert!(html.trim_end().ends_with("</html>"));
    }
}
