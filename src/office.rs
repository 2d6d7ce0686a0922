//! Plain-text extraction for the non-text document formats a part may come in.

use quick_xml::Reader;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::Event;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use zip::ZipArchive;

/// Where the body text lives inside an office package, which elements end a
/// line and which elements hold text whose whitespace is content.
struct PackageLayout {
    kind: &'static str,
    entry: &'static str,
    line_breaks: &'static [&'static [u8]],
    paragraphs: &'static [&'static [u8]],
    text_runs: &'static [&'static [u8]],
    spaces: &'static [&'static [u8]],
}

const DOCX: PackageLayout = PackageLayout {
    kind: ".docx",
    entry: "word/document.xml",
    line_breaks: &[b"br"],
    paragraphs: &[b"p"],
    text_runs: &[b"t"],
    spaces: &[],
};

const ODT: PackageLayout = PackageLayout {
    kind: ".odt",
    entry: "content.xml",
    line_breaks: &[b"line-break", b"br"],
    paragraphs: &[b"p", b"h"],
    text_runs: &[b"p", b"h", b"span", b"a"],
    spaces: &[b"s"],
};

pub fn extract_text_from_docx(p: &Path) -> Result<String, String> {
    extract_package_text(p, &DOCX)
}

pub fn extract_text_from_odt(p: &Path) -> Result<String, String> {
    extract_package_text(p, &ODT)
}

pub fn extract_text_from_pdf(p: &Path) -> Result<String, String> {
    pdf_extract::extract_text(p).map_err(|e| format!("Extract .pdf text failed: {e}"))
}

fn extract_package_text(p: &Path, layout: &PackageLayout) -> Result<String, String> {
    let kind = layout.kind;
    let file = File::open(p).map_err(|e| format!("Open {kind} failed: {e}"))?;
    let mut zip = ZipArchive::new(file).map_err(|e| format!("Open {kind} zip failed: {e}"))?;
    let mut entry = zip
        .by_name(layout.entry)
        .map_err(|_| format!("Missing {}", layout.entry))?;
    let mut xml = String::new();
    entry
        .read_to_string(&mut xml)
        .map_err(|e| format!("Read {} failed: {e}", layout.entry))?;
    body_text(&xml, layout)
}

fn body_text(xml: &str, layout: &PackageLayout) -> Result<String, String> {
    let mut reader = Reader::from_str(xml);
    let mut out = String::new();
    // open text-run elements around the current position
    let mut in_run = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.name();
                push_marks(&mut out, name.as_ref(), layout);
                if is_one_of(name.as_ref(), layout.text_runs) {
                    in_run += 1;
                }
            }
            Ok(Event::Empty(e)) => {
                let name = e.name();
                push_marks(&mut out, name.as_ref(), layout);
                if is_one_of(name.as_ref(), layout.paragraphs) {
                    out.push('\n');
                }
            }
            Ok(Event::End(e)) => {
                let name = e.name();
                if is_one_of(name.as_ref(), layout.paragraphs) {
                    out.push('\n');
                }
                if is_one_of(name.as_ref(), layout.text_runs) {
                    in_run = in_run.saturating_sub(1);
                }
            }
            Ok(Event::Text(t)) => {
                let text = t.decode().map_err(|e| e.to_string())?;
                // whitespace outside text runs is indentation between tags
                if in_run > 0 || !text.trim().is_empty() {
                    out.push_str(&text);
                }
            }
            Ok(Event::GeneralRef(r)) => {
                if let Ok(Some(ch)) = r.resolve_char_ref() {
                    out.push(ch);
                } else {
                    let name = r.decode().map_err(|e| e.to_string())?;
                    if let Some(resolved) = resolve_predefined_entity(&name) {
                        out.push_str(resolved);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(format!("Parse {} XML failed: {e}", layout.kind)),
            _ => {}
        }
    }
    Ok(collapse_blank_lines(&out))
}

/// Line breaks and explicit spaces an element stands for.
fn push_marks(out: &mut String, name: &[u8], layout: &PackageLayout) {
    if is_one_of(name, layout.line_breaks) {
        out.push('\n');
    } else if is_one_of(name, layout.spaces) {
        out.push(' ');
    }
}

fn is_one_of(name: &[u8], wanted: &[&[u8]]) -> bool {
    let local = local_name(name);
    wanted.iter().any(|w| *w == local)
}

fn local_name(name: &[u8]) -> &[u8] {
    match name.iter().rposition(|&b| b == b':') {
        Some(i) => &name[i + 1..],
        None => name,
    }
}

/// Trims every line and keeps at most one blank line between paragraphs.
fn collapse_blank_lines(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last_blank = false;
    for line in s.lines().map(str::trim) {
        if line.is_empty() {
            if !last_blank && !out.is_empty() {
                out.push('\n');
            }
            last_blank = true;
        } else {
            out.push_str(line);
            out.push('\n');
            last_blank = false;
        }
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn docx_paragraphs_become_lines() {
        let xml = r#"<w:document xmlns:w="x"><w:body>
            <w:p><w:r><w:t>First chapter.</w:t></w:r></w:p>
            <w:p><w:r><w:t>Second &amp; last.</w:t></w:r></w:p>
        </w:body></w:document>"#;
        let text = body_text(xml, &DOCX).unwrap();
        assert_eq!(text, "First chapter.\nSecond & last.");
    }

    #[test]
    fn odt_line_break_splits_text() {
        let xml = r#"<office:text xmlns:text="t" xmlns:office="o"><text:p>one<text:line-break/>two</text:p></office:text>"#;
        let text = body_text(xml, &ODT).unwrap();
        assert_eq!(text, "one\ntwo");
    }

    #[test]
    fn whitespace_inside_text_runs_is_kept() {
        let xml = r#"<w:document xmlns:w="x"><w:body>
            <w:p>
                <w:r><w:t>Hello</w:t></w:r>
                <w:r><w:t xml:space="preserve"> </w:t></w:r>
                <w:r><w:t>world</w:t></w:r>
            </w:p>
            <w:p><w:r><w:t>&amp; &amp;</w:t></w:r></w:p>
        </w:body></w:document>"#;
        let text = body_text(xml, &DOCX).unwrap();
        assert_eq!(text, "Hello world\n& &");
    }

    #[test]
    fn odt_space_elements_become_spaces() {
        let xml = r#"<office:text xmlns:text="t" xmlns:office="o"><text:p>Salt<text:s/>and <text:span>pepper</text:span></text:p></office:text>"#;
        let text = body_text(xml, &ODT).unwrap();
        assert_eq!(text, "Salt and pepper");
    }

    #[test]
    fn blank_runs_collapse() {
        assert_eq!(collapse_blank_lines("  a \n\n\n\n b\n"), "a\n\nb");
    }
}
