//! Page-by-page fragment suppliers for the parser.
//!
//! Text extraction from the binary document happens elsewhere; these adapters
//! read what the extractor produced: a JSON dump of positioned fragments
//! (plain `{x, y, text}` or pdf.js text-content items) or a plain-text export
//! with form feeds between pages.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::IgnoredAny;
use serde::Deserialize;
use thiserror::Error;

use crate::parser::lines::TextFragment;

/// Vertical spacing given to synthetic fragments built from plain text.
const TEXT_LINE_PITCH: f64 = 12.0;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode fragment dump {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("unsupported input {0} (expected .json or .txt)")]
    Unsupported(PathBuf),
    #[error("page {index} out of range (document has {count} pages)")]
    PageOutOfRange { index: usize, count: usize },
}

pub trait FragmentSource {
    fn page_count(&self) -> usize;
    fn page(&mut self, index: usize) -> Result<Vec<TextFragment>, SourceError>;
}

/// Pick an adapter from the file extension.
pub fn open_source(path: &Path) -> Result<Box<dyn FragmentSource>, SourceError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("json") => Ok(Box::new(JsonDump::open(path)?)),
        Some("txt") | Some("text") => Ok(Box::new(PlainText::open(path)?)),
        _ => Err(SourceError::Unsupported(path.to_path_buf())),
    }
}

fn read_file(path: &Path) -> Result<String, SourceError> {
    fs::read_to_string(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn out_of_range(index: usize, count: usize) -> SourceError {
    SourceError::PageOutOfRange { index, count }
}

// ── JSON fragment dump ──

#[derive(Deserialize)]
#[serde(untagged)]
enum DumpFile {
    Bare(Vec<Vec<RawFragment>>),
    Wrapped { pages: Vec<Vec<RawFragment>> },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFragment {
    Plain {
        x: f64,
        y: f64,
        text: String,
    },
    PdfJs {
        #[serde(rename = "str")]
        text: String,
        transform: [f64; 6],
    },
    // pdf.js beginMarkedContent / endMarkedContent items
    Marker {
        #[serde(rename = "type")]
        _kind: IgnoredAny,
    },
}

impl RawFragment {
    fn into_fragment(self) -> Option<TextFragment> {
        match self {
            RawFragment::Plain { x, y, text } => Some(TextFragment { x, y, text }),
            RawFragment::PdfJs { text, transform } => Some(TextFragment {
                x: transform[4],
                y: transform[5],
                text,
            }),
            RawFragment::Marker { .. } => None,
        }
    }
}

pub struct JsonDump {
    pages: Vec<Vec<TextFragment>>,
}

impl JsonDump {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let raw = read_file(path)?;
        Self::from_json(&raw).map_err(|source| SourceError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let dump: DumpFile = serde_json::from_str(json)?;
        let raw_pages = match dump {
            DumpFile::Wrapped { pages } => pages,
            DumpFile::Bare(pages) => pages,
        };
        let pages = raw_pages
            .into_iter()
            .map(|p| p.into_iter().filter_map(RawFragment::into_fragment).collect())
            .collect();
        Ok(JsonDump { pages })
    }
}

impl FragmentSource for JsonDump {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page(&mut self, index: usize) -> Result<Vec<TextFragment>, SourceError> {
        self.pages
            .get(index)
            .cloned()
            .ok_or_else(|| out_of_range(index, self.pages.len()))
    }
}

// ── Plain text export ──

pub struct PlainText {
    pages: Vec<Vec<String>>,
}

impl PlainText {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        Ok(Self::from_text(&read_file(path)?))
    }

    pub fn from_text(text: &str) -> Self {
        let mut pages: Vec<Vec<String>> = text
            .split('\x0c')
            .map(|page| page.lines().map(str::to_string).collect())
            .collect();
        // A trailing form feed leaves an empty page behind.
        if pages.len() > 1 && pages.last().is_some_and(|p| p.iter().all(|l| l.trim().is_empty())) {
            pages.pop();
        }
        PlainText { pages }
    }
}

impl FragmentSource for PlainText {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page(&mut self, index: usize) -> Result<Vec<TextFragment>, SourceError> {
        let lines = self
            .pages
            .get(index)
            .ok_or_else(|| out_of_range(index, self.pages.len()))?;
        Ok(lines
            .iter()
            .enumerate()
            .map(|(i, text)| TextFragment::new(0.0, -(i as f64) * TEXT_LINE_PITCH, text.as_str()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapped_dump() {
        let json = r#"{"pages": [[{"x": 1.0, "y": 700.0, "text": "OVAL"}], []]}"#;
        let mut dump = JsonDump::from_json(json).unwrap();
        assert_eq!(dump.page_count(), 2);
        assert_eq!(dump.page(0).unwrap(), vec![TextFragment::new(1.0, 700.0, "OVAL")]);
        assert!(dump.page(1).unwrap().is_empty());
    }

    #[test]
    fn bare_dump_with_pdfjs_items() {
        let json = r#"[[
            {"str": "Week 1", "transform": [10, 0, 0, 10, 72.5, 640.0], "width": 30},
            {"type": "beginMarkedContent"},
            {"x": 0, "y": 1, "text": "plain"}
        ]]"#;
        let mut dump = JsonDump::from_json(json).unwrap();
        let frags = dump.page(0).unwrap();
        assert_eq!(frags.len(), 2);
        assert_eq!(frags[0], TextFragment::new(72.5, 640.0, "Week 1"));
        assert_eq!(frags[1].text, "plain");
    }

    #[test]
    fn malformed_dump() {
        assert!(JsonDump::from_json(r#"{"pages": 3}"#).is_err());
        assert!(JsonDump::from_json("not json").is_err());
        assert!(JsonDump::from_json(r#"[[{"x": "left", "y": 1, "text": "a"}]]"#).is_err());
    }

    #[test]
    fn single_empty_page_is_kept() {
        assert_eq!(JsonDump::from_json("[[]]").unwrap().page_count(), 1);
    }

    #[test]
    fn page_out_of_range() {
        let mut dump = JsonDump::from_json("[]").unwrap();
        assert!(matches!(
            dump.page(0),
            Err(SourceError::PageOutOfRange { index: 0, count: 0 })
        ));
    }

    #[test]
    fn plain_text_pages() {
        let mut src = PlainText::from_text("OVAL\nR Class Series (Legends)\n\x0c2026 Season X\n\x0c");
        assert_eq!(src.page_count(), 2);
        let first = src.page(0).unwrap();
        assert_eq!(first.len(), 2);
        assert!(first[0].y > first[1].y);
        assert_eq!(src.page(1).unwrap()[0].text, "2026 Season X");
        assert!(src.page(2).is_err());
    }

    #[test]
    fn open_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let txt = dir.path().join("schedule.txt");
        std::fs::write(&txt, "OVAL\n").unwrap();
        assert_eq!(open_source(&txt).unwrap().page_count(), 1);

        let pdf = dir.path().join("schedule.pdf");
        std::fs::write(&pdf, b"%PDF").unwrap();
        assert!(matches!(open_source(&pdf), Err(SourceError::Unsupported(_))));

        let missing = dir.path().join("missing.json");
        assert!(matches!(open_source(&missing), Err(SourceError::Io { .. })));
    }
}
