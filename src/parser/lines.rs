use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Fragments whose baselines are closer than this share a row.
pub const DEFAULT_LINE_TOLERANCE: f64 = 2.0;

/// One positioned glyph run. `y` grows upward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextFragment {
    pub x: f64,
    pub y: f64,
    pub text: String,
}

impl TextFragment {
    pub fn new(x: f64, y: f64, text: impl Into<String>) -> Self {
        TextFragment {
            x,
            y,
            text: text.into(),
        }
    }
}

/// A reconstructed row of text and where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub text: String,
    pub page: usize,
    pub rank: usize,
}

/// Collapse every whitespace run to a single space and trim.
pub fn clean_spaces(s: &str) -> String {
    WS_RE.replace_all(s.trim(), " ").into_owned()
}

/// Rebuild reading-order lines (top to bottom, left to right) from one page.
pub fn reconstruct_lines(page: usize, fragments: Vec<TextFragment>, tolerance: f64) -> Vec<Line> {
    let mut frags: Vec<TextFragment> = fragments
        .into_iter()
        .filter(|f| !f.text.trim().is_empty())
        .collect();
    frags.sort_by(|a, b| b.y.total_cmp(&a.y).then(a.x.total_cmp(&b.x)));

    let mut rows: Vec<Vec<TextFragment>> = Vec::new();
    let mut reference_y = f64::NAN;
    for frag in frags {
        match rows.last_mut() {
            Some(row) if (frag.y - reference_y).abs() <= tolerance => row.push(frag),
            _ => {
                reference_y = frag.y;
                rows.push(vec![frag]);
            }
        }
    }

    rows.into_iter()
        .map(join_row)
        .filter(|text| !text.is_empty())
        .enumerate()
        .map(|(rank, text)| Line { text, page, rank })
        .collect()
}

fn join_row(mut row: Vec<TextFragment>) -> String {
    row.sort_by(|a, b| a.x.total_cmp(&b.x));
    let joined = row
        .iter()
        .map(|f| f.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    clean_spaces(&joined)
}
