use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

static CLASS_GROUP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^([RDCBA])\s+Class\s+Series\s*\((.+)\)\s*$").unwrap());
static SEASON_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\b20\d{2}\s+Season\b").unwrap());
static WEEK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^Week\s+(\d+)\s*\((\d{4}-\d{2}-\d{2})\)\s*(.*)$").unwrap()
});
static LAPS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\b\d+\s+laps?\b").unwrap());
static TEMP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-?\d+(?:\.\d+)?\s*°\s*[FC]\b|°F/").unwrap());
static DIGITS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+$").unwrap());
static GARBAGE_PHRASE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)Rain chance|Rolling start|Standing start|Cautions|Qual scrutiny|Start zone|Lucky dog|Single-file|Double-file",
    )
    .unwrap()
});
static META_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^Races\b|Races every|Rookie|Pro/WC|Min entries|No incident|Incident limit|DQ at|Penalty|See race week|Split at|Drops:",
    )
    .unwrap()
});

pub const CATEGORIES: &[&str] = &[
    "OVAL",
    "SPORTS CAR",
    "FORMULA CAR",
    "DIRT OVAL",
    "DIRT ROAD",
    "UNRANKED",
];

/// Tag for one reconstructed line. Variants are listed in match priority.
#[derive(Debug, Clone, PartialEq)]
pub enum LineKind {
    Category(String),
    ClassGroup { letter: String, group: String },
    SeriesTitle,
    WeekHeader(WeekHeader),
    Garbage,
    SeriesMeta,
    Unknown,
}

impl LineKind {
    /// Category, class group, series title and week header open a new scope.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            LineKind::Category(_)
                | LineKind::ClassGroup { .. }
                | LineKind::SeriesTitle
                | LineKind::WeekHeader(_)
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            LineKind::Category(_) => "category",
            LineKind::ClassGroup { .. } => "class",
            LineKind::SeriesTitle => "series",
            LineKind::WeekHeader(_) => "week",
            LineKind::Garbage => "garbage",
            LineKind::SeriesMeta => "meta",
            LineKind::Unknown => "-",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeekHeader {
    pub week: u32,
    pub start: NaiveDate,
    /// Text after the date, untouched. May be empty.
    pub rest: String,
}

pub fn classify(line: &str) -> LineKind {
    let line = line.trim();
    if is_category_line(line) {
        return LineKind::Category(line.to_string());
    }
    if let Some((letter, group)) = parse_class_group(line) {
        return LineKind::ClassGroup { letter, group };
    }
    if looks_like_series_title(line) {
        return LineKind::SeriesTitle;
    }
    if let Some(header) = parse_week_header(line) {
        return LineKind::WeekHeader(header);
    }
    if is_week_garbage(line) {
        return LineKind::Garbage;
    }
    if is_series_meta(line) {
        return LineKind::SeriesMeta;
    }
    LineKind::Unknown
}

pub fn is_category_line(line: &str) -> bool {
    CATEGORIES.contains(&line.trim())
}

pub fn parse_class_group(line: &str) -> Option<(String, String)> {
    let caps = CLASS_GROUP_RE.captures(line.trim())?;
    Some((caps[1].to_uppercase(), caps[2].trim().to_string()))
}

pub fn looks_like_series_title(line: &str) -> bool {
    SEASON_RE.is_match(line)
}

pub fn parse_week_header(line: &str) -> Option<WeekHeader> {
    let caps = WEEK_RE.captures(line.trim())?;
    let week = caps[1].parse().ok()?;
    let start = NaiveDate::parse_from_str(&caps[2], "%Y-%m-%d").ok()?;
    Some(WeekHeader {
        week,
        start,
        rest: caps[3].to_string(),
    })
}

/// Noise inside a week's detail block that is never a car name.
pub fn is_week_garbage(line: &str) -> bool {
    let s = line.trim();
    s.is_empty()
        || s.starts_with('(')
        || is_bare_digits(s)
        || TEMP_RE.is_match(s)
        || LAPS_RE.is_match(s)
        || GARBAGE_PHRASE_RE.is_match(s)
}

/// Series-level rule text (frequency, entries, incidents, penalties, ratings).
pub fn is_series_meta(line: &str) -> bool {
    META_RE.is_match(line.trim())
}

pub fn is_bare_digits(line: &str) -> bool {
    DIGITS_RE.is_match(line.trim())
}

/// `Races ...` sentence describing when a series runs.
pub fn is_race_frequency(line: &str) -> bool {
    line.trim_start().get(..6).is_some_and(|p| p.eq_ignore_ascii_case("races "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_category() {
        for cat in CATEGORIES {
            assert_eq!(classify(cat), LineKind::Category(cat.to_string()));
        }
        assert_eq!(classify("  DIRT ROAD "), LineKind::Category("DIRT ROAD".into()));
    }

    #[test]
    fn category_is_exact() {
        assert_eq!(classify("Oval"), LineKind::Unknown);
        assert_eq!(classify("OVAL SERIES"), LineKind::Unknown);
    }

    #[test]
    fn class_group() {
        let kind = classify("R Class Series (Legends)");
        assert_eq!(
            kind,
            LineKind::ClassGroup {
                letter: "R".into(),
                group: "Legends".into()
            }
        );
        for letter in ['R', 'D', 'C', 'B', 'A'] {
            let line = format!("{letter} Class Series (Fixed)");
            assert!(parse_class_group(&line).is_some(), "{line}");
        }
    }

    #[test]
    fn class_group_rejects_other_letters() {
        assert!(parse_class_group("E Class Series (Legends)").is_none());
        assert!(parse_class_group("R Class Series").is_none());
    }

    #[test]
    fn series_title() {
        assert_eq!(classify("2026 Season Fixed Setup"), LineKind::SeriesTitle);
        assert_eq!(
            classify("Global Mazda MX-5 Fixed - 2026 Season 1 ......"),
            LineKind::SeriesTitle
        );
        assert!(!looks_like_series_title("Season 2026"));
        assert!(!looks_like_series_title("1999 Season"));
    }

    #[test]
    fn week_header_with_track() {
        let LineKind::WeekHeader(h) = classify("Week 3 (2026-01-20) Daytona International Speedway -")
        else {
            panic!("not a week header");
        };
        assert_eq!(h.week, 3);
        assert_eq!(h.start, NaiveDate::from_ymd_opt(2026, 1, 20).unwrap());
        assert_eq!(h.rest, "Daytona International Speedway -");
    }

    #[test]
    fn week_header_alone() {
        let h = parse_week_header("Week 12 (2026-03-31)").unwrap();
        assert_eq!(h.week, 12);
        assert!(h.rest.is_empty());
    }

    #[test]
    fn week_header_needs_real_date() {
        assert!(parse_week_header("Week 1 (2026-13-40) Nowhere").is_none());
        assert_eq!(classify("Week 1 (2026-13-40) Nowhere"), LineKind::Unknown);
    }

    #[test]
    fn garbage_family() {
        for line in [
            "(20:00 GMT)",
            "3 laps",
            "72°F/22°C",
            "Rain chance 40%",
            "Rolling start",
            "Cautions disabled",
            "Qual scrutiny - heavy",
            "Lucky dog",
            "Double-file restarts",
            "42",
        ] {
            assert_eq!(classify(line), LineKind::Garbage, "{line}");
        }
    }

    #[test]
    fn meta_family() {
        for line in [
            "Races every 2 hours at :15",
            "Races Friday at 19 GMT",
            "Min entries: 8, Split at: 20",
            "No incident limit",
            "DQ at 25x",
            "Penalty: 30s",
            "Rookie 4.0 --> Pro/WC 4.0",
            "See race week for details",
            "Drops: 4",
        ] {
            assert_eq!(classify(line), LineKind::SeriesMeta, "{line}");
        }
    }

    #[test]
    fn cars_are_unknown() {
        assert_eq!(classify("Chevrolet Impala"), LineKind::Unknown);
        assert_eq!(classify("Global Mazda MX-5 Cup"), LineKind::Unknown);
        assert_eq!(classify("Road Course"), LineKind::Unknown);
    }

    #[test]
    fn priority_category_over_everything() {
        assert!(classify("OVAL").is_structural());
        // A week line mentioning laps is still a week header.
        assert!(matches!(
            classify("Week 1 (2026-01-01) Charlotte Motor Speedway 30 laps"),
            LineKind::WeekHeader(_)
        ));
        // A series title carrying a rookie note stays a series title.
        assert_eq!(classify("2026 Season Rookie Mazda"), LineKind::SeriesTitle);
    }

    #[test]
    fn race_frequency() {
        assert!(is_race_frequency("Races every 30 minutes at :15 and :45"));
        assert!(!is_race_frequency("Racesway Park"));
        assert!(!is_race_frequency("Min entries: 8"));
    }
}
