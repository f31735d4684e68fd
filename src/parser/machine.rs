use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, trace};

use super::classify::{classify, is_bare_digits, is_race_frequency, LineKind, WeekHeader};
use super::cursor::LineCursor;
use super::lines::{clean_spaces, Line};
use crate::index::ScheduleRecord;
use crate::settings::ParseSettings;

// Weather or lap count that ran on to the end of a track line.
static TRACK_TAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|\s+)(?:\d+\s+laps?\b|-?\d+(?:\.\d+)?\s*°\s*[FC]\b|Rain chance\b).*$").unwrap()
});
// Dot leaders (and a trailing page number) after a series title.
static FILL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\s+[.·…]+|[.·…]{2,})[\s.·…]*(?:\d+\s*)?$").unwrap());

/// Hierarchical state carried across lines and pages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseContext {
    pub category: String,
    pub class_letter: String,
    pub group: String,
    pub series: String,
    pub series_car_buffer: Vec<String>,
    pub collecting_series_cars: bool,
    /// Joined series buffer; the fallback car list for weeks without their own.
    pub series_cars: String,
    pub series_schedule: String,
}

impl ParseContext {
    fn enter_category(&mut self, category: String) {
        self.category = category;
        self.class_letter.clear();
        self.group.clear();
        self.reset_series();
    }

    fn enter_class_group(&mut self, letter: String, group: String) {
        self.class_letter = letter;
        self.group = group;
        self.reset_series();
    }

    fn enter_series(&mut self, title: String) {
        self.flush_series_cars();
        self.reset_series();
        self.series = title;
        self.collecting_series_cars = true;
    }

    fn reset_series(&mut self) {
        self.series.clear();
        self.series_car_buffer.clear();
        self.series_cars.clear();
        self.series_schedule.clear();
        self.collecting_series_cars = false;
    }

    /// Close series-car collection, keeping what was gathered so far.
    fn flush_series_cars(&mut self) {
        if !self.collecting_series_cars {
            return;
        }
        self.series_cars = clean_spaces(&self.series_car_buffer.join(" "));
        self.series_car_buffer.clear();
        self.collecting_series_cars = false;
        trace!(series = %self.series, cars = %self.series_cars, "series cars flushed");
    }
}

/// Turns the ordered lines of a document into schedule records.
pub struct ScheduleStateMachine {
    context: ParseContext,
    records: Vec<ScheduleRecord>,
    short_join_max: usize,
}

impl ScheduleStateMachine {
    pub fn new(settings: &ParseSettings) -> Self {
        ScheduleStateMachine {
            context: ParseContext::default(),
            records: Vec::new(),
            short_join_max: settings.short_join_max,
        }
    }

    pub fn context(&self) -> &ParseContext {
        &self.context
    }

    pub fn records(&self) -> &[ScheduleRecord] {
        &self.records
    }

    pub fn finish(self) -> Vec<ScheduleRecord> {
        self.records
    }

    /// Process one page. Lookahead never crosses into the next page; the
    /// context does.
    pub fn feed_page(&mut self, lines: &[Line]) {
        let mut cursor = LineCursor::new(lines);
        while let Some(line) = cursor.advance() {
            self.step(line, &mut cursor);
        }
    }

    fn step(&mut self, line: &Line, cursor: &mut LineCursor) {
        match classify(&line.text) {
            LineKind::Category(name) => self.context.enter_category(name),
            LineKind::ClassGroup { letter, group } => self.context.enter_class_group(letter, group),
            LineKind::SeriesTitle => self.context.enter_series(trim_fill(&line.text)),
            LineKind::WeekHeader(header) => {
                self.context.flush_series_cars();
                self.emit_week(header, line, cursor);
            }
            LineKind::SeriesMeta => {
                if !self.context.series.is_empty()
                    && self.context.series_schedule.is_empty()
                    && is_race_frequency(&line.text)
                {
                    self.context.series_schedule = clean_spaces(&line.text);
                }
            }
            _ if self.context.collecting_series_cars => {
                if !is_bare_digits(&line.text) {
                    self.context.series_car_buffer.push(line.text.clone());
                }
            }
            _ => trace!(page = line.page, rank = line.rank, text = %line.text, "line dropped"),
        }
    }

    fn emit_week(&mut self, header: WeekHeader, line: &Line, cursor: &mut LineCursor) {
        let mut track = clean_track(&header.rest);
        if track.is_empty() {
            track = take_track_line(cursor);
        }
        if self.takes_continuation(&track, cursor) {
            if let Some(next) = cursor.advance() {
                track = clean_spaces(&format!("{} {}", track, next.text));
            }
        }
        let week_cars = collect_week_cars(cursor);

        if track.is_empty() {
            debug!(page = line.page, week = header.week, "week header without track, skipped");
            return;
        }

        let cars = if week_cars.is_empty() {
            self.context.series_cars.clone()
        } else {
            week_cars
        };

        let ctx = &self.context;
        self.records.push(ScheduleRecord {
            category: ctx.category.clone(),
            class_letter: ctx.class_letter.clone(),
            group: ctx.group.clone(),
            series: ctx.series.clone(),
            week: header.week,
            week_start: header.start,
            track,
            cars,
            schedule: ctx.series_schedule.clone(),
        });
    }

    /// Whether the next line continues a wrapped track name.
    fn takes_continuation(&self, track: &str, cursor: &LineCursor) -> bool {
        let Some(next) = cursor.peek() else {
            return false;
        };
        if track.is_empty() || classify(&next.text) != LineKind::Unknown {
            return false;
        }
        if track.ends_with('-') {
            return true;
        }
        if next.text.chars().count() > self.short_join_max {
            return false;
        }
        // Keep the line as a car name if the week would otherwise have none.
        !self.context.series_cars.is_empty() || has_car_line(&cursor.remaining()[1..])
    }
}

/// Strip a trailing weather reading or lap count and normalize spacing.
/// Text that is nothing but a start time or page number yields no track.
fn clean_track(raw: &str) -> String {
    let cleaned = clean_spaces(raw);
    let track = TRACK_TAIL_RE.replace(&cleaned, "");
    let track = track.trim();
    if track.starts_with('(') || is_bare_digits(track) {
        return String::new();
    }
    track.to_string()
}

fn trim_fill(title: &str) -> String {
    clean_spaces(&FILL_RE.replace(title, ""))
}

/// Track printed on its own line under a bare `Week n (date)` header.
fn take_track_line(cursor: &mut LineCursor) -> String {
    while let Some(line) = cursor.peek() {
        match classify(&line.text) {
            kind if kind.is_structural() => break,
            LineKind::Garbage | LineKind::SeriesMeta => {
                cursor.advance();
            }
            _ => {
                cursor.advance();
                return clean_track(&line.text);
            }
        }
    }
    String::new()
}

/// Consume the week's detail block up to the next structural header.
fn collect_week_cars(cursor: &mut LineCursor) -> String {
    let mut cars: Vec<&str> = Vec::new();
    while let Some(line) = cursor.peek() {
        match classify(&line.text) {
            kind if kind.is_structural() => break,
            LineKind::Garbage | LineKind::SeriesMeta => {}
            _ => cars.push(&line.text),
        }
        cursor.advance();
    }
    clean_spaces(&cars.join(" "))
}

fn has_car_line(lines: &[Line]) -> bool {
    lines
        .iter()
        .map(|l| classify(&l.text))
        .take_while(|k| !k.is_structural())
        .any(|k| k == LineKind::Unknown)
}
