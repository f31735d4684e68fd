pub mod classify;
pub mod cursor;
pub mod lines;
pub mod machine;
pub mod tracks;

use tracing::{debug, info};

use crate::index::ScheduleIndex;
use crate::settings::ParseSettings;
use crate::source::{FragmentSource, SourceError};
use machine::ScheduleStateMachine;

/// Four-stage pipeline: fragments → lines → records → track index.
///
/// Pages are read strictly in order; any page failure aborts the whole parse.
pub fn parse_document(
    source: &mut dyn FragmentSource,
    settings: &ParseSettings,
    mut on_page: impl FnMut(usize),
) -> Result<ScheduleIndex, SourceError> {
    let page_count = source.page_count();
    let mut machine = ScheduleStateMachine::new(settings);

    for page in 0..page_count {
        let fragments = source.page(page)?;
        let fragment_count = fragments.len();
        let lines = lines::reconstruct_lines(page, fragments, settings.line_tolerance);
        machine.feed_page(&lines);
        debug!(
            page,
            fragments = fragment_count,
            lines = lines.len(),
            records = machine.records().len(),
            category = %machine.context().category,
            "page parsed"
        );
        on_page(page);
    }

    let records = machine.finish();
    let tracks = tracks::build_track_index(&records);
    info!(
        pages = page_count,
        records = records.len(),
        tracks = tracks.len(),
        "schedule parsed"
    );
    Ok(ScheduleIndex::new(records, tracks))
}
