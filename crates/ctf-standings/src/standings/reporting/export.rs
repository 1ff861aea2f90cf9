use std::io::Write;

use serde::Serialize;

use super::super::domain::{EventId, GroupId, Rank, Score};
use super::views::GroupReport;

#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    group_id: GroupId,
    description: &'a str,
    best_rank: Option<Rank>,
    event_id: Option<EventId>,
    score: Option<Score>,
    rank: Option<Rank>,
}

/// Write one CSV row per placement; groups without placements get a single row with
/// empty event columns.
pub(crate) fn write_reports<W: Write>(reports: &[GroupReport], writer: W) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    for report in reports {
        if report.placements.is_empty() {
            csv_writer.serialize(ExportRow {
                group_id: report.group_id,
                description: &report.description,
                best_rank: report.best_rank,
                event_id: None,
                score: None,
                rank: None,
            })?;
            continue;
        }

        for placement in &report.placements {
            csv_writer.serialize(ExportRow {
                group_id: report.group_id,
                description: &report.description,
                best_rank: report.best_rank,
                event_id: Some(placement.event_id),
                score: Some(placement.score),
                rank: Some(placement.rank),
            })?;
        }
    }

    csv_writer.flush()?;
    Ok(())
}
