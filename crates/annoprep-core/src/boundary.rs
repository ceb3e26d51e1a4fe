//! # Boundary Segments
//!
//! Turns boundary-point annotations over reports into labelled text segments.
//! Each annotated point opens a segment that runs until the next point; the
//! segment is tagged with the opening point's label and carries the report's
//! hospital id.

use std::collections::HashMap;
use std::io::Read;

use tracing::{debug, info, warn};

use crate::annotation::{Example, ResultItem};
use crate::error::{AnnoprepError, Result};
use crate::normalize::TextNormalizer;
use crate::table::TableRow;

/// Tag of segments that are never emitted.
pub const SENTINEL_TAG: &str = "Others";

/// Report text column of the metadata table.
pub const REPORT_COLUMN: &str = "REPORT";

/// Hospital id column of the metadata table.
pub const HOSP_ID_COLUMN: &str = "HOSP_ID";

/// One output row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundarySegment {
    pub text: String,
    pub tag: String,
    pub hosp_id: String,
}

impl TableRow for BoundarySegment {
    const HEADER: &'static [&'static str] = &["Text", "Tag", "Hosp_id"];

    fn to_record(&self) -> Result<Vec<String>> {
        Ok(vec![self.text.clone(), self.tag.clone(), self.hosp_id.clone()])
    }
}

/// An annotated boundary: where a segment starts and how it is tagged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryPoint {
    pub start: usize,
    pub tag: String,
}

/// Maps full report text to its hospital id.
#[derive(Debug, Clone, Default)]
pub struct ReportIndex {
    ids: HashMap<String, String>,
}

impl ReportIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the index from a CSV table with `REPORT` and `HOSP_ID` columns.
    ///
    /// Ids are kept verbatim. When a report appears more than once, the last
    /// row wins.
    ///
    /// # Errors
    ///
    /// Returns `AnnoprepError::MissingColumn` if either column is absent.
    pub fn from_csv<R: Read>(reader: R) -> Result<Self> {
        let mut csv = csv::Reader::from_reader(reader);
        let headers = csv.headers()?.clone();
        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| AnnoprepError::MissingColumn(name.to_string()))
        };
        let report_col = column(REPORT_COLUMN)?;
        let id_col = column(HOSP_ID_COLUMN)?;

        let mut index = Self::new();
        for record in csv.records() {
            let record = record?;
            let report = record.get(report_col).unwrap_or_default();
            let hosp_id = record.get(id_col).unwrap_or_default();
            index.insert(report, hosp_id);
        }

        info!(reports = index.len(), "loaded report index");
        Ok(index)
    }

    /// Adds or replaces the id of `report`.
    pub fn insert(&mut self, report: impl Into<String>, hosp_id: impl Into<String>) {
        let report = report.into();
        let hosp_id = hosp_id.into();
        if let Some(previous) = self.ids.get(&report) {
            if *previous != hosp_id {
                warn!(
                    previous = %previous,
                    current = %hosp_id,
                    "duplicate report with different ids, keeping the last"
                );
            }
        }
        self.ids.insert(report, hosp_id);
    }

    /// Looks up the id of `report` by exact text match.
    ///
    /// # Errors
    ///
    /// Returns `AnnoprepError::ReportNotFound` on a miss.
    pub fn get(&self, report: &str) -> Result<&str> {
        self.ids
            .get(report)
            .map(String::as_str)
            .ok_or_else(|| AnnoprepError::ReportNotFound {
                preview: report.chars().take(60).collect(),
            })
    }

    /// Number of indexed reports.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns `true` if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Reads the boundary points of one document, ordered by start offset
/// (ties keep annotation order).
pub fn boundary_points(items: &[ResultItem], index: usize) -> Result<Vec<BoundaryPoint>> {
    let mut points = items
        .iter()
        .map(|item| -> Result<BoundaryPoint> {
            let value = item
                .value
                .as_ref()
                .ok_or_else(|| AnnoprepError::malformed(index, "boundary item without value"))?;
            let start = value
                .start
                .ok_or_else(|| AnnoprepError::malformed(index, "boundary item without start"))?;
            let tag = value
                .first_label()
                .ok_or_else(|| AnnoprepError::malformed(index, "boundary item without labels"))?;
            Ok(BoundaryPoint {
                start,
                tag: tag.to_string(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    points.sort_by_key(|p| p.start);
    Ok(points)
}

/// Cuts `report` at consecutive boundary points.
///
/// The segment between two points is emitted unless the first point is
/// tagged [`SENTINEL_TAG`]. Nothing is emitted after the last point.
pub fn segments_for_report(
    report: &str,
    points: &[BoundaryPoint],
    hosp_id: &str,
    normalizer: &TextNormalizer,
) -> Vec<BoundarySegment> {
    let chars: Vec<char> = report.chars().collect();

    points
        .windows(2)
        .filter(|pair| pair[0].tag != SENTINEL_TAG)
        .map(|pair| {
            let from = pair[0].start.min(chars.len());
            let to = pair[1].start.min(chars.len());
            let raw: String = chars[from..to].iter().collect();
            BoundarySegment {
                text: normalizer.normalize(&raw),
                tag: pair[0].tag.clone(),
                hosp_id: hosp_id.to_string(),
            }
        })
        .collect()
}

/// Builds the segment rows of every document in the export.
///
/// # Errors
///
/// Fails on malformed documents and on reports missing from `reports`.
pub fn build_segments(
    examples: &[Example],
    field_name: &str,
    reports: &ReportIndex,
    normalizer: &TextNormalizer,
) -> Result<Vec<BoundarySegment>> {
    let mut segments = Vec::new();

    for (index, example) in examples.iter().enumerate() {
        let tagged = |e: AnnoprepError| e.with_task_id(example.task_id());
        let report = example.text(field_name, index).map_err(tagged)?;
        let hosp_id = reports.get(report)?;
        let items = example.first_result(index).map_err(tagged)?;
        let points = boundary_points(items, index).map_err(tagged)?;

        let rows = segments_for_report(report, &points, hosp_id, normalizer);
        debug!(index, points = points.len(), rows = rows.len(), "segmented report");
        segments.extend(rows);
    }

    info!(documents = examples.len(), segments = segments.len(), "built boundary segments");
    Ok(segments)
}
