//! Fixed-size time windows over the window-title log.
//!
//! The title log lists one focused window per row with its start and end
//! offsets. Row durations are laid end to end on a running clock and each
//! title is assigned to every window its span touches.

use crate::input::{data_rows, read_lossy, LoadError, Loaded, RowError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A half-open time range `[start, end)` in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Interval {
    pub start: u64,
    pub end: u64,
}

impl Interval {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    /// Whether `[start, end)` lies entirely inside this interval.
    pub fn covers(&self, start: u64, end: u64) -> bool {
        self.start <= start && self.end >= end
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// One row of the window-title log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleRecord {
    /// Offset in seconds when the window gained focus
    pub start_offset: f64,
    /// Offset in seconds when the window lost focus
    pub end_offset: f64,
    /// Window title text
    pub title: String,
}

impl TitleRecord {
    pub fn duration_secs(&self) -> f64 {
        self.end_offset - self.start_offset
    }
}

/// All titles seen during one fixed-size window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleWindow {
    /// Position of the window in the sequence
    pub index: usize,
    /// Time covered by the window
    pub interval: Interval,
    /// Titles in the order they were focused
    pub titles: Vec<String>,
}

/// Column holding the title text.
const TITLE_COLUMN: usize = 3;

/// Longest focus span, in seconds, accepted for a single row.
pub const MAX_ROW_SECS: f64 = 86_400.0;

/// Load and parse a title log from disk.
pub fn load_title_log(path: &Path) -> Result<Loaded<TitleRecord>, LoadError> {
    let text = read_lossy(path)?;
    let loaded = parse_title_log(&text);
    tracing::info!(
        records = loaded.records.len(),
        skipped = loaded.skipped.len(),
        "Loaded title log from {:?}",
        path
    );
    Ok(loaded)
}

/// Parse title-log text: `startOffset,endOffset,<ignored>,title[,...]`.
///
/// The header line is skipped. Malformed rows are skipped with a warning.
pub fn parse_title_log(text: &str) -> Loaded<TitleRecord> {
    let mut records = Vec::new();
    let mut skipped = Vec::new();

    for (line, row) in data_rows(text) {
        match parse_title_row(line, row) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!("Skipping title log row: {}", e);
                skipped.push(e);
            }
        }
    }

    Loaded { records, skipped }
}

fn parse_title_row(line: usize, row: &str) -> Result<TitleRecord, RowError> {
    let items: Vec<&str> = row.split(',').collect();
    if items.len() <= TITLE_COLUMN {
        return Err(RowError::new(
            line,
            format!("expected at least {} columns, found {}", TITLE_COLUMN + 1, items.len()),
        ));
    }

    let offset = |i: usize, name: &str| -> Result<f64, RowError> {
        let value = items[i].trim();
        match value.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(v),
            _ => Err(RowError::new(line, format!("invalid {name} {value:?}"))),
        }
    };

    let start_offset = offset(0, "start offset")?;
    let end_offset = offset(1, "end offset")?;
    if end_offset < start_offset {
        return Err(RowError::new(
            line,
            format!("end offset {end_offset} precedes start offset {start_offset}"),
        ));
    }
    if end_offset - start_offset > MAX_ROW_SECS {
        return Err(RowError::new(
            line,
            format!(
                "span of {}s exceeds the {MAX_ROW_SECS}s limit",
                end_offset - start_offset
            ),
        ));
    }

    Ok(TitleRecord {
        start_offset,
        end_offset,
        title: items[TITLE_COLUMN].to_string(),
    })
}

/// Group titles into consecutive windows of `window_size` seconds.
///
/// Returns an empty list when `window_size` is zero. Records whose duration
/// is negative, non-finite or longer than [`MAX_ROW_SECS`] are skipped.
pub fn bucket_titles(records: &[TitleRecord], window_size: u64) -> Vec<TitleWindow> {
    if window_size == 0 {
        return Vec::new();
    }
    let size = window_size as f64;
    let mut blocks: Vec<Vec<String>> = Vec::new();
    let mut clock = 0f64;

    for record in records {
        let duration = record.duration_secs();
        if !(0.0..=MAX_ROW_SECS).contains(&duration) {
            tracing::warn!(
                "Skipping title {:?} with span of {}s",
                record.title,
                duration
            );
            continue;
        }

        let start_block = (clock / size) as usize;
        clock += duration;
        let end_block = (clock / size) as usize;

        if blocks.len() <= end_block {
            blocks.resize_with(end_block + 1, Vec::new);
        }
        for block in &mut blocks[start_block..=end_block] {
            block.push(record.title.clone());
        }
    }

    blocks
        .into_iter()
        .enumerate()
        .map(|(index, titles)| {
            let start = index as u64 * window_size;
            TitleWindow {
                index,
                interval: Interval::new(start, start + window_size),
                titles,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(start: f64, end: f64, title: &str) -> TitleRecord {
        TitleRecord {
            start_offset: start,
            end_offset: end,
            title: title.to_string(),
        }
    }

    #[test]
    fn test_interval_covers() {
        let interval = Interval::new(10, 20);
        assert!(interval.covers(10, 20));
        assert!(interval.covers(12, 15));
        assert!(!interval.covers(5, 15));
        assert!(!interval.covers(15, 25));
        assert_eq!(interval.to_string(), "[10, 20)");
    }

    #[test]
    fn test_parse_title_log() {
        let text = "start,end,app,title\n\
                    0.0,12.5,chrome,Inbox - Mail\n\
                    12.5,30,code,main.rs,extra\n";
        let loaded = parse_title_log(text);
        assert!(loaded.is_clean());
        assert_eq!(loaded.records.len(), 2);
        assert_eq!(loaded.records[0].title, "Inbox - Mail");
        assert_eq!(loaded.records[1].title, "main.rs");
        assert_eq!(loaded.records[1].duration_secs(), 17.5);
    }

    #[test]
    fn test_parse_title_log_skips_malformed_rows() {
        let text = "start,end,app,title\n\
                    abc,10,chrome,Bad start\n\
                    0,10,chrome\n\
                    20,10,chrome,Backwards\n\
                    0,10,chrome,Good\n";
        let loaded = parse_title_log(text);
        assert_eq!(loaded.records.len(), 1);
        assert_eq!(loaded.records[0].title, "Good");
        let lines: Vec<usize> = loaded.skipped.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![2, 3, 4]);
    }

    #[test]
    fn test_parse_title_log_rejects_oversized_span() {
        let text = "start,end,app,title
                    0,1e15,chrome,Forever
                    0,86400,chrome,One day
                    0,10,chrome,Good
";
        let loaded = parse_title_log(text);
        let titles: Vec<&str> = loaded.records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["One day", "Good"]);
        assert_eq!(loaded.skipped.len(), 1);
        assert_eq!(loaded.skipped[0].line, 2);
    }

    #[test]
    fn test_bucket_titles_skips_oversized_records() {
        let records = vec![
            record(0.0, 3.0, "a"),
            record(0.0, 1e15, "huge"),
            record(10.0, f64::INFINITY, "open"),
            record(0.0, 4.0, "b"),
        ];
        let windows = bucket_titles(&records, 1);
        assert_eq!(windows.len(), 8);
        assert!(windows
            .iter()
            .all(|w| w.titles.iter().all(|t| t == "a" || t == "b")));
    }

    #[test]
    fn test_bucket_titles_spans_windows() {
        let records = vec![
            record(0.0, 4.0, "a"),
            record(4.0, 12.0, "b"),
            record(12.0, 13.0, "c"),
        ];
        let windows = bucket_titles(&records, 5);

        assert_eq!(windows.len(), 3);
        assert_eq!(windows[0].titles, vec!["a", "b"]);
        assert_eq!(windows[1].titles, vec!["b"]);
        assert_eq!(windows[2].titles, vec!["b", "c"]);
        assert_eq!(windows[2].interval, Interval::new(10, 15));
    }

    #[test]
    fn test_bucket_titles_uses_durations_not_offsets() {
        // a gap in the log's offsets does not open empty windows
        let records = vec![record(0.0, 3.0, "a"), record(100.0, 104.0, "b")];
        let windows = bucket_titles(&records, 5);
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].titles, vec!["a", "b"]);
        assert_eq!(windows[1].titles, vec!["b"]);
    }

    #[test]
    fn test_bucket_titles_boundary_end_touches_next_window() {
        let windows = bucket_titles(&[record(0.0, 5.0, "a")], 5);
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[1].titles, vec!["a"]);
    }

    #[test]
    fn test_bucket_titles_zero_window() {
        assert!(bucket_titles(&[record(0.0, 5.0, "a")], 0).is_empty());
    }
}
