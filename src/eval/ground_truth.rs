//! Hand-labeled ground truth.
//!
//! Each row is `startTimeOfDay,endTimeOfDay,labelId` with times in the general
//! short time-span format `[d:]h:mm:ss[.fffffff]`.

use crate::core::windowing::Interval;
use crate::input::{data_rows, read_lossy, LoadError, Loaded, RowError};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::Path;

/// A labeled span of time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundTruthInterval {
    pub interval: Interval,
    pub label_id: i64,
}

impl GroundTruthInterval {
    pub fn new(start: u64, end: u64, label_id: i64) -> Self {
        Self {
            interval: Interval::new(start, end),
            label_id,
        }
    }
}

/// Load ground truth from disk, in file order.
pub fn load_ground_truth(path: &Path) -> Result<Loaded<GroundTruthInterval>, LoadError> {
    let text = read_lossy(path)?;
    let loaded = parse_ground_truth(&text);
    tracing::info!(
        intervals = loaded.records.len(),
        skipped = loaded.skipped.len(),
        "Loaded ground truth from {:?}",
        path
    );
    Ok(loaded)
}

/// Parse ground-truth text. The header is skipped; bad rows are skipped with a warning.
///
/// Rows are returned in file order. Ordering and overlap are not checked.
pub fn parse_ground_truth(text: &str) -> Loaded<GroundTruthInterval> {
    let mut records = Vec::new();
    let mut skipped = Vec::new();

    for (line, row) in data_rows(text) {
        match parse_row(line, row) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!("Skipping ground truth row: {}", e);
                skipped.push(e);
            }
        }
    }

    Loaded { records, skipped }
}

fn parse_row(line: usize, row: &str) -> Result<GroundTruthInterval, RowError> {
    let items: Vec<&str> = row.split(',').map(str::trim).collect();
    if items.len() < 3 {
        return Err(RowError::new(
            line,
            format!("expected 3 columns, found {}", items.len()),
        ));
    }

    let start = parse_time_of_day(items[0])
        .ok_or_else(|| RowError::new(line, format!("invalid start time {:?}", items[0])))?;
    let end = parse_time_of_day(items[1])
        .ok_or_else(|| RowError::new(line, format!("invalid end time {:?}", items[1])))?;
    let label_id = items[2]
        .parse::<i64>()
        .map_err(|_| RowError::new(line, format!("invalid label {:?}", items[2])))?;

    if end < start {
        return Err(RowError::new(
            line,
            format!("end time {end}s precedes start time {start}s"),
        ));
    }

    Ok(GroundTruthInterval::new(start, end, label_id))
}

/// Parse `[d:]h:mm:ss[.fffffff]` into whole seconds, rounding halves to even.
///
/// Returns `None` for malformed text or a day count too large to represent.
pub fn parse_time_of_day(text: &str) -> Option<u64> {
    let parts: Vec<&str> = text.trim().split(':').collect();
    let (days, rest) = match parts.len() {
        3 => (0, &parts[..]),
        4 => (parse_digits(parts[0])?, &parts[1..]),
        _ => return None,
    };

    let hours = parse_digits(rest[0])?;
    let minutes = parse_digits(rest[1])?;
    let (whole, fraction) = match rest[2].split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (rest[2], None),
    };
    let seconds = parse_digits(whole)?;

    if hours > 23 || minutes > 59 || seconds > 59 || rest[1].len() != 2 || whole.len() != 2 {
        return None;
    }

    let mut span = Duration::try_days(days)?
        .checked_add(&Duration::try_hours(hours)?)?
        .checked_add(&Duration::try_minutes(minutes)?)?
        .checked_add(&Duration::try_seconds(seconds)?)?;
    if let Some(fraction) = fraction {
        if fraction.is_empty() || fraction.len() > 7 {
            return None;
        }
        let ticks = parse_digits(fraction)? * 10i64.pow(7 - fraction.len() as u32);
        span = span.checked_add(&Duration::nanoseconds(ticks * 100))?;
    }

    round_half_even(span)
}

/// Whole seconds of `span`, with exact halves going to the even second.
fn round_half_even(span: Duration) -> Option<u64> {
    let secs = u64::try_from(span.num_seconds()).ok()?;
    let nanos = span.subsec_nanos();
    let round_up = match nanos.cmp(&500_000_000) {
        Ordering::Greater => true,
        Ordering::Equal => secs % 2 == 1,
        Ordering::Less => false,
    };
    Some(if round_up { secs + 1 } else { secs })
}

fn parse_digits(text: &str) -> Option<i64> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_time_of_day() {
        assert_eq!(parse_time_of_day("0:00:00"), Some(0));
        assert_eq!(parse_time_of_day("0:10:00"), Some(600));
        assert_eq!(parse_time_of_day("13:05:09"), Some(47_109));
        assert_eq!(parse_time_of_day("1:02:03:04"), Some(93_784));
        assert_eq!(parse_time_of_day("0:00:04.6"), Some(5));
        assert_eq!(parse_time_of_day("0:00:04.4999999"), Some(4));
    }

    #[test]
    fn test_parse_time_of_day_rounds_halves_to_even() {
        assert_eq!(parse_time_of_day("0:00:04.5"), Some(4));
        assert_eq!(parse_time_of_day("0:00:05.5"), Some(6));
        assert_eq!(parse_time_of_day("0:00:05.5000001"), Some(6));
        assert_eq!(parse_time_of_day("0:00:04.5000001"), Some(5));
    }

    #[test]
    fn test_parse_time_of_day_rejects_out_of_range_days() {
        assert_eq!(parse_time_of_day("999999999999:00:00:00"), None);
        assert_eq!(parse_time_of_day("99999999999999999999:00:00:00"), None);
        assert_eq!(parse_time_of_day("10:00:00:00"), Some(864_000));
    }

    #[test]
    fn test_parse_ground_truth_skips_huge_day_counts() {
        let text = "s,e,l\n999999999999:00:00:00,999999999999:00:00:01,1\n0:00:00,0:00:10,2\n";
        let loaded = parse_ground_truth(text);
        assert_eq!(loaded.records, vec![GroundTruthInterval::new(0, 10, 2)]);
        assert_eq!(loaded.skipped.len(), 1);
        assert_eq!(loaded.skipped[0].line, 2);
    }

    #[test]
    fn test_parse_time_of_day_rejects_malformed() {
        for text in [
            "", "12:00", "0:60:00", "0:00:60", "24:00:00", "-0:10:00", "a:00:00", "0:5:00",
            "0:00:00.", "0:00:00.12345678",
        ] {
            assert_eq!(parse_time_of_day(text), None, "{text:?}");
        }
    }

    #[test]
    fn test_parse_ground_truth() {
        let text = "start,end,label\n0:00:00,0:10:00,1\n0:10:00,0:25:30,2\n";
        let loaded = parse_ground_truth(text);
        assert!(loaded.is_clean());
        assert_eq!(
            loaded.records,
            vec![
                GroundTruthInterval::new(0, 600, 1),
                GroundTruthInterval::new(600, 1530, 2),
            ]
        );
    }

    #[test]
    fn test_parse_ground_truth_keeps_file_order() {
        let text = "start,end,label\n0:10:00,0:20:00,2\n0:00:00,0:10:00,1\n";
        let loaded = parse_ground_truth(text);
        assert_eq!(loaded.records[0].label_id, 2);
        assert_eq!(loaded.records[1].label_id, 1);
    }

    #[test]
    fn test_parse_ground_truth_skips_bad_rows() {
        let text = "start,end,label\n\
                    0:00:00,0:10:00\n\
                    noon,0:10:00,1\n\
                    0:00:00,0:10:00,x\n\
                    0:20:00,0:10:00,3\n\
                    0:00:00,0:10:00,4\n";
        let loaded = parse_ground_truth(text);
        assert_eq!(loaded.records, vec![GroundTruthInterval::new(0, 600, 4)]);
        assert_eq!(loaded.skipped.len(), 4);
        assert_eq!(loaded.skipped[1].line, 3);
    }
}
