//! Adapter for reading hand.landmark_frame.v1 streams
//!
//! Frames arrive either as NDJSON (one record per line, the streaming form)
//! or as a single JSON array (recorded sessions).

use crate::error::HandError;
use crate::schema::frame::*;

/// Adapter for parsing and checking frame records
pub struct FrameAdapter;

impl FrameAdapter {
    /// Parse a JSON string containing an array of FrameRecords
    pub fn parse_array(json: &str) -> Result<Vec<FrameRecord>, HandError> {
        let records: Vec<FrameRecord> = serde_json::from_str(json)?;
        Ok(records)
    }

    /// Parse NDJSON (newline-delimited JSON) containing FrameRecords
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<FrameRecord>, HandError> {
        let mut records = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<FrameRecord>(trimmed) {
                Ok(record) => records.push(record),
                Err(e) => {
                    return Err(HandError::ParseError(format!(
                        "Failed to parse line {}: {}",
                        line_num + 1,
                        e
                    )));
                }
            }
        }
        Ok(records)
    }

    /// Parse either form, picking by the first non-whitespace character
    pub fn parse_auto(input: &str) -> Result<Vec<FrameRecord>, HandError> {
        if input.trim_start().starts_with('[') {
            Self::parse_array(input)
        } else {
            Self::parse_ndjson(input)
        }
    }

    /// Validate a batch of records, returning only the failures
    pub fn validate_frames(records: &[FrameRecord]) -> Vec<ValidationResult> {
        records
            .iter()
            .enumerate()
            .filter_map(|(idx, record)| {
                record.validate().err().map(|error| ValidationResult {
                    index: idx,
                    frame_id: record.frame_id.clone(),
                    timestamp_ms: record.timestamp_ms,
                    error,
                })
            })
            .collect()
    }
}

/// A record that failed validation
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub index: usize,
    pub frame_id: Option<String>,
    pub timestamp_ms: u64,
    pub error: ValidationError,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::open_hand_frame;

    fn make_line(ts: u64) -> String {
        serde_json::to_string(&FrameRecord::from_frame(&open_hand_frame(ts))).unwrap()
    }

    #[test]
    fn test_parse_ndjson() {
        let ndjson = format!("{}\n\n{}\n", make_line(0), make_line(33));
        let records = FrameAdapter::parse_ndjson(&ndjson).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].timestamp_ms, 33);
    }

    #[test]
    fn test_parse_ndjson_reports_line() {
        let ndjson = format!("{}\nnot json\n", make_line(0));
        let err = FrameAdapter::parse_ndjson(&ndjson).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_parse_auto_array() {
        let json = format!("  [{},{}]", make_line(0), make_line(33));
        let records = FrameAdapter::parse_auto(&json).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_validate_frames() {
        let mut records = FrameAdapter::parse_ndjson(&format!("{}\n{}", make_line(0), make_line(33))).unwrap();
        records[1].landmarks.pop();
        let failures = FrameAdapter::validate_frames(&records);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].index, 1);
        assert_eq!(failures[0].timestamp_ms, 33);
        assert!(matches!(failures[0].error, ValidationError::LandmarkCount { actual: 20, .. }));
    }
}
