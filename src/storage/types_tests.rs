//! Unit tests for storage types.

use super::*;
use chrono::TimeZone;

#[test]
fn test_parse_timestamp_rfc3339() {
    let parsed = parse_timestamp("2024-03-01T12:30:00+02:00");
    assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 3, 1, 10, 30, 0).unwrap());
}

#[test]
fn test_parse_timestamp_garbage_falls_back_to_now() {
    let before = Utc::now();
    let parsed = parse_timestamp("yesterday-ish");
    assert!(parsed >= before);
}

#[test]
fn test_session_summary_serialization() {
    let summary = SessionSummary {
        session_id: "sess-1".to_string(),
        current_phase: Phase::Librarian,
        workflow_complete: false,
        created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
    };

    let value = serde_json::to_value(&summary).unwrap();
    assert_eq!(value["current_phase"], "librarian");
    assert_eq!(value["workflow_complete"], false);

    let back: SessionSummary = serde_json::from_value(value).unwrap();
    assert_eq!(back, summary);
}
