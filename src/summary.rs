//! Flatten a tactics document into one CSV row.

use crate::document::TacticsDocument;
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

/// One summary row per mob. Field order is the CSV column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRecord {
    pub mob_type: String,
    pub submissions: i64,
    pub synced_at: String,
    pub last_update: String,
    pub top_action: String,
    pub top_avg_reward: f64,
    pub top_success_rate: f64,
    pub top_count: i64,
    pub trend: String,
}

/// Summarize a document. Never fails: absent fields fall back to
/// empty/zero values and an empty `tactics` list still yields a row.
pub fn summarize(doc: &TacticsDocument) -> SummaryRecord {
    let top = doc.top_tactic();
    SummaryRecord {
        mob_type: doc.mob_type.clone(),
        submissions: doc.submissions,
        synced_at: epoch_millis_to_iso(doc.synced_at),
        last_update: epoch_millis_to_iso(doc.last_update),
        top_action: top.map(|t| t.action.clone()).unwrap_or_default(),
        top_avg_reward: top.map(|t| round4(t.avg_reward)).unwrap_or(0.0),
        top_success_rate: top
            .map(|t| round4(t.success_rate_or_zero()))
            .unwrap_or(0.0),
        top_count: top.map(|t| t.count).unwrap_or(0),
        trend: doc.trend().to_string(),
    }
}

/// Convert epoch milliseconds to an ISO-8601 UTC string.
///
/// Missing, zero, or out-of-range (outside years 1..=9999) values give `""`.
/// Sub-second precision is printed only when non-zero, as microseconds.
pub fn epoch_millis_to_iso(ms: Option<i64>) -> String {
    let Some(ms) = ms.filter(|&ms| ms != 0) else {
        return String::new();
    };
    match DateTime::<Utc>::from_timestamp_millis(ms) {
        Some(dt) if (1..=9999).contains(&dt.year()) => {
            if dt.timestamp_subsec_micros() == 0 {
                dt.format("%Y-%m-%dT%H:%M:%S+00:00").to_string()
            } else {
                dt.format("%Y-%m-%dT%H:%M:%S%.6f+00:00").to_string()
            }
        }
        _ => String::new(),
    }
}

/// Round to 4 decimal places, ties to even, on the exact decimal value of
/// `value`.
pub fn round4(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    format!("{value:.4}").parse().unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(json: &str) -> TacticsDocument {
        TacticsDocument::from_json(json).unwrap()
    }

    #[test]
    fn summarize_zombie_example() {
        let d = doc(
            r#"{"mobType":"zombie","submissions":42,"tactics":[{"action":"charge","avgReward":1.23456,"successRate":0.8765,"count":10}]}"#,
        );
        let rec = summarize(&d);
        assert_eq!(
            rec,
            SummaryRecord {
                mob_type: "zombie".to_string(),
                submissions: 42,
                synced_at: String::new(),
                last_update: String::new(),
                top_action: "charge".to_string(),
                top_avg_reward: 1.2346,
                top_success_rate: 0.8765,
                top_count: 10,
                trend: String::new(),
            }
        );
    }

    #[test]
    fn summarize_empty_tactics_keeps_row() {
        let d = doc(r#"{"mobType":"creeper","submissions":3,"tactics":[]}"#);
        let rec = summarize(&d);
        assert_eq!(rec.mob_type, "creeper");
        assert_eq!(rec.submissions, 3);
        assert_eq!(rec.top_action, "");
        assert_eq!(rec.top_avg_reward, 0.0);
        assert_eq!(rec.top_success_rate, 0.0);
        assert_eq!(rec.top_count, 0);
    }

    #[test]
    fn summarize_uses_first_tactic_only() {
        let d = doc(
            r#"{"mobType":"spider","submissions":5,"tactics":[
                {"action":"pounce","avgReward":0.123449,"successRate":0.33335,"count":7},
                {"action":"climb","avgReward":5.0,"successRate":1.0,"count":99}
            ]}"#,
        );
        let rec = summarize(&d);
        assert_eq!(rec.top_action, "pounce");
        assert_eq!(rec.top_avg_reward, 0.1234);
        assert_eq!(rec.top_count, 7);
    }

    #[test]
    fn summarize_null_success_rate_is_zero() {
        let d = doc(
            r#"{"mobType":"witch","tactics":[{"action":"potion","avgReward":2.0,"successRate":null,"count":1}]}"#,
        );
        assert_eq!(summarize(&d).top_success_rate, 0.0);
    }

    #[test]
    fn summarize_trend_and_timestamps() {
        let d = doc(
            r#"{"mobType":"enderman","submissions":1,"syncedAt":1700000000000,"lastUpdate":0,"batchReport":{"trend":"declining"}}"#,
        );
        let rec = summarize(&d);
        assert_eq!(rec.synced_at, "2023-11-14T22:13:20+00:00");
        assert_eq!(rec.last_update, "");
        assert_eq!(rec.trend, "declining");
    }

    #[test]
    fn iso_missing_or_zero_is_empty() {
        assert_eq!(epoch_millis_to_iso(None), "");
        assert_eq!(epoch_millis_to_iso(Some(0)), "");
    }

    #[test]
    fn iso_out_of_range_is_empty() {
        assert_eq!(epoch_millis_to_iso(Some(i64::MAX)), "");
        // Year 10000
        assert_eq!(epoch_millis_to_iso(Some(253_402_300_800_000)), "");
    }

    #[test]
    fn iso_with_millis() {
        assert_eq!(
            epoch_millis_to_iso(Some(1_700_000_000_123)),
            "2023-11-14T22:13:20.123000+00:00"
        );
    }

    #[test]
    fn iso_roundtrips_to_same_millis() {
        for ms in [
            1_i64,
            999,
            86_400_000,
            1_577_836_800_000,
            1_700_000_000_123,
            1_733_011_200_007,
            -1_000,
        ] {
            let iso = epoch_millis_to_iso(Some(ms));
            let parsed = DateTime::parse_from_rfc3339(&iso)
                .unwrap_or_else(|e| panic!("{iso} did not parse: {e}"));
            assert_eq!(parsed.timestamp_millis(), ms, "round trip of {iso}");
        }
    }

    #[test]
    fn round4_basic() {
        assert_eq!(round4(1.23456), 1.2346);
        assert_eq!(round4(0.8765), 0.8765);
        assert_eq!(round4(-2.718281828), -2.7183);
        assert_eq!(round4(3.0), 3.0);
    }

    #[test]
    fn round4_ties_to_even() {
        // Both values are exact binary fractions, so these are true ties.
        assert_eq!(round4(0.03125), 0.0312);
        assert_eq!(round4(0.09375), 0.0938);
    }

    #[test]
    fn round4_passes_through_non_finite() {
        assert!(round4(f64::NAN).is_nan());
        assert_eq!(round4(f64::INFINITY), f64::INFINITY);
    }
}
