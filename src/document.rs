//! Upstream tactics documents as published by the federated sync.
//!
//! Field access is best-effort: every field has a default, `null` or a value
//! of the wrong JSON type reads the same as absent, and unknown fields are
//! ignored. Integer fields accept any finite number, truncated.

use serde::{Deserialize, Deserializer};
use serde_json::{Number, Value};

/// One per-mob tactics document (`<mob>-tactics.json`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TacticsDocument {
    #[serde(deserialize_with = "lenient_string")]
    pub mob_type: String,
    #[serde(deserialize_with = "lenient_int")]
    pub submissions: i64,
    #[serde(deserialize_with = "lenient_millis")]
    pub synced_at: Option<i64>,
    #[serde(deserialize_with = "lenient_millis")]
    pub last_update: Option<i64>,
    #[serde(deserialize_with = "null_as_default")]
    pub tactics: Vec<TacticEntry>,
    pub batch_report: Option<BatchReport>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TacticEntry {
    #[serde(deserialize_with = "lenient_string")]
    pub action: String,
    #[serde(deserialize_with = "lenient_float")]
    pub avg_reward: f64,
    #[serde(deserialize_with = "lenient_opt_float")]
    pub success_rate: Option<f64>,
    #[serde(deserialize_with = "lenient_int")]
    pub count: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BatchReport {
    #[serde(deserialize_with = "lenient_opt_string")]
    pub trend: Option<String>,
}

impl TacticsDocument {
    /// Parse a document from JSON text.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// The highest-priority tactic.
    ///
    /// Upstream writes `tactics` already sorted by priority, so this is
    /// simply the first entry. No re-sorting happens here.
    pub fn top_tactic(&self) -> Option<&TacticEntry> {
        self.tactics.first()
    }

    /// Trend string from the batch report, or empty.
    pub fn trend(&self) -> &str {
        self.batch_report
            .as_ref()
            .and_then(|r| r.trend.as_deref())
            .unwrap_or("")
    }
}

impl TacticEntry {
    /// Success rate with `null`/missing coalesced to 0.0. An explicit 0.0
    /// and a missing value are indistinguishable here.
    pub fn success_rate_or_zero(&self) -> f64 {
        self.success_rate.unwrap_or(0.0)
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn number_as_i64(n: &Number) -> Option<i64> {
    n.as_i64().or_else(|| {
        n.as_f64()
            .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
            .map(|f| f.trunc() as i64)
    })
}

fn lenient_int<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => number_as_i64(&n).unwrap_or(0),
        _ => 0,
    })
}

fn lenient_float<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_opt_float(deserializer)?.unwrap_or(0.0))
}

fn lenient_opt_float<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_f64(),
        _ => None,
    })
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_opt_string(deserializer)?.unwrap_or_default())
}

fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}

/// Epoch milliseconds from any JSON number; anything else reads as absent.
fn lenient_millis<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => number_as_i64(&n),
        _ => None,
    })
}
