use chrono::{DateTime, Utc};
use chrono_tz::Asia::Hong_Kong;
use serde::{Deserialize, Serialize};

use crate::kmb::entities::Eta;

/// An ETA entry with the derived fields bolted on. The upstream fields pass
/// through untouched.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct EnhancedEta {
    #[serde(flatten)]
    pub eta: Eta,
    #[serde(rename = "minutesToArrival")]
    pub minutes_to_arrival: Option<i64>,
    #[serde(rename = "formattedTime")]
    pub formatted_time: Option<String>,
}

/// Whole minutes until the arrival instant, rounded to the nearest minute
/// and floored at zero once the instant has passed. None when the timestamp
/// does not parse.
pub fn minutes_to_arrival(eta: &str, now: DateTime<Utc>) -> Option<i64> {
    let eta_time = DateTime::parse_from_rfc3339(eta).ok()?;
    let diff_ms = eta_time.signed_duration_since(now).num_milliseconds();
    let minutes = (diff_ms as f64 / 60_000.0).round() as i64;

    Some(minutes.max(0))
}

/// The arrival instant rendered as Hong Kong local time, falling back to
/// the raw value when it does not parse.
pub fn format_eta_time(eta: &str) -> String {
    match DateTime::parse_from_rfc3339(eta) {
        Ok(time) => time
            .with_timezone(&Hong_Kong)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
        Err(_) => eta.to_string(),
    }
}

pub fn enhance_eta_data(entries: Vec<Eta>, now: DateTime<Utc>) -> Vec<EnhancedEta> {
    entries
        .into_iter()
        .map(|eta| EnhancedEta {
            minutes_to_arrival: eta
                .eta
                .as_deref()
                .and_then(|time| minutes_to_arrival(time, now)),
            formatted_time: eta.eta.as_deref().map(format_eta_time),
            eta,
        })
        .collect()
}
