use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::serde_helpers::{deserialize_flexible_f64, MaybeStringWrapped};

/// Standard KMB response wrapper: a type tag, a version, the instant the
/// payload was generated, and the data section itself.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Envelope<T> {
    #[serde(rename = "type")]
    pub kind: String,
    pub version: String,
    pub generated_timestamp: String,
    pub data: T,
}

impl<T> Envelope<T> {
    /// Wraps locally built data in the same envelope shape the upstream uses.
    pub fn generated(kind: &str, data: T) -> Envelope<T> {
        Envelope {
            kind: kind.to_string(),
            version: "1.0".to_string(),
            generated_timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            data,
        }
    }
}

/// Travel direction of a route, `O` or `I` in payloads and query strings,
/// `outbound`/`inbound` in upstream URL paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Outbound,
    Inbound,
}

impl Bound {
    /// Anything other than `O` counts as inbound, matching the upstream
    /// convention for the query parameter.
    pub fn from_query(value: &str) -> Bound {
        if value == "O" {
            Bound::Outbound
        } else {
            Bound::Inbound
        }
    }

    pub fn as_path_segment(&self) -> &'static str {
        match self {
            Bound::Outbound => "outbound",
            Bound::Inbound => "inbound",
        }
    }
}

/// One service variant of a bus route in one direction.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Route {
    pub route: String,
    pub bound: String,
    pub service_type: String,
    pub orig_en: String,
    pub orig_tc: String,
    pub orig_sc: String,
    pub dest_en: String,
    pub dest_tc: String,
    pub dest_sc: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Stop {
    pub stop: String,
    pub name_en: String,
    pub name_tc: String,
    pub name_sc: String,
    #[serde(deserialize_with = "deserialize_flexible_f64")]
    pub lat: f64,
    #[serde(deserialize_with = "deserialize_flexible_f64")]
    pub long: f64,
}

impl Stop {
    /// Placeholder for stop IDs a route references but the stop list lacks.
    pub fn unknown(stop_id: &str) -> Stop {
        Stop {
            stop: stop_id.to_string(),
            name_en: "Unknown".to_string(),
            name_tc: "Unknown".to_string(),
            name_sc: "Unknown".to_string(),
            lat: 0.0,
            long: 0.0,
        }
    }
}

/// Join row placing one stop at one position along a route variant.
/// `seq` is transmitted as a decimal string.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RouteStop {
    pub route: String,
    pub bound: String,
    pub service_type: String,
    pub seq: String,
    pub stop: String,
}

/// One estimated arrival. `eta` may be null when no prediction exists.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Eta {
    pub co: String,
    pub route: String,
    pub dir: String,
    pub service_type: MaybeStringWrapped<i64>,
    pub seq: MaybeStringWrapped<i64>,
    pub dest_tc: String,
    pub dest_sc: String,
    pub dest_en: String,
    pub eta_seq: i64,
    pub eta: Option<String>,
    pub rmk_tc: String,
    pub rmk_sc: String,
    pub rmk_en: String,
    pub data_timestamp: String,
}
