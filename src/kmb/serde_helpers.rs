use std::str::FromStr;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

/// KMB serves some fields as strings on the reference endpoints and as
/// numbers on the ETA endpoint. The wrapper accepts either form and
/// re-serializes whichever one arrived, so passthrough bodies keep the
/// upstream's shape.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MaybeStringWrapped<T> {
    Str(String),
    Val(T),
}

impl<T: FromStr> MaybeStringWrapped<T> {
    pub fn into_inner(self) -> Result<T, T::Err> {
        match self {
            MaybeStringWrapped::Str(s) => s.parse(),
            MaybeStringWrapped::Val(v) => Ok(v),
        }
    }
}

/// Stop coordinates have been served both as numbers and as numeric strings.
pub fn deserialize_flexible_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    MaybeStringWrapped::<f64>::deserialize(deserializer)?
        .into_inner()
        .map_err(de::Error::custom)
}
