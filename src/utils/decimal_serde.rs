use rust_decimal::Decimal;
use serde::de::Error;
use serde::{Deserialize, Deserializer, Serializer};
use std::str::FromStr;

use crate::constants::DECIMAL_PRECISION;

/// Serializes Decimal as a rounded string so values survive JSON transport
/// without binary-float truncation.
pub mod decimal_serde {
    use super::*;

    pub fn serialize<S>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.round_dp(DECIMAL_PRECISION).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Decimal::from_str(&s).map_err(|_| D::Error::custom("Invalid Decimal"))
    }
}
