//! Shared serde helper functions used across multiple modules.

use serde::{de, Deserialize, Deserializer};

/// Deserialize a primary-key flag exported from a spreadsheet.
///
/// Accepts booleans, integers (`0` is false) and the strings
/// `true/false`, `yes/no`, `y/n`, `1/0` (case-insensitive, empty is false).
pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawFlag {
        Bool(bool),
        Int(i64),
        Text(String),
    }

    match RawFlag::deserialize(deserializer)? {
        RawFlag::Bool(b) => Ok(b),
        RawFlag::Int(n) => Ok(n != 0),
        RawFlag::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "y" | "1" => Ok(true),
            "false" | "no" | "n" | "0" | "" => Ok(false),
            other => Err(de::Error::custom(format!(
                "invalid primary key flag '{other}'"
            ))),
        },
    }
}
