use std::fmt;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Canonical string form of a server or UI supplied identifier.
///
/// Numbers (and strings that read as numbers) are truncated toward zero and must stay
/// positive. Other non-blank strings pass through trimmed. Objects are searched for an
/// `id`, `channelId`, `channelid` or nested `channel.id`. Anything else is invalid and
/// yields an empty string.
pub fn normalize_id(raw: &Value) -> String {
    match raw {
        Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                return if int > 0 { int.to_string() } else { String::new() };
            }
            if let Some(uint) = number.as_u64() {
                return uint.to_string();
            }
            number.as_f64().map(normalize_float).unwrap_or_default()
        }
        Value::String(text) => normalize_text(text),
        Value::Object(map) => ["id", "channelId", "channelid"]
            .iter()
            .filter_map(|key| map.get(*key))
            .find(|candidate| !candidate.is_null())
            .or_else(|| map.get("channel").and_then(|channel| channel.get("id")))
            .map(normalize_id)
            .unwrap_or_default(),
        Value::Null | Value::Bool(_) | Value::Array(_) => String::new(),
    }
}

fn normalize_text(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    match trimmed.parse::<f64>() {
        Ok(number) => normalize_float(number),
        Err(_) => trimmed.to_string(),
    }
}

fn normalize_float(number: f64) -> String {
    if !number.is_finite() {
        return String::new();
    }
    let truncated = number.trunc();
    if truncated <= 0.0 {
        return String::new();
    }
    format!("{truncated:.0}")
}

/// Implemented by every id newtype so lenient decoders can build them generically.
pub trait Identifier: Sized {
    fn from_value(raw: &Value) -> Option<Self>;
}

macro_rules! id_newtype {
    ($name:ident, $what:literal) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(String);

        impl $name {
            pub fn from_value(raw: &Value) -> Option<Self> {
                let normalized = normalize_id(raw);
                (!normalized.is_empty()).then_some(Self(normalized))
            }

            pub fn parse(raw: &str) -> Option<Self> {
                Self::from_value(&Value::String(raw.to_string()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Identifier for $name {
            fn from_value(raw: &Value) -> Option<Self> {
                $name::from_value(raw)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        // Numeric ids go back on the wire as numbers.
        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                match self.0.parse::<u64>() {
                    Ok(number) => serializer.serialize_u64(number),
                    Err(_) => serializer.serialize_str(&self.0),
                }
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = Value::deserialize(deserializer)?;
                Self::from_value(&raw).ok_or_else(|| de::Error::custom(concat!("invalid ", $what)))
            }
        }
    };
}

id_newtype!(ChannelId, "channel id");
id_newtype!(UserId, "user id");
id_newtype!(MessageId, "message id");

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
