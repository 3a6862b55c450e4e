// ── Wire-shape helpers ──
//
// Backend rows come back with nullable columns and sometimes without
// optional columns at all. Records default those to empty values; a
// handful of text columns go the other way and must be written as NULL
// when empty.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Deserialize a possibly-null column, mapping `null` to `T::default()`.
///
/// Paired with `#[serde(default)]` this also covers absent columns.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ── NullableText ────────────────────────────────────────────────────

/// Text column whose empty value is stored as SQL `NULL`.
///
/// Used for optional references (`project_id`, `card_id`, ...) where an
/// empty string would violate a foreign key. Reads `null` back as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NullableText(String);

impl NullableText {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for NullableText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for NullableText {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for NullableText {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl Serialize for NullableText {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0.is_empty() {
            serializer.serialize_none()
        } else {
            serializer.serialize_str(&self.0)
        }
    }
}

impl<'de> Deserialize<'de> for NullableText {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self(Option::<String>::deserialize(deserializer)?.unwrap_or_default()))
    }
}
