// ── Record identity ──
//
// EntityId is the one identifier type every cached record carries. It
// unifies backend-assigned UUIDs, free-form backend keys, and the
// temporary placeholders handed out while a create is in flight.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

/// Prefix every temporary identifier starts with.
pub const TEMP_PREFIX: &str = "temp-";

static TEMP_SEQUENCE: AtomicU64 = AtomicU64::new(0);

// ── EntityId ────────────────────────────────────────────────────────

/// Canonical identifier for any cached record.
///
/// Serializes as a plain string. Parsing classifies the string: a
/// `temp-` prefix marks a local placeholder, a valid UUID becomes
/// [`EntityId::Uuid`], anything else is [`EntityId::Text`]. The backend's
/// spelling is always kept, so an id prints exactly as it arrived.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityId {
    Uuid { uuid: Uuid, text: String },
    /// Locally generated placeholder; never known to the backend.
    Temporary(String),
    Text(String),
}

impl EntityId {
    /// Mint a fresh temporary identifier.
    ///
    /// Derived from the current time plus a process-wide sequence number,
    /// so two creates in the same millisecond still get distinct ids.
    pub fn temporary() -> Self {
        let millis = chrono::Utc::now().timestamp_millis();
        let seq = TEMP_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        Self::Temporary(format!("{TEMP_PREFIX}{millis}-{seq}"))
    }

    pub fn is_temporary(&self) -> bool {
        matches!(self, Self::Temporary(_))
    }

    pub fn as_uuid(&self) -> Option<&Uuid> {
        match self {
            Self::Uuid { uuid, .. } => Some(uuid),
            _ => None,
        }
    }

    /// `true` for the empty string, which no valid record may carry.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Text(s) if s.is_empty())
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uuid { text, .. } | Self::Temporary(text) | Self::Text(text) => {
                f.write_str(text)
            }
        }
    }
}

impl FromStr for EntityId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s.to_owned()))
    }
}

impl From<Uuid> for EntityId {
    fn from(uuid: Uuid) -> Self {
        Self::Uuid {
            uuid,
            text: uuid.to_string(),
        }
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        if s.starts_with(TEMP_PREFIX) {
            return Self::Temporary(s);
        }
        match Uuid::parse_str(&s) {
            Ok(uuid) => Self::Uuid { uuid, text: s },
            Err(_) => Self::Text(s),
        }
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self::from(s.to_owned())
    }
}

// ── Serde ───────────────────────────────────────────────────────────

impl Serialize for EntityId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Wire ids are usually strings, but integer keys are accepted too.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => Self::from(s),
            RawId::Number(n) => Self::Text(n.to_string()),
        })
    }
}
