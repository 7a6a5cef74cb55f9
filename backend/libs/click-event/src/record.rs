use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::attributes::ClickAttributes;
use crate::codec::{self, CodecError};

/// One recorded click.
///
/// Records are immutable once built; the exporter only ever reads them.
/// Timestamps are kept at microsecond precision so a record survives an
/// encode/decode cycle unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    id: Uuid,
    #[serde(with = "timestamp_format")]
    timestamp: DateTime<Utc>,
    #[serde(flatten)]
    attributes: ClickAttributes,
    #[serde(rename = "ip", default)]
    client_ip: String,
    #[serde(default)]
    user_agent: String,
}

impl EventRecord {
    /// Create a record for a click happening now, with a fresh id.
    pub fn new(
        attributes: ClickAttributes,
        client_ip: impl Into<String>,
        user_agent: impl Into<String>,
    ) -> Self {
        Self::from_parts(
            Uuid::new_v4(),
            Utc::now(),
            attributes,
            client_ip,
            user_agent,
        )
    }

    pub fn from_parts(
        id: Uuid,
        timestamp: DateTime<Utc>,
        attributes: ClickAttributes,
        client_ip: impl Into<String>,
        user_agent: impl Into<String>,
    ) -> Self {
        Self {
            id,
            timestamp: timestamp.trunc_subsecs(6),
            attributes,
            client_ip: client_ip.into(),
            user_agent: user_agent.into(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn attributes(&self) -> &ClickAttributes {
        &self.attributes
    }

    pub fn client_ip(&self) -> &str {
        &self.client_ip
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Encode to the queue wire format.
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        codec::encode(self)
    }
}

/// RFC 3339 with microseconds and an explicit `+00:00` offset on the way out;
/// any RFC 3339 offset on the way in, normalized to UTC.
mod timestamp_format {
    use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(timestamp: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&timestamp.to_rfc3339_opts(SecondsFormat::Micros, false))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|parsed| parsed.with_timezone(&Utc).trunc_subsecs(6))
            .map_err(|e| de::Error::custom(format!("invalid timestamp {:?}: {}", raw, e)))
    }
}
