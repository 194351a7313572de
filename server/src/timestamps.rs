//! Serde helpers representing [`OffsetDateTime`] values as Unix
//! timestamps (whole seconds) on the wire.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::OffsetDateTime;

pub fn serialize<S>(time: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    time.unix_timestamp().serialize(serializer)
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let seconds = i64::deserialize(deserializer)?;
    Ok(OffsetDateTime::from_unix_timestamp(seconds))
}

/// The same representation for optional timestamps. Combine with
/// `#[serde(default)]` so an absent field reads as `None`.
pub mod option {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use time::OffsetDateTime;

    pub fn serialize<S>(time: &Option<OffsetDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        time.map(|t| t.unix_timestamp()).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<OffsetDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let seconds: Option<i64> = Deserialize::deserialize(deserializer)?;
        Ok(seconds.map(OffsetDateTime::from_unix_timestamp))
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};
    use time::OffsetDateTime;

    #[derive(Debug, Deserialize, Serialize)]
    struct Wrapper {
        #[serde(with = "super")]
        at: OffsetDateTime,

        #[serde(default, with = "super::option")]
        maybe: Option<OffsetDateTime>,
    }

    #[test]
    fn round_trips_through_unix_seconds() {
        let parsed: Wrapper =
            serde_json::from_str(r#"{"at": 1609459200, "maybe": 1609459260}"#).unwrap();
        assert_eq!(parsed.at.unix_timestamp(), 1_609_459_200);
        assert_eq!(parsed.maybe.unwrap().unix_timestamp(), 1_609_459_260);

        let serialized = serde_json::to_string(&parsed).unwrap();
        assert_eq!(serialized, r#"{"at":1609459200,"maybe":1609459260}"#);
    }

    #[test]
    fn absent_optional_timestamp_reads_as_none() {
        let parsed: Wrapper = serde_json::from_str(r#"{"at": 0}"#).unwrap();
        assert!(parsed.maybe.is_none());
    }
}
