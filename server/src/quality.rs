//! Quality snapshots: point-in-time multi-dimensional ratings of a
//! reed's playing characteristics. Purely observational records.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::errors::{check_rating, BackendError};
use crate::timestamps;

/// A single quality snapshot in the database. Each rating is on a 1–10
/// scale; absent means "not assessed".
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct QualitySnapshot {
    pub id: Uuid,
    pub reed_id: Uuid,

    #[serde(with = "timestamps")]
    pub timestamp: OffsetDateTime,

    pub tone_quality: Option<i16>,
    pub response: Option<i16>,
    pub intonation: Option<i16>,
    pub stability: Option<i16>,
    pub ease_of_playing: Option<i16>,
    pub overall_rating: Option<i16>,

    pub notes: String,
}

/// The client-submitted fields of a quality snapshot.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SnapshotFields {
    pub reed_id: Uuid,

    /// Defaults to the time of the request.
    #[serde(default, with = "timestamps::option")]
    pub timestamp: Option<OffsetDateTime>,

    #[serde(default)]
    pub tone_quality: Option<i16>,

    #[serde(default)]
    pub response: Option<i16>,

    #[serde(default)]
    pub intonation: Option<i16>,

    #[serde(default)]
    pub stability: Option<i16>,

    #[serde(default)]
    pub ease_of_playing: Option<i16>,

    #[serde(default)]
    pub overall_rating: Option<i16>,

    #[serde(default)]
    pub notes: String,
}

impl SnapshotFields {
    pub fn validate(&self) -> Result<(), BackendError> {
        check_rating("tone_quality", self.tone_quality)?;
        check_rating("response", self.response)?;
        check_rating("intonation", self.intonation)?;
        check_rating("stability", self.stability)?;
        check_rating("ease_of_playing", self.ease_of_playing)?;
        check_rating("overall_rating", self.overall_rating)?;

        Ok(())
    }
}

/// Criteria for narrowing a snapshot listing.
#[derive(Clone, Debug, Default)]
pub struct SnapshotFilter {
    pub reed_id: Option<Uuid>,
}

/// A partial update to a quality snapshot.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SnapshotPatch {
    pub reed_id: Option<Uuid>,

    #[serde(default, with = "timestamps::option")]
    pub timestamp: Option<OffsetDateTime>,

    pub tone_quality: Option<i16>,
    pub response: Option<i16>,
    pub intonation: Option<i16>,
    pub stability: Option<i16>,
    pub ease_of_playing: Option<i16>,
    pub overall_rating: Option<i16>,
    pub notes: Option<String>,
}

impl SnapshotPatch {
    pub fn apply(self, current: &QualitySnapshot) -> SnapshotFields {
        SnapshotFields {
            reed_id: self.reed_id.unwrap_or(current.reed_id),
            timestamp: Some(self.timestamp.unwrap_or(current.timestamp)),
            tone_quality: self.tone_quality.or(current.tone_quality),
            response: self.response.or(current.response),
            intonation: self.intonation.or(current.intonation),
            stability: self.stability.or(current.stability),
            ease_of_playing: self.ease_of_playing.or(current.ease_of_playing),
            overall_rating: self.overall_rating.or(current.overall_rating),
            notes: self.notes.unwrap_or_else(|| current.notes.clone()),
        }
    }
}
