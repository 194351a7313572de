//! The central entity: an oboe reed, its lifecycle label, and its
//! derived cumulative play-time counter.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::errors::BackendError;
use crate::modification::Modification;
use crate::normalization;
use crate::quality::QualitySnapshot;
use crate::session::UsageSession;
use crate::timestamps;

/// The lifecycle label of a reed. A free-form closed set; no
/// transition order is enforced.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReedStatus {
    New,
    BreakingIn,
    Prime,
    Declining,
    Retired,
}

impl ReedStatus {
    pub const ALL: [ReedStatus; 5] = [
        ReedStatus::New,
        ReedStatus::BreakingIn,
        ReedStatus::Prime,
        ReedStatus::Declining,
        ReedStatus::Retired,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReedStatus::New => "new",
            ReedStatus::BreakingIn => "breaking_in",
            ReedStatus::Prime => "prime",
            ReedStatus::Declining => "declining",
            ReedStatus::Retired => "retired",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.as_str() == value)
    }
}

impl Default for ReedStatus {
    fn default() -> Self {
        ReedStatus::New
    }
}

/// The full representation of a reed, nested child collections
/// included. Returned by detail, create, and update endpoints.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Reed {
    pub id: Uuid,
    pub name: String,

    #[serde(with = "timestamps")]
    pub created_date: OffsetDateTime,

    pub status: ReedStatus,

    /// Source or brand of cane.
    pub cane_source: String,

    /// Shape used for this reed.
    pub shape: String,

    /// Gouge thickness in millimeters.
    pub gouge_thickness: Option<f64>,

    pub notes: String,

    /// Derived; always the sum of the closed sessions' durations.
    pub total_play_time_minutes: i64,

    pub thread_id: Option<Uuid>,
    pub staple_id: Option<Uuid>,

    pub usage_sessions: Vec<UsageSession>,
    pub quality_snapshots: Vec<QualitySnapshot>,
    pub modifications: Vec<Modification>,
}

/// The lighter row returned by the list endpoint: no notes, no
/// children. A fixed second shape rather than a dynamic one.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ReedSummary {
    pub id: Uuid,
    pub name: String,

    #[serde(with = "timestamps")]
    pub created_date: OffsetDateTime,

    pub status: ReedStatus,
    pub cane_source: String,
    pub shape: String,
    pub gouge_thickness: Option<f64>,
    pub total_play_time_minutes: i64,
}

/// The client-submitted fields of a reed. The name may be omitted when
/// both component references are given; it is then synthesized once,
/// at creation.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct NewReed {
    #[serde(default, deserialize_with = "normalization::deserialize_option")]
    pub name: Option<String>,

    /// Defaults to the time of the request on creation; kept unchanged
    /// when omitted on a full update.
    #[serde(default, with = "timestamps::option")]
    pub created_date: Option<OffsetDateTime>,

    #[serde(default)]
    pub status: ReedStatus,

    #[serde(default)]
    pub cane_source: String,

    #[serde(default)]
    pub shape: String,

    #[serde(default)]
    pub gouge_thickness: Option<f64>,

    #[serde(default)]
    pub notes: String,

    #[serde(default)]
    pub thread_id: Option<Uuid>,

    #[serde(default)]
    pub staple_id: Option<Uuid>,
}

impl NewReed {
    pub fn validate(&self) -> Result<(), BackendError> {
        if let Some(thickness) = self.gouge_thickness {
            if thickness <= 0.0 {
                return Err(BackendError::validation(
                    "gouge_thickness",
                    "gouge thickness must be positive",
                ));
            }
        }

        if let Some(name) = &self.name {
            if name.is_empty() {
                return Err(BackendError::validation("name", "name must not be blank"));
            }
        }

        Ok(())
    }
}

/// A partial update to a reed. The play-time counter is never
/// client-settable and has no field here.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ReedPatch {
    #[serde(default, deserialize_with = "normalization::deserialize_option")]
    pub name: Option<String>,

    #[serde(default, with = "timestamps::option")]
    pub created_date: Option<OffsetDateTime>,

    pub status: Option<ReedStatus>,
    pub cane_source: Option<String>,
    pub shape: Option<String>,
    pub gouge_thickness: Option<f64>,
    pub notes: Option<String>,
    pub thread_id: Option<Uuid>,
    pub staple_id: Option<Uuid>,
}

impl ReedPatch {
    pub fn validate(&self) -> Result<(), BackendError> {
        if let Some(thickness) = self.gouge_thickness {
            if thickness <= 0.0 {
                return Err(BackendError::validation(
                    "gouge_thickness",
                    "gouge thickness must be positive",
                ));
            }
        }

        if let Some(name) = &self.name {
            if name.is_empty() {
                return Err(BackendError::validation("name", "name must not be blank"));
            }
        }

        Ok(())
    }

    pub fn apply(self, current: &Reed) -> ReedFields {
        ReedFields {
            name: self.name.unwrap_or_else(|| current.name.clone()),
            created_date: Some(self.created_date.unwrap_or(current.created_date)),
            status: self.status.unwrap_or(current.status),
            cane_source: self
                .cane_source
                .unwrap_or_else(|| current.cane_source.clone()),
            shape: self.shape.unwrap_or_else(|| current.shape.clone()),
            gouge_thickness: self.gouge_thickness.or(current.gouge_thickness),
            notes: self.notes.unwrap_or_else(|| current.notes.clone()),
            thread_id: self.thread_id.or(current.thread_id),
            staple_id: self.staple_id.or(current.staple_id),
        }
    }
}

/// The resolved column values of a reed write. The name has already
/// been provided or synthesized by this point.
#[derive(Clone, Debug)]
pub struct ReedFields {
    pub name: String,

    /// `None` means "let the database default to now".
    pub created_date: Option<OffsetDateTime>,

    pub status: ReedStatus,
    pub cane_source: String,
    pub shape: String,
    pub gouge_thickness: Option<f64>,
    pub notes: String,
    pub thread_id: Option<Uuid>,
    pub staple_id: Option<Uuid>,
}
