//! Modifications: logged physical changes made to a reed and their
//! outcome.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::errors::{check_rating, BackendError};
use crate::timestamps;

/// The kind of change made to a reed. A closed set; unknown values are
/// rejected at the request boundary.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModificationType {
    Clip,
    ScrapeTip,
    ScrapeHeart,
    ScrapeBack,
    ScrapeRails,
    AdjustWire,
    TrimCorners,
    Balance,
    Other,
}

impl ModificationType {
    pub const ALL: [ModificationType; 9] = [
        ModificationType::Clip,
        ModificationType::ScrapeTip,
        ModificationType::ScrapeHeart,
        ModificationType::ScrapeBack,
        ModificationType::ScrapeRails,
        ModificationType::AdjustWire,
        ModificationType::TrimCorners,
        ModificationType::Balance,
        ModificationType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModificationType::Clip => "clip",
            ModificationType::ScrapeTip => "scrape_tip",
            ModificationType::ScrapeHeart => "scrape_heart",
            ModificationType::ScrapeBack => "scrape_back",
            ModificationType::ScrapeRails => "scrape_rails",
            ModificationType::AdjustWire => "adjust_wire",
            ModificationType::TrimCorners => "trim_corners",
            ModificationType::Balance => "balance",
            ModificationType::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.as_str() == value)
    }
}

/// A single modification record in the database.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Modification {
    pub id: Uuid,
    pub reed_id: Uuid,

    #[serde(with = "timestamps")]
    pub timestamp: OffsetDateTime,

    pub modification_type: ModificationType,

    /// Required free text describing what was done.
    pub description: String,

    /// What the change was trying to fix or improve.
    pub goal: String,

    /// How successful it was, 1–10.
    pub success_rating: Option<i16>,
}

/// The client-submitted fields of a modification.
#[derive(Clone, Debug, Deserialize)]
pub struct ModificationFields {
    pub reed_id: Uuid,

    /// Defaults to the time of the request.
    #[serde(default, with = "timestamps::option")]
    pub timestamp: Option<OffsetDateTime>,

    pub modification_type: ModificationType,

    pub description: String,

    #[serde(default)]
    pub goal: String,

    #[serde(default)]
    pub success_rating: Option<i16>,
}

impl ModificationFields {
    pub fn validate(&self) -> Result<(), BackendError> {
        if self.description.trim().is_empty() {
            return Err(BackendError::validation(
                "description",
                "description must not be blank",
            ));
        }

        check_rating("success_rating", self.success_rating)
    }
}

/// Criteria for narrowing a modification listing.
#[derive(Clone, Debug, Default)]
pub struct ModificationFilter {
    pub reed_id: Option<Uuid>,
    pub modification_type: Option<ModificationType>,
}

/// A partial update to a modification.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ModificationPatch {
    pub reed_id: Option<Uuid>,

    #[serde(default, with = "timestamps::option")]
    pub timestamp: Option<OffsetDateTime>,

    pub modification_type: Option<ModificationType>,
    pub description: Option<String>,
    pub goal: Option<String>,
    pub success_rating: Option<i16>,
}

impl ModificationPatch {
    pub fn apply(self, current: &Modification) -> ModificationFields {
        ModificationFields {
            reed_id: self.reed_id.unwrap_or(current.reed_id),
            timestamp: Some(self.timestamp.unwrap_or(current.timestamp)),
            modification_type: self.modification_type.unwrap_or(current.modification_type),
            description: self
                .description
                .unwrap_or_else(|| current.description.clone()),
            goal: self.goal.unwrap_or_else(|| current.goal.clone()),
            success_rating: self.success_rating.or(current.success_rating),
        }
    }
}
