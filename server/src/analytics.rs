//! Read-only descriptive statistics over a reed's records and over the
//! whole collection. Computed at request time, never persisted.
//!
//! Averages are taken only over ratings that are actually present: a
//! reed with no snapshots reports null averages, not zero.

use std::collections::BTreeMap;

use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::modification::{Modification, ModificationType};
use crate::quality::QualitySnapshot;
use crate::reed::{Reed, ReedStatus};
use crate::session::UsageSession;

/// Mean of each rating dimension across a set of snapshots.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QualityMetrics {
    pub avg_tone: Option<f64>,
    pub avg_response: Option<f64>,
    pub avg_intonation: Option<f64>,
    pub avg_stability: Option<f64>,
    pub avg_ease: Option<f64>,
    pub avg_overall: Option<f64>,
    pub snapshot_count: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UsageMetrics {
    pub total_sessions: i64,

    /// Sum of the non-null durations; null when no session has one.
    pub total_minutes: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ModificationMetrics {
    pub total_modifications: i64,
    pub avg_success: Option<f64>,

    /// Count per modification type. Types with zero occurrences are
    /// omitted, not zero-filled.
    pub types_breakdown: BTreeMap<ModificationType, i64>,
}

/// The per-reed analytics payload.
#[derive(Clone, Debug, Serialize)]
pub struct ReedAnalytics {
    pub reed_id: Uuid,
    pub reed_name: String,
    pub status: ReedStatus,

    /// Whole days since the reed was created, evaluated at request time.
    pub age_days: i64,

    pub quality_metrics: QualityMetrics,
    pub usage_metrics: UsageMetrics,
    pub modification_metrics: ModificationMetrics,
}

/// The summary shape reports fewer dimensions than the per-reed one.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OverallQualityMetrics {
    pub avg_tone: Option<f64>,
    pub avg_response: Option<f64>,
    pub avg_intonation: Option<f64>,
    pub avg_overall: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TotalUsage {
    /// Sum of every reed's counter; null when there are no reeds.
    pub total_play_time: Option<i64>,
}

/// The collection-wide summary payload.
#[derive(Clone, Debug, Serialize)]
pub struct Summary {
    pub total_reeds: i64,

    /// Every status in the enumeration, zero-filled.
    pub status_breakdown: BTreeMap<ReedStatus, i64>,

    pub overall_quality_metrics: OverallQualityMetrics,
    pub total_usage: TotalUsage,
}

fn mean_rating<F>(snapshots: &[QualitySnapshot], rating: F) -> Option<f64>
where
    F: Fn(&QualitySnapshot) -> Option<i16>,
{
    let values: Vec<i64> = snapshots
        .iter()
        .filter_map(|s| rating(s).map(i64::from))
        .collect();

    if values.is_empty() {
        return None;
    }

    Some(values.iter().sum::<i64>() as f64 / values.len() as f64)
}

pub fn quality_metrics(snapshots: &[QualitySnapshot]) -> QualityMetrics {
    QualityMetrics {
        avg_tone: mean_rating(snapshots, |s| s.tone_quality),
        avg_response: mean_rating(snapshots, |s| s.response),
        avg_intonation: mean_rating(snapshots, |s| s.intonation),
        avg_stability: mean_rating(snapshots, |s| s.stability),
        avg_ease: mean_rating(snapshots, |s| s.ease_of_playing),
        avg_overall: mean_rating(snapshots, |s| s.overall_rating),
        snapshot_count: snapshots.len() as i64,
    }
}

pub fn usage_metrics(sessions: &[UsageSession]) -> UsageMetrics {
    let durations: Vec<i64> = sessions.iter().filter_map(|s| s.duration_minutes).collect();

    UsageMetrics {
        total_sessions: sessions.len() as i64,
        total_minutes: if durations.is_empty() {
            None
        } else {
            Some(durations.iter().sum())
        },
    }
}

pub fn modification_metrics(modifications: &[Modification]) -> ModificationMetrics {
    let ratings: Vec<i64> = modifications
        .iter()
        .filter_map(|m| m.success_rating.map(i64::from))
        .collect();

    let mut types_breakdown = BTreeMap::new();
    for modification in modifications {
        *types_breakdown
            .entry(modification.modification_type)
            .or_insert(0) += 1;
    }

    ModificationMetrics {
        total_modifications: modifications.len() as i64,
        avg_success: if ratings.is_empty() {
            None
        } else {
            Some(ratings.iter().sum::<i64>() as f64 / ratings.len() as f64)
        },
        types_breakdown,
    }
}

/// Assembles the per-reed analytics payload from a fully loaded reed.
pub fn reed_analytics(reed: &Reed, now: OffsetDateTime) -> ReedAnalytics {
    ReedAnalytics {
        reed_id: reed.id,
        reed_name: reed.name.clone(),
        status: reed.status,
        age_days: (now - reed.created_date).whole_days(),
        quality_metrics: quality_metrics(&reed.quality_snapshots),
        usage_metrics: usage_metrics(&reed.usage_sessions),
        modification_metrics: modification_metrics(&reed.modifications),
    }
}

/// Assembles the collection-wide summary payload.
pub fn summary(
    total_reeds: i64,
    status_counts: &[(ReedStatus, i64)],
    snapshots: &[QualitySnapshot],
    total_play_time: Option<i64>,
) -> Summary {
    let mut status_breakdown: BTreeMap<ReedStatus, i64> =
        ReedStatus::ALL.iter().map(|s| (*s, 0)).collect();

    for (status, count) in status_counts {
        status_breakdown.insert(*status, *count);
    }

    Summary {
        total_reeds,
        status_breakdown,
        overall_quality_metrics: OverallQualityMetrics {
            avg_tone: mean_rating(snapshots, |s| s.tone_quality),
            avg_response: mean_rating(snapshots, |s| s.response),
            avg_intonation: mean_rating(snapshots, |s| s.intonation),
            avg_overall: mean_rating(snapshots, |s| s.overall_rating),
        },
        total_usage: TotalUsage { total_play_time },
    }
}
