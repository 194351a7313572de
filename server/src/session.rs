//! Usage sessions: one timed interval of playing a reed.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::errors::BackendError;
use crate::ledger;
use crate::timestamps;

/// A single usage session in the database.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct UsageSession {
    pub id: Uuid,

    /// The reed this session was played on.
    pub reed_id: Uuid,

    #[serde(with = "timestamps")]
    pub start_time: OffsetDateTime,

    /// Absent while the session is still open.
    #[serde(default, with = "timestamps::option")]
    pub end_time: Option<OffsetDateTime>,

    /// Whole minutes between the timestamps; derived, never
    /// client-settable. Null until both timestamps are present.
    pub duration_minutes: Option<i64>,

    /// e.g. "Practice", "Rehearsal", "Performance", "Lesson".
    pub context: String,

    pub notes: String,
}

/// The client-submitted fields of a usage session.
#[derive(Clone, Debug, Deserialize)]
pub struct NewUsageSession {
    pub reed_id: Uuid,

    /// Defaults to the time of the request.
    #[serde(default, with = "timestamps::option")]
    pub start_time: Option<OffsetDateTime>,

    #[serde(default, with = "timestamps::option")]
    pub end_time: Option<OffsetDateTime>,

    #[serde(default)]
    pub context: String,

    #[serde(default)]
    pub notes: String,
}

impl NewUsageSession {
    /// Resolves defaults and computes the derived duration, rejecting
    /// reversed time bounds.
    pub fn into_fields(self, now: OffsetDateTime) -> Result<SessionFields, BackendError> {
        let start_time = self.start_time.unwrap_or(now);

        let duration_minutes = match self.end_time {
            Some(end) => Some(ledger::duration_minutes(start_time, end)?),
            None => None,
        };

        Ok(SessionFields {
            reed_id: self.reed_id,
            start_time,
            end_time: self.end_time,
            duration_minutes,
            context: self.context,
            notes: self.notes,
        })
    }
}

/// A partial update to a usage session. Absent fields keep their
/// current value; an already-set end time cannot be cleared here.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct UsageSessionPatch {
    pub reed_id: Option<Uuid>,

    #[serde(default, with = "timestamps::option")]
    pub start_time: Option<OffsetDateTime>,

    #[serde(default, with = "timestamps::option")]
    pub end_time: Option<OffsetDateTime>,

    pub context: Option<String>,
    pub notes: Option<String>,
}

impl UsageSessionPatch {
    pub fn apply(self, current: &UsageSession) -> Result<SessionFields, BackendError> {
        let start_time = self.start_time.unwrap_or(current.start_time);
        let end_time = self.end_time.or(current.end_time);

        let duration_minutes = match end_time {
            Some(end) => Some(ledger::duration_minutes(start_time, end)?),
            None => None,
        };

        Ok(SessionFields {
            reed_id: self.reed_id.unwrap_or(current.reed_id),
            start_time,
            end_time,
            duration_minutes,
            context: self.context.unwrap_or_else(|| current.context.clone()),
            notes: self.notes.unwrap_or_else(|| current.notes.clone()),
        })
    }
}

/// Criteria for narrowing a session listing. Absent fields match
/// everything.
#[derive(Clone, Debug, Default)]
pub struct SessionFilter {
    pub reed_id: Option<Uuid>,
    pub context: Option<String>,
}

/// The resolved column values of a session write, duration included.
#[derive(Clone, Debug)]
pub struct SessionFields {
    pub reed_id: Uuid,
    pub start_time: OffsetDateTime,
    pub end_time: Option<OffsetDateTime>,
    pub duration_minutes: Option<i64>,
    pub context: String,
    pub notes: String,
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;
    use uuid::Uuid;

    use super::*;

    fn at(seconds: i64) -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(seconds)
    }

    fn new_session(start: Option<i64>, end: Option<i64>) -> NewUsageSession {
        NewUsageSession {
            reed_id: Uuid::new_v4(),
            start_time: start.map(at),
            end_time: end.map(at),
            context: String::new(),
            notes: String::new(),
        }
    }

    #[test]
    fn closed_sessions_carry_their_duration() {
        let fields = new_session(Some(0), Some(45 * 60)).into_fields(at(99)).unwrap();
        assert_eq!(fields.duration_minutes, Some(45));
    }

    #[test]
    fn open_sessions_have_no_duration() {
        let fields = new_session(Some(0), None).into_fields(at(99)).unwrap();
        assert_eq!(fields.duration_minutes, None);
    }

    #[test]
    fn missing_start_defaults_to_now() {
        let fields = new_session(None, None).into_fields(at(1_000)).unwrap();
        assert_eq!(fields.start_time, at(1_000));
    }

    #[test]
    fn patches_recompute_the_duration() {
        let current = UsageSession {
            id: Uuid::new_v4(),
            reed_id: Uuid::new_v4(),
            start_time: at(0),
            end_time: Some(at(45 * 60)),
            duration_minutes: Some(45),
            context: "Practice".to_owned(),
            notes: String::new(),
        };

        let patch = UsageSessionPatch {
            end_time: Some(at(30 * 60)),
            ..UsageSessionPatch::default()
        };

        let fields = patch.apply(&current).unwrap();
        assert_eq!(fields.duration_minutes, Some(30));
        assert_eq!(fields.context, "Practice");
    }

    #[test]
    fn patches_reject_reversed_bounds() {
        let current = UsageSession {
            id: Uuid::new_v4(),
            reed_id: Uuid::new_v4(),
            start_time: at(600),
            end_time: None,
            duration_minutes: None,
            context: String::new(),
            notes: String::new(),
        };

        let patch = UsageSessionPatch {
            end_time: Some(at(0)),
            ..UsageSessionPatch::default()
        };

        assert!(patch.apply(&current).is_err());
    }
}
