//! Bookkeeping for the cumulative play-time counter on a reed.
//!
//! A usage session only contributes to its reed's counter once both of
//! its timestamps are known. The counter itself is moved by applying
//! signed deltas inside the same database transaction that writes the
//! session row, so the arithmetic here stays pure.

use time::OffsetDateTime;

use crate::errors::BackendError;

/// Computes the whole-minute duration of a closed session.
///
/// An end time before the start time is rejected rather than recorded
/// as a negative duration.
pub fn duration_minutes(
    start: OffsetDateTime,
    end: OffsetDateTime,
) -> Result<i64, BackendError> {
    if end < start {
        return Err(BackendError::validation(
            "end_time",
            "end_time precedes start_time",
        ));
    }

    Ok((end - start).whole_seconds() / 60)
}

/// The signed counter adjustment when a session's stored duration moves
/// from `old` to `new`. A session without a duration counts as zero.
pub fn play_time_delta(old: Option<i64>, new: Option<i64>) -> i64 {
    new.unwrap_or(0) - old.unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;

    use super::{duration_minutes, play_time_delta};
    use crate::errors::BackendError;

    fn at(seconds: i64) -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(seconds)
    }

    #[test]
    fn whole_minutes_are_floored() {
        assert_eq!(duration_minutes(at(0), at(45 * 60)).unwrap(), 45);
        assert_eq!(duration_minutes(at(0), at(45 * 60 + 59)).unwrap(), 45);
        assert_eq!(duration_minutes(at(0), at(59)).unwrap(), 0);
        assert_eq!(duration_minutes(at(0), at(0)).unwrap(), 0);
    }

    #[test]
    fn reversed_bounds_are_rejected() {
        match duration_minutes(at(60), at(0)) {
            Err(BackendError::Validation { field, .. }) => assert_eq!(field, "end_time"),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn deltas_treat_missing_durations_as_zero() {
        assert_eq!(play_time_delta(None, Some(45)), 45);
        assert_eq!(play_time_delta(Some(45), Some(30)), -15);
        assert_eq!(play_time_delta(Some(45), None), -45);
        assert_eq!(play_time_delta(None, None), 0);
    }
}
