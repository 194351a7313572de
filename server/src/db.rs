use futures::future::BoxFuture;
use uuid::Uuid;

use crate::errors::BackendError;
use crate::hardware::{Staple, StapleFields, Thread, ThreadFields};
use crate::modification::{Modification, ModificationFields, ModificationFilter};
use crate::quality::{QualitySnapshot, SnapshotFields, SnapshotFilter};
use crate::reed::{Reed, ReedFields, ReedStatus, ReedSummary};
use crate::session::{SessionFields, SessionFilter, UsageSession};

/// Persistence operations for the reed collection.
///
/// Usage-session writes carry the play-time ledger with them: the
/// session row and the owning reed's counter move inside one
/// transaction, with the counter adjusted by an atomic delta rather
/// than a read-modify-write.
pub trait Db {
    // reeds

    fn insert_reed(&self, fields: ReedFields) -> BoxFuture<Result<Reed, BackendError>>;

    fn retrieve_reed(&self, id: &Uuid) -> BoxFuture<Result<Option<Reed>, BackendError>>;

    fn list_reeds(
        &self,
        limit: i64,
        offset: i64,
    ) -> BoxFuture<Result<Vec<ReedSummary>, BackendError>>;

    fn count_reeds(&self) -> BoxFuture<Result<i64, BackendError>>;

    fn update_reed(&self, id: &Uuid, fields: ReedFields) -> BoxFuture<Result<(), BackendError>>;

    /// Cascades to the reed's sessions, snapshots, and modifications.
    fn delete_reed(&self, id: &Uuid) -> BoxFuture<Result<(), BackendError>>;

    // usage sessions

    fn insert_session(
        &self,
        fields: SessionFields,
    ) -> BoxFuture<Result<UsageSession, BackendError>>;

    fn retrieve_session(
        &self,
        id: &Uuid,
    ) -> BoxFuture<Result<Option<UsageSession>, BackendError>>;

    fn list_sessions(
        &self,
        filter: SessionFilter,
        limit: i64,
        offset: i64,
    ) -> BoxFuture<Result<Vec<UsageSession>, BackendError>>;

    fn count_sessions(&self, filter: SessionFilter) -> BoxFuture<Result<i64, BackendError>>;

    fn update_session(
        &self,
        id: &Uuid,
        fields: SessionFields,
    ) -> BoxFuture<Result<UsageSession, BackendError>>;

    fn delete_session(&self, id: &Uuid) -> BoxFuture<Result<(), BackendError>>;

    // quality snapshots

    fn insert_snapshot(
        &self,
        fields: SnapshotFields,
    ) -> BoxFuture<Result<QualitySnapshot, BackendError>>;

    fn retrieve_snapshot(
        &self,
        id: &Uuid,
    ) -> BoxFuture<Result<Option<QualitySnapshot>, BackendError>>;

    fn list_snapshots(
        &self,
        filter: SnapshotFilter,
        limit: i64,
        offset: i64,
    ) -> BoxFuture<Result<Vec<QualitySnapshot>, BackendError>>;

    fn count_snapshots(&self, filter: SnapshotFilter) -> BoxFuture<Result<i64, BackendError>>;

    fn update_snapshot(
        &self,
        id: &Uuid,
        fields: SnapshotFields,
    ) -> BoxFuture<Result<QualitySnapshot, BackendError>>;

    fn delete_snapshot(&self, id: &Uuid) -> BoxFuture<Result<(), BackendError>>;

    // modifications

    fn insert_modification(
        &self,
        fields: ModificationFields,
    ) -> BoxFuture<Result<Modification, BackendError>>;

    fn retrieve_modification(
        &self,
        id: &Uuid,
    ) -> BoxFuture<Result<Option<Modification>, BackendError>>;

    fn list_modifications(
        &self,
        filter: ModificationFilter,
        limit: i64,
        offset: i64,
    ) -> BoxFuture<Result<Vec<Modification>, BackendError>>;

    fn count_modifications(
        &self,
        filter: ModificationFilter,
    ) -> BoxFuture<Result<i64, BackendError>>;

    fn update_modification(
        &self,
        id: &Uuid,
        fields: ModificationFields,
    ) -> BoxFuture<Result<Modification, BackendError>>;

    fn delete_modification(&self, id: &Uuid) -> BoxFuture<Result<(), BackendError>>;

    // threads

    fn insert_thread(&self, fields: ThreadFields) -> BoxFuture<Result<Thread, BackendError>>;

    fn retrieve_thread(&self, id: &Uuid) -> BoxFuture<Result<Option<Thread>, BackendError>>;

    fn list_threads(
        &self,
        limit: i64,
        offset: i64,
    ) -> BoxFuture<Result<Vec<Thread>, BackendError>>;

    fn count_threads(&self) -> BoxFuture<Result<i64, BackendError>>;

    fn update_thread(
        &self,
        id: &Uuid,
        fields: ThreadFields,
    ) -> BoxFuture<Result<Thread, BackendError>>;

    /// Fails with `StillReferenced` while any reed points at the thread.
    fn delete_thread(&self, id: &Uuid) -> BoxFuture<Result<(), BackendError>>;

    // staples

    fn insert_staple(&self, fields: StapleFields) -> BoxFuture<Result<Staple, BackendError>>;

    fn retrieve_staple(&self, id: &Uuid) -> BoxFuture<Result<Option<Staple>, BackendError>>;

    fn list_staples(
        &self,
        limit: i64,
        offset: i64,
    ) -> BoxFuture<Result<Vec<Staple>, BackendError>>;

    fn count_staples(&self) -> BoxFuture<Result<i64, BackendError>>;

    fn update_staple(
        &self,
        id: &Uuid,
        fields: StapleFields,
    ) -> BoxFuture<Result<Staple, BackendError>>;

    /// Fails with `StillReferenced` while any reed points at the staple.
    fn delete_staple(&self, id: &Uuid) -> BoxFuture<Result<(), BackendError>>;

    // analytics inputs

    fn status_counts(&self) -> BoxFuture<Result<Vec<(ReedStatus, i64)>, BackendError>>;

    fn all_snapshots(&self) -> BoxFuture<Result<Vec<QualitySnapshot>, BackendError>>;

    fn total_play_time(&self) -> BoxFuture<Result<Option<i64>, BackendError>>;
}

#[cfg(test)]
pub(crate) mod mock;

pub use self::postgres::*;

mod postgres {
    use futures::future::BoxFuture;
    use futures::FutureExt;
    use sqlx::{
        self,
        postgres::{PgPool, PgRow},
        Postgres, Transaction,
    };
    use time::OffsetDateTime;
    use uuid::Uuid;

    use crate::errors::BackendError;
    use crate::hardware::{
        Staple, StapleFields, StapleMaterial, StapleShape, Thread, ThreadFields,
    };
    use crate::ledger;
    use crate::modification::{
        Modification, ModificationFields, ModificationFilter, ModificationType,
    };
    use crate::quality::{QualitySnapshot, SnapshotFields, SnapshotFilter};
    use crate::reed::{Reed, ReedFields, ReedStatus, ReedSummary};
    use crate::session::{SessionFields, SessionFilter, UsageSession};

    const REEDS_THREAD_CONSTRAINT: &str = "reeds_thread_fk";
    const REEDS_STAPLE_CONSTRAINT: &str = "reeds_staple_fk";
    const REED_CHILD_CONSTRAINTS: [&str; 3] = [
        "usage_sessions_reed_fk",
        "quality_snapshots_reed_fk",
        "modifications_reed_fk",
    ];

    pub struct PgDb {
        pool: PgPool,
    }

    impl PgDb {
        pub fn new(pool: PgPool) -> Self {
            PgDb { pool }
        }
    }

    // these can be simplified once async functions in traits are stabilized
    impl super::Db for PgDb {
        fn insert_reed(&self, fields: ReedFields) -> BoxFuture<Result<Reed, BackendError>> {
            async move {
                let query = sqlx::query(include_str!("queries/create_reed.sql"));

                let reed = query
                    .bind(&fields.name)
                    .bind(fields.created_date)
                    .bind(fields.status.as_str())
                    .bind(&fields.cane_source)
                    .bind(&fields.shape)
                    .bind(fields.gouge_thickness)
                    .bind(&fields.notes)
                    .bind(fields.thread_id)
                    .bind(fields.staple_id)
                    .try_map(|row: PgRow| reed_from_row(&row))
                    .fetch_one(&self.pool)
                    .await
                    .map_err(map_reed_write_error)?;

                Ok(reed)
            }
            .boxed()
        }

        fn retrieve_reed(&self, id: &Uuid) -> BoxFuture<Result<Option<Reed>, BackendError>> {
            let id = *id;

            async move {
                let query = sqlx::query(include_str!("queries/retrieve_reed.sql"));

                let reed: Option<Reed> = query
                    .bind(id)
                    .try_map(|row: PgRow| reed_from_row(&row))
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                let mut reed = match reed {
                    Some(reed) => reed,
                    None => return Ok(None),
                };

                reed.usage_sessions = sqlx::query(include_str!("queries/sessions_for_reed.sql"))
                    .bind(id)
                    .try_map(|row: PgRow| session_from_row(&row))
                    .fetch_all(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                reed.quality_snapshots =
                    sqlx::query(include_str!("queries/snapshots_for_reed.sql"))
                        .bind(id)
                        .try_map(|row: PgRow| snapshot_from_row(&row))
                        .fetch_all(&self.pool)
                        .await
                        .map_err(map_sqlx_error)?;

                reed.modifications =
                    sqlx::query(include_str!("queries/modifications_for_reed.sql"))
                        .bind(id)
                        .try_map(|row: PgRow| modification_from_row(&row))
                        .fetch_all(&self.pool)
                        .await
                        .map_err(map_sqlx_error)?;

                Ok(Some(reed))
            }
            .boxed()
        }

        fn list_reeds(
            &self,
            limit: i64,
            offset: i64,
        ) -> BoxFuture<Result<Vec<ReedSummary>, BackendError>> {
            async move {
                let query = sqlx::query(include_str!("queries/list_reeds.sql"));

                let reeds = query
                    .bind(limit)
                    .bind(offset)
                    .try_map(|row: PgRow| reed_summary_from_row(&row))
                    .fetch_all(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(reeds)
            }
            .boxed()
        }

        fn count_reeds(&self) -> BoxFuture<Result<i64, BackendError>> {
            count(&self.pool, include_str!("queries/count_reeds.sql")).boxed()
        }

        fn update_reed(
            &self,
            id: &Uuid,
            fields: ReedFields,
        ) -> BoxFuture<Result<(), BackendError>> {
            let id = *id;

            async move {
                let query = sqlx::query(include_str!("queries/update_reed.sql"));

                let count = query
                    .bind(id)
                    .bind(&fields.name)
                    .bind(fields.created_date)
                    .bind(fields.status.as_str())
                    .bind(&fields.cane_source)
                    .bind(&fields.shape)
                    .bind(fields.gouge_thickness)
                    .bind(&fields.notes)
                    .bind(fields.thread_id)
                    .bind(fields.staple_id)
                    .execute(&self.pool)
                    .await
                    .map_err(map_reed_write_error)?
                    .rows_affected();

                if count == 0 {
                    Err(BackendError::NonExistentId(id))
                } else {
                    Ok(())
                }
            }
            .boxed()
        }

        fn delete_reed(&self, id: &Uuid) -> BoxFuture<Result<(), BackendError>> {
            delete(
                &self.pool,
                include_str!("queries/delete_reed.sql"),
                *id,
            )
            .boxed()
        }

        fn insert_session(
            &self,
            fields: SessionFields,
        ) -> BoxFuture<Result<UsageSession, BackendError>> {
            async move {
                let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

                let session = sqlx::query(include_str!("queries/create_session.sql"))
                    .bind(fields.reed_id)
                    .bind(fields.start_time)
                    .bind(fields.end_time)
                    .bind(fields.duration_minutes)
                    .bind(&fields.context)
                    .bind(&fields.notes)
                    .try_map(|row: PgRow| session_from_row(&row))
                    .fetch_one(&mut tx)
                    .await
                    .map_err(map_sqlx_error)?;

                if let Some(duration) = session.duration_minutes {
                    apply_play_time(&mut tx, &session.reed_id, duration).await?;
                }

                tx.commit().await.map_err(map_sqlx_error)?;

                Ok(session)
            }
            .boxed()
        }

        fn retrieve_session(
            &self,
            id: &Uuid,
        ) -> BoxFuture<Result<Option<UsageSession>, BackendError>> {
            let id = *id;

            async move {
                let query = sqlx::query(include_str!("queries/retrieve_session.sql"));

                let session = query
                    .bind(id)
                    .try_map(|row: PgRow| session_from_row(&row))
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(session)
            }
            .boxed()
        }

        fn list_sessions(
            &self,
            filter: SessionFilter,
            limit: i64,
            offset: i64,
        ) -> BoxFuture<Result<Vec<UsageSession>, BackendError>> {
            async move {
                let query = sqlx::query(include_str!("queries/list_sessions.sql"));

                let sessions = query
                    .bind(limit)
                    .bind(offset)
                    .bind(filter.reed_id)
                    .bind(filter.context)
                    .try_map(|row: PgRow| session_from_row(&row))
                    .fetch_all(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(sessions)
            }
            .boxed()
        }

        fn count_sessions(&self, filter: SessionFilter) -> BoxFuture<Result<i64, BackendError>> {
            async move {
                let (count,): (i64,) =
                    sqlx::query_as(include_str!("queries/count_sessions.sql"))
                        .bind(filter.reed_id)
                        .bind(filter.context)
                        .fetch_one(&self.pool)
                        .await
                        .map_err(map_sqlx_error)?;

                Ok(count)
            }
            .boxed()
        }

        fn update_session(
            &self,
            id: &Uuid,
            fields: SessionFields,
        ) -> BoxFuture<Result<UsageSession, BackendError>> {
            let id = *id;

            async move {
                let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

                let old: Option<(Uuid, Option<i64>)> =
                    sqlx::query_as(include_str!("queries/lock_session.sql"))
                        .bind(id)
                        .fetch_optional(&mut tx)
                        .await
                        .map_err(map_sqlx_error)?;

                let (old_reed, old_duration) = old.ok_or(BackendError::NonExistentId(id))?;

                let session = sqlx::query(include_str!("queries/update_session.sql"))
                    .bind(id)
                    .bind(fields.reed_id)
                    .bind(fields.start_time)
                    .bind(fields.end_time)
                    .bind(fields.duration_minutes)
                    .bind(&fields.context)
                    .bind(&fields.notes)
                    .try_map(|row: PgRow| session_from_row(&row))
                    .fetch_one(&mut tx)
                    .await
                    .map_err(map_sqlx_error)?;

                if old_reed == session.reed_id {
                    let delta = ledger::play_time_delta(old_duration, session.duration_minutes);

                    if delta != 0 {
                        apply_play_time(&mut tx, &session.reed_id, delta).await?;
                    }
                } else {
                    // the session moved to another reed; both counters move
                    if let Some(old_duration) = old_duration {
                        apply_play_time(&mut tx, &old_reed, -old_duration).await?;
                    }

                    if let Some(duration) = session.duration_minutes {
                        apply_play_time(&mut tx, &session.reed_id, duration).await?;
                    }
                }

                tx.commit().await.map_err(map_sqlx_error)?;

                Ok(session)
            }
            .boxed()
        }

        fn delete_session(&self, id: &Uuid) -> BoxFuture<Result<(), BackendError>> {
            let id = *id;

            async move {
                let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

                let old: Option<(Uuid, Option<i64>)> =
                    sqlx::query_as(include_str!("queries/lock_session.sql"))
                        .bind(id)
                        .fetch_optional(&mut tx)
                        .await
                        .map_err(map_sqlx_error)?;

                let (reed_id, duration) = old.ok_or(BackendError::NonExistentId(id))?;

                sqlx::query(include_str!("queries/delete_session.sql"))
                    .bind(id)
                    .execute(&mut tx)
                    .await
                    .map_err(map_sqlx_error)?;

                if let Some(duration) = duration {
                    apply_play_time(&mut tx, &reed_id, -duration).await?;
                }

                tx.commit().await.map_err(map_sqlx_error)?;

                Ok(())
            }
            .boxed()
        }

        fn insert_snapshot(
            &self,
            fields: SnapshotFields,
        ) -> BoxFuture<Result<QualitySnapshot, BackendError>> {
            async move {
                let query = sqlx::query(include_str!("queries/create_snapshot.sql"));

                let snapshot = query
                    .bind(fields.reed_id)
                    .bind(fields.timestamp)
                    .bind(fields.tone_quality)
                    .bind(fields.response)
                    .bind(fields.intonation)
                    .bind(fields.stability)
                    .bind(fields.ease_of_playing)
                    .bind(fields.overall_rating)
                    .bind(&fields.notes)
                    .try_map(|row: PgRow| snapshot_from_row(&row))
                    .fetch_one(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(snapshot)
            }
            .boxed()
        }

        fn retrieve_snapshot(
            &self,
            id: &Uuid,
        ) -> BoxFuture<Result<Option<QualitySnapshot>, BackendError>> {
            let id = *id;

            async move {
                let query = sqlx::query(include_str!("queries/retrieve_snapshot.sql"));

                let snapshot = query
                    .bind(id)
                    .try_map(|row: PgRow| snapshot_from_row(&row))
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(snapshot)
            }
            .boxed()
        }

        fn list_snapshots(
            &self,
            filter: SnapshotFilter,
            limit: i64,
            offset: i64,
        ) -> BoxFuture<Result<Vec<QualitySnapshot>, BackendError>> {
            async move {
                let query = sqlx::query(include_str!("queries/list_snapshots.sql"));

                let snapshots = query
                    .bind(limit)
                    .bind(offset)
                    .bind(filter.reed_id)
                    .try_map(|row: PgRow| snapshot_from_row(&row))
                    .fetch_all(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(snapshots)
            }
            .boxed()
        }

        fn count_snapshots(&self, filter: SnapshotFilter) -> BoxFuture<Result<i64, BackendError>> {
            async move {
                let (count,): (i64,) =
                    sqlx::query_as(include_str!("queries/count_snapshots.sql"))
                        .bind(filter.reed_id)
                        .fetch_one(&self.pool)
                        .await
                        .map_err(map_sqlx_error)?;

                Ok(count)
            }
            .boxed()
        }

        fn update_snapshot(
            &self,
            id: &Uuid,
            fields: SnapshotFields,
        ) -> BoxFuture<Result<QualitySnapshot, BackendError>> {
            let id = *id;

            async move {
                let query = sqlx::query(include_str!("queries/update_snapshot.sql"));

                let snapshot = query
                    .bind(id)
                    .bind(fields.reed_id)
                    .bind(fields.timestamp)
                    .bind(fields.tone_quality)
                    .bind(fields.response)
                    .bind(fields.intonation)
                    .bind(fields.stability)
                    .bind(fields.ease_of_playing)
                    .bind(fields.overall_rating)
                    .bind(&fields.notes)
                    .try_map(|row: PgRow| snapshot_from_row(&row))
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                snapshot.ok_or(BackendError::NonExistentId(id))
            }
            .boxed()
        }

        fn delete_snapshot(&self, id: &Uuid) -> BoxFuture<Result<(), BackendError>> {
            delete(
                &self.pool,
                include_str!("queries/delete_snapshot.sql"),
                *id,
            )
            .boxed()
        }

        fn insert_modification(
            &self,
            fields: ModificationFields,
        ) -> BoxFuture<Result<Modification, BackendError>> {
            async move {
                let query = sqlx::query(include_str!("queries/create_modification.sql"));

                let modification = query
                    .bind(fields.reed_id)
                    .bind(fields.timestamp)
                    .bind(fields.modification_type.as_str())
                    .bind(&fields.description)
                    .bind(&fields.goal)
                    .bind(fields.success_rating)
                    .try_map(|row: PgRow| modification_from_row(&row))
                    .fetch_one(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(modification)
            }
            .boxed()
        }

        fn retrieve_modification(
            &self,
            id: &Uuid,
        ) -> BoxFuture<Result<Option<Modification>, BackendError>> {
            let id = *id;

            async move {
                let query = sqlx::query(include_str!("queries/retrieve_modification.sql"));

                let modification = query
                    .bind(id)
                    .try_map(|row: PgRow| modification_from_row(&row))
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(modification)
            }
            .boxed()
        }

        fn list_modifications(
            &self,
            filter: ModificationFilter,
            limit: i64,
            offset: i64,
        ) -> BoxFuture<Result<Vec<Modification>, BackendError>> {
            async move {
                let query = sqlx::query(include_str!("queries/list_modifications.sql"));

                let modifications = query
                    .bind(limit)
                    .bind(offset)
                    .bind(filter.reed_id)
                    .bind(filter.modification_type.map(|t| t.as_str()))
                    .try_map(|row: PgRow| modification_from_row(&row))
                    .fetch_all(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(modifications)
            }
            .boxed()
        }

        fn count_modifications(
            &self,
            filter: ModificationFilter,
        ) -> BoxFuture<Result<i64, BackendError>> {
            async move {
                let (count,): (i64,) =
                    sqlx::query_as(include_str!("queries/count_modifications.sql"))
                        .bind(filter.reed_id)
                        .bind(filter.modification_type.map(|t| t.as_str()))
                        .fetch_one(&self.pool)
                        .await
                        .map_err(map_sqlx_error)?;

                Ok(count)
            }
            .boxed()
        }

        fn update_modification(
            &self,
            id: &Uuid,
            fields: ModificationFields,
        ) -> BoxFuture<Result<Modification, BackendError>> {
            let id = *id;

            async move {
                let query = sqlx::query(include_str!("queries/update_modification.sql"));

                let modification = query
                    .bind(id)
                    .bind(fields.reed_id)
                    .bind(fields.timestamp)
                    .bind(fields.modification_type.as_str())
                    .bind(&fields.description)
                    .bind(&fields.goal)
                    .bind(fields.success_rating)
                    .try_map(|row: PgRow| modification_from_row(&row))
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                modification.ok_or(BackendError::NonExistentId(id))
            }
            .boxed()
        }

        fn delete_modification(&self, id: &Uuid) -> BoxFuture<Result<(), BackendError>> {
            delete(
                &self.pool,
                include_str!("queries/delete_modification.sql"),
                *id,
            )
            .boxed()
        }

        fn insert_thread(&self, fields: ThreadFields) -> BoxFuture<Result<Thread, BackendError>> {
            async move {
                let query = sqlx::query(include_str!("queries/create_thread.sql"));

                let thread = query
                    .bind(&fields.color)
                    .bind(&fields.gauge)
                    .try_map(|row: PgRow| thread_from_row(&row))
                    .fetch_one(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(thread)
            }
            .boxed()
        }

        fn retrieve_thread(&self, id: &Uuid) -> BoxFuture<Result<Option<Thread>, BackendError>> {
            let id = *id;

            async move {
                let query = sqlx::query(include_str!("queries/retrieve_thread.sql"));

                let thread = query
                    .bind(id)
                    .try_map(|row: PgRow| thread_from_row(&row))
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(thread)
            }
            .boxed()
        }

        fn list_threads(
            &self,
            limit: i64,
            offset: i64,
        ) -> BoxFuture<Result<Vec<Thread>, BackendError>> {
            async move {
                let query = sqlx::query(include_str!("queries/list_threads.sql"));

                let threads = query
                    .bind(limit)
                    .bind(offset)
                    .try_map(|row: PgRow| thread_from_row(&row))
                    .fetch_all(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(threads)
            }
            .boxed()
        }

        fn count_threads(&self) -> BoxFuture<Result<i64, BackendError>> {
            count(&self.pool, include_str!("queries/count_threads.sql")).boxed()
        }

        fn update_thread(
            &self,
            id: &Uuid,
            fields: ThreadFields,
        ) -> BoxFuture<Result<Thread, BackendError>> {
            let id = *id;

            async move {
                let query = sqlx::query(include_str!("queries/update_thread.sql"));

                let thread = query
                    .bind(id)
                    .bind(&fields.color)
                    .bind(&fields.gauge)
                    .try_map(|row: PgRow| thread_from_row(&row))
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                thread.ok_or(BackendError::NonExistentId(id))
            }
            .boxed()
        }

        fn delete_thread(&self, id: &Uuid) -> BoxFuture<Result<(), BackendError>> {
            delete(
                &self.pool,
                include_str!("queries/delete_thread.sql"),
                *id,
            )
            .boxed()
        }

        fn insert_staple(&self, fields: StapleFields) -> BoxFuture<Result<Staple, BackendError>> {
            async move {
                let query = sqlx::query(include_str!("queries/create_staple.sql"));

                let staple = query
                    .bind(fields.material.as_str())
                    .bind(fields.shape.as_str())
                    .bind(&fields.manufacturer)
                    .bind(fields.length_mm)
                    .bind(fields.quantity)
                    .try_map(|row: PgRow| staple_from_row(&row))
                    .fetch_one(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(staple)
            }
            .boxed()
        }

        fn retrieve_staple(&self, id: &Uuid) -> BoxFuture<Result<Option<Staple>, BackendError>> {
            let id = *id;

            async move {
                let query = sqlx::query(include_str!("queries/retrieve_staple.sql"));

                let staple = query
                    .bind(id)
                    .try_map(|row: PgRow| staple_from_row(&row))
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(staple)
            }
            .boxed()
        }

        fn list_staples(
            &self,
            limit: i64,
            offset: i64,
        ) -> BoxFuture<Result<Vec<Staple>, BackendError>> {
            async move {
                let query = sqlx::query(include_str!("queries/list_staples.sql"));

                let staples = query
                    .bind(limit)
                    .bind(offset)
                    .try_map(|row: PgRow| staple_from_row(&row))
                    .fetch_all(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(staples)
            }
            .boxed()
        }

        fn count_staples(&self) -> BoxFuture<Result<i64, BackendError>> {
            count(&self.pool, include_str!("queries/count_staples.sql")).boxed()
        }

        fn update_staple(
            &self,
            id: &Uuid,
            fields: StapleFields,
        ) -> BoxFuture<Result<Staple, BackendError>> {
            let id = *id;

            async move {
                let query = sqlx::query(include_str!("queries/update_staple.sql"));

                let staple = query
                    .bind(id)
                    .bind(fields.material.as_str())
                    .bind(fields.shape.as_str())
                    .bind(&fields.manufacturer)
                    .bind(fields.length_mm)
                    .bind(fields.quantity)
                    .try_map(|row: PgRow| staple_from_row(&row))
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                staple.ok_or(BackendError::NonExistentId(id))
            }
            .boxed()
        }

        fn delete_staple(&self, id: &Uuid) -> BoxFuture<Result<(), BackendError>> {
            delete(
                &self.pool,
                include_str!("queries/delete_staple.sql"),
                *id,
            )
            .boxed()
        }

        fn status_counts(&self) -> BoxFuture<Result<Vec<(ReedStatus, i64)>, BackendError>> {
            async move {
                let query = sqlx::query(include_str!("queries/status_counts.sql"));

                let counts = query
                    .try_map(|row: PgRow| {
                        let status: String = try_get(&row, "status")?;
                        let count: i64 = try_get(&row, "count")?;

                        Ok((decode_status(status)?, count))
                    })
                    .fetch_all(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(counts)
            }
            .boxed()
        }

        fn all_snapshots(&self) -> BoxFuture<Result<Vec<QualitySnapshot>, BackendError>> {
            async move {
                let query = sqlx::query(include_str!("queries/all_snapshots.sql"));

                let snapshots = query
                    .try_map(|row: PgRow| snapshot_from_row(&row))
                    .fetch_all(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(snapshots)
            }
            .boxed()
        }

        fn total_play_time(&self) -> BoxFuture<Result<Option<i64>, BackendError>> {
            async move {
                let query = sqlx::query_as(include_str!("queries/total_play_time.sql"));

                let (total,): (Option<i64>,) = query
                    .fetch_one(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(total)
            }
            .boxed()
        }
    }

    /// Moves a reed's play-time counter by a signed delta, atomically
    /// and inside the caller's transaction.
    async fn apply_play_time(
        tx: &mut Transaction<'_, Postgres>,
        reed_id: &Uuid,
        delta: i64,
    ) -> Result<(), BackendError> {
        let updated = sqlx::query(include_str!("queries/apply_play_time.sql"))
            .bind(*reed_id)
            .bind(delta)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?
            .rows_affected();

        if updated == 0 {
            Err(BackendError::UnknownReed)
        } else {
            Ok(())
        }
    }

    async fn count(pool: &PgPool, sql: &'static str) -> Result<i64, BackendError> {
        let (count,): (i64,) = sqlx::query_as(sql)
            .fetch_one(pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(count)
    }

    async fn delete(pool: &PgPool, sql: &'static str, id: Uuid) -> Result<(), BackendError> {
        let count = sqlx::query(sql)
            .bind(id)
            .execute(pool)
            .await
            .map_err(map_sqlx_error)?
            .rows_affected();

        if count == 0 {
            Err(BackendError::NonExistentId(id))
        } else {
            Ok(())
        }
    }

    fn reed_from_row(row: &PgRow) -> Result<Reed, sqlx::Error> {
        let status: String = try_get(row, "status")?;

        Ok(Reed {
            id: try_get(row, "id")?,
            name: try_get(row, "name")?,
            created_date: try_get::<OffsetDateTime>(row, "created_date")?,
            status: decode_status(status)?,
            cane_source: try_get(row, "cane_source")?,
            shape: try_get(row, "shape")?,
            gouge_thickness: try_get(row, "gouge_thickness")?,
            notes: try_get(row, "notes")?,
            total_play_time_minutes: try_get(row, "total_play_time_minutes")?,
            thread_id: try_get(row, "thread_id")?,
            staple_id: try_get(row, "staple_id")?,
            usage_sessions: vec![],
            quality_snapshots: vec![],
            modifications: vec![],
        })
    }

    fn reed_summary_from_row(row: &PgRow) -> Result<ReedSummary, sqlx::Error> {
        let status: String = try_get(row, "status")?;

        Ok(ReedSummary {
            id: try_get(row, "id")?,
            name: try_get(row, "name")?,
            created_date: try_get::<OffsetDateTime>(row, "created_date")?,
            status: decode_status(status)?,
            cane_source: try_get(row, "cane_source")?,
            shape: try_get(row, "shape")?,
            gouge_thickness: try_get(row, "gouge_thickness")?,
            total_play_time_minutes: try_get(row, "total_play_time_minutes")?,
        })
    }

    fn session_from_row(row: &PgRow) -> Result<UsageSession, sqlx::Error> {
        Ok(UsageSession {
            id: try_get(row, "id")?,
            reed_id: try_get(row, "reed_id")?,
            start_time: try_get::<OffsetDateTime>(row, "start_time")?,
            end_time: try_get(row, "end_time")?,
            duration_minutes: try_get(row, "duration_minutes")?,
            context: try_get(row, "context")?,
            notes: try_get(row, "notes")?,
        })
    }

    fn snapshot_from_row(row: &PgRow) -> Result<QualitySnapshot, sqlx::Error> {
        Ok(QualitySnapshot {
            id: try_get(row, "id")?,
            reed_id: try_get(row, "reed_id")?,
            timestamp: try_get::<OffsetDateTime>(row, "timestamp")?,
            tone_quality: try_get(row, "tone_quality")?,
            response: try_get(row, "response")?,
            intonation: try_get(row, "intonation")?,
            stability: try_get(row, "stability")?,
            ease_of_playing: try_get(row, "ease_of_playing")?,
            overall_rating: try_get(row, "overall_rating")?,
            notes: try_get(row, "notes")?,
        })
    }

    fn modification_from_row(row: &PgRow) -> Result<Modification, sqlx::Error> {
        let modification_type: String = try_get(row, "modification_type")?;

        Ok(Modification {
            id: try_get(row, "id")?,
            reed_id: try_get(row, "reed_id")?,
            timestamp: try_get::<OffsetDateTime>(row, "timestamp")?,
            modification_type: ModificationType::parse(&modification_type).ok_or_else(|| {
                sqlx::Error::Decode(
                    format!("unrecognized modification type {:?}", modification_type).into(),
                )
            })?,
            description: try_get(row, "description")?,
            goal: try_get(row, "goal")?,
            success_rating: try_get(row, "success_rating")?,
        })
    }

    fn thread_from_row(row: &PgRow) -> Result<Thread, sqlx::Error> {
        Ok(Thread {
            id: try_get(row, "id")?,
            color: try_get(row, "color")?,
            gauge: try_get(row, "gauge")?,
        })
    }

    fn staple_from_row(row: &PgRow) -> Result<Staple, sqlx::Error> {
        let material: String = try_get(row, "material")?;
        let shape: String = try_get(row, "shape")?;

        Ok(Staple {
            id: try_get(row, "id")?,
            material: StapleMaterial::parse(&material).ok_or_else(|| {
                sqlx::Error::Decode(format!("unrecognized staple material {:?}", material).into())
            })?,
            shape: StapleShape::parse(&shape).ok_or_else(|| {
                sqlx::Error::Decode(format!("unrecognized staple shape {:?}", shape).into())
            })?,
            manufacturer: try_get(row, "manufacturer")?,
            length_mm: try_get(row, "length_mm")?,
            quantity: try_get(row, "quantity")?,
        })
    }

    fn decode_status(value: String) -> Result<ReedStatus, sqlx::Error> {
        ReedStatus::parse(&value).ok_or_else(|| {
            sqlx::Error::Decode(format!("unrecognized reed status {:?}", value).into())
        })
    }

    fn try_get<'a, T: sqlx::Type<sqlx::Postgres> + sqlx::decode::Decode<'a, sqlx::Postgres>>(
        row: &'a PgRow,
        column: &str,
    ) -> Result<T, sqlx::Error> {
        use sqlx::prelude::*;

        row.try_get(column)
    }

    fn map_sqlx_error(error: sqlx::Error) -> BackendError {
        use sqlx::Error;

        match error {
            Error::Database(ref e) if e.constraint() == Some(REEDS_THREAD_CONSTRAINT) => {
                BackendError::StillReferenced { entity: "thread" }
            }
            Error::Database(ref e) if e.constraint() == Some(REEDS_STAPLE_CONSTRAINT) => {
                BackendError::StillReferenced { entity: "staple" }
            }
            Error::Database(ref e)
                if e.constraint()
                    .map(|c| REED_CHILD_CONSTRAINTS.contains(&c))
                    .unwrap_or(false) =>
            {
                BackendError::UnknownReed
            }
            _ => BackendError::Sqlx { source: error },
        }
    }

    /// The hardware foreign keys fire from both directions. On a reed
    /// write the violation means the referenced thread or staple does
    /// not exist, not that something still points at it.
    fn map_reed_write_error(error: sqlx::Error) -> BackendError {
        use sqlx::Error;

        match error {
            Error::Database(ref e) if e.constraint() == Some(REEDS_THREAD_CONSTRAINT) => {
                BackendError::validation("thread_id", "unknown thread")
            }
            Error::Database(ref e) if e.constraint() == Some(REEDS_STAPLE_CONSTRAINT) => {
                BackendError::validation("staple_id", "unknown staple")
            }
            _ => map_sqlx_error(error),
        }
    }

}
