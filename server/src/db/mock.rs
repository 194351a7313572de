//! An in-memory [`Db`](super::Db) used by the handler tests. It mirrors
//! the live store's semantics where the handlers can observe them:
//! cascading reed deletes, protected thread and staple deletes, and the
//! play-time counter moving with every session write.

use std::collections::HashMap;
use std::sync::Mutex;

use futures::future::{self, BoxFuture, FutureExt};
use time::OffsetDateTime;
use uuid::Uuid;

use super::Db;
use crate::errors::BackendError;
use crate::hardware::{Staple, StapleFields, Thread, ThreadFields};
use crate::ledger;
use crate::modification::{Modification, ModificationFields, ModificationFilter};
use crate::quality::{QualitySnapshot, SnapshotFields, SnapshotFilter};
use crate::reed::{Reed, ReedFields, ReedStatus, ReedSummary};
use crate::session::{SessionFields, SessionFilter, UsageSession};

#[derive(Default)]
struct State {
    reeds: HashMap<Uuid, Reed>,
    sessions: HashMap<Uuid, UsageSession>,
    snapshots: HashMap<Uuid, QualitySnapshot>,
    modifications: HashMap<Uuid, Modification>,
    threads: HashMap<Uuid, Thread>,
    staples: HashMap<Uuid, Staple>,
}

#[derive(Default)]
pub struct MockDb {
    state: Mutex<State>,
}

impl MockDb {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<T>(&self, f: impl FnOnce(&mut State) -> Result<T, BackendError>) -> Result<T, BackendError> {
        let mut state = self.state.lock().unwrap();
        f(&mut state)
    }
}

fn ready<T: Send + 'static>(result: Result<T, BackendError>) -> BoxFuture<'static, Result<T, BackendError>> {
    future::ready(result).boxed()
}

fn page<T: Clone>(mut rows: Vec<T>, limit: i64, offset: i64) -> Vec<T> {
    let mut rows: Vec<T> = rows.drain(..).skip(offset as usize).collect();
    rows.truncate(limit as usize);
    rows
}

fn session_matches(session: &UsageSession, filter: &SessionFilter) -> bool {
    filter.reed_id.map_or(true, |id| session.reed_id == id)
        && filter
            .context
            .as_ref()
            .map_or(true, |context| &session.context == context)
}

fn modification_matches(modification: &Modification, filter: &ModificationFilter) -> bool {
    filter.reed_id.map_or(true, |id| modification.reed_id == id)
        && filter
            .modification_type
            .map_or(true, |t| modification.modification_type == t)
}

impl Db for MockDb {
    fn insert_reed(&self, fields: ReedFields) -> BoxFuture<Result<Reed, BackendError>> {
        ready(self.with(|state| {
            let reed = Reed {
                id: Uuid::new_v4(),
                name: fields.name,
                created_date: fields
                    .created_date
                    .unwrap_or_else(OffsetDateTime::now_utc),
                status: fields.status,
                cane_source: fields.cane_source,
                shape: fields.shape,
                gouge_thickness: fields.gouge_thickness,
                notes: fields.notes,
                total_play_time_minutes: 0,
                thread_id: fields.thread_id,
                staple_id: fields.staple_id,
                usage_sessions: vec![],
                quality_snapshots: vec![],
                modifications: vec![],
            };

            state.reeds.insert(reed.id, reed.clone());
            Ok(reed)
        }))
    }

    fn retrieve_reed(&self, id: &Uuid) -> BoxFuture<Result<Option<Reed>, BackendError>> {
        let id = *id;

        ready(self.with(|state| {
            let mut reed = match state.reeds.get(&id) {
                Some(reed) => reed.clone(),
                None => return Ok(None),
            };

            reed.usage_sessions = state
                .sessions
                .values()
                .filter(|s| s.reed_id == id)
                .cloned()
                .collect();
            reed.usage_sessions
                .sort_by(|a, b| b.start_time.cmp(&a.start_time).then(a.id.cmp(&b.id)));

            reed.quality_snapshots = state
                .snapshots
                .values()
                .filter(|s| s.reed_id == id)
                .cloned()
                .collect();
            reed.quality_snapshots
                .sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(a.id.cmp(&b.id)));

            reed.modifications = state
                .modifications
                .values()
                .filter(|m| m.reed_id == id)
                .cloned()
                .collect();
            reed.modifications
                .sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(a.id.cmp(&b.id)));

            Ok(Some(reed))
        }))
    }

    fn list_reeds(
        &self,
        limit: i64,
        offset: i64,
    ) -> BoxFuture<Result<Vec<ReedSummary>, BackendError>> {
        ready(self.with(|state| {
            let mut reeds: Vec<Reed> = state.reeds.values().cloned().collect();
            reeds.sort_by(|a, b| b.created_date.cmp(&a.created_date).then(a.id.cmp(&b.id)));

            let summaries = reeds
                .into_iter()
                .map(|r| ReedSummary {
                    id: r.id,
                    name: r.name,
                    created_date: r.created_date,
                    status: r.status,
                    cane_source: r.cane_source,
                    shape: r.shape,
                    gouge_thickness: r.gouge_thickness,
                    total_play_time_minutes: r.total_play_time_minutes,
                })
                .collect();

            Ok(page(summaries, limit, offset))
        }))
    }

    fn count_reeds(&self) -> BoxFuture<Result<i64, BackendError>> {
        ready(self.with(|state| Ok(state.reeds.len() as i64)))
    }

    fn update_reed(&self, id: &Uuid, fields: ReedFields) -> BoxFuture<Result<(), BackendError>> {
        let id = *id;

        ready(self.with(|state| {
            let reed = state
                .reeds
                .get_mut(&id)
                .ok_or(BackendError::NonExistentId(id))?;

            reed.name = fields.name;
            if let Some(created_date) = fields.created_date {
                reed.created_date = created_date;
            }
            reed.status = fields.status;
            reed.cane_source = fields.cane_source;
            reed.shape = fields.shape;
            reed.gouge_thickness = fields.gouge_thickness;
            reed.notes = fields.notes;
            reed.thread_id = fields.thread_id;
            reed.staple_id = fields.staple_id;

            Ok(())
        }))
    }

    fn delete_reed(&self, id: &Uuid) -> BoxFuture<Result<(), BackendError>> {
        let id = *id;

        ready(self.with(|state| {
            state
                .reeds
                .remove(&id)
                .ok_or(BackendError::NonExistentId(id))?;

            state.sessions.retain(|_, s| s.reed_id != id);
            state.snapshots.retain(|_, s| s.reed_id != id);
            state.modifications.retain(|_, m| m.reed_id != id);

            Ok(())
        }))
    }

    fn insert_session(
        &self,
        fields: SessionFields,
    ) -> BoxFuture<Result<UsageSession, BackendError>> {
        ready(self.with(|state| {
            if !state.reeds.contains_key(&fields.reed_id) {
                return Err(BackendError::UnknownReed);
            }

            let session = UsageSession {
                id: Uuid::new_v4(),
                reed_id: fields.reed_id,
                start_time: fields.start_time,
                end_time: fields.end_time,
                duration_minutes: fields.duration_minutes,
                context: fields.context,
                notes: fields.notes,
            };

            if let Some(duration) = session.duration_minutes {
                let reed = state.reeds.get_mut(&session.reed_id).unwrap();
                reed.total_play_time_minutes += duration;
            }

            state.sessions.insert(session.id, session.clone());
            Ok(session)
        }))
    }

    fn retrieve_session(
        &self,
        id: &Uuid,
    ) -> BoxFuture<Result<Option<UsageSession>, BackendError>> {
        let id = *id;

        ready(self.with(|state| Ok(state.sessions.get(&id).cloned())))
    }

    fn list_sessions(
        &self,
        filter: SessionFilter,
        limit: i64,
        offset: i64,
    ) -> BoxFuture<Result<Vec<UsageSession>, BackendError>> {
        ready(self.with(|state| {
            let mut sessions: Vec<UsageSession> = state
                .sessions
                .values()
                .filter(|s| session_matches(s, &filter))
                .cloned()
                .collect();
            sessions.sort_by(|a, b| b.start_time.cmp(&a.start_time).then(a.id.cmp(&b.id)));

            Ok(page(sessions, limit, offset))
        }))
    }

    fn count_sessions(&self, filter: SessionFilter) -> BoxFuture<Result<i64, BackendError>> {
        ready(self.with(|state| {
            Ok(state
                .sessions
                .values()
                .filter(|s| session_matches(s, &filter))
                .count() as i64)
        }))
    }

    fn update_session(
        &self,
        id: &Uuid,
        fields: SessionFields,
    ) -> BoxFuture<Result<UsageSession, BackendError>> {
        let id = *id;

        ready(self.with(|state| {
            let old = state
                .sessions
                .get(&id)
                .cloned()
                .ok_or(BackendError::NonExistentId(id))?;

            if !state.reeds.contains_key(&fields.reed_id) {
                return Err(BackendError::UnknownReed);
            }

            let session = UsageSession {
                id,
                reed_id: fields.reed_id,
                start_time: fields.start_time,
                end_time: fields.end_time,
                duration_minutes: fields.duration_minutes,
                context: fields.context,
                notes: fields.notes,
            };

            if old.reed_id == session.reed_id {
                let delta = ledger::play_time_delta(old.duration_minutes, session.duration_minutes);
                let reed = state.reeds.get_mut(&session.reed_id).unwrap();
                reed.total_play_time_minutes += delta;
            } else {
                if let Some(duration) = old.duration_minutes {
                    if let Some(reed) = state.reeds.get_mut(&old.reed_id) {
                        reed.total_play_time_minutes -= duration;
                    }
                }

                if let Some(duration) = session.duration_minutes {
                    let reed = state.reeds.get_mut(&session.reed_id).unwrap();
                    reed.total_play_time_minutes += duration;
                }
            }

            state.sessions.insert(id, session.clone());
            Ok(session)
        }))
    }

    fn delete_session(&self, id: &Uuid) -> BoxFuture<Result<(), BackendError>> {
        let id = *id;

        ready(self.with(|state| {
            let session = state
                .sessions
                .remove(&id)
                .ok_or(BackendError::NonExistentId(id))?;

            if let Some(duration) = session.duration_minutes {
                if let Some(reed) = state.reeds.get_mut(&session.reed_id) {
                    reed.total_play_time_minutes -= duration;
                }
            }

            Ok(())
        }))
    }

    fn insert_snapshot(
        &self,
        fields: SnapshotFields,
    ) -> BoxFuture<Result<QualitySnapshot, BackendError>> {
        ready(self.with(|state| {
            if !state.reeds.contains_key(&fields.reed_id) {
                return Err(BackendError::UnknownReed);
            }

            let snapshot = QualitySnapshot {
                id: Uuid::new_v4(),
                reed_id: fields.reed_id,
                timestamp: fields.timestamp.unwrap_or_else(OffsetDateTime::now_utc),
                tone_quality: fields.tone_quality,
                response: fields.response,
                intonation: fields.intonation,
                stability: fields.stability,
                ease_of_playing: fields.ease_of_playing,
                overall_rating: fields.overall_rating,
                notes: fields.notes,
            };

            state.snapshots.insert(snapshot.id, snapshot.clone());
            Ok(snapshot)
        }))
    }

    fn retrieve_snapshot(
        &self,
        id: &Uuid,
    ) -> BoxFuture<Result<Option<QualitySnapshot>, BackendError>> {
        let id = *id;

        ready(self.with(|state| Ok(state.snapshots.get(&id).cloned())))
    }

    fn list_snapshots(
        &self,
        filter: SnapshotFilter,
        limit: i64,
        offset: i64,
    ) -> BoxFuture<Result<Vec<QualitySnapshot>, BackendError>> {
        ready(self.with(|state| {
            let mut snapshots: Vec<QualitySnapshot> = state
                .snapshots
                .values()
                .filter(|s| filter.reed_id.map_or(true, |id| s.reed_id == id))
                .cloned()
                .collect();
            snapshots.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(a.id.cmp(&b.id)));

            Ok(page(snapshots, limit, offset))
        }))
    }

    fn count_snapshots(&self, filter: SnapshotFilter) -> BoxFuture<Result<i64, BackendError>> {
        ready(self.with(|state| {
            Ok(state
                .snapshots
                .values()
                .filter(|s| filter.reed_id.map_or(true, |id| s.reed_id == id))
                .count() as i64)
        }))
    }

    fn update_snapshot(
        &self,
        id: &Uuid,
        fields: SnapshotFields,
    ) -> BoxFuture<Result<QualitySnapshot, BackendError>> {
        let id = *id;

        ready(self.with(|state| {
            let current = state
                .snapshots
                .get(&id)
                .cloned()
                .ok_or(BackendError::NonExistentId(id))?;

            if !state.reeds.contains_key(&fields.reed_id) {
                return Err(BackendError::UnknownReed);
            }

            let snapshot = QualitySnapshot {
                id,
                reed_id: fields.reed_id,
                timestamp: fields.timestamp.unwrap_or(current.timestamp),
                tone_quality: fields.tone_quality,
                response: fields.response,
                intonation: fields.intonation,
                stability: fields.stability,
                ease_of_playing: fields.ease_of_playing,
                overall_rating: fields.overall_rating,
                notes: fields.notes,
            };

            state.snapshots.insert(id, snapshot.clone());
            Ok(snapshot)
        }))
    }

    fn delete_snapshot(&self, id: &Uuid) -> BoxFuture<Result<(), BackendError>> {
        let id = *id;

        ready(self.with(|state| {
            state
                .snapshots
                .remove(&id)
                .map(|_| ())
                .ok_or(BackendError::NonExistentId(id))
        }))
    }

    fn insert_modification(
        &self,
        fields: ModificationFields,
    ) -> BoxFuture<Result<Modification, BackendError>> {
        ready(self.with(|state| {
            if !state.reeds.contains_key(&fields.reed_id) {
                return Err(BackendError::UnknownReed);
            }

            let modification = Modification {
                id: Uuid::new_v4(),
                reed_id: fields.reed_id,
                timestamp: fields.timestamp.unwrap_or_else(OffsetDateTime::now_utc),
                modification_type: fields.modification_type,
                description: fields.description,
                goal: fields.goal,
                success_rating: fields.success_rating,
            };

            state
                .modifications
                .insert(modification.id, modification.clone());
            Ok(modification)
        }))
    }

    fn retrieve_modification(
        &self,
        id: &Uuid,
    ) -> BoxFuture<Result<Option<Modification>, BackendError>> {
        let id = *id;

        ready(self.with(|state| Ok(state.modifications.get(&id).cloned())))
    }

    fn list_modifications(
        &self,
        filter: ModificationFilter,
        limit: i64,
        offset: i64,
    ) -> BoxFuture<Result<Vec<Modification>, BackendError>> {
        ready(self.with(|state| {
            let mut modifications: Vec<Modification> = state
                .modifications
                .values()
                .filter(|m| modification_matches(m, &filter))
                .cloned()
                .collect();
            modifications.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(a.id.cmp(&b.id)));

            Ok(page(modifications, limit, offset))
        }))
    }

    fn count_modifications(
        &self,
        filter: ModificationFilter,
    ) -> BoxFuture<Result<i64, BackendError>> {
        ready(self.with(|state| {
            Ok(state
                .modifications
                .values()
                .filter(|m| modification_matches(m, &filter))
                .count() as i64)
        }))
    }

    fn update_modification(
        &self,
        id: &Uuid,
        fields: ModificationFields,
    ) -> BoxFuture<Result<Modification, BackendError>> {
        let id = *id;

        ready(self.with(|state| {
            let current = state
                .modifications
                .get(&id)
                .cloned()
                .ok_or(BackendError::NonExistentId(id))?;

            if !state.reeds.contains_key(&fields.reed_id) {
                return Err(BackendError::UnknownReed);
            }

            let modification = Modification {
                id,
                reed_id: fields.reed_id,
                timestamp: fields.timestamp.unwrap_or(current.timestamp),
                modification_type: fields.modification_type,
                description: fields.description,
                goal: fields.goal,
                success_rating: fields.success_rating,
            };

            state.modifications.insert(id, modification.clone());
            Ok(modification)
        }))
    }

    fn delete_modification(&self, id: &Uuid) -> BoxFuture<Result<(), BackendError>> {
        let id = *id;

        ready(self.with(|state| {
            state
                .modifications
                .remove(&id)
                .map(|_| ())
                .ok_or(BackendError::NonExistentId(id))
        }))
    }

    fn insert_thread(&self, fields: ThreadFields) -> BoxFuture<Result<Thread, BackendError>> {
        ready(self.with(|state| {
            let thread = Thread {
                id: Uuid::new_v4(),
                color: fields.color,
                gauge: fields.gauge,
            };

            state.threads.insert(thread.id, thread.clone());
            Ok(thread)
        }))
    }

    fn retrieve_thread(&self, id: &Uuid) -> BoxFuture<Result<Option<Thread>, BackendError>> {
        let id = *id;

        ready(self.with(|state| Ok(state.threads.get(&id).cloned())))
    }

    fn list_threads(
        &self,
        limit: i64,
        offset: i64,
    ) -> BoxFuture<Result<Vec<Thread>, BackendError>> {
        ready(self.with(|state| {
            let mut threads: Vec<Thread> = state.threads.values().cloned().collect();
            threads.sort_by(|a, b| a.color.cmp(&b.color).then(a.id.cmp(&b.id)));

            Ok(page(threads, limit, offset))
        }))
    }

    fn count_threads(&self) -> BoxFuture<Result<i64, BackendError>> {
        ready(self.with(|state| Ok(state.threads.len() as i64)))
    }

    fn update_thread(
        &self,
        id: &Uuid,
        fields: ThreadFields,
    ) -> BoxFuture<Result<Thread, BackendError>> {
        let id = *id;

        ready(self.with(|state| {
            let thread = state
                .threads
                .get_mut(&id)
                .ok_or(BackendError::NonExistentId(id))?;

            thread.color = fields.color;
            thread.gauge = fields.gauge;

            Ok(thread.clone())
        }))
    }

    fn delete_thread(&self, id: &Uuid) -> BoxFuture<Result<(), BackendError>> {
        let id = *id;

        ready(self.with(|state| {
            if !state.threads.contains_key(&id) {
                return Err(BackendError::NonExistentId(id));
            }

            if state.reeds.values().any(|r| r.thread_id == Some(id)) {
                return Err(BackendError::StillReferenced { entity: "thread" });
            }

            state.threads.remove(&id);
            Ok(())
        }))
    }

    fn insert_staple(&self, fields: StapleFields) -> BoxFuture<Result<Staple, BackendError>> {
        ready(self.with(|state| {
            let staple = Staple {
                id: Uuid::new_v4(),
                material: fields.material,
                shape: fields.shape,
                manufacturer: fields.manufacturer,
                length_mm: fields.length_mm,
                quantity: fields.quantity,
            };

            state.staples.insert(staple.id, staple.clone());
            Ok(staple)
        }))
    }

    fn retrieve_staple(&self, id: &Uuid) -> BoxFuture<Result<Option<Staple>, BackendError>> {
        let id = *id;

        ready(self.with(|state| Ok(state.staples.get(&id).cloned())))
    }

    fn list_staples(
        &self,
        limit: i64,
        offset: i64,
    ) -> BoxFuture<Result<Vec<Staple>, BackendError>> {
        ready(self.with(|state| {
            let mut staples: Vec<Staple> = state.staples.values().cloned().collect();
            staples.sort_by(|a, b| a.id.cmp(&b.id));

            Ok(page(staples, limit, offset))
        }))
    }

    fn count_staples(&self) -> BoxFuture<Result<i64, BackendError>> {
        ready(self.with(|state| Ok(state.staples.len() as i64)))
    }

    fn update_staple(
        &self,
        id: &Uuid,
        fields: StapleFields,
    ) -> BoxFuture<Result<Staple, BackendError>> {
        let id = *id;

        ready(self.with(|state| {
            let staple = state
                .staples
                .get_mut(&id)
                .ok_or(BackendError::NonExistentId(id))?;

            staple.material = fields.material;
            staple.shape = fields.shape;
            staple.manufacturer = fields.manufacturer;
            staple.length_mm = fields.length_mm;
            staple.quantity = fields.quantity;

            Ok(staple.clone())
        }))
    }

    fn delete_staple(&self, id: &Uuid) -> BoxFuture<Result<(), BackendError>> {
        let id = *id;

        ready(self.with(|state| {
            if !state.staples.contains_key(&id) {
                return Err(BackendError::NonExistentId(id));
            }

            if state.reeds.values().any(|r| r.staple_id == Some(id)) {
                return Err(BackendError::StillReferenced { entity: "staple" });
            }

            state.staples.remove(&id);
            Ok(())
        }))
    }

    fn status_counts(&self) -> BoxFuture<Result<Vec<(ReedStatus, i64)>, BackendError>> {
        ready(self.with(|state| {
            let mut counts: HashMap<ReedStatus, i64> = HashMap::new();
            for reed in state.reeds.values() {
                *counts.entry(reed.status).or_insert(0) += 1;
            }

            Ok(counts.into_iter().collect())
        }))
    }

    fn all_snapshots(&self) -> BoxFuture<Result<Vec<QualitySnapshot>, BackendError>> {
        ready(self.with(|state| {
            let mut snapshots: Vec<QualitySnapshot> = state.snapshots.values().cloned().collect();
            snapshots.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(a.id.cmp(&b.id)));

            Ok(snapshots)
        }))
    }

    fn total_play_time(&self) -> BoxFuture<Result<Option<i64>, BackendError>> {
        ready(self.with(|state| {
            if state.reeds.is_empty() {
                return Ok(None);
            }

            Ok(Some(
                state
                    .reeds
                    .values()
                    .map(|r| r.total_play_time_minutes)
                    .sum(),
            ))
        }))
    }
}
