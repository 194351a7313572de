use std::time::{Duration, Instant};

use log::debug;
use time::OffsetDateTime;
use uuid::Uuid;
use warp::{
    http::StatusCode,
    reject,
    reply::{json, with_header, with_status, Reply},
};

use crate::analytics;
use crate::environment::Environment;
use crate::errors::BackendError;
use crate::hardware::{self, StapleFields, StaplePatch, ThreadFields, ThreadPatch};
use crate::modification::{ModificationFields, ModificationPatch};
use crate::quality::{SnapshotFields, SnapshotPatch};
use crate::reed::{NewReed, ReedFields, ReedPatch};
use crate::routes::{
    query::{ModificationListQuery, Pagination, SessionListQuery, SnapshotListQuery},
    rejection::{Context, Rejection},
    response::Page,
};
use crate::session::{NewUsageSession, UsageSessionPatch};

const SERVER_TIMING_HEADER: &str = "server-timing";
type RouteResult = Result<Box<dyn Reply>, reject::Rejection>;

macro_rules! timed {
    ($($expression:stmt);+) => {
        let start = Instant::now();

        // TODO when `try` blocks are stabilized, we can wrap the body
        // and return the headers even on errors
        let result = { $($expression)+ };

        Ok(Box::new(with_header(
            result,
            SERVER_TIMING_HEADER,
            format_server_timing(start.elapsed()),
        )) as Box<dyn Reply>)
    };
}

// reeds

pub async fn list_reeds(environment: Environment, query: Pagination) -> RouteResult {
    timed! {
        let error_handler = |e: BackendError| Rejection::new(Context::list("reeds"), e);

        let (limit, offset) = query.limits(&environment.config);
        let count = environment.db.count_reeds().await.map_err(error_handler)?;
        let results = environment
            .db
            .list_reeds(limit, offset)
            .await
            .map_err(error_handler)?;

        json(&Page { count, results })
    }
}

pub async fn create_reed(environment: Environment, reed: NewReed) -> RouteResult {
    timed! {
        let error_handler = |e: BackendError| Rejection::new(Context::create("reeds"), e);

        reed.validate().map_err(error_handler)?;
        debug!(environment.logger, "Creating reed...");

        let fields = resolve_reed_fields(&environment, reed)
            .await
            .map_err(error_handler)?;
        let reed = environment
            .db
            .insert_reed(fields)
            .await
            .map_err(error_handler)?;

        with_header(
            with_status(json(&reed), StatusCode::CREATED),
            "location",
            environment.urls.entity("reeds", &reed.id).as_str(),
        )
    }
}

pub async fn retrieve_reed(environment: Environment, id: String) -> RouteResult {
    timed! {
        let error_handler = |e: BackendError| Rejection::new(Context::retrieve("reeds", id.clone()), e);

        let id = parse_id(&id).map_err(error_handler)?;
        debug!(environment.logger, "Retrieving reed..."; "id" => format!("{}", &id));

        let reed = environment
            .db
            .retrieve_reed(&id)
            .await
            .map_err(error_handler)?
            .ok_or(BackendError::NonExistentId(id))
            .map_err(error_handler)?;

        json(&reed)
    }
}

pub async fn update_reed(environment: Environment, id: String, reed: NewReed) -> RouteResult {
    timed! {
        let error_handler = |e: BackendError| Rejection::new(Context::update("reeds", id.clone()), e);

        let id = parse_id(&id).map_err(error_handler)?;
        reed.validate().map_err(error_handler)?;

        let current = environment
            .db
            .retrieve_reed(&id)
            .await
            .map_err(error_handler)?
            .ok_or(BackendError::NonExistentId(id))
            .map_err(error_handler)?;

        // the name and creation date are only synthesized once
        let mut reed = reed;
        reed.name = reed.name.take().or_else(|| Some(current.name.clone()));
        reed.created_date = reed.created_date.take().or(Some(current.created_date));

        let fields = resolve_reed_fields(&environment, reed)
            .await
            .map_err(error_handler)?;
        environment
            .db
            .update_reed(&id, fields)
            .await
            .map_err(error_handler)?;

        let reed = environment
            .db
            .retrieve_reed(&id)
            .await
            .map_err(error_handler)?
            .ok_or(BackendError::NonExistentId(id))
            .map_err(error_handler)?;

        json(&reed)
    }
}

pub async fn patch_reed(environment: Environment, id: String, patch: ReedPatch) -> RouteResult {
    timed! {
        let error_handler = |e: BackendError| Rejection::new(Context::update("reeds", id.clone()), e);

        let id = parse_id(&id).map_err(error_handler)?;
        patch.validate().map_err(error_handler)?;

        let current = environment
            .db
            .retrieve_reed(&id)
            .await
            .map_err(error_handler)?
            .ok_or(BackendError::NonExistentId(id))
            .map_err(error_handler)?;

        let thread_id = patch.thread_id;
        let staple_id = patch.staple_id;
        let fields = patch.apply(&current);

        ensure_components(&environment, thread_id, staple_id)
            .await
            .map_err(error_handler)?;

        environment
            .db
            .update_reed(&id, fields)
            .await
            .map_err(error_handler)?;

        let reed = environment
            .db
            .retrieve_reed(&id)
            .await
            .map_err(error_handler)?
            .ok_or(BackendError::NonExistentId(id))
            .map_err(error_handler)?;

        json(&reed)
    }
}

pub async fn delete_reed(environment: Environment, id: String) -> RouteResult {
    timed! {
        let error_handler = |e: BackendError| Rejection::new(Context::delete("reeds", id.clone()), e);

        let id = parse_id(&id).map_err(error_handler)?;
        debug!(environment.logger, "Deleting reed..."; "id" => format!("{}", &id));

        environment
            .db
            .delete_reed(&id)
            .await
            .map_err(error_handler)?;

        StatusCode::NO_CONTENT
    }
}

pub async fn reed_analytics(environment: Environment, id: String) -> RouteResult {
    timed! {
        let error_handler = |e: BackendError| Rejection::new(Context::analytics(id.clone()), e);

        let id = parse_id(&id).map_err(error_handler)?;

        let reed = environment
            .db
            .retrieve_reed(&id)
            .await
            .map_err(error_handler)?
            .ok_or(BackendError::NonExistentId(id))
            .map_err(error_handler)?;

        json(&analytics::reed_analytics(&reed, OffsetDateTime::now_utc()))
    }
}

pub async fn summary(environment: Environment) -> RouteResult {
    timed! {
        let error_handler = |e: BackendError| Rejection::new(Context::summary(), e);

        let total_reeds = environment.db.count_reeds().await.map_err(error_handler)?;
        let status_counts = environment
            .db
            .status_counts()
            .await
            .map_err(error_handler)?;
        let snapshots = environment
            .db
            .all_snapshots()
            .await
            .map_err(error_handler)?;
        let total_play_time = environment
            .db
            .total_play_time()
            .await
            .map_err(error_handler)?;

        json(&analytics::summary(
            total_reeds,
            &status_counts,
            &snapshots,
            total_play_time,
        ))
    }
}

// usage sessions

pub async fn list_sessions(environment: Environment, query: SessionListQuery) -> RouteResult {
    timed! {
        let error_handler = |e: BackendError| Rejection::new(Context::list("usage-sessions"), e);

        let (limit, offset) = query.limits(&environment.config);
        let count = environment
            .db
            .count_sessions(query.filter())
            .await
            .map_err(error_handler)?;
        let results = environment
            .db
            .list_sessions(query.filter(), limit, offset)
            .await
            .map_err(error_handler)?;

        json(&Page { count, results })
    }
}

pub async fn create_session(environment: Environment, session: NewUsageSession) -> RouteResult {
    timed! {
        let error_handler = |e: BackendError| Rejection::new(Context::create("usage-sessions"), e);

        let fields = session
            .into_fields(OffsetDateTime::now_utc())
            .map_err(error_handler)?;
        debug!(environment.logger, "Creating usage session..."; "reed_id" => format!("{}", fields.reed_id));

        let session = environment
            .db
            .insert_session(fields)
            .await
            .map_err(error_handler)?;

        with_header(
            with_status(json(&session), StatusCode::CREATED),
            "location",
            environment
                .urls
                .entity("usage-sessions", &session.id)
                .as_str(),
        )
    }
}

pub async fn retrieve_session(environment: Environment, id: String) -> RouteResult {
    timed! {
        let error_handler =
            |e: BackendError| Rejection::new(Context::retrieve("usage-sessions", id.clone()), e);

        let id = parse_id(&id).map_err(error_handler)?;

        let session = environment
            .db
            .retrieve_session(&id)
            .await
            .map_err(error_handler)?
            .ok_or(BackendError::NonExistentId(id))
            .map_err(error_handler)?;

        json(&session)
    }
}

pub async fn update_session(
    environment: Environment,
    id: String,
    session: NewUsageSession,
) -> RouteResult {
    timed! {
        let error_handler =
            |e: BackendError| Rejection::new(Context::update("usage-sessions", id.clone()), e);

        let id = parse_id(&id).map_err(error_handler)?;
        let fields = session
            .into_fields(OffsetDateTime::now_utc())
            .map_err(error_handler)?;

        let session = environment
            .db
            .update_session(&id, fields)
            .await
            .map_err(error_handler)?;

        json(&session)
    }
}

pub async fn patch_session(
    environment: Environment,
    id: String,
    patch: UsageSessionPatch,
) -> RouteResult {
    timed! {
        let error_handler =
            |e: BackendError| Rejection::new(Context::update("usage-sessions", id.clone()), e);

        let id = parse_id(&id).map_err(error_handler)?;

        let current = environment
            .db
            .retrieve_session(&id)
            .await
            .map_err(error_handler)?
            .ok_or(BackendError::NonExistentId(id))
            .map_err(error_handler)?;

        let fields = patch.apply(&current).map_err(error_handler)?;
        let session = environment
            .db
            .update_session(&id, fields)
            .await
            .map_err(error_handler)?;

        json(&session)
    }
}

pub async fn delete_session(environment: Environment, id: String) -> RouteResult {
    timed! {
        let error_handler =
            |e: BackendError| Rejection::new(Context::delete("usage-sessions", id.clone()), e);

        let id = parse_id(&id).map_err(error_handler)?;
        debug!(environment.logger, "Deleting usage session..."; "id" => format!("{}", &id));

        environment
            .db
            .delete_session(&id)
            .await
            .map_err(error_handler)?;

        StatusCode::NO_CONTENT
    }
}

// quality snapshots

pub async fn list_snapshots(environment: Environment, query: SnapshotListQuery) -> RouteResult {
    timed! {
        let error_handler = |e: BackendError| Rejection::new(Context::list("quality-snapshots"), e);

        let (limit, offset) = query.limits(&environment.config);
        let count = environment
            .db
            .count_snapshots(query.filter())
            .await
            .map_err(error_handler)?;
        let results = environment
            .db
            .list_snapshots(query.filter(), limit, offset)
            .await
            .map_err(error_handler)?;

        json(&Page { count, results })
    }
}

pub async fn create_snapshot(environment: Environment, fields: SnapshotFields) -> RouteResult {
    timed! {
        let error_handler =
            |e: BackendError| Rejection::new(Context::create("quality-snapshots"), e);

        fields.validate().map_err(error_handler)?;

        let snapshot = environment
            .db
            .insert_snapshot(fields)
            .await
            .map_err(error_handler)?;

        with_header(
            with_status(json(&snapshot), StatusCode::CREATED),
            "location",
            environment
                .urls
                .entity("quality-snapshots", &snapshot.id)
                .as_str(),
        )
    }
}

pub async fn retrieve_snapshot(environment: Environment, id: String) -> RouteResult {
    timed! {
        let error_handler =
            |e: BackendError| Rejection::new(Context::retrieve("quality-snapshots", id.clone()), e);

        let id = parse_id(&id).map_err(error_handler)?;

        let snapshot = environment
            .db
            .retrieve_snapshot(&id)
            .await
            .map_err(error_handler)?
            .ok_or(BackendError::NonExistentId(id))
            .map_err(error_handler)?;

        json(&snapshot)
    }
}

pub async fn update_snapshot(
    environment: Environment,
    id: String,
    fields: SnapshotFields,
) -> RouteResult {
    timed! {
        let error_handler =
            |e: BackendError| Rejection::new(Context::update("quality-snapshots", id.clone()), e);

        let id = parse_id(&id).map_err(error_handler)?;
        fields.validate().map_err(error_handler)?;

        let snapshot = environment
            .db
            .update_snapshot(&id, fields)
            .await
            .map_err(error_handler)?;

        json(&snapshot)
    }
}

pub async fn patch_snapshot(
    environment: Environment,
    id: String,
    patch: SnapshotPatch,
) -> RouteResult {
    timed! {
        let error_handler =
            |e: BackendError| Rejection::new(Context::update("quality-snapshots", id.clone()), e);

        let id = parse_id(&id).map_err(error_handler)?;

        let current = environment
            .db
            .retrieve_snapshot(&id)
            .await
            .map_err(error_handler)?
            .ok_or(BackendError::NonExistentId(id))
            .map_err(error_handler)?;

        let fields = patch.apply(&current);
        fields.validate().map_err(error_handler)?;

        let snapshot = environment
            .db
            .update_snapshot(&id, fields)
            .await
            .map_err(error_handler)?;

        json(&snapshot)
    }
}

pub async fn delete_snapshot(environment: Environment, id: String) -> RouteResult {
    timed! {
        let error_handler =
            |e: BackendError| Rejection::new(Context::delete("quality-snapshots", id.clone()), e);

        let id = parse_id(&id).map_err(error_handler)?;

        environment
            .db
            .delete_snapshot(&id)
            .await
            .map_err(error_handler)?;

        StatusCode::NO_CONTENT
    }
}

// modifications

pub async fn list_modifications(
    environment: Environment,
    query: ModificationListQuery,
) -> RouteResult {
    timed! {
        let error_handler = |e: BackendError| Rejection::new(Context::list("modifications"), e);

        let (limit, offset) = query.limits(&environment.config);
        let count = environment
            .db
            .count_modifications(query.filter())
            .await
            .map_err(error_handler)?;
        let results = environment
            .db
            .list_modifications(query.filter(), limit, offset)
            .await
            .map_err(error_handler)?;

        json(&Page { count, results })
    }
}

pub async fn create_modification(
    environment: Environment,
    fields: ModificationFields,
) -> RouteResult {
    timed! {
        let error_handler = |e: BackendError| Rejection::new(Context::create("modifications"), e);

        fields.validate().map_err(error_handler)?;

        let modification = environment
            .db
            .insert_modification(fields)
            .await
            .map_err(error_handler)?;

        with_header(
            with_status(json(&modification), StatusCode::CREATED),
            "location",
            environment
                .urls
                .entity("modifications", &modification.id)
                .as_str(),
        )
    }
}

pub async fn retrieve_modification(environment: Environment, id: String) -> RouteResult {
    timed! {
        let error_handler =
            |e: BackendError| Rejection::new(Context::retrieve("modifications", id.clone()), e);

        let id = parse_id(&id).map_err(error_handler)?;

        let modification = environment
            .db
            .retrieve_modification(&id)
            .await
            .map_err(error_handler)?
            .ok_or(BackendError::NonExistentId(id))
            .map_err(error_handler)?;

        json(&modification)
    }
}

pub async fn update_modification(
    environment: Environment,
    id: String,
    fields: ModificationFields,
) -> RouteResult {
    timed! {
        let error_handler =
            |e: BackendError| Rejection::new(Context::update("modifications", id.clone()), e);

        let id = parse_id(&id).map_err(error_handler)?;
        fields.validate().map_err(error_handler)?;

        let modification = environment
            .db
            .update_modification(&id, fields)
            .await
            .map_err(error_handler)?;

        json(&modification)
    }
}

pub async fn patch_modification(
    environment: Environment,
    id: String,
    patch: ModificationPatch,
) -> RouteResult {
    timed! {
        let error_handler =
            |e: BackendError| Rejection::new(Context::update("modifications", id.clone()), e);

        let id = parse_id(&id).map_err(error_handler)?;

        let current = environment
            .db
            .retrieve_modification(&id)
            .await
            .map_err(error_handler)?
            .ok_or(BackendError::NonExistentId(id))
            .map_err(error_handler)?;

        let fields = patch.apply(&current);
        fields.validate().map_err(error_handler)?;

        let modification = environment
            .db
            .update_modification(&id, fields)
            .await
            .map_err(error_handler)?;

        json(&modification)
    }
}

pub async fn delete_modification(environment: Environment, id: String) -> RouteResult {
    timed! {
        let error_handler =
            |e: BackendError| Rejection::new(Context::delete("modifications", id.clone()), e);

        let id = parse_id(&id).map_err(error_handler)?;

        environment
            .db
            .delete_modification(&id)
            .await
            .map_err(error_handler)?;

        StatusCode::NO_CONTENT
    }
}

// threads

pub async fn list_threads(environment: Environment, query: Pagination) -> RouteResult {
    timed! {
        let error_handler = |e: BackendError| Rejection::new(Context::list("threads"), e);

        let (limit, offset) = query.limits(&environment.config);
        let count = environment.db.count_threads().await.map_err(error_handler)?;
        let results = environment
            .db
            .list_threads(limit, offset)
            .await
            .map_err(error_handler)?;

        json(&Page { count, results })
    }
}

pub async fn create_thread(environment: Environment, fields: ThreadFields) -> RouteResult {
    timed! {
        let error_handler = |e: BackendError| Rejection::new(Context::create("threads"), e);

        fields.validate().map_err(error_handler)?;

        let thread = environment
            .db
            .insert_thread(fields)
            .await
            .map_err(error_handler)?;

        with_header(
            with_status(json(&thread), StatusCode::CREATED),
            "location",
            environment.urls.entity("threads", &thread.id).as_str(),
        )
    }
}

pub async fn retrieve_thread(environment: Environment, id: String) -> RouteResult {
    timed! {
        let error_handler =
            |e: BackendError| Rejection::new(Context::retrieve("threads", id.clone()), e);

        let id = parse_id(&id).map_err(error_handler)?;

        let thread = environment
            .db
            .retrieve_thread(&id)
            .await
            .map_err(error_handler)?
            .ok_or(BackendError::NonExistentId(id))
            .map_err(error_handler)?;

        json(&thread)
    }
}

pub async fn update_thread(
    environment: Environment,
    id: String,
    fields: ThreadFields,
) -> RouteResult {
    timed! {
        let error_handler =
            |e: BackendError| Rejection::new(Context::update("threads", id.clone()), e);

        let id = parse_id(&id).map_err(error_handler)?;
        fields.validate().map_err(error_handler)?;

        let thread = environment
            .db
            .update_thread(&id, fields)
            .await
            .map_err(error_handler)?;

        json(&thread)
    }
}

pub async fn patch_thread(environment: Environment, id: String, patch: ThreadPatch) -> RouteResult {
    timed! {
        let error_handler =
            |e: BackendError| Rejection::new(Context::update("threads", id.clone()), e);

        let id = parse_id(&id).map_err(error_handler)?;

        let current = environment
            .db
            .retrieve_thread(&id)
            .await
            .map_err(error_handler)?
            .ok_or(BackendError::NonExistentId(id))
            .map_err(error_handler)?;

        let fields = patch.apply(&current);
        fields.validate().map_err(error_handler)?;

        let thread = environment
            .db
            .update_thread(&id, fields)
            .await
            .map_err(error_handler)?;

        json(&thread)
    }
}

pub async fn delete_thread(environment: Environment, id: String) -> RouteResult {
    timed! {
        let error_handler =
            |e: BackendError| Rejection::new(Context::delete("threads", id.clone()), e);

        let id = parse_id(&id).map_err(error_handler)?;
        debug!(environment.logger, "Deleting thread..."; "id" => format!("{}", &id));

        environment
            .db
            .delete_thread(&id)
            .await
            .map_err(error_handler)?;

        StatusCode::NO_CONTENT
    }
}

// staples

pub async fn list_staples(environment: Environment, query: Pagination) -> RouteResult {
    timed! {
        let error_handler = |e: BackendError| Rejection::new(Context::list("staples"), e);

        let (limit, offset) = query.limits(&environment.config);
        let count = environment.db.count_staples().await.map_err(error_handler)?;
        let results = environment
            .db
            .list_staples(limit, offset)
            .await
            .map_err(error_handler)?;

        json(&Page { count, results })
    }
}

pub async fn create_staple(environment: Environment, fields: StapleFields) -> RouteResult {
    timed! {
        let error_handler = |e: BackendError| Rejection::new(Context::create("staples"), e);

        fields.validate().map_err(error_handler)?;

        let staple = environment
            .db
            .insert_staple(fields)
            .await
            .map_err(error_handler)?;

        with_header(
            with_status(json(&staple), StatusCode::CREATED),
            "location",
            environment.urls.entity("staples", &staple.id).as_str(),
        )
    }
}

/// Stores one staple row whose `quantity` carries the batch size.
pub async fn bulk_create_staples(environment: Environment, fields: StapleFields) -> RouteResult {
    timed! {
        let error_handler = |e: BackendError| Rejection::new(Context::bulk_create(), e);

        fields.validate().map_err(error_handler)?;
        debug!(environment.logger, "Bulk-creating staples..."; "quantity" => fields.quantity);

        let staple = environment
            .db
            .insert_staple(fields)
            .await
            .map_err(error_handler)?;

        with_header(
            with_status(json(&staple), StatusCode::CREATED),
            "location",
            environment.urls.entity("staples", &staple.id).as_str(),
        )
    }
}

pub async fn retrieve_staple(environment: Environment, id: String) -> RouteResult {
    timed! {
        let error_handler =
            |e: BackendError| Rejection::new(Context::retrieve("staples", id.clone()), e);

        let id = parse_id(&id).map_err(error_handler)?;

        let staple = environment
            .db
            .retrieve_staple(&id)
            .await
            .map_err(error_handler)?
            .ok_or(BackendError::NonExistentId(id))
            .map_err(error_handler)?;

        json(&staple)
    }
}

pub async fn update_staple(
    environment: Environment,
    id: String,
    fields: StapleFields,
) -> RouteResult {
    timed! {
        let error_handler =
            |e: BackendError| Rejection::new(Context::update("staples", id.clone()), e);

        let id = parse_id(&id).map_err(error_handler)?;
        fields.validate().map_err(error_handler)?;

        let staple = environment
            .db
            .update_staple(&id, fields)
            .await
            .map_err(error_handler)?;

        json(&staple)
    }
}

pub async fn patch_staple(environment: Environment, id: String, patch: StaplePatch) -> RouteResult {
    timed! {
        let error_handler =
            |e: BackendError| Rejection::new(Context::update("staples", id.clone()), e);

        let id = parse_id(&id).map_err(error_handler)?;

        let current = environment
            .db
            .retrieve_staple(&id)
            .await
            .map_err(error_handler)?
            .ok_or(BackendError::NonExistentId(id))
            .map_err(error_handler)?;

        let fields = patch.apply(&current);
        fields.validate().map_err(error_handler)?;

        let staple = environment
            .db
            .update_staple(&id, fields)
            .await
            .map_err(error_handler)?;

        json(&staple)
    }
}

pub async fn delete_staple(environment: Environment, id: String) -> RouteResult {
    timed! {
        let error_handler =
            |e: BackendError| Rejection::new(Context::delete("staples", id.clone()), e);

        let id = parse_id(&id).map_err(error_handler)?;
        debug!(environment.logger, "Deleting staple..."; "id" => format!("{}", &id));

        environment
            .db
            .delete_staple(&id)
            .await
            .map_err(error_handler)?;

        StatusCode::NO_CONTENT
    }
}

fn parse_id(id: &str) -> Result<Uuid, BackendError> {
    Uuid::parse_str(id).map_err(|_| BackendError::InvalidId(id.to_owned()))
}

/// Checks component references and settles on a name, synthesizing one
/// from the components when none was given.
async fn resolve_reed_fields(
    environment: &Environment,
    reed: NewReed,
) -> Result<ReedFields, BackendError> {
    let thread = match reed.thread_id {
        Some(id) => Some(
            environment
                .db
                .retrieve_thread(&id)
                .await?
                .ok_or_else(|| {
                    BackendError::validation("thread_id", format!("unknown thread {}", id))
                })?,
        ),
        None => None,
    };

    let staple = match reed.staple_id {
        Some(id) => Some(
            environment
                .db
                .retrieve_staple(&id)
                .await?
                .ok_or_else(|| {
                    BackendError::validation("staple_id", format!("unknown staple {}", id))
                })?,
        ),
        None => None,
    };

    let name = match reed.name {
        Some(name) => name,
        None => match (&thread, &staple) {
            (Some(thread), Some(staple)) => hardware::derived_name(thread, staple),
            _ => {
                return Err(BackendError::validation(
                    "name",
                    "a name is required unless both thread and staple are given",
                ))
            }
        },
    };

    Ok(ReedFields {
        name,
        created_date: reed.created_date,
        status: reed.status,
        cane_source: reed.cane_source,
        shape: reed.shape,
        gouge_thickness: reed.gouge_thickness,
        notes: reed.notes,
        thread_id: reed.thread_id,
        staple_id: reed.staple_id,
    })
}

/// Checks that any component a patch points at actually exists.
async fn ensure_components(
    environment: &Environment,
    thread_id: Option<Uuid>,
    staple_id: Option<Uuid>,
) -> Result<(), BackendError> {
    if let Some(id) = thread_id {
        environment
            .db
            .retrieve_thread(&id)
            .await?
            .ok_or_else(|| {
                BackendError::validation("thread_id", format!("unknown thread {}", id))
            })?;
    }

    if let Some(id) = staple_id {
        environment
            .db
            .retrieve_staple(&id)
            .await?
            .ok_or_else(|| {
                BackendError::validation("staple_id", format!("unknown staple {}", id))
            })?;
    }

    Ok(())
}

fn format_server_timing(seconds: Duration) -> String {
    format!("handler;dur={}", seconds.as_secs_f64() * 1000.0)
}
