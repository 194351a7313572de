use std::sync::Arc;

use log::{error, Logger};
use warp::filters::body::BodyDeserializeError;
use warp::http::StatusCode;
use warp::reject;
use warp::reply::{json, with_status, Json, WithStatus};

use crate::errors::BackendError;

pub mod admin;
mod handlers;
mod query;
mod rejection;
mod response;

pub use internal::*;

/// The maximum request body size to accept. Every payload is a small
/// JSON document, so this is generous.
const MAX_CONTENT_LENGTH: u64 = 1024 * 1024;

pub async fn format_rejection(
    logger: Arc<Logger>,
    rej: reject::Rejection,
) -> Result<WithStatus<Json>, reject::Rejection> {
    if let Some(r) = rej.find::<rejection::Rejection>() {
        let e = &r.error;
        error!(logger, "Backend error"; "context" => ?r.context, "error" => ?r.error, "status" => %status_code_for(e), "message" => %r.error);
        let flattened = r.flatten();

        return Ok(with_status(json(&flattened), status_code_for(e)));
    }

    if let Some(e) = rej.find::<BodyDeserializeError>() {
        return Ok(with_status(
            json(&serde_json::json!({ "message": format!("{}", e) })),
            StatusCode::BAD_REQUEST,
        ));
    }

    Err(rej)
}

fn status_code_for(e: &BackendError) -> StatusCode {
    use BackendError::*;

    match e {
        InvalidId(..) | UnknownReed | Validation { .. } => StatusCode::BAD_REQUEST,
        NonExistentId(..) => StatusCode::NOT_FOUND,
        StillReferenced { .. } => StatusCode::CONFLICT,
        Sqlx { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

mod internal {
    use serde::de::DeserializeOwned;
    use warp::filters::BoxedFilter;
    use warp::path::end;
    use warp::Filter;
    use warp::Reply;
    use warp::{delete, get as g, patch, path as p, path::param as par, post, put, query};

    use super::{handlers, query as q, MAX_CONTENT_LENGTH};
    use crate::environment::Environment;
    use crate::hardware::{StapleFields, StaplePatch, ThreadFields, ThreadPatch};
    use crate::modification::{ModificationFields, ModificationPatch};
    use crate::quality::{SnapshotFields, SnapshotPatch};
    use crate::reed::{NewReed, ReedPatch};
    use crate::session::{NewUsageSession, UsageSessionPatch};

    type Route = BoxedFilter<(Box<dyn Reply>,)>;

    fn body<T: DeserializeOwned + Send>(
    ) -> impl Filter<Extract = (T,), Error = warp::Rejection> + Clone {
        warp::body::content_length_limit(MAX_CONTENT_LENGTH).and(warp::body::json())
    }

    macro_rules! route_filter {
    ($route_variable:ident; $first:expr) => (let $route_variable = $route_variable.and($first););
    ($route_variable:ident; $first:expr, $($rest:expr),+) => (
        let $route_variable = $route_variable.and($first);
        route_filter!($route_variable; $($rest),+);
    )
}

    macro_rules! route {
    ($name:ident => $handler:ident, $route_variable:ident; $($filters:expr),+) => (
        pub fn $name(environment: Environment) -> Route {
            let prefix = environment.urls.api_path.clone();

            let $route_variable = warp::any()
                .map(move || environment.clone())
                .and(p(prefix));

            route_filter!($route_variable; $($filters),+);

            $route_variable.and_then(handlers::$handler)
                .boxed()
        }
    );
}

    route!(make_reeds_list_route => list_reeds, rt; p("reeds"), query::<q::Pagination>(), end(), g());
    route!(make_reed_create_route => create_reed, rt; p("reeds"), end(), post(), body::<NewReed>());
    route!(make_summary_route => summary, rt; p!("reeds" / "summary"), end(), g());
    route!(make_analytics_route => reed_analytics, rt; p!("reeds" / String / "analytics"), end(), g());
    route!(make_reed_retrieve_route => retrieve_reed, rt; p("reeds"), par::<String>(), end(), g());
    route!(make_reed_update_route => update_reed, rt; p("reeds"), par::<String>(), end(), put(), body::<NewReed>());
    route!(make_reed_patch_route => patch_reed, rt; p("reeds"), par::<String>(), end(), patch(), body::<ReedPatch>());
    route!(make_reed_delete_route => delete_reed, rt; p("reeds"), par::<String>(), end(), delete());

    route!(make_sessions_list_route => list_sessions, rt; p("usage-sessions"), query::<q::SessionListQuery>(), end(), g());
    route!(make_session_create_route => create_session, rt; p("usage-sessions"), end(), post(), body::<NewUsageSession>());
    route!(make_session_retrieve_route => retrieve_session, rt; p("usage-sessions"), par::<String>(), end(), g());
    route!(make_session_update_route => update_session, rt; p("usage-sessions"), par::<String>(), end(), put(), body::<NewUsageSession>());
    route!(make_session_patch_route => patch_session, rt; p("usage-sessions"), par::<String>(), end(), patch(), body::<UsageSessionPatch>());
    route!(make_session_delete_route => delete_session, rt; p("usage-sessions"), par::<String>(), end(), delete());

    route!(make_snapshots_list_route => list_snapshots, rt; p("quality-snapshots"), query::<q::SnapshotListQuery>(), end(), g());
    route!(make_snapshot_create_route => create_snapshot, rt; p("quality-snapshots"), end(), post(), body::<SnapshotFields>());
    route!(make_snapshot_retrieve_route => retrieve_snapshot, rt; p("quality-snapshots"), par::<String>(), end(), g());
    route!(make_snapshot_update_route => update_snapshot, rt; p("quality-snapshots"), par::<String>(), end(), put(), body::<SnapshotFields>());
    route!(make_snapshot_patch_route => patch_snapshot, rt; p("quality-snapshots"), par::<String>(), end(), patch(), body::<SnapshotPatch>());
    route!(make_snapshot_delete_route => delete_snapshot, rt; p("quality-snapshots"), par::<String>(), end(), delete());

    route!(make_modifications_list_route => list_modifications, rt; p("modifications"), query::<q::ModificationListQuery>(), end(), g());
    route!(make_modification_create_route => create_modification, rt; p("modifications"), end(), post(), body::<ModificationFields>());
    route!(make_modification_retrieve_route => retrieve_modification, rt; p("modifications"), par::<String>(), end(), g());
    route!(make_modification_update_route => update_modification, rt; p("modifications"), par::<String>(), end(), put(), body::<ModificationFields>());
    route!(make_modification_patch_route => patch_modification, rt; p("modifications"), par::<String>(), end(), patch(), body::<ModificationPatch>());
    route!(make_modification_delete_route => delete_modification, rt; p("modifications"), par::<String>(), end(), delete());

    route!(make_threads_list_route => list_threads, rt; p("threads"), query::<q::Pagination>(), end(), g());
    route!(make_thread_create_route => create_thread, rt; p("threads"), end(), post(), body::<ThreadFields>());
    route!(make_thread_retrieve_route => retrieve_thread, rt; p("threads"), par::<String>(), end(), g());
    route!(make_thread_update_route => update_thread, rt; p("threads"), par::<String>(), end(), put(), body::<ThreadFields>());
    route!(make_thread_patch_route => patch_thread, rt; p("threads"), par::<String>(), end(), patch(), body::<ThreadPatch>());
    route!(make_thread_delete_route => delete_thread, rt; p("threads"), par::<String>(), end(), delete());

    route!(make_staples_list_route => list_staples, rt; p("staples"), query::<q::Pagination>(), end(), g());
    route!(make_staple_create_route => create_staple, rt; p("staples"), end(), post(), body::<StapleFields>());
    route!(make_staple_bulk_create_route => bulk_create_staples, rt; p!("staples" / "bulk_create"), end(), post(), body::<StapleFields>());
    route!(make_staple_retrieve_route => retrieve_staple, rt; p("staples"), par::<String>(), end(), g());
    route!(make_staple_update_route => update_staple, rt; p("staples"), par::<String>(), end(), put(), body::<StapleFields>());
    route!(make_staple_patch_route => patch_staple, rt; p("staples"), par::<String>(), end(), patch(), body::<StaplePatch>());
    route!(make_staple_delete_route => delete_staple, rt; p("staples"), par::<String>(), end(), delete());

    /// Every API route under the configured prefix. Fixed paths come
    /// before their parameterized siblings.
    pub fn make_api(environment: Environment) -> Route {
        let routes = make_summary_route(environment.clone())
            .or(make_analytics_route(environment.clone()))
            .unify()
            .or(make_reeds_list_route(environment.clone()))
            .unify()
            .or(make_reed_create_route(environment.clone()))
            .unify()
            .or(make_reed_retrieve_route(environment.clone()))
            .unify()
            .or(make_reed_update_route(environment.clone()))
            .unify()
            .or(make_reed_patch_route(environment.clone()))
            .unify()
            .or(make_reed_delete_route(environment.clone()))
            .unify()
            .or(make_sessions_list_route(environment.clone()))
            .unify()
            .or(make_session_create_route(environment.clone()))
            .unify()
            .or(make_session_retrieve_route(environment.clone()))
            .unify()
            .or(make_session_update_route(environment.clone()))
            .unify()
            .or(make_session_patch_route(environment.clone()))
            .unify()
            .or(make_session_delete_route(environment.clone()))
            .unify()
            .or(make_snapshots_list_route(environment.clone()))
            .unify()
            .or(make_snapshot_create_route(environment.clone()))
            .unify()
            .or(make_snapshot_retrieve_route(environment.clone()))
            .unify()
            .or(make_snapshot_update_route(environment.clone()))
            .unify()
            .or(make_snapshot_patch_route(environment.clone()))
            .unify()
            .or(make_snapshot_delete_route(environment.clone()))
            .unify()
            .or(make_modifications_list_route(environment.clone()))
            .unify()
            .or(make_modification_create_route(environment.clone()))
            .unify()
            .or(make_modification_retrieve_route(environment.clone()))
            .unify()
            .or(make_modification_update_route(environment.clone()))
            .unify()
            .or(make_modification_patch_route(environment.clone()))
            .unify()
            .or(make_modification_delete_route(environment.clone()))
            .unify()
            .or(make_threads_list_route(environment.clone()))
            .unify()
            .or(make_thread_create_route(environment.clone()))
            .unify()
            .or(make_thread_retrieve_route(environment.clone()))
            .unify()
            .or(make_thread_update_route(environment.clone()))
            .unify()
            .or(make_thread_patch_route(environment.clone()))
            .unify()
            .or(make_thread_delete_route(environment.clone()))
            .unify()
            .or(make_staples_list_route(environment.clone()))
            .unify()
            .or(make_staple_bulk_create_route(environment.clone()))
            .unify()
            .or(make_staple_create_route(environment.clone()))
            .unify()
            .or(make_staple_retrieve_route(environment.clone()))
            .unify()
            .or(make_staple_update_route(environment.clone()))
            .unify()
            .or(make_staple_patch_route(environment.clone()))
            .unify()
            .or(make_staple_delete_route(environment))
            .unify();

        routes.boxed()
    }
}
