use serde::Serialize;
use warp::reject;

use crate::errors::BackendError;

#[derive(Debug)]
pub struct Rejection {
    pub(crate) context: Context,
    pub(crate) error: BackendError,
}

impl Rejection {
    pub fn new(context: Context, error: BackendError) -> Self {
        Rejection { context, error }
    }

    pub fn flatten(&self) -> FlattenedRejection {
        FlattenedRejection {
            context: self.context.clone(),
            message: format!("{}", self.error),
        }
    }
}

impl reject::Reject for Rejection {}

#[derive(Debug, Serialize)]
pub struct FlattenedRejection {
    #[serde(flatten)]
    pub(crate) context: Context,
    pub(crate) message: String,
}

/// Which operation failed, echoed back in the error body.
#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum Context {
    List { collection: &'static str },
    Create { collection: &'static str },
    Retrieve { collection: &'static str, id: String },
    Update { collection: &'static str, id: String },
    Delete { collection: &'static str, id: String },
    Analytics { id: String },
    Summary {},
    BulkCreate {},
}

impl Context {
    pub fn list(collection: &'static str) -> Context {
        Context::List { collection }
    }

    pub fn create(collection: &'static str) -> Context {
        Context::Create { collection }
    }

    pub fn retrieve(collection: &'static str, id: String) -> Context {
        Context::Retrieve { collection, id }
    }

    pub fn update(collection: &'static str, id: String) -> Context {
        Context::Update { collection, id }
    }

    pub fn delete(collection: &'static str, id: String) -> Context {
        Context::Delete { collection, id }
    }

    pub fn analytics(id: String) -> Context {
        Context::Analytics { id }
    }

    pub fn summary() -> Context {
        Context::Summary {}
    }

    pub fn bulk_create() -> Context {
        Context::BulkCreate {}
    }
}
