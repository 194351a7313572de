use std::sync::Arc;

use log::Logger;

use crate::db::Db;
use crate::urls::Urls;

/// Everything a request handler needs, cheaply cloneable.
#[derive(Clone)]
pub struct Environment {
    pub logger: Arc<Logger>,
    pub db: Arc<dyn Db + Send + Sync>,
    pub urls: Arc<Urls>,
    pub config: Config,
}

impl Environment {
    pub fn new(
        logger: Arc<Logger>,
        db: Arc<dyn Db + Send + Sync>,
        urls: Arc<Urls>,
        config: Config,
    ) -> Self {
        Self {
            logger,
            db,
            urls,
            config,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Rows per page when the client does not ask for a count.
    pub(crate) page_size: u32,

    /// Upper bound on client-requested page sizes.
    pub(crate) max_page_size: u32,
}

impl Config {
    pub fn new(page_size: u32, max_page_size: u32) -> Self {
        Self {
            page_size,
            max_page_size,
        }
    }
}
