use std::sync::Mutex;

use slog::Drain;
use slog::Fuse;
use slog_async::Async;
use slog_json::Json;

pub use slog::{debug, error, info, o, trace, warn, Logger};

/// Creates the root JSON logger writing to stderr. With the
/// `env_logging` feature enabled, also installs a `slog-scope` global
/// logger filtered through `RUST_LOG`.
pub fn initialize_logger() -> slog::Logger {
    let drain = Mutex::new(Json::default(std::io::stderr())).map(Fuse);

    #[cfg(feature = "env_logging")]
    let drain = slog_envlogger::new(drain);

    let drain = Async::new(drain).build().fuse();

    let logger = Logger::root(
        drain,
        o!("version" => info::VERSION, "revision" => info::REVISION, "build_timestamp" => info::BUILD_TIMESTAMP),
    );

    #[cfg(feature = "env_logging")]
    {
        let guard = slog_scope::set_global_logger(logger.clone());
        guard.cancel_reset();
    }

    logger
}
