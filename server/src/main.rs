use std::error::Error;
use std::sync::Arc;

use warp::Filter;

use futures::future::FutureExt;
use log::{info, initialize_logger};
use reedlog::config::get_variable;
use reedlog::db::PgDb;
use reedlog::environment::{Config, Environment};
use reedlog::routes;
use reedlog::urls::Urls;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();

    let logger = initialize_logger();

    let main_port: u16 = get_variable("BACKEND_PORT")
        .parse()
        .expect("parse BACKEND_PORT as u16");
    let admin_port: u16 = get_variable("BACKEND_ADMIN_PORT")
        .parse()
        .expect("parse BACKEND_ADMIN_PORT as u16");

    info!(logger, "Starting..."; "main_port" => main_port, "admin_port" => admin_port);
    let logger = Arc::new(logger);

    info!(logger, "Creating database pool...");
    let connection_string = get_variable("BACKEND_DB_CONNECTION_STRING");
    let pool = sqlx::Pool::connect(&connection_string)
        .await
        .expect("create database pool from BACKEND_DB_CONNECTION_STRING");
    let db = Arc::new(PgDb::new(pool));

    let urls = Arc::new(Urls::new(
        get_variable("BACKEND_BASE_URL"),
        get_variable("BACKEND_API_PATH"),
    ));

    let config = Config::new(
        get_variable("BACKEND_PAGE_SIZE")
            .parse()
            .expect("parse BACKEND_PAGE_SIZE as u32"),
        get_variable("BACKEND_MAX_PAGE_SIZE")
            .parse()
            .expect("parse BACKEND_MAX_PAGE_SIZE as u32"),
    );
    let environment = Environment::new(logger.clone(), db, urls, config);

    let (termination_sender, mut termination_receiver) = mpsc::channel::<()>(1);

    let terminate = Arc::new(move || {
        let termination_sender = termination_sender.clone();

        async move {
            let termination_sender = termination_sender.clone();
            termination_sender.send(()).await.unwrap();
        }
        .boxed()
    });

    let should_terminate = async move {
        termination_receiver.recv().await;
    }
    .shared();

    let ctrlc = {
        let should_terminate = should_terminate.clone();
        let terminate = terminate.clone();

        let signal = tokio::signal::ctrl_c();

        async move {
            let terminate = terminate.clone();

            tokio::select! {
                _ = should_terminate => {},
                _ = signal => {
                    terminate();
                }
            }
        }
    };

    let main_server = {
        let should_terminate = should_terminate.clone();

        let logger2 = logger.clone();

        let routes = routes::make_api(environment.clone())
            .recover(move |r| routes::format_rejection(logger2.clone(), r));

        let (_, main_server) =
            warp::serve(routes).bind_with_graceful_shutdown(([0, 0, 0, 0], main_port), async {
                should_terminate.await;
            });

        main_server
    };

    let admin_server = {
        let should_terminate = should_terminate.clone();
        let terminate = terminate.clone();

        let routes = routes::admin::make_healthz_route(environment.clone()).or(
            routes::admin::make_termination_route(environment.clone(), terminate),
        );

        let (_, admin_server) =
            warp::serve(routes).bind_with_graceful_shutdown(([0, 0, 0, 0], admin_port), async {
                should_terminate.await;
            });

        admin_server
    };

    tokio::join!(ctrlc, main_server, admin_server);

    info!(logger, "Exiting gracefully...");

    Ok(())
}
