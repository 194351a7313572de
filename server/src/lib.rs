#![recursion_limit = "256"]

pub mod analytics;
pub mod config;
pub mod db;
pub mod environment;
pub mod errors;
pub mod hardware;
pub mod ledger;
pub mod modification;
pub mod normalization;
pub mod quality;
pub mod reed;
pub mod routes;
pub mod session;
pub mod timestamps;
pub mod urls;
