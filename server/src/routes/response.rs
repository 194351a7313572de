use serde::Serialize;

/// The envelope returned by every list endpoint.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub count: i64,
    pub results: Vec<T>,
}

#[derive(Debug, Serialize)]
pub struct Healthz<'a> {
    pub revision: Option<&'a str>,
    pub timestamp: Option<&'a str>,
    pub version: &'a str,
}
