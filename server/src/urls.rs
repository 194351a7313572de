use url::Url;
use uuid::Uuid;

/// Convenience wrapper for URL generation functions.
#[derive(Clone)]
pub struct Urls {
    /// Top-level URL, including trailing slash.
    base: Url,

    /// Path prefix for all API routes.
    pub(crate) api_path: String,

    /// Prefix for all API routes, with trailing slash.
    api_prefix: String,
}

impl Urls {
    /// Create a new instance. `api_prefix` should *not* include a trailing slash.
    pub fn new(base: impl AsRef<str>, api_prefix: impl Into<String>) -> Self {
        let base =
            Url::parse(base.as_ref()).unwrap_or_else(|_| panic!("parse {} as URL", base.as_ref()));
        let api_path = api_prefix.into();
        let api_prefix = format!("{}/", api_path);

        Urls {
            base,
            api_path,
            api_prefix,
        }
    }

    pub fn collection(&self, name: &str) -> Url {
        self.base
            .join(&self.api_prefix)
            .and_then(|u| u.join(&format!("{}/", name)))
            .unwrap_or_else(|_| panic!("get URL for collection {}", name))
    }

    pub fn entity(&self, collection: &str, id: &Uuid) -> Url {
        let id = format!("{}", id);
        self.collection(collection)
            .join(&id)
            .unwrap_or_else(|_| panic!("get URL for {} {}", collection, id))
    }
}
