use serde::Deserialize;
use uuid::Uuid;

use crate::environment::Config;
use crate::modification::{ModificationFilter, ModificationType};
use crate::quality::SnapshotFilter;
use crate::session::SessionFilter;

/// Pagination controls accepted by every list endpoint.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Pagination {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl Pagination {
    /// Resolves to a row limit and offset. Page numbering starts at 1;
    /// requested page sizes are clamped to the configured maximum.
    pub fn limits(&self, config: &Config) -> (i64, i64) {
        limits(self.page, self.per_page, config)
    }
}

fn limits(page: Option<u32>, per_page: Option<u32>, config: &Config) -> (i64, i64) {
    let per_page = i64::from(per_page.unwrap_or(config.page_size)).clamp(
        1,
        i64::from(config.max_page_size),
    );
    let page = i64::from(page.unwrap_or(1)).max(1);

    (per_page, (page - 1) * per_page)
}

/// Pagination plus the filters the session listing accepts.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SessionListQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub reed_id: Option<Uuid>,
    pub context: Option<String>,
}

impl SessionListQuery {
    pub fn limits(&self, config: &Config) -> (i64, i64) {
        limits(self.page, self.per_page, config)
    }

    pub fn filter(&self) -> SessionFilter {
        SessionFilter {
            reed_id: self.reed_id,
            context: self.context.clone(),
        }
    }
}

/// Pagination plus the filter the snapshot listing accepts.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SnapshotListQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub reed_id: Option<Uuid>,
}

impl SnapshotListQuery {
    pub fn limits(&self, config: &Config) -> (i64, i64) {
        limits(self.page, self.per_page, config)
    }

    pub fn filter(&self) -> SnapshotFilter {
        SnapshotFilter {
            reed_id: self.reed_id,
        }
    }
}

/// Pagination plus the filters the modification listing accepts.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ModificationListQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub reed_id: Option<Uuid>,
    pub modification_type: Option<ModificationType>,
}

impl ModificationListQuery {
    pub fn limits(&self, config: &Config) -> (i64, i64) {
        limits(self.page, self.per_page, config)
    }

    pub fn filter(&self) -> ModificationFilter {
        ModificationFilter {
            reed_id: self.reed_id,
            modification_type: self.modification_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Pagination, SessionListQuery};
    use crate::environment::Config;

    const CONFIG: Config = Config {
        page_size: 50,
        max_page_size: 200,
    };

    #[test]
    fn defaults_apply_when_nothing_is_requested() {
        assert_eq!(Pagination::default().limits(&CONFIG), (50, 0));
    }

    #[test]
    fn later_pages_offset_by_whole_pages() {
        let query = Pagination {
            page: Some(3),
            per_page: Some(10),
        };

        assert_eq!(query.limits(&CONFIG), (10, 20));
    }

    #[test]
    fn oversized_and_zero_page_sizes_are_clamped() {
        let oversized = Pagination {
            page: None,
            per_page: Some(10_000),
        };
        assert_eq!(oversized.limits(&CONFIG), (200, 0));

        let zero = Pagination {
            page: Some(0),
            per_page: Some(0),
        };
        assert_eq!(zero.limits(&CONFIG), (1, 0));
    }

    #[test]
    fn absent_filters_match_everything() {
        let filter = SessionListQuery::default().filter();

        assert_eq!(filter.reed_id, None);
        assert_eq!(filter.context, None);
    }
}
