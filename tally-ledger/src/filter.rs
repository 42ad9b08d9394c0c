use chrono::{DateTime, Utc};
use tally_core::ScopeId;

/// Filter describing which entries to load from a store.
///
/// The default ordering is newest first, which is what every listing in the
/// chat surface wants.
#[derive(Clone, Debug)]
pub struct EntryFilter {
    pub scope: ScopeId,
    /// Keep entries with `created_at >= since`.
    pub since: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
    pub ascending: bool,
}

impl EntryFilter {
    pub fn for_scope(scope: ScopeId) -> Self {
        Self {
            scope,
            since: None,
            limit: None,
            ascending: false,
        }
    }

    pub fn with_since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn ascending(mut self) -> Self {
        self.ascending = true;
        self
    }
}
