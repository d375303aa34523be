//! Pagination and ordering options shared by the list operations.

use serde::{Deserialize, Serialize};

/// Sort direction for list operations.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Options accepted by every paginated list operation.
///
/// Unset fields stay off the wire so the server applies its own defaults.
/// Pass the `pagination_token` from one page's response to fetch the next.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListOptions {
    pub limit: Option<u32>,
    pub order: Option<SortOrder>,
    pub pagination_token: Option<String>,
    pub team_id: Option<String>,
    pub sort_by: Option<String>,
}

impl ListOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_order(mut self, order: SortOrder) -> Self {
        self.order = Some(order);
        self
    }

    pub fn with_pagination_token(mut self, token: impl Into<String>) -> Self {
        self.pagination_token = Some(token.into());
        self
    }

    pub fn with_team_id(mut self, team_id: impl Into<String>) -> Self {
        self.team_id = Some(team_id.into());
        self
    }

    /// Sorts by a resource-specific field name, e.g. `created_at`.
    pub fn with_sort_by(mut self, field: impl Into<String>) -> Self {
        self.sort_by = Some(field.into());
        self
    }

    /// Query parameters for the set fields, in a fixed order.
    pub(crate) fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        if let Some(limit) = self.limit {
            query.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(order) = self.order {
            query.push(("order".to_string(), order.as_str().to_string()));
        }
        if let Some(token) = &self.pagination_token {
            query.push(("pagination_token".to_string(), token.clone()));
        }
        if let Some(team_id) = &self.team_id {
            query.push(("team_id".to_string(), team_id.clone()));
        }
        if let Some(field) = &self.sort_by {
            query.push(("sort_by".to_string(), field.clone()));
        }
        query
    }
}
