//! Issue Repository

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::Issue;
use serde::Deserialize;
use shared::{IssueStatus, Priority};
use std::collections::BTreeSet;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const TABLE: &str = "issue";

/// Sort key for issue search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Recent,
    Upvotes,
    Title,
    Status,
    Priority,
}

impl SortKey {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "recent" => Some(SortKey::Recent),
            "upvotes" => Some(SortKey::Upvotes),
            "title" => Some(SortKey::Title),
            "status" => Some(SortKey::Status),
            "priority" => Some(SortKey::Priority),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Recent => "recent",
            SortKey::Upvotes => "upvotes",
            SortKey::Title => "title",
            SortKey::Status => "status",
            SortKey::Priority => "priority",
        }
    }

    fn field(&self) -> &'static str {
        match self {
            SortKey::Recent => "reportedAt",
            SortKey::Upvotes => "upvotes",
            SortKey::Title => "title",
            SortKey::Status => "status",
            SortKey::Priority => "priority",
        }
    }

    /// Recency and popularity sort newest/highest first by default
    pub fn default_direction(&self) -> SortDirection {
        match self {
            SortKey::Recent | SortKey::Upvotes => SortDirection::Desc,
            _ => SortDirection::Asc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }

    fn keyword(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Search and filter parameters
///
/// Filters combine with logical AND; free-text terms combine with logical OR
/// across title/description/location/reportedBy.
#[derive(Debug, Clone)]
pub struct SearchParams {
    pub text: Option<String>,
    pub category: Option<String>,
    pub status: Option<IssueStatus>,
    pub priority: Option<Priority>,
    pub location: Option<String>,
    pub sort: SortKey,
    pub direction: SortDirection,
    /// 1-based page number
    pub page: u32,
    pub limit: u32,
}

/// One page of search results, with filter facets computed over the
/// *filtered* result set (not the global collection).
#[derive(Debug)]
pub struct SearchPage {
    pub issues: Vec<Issue>,
    pub total: u64,
    pub categories: Vec<String>,
    pub statuses: Vec<String>,
    pub priorities: Vec<String>,
    pub locations: Vec<String>,
}

/// Per-status issue count
#[derive(Debug, Deserialize)]
pub struct StatusCount {
    pub status: IssueStatus,
    pub count: u64,
}

#[derive(Debug, Deserialize)]
struct FacetRow {
    #[serde(default)]
    category: String,
    #[serde(default)]
    status: IssueStatus,
    #[serde(default)]
    priority: Priority,
    #[serde(default)]
    location: String,
}

#[derive(Clone)]
pub struct IssueRepository {
    base: BaseRepository,
}

impl IssueRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find all issues, newest first
    pub async fn find_all(&self) -> RepoResult<Vec<Issue>> {
        let issues: Vec<Issue> = self
            .base
            .db()
            .query("SELECT * FROM issue ORDER BY reportedAt DESC")
            .await?
            .take(0)?;
        Ok(issues)
    }

    /// Find issue by record key
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Issue>> {
        let issue: Option<Issue> = self.base.db().select((TABLE, id)).await?;
        Ok(issue)
    }

    /// Find issues submitted by a reporter, matched against either the
    /// stored email or the display name (legacy records may carry only one)
    pub async fn find_by_reporter(&self, ident: &str) -> RepoResult<Vec<Issue>> {
        let issues: Vec<Issue> = self
            .base
            .db()
            .query(
                "SELECT * FROM issue WHERE userEmail = $ident OR reportedBy = $ident \
                 ORDER BY reportedAt DESC",
            )
            .bind(("ident", ident.to_string()))
            .await?
            .take(0)?;
        Ok(issues)
    }

    /// Create a new issue under the given key
    pub async fn create(&self, key: &str, issue: Issue) -> RepoResult<Issue> {
        let created: Option<Issue> = self
            .base
            .db()
            .create((TABLE, key))
            .content(issue)
            .await?;
        created.ok_or_else(|| RepoError::Database("Failed to create issue".to_string()))
    }

    /// Persist a full issue snapshot (last-writer-wins, no version check)
    pub async fn save(&self, key: &str, issue: Issue) -> RepoResult<Issue> {
        let updated: Option<Issue> = self
            .base
            .db()
            .update((TABLE, key))
            .content(issue)
            .await?;
        updated.ok_or_else(|| RepoError::NotFound(format!("Issue {key}")))
    }

    /// Delete an issue; returns false when it did not exist
    pub async fn delete(&self, key: &str) -> RepoResult<bool> {
        let deleted: Option<Issue> = self.base.db().delete((TABLE, key)).await?;
        Ok(deleted.is_some())
    }

    /// Toggle a voter's membership in the upvoter set.
    ///
    /// Single atomic statement: two concurrent voters can never produce a
    /// corrupted count. `upvotes` is recomputed from the mutated set inside
    /// the same statement, so the count always equals the set size.
    pub async fn toggle_upvote(&self, key: &str, voter: &str) -> RepoResult<Issue> {
        let mut result = self
            .base
            .db()
            .query(
                "UPDATE type::thing('issue', $id) SET \
                     upvotedBy = IF upvotedBy CONTAINS $voter \
                         { array::difference(upvotedBy, [$voter]) } \
                     ELSE \
                         { array::append(upvotedBy, $voter) }, \
                     upvotes = array::len(upvotedBy) \
                 RETURN AFTER",
            )
            .bind(("id", key.to_string()))
            .bind(("voter", voter.to_string()))
            .await?;
        let issues: Vec<Issue> = result.take(0)?;
        issues
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Issue {key}")))
    }

    /// Total issue count plus a per-status breakdown
    pub async fn count_by_status(&self) -> RepoResult<(u64, Vec<StatusCount>)> {
        #[derive(Deserialize)]
        struct CountRow {
            count: u64,
        }

        let mut result = self
            .base
            .db()
            .query("SELECT count() AS count FROM issue GROUP ALL")
            .query("SELECT status, count() AS count FROM issue GROUP BY status")
            .await?;
        let totals: Vec<CountRow> = result.take(0)?;
        let by_status: Vec<StatusCount> = result.take(1)?;
        Ok((totals.first().map(|r| r.count).unwrap_or(0), by_status))
    }

    /// Search with filters, sort, and pagination.
    ///
    /// Runs two statements over the same WHERE clause: one for the requested
    /// page, one projecting the facet fields of every match; distinct filter
    /// values and the total are derived from the projection.
    pub async fn search(&self, params: &SearchParams) -> RepoResult<SearchPage> {
        let (where_clause, binds) = build_where(params);

        let page_sql = format!(
            "SELECT * FROM issue{where_clause} ORDER BY {} {} LIMIT $limit START $start",
            params.sort.field(),
            params.direction.keyword(),
        );
        let facet_sql = format!("SELECT category, status, priority, location FROM issue{where_clause}");

        let limit = params.limit.max(1);
        let start = (params.page.max(1) - 1) * limit;

        let mut page_query = self.base.db().query(page_sql);
        for (name, value) in &binds {
            page_query = page_query.bind((name.clone(), value.clone()));
        }
        let issues: Vec<Issue> = page_query
            .bind(("limit", limit as i64))
            .bind(("start", start as i64))
            .await?
            .take(0)?;

        let mut facet_query = self.base.db().query(facet_sql);
        for (name, value) in binds {
            facet_query = facet_query.bind((name, value));
        }
        let rows: Vec<FacetRow> = facet_query.await?.take(0)?;

        let mut categories = BTreeSet::new();
        let mut statuses = BTreeSet::new();
        let mut priorities = BTreeSet::new();
        let mut locations = BTreeSet::new();
        for row in &rows {
            categories.insert(row.category.clone());
            statuses.insert(row.status.as_str().to_string());
            priorities.insert(row.priority.as_str().to_string());
            locations.insert(row.location.clone());
        }

        Ok(SearchPage {
            issues,
            total: rows.len() as u64,
            categories: categories.into_iter().collect(),
            statuses: statuses.into_iter().collect(),
            priorities: priorities.into_iter().collect(),
            locations: locations.into_iter().collect(),
        })
    }
}

/// Build the WHERE clause and its bindings for a search.
///
/// Equality filters AND together; each free-text term expands to an OR group
/// over the four searchable fields, and the term groups OR together.
fn build_where(params: &SearchParams) -> (String, Vec<(String, String)>) {
    let mut conditions: Vec<String> = Vec::new();
    let mut binds: Vec<(String, String)> = Vec::new();

    if let Some(text) = &params.text {
        let mut term_clauses = Vec::new();
        for (i, term) in text.split_whitespace().enumerate() {
            let name = format!("q{i}");
            term_clauses.push(format!(
                "(string::contains(string::lowercase(title), ${name}) \
                 OR string::contains(string::lowercase(description), ${name}) \
                 OR string::contains(string::lowercase(location), ${name}) \
                 OR string::contains(string::lowercase(reportedBy), ${name}))"
            ));
            binds.push((name, term.to_lowercase()));
        }
        if !term_clauses.is_empty() {
            conditions.push(format!("({})", term_clauses.join(" OR ")));
        }
    }

    if let Some(category) = &params.category {
        conditions.push("category = $category".to_string());
        binds.push(("category".to_string(), category.clone()));
    }
    if let Some(status) = params.status {
        conditions.push("status = $status".to_string());
        binds.push(("status".to_string(), status.as_str().to_string()));
    }
    if let Some(priority) = params.priority {
        conditions.push("priority = $priority".to_string());
        binds.push(("priority".to_string(), priority.as_str().to_string()));
    }
    if let Some(location) = &params.location {
        conditions.push("location = $location".to_string());
        binds.push(("location".to_string(), location.clone()));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };
    (where_clause, binds)
}
