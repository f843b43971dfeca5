//! # Submissions
//!
//! Immutable records of validated payloads. Each submission keeps the
//! version of the form definition it was validated against; it is never
//! revalidated when newer versions are published.

use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::errors::StoreResult;

/// Default page size for submission listings
pub const DEFAULT_PAGE_LIMIT: usize = 20;

/// Upper bound on page size
pub const MAX_PAGE_LIMIT: usize = 100;

/// Submission document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: Uuid,
    pub division_id: Uuid,
    pub screen_id: Uuid,
    /// Version active at submission time
    pub form_version: u32,
    pub submitted_by: Uuid,
    pub data: Value,
    pub created_at: DateTime<Utc>,
}

impl Submission {
    pub fn new(
        division_id: Uuid,
        screen_id: Uuid,
        form_version: u32,
        submitted_by: Uuid,
        data: Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            division_id,
            screen_id,
            form_version,
            submitted_by,
            data,
            created_at: Utc::now(),
        }
    }
}

/// Sort order on `created_at`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// Listing filter and pagination
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmissionQuery {
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub limit: Option<usize>,
    /// Inclusive lower bound on creation time
    #[serde(default)]
    pub since: Option<DateTime<Utc>>,
    /// Inclusive upper bound on creation time
    #[serde(default)]
    pub until: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sort: SortDirection,
}

impl SubmissionQuery {
    /// Page number, clamped to at least 1
    pub fn page(&self) -> usize {
        self.page.unwrap_or(1).max(1)
    }

    /// Page size, clamped to 1..=MAX_PAGE_LIMIT
    pub fn limit(&self) -> usize {
        self.limit
            .unwrap_or(DEFAULT_PAGE_LIMIT)
            .clamp(1, MAX_PAGE_LIMIT)
    }

    fn matches(&self, submission: &Submission) -> bool {
        self.since.map_or(true, |since| submission.created_at >= since)
            && self.until.map_or(true, |until| submission.created_at <= until)
    }
}

/// One page of results
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub pages: usize,
}

impl<T> Page<T> {
    /// Slice an already filtered and sorted result set.
    ///
    /// Pages past the end are empty; the offset saturates rather than
    /// overflowing for absurd page numbers.
    pub fn from_sorted(all: Vec<T>, page: usize, limit: usize) -> Self {
        let total = all.len();
        let offset = page.saturating_sub(1).saturating_mul(limit);
        let items = all.into_iter().skip(offset).take(limit).collect();
        Self {
            items,
            page,
            limit,
            total,
            pages: total.div_ceil(limit),
        }
    }
}

/// Submission repository trait
#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    async fn insert(&self, submission: &Submission) -> StoreResult<()>;

    async fn list(
        &self,
        division_id: Uuid,
        screen_id: Uuid,
        query: &SubmissionQuery,
    ) -> StoreResult<Page<Submission>>;

    async fn delete_for_division(&self, division_id: Uuid) -> StoreResult<usize>;

    async fn delete_for_screen(&self, screen_id: Uuid) -> StoreResult<usize>;
}

/// In-memory submission repository
#[derive(Debug, Default)]
pub struct InMemorySubmissionRepository {
    submissions: RwLock<Vec<Submission>>,
}

impl InMemorySubmissionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SubmissionRepository for InMemorySubmissionRepository {
    async fn insert(&self, submission: &Submission) -> StoreResult<()> {
        self.submissions.write()?.push(submission.clone());
        Ok(())
    }

    async fn list(
        &self,
        division_id: Uuid,
        screen_id: Uuid,
        query: &SubmissionQuery,
    ) -> StoreResult<Page<Submission>> {
        let submissions = self.submissions.read()?;
        let mut matching: Vec<Submission> = submissions
            .iter()
            .filter(|s| s.division_id == division_id && s.screen_id == screen_id)
            .filter(|s| query.matches(s))
            .cloned()
            .collect();
        drop(submissions);

        match query.sort {
            SortDirection::Asc => matching.sort_by_key(|s| s.created_at),
            SortDirection::Desc => matching.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        }

        Ok(Page::from_sorted(matching, query.page(), query.limit()))
    }

    async fn delete_for_division(&self, division_id: Uuid) -> StoreResult<usize> {
        let mut submissions = self.submissions.write()?;
        let len_before = submissions.len();
        submissions.retain(|s| s.division_id != division_id);
        Ok(len_before - submissions.len())
    }

    async fn delete_for_screen(&self, screen_id: Uuid) -> StoreResult<usize> {
        let mut submissions = self.submissions.write()?;
        let len_before = submissions.len();
        submissions.retain(|s| s.screen_id != screen_id);
        Ok(len_before - submissions.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn submission_at(d: Uuid, s: Uuid, created_at: DateTime<Utc>) -> Submission {
        let mut sub = Submission::new(d, s, 1, Uuid::new_v4(), json!({}));
        sub.created_at = created_at;
        sub
    }

    #[test]
    fn test_query_clamps_page_and_limit() {
        let query = SubmissionQuery {
            page: Some(0),
            limit: Some(1000),
            ..Default::default()
        };
        assert_eq!(query.page(), 1);
        assert_eq!(query.limit(), MAX_PAGE_LIMIT);

        let query = SubmissionQuery {
            limit: Some(0),
            ..Default::default()
        };
        assert_eq!(query.limit(), 1);
        assert_eq!(SubmissionQuery::default().limit(), DEFAULT_PAGE_LIMIT);
    }

    #[test]
    fn test_page_counts() {
        let page = Page::from_sorted((0..45).collect::<Vec<_>>(), 3, 20);
        assert_eq!(page.items, (40..45).collect::<Vec<_>>());
        assert_eq!(page.total, 45);
        assert_eq!(page.pages, 3);
    }

    #[test]
    fn test_huge_page_is_empty_not_overflow() {
        let page = Page::from_sorted((0..10).collect::<Vec<_>>(), usize::MAX, MAX_PAGE_LIMIT);
        assert!(page.items.is_empty());
        assert_eq!(page.total, 10);
        assert_eq!(page.pages, 1);
    }

    #[tokio::test]
    async fn test_list_with_huge_page_number() {
        let repo = InMemorySubmissionRepository::new();
        let (d, s) = (Uuid::new_v4(), Uuid::new_v4());
        repo.insert(&submission_at(d, s, Utc::now())).await.unwrap();

        let query = SubmissionQuery {
            page: Some(usize::MAX),
            limit: Some(100),
            ..Default::default()
        };
        let page = repo.list(d, s, &query).await.unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.page, usize::MAX);
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn test_list_newest_first_with_window() {
        let repo = InMemorySubmissionRepository::new();
        let (d, s) = (Uuid::new_v4(), Uuid::new_v4());
        let base = Utc::now();

        for hours in 0..5 {
            repo.insert(&submission_at(d, s, base - Duration::hours(hours)))
                .await
                .unwrap();
        }
        // Different pair, must not leak into the listing
        repo.insert(&submission_at(d, Uuid::new_v4(), base)).await.unwrap();

        let page = repo.list(d, s, &SubmissionQuery::default()).await.unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.items[0].created_at, base);

        let windowed = SubmissionQuery {
            since: Some(base - Duration::hours(3)),
            until: Some(base - Duration::hours(1)),
            sort: SortDirection::Asc,
            ..Default::default()
        };
        let page = repo.list(d, s, &windowed).await.unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.items[0].created_at, base - Duration::hours(3));
    }
}
