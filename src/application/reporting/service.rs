//! Reporting service for the admin dashboard

use std::sync::Arc;

use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use serde::Serialize;
use tracing::debug;

use super::export::VisitorExport;
use crate::domain::{DomainError, DomainResult, RepositoryProvider, Visitor, VisitorFilter, VisitorStatus};
use crate::shared::pagination::{PageRequest, PaginatedResult};
use crate::shared::time::DateRange;

/// Calendar days a report covers, inclusive, with the matching instant range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportWindow {
    pub range: DateRange,
    pub first_day: NaiveDate,
    pub last_day: NaiveDate,
}

impl ReportWindow {
    /// Explicit days are whole UTC days.
    pub fn days(first_day: NaiveDate, last_day: NaiveDate) -> Self {
        Self {
            range: DateRange::utc_days(first_day, last_day),
            first_day,
            last_day,
        }
    }

    /// The server-local day containing `now`.
    pub fn today(now: DateTime<Utc>) -> Self {
        let day = now.with_timezone(&Local).date_naive();
        Self {
            range: DateRange::local_day(now),
            first_day: day,
            last_day: day,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReportQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: Option<VisitorStatus>,
    pub search: Option<String>,
}

impl ReportQuery {
    /// Explicit days when given (a lone bound covers one day). Otherwise
    /// today, unless a search term asks for all dates.
    fn window(&self, now: DateTime<Utc>) -> DomainResult<Option<ReportWindow>> {
        let (first, last) = match (self.start_date, self.end_date) {
            (Some(s), Some(e)) => (s, e),
            (Some(d), None) | (None, Some(d)) => (d, d),
            (None, None) if self.has_search() => return Ok(None),
            (None, None) => return Ok(Some(ReportWindow::today(now))),
        };

        if first > last {
            return Err(DomainError::Validation(
                "startDate must not be after endDate".into(),
            ));
        }
        Ok(Some(ReportWindow::days(first, last)))
    }

    fn has_search(&self) -> bool {
        self.search.as_deref().is_some_and(|s| !s.trim().is_empty())
    }

    fn filter(&self, window: Option<&ReportWindow>) -> VisitorFilter {
        VisitorFilter {
            range: window.map(|w| w.range),
            status: self.status,
            search: self.search.clone(),
        }
    }
}

/// Today's counters for the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total: u64,
    pub pending: u64,
    pub approved: u64,
    pub rejected: u64,
    /// Created in the trailing hour, whatever the calendar day.
    pub current_hour: u64,
}

pub struct ReportingService {
    repos: Arc<dyn RepositoryProvider>,
}

impl ReportingService {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self { repos }
    }

    pub async fn query_visitors(&self, query: &ReportQuery, page: PageRequest) -> DomainResult<PaginatedResult<Visitor>> {
        let window = query.window(Utc::now())?;
        let filter = query.filter(window.as_ref());
        let (items, total) = self.repos.visitors().query(&filter, Some(page)).await?;
        debug!(total, page = page.page, limit = page.limit, "Visitor query");
        Ok(PaginatedResult::new(items, total, page.page, page.limit))
    }

    /// Every matching visitor, newest first. Search text is ignored; an
    /// export always covers a date window.
    pub async fn export_visitors(&self, query: &ReportQuery) -> DomainResult<VisitorExport> {
        let now = Utc::now();
        let query = ReportQuery {
            search: None,
            ..query.clone()
        };
        let window = query.window(now)?.unwrap_or_else(|| ReportWindow::today(now));
        let filter = query.filter(Some(&window));
        let (visitors, total) = self.repos.visitors().query(&filter, None).await?;
        debug!(total, "Visitor export");

        Ok(VisitorExport {
            visitors,
            window,
            exported_at: now,
        })
    }

    pub async fn compute_dashboard_stats(&self) -> DomainResult<DashboardStats> {
        self.compute_dashboard_stats_at(Utc::now()).await
    }

    pub async fn compute_dashboard_stats_at(&self, now: DateTime<Utc>) -> DomainResult<DashboardStats> {
        let today = DateRange::local_day(now);
        let count_today = |status: Option<VisitorStatus>| VisitorFilter {
            range: Some(today),
            status,
            search: None,
        };
        let visitors = self.repos.visitors();

        Ok(DashboardStats {
            total: visitors.count(&count_today(None)).await?,
            pending: visitors.count(&count_today(Some(VisitorStatus::Pending))).await?,
            approved: visitors.count(&count_today(Some(VisitorStatus::Approved))).await?,
            rejected: visitors.count(&count_today(Some(VisitorStatus::Rejected))).await?,
            current_hour: visitors
                .count(&VisitorFilter {
                    range: Some(DateRange::trailing(now, Duration::hours(1))),
                    ..Default::default()
                })
                .await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::export::ExportFormat;
    use crate::domain::{Decision, NewVisitor, VisitorDetails};
    use crate::infrastructure::storage::InMemoryRepositoryProvider;
    use chrono::TimeZone;

    fn visitor(name: &str, flat: &str, created_at: DateTime<Utc>) -> Visitor {
        Visitor::from_new(NewVisitor {
            details: VisitorDetails {
                visitor_name: name.into(),
                visitor_phone: format!("555{}", flat),
                owner_name: "Owner".into(),
                owner_email: "o@x.com".into(),
                flat_no: flat.into(),
                ..Default::default()
            },
            bike_number: "-".into(),
            bike_image_ref: None,
            visitor_image_ref: "v.jpg".into(),
            captured_by: "g".into(),
            security_email: "g@x.com".into(),
            created_at,
        })
    }

    async fn seeded() -> ReportingService {
        let repos = Arc::new(InMemoryRepositoryProvider::new());
        let alice = visitor("Alice", "101", Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap());
        let mut bob = visitor("Bob", "202", Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap());
        bob.apply(&Decision::Approve, bob.created_at).unwrap();
        repos.visitors().insert(alice).await.unwrap();
        repos.visitors().insert(bob).await.unwrap();
        ReportingService::new(repos)
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn single_day_range_selects_that_day() {
        let svc = seeded().await;
        let query = ReportQuery {
            start_date: Some(day(2024, 1, 1)),
            end_date: Some(day(2024, 1, 1)),
            ..Default::default()
        };
        let page = svc.query_visitors(&query, PageRequest::default()).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].details.visitor_name, "Alice");
    }

    #[tokio::test]
    async fn search_without_dates_spans_all_days() {
        let svc = seeded().await;
        let query = ReportQuery {
            search: Some("101".into()),
            ..Default::default()
        };
        let page = svc.query_visitors(&query, PageRequest::default()).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].details.visitor_name, "Alice");
    }

    #[tokio::test]
    async fn no_filters_means_today_only() {
        let svc = seeded().await;
        let page = svc
            .query_visitors(&ReportQuery::default(), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn status_filter_and_pagination() {
        let svc = seeded().await;
        let query = ReportQuery {
            start_date: Some(day(2024, 1, 1)),
            end_date: Some(day(2024, 1, 2)),
            status: Some(VisitorStatus::Approved),
            ..Default::default()
        };
        let page = svc.query_visitors(&query, PageRequest::new(Some(1), Some(1))).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.items[0].details.visitor_name, "Bob");
    }

    #[tokio::test]
    async fn reversed_range_is_invalid() {
        let svc = seeded().await;
        let query = ReportQuery {
            start_date: Some(day(2024, 1, 2)),
            end_date: Some(day(2024, 1, 1)),
            ..Default::default()
        };
        assert!(matches!(
            svc.query_visitors(&query, PageRequest::default()).await,
            Err(DomainError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn export_covers_range_newest_first() {
        let svc = seeded().await;
        let query = ReportQuery {
            start_date: Some(day(2024, 1, 1)),
            end_date: Some(day(2024, 1, 2)),
            ..Default::default()
        };
        let export = svc.export_visitors(&query).await.unwrap();
        let names: Vec<_> = export.visitors.iter().map(|v| v.details.visitor_name.as_str()).collect();
        assert_eq!(names, vec!["Bob", "Alice"]);
        assert_eq!(
            export.filename(ExportFormat::Csv),
            "visitors-2024-01-01-to-2024-01-02.csv"
        );
    }

    #[tokio::test]
    async fn dashboard_counts_today_by_status_and_trailing_hour() {
        let repos = Arc::new(InMemoryRepositoryProvider::new());
        let now = Local
            .with_ymd_and_hms(2024, 6, 12, 15, 0, 0)
            .single()
            .unwrap()
            .with_timezone(&Utc);

        let mut approved = visitor("A", "1", now - Duration::minutes(30));
        approved.apply(&Decision::Approve, now).unwrap();
        let mut rejected = visitor("B", "2", now - Duration::hours(3));
        rejected
            .apply(&Decision::Reject { reason: None }, now)
            .unwrap();
        let pending = visitor("C", "3", now - Duration::minutes(61));
        let yesterday = visitor("D", "4", now - Duration::days(1));

        for v in [approved, rejected, pending, yesterday] {
            repos.visitors().insert(v).await.unwrap();
        }

        let stats = ReportingService::new(repos)
            .compute_dashboard_stats_at(now)
            .await
            .unwrap();
        assert_eq!(
            stats,
            DashboardStats {
                total: 3,
                pending: 1,
                approved: 1,
                rejected: 1,
                current_hour: 1,
            }
        );
    }
}
