//! SeaORM implementation of VisitorRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, Func, LikeExpr, Query, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    Iterable, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set,
};
use tracing::debug;

use crate::domain::visitor::{
    Decision, DuplicateKey, Visitor, VisitorFilter, VisitorRepository, VisitorStatus,
};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::visitor;
use crate::shared::pagination::PageRequest;

pub struct SeaOrmVisitorRepository {
    db: DatabaseConnection,
}

impl SeaOrmVisitorRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn to_active_model(v: Visitor) -> visitor::ActiveModel {
    visitor::ActiveModel {
        id: Set(v.id),
        visitor_name: Set(v.details.visitor_name),
        visitor_phone: Set(v.details.visitor_phone),
        visitor_address: Set(v.details.visitor_address),
        visitor_email: Set(v.details.visitor_email),
        owner_name: Set(v.details.owner_name),
        owner_email: Set(v.details.owner_email),
        owner_mobile: Set(v.details.owner_mobile),
        flat_no: Set(v.details.flat_no),
        floor: Set(v.details.floor),
        bike_number: Set(v.bike_number),
        bike_image_ref: Set(v.bike_image_ref),
        visitor_image_ref: Set(v.visitor_image_ref),
        captured_by: Set(v.captured_by),
        security_email: Set(v.security_email),
        status: Set(v.status.into()),
        approved_at: Set(v.approved_at),
        rejected_at: Set(v.rejected_at),
        rejection_reason: Set(v.rejection_reason),
        created_at: Set(v.created_at),
    }
}

/// Escape LIKE metacharacters so user text matches literally.
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn apply_filter(mut query: Select<visitor::Entity>, filter: &VisitorFilter) -> Select<visitor::Entity> {
    if let Some(range) = &filter.range {
        query = query
            .filter(visitor::Column::CreatedAt.gte(range.start))
            .filter(visitor::Column::CreatedAt.lt(range.end));
    }

    if let Some(status) = filter.status {
        query = query.filter(visitor::Column::Status.eq(visitor::VisitorStatus::from(status)));
    }

    if let Some(term) = filter.search_term() {
        let pattern = like_pattern(&term);
        let searchable = [
            visitor::Column::VisitorName,
            visitor::Column::VisitorPhone,
            visitor::Column::OwnerName,
            visitor::Column::FlatNo,
            visitor::Column::BikeNumber,
        ];
        let any = searchable.into_iter().fold(Condition::any(), |cond, col| {
            cond.add(
                Expr::expr(Func::lower(Expr::col(col)))
                    .like(LikeExpr::new(pattern.clone()).escape('\\')),
            )
        });
        query = query.filter(any);
    }

    query
}

#[async_trait]
impl VisitorRepository for SeaOrmVisitorRepository {
    async fn insert(&self, v: Visitor) -> DomainResult<()> {
        to_active_model(v).insert(&self.db).await?;
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Visitor>> {
        let model = visitor::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(Into::into))
    }

    /// `INSERT INTO visitors (..) SELECT .. WHERE NOT EXISTS (..)`: one
    /// statement, so SQLite holds the write lock across the check.
    async fn insert_unless_duplicate(&self, v: Visitor, key: &DuplicateKey) -> DomainResult<bool> {
        let existing = Query::select()
            .expr(Expr::val(1))
            .from(visitor::Entity)
            .and_where(visitor::Column::VisitorPhone.eq(key.visitor_phone.as_str()))
            .and_where(visitor::Column::OwnerEmail.eq(key.owner_email.as_str()))
            .and_where(visitor::Column::FlatNo.eq(key.flat_no.as_str()))
            .and_where(visitor::Column::Status.eq(visitor::VisitorStatus::Pending))
            .and_where(visitor::Column::CreatedAt.gte(key.since))
            .to_owned();

        let model = to_active_model(v);
        let (columns, values): (Vec<visitor::Column>, Vec<SimpleExpr>) = visitor::Column::iter()
            .filter_map(|col| model.get(col).into_value().map(|value| (col, Expr::value(value))))
            .unzip();

        let candidate = Query::select()
            .exprs(values)
            .cond_where(Condition::all().not().add(Expr::exists(existing)))
            .to_owned();

        let insert = Query::insert()
            .into_table(visitor::Entity)
            .columns(columns)
            .select_from(candidate)
            .map_err(|e| DomainError::Internal(format!("Invalid visitor insert: {}", e)))?
            .to_owned();

        let backend = self.db.get_database_backend();
        let result = self.db.execute(backend.build(&insert)).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn transition(&self, id: &str, decision: &Decision, at: DateTime<Utc>) -> DomainResult<Option<Visitor>> {
        let target = visitor::VisitorStatus::from(decision.target_status());
        let mut update = visitor::Entity::update_many()
            .col_expr(visitor::Column::Status, Expr::value(target));

        update = match decision {
            Decision::Approve => update.col_expr(visitor::Column::ApprovedAt, Expr::value(at)),
            Decision::Reject { reason } => update
                .col_expr(visitor::Column::RejectedAt, Expr::value(at))
                .col_expr(visitor::Column::RejectionReason, Expr::value(reason.clone())),
        };

        let result = update
            .filter(visitor::Column::Id.eq(id))
            .filter(visitor::Column::Status.eq(visitor::VisitorStatus::from(VisitorStatus::Pending)))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            debug!(visitor_id = %id, "Transition skipped, visitor missing or resolved");
            return Ok(None);
        }

        self.find_by_id(id).await
    }

    async fn list_by_captor(&self, user_id: &str) -> DomainResult<Vec<Visitor>> {
        let models = visitor::Entity::find()
            .filter(visitor::Column::CapturedBy.eq(user_id))
            .order_by_desc(visitor::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn query(&self, filter: &VisitorFilter, page: Option<PageRequest>) -> DomainResult<(Vec<Visitor>, u64)> {
        let query = apply_filter(visitor::Entity::find(), filter);
        let total = query.clone().count(&self.db).await?;

        let mut query = query.order_by_desc(visitor::Column::CreatedAt);
        if let Some(page) = page {
            query = query.offset(page.offset()).limit(page.limit as u64);
        }

        let models = query.all(&self.db).await?;
        Ok((models.into_iter().map(Into::into).collect(), total))
    }

    async fn count(&self, filter: &VisitorFilter) -> DomainResult<u64> {
        Ok(apply_filter(visitor::Entity::find(), filter)
            .count(&self.db)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::{NewUser, UserRepository, UserRole};
    use crate::domain::visitor::{NewVisitor, VisitorDetails, NO_BIKE_NUMBER};
    use crate::infrastructure::database::repositories::user_repository::SeaOrmUserRepository;
    use crate::infrastructure::database::test_connection;
    use crate::shared::time::DateRange;
    use chrono::{Duration, NaiveDate, TimeZone};

    async fn setup() -> (SeaOrmVisitorRepository, String) {
        let db = test_connection().await;
        let guard = SeaOrmUserRepository::new(db.clone())
            .create(
                NewUser {
                    name: "Guard".into(),
                    email: "guard@example.com".into(),
                    password_hash: "hash".into(),
                    role: UserRole::Security,
                },
                None,
            )
            .await
            .unwrap();
        (SeaOrmVisitorRepository::new(db), guard.id)
    }

    fn visitor(name: &str, flat: &str, captured_by: &str, created_at: DateTime<Utc>) -> Visitor {
        Visitor::from_new(NewVisitor {
            details: VisitorDetails {
                visitor_name: name.into(),
                visitor_phone: format!("555-{}", flat),
                visitor_address: "Street".into(),
                visitor_email: None,
                owner_name: "Owner".into(),
                owner_email: "owner@example.com".into(),
                owner_mobile: "123".into(),
                flat_no: flat.into(),
                floor: "1".into(),
            },
            bike_number: NO_BIKE_NUMBER.into(),
            bike_image_ref: None,
            visitor_image_ref: "v.jpg".into(),
            captured_by: captured_by.into(),
            security_email: "guard@example.com".into(),
            created_at,
        })
    }

    #[tokio::test]
    async fn transition_applies_once() {
        let (repo, guard) = setup().await;
        let v = visitor("Alice", "101", &guard, Utc::now());
        let id = v.id.clone();
        repo.insert(v).await.unwrap();

        let now = Utc::now();
        let approved = repo.transition(&id, &Decision::Approve, now).await.unwrap().unwrap();
        assert_eq!(approved.status, VisitorStatus::Approved);
        assert!(approved.approved_at.is_some());

        let again = repo
            .transition(&id, &Decision::Reject { reason: None }, now)
            .await
            .unwrap();
        assert!(again.is_none());
        let stored = repo.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(stored.status, VisitorStatus::Approved);
        assert!(stored.rejected_at.is_none());
    }

    #[tokio::test]
    async fn transition_of_missing_visitor_is_none() {
        let (repo, _) = setup().await;
        assert!(repo
            .transition("nope", &Decision::Approve, Utc::now())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn query_filters_by_day_and_search() {
        let (repo, guard) = setup().await;
        let alice = visitor("Alice", "101", &guard, Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap());
        let mut bob = visitor("Bob", "202", &guard, Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap());
        bob.apply(&Decision::Approve, bob.created_at).unwrap();
        repo.insert(alice).await.unwrap();
        repo.insert(bob).await.unwrap();

        let jan1 = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let by_day = VisitorFilter {
            range: Some(DateRange::utc_days(jan1, jan1)),
            ..Default::default()
        };
        let (items, total) = repo.query(&by_day, None).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(items[0].details.visitor_name, "Alice");

        let by_search = VisitorFilter {
            search: Some("101".into()),
            ..Default::default()
        };
        let (items, _) = repo.query(&by_search, None).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].details.flat_no, "101");

        let by_name = VisitorFilter {
            search: Some("BO".into()),
            status: Some(VisitorStatus::Approved),
            ..Default::default()
        };
        assert_eq!(repo.count(&by_name).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn search_treats_wildcards_literally() {
        let (repo, guard) = setup().await;
        repo.insert(visitor("Alice", "101", &guard, Utc::now())).await.unwrap();

        let filter = VisitorFilter {
            search: Some("%".into()),
            ..Default::default()
        };
        assert_eq!(repo.count(&filter).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn query_pages_newest_first() {
        let (repo, guard) = setup().await;
        let base = Utc::now();
        for i in 0..5 {
            repo.insert(visitor(&format!("V{}", i), &format!("{}", i), &guard, base + Duration::seconds(i)))
                .await
                .unwrap();
        }

        let (page, total) = repo
            .query(&VisitorFilter::default(), Some(PageRequest::new(Some(2), Some(2))))
            .await
            .unwrap();
        assert_eq!(total, 5);
        let names: Vec<_> = page.iter().map(|v| v.details.visitor_name.as_str()).collect();
        assert_eq!(names, vec!["V2", "V1"]);
    }

    #[tokio::test]
    async fn list_by_captor_is_newest_first() {
        let (repo, guard) = setup().await;
        let base = Utc::now();
        repo.insert(visitor("Old", "1", &guard, base - Duration::hours(1))).await.unwrap();
        repo.insert(visitor("New", "2", &guard, base)).await.unwrap();

        let list = repo.list_by_captor(&guard).await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].details.visitor_name, "New");
        assert!(repo.list_by_captor("someone-else").await.unwrap().is_empty());
    }

    fn key_for(v: &Visitor, since: DateTime<Utc>) -> DuplicateKey {
        DuplicateKey {
            visitor_phone: v.details.visitor_phone.clone(),
            owner_email: v.details.owner_email.clone(),
            flat_no: v.details.flat_no.clone(),
            since,
        }
    }

    #[tokio::test]
    async fn conditional_insert_respects_window() {
        let (repo, guard) = setup().await;
        let now = Utc::now();
        let first = visitor("Alice", "101", &guard, now - Duration::minutes(3));
        let first_id = first.id.clone();
        assert!(repo
            .insert_unless_duplicate(first.clone(), &key_for(&first, now - Duration::minutes(10)))
            .await
            .unwrap());
        let stored = repo.find_by_id(&first_id).await.unwrap().unwrap();
        assert_eq!(stored.status, VisitorStatus::Pending);
        assert_eq!(stored.bike_image_ref, None);
        assert_eq!(stored.created_at.timestamp(), first.created_at.timestamp());

        let again = visitor("Alice", "101", &guard, now);
        assert!(!repo
            .insert_unless_duplicate(again.clone(), &key_for(&again, now - Duration::minutes(10)))
            .await
            .unwrap());
        assert!(repo.find_by_id(&again.id).await.unwrap().is_none());

        let outside_window = visitor("Alice", "101", &guard, now);
        assert!(repo
            .insert_unless_duplicate(outside_window.clone(), &key_for(&outside_window, now - Duration::minutes(1)))
            .await
            .unwrap());
        assert_eq!(repo.count(&VisitorFilter::default()).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn resolved_visitor_is_not_a_duplicate() {
        let (repo, guard) = setup().await;
        let now = Utc::now();
        let first = visitor("Alice", "101", &guard, now);
        repo.insert(first.clone()).await.unwrap();
        repo.transition(&first.id, &Decision::Approve, now).await.unwrap();

        let again = visitor("Alice", "101", &guard, now);
        assert!(repo
            .insert_unless_duplicate(again.clone(), &key_for(&again, now - Duration::minutes(10)))
            .await
            .unwrap());
    }
}
