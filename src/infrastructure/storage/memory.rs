//! In-memory repository provider for development and testing
//!
//! Mirrors the conditional-update semantics of the SeaORM repositories using
//! `DashMap` entry locks in place of transactions, plus one write gate for
//! the duplicate-checked visitor insert.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::domain::approval_token::{ApprovalToken, ApprovalTokenRepository};
use crate::domain::pre_approval::{PreApprovalEntry, PreApprovalKind, PreApprovalRepository};
use crate::domain::repositories::RepositoryProvider;
use crate::domain::user::{NewUser, User, UserRepository, UserRole};
use crate::domain::visitor::{Decision, DuplicateKey, Visitor, VisitorFilter, VisitorRepository};
use crate::domain::{DomainError, DomainResult};
use crate::shared::pagination::PageRequest;

type PreApprovalMap = DashMap<(PreApprovalKind, String), PreApprovalEntry>;

pub struct InMemoryUserRepository {
    /// Keyed by normalized email.
    users: DashMap<String, User>,
    pre_approvals: Arc<PreApprovalMap>,
}

pub struct InMemoryPreApprovalRepository {
    entries: Arc<PreApprovalMap>,
}

#[derive(Default)]
pub struct InMemoryVisitorRepository {
    visitors: DashMap<String, Visitor>,
    /// Serializes writers so a duplicate scan and its insert cannot interleave.
    write_gate: Mutex<()>,
}

#[derive(Default)]
pub struct InMemoryApprovalTokenRepository {
    tokens: DashMap<String, ApprovalToken>,
}

/// In-memory storage for development and testing
pub struct InMemoryRepositoryProvider {
    users: InMemoryUserRepository,
    pre_approvals: InMemoryPreApprovalRepository,
    visitors: InMemoryVisitorRepository,
    approval_tokens: InMemoryApprovalTokenRepository,
}

impl InMemoryRepositoryProvider {
    pub fn new() -> Self {
        let entries = Arc::new(PreApprovalMap::new());
        Self {
            users: InMemoryUserRepository {
                users: DashMap::new(),
                pre_approvals: entries.clone(),
            },
            pre_approvals: InMemoryPreApprovalRepository { entries },
            visitors: InMemoryVisitorRepository::default(),
            approval_tokens: InMemoryApprovalTokenRepository::default(),
        }
    }
}

impl Default for InMemoryRepositoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl RepositoryProvider for InMemoryRepositoryProvider {
    fn users(&self) -> &dyn UserRepository {
        &self.users
    }

    fn pre_approvals(&self) -> &dyn PreApprovalRepository {
        &self.pre_approvals
    }

    fn visitors(&self) -> &dyn VisitorRepository {
        &self.visitors
    }

    fn approval_tokens(&self) -> &dyn ApprovalTokenRepository {
        &self.approval_tokens
    }
}

fn build_user(new_user: NewUser) -> User {
    User {
        id: uuid::Uuid::new_v4().to_string(),
        name: new_user.name,
        email: new_user.email,
        password_hash: new_user.password_hash,
        role: new_user.role,
        created_at: Utc::now(),
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> DomainResult<Option<User>> {
        Ok(self.users.get(email).map(|u| u.clone()))
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<User>> {
        Ok(self
            .users
            .iter()
            .find(|u| u.id == id)
            .map(|u| u.value().clone()))
    }

    async fn create(&self, new_user: NewUser, consume: Option<PreApprovalKind>) -> DomainResult<User> {
        // The users entry lock is held across the pre-approval flip.
        match self.users.entry(new_user.email.clone()) {
            Entry::Occupied(_) => Err(DomainError::DuplicateEmail(new_user.email)),
            Entry::Vacant(slot) => {
                if let Some(kind) = consume {
                    let key = (kind, new_user.email.clone());
                    match self.pre_approvals.get_mut(&key) {
                        Some(mut entry) if !entry.used => entry.used = true,
                        _ => {
                            return Err(DomainError::NotPreApproved {
                                email: new_user.email,
                                role: new_user.role.to_string(),
                            })
                        }
                    }
                }
                let user = build_user(new_user);
                slot.insert(user.clone());
                Ok(user)
            }
        }
    }

    async fn upsert_operator(&self, new_user: NewUser) -> DomainResult<User> {
        match self.users.entry(new_user.email.clone()) {
            Entry::Occupied(mut existing) => {
                if existing.get().role != UserRole::SuperAdmin {
                    return Err(DomainError::DuplicateEmail(new_user.email));
                }
                let user = existing.get_mut();
                user.name = new_user.name;
                user.password_hash = new_user.password_hash;
                Ok(user.clone())
            }
            Entry::Vacant(slot) => {
                let mut user = build_user(new_user);
                user.role = UserRole::SuperAdmin;
                slot.insert(user.clone());
                Ok(user)
            }
        }
    }
}

#[async_trait]
impl PreApprovalRepository for InMemoryPreApprovalRepository {
    async fn insert_if_absent(&self, entry: PreApprovalEntry) -> DomainResult<bool> {
        match self.entries.entry((entry.kind, entry.email.clone())) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(entry);
                Ok(true)
            }
        }
    }

    async fn find(&self, kind: PreApprovalKind, email: &str) -> DomainResult<Option<PreApprovalEntry>> {
        Ok(self
            .entries
            .get(&(kind, email.to_string()))
            .map(|e| e.clone()))
    }
}

impl InMemoryVisitorRepository {
    fn sorted_matches(&self, filter: &VisitorFilter) -> Vec<Visitor> {
        let mut matches: Vec<Visitor> = self
            .visitors
            .iter()
            .filter(|v| v.matches(filter))
            .map(|v| v.value().clone())
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matches
    }
}

#[async_trait]
impl VisitorRepository for InMemoryVisitorRepository {
    async fn insert(&self, visitor: Visitor) -> DomainResult<()> {
        let _gate = self.write_gate.lock().await;
        self.visitors.insert(visitor.id.clone(), visitor);
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Visitor>> {
        Ok(self.visitors.get(id).map(|v| v.clone()))
    }

    async fn insert_unless_duplicate(&self, visitor: Visitor, key: &DuplicateKey) -> DomainResult<bool> {
        let _gate = self.write_gate.lock().await;
        if self.visitors.iter().any(|v| key.matches(v.value())) {
            return Ok(false);
        }
        self.visitors.insert(visitor.id.clone(), visitor);
        Ok(true)
    }

    async fn transition(&self, id: &str, decision: &Decision, at: DateTime<Utc>) -> DomainResult<Option<Visitor>> {
        let Some(mut visitor) = self.visitors.get_mut(id) else {
            return Ok(None);
        };
        match visitor.apply(decision, at) {
            Ok(()) => Ok(Some(visitor.clone())),
            Err(DomainError::InvalidTransition { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn list_by_captor(&self, user_id: &str) -> DomainResult<Vec<Visitor>> {
        let mut list: Vec<Visitor> = self
            .visitors
            .iter()
            .filter(|v| v.captured_by == user_id)
            .map(|v| v.value().clone())
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }

    async fn query(&self, filter: &VisitorFilter, page: Option<PageRequest>) -> DomainResult<(Vec<Visitor>, u64)> {
        let matches = self.sorted_matches(filter);
        let total = matches.len() as u64;
        let items = match page {
            Some(page) => matches
                .into_iter()
                .skip(page.offset() as usize)
                .take(page.limit as usize)
                .collect(),
            None => matches,
        };
        Ok((items, total))
    }

    async fn count(&self, filter: &VisitorFilter) -> DomainResult<u64> {
        Ok(self.visitors.iter().filter(|v| v.matches(filter)).count() as u64)
    }
}

#[async_trait]
impl ApprovalTokenRepository for InMemoryApprovalTokenRepository {
    async fn insert(&self, token: ApprovalToken) -> DomainResult<()> {
        self.tokens.insert(token.id.clone(), token);
        Ok(())
    }

    async fn find_active(&self, token_hash: &str, now: DateTime<Utc>) -> DomainResult<Option<ApprovalToken>> {
        Ok(self
            .tokens
            .iter()
            .find(|t| t.token_hash == token_hash && !t.is_expired(now))
            .map(|t| t.value().clone()))
    }

    async fn delete(&self, id: &str) -> DomainResult<bool> {
        Ok(self.tokens.remove(id).is_some())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> DomainResult<u64> {
        let before = self.tokens.len();
        self.tokens.retain(|_, t| !t.is_expired(now));
        Ok((before - self.tokens.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::visitor::{NewVisitor, VisitorDetails, NO_BIKE_NUMBER};
    use chrono::Duration;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Test".into(),
            email: email.into(),
            password_hash: "hash".into(),
            role: UserRole::Admin,
        }
    }

    #[tokio::test]
    async fn create_consumes_shared_pre_approval() {
        let repos = InMemoryRepositoryProvider::new();
        repos
            .pre_approvals()
            .insert_if_absent(PreApprovalEntry::new(PreApprovalKind::Admin, "a@x.com".into(), None, Utc::now()))
            .await
            .unwrap();

        repos
            .users()
            .create(new_user("a@x.com"), Some(PreApprovalKind::Admin))
            .await
            .unwrap();

        let entry = repos
            .pre_approvals()
            .find(PreApprovalKind::Admin, "a@x.com")
            .await
            .unwrap()
            .unwrap();
        assert!(entry.used);

        let err = repos
            .users()
            .create(new_user("a@x.com"), Some(PreApprovalKind::Admin))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::DuplicateEmail(_)));
    }

    #[tokio::test]
    async fn missing_entry_leaves_no_user() {
        let repos = InMemoryRepositoryProvider::new();
        let err = repos
            .users()
            .create(new_user("b@x.com"), Some(PreApprovalKind::Admin))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotPreApproved { .. }));
        assert!(repos.users().find_by_email("b@x.com").await.unwrap().is_none());
    }

    fn gate_visitor() -> Visitor {
        Visitor::from_new(NewVisitor {
            details: VisitorDetails {
                visitor_name: "Alice".into(),
                visitor_phone: "555-0101".into(),
                visitor_address: "Street".into(),
                visitor_email: None,
                owner_name: "Owner".into(),
                owner_email: "owner@example.com".into(),
                owner_mobile: "123".into(),
                flat_no: "101".into(),
                floor: "1".into(),
            },
            bike_number: NO_BIKE_NUMBER.into(),
            bike_image_ref: None,
            visitor_image_ref: "v.jpg".into(),
            captured_by: "guard".into(),
            security_email: "guard@example.com".into(),
            created_at: Utc::now(),
        })
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_duplicate_inserts_store_one_visitor() {
        let repos = Arc::new(InMemoryRepositoryProvider::new());
        let key = DuplicateKey {
            visitor_phone: "555-0101".into(),
            owner_email: "owner@example.com".into(),
            flat_no: "101".into(),
            since: Utc::now() - Duration::minutes(5),
        };

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let repos = Arc::clone(&repos);
                let key = key.clone();
                tokio::spawn(async move {
                    repos.visitors().insert_unless_duplicate(gate_visitor(), &key).await.unwrap()
                })
            })
            .collect();

        let mut stored = 0;
        for task in tasks {
            if task.await.unwrap() {
                stored += 1;
            }
        }
        assert_eq!(stored, 1);
        assert_eq!(repos.visitors().count(&VisitorFilter::default()).await.unwrap(), 1);
    }
}
