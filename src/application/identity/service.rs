//! Credential service: application-layer orchestration
//!
//! HTTP handlers are thin wrappers that delegate here.

use std::sync::{Arc, OnceLock};

use chrono::Utc;
use tracing::{debug, info, warn};
use validator::ValidateEmail;

use crate::domain::{
    AddOutcome, DomainError, DomainResult, Identity, NewUser, PreApprovalEntry, PreApprovalKind,
    RepositoryProvider, User, UserRole,
};
use crate::infrastructure::crypto::jwt::{create_token, JwtConfig};
use crate::infrastructure::crypto::password::{hash_password, verify_password};
use crate::shared::validations::normalize_email;

/// Attribution recorded on security allow-list entries when the caller has none.
pub const DEFAULT_ADDED_BY: &str = "admin@system.com";

pub const MIN_PASSWORD_LEN: usize = 6;

/// Session credential issued after registration or login
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: User,
}

#[derive(Debug, Clone)]
pub struct RegisterCommand {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: UserRole,
}

/// Operator account supplied by configuration. The password is already a
/// bcrypt hash.
#[derive(Debug, Clone)]
pub struct OperatorCredential {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

pub struct CredentialService {
    repos: Arc<dyn RepositoryProvider>,
    jwt_config: JwtConfig,
    bcrypt_cost: u32,
    /// Verified against when the account does not exist, so unknown emails
    /// cost the same as wrong passwords.
    dummy_hash: OnceLock<String>,
}

impl CredentialService {
    pub fn new(repos: Arc<dyn RepositoryProvider>, jwt_config: JwtConfig, bcrypt_cost: u32) -> Self {
        Self {
            repos,
            jwt_config,
            bcrypt_cost,
            dummy_hash: OnceLock::new(),
        }
    }

    pub fn jwt_config(&self) -> &JwtConfig {
        &self.jwt_config
    }

    // ── Registration ────────────────────────────────────────────

    /// Register a pre-approved admin or security user and open a session.
    pub async fn register(&self, cmd: RegisterCommand) -> DomainResult<AuthSession> {
        let name = cmd.name.trim().to_string();
        let email = normalize_email(&cmd.email);

        if name.is_empty() {
            return Err(DomainError::Validation("Name is required".into()));
        }
        if !email.validate_email() {
            return Err(DomainError::Validation("Invalid email address".into()));
        }
        if cmd.password.len() < MIN_PASSWORD_LEN {
            return Err(DomainError::Validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        let Some(kind) = PreApprovalKind::for_role(cmd.role) else {
            return Err(DomainError::Validation(format!(
                "Role {} cannot be registered",
                cmd.role
            )));
        };

        if self.repos.users().find_by_email(&email).await?.is_some() {
            return Err(DomainError::DuplicateEmail(email));
        }

        let password_hash = hash_password(&cmd.password, self.bcrypt_cost)
            .map_err(|e| DomainError::Internal(format!("Failed to hash password: {}", e)))?;

        let user = self
            .repos
            .users()
            .create(
                NewUser {
                    name,
                    email,
                    password_hash,
                    role: cmd.role,
                },
                Some(kind),
            )
            .await?;

        info!(user_id = %user.id, email = %user.email, role = %user.role, "New user registered");
        self.issue_session(user)
    }

    // ── Authentication ──────────────────────────────────────────

    /// Authenticate by email and password. Operators and regular users take
    /// the same path.
    pub async fn authenticate(&self, email: &str, password: &str) -> DomainResult<AuthSession> {
        let email = normalize_email(email);

        let Some(user) = self.repos.users().find_by_email(&email).await? else {
            let _ = verify_password(password, self.dummy_hash());
            debug!(email = %email, "Login for unknown email");
            return Err(DomainError::InvalidCredentials);
        };

        let valid = verify_password(password, &user.password_hash).unwrap_or(false);
        if !valid {
            debug!(user_id = %user.id, "Login with wrong password");
            return Err(DomainError::InvalidCredentials);
        }

        info!(user_id = %user.id, role = %user.role, "User logged in");
        self.issue_session(user)
    }

    fn issue_session(&self, user: User) -> DomainResult<AuthSession> {
        let token = create_token(&user.identity(), &self.jwt_config)
            .map_err(|e| DomainError::Internal(format!("Failed to create token: {}", e)))?;

        Ok(AuthSession {
            token,
            token_type: "Bearer".into(),
            expires_in: self.jwt_config.expiration_hours * 3600,
            user,
        })
    }

    fn dummy_hash(&self) -> &str {
        self.dummy_hash.get_or_init(|| {
            hash_password("not-a-real-password", self.bcrypt_cost).unwrap_or_default()
        })
    }

    // ── Queries ─────────────────────────────────────────────────

    pub async fn get_user(&self, identity: &Identity) -> DomainResult<User> {
        self.repos
            .users()
            .find_by_id(&identity.id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", "id", identity.id.clone()))
    }

    // ── Operators ───────────────────────────────────────────────

    /// Insert or refresh configured operator accounts. Returns how many were
    /// provisioned; entries colliding with a regular account are skipped.
    pub async fn provision_operators(&self, operators: &[OperatorCredential]) -> DomainResult<usize> {
        let mut provisioned = 0;

        for op in operators {
            let email = normalize_email(&op.email);
            if !email.validate_email() {
                warn!(email = %op.email, "Skipping operator with invalid email");
                continue;
            }
            if op.password_hash.parse::<bcrypt::HashParts>().is_err() {
                warn!(email = %email, "Skipping operator whose password is not a bcrypt hash");
                continue;
            }

            let result = self
                .repos
                .users()
                .upsert_operator(NewUser {
                    name: op.name.trim().to_string(),
                    email: email.clone(),
                    password_hash: op.password_hash.clone(),
                    role: UserRole::SuperAdmin,
                })
                .await;

            match result {
                Ok(user) => {
                    info!(user_id = %user.id, email = %user.email, "Operator account provisioned");
                    provisioned += 1;
                }
                Err(DomainError::DuplicateEmail(_)) => {
                    warn!(email = %email, "Operator email belongs to a regular account, skipping");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(provisioned)
    }

    // ── Allow-lists ─────────────────────────────────────────────

    /// Add emails to an allow-list. Blank entries are skipped; every other
    /// entry gets its own outcome.
    pub async fn add_pre_approvals(
        &self,
        kind: PreApprovalKind,
        emails: &[String],
        added_by: Option<&str>,
    ) -> DomainResult<Vec<AddOutcome>> {
        let added_by = match kind {
            PreApprovalKind::Security => Some(added_by.unwrap_or(DEFAULT_ADDED_BY).to_string()),
            PreApprovalKind::Admin => None,
        };
        let mut outcomes = Vec::with_capacity(emails.len());

        for raw in emails {
            let email = normalize_email(raw);
            if email.is_empty() {
                continue;
            }
            if !email.validate_email() {
                outcomes.push(AddOutcome::error(email, "Invalid email address"));
                continue;
            }

            let entry = PreApprovalEntry::new(kind, email.clone(), added_by.clone(), Utc::now());
            match self.repos.pre_approvals().insert_if_absent(entry).await {
                Ok(true) => outcomes.push(AddOutcome::added(email)),
                Ok(false) => outcomes.push(AddOutcome::already_exists(email)),
                Err(e) => {
                    warn!(email = %email, error = %e, "Failed to add pre-approval");
                    outcomes.push(AddOutcome::error(email, "Could not store entry"));
                }
            }
        }

        info!(
            kind = kind.as_str(),
            requested = emails.len(),
            added = outcomes.iter().filter(|o| o.status == crate::domain::AddStatus::Added).count(),
            "Pre-approval entries processed"
        );
        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AddStatus;
    use crate::infrastructure::crypto::jwt::verify_token;
    use crate::infrastructure::storage::InMemoryRepositoryProvider;

    fn service() -> CredentialService {
        CredentialService::new(
            Arc::new(InMemoryRepositoryProvider::new()),
            JwtConfig::new("test-secret", 1),
            4,
        )
    }

    fn register_cmd(email: &str, role: UserRole) -> RegisterCommand {
        RegisterCommand {
            name: "Sam".into(),
            email: email.into(),
            password: "secret123".into(),
            role,
        }
    }

    #[tokio::test]
    async fn register_requires_pre_approval() {
        let svc = service();
        let err = svc
            .register(register_cmd("guard@example.com", UserRole::Security))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotPreApproved { .. }));
    }

    #[tokio::test]
    async fn register_consumes_entry_and_blocks_second_attempt() {
        let svc = service();
        svc.add_pre_approvals(PreApprovalKind::Security, &["Guard@Example.com".into()], None)
            .await
            .unwrap();

        let session = svc
            .register(register_cmd("  GUARD@example.com ", UserRole::Security))
            .await
            .unwrap();
        assert_eq!(session.user.email, "guard@example.com");
        let claims = verify_token(&session.token, svc.jwt_config()).unwrap();
        assert_eq!(claims.role, "security");

        let entry = svc
            .repos
            .pre_approvals()
            .find(PreApprovalKind::Security, "guard@example.com")
            .await
            .unwrap()
            .unwrap();
        assert!(entry.used);
        assert_eq!(entry.added_by.as_deref(), Some(DEFAULT_ADDED_BY));

        let err = svc
            .register(register_cmd("guard@example.com", UserRole::Security))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::DuplicateEmail(_)));
    }

    #[tokio::test]
    async fn entry_for_other_role_does_not_count() {
        let svc = service();
        svc.add_pre_approvals(PreApprovalKind::Security, &["x@example.com".into()], None)
            .await
            .unwrap();
        let err = svc
            .register(register_cmd("x@example.com", UserRole::Admin))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotPreApproved { .. }));
    }

    #[tokio::test]
    async fn super_admin_cannot_self_register() {
        let svc = service();
        let err = svc
            .register(register_cmd("root@example.com", UserRole::SuperAdmin))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn short_password_is_rejected() {
        let svc = service();
        let mut cmd = register_cmd("a@example.com", UserRole::Admin);
        cmd.password = "123".into();
        assert!(matches!(svc.register(cmd).await, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn login_checks_password_and_normalizes_email() {
        let svc = service();
        svc.add_pre_approvals(PreApprovalKind::Admin, &["boss@example.com".into()], None)
            .await
            .unwrap();
        svc.register(register_cmd("boss@example.com", UserRole::Admin))
            .await
            .unwrap();

        let session = svc.authenticate(" BOSS@example.com", "secret123").await.unwrap();
        assert_eq!(session.user.role, UserRole::Admin);
        assert_eq!(session.expires_in, 3600);

        assert!(matches!(
            svc.authenticate("boss@example.com", "wrong").await,
            Err(DomainError::InvalidCredentials)
        ));
        assert!(matches!(
            svc.authenticate("nobody@example.com", "secret123").await,
            Err(DomainError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn operators_log_in_through_the_same_path() {
        let svc = service();
        let operator = OperatorCredential {
            name: "Root".into(),
            email: "Root@Example.com".into(),
            password_hash: hash_password("operator-pass", 4).unwrap(),
        };
        assert_eq!(svc.provision_operators(&[operator.clone()]).await.unwrap(), 1);
        assert_eq!(svc.provision_operators(&[operator]).await.unwrap(), 1);

        let session = svc.authenticate("root@example.com", "operator-pass").await.unwrap();
        assert_eq!(session.user.role, UserRole::SuperAdmin);
    }

    #[tokio::test]
    async fn operator_with_plain_password_is_skipped() {
        let svc = service();
        let operator = OperatorCredential {
            name: "Root".into(),
            email: "root@example.com".into(),
            password_hash: "plaintext".into(),
        };
        assert_eq!(svc.provision_operators(&[operator]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn adding_same_email_twice_reports_existing() {
        let svc = service();
        let emails = vec![
            "a@example.com".to_string(),
            "   ".to_string(),
            "A@example.com".to_string(),
            "not-an-email".to_string(),
        ];
        let outcomes = svc
            .add_pre_approvals(PreApprovalKind::Admin, &emails, Some("root@example.com"))
            .await
            .unwrap();

        let statuses: Vec<_> = outcomes.iter().map(|o| o.status).collect();
        assert_eq!(
            statuses,
            vec![AddStatus::Added, AddStatus::AlreadyExists, AddStatus::Error]
        );

        let entry = svc
            .repos
            .pre_approvals()
            .find(PreApprovalKind::Admin, "a@example.com")
            .await
            .unwrap()
            .unwrap();
        assert!(entry.added_by.is_none());
    }
}
