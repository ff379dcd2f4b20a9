//! Visitor lifecycle service
//!
//! Submission persists a pending visitor, binds a one-time approval secret to
//! it and emails the owner. Resolution consumes the secret, moves the visitor
//! to its terminal state and tells the guard. Email and plate recognition
//! are best-effort: their outcome is reported, never propagated.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use super::links::PublicLinks;
use crate::application::ports::{ApprovalRequest, NotificationGateway, PlateRecognizer, StatusUpdate};
use crate::domain::{
    resolve_bike_number, ApprovalToken, Decision, DomainError, DomainResult, Identity, NewVisitor,
    RepositoryProvider, Visitor, VisitorDetails,
};
use crate::infrastructure::crypto::approval_secret::{generate_approval_secret, hash_approval_secret};
use crate::shared::side_effect::{best_effort, SideEffectReport, WithSideEffects};

pub const EFFECT_RECOGNITION: &str = "plate_recognition";
pub const EFFECT_APPROVAL_EMAIL: &str = "approval_email";
pub const EFFECT_STATUS_EMAIL: &str = "status_email";

#[derive(Debug, Clone)]
pub struct LifecycleSettings {
    pub token_ttl: chrono::Duration,
    pub duplicate_window: chrono::Duration,
    pub notification_timeout: Duration,
    pub recognition_timeout: Duration,
}

impl Default for LifecycleSettings {
    fn default() -> Self {
        Self {
            token_ttl: chrono::Duration::hours(24),
            duplicate_window: chrono::Duration::minutes(10),
            notification_timeout: Duration::from_secs(10),
            recognition_timeout: Duration::from_secs(5),
        }
    }
}

/// A security-side submission. Image references point at already stored
/// uploads.
#[derive(Debug, Clone)]
pub struct SubmitVisitor {
    pub details: VisitorDetails,
    pub visitor_image_ref: String,
    pub bike_image_ref: Option<String>,
    pub manual_bike_number: Option<String>,
}

pub struct VisitorLifecycleService {
    repos: Arc<dyn RepositoryProvider>,
    notifier: Arc<dyn NotificationGateway>,
    recognizer: Option<Arc<dyn PlateRecognizer>>,
    links: PublicLinks,
    settings: LifecycleSettings,
}

impl VisitorLifecycleService {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        notifier: Arc<dyn NotificationGateway>,
        recognizer: Option<Arc<dyn PlateRecognizer>>,
        links: PublicLinks,
        settings: LifecycleSettings,
    ) -> Self {
        Self {
            repos,
            notifier,
            recognizer,
            links,
            settings,
        }
    }

    pub async fn submit(&self, captor: &Identity, cmd: SubmitVisitor) -> DomainResult<WithSideEffects<Visitor>> {
        let details = cmd.details.normalized()?;
        let visitor_image_ref = cmd.visitor_image_ref.trim().to_string();
        if visitor_image_ref.is_empty() {
            return Err(DomainError::Validation("Visitor photo is required".into()));
        }

        let (detected, recognition) = self.recognize(cmd.bike_image_ref.as_deref()).await;
        let bike_number = resolve_bike_number(detected.as_deref(), cmd.manual_bike_number.as_deref());

        let new_visitor = NewVisitor {
            details,
            bike_number,
            bike_image_ref: cmd.bike_image_ref,
            visitor_image_ref,
            captured_by: captor.id.clone(),
            security_email: captor.email.clone(),
            created_at: Utc::now(),
        };

        let key = new_visitor.duplicate_key(self.settings.duplicate_window);
        let visitor = Visitor::from_new(new_visitor);
        if !self
            .repos
            .visitors()
            .insert_unless_duplicate(visitor.clone(), &key)
            .await?
        {
            debug!(visitor_phone = %key.visitor_phone, flat_no = %key.flat_no, "Duplicate visitor submission");
            return Err(DomainError::DuplicateVisitor);
        }

        let secret = generate_approval_secret();
        let token = ApprovalToken::new(
            hash_approval_secret(&secret),
            visitor.id.clone(),
            self.settings.token_ttl,
            visitor.created_at,
        );
        self.repos.approval_tokens().insert(token).await?;

        let request = ApprovalRequest {
            visitor: visitor.clone(),
            approve_url: self.links.approve_url(&secret),
            reject_url: self.links.reject_url(&secret),
            photo_url: self.links.image_url(&visitor.visitor_image_ref),
        };
        let (_, email) = best_effort(
            EFFECT_APPROVAL_EMAIL,
            self.settings.notification_timeout,
            self.notifier.send_approval_request(&request),
        )
        .await;

        metrics::counter!("visitors_submitted_total").increment(1);
        info!(
            visitor_id = %visitor.id,
            captured_by = %visitor.captured_by,
            flat_no = %visitor.details.flat_no,
            bike_number = %visitor.bike_number,
            email_sent = email.is_completed(),
            "Visitor submitted"
        );

        Ok(WithSideEffects::new(visitor, vec![recognition, email]))
    }

    async fn recognize(&self, bike_image_ref: Option<&str>) -> (Option<String>, SideEffectReport) {
        match (bike_image_ref, &self.recognizer) {
            (Some(image_ref), Some(recognizer)) => {
                let (detected, report) = best_effort(
                    EFFECT_RECOGNITION,
                    self.settings.recognition_timeout,
                    recognizer.detect(image_ref),
                )
                .await;
                (detected.flatten(), report)
            }
            _ => (None, SideEffectReport::skipped(EFFECT_RECOGNITION)),
        }
    }

    /// Apply an owner decision through an emailed secret.
    ///
    /// Unknown, expired and already used secrets all yield
    /// `InvalidOrExpiredToken`; the distinction only reaches the log.
    pub async fn resolve(&self, secret: &str, decision: Decision) -> DomainResult<WithSideEffects<Visitor>> {
        let now = Utc::now();
        let hash = hash_approval_secret(secret);

        let Some(token) = self.repos.approval_tokens().find_active(&hash, now).await? else {
            info!(decision = decision.label(), "Approval link unknown, used or expired");
            return Err(DomainError::InvalidOrExpiredToken);
        };

        // Transition first, then drop the token: a crash in between leaves
        // only a stale token that can no longer move the visitor.
        let transitioned = self
            .repos
            .visitors()
            .transition(&token.visitor_id, &decision, now)
            .await?;

        if let Err(e) = self.repos.approval_tokens().delete(&token.id).await {
            warn!(token_id = %token.id, error = %e, "Failed to delete consumed approval token");
        }

        let Some(visitor) = transitioned else {
            warn!(
                visitor_id = %token.visitor_id,
                decision = decision.label(),
                "Approval token referenced a missing or already resolved visitor"
            );
            return Err(DomainError::InvalidOrExpiredToken);
        };

        metrics::counter!("visitor_decisions_total", "decision" => decision.label()).increment(1);
        info!(visitor_id = %visitor.id, status = %visitor.status, "Visitor resolved by owner");

        let update = StatusUpdate {
            visitor: visitor.clone(),
        };
        let (_, email) = best_effort(
            EFFECT_STATUS_EMAIL,
            self.settings.notification_timeout,
            self.notifier.send_status_update(&update),
        )
        .await;

        Ok(WithSideEffects::new(visitor, vec![email]))
    }

    /// Visitors submitted by one security user, newest first.
    pub async fn list_for_security(&self, user_id: &str) -> DomainResult<Vec<Visitor>> {
        self.repos.visitors().list_by_captor(user_id).await
    }
}
