use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::DomainResult;
use crate::shared::errors::DomainError;
use crate::shared::time::DateRange;

/// Stored when no plate number is known.
pub const NO_BIKE_NUMBER: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitorStatus {
    Pending,
    Approved,
    Rejected,
}

impl VisitorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Parse a query-string status filter where `all` (or nothing) means no filter.
    pub fn parse_filter(s: Option<&str>) -> DomainResult<Option<Self>> {
        match s.map(str::trim).filter(|s| !s.is_empty()) {
            None | Some("all") => Ok(None),
            Some(other) => Self::parse(other)
                .map(Some)
                .ok_or_else(|| DomainError::Validation(format!("Unknown status filter: {}", other))),
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for VisitorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An owner's answer to an approval request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject { reason: Option<String> },
}

impl Decision {
    pub fn target_status(&self) -> VisitorStatus {
        match self {
            Self::Approve => VisitorStatus::Approved,
            Self::Reject { .. } => VisitorStatus::Rejected,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject { .. } => "reject",
        }
    }
}

/// Fields captured by the security form.
#[derive(Debug, Clone, Default)]
pub struct VisitorDetails {
    pub visitor_name: String,
    pub visitor_phone: String,
    pub visitor_address: String,
    pub visitor_email: Option<String>,
    pub owner_name: String,
    pub owner_email: String,
    pub owner_mobile: String,
    pub flat_no: String,
    pub floor: String,
}

impl VisitorDetails {
    /// Trim every field and lower-case the owner email. Fails when a
    /// required field is blank.
    pub fn normalized(self) -> DomainResult<Self> {
        let required = |name: &str, value: String| -> DomainResult<String> {
            let value = value.trim().to_string();
            if value.is_empty() {
                return Err(DomainError::Validation(format!("{} is required", name)));
            }
            Ok(value)
        };

        Ok(Self {
            visitor_name: required("visitorName", self.visitor_name)?,
            visitor_phone: required("visitorPhone", self.visitor_phone)?,
            visitor_address: required("visitorAddress", self.visitor_address)?,
            visitor_email: self
                .visitor_email
                .map(|e| e.trim().to_string())
                .filter(|e| !e.is_empty()),
            owner_name: required("ownerName", self.owner_name)?,
            owner_email: required("ownerEmail", self.owner_email)?.to_lowercase(),
            owner_mobile: required("ownerMobile", self.owner_mobile)?,
            flat_no: required("flatNo", self.flat_no)?,
            floor: required("floor", self.floor)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewVisitor {
    pub details: VisitorDetails,
    pub bike_number: String,
    pub bike_image_ref: Option<String>,
    pub visitor_image_ref: String,
    pub captured_by: String,
    pub security_email: String,
    pub created_at: DateTime<Utc>,
}

impl NewVisitor {
    pub fn duplicate_key(&self, window: Duration) -> DuplicateKey {
        DuplicateKey {
            visitor_phone: self.details.visitor_phone.clone(),
            owner_email: self.details.owner_email.clone(),
            flat_no: self.details.flat_no.clone(),
            since: self.created_at - window,
        }
    }
}

/// Equivalence key for duplicate submissions: the same visitor phone for the
/// same owner and flat, still pending, created at or after `since`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateKey {
    pub visitor_phone: String,
    pub owner_email: String,
    pub flat_no: String,
    pub since: DateTime<Utc>,
}

impl DuplicateKey {
    pub fn matches(&self, visitor: &Visitor) -> bool {
        visitor.status == VisitorStatus::Pending
            && visitor.created_at >= self.since
            && visitor.details.visitor_phone == self.visitor_phone
            && visitor.details.owner_email == self.owner_email
            && visitor.details.flat_no == self.flat_no
    }
}

#[derive(Debug, Clone)]
pub struct Visitor {
    pub id: String,
    pub details: VisitorDetails,
    pub bike_number: String,
    pub bike_image_ref: Option<String>,
    pub visitor_image_ref: String,
    /// Id of the security user who submitted the record.
    pub captured_by: String,
    pub security_email: String,
    pub status: VisitorStatus,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Visitor {
    pub fn from_new(new: NewVisitor) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            details: new.details,
            bike_number: new.bike_number,
            bike_image_ref: new.bike_image_ref,
            visitor_image_ref: new.visitor_image_ref,
            captured_by: new.captured_by,
            security_email: new.security_email,
            status: VisitorStatus::Pending,
            approved_at: None,
            rejected_at: None,
            rejection_reason: None,
            created_at: new.created_at,
        }
    }

    /// Apply an owner decision. Only a pending visitor can move.
    pub fn apply(&mut self, decision: &Decision, at: DateTime<Utc>) -> DomainResult<()> {
        if self.status.is_terminal() {
            return Err(DomainError::InvalidTransition {
                from: self.status.to_string(),
                to: decision.target_status().to_string(),
            });
        }

        match decision {
            Decision::Approve => {
                self.status = VisitorStatus::Approved;
                self.approved_at = Some(at);
            }
            Decision::Reject { reason } => {
                self.status = VisitorStatus::Rejected;
                self.rejected_at = Some(at);
                self.rejection_reason = reason.clone();
            }
        }
        Ok(())
    }

    /// Time of the terminal transition, if any.
    pub fn resolved_at(&self) -> Option<DateTime<Utc>> {
        self.approved_at.or(self.rejected_at)
    }

    pub fn has_bike_number(&self) -> bool {
        self.bike_number != NO_BIKE_NUMBER
    }

    pub fn matches(&self, filter: &VisitorFilter) -> bool {
        if let Some(range) = &filter.range {
            if !range.contains(self.created_at) {
                return false;
            }
        }
        if let Some(status) = filter.status {
            if self.status != status {
                return false;
            }
        }
        match filter.search_term() {
            None => true,
            Some(term) => [
                &self.details.visitor_name,
                &self.details.visitor_phone,
                &self.details.owner_name,
                &self.details.flat_no,
                &self.bike_number,
            ]
            .iter()
            .any(|field| field.to_lowercase().contains(&term)),
        }
    }
}

/// Pick the plate number to store: a confident detection wins over the
/// manual entry, and the sentinel is used when neither is present.
pub fn resolve_bike_number(detected: Option<&str>, manual: Option<&str>) -> String {
    let usable = |v: &&str| !v.is_empty() && *v != NO_BIKE_NUMBER;

    detected
        .map(str::trim)
        .filter(usable)
        .or_else(|| manual.map(str::trim).filter(usable))
        .unwrap_or(NO_BIKE_NUMBER)
        .to_string()
}

/// Admin query filter. `None` fields do not restrict the result.
#[derive(Debug, Clone, Default)]
pub struct VisitorFilter {
    pub range: Option<DateRange>,
    pub status: Option<VisitorStatus>,
    pub search: Option<String>,
}

impl VisitorFilter {
    /// Lower-cased, trimmed search text, or `None` if blank.
    pub fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }
}
