//! Email subjects and bodies

use chrono::{DateTime, Local, Utc};

use crate::application::ports::{ApprovalRequest, StatusUpdate};
use crate::domain::VisitorStatus;

pub struct RenderedEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

pub fn approval_request(request: &ApprovalRequest) -> RenderedEmail {
    let v = &request.visitor;
    let d = &v.details;

    let bike = if v.has_bike_number() {
        v.bike_number.as_str()
    } else {
        "Not provided"
    };
    let visitor_email = d
        .visitor_email
        .as_deref()
        .map(|e| format!("Visitor Email: {}\n", e))
        .unwrap_or_default();

    let body = format!(
        "Hello {owner},\n\n\
         A visitor is waiting at the gate.\n\n\
         Visitor Name: {name}\n\
         Visitor Phone: {phone}\n\
         Visitor Address: {address}\n\
         {visitor_email}\
         Bike Number: {bike}\n\
         Purpose: Visiting {owner} at Flat {flat}, {floor}\n\n\
         Visitor Photo: {photo}\n\n\
         Please approve or reject this visitor within 24 hours.\n\n\
         Approve: {approve}\n\
         Reject: {reject}\n",
        owner = d.owner_name,
        name = d.visitor_name,
        phone = d.visitor_phone,
        address = d.visitor_address,
        flat = d.flat_no,
        floor = d.floor,
        photo = request.photo_url,
        approve = request.approve_url,
        reject = request.reject_url,
    );

    RenderedEmail {
        to: d.owner_email.clone(),
        subject: format!("Visitor Approval Request - {}", d.visitor_name),
        body,
    }
}

pub fn status_update(update: &StatusUpdate) -> RenderedEmail {
    let v = &update.visitor;
    let label = match v.status {
        VisitorStatus::Approved => "APPROVED",
        VisitorStatus::Rejected => "REJECTED",
        VisitorStatus::Pending => "PENDING",
    };
    let at = v.resolved_at().unwrap_or_else(Utc::now);
    let reason = v
        .rejection_reason
        .as_deref()
        .map(|r| format!("Reason: {}\n", r))
        .unwrap_or_default();

    let body = format!(
        "Visitor Request {label}\n\n\
         Visitor Name: {name}\n\
         Status: {label}\n\
         Approved/Rejected By: {owner}\n\
         Flat No: {flat}\n\
         {reason}\
         Time: {time}\n\n\
         Please check the dashboard for more details.\n",
        name = v.details.visitor_name,
        owner = v.details.owner_name,
        flat = v.details.flat_no,
        time = local_time(at),
    );

    RenderedEmail {
        to: v.security_email.clone(),
        subject: format!("Visitor Request {} - {}", label, v.details.visitor_name),
        body,
    }
}

fn local_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Decision, NewVisitor, Visitor, VisitorDetails};

    fn visitor(bike: &str) -> Visitor {
        Visitor::from_new(NewVisitor {
            details: VisitorDetails {
                visitor_name: "Alice".into(),
                owner_name: "Owen".into(),
                owner_email: "owen@example.com".into(),
                flat_no: "101".into(),
                floor: "1st".into(),
                ..Default::default()
            },
            bike_number: bike.into(),
            bike_image_ref: None,
            visitor_image_ref: "v.jpg".into(),
            captured_by: "g".into(),
            security_email: "guard@example.com".into(),
            created_at: Utc::now(),
        })
    }

    #[test]
    fn approval_email_has_links_and_placeholder_plate() {
        let email = approval_request(&ApprovalRequest {
            visitor: visitor("-"),
            approve_url: "http://x/approve/s".into(),
            reject_url: "http://x/reject/s".into(),
            photo_url: "http://x/uploads/v.jpg".into(),
        });
        assert_eq!(email.to, "owen@example.com");
        assert_eq!(email.subject, "Visitor Approval Request - Alice");
        assert!(email.body.contains("Bike Number: Not provided"));
        assert!(email.body.contains("http://x/approve/s"));
        assert!(email.body.contains("http://x/reject/s"));
        assert!(email.body.contains("http://x/uploads/v.jpg"));
    }

    #[test]
    fn status_email_goes_to_guard() {
        let mut v = visitor("KA01");
        v.apply(&Decision::Reject { reason: Some("Away".into()) }, Utc::now())
            .unwrap();
        let email = status_update(&StatusUpdate { visitor: v });
        assert_eq!(email.to, "guard@example.com");
        assert_eq!(email.subject, "Visitor Request REJECTED - Alice");
        assert!(email.body.contains("Reason: Away"));
        assert!(email.body.contains("Flat No: 101"));
    }
}
