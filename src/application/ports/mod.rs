//! Application ports (hexagonal architecture boundaries)
//!
//! Outbound collaborators the services call but do not own: mail delivery,
//! plate recognition and image storage.

pub mod outbound;

pub use outbound::{
    ApprovalRequest, GatewayError, ImageStore, NotificationGateway, PlateRecognizer, StatusUpdate,
};
