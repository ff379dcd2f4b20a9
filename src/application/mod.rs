//! Application layer: use-case services over the domain and the outbound ports.

pub mod identity;
pub mod maintenance;
pub mod ports;
pub mod reporting;
pub mod visitors;

#[cfg(test)]
pub(crate) mod testing;

pub use identity::{AuthSession, CredentialService, OperatorCredential, RegisterCommand};
pub use maintenance::TokenSweeper;
pub use ports::{
    ApprovalRequest, GatewayError, ImageStore, NotificationGateway, PlateRecognizer, StatusUpdate,
};
pub use reporting::{DashboardStats, ExportFormat, ReportQuery, ReportingService, VisitorExport};
pub use visitors::{LifecycleSettings, PublicLinks, SubmitVisitor, VisitorLifecycleService};
