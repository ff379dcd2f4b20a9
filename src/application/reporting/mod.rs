//! Admin reporting: filtered listings, dashboard counters and exports.

pub mod export;
pub mod service;

pub use export::{ExportFormat, VisitorExport};
pub use service::{DashboardStats, ReportQuery, ReportWindow, ReportingService};
