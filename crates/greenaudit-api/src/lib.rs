pub mod model;
pub mod prompt;
pub mod server;

pub use model::{AuditReport, AuditRequest};
pub use server::AuditServer;
