pub(crate) mod audit_model;
pub(crate) mod audit_repository;
pub(crate) mod audit_traits;

pub use audit_model::AuditEntry;
pub use audit_repository::AuditRepository;
pub use audit_traits::AuditSink;
