mod audit_store;
mod live_source;

pub use audit_store::AuditStore;
pub use live_source::LiveSource;
