pub mod event;
pub mod log;

pub use event::{AuditEvent, ZERO_HASH_64};
pub use log::AuditTrail;
