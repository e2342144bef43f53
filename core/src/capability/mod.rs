pub mod catalog;
pub mod interface;
pub mod retry;

pub use catalog::{CatalogEntry, CatalogFile, TypeCatalog};
pub use interface::{classify_capability_error, TypeResolver, TypeValidator};
pub use retry::{with_retry, RetryPolicy, Retrying};
