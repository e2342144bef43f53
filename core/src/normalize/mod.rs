pub mod label;
pub mod normalizer;

pub use label::canonical_label;
pub use normalizer::{Normalizer, MAX_ALIAS_HOPS};
