pub mod merger;
pub mod strategy;

pub use merger::Merger;
pub use strategy::ConfidenceStrategy;
