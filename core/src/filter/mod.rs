pub mod decision_tree;
pub mod outcome;

pub use decision_tree::{Filter, DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_MINIMUM_CONFIDENCE};
pub use outcome::{FilterOutcome, FilteredResource};
