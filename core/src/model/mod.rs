pub mod decision;
pub mod evidence;
pub mod identity;
pub mod merged;
pub mod modules;
pub mod position;
pub mod resource;

pub use decision::{Bucket, DecisionReason, FilterDecision};
pub use evidence::{DetectorOutput, EvidenceRecord};
pub use identity::{AnchorPoint, IdentityKey};
pub use merged::MergedResource;
pub use modules::{CommonModule, Diagnostic, DiagnosticKind, ModuleAssignment};
pub use position::Position;
pub use resource::{ResourceType, SourceKind};
