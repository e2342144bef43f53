pub mod annotations;
pub mod module_key;
pub mod module_map;

pub use annotations::{attach_requirements, RequirementAnnotations};
pub use module_key::module_key_for;
pub use module_map::{ModuleMap, ModuleMapper, ModuleRef, DEFAULT_COMMON_MODULE_THRESHOLD};
