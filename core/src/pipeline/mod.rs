pub mod orchestrator;
pub mod report;
pub mod run_file;

pub use orchestrator::Pipeline;
pub use report::{EvidenceFate, PipelineReport};
pub use run_file::RunFile;
