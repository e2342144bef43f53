use crate::capability::{CatalogFile, TypeCatalog};
use crate::clarify::Answer;
use crate::config::PipelineConfig;
use crate::error::CoreResult;
use crate::mapper::RequirementAnnotations;
use crate::model::DetectorOutput;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Everything one offline run needs, as read by the runner tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunFile {
    #[serde(default)]
    pub config: PipelineConfig,
    #[serde(default)]
    pub catalog: CatalogFile,
    pub detections: Vec<DetectorOutput>,
    #[serde(default)]
    pub annotations: RequirementAnnotations,
    /// Answers replayed after the first pass, in order.
    #[serde(default)]
    pub answers: Vec<Answer>,
}

impl RunFile {
    pub fn from_json_str(s: &str) -> CoreResult<Self> {
        let mut run: Self = serde_json::from_str(s)?;
        run.config.validate()?;
        run.annotations = run.annotations.canonicalized();
        Ok(run)
    }

    pub fn load(path: impl AsRef<Path>) -> CoreResult<Self> {
        let s = std::fs::read_to_string(path)?;
        Self::from_json_str(&s)
    }

    pub fn catalog(&self) -> CoreResult<TypeCatalog> {
        TypeCatalog::from_file(self.catalog.clone())
    }
}
