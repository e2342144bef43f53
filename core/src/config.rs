use crate::error::{CoreError, CoreResult};
use crate::filter::{DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_MINIMUM_CONFIDENCE};
use crate::mapper::DEFAULT_COMMON_MODULE_THRESHOLD;
use crate::merge::ConfidenceStrategy;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_PROXIMITY_THRESHOLD: f64 = 24.0;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    pub confidence_threshold: f64,
    pub minimum_confidence: f64,
    /// Diagram units within which uncoded detections count as one element.
    pub proximity_threshold: f64,
    pub confidence_strategy: ConfidenceStrategy,
    pub common_module_threshold: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            minimum_confidence: DEFAULT_MINIMUM_CONFIDENCE,
            proximity_threshold: DEFAULT_PROXIMITY_THRESHOLD,
            confidence_strategy: ConfidenceStrategy::Max,
            common_module_threshold: DEFAULT_COMMON_MODULE_THRESHOLD,
        }
    }
}

impl PipelineConfig {
    pub fn from_json_str(s: &str) -> CoreResult<Self> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: impl AsRef<Path>) -> CoreResult<Self> {
        let s = std::fs::read_to_string(path)?;
        Self::from_json_str(&s)
    }

    pub fn validate(&self) -> CoreResult<()> {
        let unit = 0.0..=1.0;
        if !unit.contains(&self.confidence_threshold) {
            return Err(CoreError::InvalidInput(format!(
                "confidence_threshold must be within [0,1], got {}",
                self.confidence_threshold
            )));
        }
        if !unit.contains(&self.minimum_confidence) {
            return Err(CoreError::InvalidInput(format!(
                "minimum_confidence must be within [0,1], got {}",
                self.minimum_confidence
            )));
        }
        if self.minimum_confidence > self.confidence_threshold {
            return Err(CoreError::InvalidInput(
                "minimum_confidence cannot exceed confidence_threshold".to_string(),
            ));
        }
        if !self.proximity_threshold.is_finite() || self.proximity_threshold < 0.0 {
            return Err(CoreError::InvalidInput(
                "proximity_threshold must be a finite, non-negative distance".to_string(),
            ));
        }
        if self.common_module_threshold == 0 {
            return Err(CoreError::InvalidInput(
                "common_module_threshold must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
